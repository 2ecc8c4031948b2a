//! Domain services used by the websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room state and fan-out so route handlers can stay
//! focused on transport concerns.

pub mod broadcast;
pub mod palette;
pub mod reaper;
pub mod registry;
pub mod room;
pub mod session;
pub mod stroke;
