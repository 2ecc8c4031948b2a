//! Palette allocator: round-robin display colors for joining users.
//!
//! DESIGN
//! ======
//! The cursor advances once per join and never rewinds. Colors are not
//! reclaimed when users leave, so the Nth join in a room always gets
//! `PALETTE[(N - 1) % 16]` no matter who is still connected.

/// Fixed display palette, in allocation order.
pub const PALETTE: [&str; 16] = [
    "#F44336", "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", "#2196F3", "#03A9F4", "#00BCD4", "#009688", "#4CAF50",
    "#8BC34A", "#CDDC39", "#FFEB3B", "#FFC107", "#FF9800", "#FF5722",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    index: usize,
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the color under the cursor and advance it.
    pub fn next_color(&mut self) -> &'static str {
        let color = PALETTE[self.index];
        self.index = (self.index + 1) % PALETTE.len();
        color
    }
}

#[cfg(test)]
#[path = "palette_test.rs"]
mod tests;
