//! Stroke service: server-side identity for submitted strokes.
//!
//! DESIGN
//! ======
//! Clients may send their own `id`, `ownerId`, and `ts`; an unset one (see
//! `is_unset`) is filled from the connection and the server clock. The rest
//! of the payload is not inspected. Committed strokes get a uuid id. Previews
//! get a throwaway `{client}-tmp-{suffix}` id since they only live until the
//! author's next preview.

use rand::Rng;
use serde_json::Value;
use uuid::Uuid;

use crate::event::is_unset;
use crate::state::{ClientId, Stroke, StrokeInput};

const PREVIEW_SUFFIX_LEN: usize = 4;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Enrich a stroke for commit to history.
#[must_use]
pub fn commit_stroke(input: StrokeInput, client_id: ClientId, now_ms: i64) -> Stroke {
    enrich(input, client_id, now_ms, || Uuid::new_v4().to_string())
}

/// Enrich an in-progress stroke for relay to peers.
#[must_use]
pub fn preview_stroke(input: StrokeInput, client_id: ClientId, now_ms: i64) -> Stroke {
    enrich(input, client_id, now_ms, || format!("{client_id}-tmp-{}", preview_suffix()))
}

fn enrich(input: StrokeInput, client_id: ClientId, now_ms: i64, make_id: impl FnOnce() -> String) -> Stroke {
    Stroke {
        id: given(input.id).unwrap_or_else(|| Value::String(make_id())),
        owner_id: given(input.owner_id).unwrap_or_else(|| Value::String(client_id.to_string())),
        ts: given(input.ts).unwrap_or_else(|| Value::from(now_ms)),
        body: input.body,
    }
}

fn given(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !is_unset(v))
}

/// Uniform lowercase base-36 suffix.
fn preview_suffix() -> String {
    let mut rng = rand::rng();
    (0..PREVIEW_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;
