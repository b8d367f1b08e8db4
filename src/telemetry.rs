//! JSON telemetry decoding for the phone-to-desktop wire schema
//!
//! A POST body carries the phone screen dimensions plus an ordered list of
//! events. Decoding is all-or-nothing per body: the JSON is deserialized and
//! validated in full before the caller applies any of it, so a malformed
//! body can never leave session state half-updated.

use crate::touch::{Touch, TouchPhase};
use serde::Deserialize;
use thiserror::Error;

/// Errors produced while decoding a telemetry body
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("touch event `{0}` is missing its `touches` list")]
    MissingTouches(String),
    #[error("touch event `{0}` is missing its `changedTouches` list")]
    MissingChangedTouches(String),
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    width: i32,
    height: i32,
    events: Vec<WireEvent>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    touches: Option<Vec<WireTouch>>,
    #[serde(rename = "changedTouches")]
    changed_touches: Option<Vec<i32>>,
}

/// One touch record as the browser emits it; `angle` is still in degrees
#[derive(Debug, Deserialize)]
struct WireTouch {
    x: f64,
    y: f64,
    a: f64,
    b: f64,
    angle: f64,
    force: f32,
    id: i32,
}

impl From<WireTouch> for Touch {
    fn from(wire: WireTouch) -> Self {
        Touch {
            x: wire.x,
            y: wire.y,
            a: wire.a,
            b: wire.b,
            angle: wire.angle.to_radians(),
            force: wire.force,
            id: wire.id,
        }
    }
}

/// A fully validated telemetry body, safe to apply to session state
#[derive(Debug)]
pub struct Telemetry {
    /// Phone screen width, always present
    pub width: i32,
    /// Phone screen height, always present
    pub height: i32,
    /// Validated events in arrival order
    pub events: Vec<TelemetryEvent>,
}

/// One decoded event
///
/// Event types that are neither `resize` nor `touch*` are dropped during
/// decoding without failing the body.
#[derive(Debug)]
pub enum TelemetryEvent {
    /// The phone screen was resized or rotated
    Resize,
    /// A touch lifecycle event with the full current touch list
    Touch {
        /// `None` for unrecognized `touch*` subtypes, which still refresh
        /// the active-touch snapshot but produce no per-tick events
        phase: Option<TouchPhase>,
        touches: Vec<Touch>,
        changed: Vec<i32>,
    },
}

/// Decodes and validates one POST body
///
/// Structurally invalid JSON, a missing required field or a mistyped value
/// fails the whole body; the returned error names the first problem found.
pub fn decode(body: &[u8]) -> Result<Telemetry, DecodeError> {
    let frame: WireFrame = serde_json::from_slice(body)?;

    let mut events = Vec::with_capacity(frame.events.len());
    for event in frame.events {
        if event.kind == "resize" {
            events.push(TelemetryEvent::Resize);
        } else if event.kind.starts_with("touch") {
            let touches = event
                .touches
                .ok_or_else(|| DecodeError::MissingTouches(event.kind.clone()))?;
            let changed = event
                .changed_touches
                .ok_or_else(|| DecodeError::MissingChangedTouches(event.kind.clone()))?;
            events.push(TelemetryEvent::Touch {
                phase: TouchPhase::from_event_type(&event.kind),
                touches: touches.into_iter().map(Touch::from).collect(),
                changed,
            });
        }
    }

    Ok(Telemetry {
        width: frame.width,
        height: frame.height,
        events,
    })
}
