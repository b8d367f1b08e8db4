//! # touchlink
//!
//! Pairs a phone browser with a desktop process so the phone screen acts as
//! a multi-touch input device. The desktop side runs a minimal TCP server
//! speaking just enough HTTP to serve one bootstrap page and to receive JSON
//! touch telemetry back from it; no general-purpose HTTP stack is involved.
//!
//! ## How it works
//!
//! The phone opens the served page, which captures `touchstart`/`touchmove`/
//! `touchend`/`touchcancel` events and POSTs them back in batches. On the
//! desktop, everything is driven by a single [`TouchInput::update`] call per
//! frame: it drains whatever bytes have arrived, frames them into requests,
//! decodes any telemetry bodies and reconciles the raw touch events into
//! four per-tick sets (started, moved, ended, canceled) plus a
//! snapshot of the currently active touches. Transient sequences are healed:
//! a touch that starts and ends within one tick, or ends and restarts,
//! produces no events at all.
//!
//! Exactly one phone session is served at a time. No call blocks and no
//! background thread runs; the host keeps full control of its frame loop.
//!
//! ## Module organization
//!
//! - [`input`] — the caller-owned [`TouchInput`] state object: lifecycle
//!   (`update`/`reset`), route dispatch and the per-tick query interface.
//! - [`net`] — non-blocking listener and single-session socket handling.
//! - [`http`] — request framing from the raw byte queue and the fixed
//!   response formats.
//! - [`telemetry`] — all-or-nothing JSON decoding of the wire schema.
//! - [`touch`] — touch data types and the per-tick reconciliation engine.
//!
//! ## Usage example
//!
//! ```rust,no_run
//! use touchlink::TouchInput;
//!
//! fn main() -> std::io::Result<()> {
//!     let mut input = TouchInput::new(50000)?;
//!     if let Some(url) = input.url() {
//!         println!("Open {} on your phone", url);
//!     }
//!
//!     loop {
//!         // Once per frame: poll the socket and reconcile touch events.
//!         input.update();
//!
//!         for id in input.started_touches() {
//!             println!("touch {} started", id);
//!         }
//!         for touch in input.touches() {
//!             println!("touch {} at ({}, {})", touch.id, touch.x, touch.y);
//!         }
//!     }
//! }
//! ```

pub mod http;
pub mod input;
pub mod net;
pub mod telemetry;
pub mod touch;

pub use input::TouchInput;
pub use telemetry::{DecodeError, Telemetry, TelemetryEvent};
pub use touch::{Touch, TouchPhase, TouchTracker};
