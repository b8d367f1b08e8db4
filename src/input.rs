//! Caller-owned input state polled once per tick by the host application
//!
//! [`TouchInput`] is the single entry point of the crate. The host creates
//! one, calls [`TouchInput::update`] exactly once per frame, and reads the
//! query accessors afterwards. All networking, request framing, route
//! dispatch and touch reconciliation happen inside `update`; nothing runs in
//! the background and no call blocks.

use crate::http::{self, RequestHead};
use crate::net::Session;
use crate::telemetry::{self, Telemetry, TelemetryEvent};
use crate::touch::{Touch, TouchTracker};
use log::{debug, info, warn};
use std::io;

/// The bootstrap page served on GET `/`. It captures touch events in the
/// phone browser and streams them back as JSON telemetry.
const BOOTSTRAP_PAGE: &str = include_str!("../assets/index.html");

/// Receives multi-touch input from a paired phone browser
///
/// Owns the listening socket, the raw byte queue, the in-progress request
/// state and the reconciled touch state. Exactly one client session is
/// served at a time; when the phone disconnects all session state is reset
/// and the listener waits for the next pairing.
pub struct TouchInput {
    session: Session,
    connected: bool,
    queue: Vec<u8>,
    pending: Option<RequestHead>,
    width: i32,
    height: i32,
    resized: bool,
    tracker: TouchTracker,
}

impl TouchInput {
    /// Opens the listening port and waits for a phone to connect
    pub fn new(port: u16) -> io::Result<Self> {
        Ok(Self {
            session: Session::open(port)?,
            connected: false,
            queue: Vec::new(),
            pending: None,
            width: 0,
            height: 0,
            resized: false,
            tracker: TouchTracker::new(),
        })
    }

    /// Processes newly arrived data. Call exactly once per tick.
    ///
    /// Clears the per-tick event sets, pulls all currently available bytes
    /// from the session, then parses and dispatches requests until the queue
    /// is exhausted or a partial request remains. A disconnect detected here
    /// resets all session state on the following tick.
    pub fn update(&mut self) {
        self.resized = false;
        self.tracker.begin_tick();

        self.session.poll_accept();
        if self.session.has_session() {
            self.connected = true;
            if self.session.read_available(&mut self.queue) {
                self.run_requests();
                // Drain any response backlog a slow reader left behind.
                self.session.flush();
            }
        } else if self.connected {
            info!("Phone disconnected, resetting session state");
            self.reset();
        }
    }

    /// Drops any active connection and clears all buffered and per-tick
    /// state, then keeps listening on the current port
    ///
    /// Safe to call at any time, including mid-parse or with no session.
    pub fn reset(&mut self) {
        self.session.disconnect();
        self.clear_state();
    }

    /// Like [`TouchInput::reset`], but moves the listener to a new port first
    pub fn reset_to(&mut self, port: u16) -> io::Result<()> {
        self.session.rebind(port)?;
        self.clear_state();
        Ok(())
    }

    /// Whether a phone is currently connected
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// The configured port
    pub fn port(&self) -> u16 {
        self.session.port()
    }

    /// The port the listener actually bound; differs from [`TouchInput::port`]
    /// when port 0 was configured
    pub fn local_port(&self) -> Option<u16> {
        self.session.local_port()
    }

    /// Address a phone on the same network can open to pair, derived from
    /// the first non-loopback IPv4 interface
    ///
    /// `None` when no such interface is available.
    pub fn url(&self) -> Option<String> {
        let interfaces = if_addrs::get_if_addrs().ok()?;
        let ip = interfaces
            .iter()
            .find(|interface| !interface.is_loopback() && interface.ip().is_ipv4())
            .map(|interface| interface.ip())?;
        Some(format!("http://{}:{}/", ip, self.session.port()))
    }

    /// Phone screen size as most recently reported; zero before first contact
    pub fn screen_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Whether the phone screen was resized this tick
    pub fn resized(&self) -> bool {
        self.resized
    }

    /// All currently active touches
    pub fn touches(&self) -> &[Touch] {
        self.tracker.touches()
    }

    /// Identifiers of touches that started this tick
    pub fn started_touches(&self) -> &[i32] {
        self.tracker.started()
    }

    /// Identifiers of touches that moved this tick
    pub fn moved_touches(&self) -> &[i32] {
        self.tracker.moved()
    }

    /// Identifiers of touches that ended this tick
    pub fn ended_touches(&self) -> &[i32] {
        self.tracker.ended()
    }

    /// Identifiers of touches that were canceled this tick
    pub fn canceled_touches(&self) -> &[i32] {
        self.tracker.canceled()
    }

    fn clear_state(&mut self) {
        self.connected = false;
        self.queue.clear();
        self.pending = None;
        self.width = 0;
        self.height = 0;
        self.resized = false;
        self.tracker.clear();
    }

    /// Parses and dispatches requests from the queue until no further
    /// progress is possible
    ///
    /// At most one fully-parsed-but-undispatched request is ever held; its
    /// dispatch is deferred while the declared body has not fully arrived.
    fn run_requests(&mut self) {
        loop {
            match self.pending.take() {
                None => match http::parse_request(&mut self.queue) {
                    Some(head) => self.pending = Some(head),
                    // Header terminator not in yet; wait for more bytes.
                    None => break,
                },
                Some(head) => {
                    if self.queue.len() < head.content_length {
                        // Body still in flight; retry next tick.
                        self.pending = Some(head);
                        break;
                    }
                    if !self.dispatch(&head) {
                        // Connection died mid-response; anything still
                        // queued is stale and gets cleared on the next
                        // tick's reset.
                        break;
                    }
                }
            }
        }
    }

    /// Routes one request and writes its response
    ///
    /// Always consumes exactly the declared body length from the queue so
    /// the framer resumes at the next request. Returns `false` when the
    /// response could not be delivered because the connection is gone.
    fn dispatch(&mut self, head: &RequestHead) -> bool {
        debug!(
            "{} {} ({} body bytes)",
            head.method, head.resource, head.content_length
        );
        let response = match (head.method.as_str(), head.resource.as_str()) {
            ("GET", "/") => http::html_response(BOOTSTRAP_PAGE.as_bytes()),
            ("GET", "/teapot") => http::empty_response(http::STATUS_TEAPOT),
            ("POST", "/") => match telemetry::decode(&self.queue[..head.content_length]) {
                Ok(frame) => {
                    self.apply_telemetry(frame);
                    http::empty_response(http::STATUS_OK)
                }
                Err(error) => {
                    warn!("Rejected telemetry body: {}", error);
                    http::empty_response(http::STATUS_BAD_REQUEST)
                }
            },
            _ => http::empty_response(http::STATUS_NOT_FOUND),
        };
        let delivered = self.session.send(&response);
        self.queue.drain(..head.content_length);
        delivered
    }

    /// Applies one validated telemetry body to the session state
    fn apply_telemetry(&mut self, frame: Telemetry) {
        self.width = frame.width;
        self.height = frame.height;
        for event in frame.events {
            match event {
                TelemetryEvent::Resize => self.resized = true,
                TelemetryEvent::Touch {
                    phase,
                    touches,
                    changed,
                } => {
                    self.tracker.set_snapshot(touches);
                    if let Some(phase) = phase {
                        self.tracker.apply(phase, &changed);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input_is_disconnected() {
        let input = TouchInput::new(0).unwrap();
        assert!(!input.connected());
        assert!(input.touches().is_empty());
        assert_eq!(input.screen_size(), (0, 0));
    }

    #[test]
    fn test_configured_port_is_reported() {
        let input = TouchInput::new(0).unwrap();
        assert_eq!(input.port(), 0);
        assert!(input.local_port().unwrap() > 0);
    }

    #[test]
    fn test_update_without_client_is_a_no_op() {
        let mut input = TouchInput::new(0).unwrap();
        input.update();
        input.update();
        assert!(!input.connected());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut input = TouchInput::new(0).unwrap();
        input.reset();
        input.reset();
        assert!(!input.connected());
        assert!(input.started_touches().is_empty());
    }

    #[test]
    fn test_bootstrap_page_is_embedded() {
        assert!(BOOTSTRAP_PAGE.contains("touchstart"));
        assert!(BOOTSTRAP_PAGE.contains("changedTouches"));
    }
}
