//! Touch data types and per-tick event reconciliation
//!
//! The phone delivers raw touch lifecycle events (`touchstart`, `touchmove`,
//! `touchend`, `touchcancel`) that may arrive several per tick and in any
//! interleaving. The [`TouchTracker`] folds them into four per-tick
//! identifier sets plus a persistent snapshot of the currently active
//! touches, healing transient sequences (a touch that starts and ends within
//! one tick, or ends and restarts) so the host never observes spurious
//! events.

/// A single contact point on the paired phone screen
///
/// The contact area is described by the ellipse that most closely surrounds
/// it, the same shape the browser Touch API reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Center of the contact ellipse, in phone screen pixels
    pub x: f64,
    /// Center of the contact ellipse, in phone screen pixels
    pub y: f64,
    /// First radius of the contact ellipse
    pub a: f64,
    /// Second radius of the contact ellipse
    pub b: f64,
    /// Rotation of the ellipse in radians, within `[0, π/2)`
    pub angle: f64,
    /// Normalized pressure in `[0.0, 1.0]`
    pub force: f32,
    /// Stable identifier, unique among currently active touches
    pub id: i32,
}

/// Lifecycle phase of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

impl TouchPhase {
    /// Maps a DOM touch event type string to its lifecycle phase
    ///
    /// Returns `None` for unrecognized subtypes; those still carry a touch
    /// snapshot but produce no per-tick events.
    pub fn from_event_type(kind: &str) -> Option<Self> {
        match kind {
            "touchstart" => Some(Self::Start),
            "touchmove" => Some(Self::Move),
            "touchend" => Some(Self::End),
            "touchcancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Reconciles raw touch events into per-tick result sets
///
/// Holds the active-touch snapshot and the four per-tick identifier sets
/// (started, moved, ended, canceled). The sets are cleared at the start of
/// every tick. Starts heal earlier ends and cancels, and ends and cancels
/// suppress earlier starts, so an identifier never lands in two of those
/// three sets; a move followed by an end or cancel within one tick is
/// reported in both sets.
#[derive(Debug, Default)]
pub struct TouchTracker {
    touches: Vec<Touch>,
    started: Vec<i32>,
    moved: Vec<i32>,
    ended: Vec<i32>,
    canceled: Vec<i32>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-tick event sets. Call once at the start of every tick.
    pub fn begin_tick(&mut self) {
        self.started.clear();
        self.moved.clear();
        self.ended.clear();
        self.canceled.clear();
    }

    /// Drops all touch state, the active snapshot included
    pub fn clear(&mut self) {
        self.touches.clear();
        self.begin_tick();
    }

    /// Replaces the active-touch snapshot wholesale
    ///
    /// The snapshot always mirrors the `touches` list of the most recently
    /// decoded touch-bearing event; it is never merged incrementally.
    pub fn set_snapshot(&mut self, touches: Vec<Touch>) {
        self.touches = touches;
    }

    /// Folds one touch lifecycle event into the per-tick sets
    ///
    /// `changed` names the identifiers this specific event affected. Events
    /// must be applied in arrival order within the tick.
    pub fn apply(&mut self, phase: TouchPhase, changed: &[i32]) {
        match phase {
            TouchPhase::Start => {
                for &id in changed {
                    // An end/cancel followed by a restart within one tick is
                    // invisible: the earlier entry is healed away instead of
                    // reporting a start.
                    if !remove_id(&mut self.ended, id) && !remove_id(&mut self.canceled, id) {
                        self.started.push(id);
                    }
                }
            }
            TouchPhase::Move => {
                for &id in changed {
                    // Moves coalesce: a new or already-moved touch is not
                    // reported again.
                    if !self.started.contains(&id) && !self.moved.contains(&id) {
                        self.moved.push(id);
                    }
                }
            }
            TouchPhase::End => {
                for &id in changed {
                    // A touch that started and ended within one tick is
                    // suppressed entirely. A prior move this tick stays
                    // reported alongside the end.
                    if !remove_id(&mut self.started, id) {
                        self.ended.push(id);
                    }
                }
            }
            TouchPhase::Cancel => {
                for &id in changed {
                    if !remove_id(&mut self.started, id) {
                        self.canceled.push(id);
                    }
                }
            }
        }
    }

    /// All currently active touches, as of the latest touch-bearing event
    pub fn touches(&self) -> &[Touch] {
        &self.touches
    }

    /// Identifiers of touches that started this tick
    pub fn started(&self) -> &[i32] {
        &self.started
    }

    /// Identifiers of touches that moved this tick
    pub fn moved(&self) -> &[i32] {
        &self.moved
    }

    /// Identifiers of touches that ended this tick
    pub fn ended(&self) -> &[i32] {
        &self.ended
    }

    /// Identifiers of touches that were canceled this tick
    pub fn canceled(&self) -> &[i32] {
        &self.canceled
    }
}

/// Removes the first occurrence of `id`, reporting whether it was present
fn remove_id(ids: &mut Vec<i32>, id: i32) -> bool {
    if let Some(pos) = ids.iter().position(|&candidate| candidate == id) {
        ids.remove(pos);
        true
    } else {
        false
    }
}
