#![forbid(unsafe_code)]

//! Classified gestures derived from raw pointer input.
//!
//! [`GestureEvent`] represents what the user *meant* rather than where their
//! finger went. A [`GestureSession`](crate::gesture::GestureSession) produces
//! these; the router consumes each one exactly once.
//!
//! # Invariants
//! 1. `Tap` and `Swipe` are never both produced for the same contact.
//! 2. `Tap::finger_count` is the count observed while pressing, never lowered
//!    by fingers lifting early.
//! 3. `Swipe::distance` is non-negative and measured on the dominant axis.
//! 4. `DirectionChange` and `SpeedTick` are only produced mid-contact.

use crate::interactive::ElementTarget;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 2D point in CSS pixels relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement `(dx, dy)` from `self` to `other`.
    #[must_use]
    pub fn delta_to(self, other: Self) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// SwipeDirection
// ---------------------------------------------------------------------------

/// Cardinal direction of finger motion.
///
/// `Up` means the finger moved toward the top of the screen (negative `dy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Dominant direction and its magnitude for a displacement.
    ///
    /// The dominant axis is the one with the greater absolute displacement;
    /// ties resolve to vertical. A zero vertical delta reads as `Down`.
    #[must_use]
    pub fn dominant(dx: f64, dy: f64) -> (Self, f64) {
        if dx.abs() > dy.abs() {
            let dir = if dx < 0.0 { Self::Left } else { Self::Right };
            (dir, dx.abs())
        } else {
            let dir = if dy < 0.0 { Self::Up } else { Self::Down };
            (dir, dy.abs())
        }
    }

    /// Returns true for vertical directions.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Returns true for horizontal directions.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Lowercase label used in logs and host payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ---------------------------------------------------------------------------
// GestureEvent
// ---------------------------------------------------------------------------

/// A classified gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// Short, nearly stationary contact.
    Tap {
        /// Fingers observed while pressing (1 for mouse).
        finger_count: u8,
        /// Release position.
        pos: Position,
        /// Element under the pointer at press time, if the host reported one.
        target: Option<ElementTarget>,
    },

    /// Contact released after travelling at least the swipe distance.
    Swipe {
        direction: SwipeDirection,
        /// Distance in pixels on the dominant axis (always >= 0.0).
        distance: f64,
    },

    /// Mid-contact: the finger travelled the direction-change distance since
    /// the last check point.
    DirectionChange { direction: SwipeDirection },

    /// Mid-contact: one speed-adjustment step of vertical travel.
    ///
    /// `direction` is always vertical.
    SpeedTick { direction: SwipeDirection },
}

impl GestureEvent {
    /// Returns true if this is a tap.
    #[must_use]
    pub fn is_tap(&self) -> bool {
        matches!(self, Self::Tap { .. })
    }

    /// Returns true for the events produced while the contact is still down.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::DirectionChange { .. } | Self::SpeedTick { .. })
    }

    /// Direction carried by the event, if any.
    #[must_use]
    pub fn direction(&self) -> Option<SwipeDirection> {
        match self {
            Self::Tap { .. } => None,
            Self::Swipe { direction, .. }
            | Self::DirectionChange { direction }
            | Self::SpeedTick { direction } => Some(*direction),
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tap { .. } => "tap",
            Self::Swipe { .. } => "swipe",
            Self::DirectionChange { .. } => "direction_change",
            Self::SpeedTick { .. } => "speed_tick",
        }
    }
}
