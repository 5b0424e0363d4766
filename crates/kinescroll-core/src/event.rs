#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! Hosts translate platform events (`touchstart`, `pointerdown`, `wheel`, ...)
//! into these values before handing them to the runtime.
//!
//! # Design Notes
//!
//! - Coordinates are CSS pixels relative to the viewport.
//! - Timestamps are monotonic `Duration`s since an arbitrary host epoch.
//! - `touches` is the number of fingers still on the surface *after* the
//!   event, matching `TouchEvent.touches.length`. Mouse events always report 1
//!   while the button is held and 0 on release.

use core::time::Duration;

use bitflags::bitflags;

use crate::interactive::ElementTarget;
use crate::semantic_event::Position;

/// Input device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerSource {
    #[default]
    Touch,
    Mouse,
}

/// Lifecycle phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// Finger or button went down.
    Down,
    /// Motion while pressed.
    Move,
    /// Finger or button released.
    Up,
    /// Platform aborted the contact (incoming call, gesture takeover).
    Cancel,
}

/// A normalized touch or mouse event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub source: PointerSource,
    pub x: f64,
    pub y: f64,
    /// Fingers on the surface after this event (see module docs).
    pub touches: u8,
    pub timestamp: Duration,
    /// Element under the pointer; only meaningful on `Down`.
    pub target: Option<ElementTarget>,
}

impl PointerEvent {
    /// Create a touch event.
    #[must_use]
    pub fn touch(phase: PointerPhase, x: f64, y: f64, touches: u8, timestamp: Duration) -> Self {
        Self {
            phase,
            source: PointerSource::Touch,
            x,
            y,
            touches,
            timestamp,
            target: None,
        }
    }

    /// Create a mouse event. `touches` is derived from the phase.
    #[must_use]
    pub fn mouse(phase: PointerPhase, x: f64, y: f64, timestamp: Duration) -> Self {
        let touches = match phase {
            PointerPhase::Down | PointerPhase::Move => 1,
            PointerPhase::Up | PointerPhase::Cancel => 0,
        };
        Self {
            phase,
            source: PointerSource::Mouse,
            x,
            y,
            touches,
            timestamp,
            target: None,
        }
    }

    /// Attach the element under the pointer.
    #[must_use]
    pub fn with_target(mut self, target: ElementTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Event position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

bitflags! {
    /// Keyboard modifiers held during a wheel event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

/// A wheel event from a desktop pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Vertical delta in pixels; positive scrolls toward the end of content.
    pub delta_y: f64,
    pub modifiers: Modifiers,
    pub timestamp: Duration,
}

impl WheelEvent {
    /// Create a wheel event with no modifiers.
    #[must_use]
    pub const fn new(delta_y: f64, timestamp: Duration) -> Self {
        Self {
            delta_y,
            modifiers: Modifiers::NONE,
            timestamp,
        }
    }

    /// Builder: set modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// A plain downward scroll (no zoom/horizontal modifier held).
    #[must_use]
    pub fn is_plain_scroll_down(&self) -> bool {
        self.delta_y > 0.0 && self.modifiers.is_empty()
    }
}
