#![forbid(unsafe_code)]

//! Pointer sampling: one contact lifecycle for touch and mouse alike.
//!
//! [`PointerSampler`] turns the raw press / move / release / cancel stream into
//! a single in-flight [`Contact`] and hands back a [`CompletedContact`] when
//! the last finger lifts. It never classifies anything.
//!
//! # Invariants
//!
//! 1. At most one contact is tracked at a time.
//! 2. A contact's finger count only grows while pressing: extra `Down` events
//!    from fingers landing a few milliseconds apart raise it, lifts never
//!    lower it. Mouse contacts are always 1.
//! 3. A touch release with fingers still down does not end the contact.
//! 4. A cancelled contact produces nothing.
//!
//! # Failure Modes
//!
//! - Release with no tracked contact (e.g. press happened before the host
//!   attached listeners): ignored.
//! - Release in the same event tick as the press with no motion in between:
//!   treated as a zero-sample contact and ignored.

use core::time::Duration;

use crate::event::{PointerEvent, PointerPhase, PointerSource};
use crate::interactive::ElementTarget;
use crate::semantic_event::Position;

/// One press-to-release interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub source: PointerSource,
    pub start: Position,
    pub start_time: Duration,
    pub current: Position,
    pub last_time: Duration,
    /// Fingers observed while pressing (see module invariants).
    pub finger_count: u8,
    /// Element under the pointer at press time.
    pub target: Option<ElementTarget>,
    /// Move samples seen since the press.
    pub move_samples: u32,
}

impl Contact {
    fn begin(event: &PointerEvent) -> Self {
        let pos = event.position();
        Self {
            source: event.source,
            start: pos,
            start_time: event.timestamp,
            current: pos,
            last_time: event.timestamp,
            finger_count: press_finger_count(event),
            target: event.target.clone(),
            move_samples: 0,
        }
    }

    /// Time from press to the latest sample.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last_time.saturating_sub(self.start_time)
    }

    /// Displacement `(dx, dy)` from press to the latest sample.
    #[must_use]
    pub fn displacement(&self) -> (f64, f64) {
        self.start.delta_to(self.current)
    }
}

fn press_finger_count(event: &PointerEvent) -> u8 {
    match event.source {
        PointerSource::Mouse => 1,
        PointerSource::Touch => event.touches.max(1),
    }
}

/// A position sample emitted for a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pos: Position,
    pub timestamp: Duration,
}

/// A contact whose last finger lifted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedContact {
    pub contact: Contact,
    pub last: PointerSample,
}

/// Result of feeding one event into the sampler.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerOutput {
    /// A new contact began.
    Started,
    /// An extra finger joined the in-flight contact.
    FingerAdded { finger_count: u8 },
    /// The in-flight contact moved.
    Moved(PointerSample),
    /// The contact ended and is ready to classify.
    Ended(CompletedContact),
    /// The in-flight contact was dropped without classification.
    Cancelled,
    /// Nothing to do (no contact, partial lift, zero-sample release).
    Ignored,
}

/// Tracks a single contact lifecycle.
#[derive(Debug, Default)]
pub struct PointerSampler {
    contact: Option<Contact>,
}

impl PointerSampler {
    /// Create an idle sampler.
    #[must_use]
    pub const fn new() -> Self {
        Self { contact: None }
    }

    /// The in-flight contact, if any.
    #[inline]
    #[must_use]
    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    /// Whether a contact is being tracked.
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.contact.is_some()
    }

    /// Dispatch on the event phase.
    pub fn feed(&mut self, event: &PointerEvent) -> SamplerOutput {
        match event.phase {
            PointerPhase::Down => {
                let had_contact = self.is_touch_contact_in_flight(event.source);
                let contact = self.on_contact_start(event);
                if had_contact {
                    SamplerOutput::FingerAdded {
                        finger_count: contact.finger_count,
                    }
                } else {
                    SamplerOutput::Started
                }
            }
            PointerPhase::Move => self
                .on_contact_move(event)
                .map_or(SamplerOutput::Ignored, SamplerOutput::Moved),
            PointerPhase::Up => self
                .on_contact_end(event)
                .map_or(SamplerOutput::Ignored, SamplerOutput::Ended),
            PointerPhase::Cancel => {
                if self.on_contact_cancel() {
                    SamplerOutput::Cancelled
                } else {
                    SamplerOutput::Ignored
                }
            }
        }
    }

    fn is_touch_contact_in_flight(&self, source: PointerSource) -> bool {
        source == PointerSource::Touch
            && self
                .contact
                .as_ref()
                .is_some_and(|c| c.source == PointerSource::Touch)
    }

    /// Begin tracking, or fold an extra finger into the in-flight touch.
    pub fn on_contact_start(&mut self, event: &PointerEvent) -> &Contact {
        if self.is_touch_contact_in_flight(event.source) {
            let contact = self.contact.get_or_insert_with(|| Contact::begin(event));
            contact.finger_count = contact.finger_count.max(press_finger_count(event));
            return contact;
        }
        self.contact.insert(Contact::begin(event))
    }

    /// Record a move sample. Returns `None` when nothing is being tracked.
    pub fn on_contact_move(&mut self, event: &PointerEvent) -> Option<PointerSample> {
        let contact = self.contact.as_mut()?;
        if contact.source != event.source {
            return None;
        }
        let pos = event.position();
        contact.current = pos;
        contact.last_time = event.timestamp.max(contact.last_time);
        contact.move_samples = contact.move_samples.saturating_add(1);
        Some(PointerSample {
            pos,
            timestamp: contact.last_time,
        })
    }

    /// Finish the contact when its last finger lifts.
    pub fn on_contact_end(&mut self, event: &PointerEvent) -> Option<CompletedContact> {
        let contact = self.contact.as_ref()?;
        if contact.source != event.source {
            return None;
        }
        if event.source == PointerSource::Touch && event.touches > 0 {
            return None;
        }
        let mut contact = self.contact.take()?;
        if event.timestamp <= contact.start_time && contact.move_samples == 0 {
            return None;
        }
        contact.current = event.position();
        contact.last_time = event.timestamp.max(contact.last_time);
        let last = PointerSample {
            pos: contact.current,
            timestamp: contact.last_time,
        };
        Some(CompletedContact { contact, last })
    }

    /// Drop the in-flight contact. Returns whether one existed.
    pub fn on_contact_cancel(&mut self) -> bool {
        self.contact.take().is_some()
    }
}
