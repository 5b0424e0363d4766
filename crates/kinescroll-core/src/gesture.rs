#![forbid(unsafe_code)]

//! Gesture recognition: turns pointer contacts into [`GestureEvent`]s.
//!
//! [`GestureSession`] owns a [`PointerSampler`], a [`GestureClassifier`] and
//! the mid-contact [`DirectionTracker`]. Feed it every pointer event with
//! [`process`](GestureSession::process).
//!
//! # State Machine
//!
//! - **Release classifier**: when the last finger lifts, the contact is a
//!   `Tap` if it was short *and* nearly stationary on both axes, otherwise a
//!   `Swipe` if the dominant-axis travel reached the swipe distance, otherwise
//!   nothing.
//! - **Direction tracker** (only while `tracking` is requested): on each move,
//!   displacement is measured from the last *check point*, not from the press.
//!   Once the dominant-axis travel reaches the direction-change distance a
//!   `DirectionChange` is emitted and the check point advances by that
//!   distance along the dominant axis, so one long drag yields a series of
//!   signals and a sample that straddles the threshold loses nothing.
//! - **Speed ticks** (same condition): vertical travel between consecutive
//!   samples is accumulated independently of the check point; every full
//!   speed-tick distance emits a `SpeedTick` and the remainder carries over.
//!   Reversing vertical direction restarts the accumulator.
//!
//! # Invariants
//!
//! 1. `Tap` and `Swipe` are never both emitted for one contact.
//! 2. Finger count is fixed by the sampler; partial lifts never reclassify.
//! 3. For a monotone vertical drag of length `L`, sampled at any step sizes,
//!    exactly `⌊L / dc⌋` direction changes and `⌊L / tick⌋` speed ticks are
//!    emitted.
//! 4. After `reset()` the session is idle.
//!
//! # Failure Modes
//!
//! - Cancelled contacts and zero-sample contacts emit nothing.
//! - While `tracking` is false the check point follows the finger, so turning
//!   tracking on mid-drag never releases a burst of stale signals.

use core::time::Duration;

use crate::event::PointerEvent;
use crate::pointer::{CompletedContact, Contact, PointerSampler, SamplerOutput};
use crate::semantic_event::{GestureEvent, Position, SwipeDirection};

#[cfg(feature = "tracing")]
use crate::logging::{debug, trace};
#[cfg(not(feature = "tracing"))]
use crate::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for gesture classification.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// A tap must be released strictly before this (default: 200ms).
    pub tap_max_duration: Duration,
    /// A tap must move strictly less than this on each axis (default: 10px).
    pub tap_max_distance: f64,
    /// Minimum dominant-axis travel for a swipe (default: 50px).
    pub swipe_min_distance: f64,
    /// Dominant-axis travel between direction checks (default: 50px).
    pub direction_change_distance: f64,
    /// Vertical travel per speed tick (default: 30px).
    pub speed_tick_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_max_duration: Duration::from_millis(200),
            tap_max_distance: 10.0,
            swipe_min_distance: 50.0,
            direction_change_distance: 50.0,
            speed_tick_distance: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Release classification
// ---------------------------------------------------------------------------

/// Stateless release-time classifier.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: GestureConfig,
}

impl GestureClassifier {
    /// Create a classifier with the given thresholds.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether `(elapsed, dx, dy)` qualifies as a tap.
    #[must_use]
    pub fn is_tap(&self, elapsed: Duration, dx: f64, dy: f64) -> bool {
        elapsed < self.config.tap_max_duration
            && dx.abs() < self.config.tap_max_distance
            && dy.abs() < self.config.tap_max_distance
    }

    /// Classify a finished contact.
    #[must_use]
    pub fn classify(&self, contact: &Contact) -> Option<GestureEvent> {
        let (dx, dy) = contact.displacement();
        if self.is_tap(contact.elapsed(), dx, dy) {
            return Some(GestureEvent::Tap {
                finger_count: contact.finger_count,
                pos: contact.current,
                target: contact.target.clone(),
            });
        }
        let (direction, distance) = SwipeDirection::dominant(dx, dy);
        if distance >= self.config.swipe_min_distance {
            return Some(GestureEvent::Swipe {
                direction,
                distance,
            });
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Mid-contact tracking
// ---------------------------------------------------------------------------

/// Upper bound on signals of one kind emitted for a single move sample.
pub const MAX_SIGNALS_PER_SAMPLE: usize = 64;

/// Direction-change and speed-tick accumulators for one contact.
///
/// The two accumulators are independent: a direction change never resets the
/// speed-tick remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionTracker {
    check_pos: Position,
    last_pos: Position,
    tick_direction: Option<SwipeDirection>,
    tick_accum: f64,
}

impl DirectionTracker {
    /// Start tracking from `pos`.
    #[must_use]
    pub fn new(pos: Position) -> Self {
        Self {
            check_pos: pos,
            last_pos: pos,
            tick_direction: None,
            tick_accum: 0.0,
        }
    }

    /// Move both check points to `pos` and clear the tick accumulator.
    pub fn rebase(&mut self, pos: Position) {
        *self = Self::new(pos);
    }

    /// Sub-tick vertical travel carried forward.
    #[must_use]
    pub fn tick_remainder(&self) -> f64 {
        self.tick_accum
    }

    /// Observe a move sample, appending any signals to `out`.
    ///
    /// Each stream emits at most [`MAX_SIGNALS_PER_SAMPLE`] signals per
    /// sample; travel beyond that is dropped. Non-finite samples are ignored.
    pub fn observe(&mut self, pos: Position, config: &GestureConfig, out: &mut Vec<GestureEvent>) {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return;
        }
        let threshold = config.direction_change_distance;
        let mut emitted = 0;
        while threshold > 0.0 {
            let (cdx, cdy) = self.check_pos.delta_to(pos);
            let (direction, travel) = SwipeDirection::dominant(cdx, cdy);
            if travel < threshold {
                break;
            }
            if emitted == MAX_SIGNALS_PER_SAMPLE {
                self.check_pos = pos;
                break;
            }
            emitted += 1;
            out.push(GestureEvent::DirectionChange { direction });
            // Advance by exactly one threshold so the overshoot carries.
            match direction {
                SwipeDirection::Up => self.check_pos.y -= threshold,
                SwipeDirection::Down => self.check_pos.y += threshold,
                SwipeDirection::Left => self.check_pos.x -= threshold,
                SwipeDirection::Right => self.check_pos.x += threshold,
            }
        }

        let (sdx, sdy) = self.last_pos.delta_to(pos);
        self.last_pos = pos;
        if sdy == 0.0 || sdx.abs() > sdy.abs() {
            return;
        }
        let step_dir = if sdy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        };
        if self.tick_direction != Some(step_dir) {
            self.tick_direction = Some(step_dir);
            self.tick_accum = 0.0;
        }
        self.tick_accum += sdy.abs();
        if config.speed_tick_distance <= 0.0 {
            return;
        }
        let mut emitted = 0;
        while self.tick_accum >= config.speed_tick_distance {
            if emitted == MAX_SIGNALS_PER_SAMPLE {
                self.tick_accum %= config.speed_tick_distance;
                break;
            }
            emitted += 1;
            self.tick_accum -= config.speed_tick_distance;
            out.push(GestureEvent::SpeedTick {
                direction: step_dir,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// GestureSession
// ---------------------------------------------------------------------------

/// Per-page gesture state: the sampler plus the mid-contact tracker.
#[derive(Debug, Default)]
pub struct GestureSession {
    sampler: PointerSampler,
    classifier: GestureClassifier,
    tracker: Option<DirectionTracker>,
}

impl GestureSession {
    /// Create a session with the given thresholds.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            sampler: PointerSampler::new(),
            classifier: GestureClassifier::new(config),
            tracker: None,
        }
    }

    /// Process one pointer event.
    ///
    /// `tracking` enables the direction-change and speed-tick streams for
    /// this event (the router passes true only while a scroll is active).
    pub fn process(&mut self, event: &PointerEvent, tracking: bool) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(2);

        match self.sampler.feed(event) {
            SamplerOutput::Started => {
                self.tracker = Some(DirectionTracker::new(event.position()));
            }
            SamplerOutput::FingerAdded { .. } => {
                trace!("finger joined contact");
            }
            SamplerOutput::Moved(sample) => {
                let tracker = self
                    .tracker
                    .get_or_insert_with(|| DirectionTracker::new(sample.pos));
                if tracking {
                    tracker.observe(sample.pos, self.classifier.config(), &mut out);
                } else {
                    tracker.rebase(sample.pos);
                }
            }
            SamplerOutput::Ended(done) => {
                self.tracker = None;
                self.on_release(&done, &mut out);
            }
            SamplerOutput::Cancelled => {
                self.tracker = None;
                trace!("contact cancelled");
            }
            SamplerOutput::Ignored => {}
        }

        out
    }

    fn on_release(&self, done: &CompletedContact, out: &mut Vec<GestureEvent>) {
        let Some(gesture) = self.classifier.classify(&done.contact) else {
            trace!(
                elapsed_ms = done.contact.elapsed().as_millis() as u64,
                "contact released without a gesture"
            );
            return;
        };
        debug!(
            kind = gesture.kind(),
            finger_count = done.contact.finger_count,
            "gesture classified"
        );
        out.push(gesture);
    }

    /// Drop any in-flight contact without classifying it.
    pub fn cancel(&mut self) {
        self.sampler.on_contact_cancel();
        self.tracker = None;
    }

    /// Reset to idle.
    pub fn reset(&mut self) {
        self.cancel();
    }

    /// Whether a contact is in flight.
    #[inline]
    #[must_use]
    pub fn is_tracking_contact(&self) -> bool {
        self.sampler.is_tracking()
    }

    /// The in-flight contact, if any.
    #[must_use]
    pub fn contact(&self) -> Option<&Contact> {
        self.sampler.contact()
    }

    /// Thresholds in use.
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        self.classifier.config()
    }

    /// Replace the thresholds.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.classifier = GestureClassifier::new(config);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PointerPhase;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_150: Duration = Duration::from_millis(150);
    const MS_200: Duration = Duration::from_millis(200);

    fn down(x: f64, y: f64, touches: u8, t: Duration) -> PointerEvent {
        PointerEvent::touch(PointerPhase::Down, x, y, touches, t)
    }

    fn mv(x: f64, y: f64, t: Duration) -> PointerEvent {
        PointerEvent::touch(PointerPhase::Move, x, y, 1, t)
    }

    fn up(x: f64, y: f64, t: Duration) -> PointerEvent {
        PointerEvent::touch(PointerPhase::Up, x, y, 0, t)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // --- Release classification ---

    #[test]
    fn short_still_contact_is_tap() {
        let mut gs = GestureSession::default();
        assert!(gs.process(&down(100.0, 100.0, 1, Duration::ZERO), false).is_empty());
        let events = gs.process(&up(103.0, 98.0, MS_150), false);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            GestureEvent::Tap {
                finger_count: 1,
                ..
            }
        ));
    }

    #[test]
    fn fast_long_contact_is_swipe_not_tap() {
        let mut gs = GestureSession::default();
        gs.process(&down(50.0, 500.0, 1, Duration::ZERO), false);
        let events = gs.process(&up(50.0, 400.0, MS_100), false);
        assert_eq!(
            events,
            vec![GestureEvent::Swipe {
                direction: SwipeDirection::Up,
                distance: 100.0,
            }]
        );
    }

    #[test]
    fn slow_still_contact_is_nothing() {
        let mut gs = GestureSession::default();
        gs.process(&down(10.0, 10.0, 1, Duration::ZERO), false);
        assert!(gs.process(&up(12.0, 10.0, MS_200), false).is_empty());
    }

    #[test]
    fn tap_distance_is_per_axis() {
        let c = GestureClassifier::default();
        assert!(c.is_tap(MS_100, 9.9, -9.9));
        assert!(!c.is_tap(MS_100, 10.0, 0.0));
        assert!(!c.is_tap(MS_100, 0.0, -10.0));
        assert!(!c.is_tap(MS_200, 0.0, 0.0));
    }

    #[test]
    fn medium_move_is_nothing() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 0.0, 1, Duration::ZERO), false);
        assert!(gs.process(&up(0.0, 30.0, MS_100), false).is_empty());
    }

    #[test]
    fn swipe_horizontal_directions() {
        let mut gs = GestureSession::default();
        gs.process(&down(200.0, 100.0, 1, Duration::ZERO), false);
        let events = gs.process(&up(120.0, 110.0, ms(300)), false);
        assert_eq!(
            events,
            vec![GestureEvent::Swipe {
                direction: SwipeDirection::Left,
                distance: 80.0,
            }]
        );
    }

    #[test]
    fn three_finger_tap_carries_count() {
        let mut gs = GestureSession::default();
        gs.process(&down(10.0, 10.0, 1, Duration::ZERO), false);
        gs.process(&down(30.0, 10.0, 3, ms(5)), false);
        gs.process(&PointerEvent::touch(PointerPhase::Up, 30.0, 10.0, 2, ms(60)), false);
        gs.process(&PointerEvent::touch(PointerPhase::Up, 30.0, 10.0, 1, ms(70)), false);
        let events = gs.process(&up(12.0, 11.0, ms(80)), false);
        assert!(matches!(
            events.as_slice(),
            [GestureEvent::Tap {
                finger_count: 3,
                ..
            }]
        ));
    }

    #[test]
    fn mouse_click_is_single_finger_tap() {
        let mut gs = GestureSession::default();
        gs.process(
            &PointerEvent::mouse(PointerPhase::Down, 5.0, 5.0, Duration::ZERO),
            false,
        );
        let events = gs.process(&PointerEvent::mouse(PointerPhase::Up, 5.0, 5.0, ms(40)), false);
        assert!(matches!(
            events.as_slice(),
            [GestureEvent::Tap {
                finger_count: 1,
                ..
            }]
        ));
    }

    #[test]
    fn cancelled_contact_emits_nothing() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 0.0, 1, Duration::ZERO), true);
        gs.process(
            &PointerEvent::touch(PointerPhase::Cancel, 0.0, 0.0, 0, ms(20)),
            true,
        );
        assert!(!gs.is_tracking_contact());
        assert!(gs.process(&up(0.0, 0.0, ms(40)), true).is_empty());
    }

    // --- Direction changes ---

    #[test]
    fn no_direction_signals_without_tracking() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 500.0, 1, Duration::ZERO), false);
        for step in 1..=10 {
            let events = gs.process(&mv(0.0, 500.0 - 20.0 * step as f64, ms(step * 16)), false);
            assert!(events.is_empty());
        }
    }

    #[test]
    fn direction_change_measured_from_last_check() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 500.0, 1, Duration::ZERO), true);

        let events = gs.process(&mv(0.0, 460.0, ms(16)), true);
        assert!(events
            .iter()
            .all(|e| !matches!(e, GestureEvent::DirectionChange { .. })));

        let events = gs.process(&mv(0.0, 450.0, ms(32)), true);
        assert!(events.contains(&GestureEvent::DirectionChange {
            direction: SwipeDirection::Up
        }));

        // 40px more from the new check point is not enough.
        let events = gs.process(&mv(0.0, 410.0, ms(48)), true);
        assert!(events
            .iter()
            .all(|e| !matches!(e, GestureEvent::DirectionChange { .. })));
    }

    #[test]
    fn drag_down_then_left_emits_both_directions() {
        let mut gs = GestureSession::default();
        gs.process(&down(300.0, 100.0, 1, Duration::ZERO), true);
        let mut all = Vec::new();
        all.extend(gs.process(&mv(300.0, 160.0, ms(16)), true));
        all.extend(gs.process(&mv(230.0, 165.0, ms(32)), true));
        let changes: Vec<_> = all
            .iter()
            .filter_map(|e| match e {
                GestureEvent::DirectionChange { direction } => Some(*direction),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![SwipeDirection::Down, SwipeDirection::Left]);
    }

    // --- Speed ticks ---

    #[test]
    fn speed_ticks_carry_remainder() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 500.0, 1, Duration::ZERO), true);
        let mut ticks = 0;
        for step in 1..=5 {
            // 20px steps: ticks at 30, 60, 90 → 3 ticks over 100px.
            let events = gs.process(&mv(0.0, 500.0 - 20.0 * step as f64, ms(step * 16)), true);
            ticks += events
                .iter()
                .filter(|e| matches!(e, GestureEvent::SpeedTick { .. }))
                .count();
        }
        assert_eq!(ticks, 3);
    }

    #[test]
    fn speed_tick_direction_follows_motion() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 100.0, 1, Duration::ZERO), true);
        let events = gs.process(&mv(0.0, 135.0, ms(16)), true);
        assert!(events.contains(&GestureEvent::SpeedTick {
            direction: SwipeDirection::Down
        }));
    }

    #[test]
    fn reversal_restarts_tick_accumulator() {
        let mut tracker = DirectionTracker::new(Position::new(0.0, 100.0));
        let config = GestureConfig::default();
        let mut out = Vec::new();
        tracker.observe(Position::new(0.0, 80.0), &config, &mut out);
        assert_eq!(tracker.tick_remainder(), 20.0);
        tracker.observe(Position::new(0.0, 95.0), &config, &mut out);
        assert_eq!(tracker.tick_remainder(), 15.0);
        assert!(out.is_empty());
    }

    #[test]
    fn straddling_samples_carry_direction_overshoot() {
        let mut tracker = DirectionTracker::new(Position::new(0.0, 0.0));
        let config = GestureConfig::default();
        let mut out = Vec::new();
        // 40px samples: 40, 80, 120. Thresholds sit at 50 and 100.
        for y in [40.0, 80.0, 120.0] {
            tracker.observe(Position::new(0.0, y), &config, &mut out);
        }
        let changes = out
            .iter()
            .filter(|e| matches!(e, GestureEvent::DirectionChange { .. }))
            .count();
        assert_eq!(changes, 2);

        // One 110px jump crosses two thresholds at once.
        let mut tracker = DirectionTracker::new(Position::new(0.0, 0.0));
        let mut out = Vec::new();
        tracker.observe(Position::new(0.0, -110.0), &config, &mut out);
        assert_eq!(
            out,
            vec![
                GestureEvent::DirectionChange {
                    direction: SwipeDirection::Up
                },
                GestureEvent::DirectionChange {
                    direction: SwipeDirection::Up
                },
                GestureEvent::SpeedTick {
                    direction: SwipeDirection::Up
                },
                GestureEvent::SpeedTick {
                    direction: SwipeDirection::Up
                },
                GestureEvent::SpeedTick {
                    direction: SwipeDirection::Up
                },
            ]
        );
        assert_eq!(tracker.tick_remainder(), 20.0);
    }

    #[test]
    fn huge_jump_is_bounded() {
        let mut tracker = DirectionTracker::new(Position::new(0.0, 0.0));
        let config = GestureConfig::default();
        let mut out = Vec::new();
        tracker.observe(Position::new(0.0, 1e300), &config, &mut out);
        assert_eq!(out.len(), 2 * MAX_SIGNALS_PER_SAMPLE);
        assert!(tracker.tick_remainder() < config.speed_tick_distance);

        out.clear();
        tracker.observe(Position::new(f64::NAN, 10.0), &config, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn zig_zag_drag_never_ticks_below_threshold() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 500.0, 1, Duration::ZERO), true);
        let mut events = Vec::new();
        // 25px each way: without the reversal reset this would tick every
        // other sample.
        for i in 1..=12u64 {
            let y = if i % 2 == 1 { 475.0 } else { 500.0 };
            events.extend(gs.process(&mv(0.0, y, ms(i * 16)), true));
        }
        assert!(events.is_empty());

        // The last leg went down; a 60px pull up starts from zero.
        events.extend(gs.process(&mv(0.0, 440.0, ms(300)), true));
        let ticks: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GestureEvent::SpeedTick { direction } => Some(*direction),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![SwipeDirection::Up, SwipeDirection::Up]);
    }

    #[test]
    fn horizontal_samples_do_not_tick() {
        let mut tracker = DirectionTracker::new(Position::new(0.0, 0.0));
        let config = GestureConfig::default();
        let mut out = Vec::new();
        tracker.observe(Position::new(40.0, 5.0), &config, &mut out);
        assert_eq!(tracker.tick_remainder(), 0.0);
        assert!(out.is_empty());
    }

    #[test]
    fn direction_change_does_not_reset_ticks() {
        let mut tracker = DirectionTracker::new(Position::new(0.0, 0.0));
        let config = GestureConfig::default();
        let mut out = Vec::new();
        tracker.observe(Position::new(0.0, 50.0), &config, &mut out);
        assert!(out.contains(&GestureEvent::DirectionChange {
            direction: SwipeDirection::Down
        }));
        assert_eq!(tracker.tick_remainder(), 20.0);
    }

    #[test]
    fn enabling_tracking_mid_drag_does_not_burst() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 0.0, 1, Duration::ZERO), false);
        gs.process(&mv(0.0, 200.0, ms(16)), false);
        let events = gs.process(&mv(0.0, 210.0, ms(32)), true);
        assert!(events.is_empty());
    }

    // --- Session management ---

    #[test]
    fn reset_clears_contact() {
        let mut gs = GestureSession::default();
        gs.process(&down(0.0, 0.0, 1, Duration::ZERO), true);
        assert!(gs.is_tracking_contact());
        gs.reset();
        assert!(!gs.is_tracking_contact());
        assert!(gs.contact().is_none());
    }

    #[test]
    fn custom_thresholds_apply() {
        let mut gs = GestureSession::new(GestureConfig {
            swipe_min_distance: 20.0,
            ..GestureConfig::default()
        });
        gs.process(&down(0.0, 0.0, 1, Duration::ZERO), false);
        let events = gs.process(&up(0.0, 25.0, ms(300)), false);
        assert!(matches!(
            events.as_slice(),
            [GestureEvent::Swipe {
                direction: SwipeDirection::Down,
                ..
            }]
        ));
        gs.set_config(GestureConfig::default());
        assert_eq!(gs.config().swipe_min_distance, 50.0);
    }

    #[test]
    fn default_config_values() {
        let config = GestureConfig::default();
        assert_eq!(config.tap_max_duration, MS_200);
        assert_eq!(config.tap_max_distance, 10.0);
        assert_eq!(config.swipe_min_distance, 50.0);
        assert_eq!(config.direction_change_distance, 50.0);
        assert_eq!(config.speed_tick_distance, 30.0);
    }
}
