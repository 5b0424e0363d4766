//! Property-based tests for gesture classification.
//!
//! 1. **Tap/swipe partition**: a released contact is a tap iff it was short
//!    and still on both axes; otherwise a swipe iff the dominant-axis travel
//!    reached the swipe distance; never both.
//!
//! 2. **Distance law**: a monotone vertical drag of length `L`, sampled at
//!    arbitrary step sizes, emits exactly `⌊L / 50⌋` direction changes and
//!    `⌊L / 30⌋` speed ticks.
//!
//! 3. **Reversal reset**: sub-tick legs that keep reversing never tick.
//!
//! 4. **No signals without tracking**: the mid-contact streams are silent
//!    unless the caller asks for them.
//!
//! 5. **Cancel is silent**: no gesture ever follows a cancel.

use std::time::Duration;

use kinescroll_core::event::{PointerEvent, PointerPhase};
use kinescroll_core::gesture::{GestureConfig, GestureSession};
use kinescroll_core::semantic_event::{GestureEvent, SwipeDirection};
use proptest::prelude::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn release_gestures(elapsed_ms: u64, dx: f64, dy: f64) -> Vec<GestureEvent> {
    let mut session = GestureSession::default();
    session.process(
        &PointerEvent::touch(PointerPhase::Down, 500.0, 500.0, 1, Duration::ZERO),
        false,
    );
    session.process(
        &PointerEvent::touch(PointerPhase::Up, 500.0 + dx, 500.0 + dy, 0, ms(elapsed_ms)),
        false,
    )
}

fn count(events: &[GestureEvent], pred: impl Fn(&GestureEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn tap_swipe_partition(
        elapsed_ms in 1u64..400,
        dx in -200i32..200,
        dy in -200i32..200,
    ) {
        let (dx, dy) = (f64::from(dx), f64::from(dy));
        let events = release_gestures(elapsed_ms, dx, dy);

        let is_tap = elapsed_ms < 200 && dx.abs() < 10.0 && dy.abs() < 10.0;
        let is_swipe = !is_tap && dx.abs().max(dy.abs()) >= 50.0;

        let taps = count(&events, GestureEvent::is_tap);
        let swipes = count(&events, |e| matches!(e, GestureEvent::Swipe { .. }));

        prop_assert_eq!(taps, usize::from(is_tap));
        prop_assert_eq!(swipes, usize::from(is_swipe));
        prop_assert!(taps + swipes <= 1);
    }

    #[test]
    fn swipe_direction_follows_dominant_axis(
        dx in -200i32..200,
        dy in -200i32..200,
    ) {
        let (dx, dy) = (f64::from(dx), f64::from(dy));
        let events = release_gestures(300, dx, dy);
        if let [GestureEvent::Swipe { direction, distance }] = events.as_slice() {
            if dx.abs() > dy.abs() {
                prop_assert!(direction.is_horizontal());
                prop_assert_eq!(*distance, dx.abs());
            } else {
                prop_assert!(direction.is_vertical());
                prop_assert_eq!(*distance, dy.abs());
            }
        }
    }

    #[test]
    fn vertical_drag_distance_law(
        steps in prop::collection::vec(1u32..=80, 0..60),
        upward in any::<bool>(),
    ) {
        let sign = if upward { -1.0 } else { 1.0 };
        let config = GestureConfig::default();
        let mut session = GestureSession::new(config.clone());

        session.process(
            &PointerEvent::touch(PointerPhase::Down, 200.0, 5000.0, 1, Duration::ZERO),
            true,
        );
        let mut events = Vec::new();
        let mut length = 0.0;
        for (i, step) in steps.iter().enumerate() {
            length += f64::from(*step);
            let t = ms(16 * (i as u64 + 1));
            events.extend(session.process(
                &PointerEvent::touch(PointerPhase::Move, 200.0, 5000.0 + sign * length, 1, t),
                true,
            ));
        }

        let expected_dir = if upward { SwipeDirection::Up } else { SwipeDirection::Down };
        let changes = count(&events, |e| matches!(e, GestureEvent::DirectionChange { .. }));
        let ticks = count(&events, |e| matches!(e, GestureEvent::SpeedTick { .. }));

        prop_assert_eq!(changes, (length / config.direction_change_distance).floor() as usize);
        prop_assert_eq!(ticks, (length / config.speed_tick_distance).floor() as usize);
        prop_assert!(events.iter().all(|e| e.direction() == Some(expected_dir)));
    }

    #[test]
    fn reversal_discards_partial_tick(
        legs in prop::collection::vec(1u32..30, 1..40),
    ) {
        // Every leg is shorter than one tick and reverses the previous one,
        // so no tick may ever fire.
        let mut session = GestureSession::default();
        session.process(
            &PointerEvent::touch(PointerPhase::Down, 0.0, 5000.0, 1, Duration::ZERO),
            true,
        );
        let mut y = 5000.0;
        for (i, leg) in legs.iter().enumerate() {
            let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
            y += sign * f64::from(*leg);
            let t = ms(16 * (i as u64 + 1));
            let events = session.process(&PointerEvent::touch(PointerPhase::Move, 0.0, y, 1, t), true);
            prop_assert_eq!(count(&events, |e| matches!(e, GestureEvent::SpeedTick { .. })), 0);
        }
    }

    #[test]
    fn no_signals_without_tracking(
        moves in prop::collection::vec((-80i32..80, -80i32..80), 0..40),
    ) {
        let mut session = GestureSession::default();
        session.process(
            &PointerEvent::touch(PointerPhase::Down, 0.0, 0.0, 1, Duration::ZERO),
            false,
        );
        let (mut x, mut y) = (0.0, 0.0);
        for (i, (dx, dy)) in moves.iter().enumerate() {
            x += f64::from(*dx);
            y += f64::from(*dy);
            let t = ms(16 * (i as u64 + 1));
            let events = session.process(&PointerEvent::touch(PointerPhase::Move, x, y, 1, t), false);
            prop_assert!(events.is_empty());
        }
    }

    #[test]
    fn cancel_is_silent(
        fingers in 1u8..5,
        dx in -200i32..200,
        dy in -200i32..200,
    ) {
        let mut session = GestureSession::default();
        session.process(
            &PointerEvent::touch(PointerPhase::Down, 0.0, 0.0, fingers, Duration::ZERO),
            true,
        );
        session.process(
            &PointerEvent::touch(PointerPhase::Cancel, f64::from(dx), f64::from(dy), 0, ms(30)),
            true,
        );
        let events = session.process(
            &PointerEvent::touch(PointerPhase::Up, f64::from(dx), f64::from(dy), 0, ms(60)),
            true,
        );
        prop_assert!(events.is_empty());
        prop_assert!(!session.is_tracking_contact());
    }
}
