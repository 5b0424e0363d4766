#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use kinescroll_backend::testing::FakePlatform;
use kinescroll_core::config::{ConfigHandle, ScrollConfig};
use kinescroll_core::event::{PointerEvent, PointerPhase, WheelEvent};
use kinescroll_runtime::{GestureRouter, RouterPorts};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Step {
    Pointer {
        phase: u8,
        x: i16,
        y: i16,
        touches: u8,
        dt_ms: u8,
    },
    Wheel {
        dy: i16,
        dt_ms: u8,
    },
    Frames(u8),
    Stop,
}

#[derive(Debug, Arbitrary)]
struct Script {
    min_speed: u16,
    max_speed: u16,
    granularity: u8,
    content_height: u16,
    steps: Vec<Step>,
}

fuzz_target!(|script: Script| {
    let config = ScrollConfig {
        min_speed: f64::from(script.min_speed),
        max_speed: f64::from(script.max_speed),
        granularity: f64::from(script.granularity),
        ..ScrollConfig::default()
    };
    let bounds = config.speed_bounds();
    let platform =
        FakePlatform::with_document(400.0, 800.0, f64::from(script.content_height) * 4.0);
    let mut router = GestureRouter::new(platform, ConfigHandle::new(config), RouterPorts::default());
    let mut now = Duration::ZERO;

    for step in script.steps.iter().take(512) {
        match *step {
            Step::Pointer {
                phase,
                x,
                y,
                touches,
                dt_ms,
            } => {
                now += Duration::from_millis(u64::from(dt_ms));
                let phase = match phase % 4 {
                    0 => PointerPhase::Down,
                    1 => PointerPhase::Move,
                    2 => PointerPhase::Up,
                    _ => PointerPhase::Cancel,
                };
                let event =
                    PointerEvent::touch(phase, f64::from(x), f64::from(y), touches % 6, now);
                router.handle_pointer(&event);
            }
            Step::Wheel { dy, dt_ms } => {
                now += Duration::from_millis(u64::from(dt_ms));
                router.handle_wheel(&WheelEvent::new(f64::from(dy), now));
            }
            Step::Frames(n) => {
                for _ in 0..n % 32 {
                    let Some(id) = router.platform_mut().next_frame(Duration::from_millis(16)) else {
                        break;
                    };
                    router.on_frame(id);
                }
            }
            Step::Stop => {
                router.stop();
            }
        }

        assert!(!(router.engine().is_active() && router.tap_scroll().is_running()));
        if router.engine().is_active() {
            assert!(bounds.contains(router.engine().speed()));
        }
        let metrics = router.platform().surface.metrics;
        assert!(metrics.offset >= 0.0 && metrics.offset <= metrics.max_offset());
    }
});
