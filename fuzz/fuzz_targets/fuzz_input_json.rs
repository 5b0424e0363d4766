#![no_main]

use kinescroll_core::config::ScrollConfig;
use kinescroll_runtime::ScrollState;
use kinescroll_web::input_parser::parse_host_input;
use kinescroll_web::runner_core::RunnerCore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // The parser must never panic, whatever the page script sends.
    let _ = parse_host_input(text);

    // Each line is one event through a live runner.
    let mut core = RunnerCore::new(ScrollConfig::default());
    core.set_metrics(0.0, 400.0, 800.0, 20_000.0);
    let mut now = 0.0;
    for line in text.lines() {
        let _ = core.push_input(line);
        now += 16.0;
        for command in core.take_commands() {
            if let kinescroll_web::HostCommand::RequestFrame { id } = command {
                core.frame(id.0, now);
            }
        }
    }

    if core.state() != ScrollState::Inactive {
        let bounds = core.config().speed_bounds();
        assert!(bounds.contains(core.speed()), "speed {} escaped bounds", core.speed());
    }
    core.teardown();
    assert_eq!(core.state(), ScrollState::Inactive);
});
