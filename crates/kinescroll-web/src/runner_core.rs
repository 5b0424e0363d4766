#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping a [`GestureRouter`] over a
//! [`WebHost`].
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;
use std::sync::Arc;

use kinescroll_backend::{Action, FrameId, HostClock, Platform, ScrollMetrics};
use kinescroll_core::config::{ConfigError, ConfigHandle, ScrollConfig};
use kinescroll_runtime::{Disposition, GestureRouter, RouterPorts, ScrollState};

use crate::input_parser::{HostInput, InputParseError, parse_host_input};
use crate::{HostCommand, SiteGate, WebHost};

/// Host-facing autoscroll runner.
///
/// Actions and the latest speed to persist are queued until the host drains
/// them; commands live in the [`WebHost`] outbox.
pub struct RunnerCore {
    router: GestureRouter<WebHost>,
    gate: SiteGate,
    actions: Rc<RefCell<Vec<Action>>>,
    persisted_speed: Rc<Cell<Option<f64>>>,
    rejected_inputs: u64,
}

impl RunnerCore {
    /// Create a runner with `config`, active on the current site.
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        let gate = SiteGate::new(true);
        let actions = Rc::new(RefCell::new(Vec::new()));
        let persisted_speed = Rc::new(Cell::new(None));

        let ports = RouterPorts::default()
            .with_gate(gate.clone())
            .with_actions({
                let actions = Rc::clone(&actions);
                move |action: Action| actions.borrow_mut().push(action)
            })
            .with_persistence({
                let persisted_speed = Rc::clone(&persisted_speed);
                move |speed: f64| persisted_speed.set(Some(speed))
            });

        Self {
            router: GestureRouter::new(WebHost::new(), ConfigHandle::new(config), ports),
            gate,
            actions,
            persisted_speed,
            rejected_inputs: 0,
        }
    }

    /// Parse and route one JSON-encoded input.
    pub fn push_input(&mut self, json: &str) -> Result<Disposition, InputParseError> {
        match parse_host_input(json) {
            Ok(input) => Ok(self.handle_input(&input)),
            Err(err) => {
                self.rejected_inputs += 1;
                tracing::warn!(target: "kinescroll.web", error = %err, "input rejected");
                Err(err)
            }
        }
    }

    /// Route an already-decoded input.
    pub fn handle_input(&mut self, input: &HostInput) -> Disposition {
        match input {
            HostInput::Pointer(event) => {
                self.advance_clock_to(event.timestamp);
                self.router.handle_pointer(event)
            }
            HostInput::Wheel(event) => {
                self.advance_clock_to(event.timestamp);
                self.router.handle_wheel(event)
            }
        }
    }

    /// Deliver a `requestAnimationFrame` callback at host time `now_ms`.
    ///
    /// Unknown or cancelled ids are dropped.
    pub fn frame(&mut self, id: u64, now_ms: f64) {
        self.set_time_ms(now_ms);
        let id = FrameId(id);
        if self.router.platform_mut().acknowledge_frame(id) {
            self.router.on_frame(id);
        } else {
            tracing::trace!(target: "kinescroll.web", frame = id.0, "unknown frame dropped");
        }
    }

    /// Move the host clock forward to `ms`. Non-finite, negative, and
    /// backwards values are ignored.
    pub fn set_time_ms(&mut self, ms: f64) -> bool {
        if !ms.is_finite() || ms < 0.0 {
            return false;
        }
        match Duration::try_from_secs_f64(ms / 1000.0) {
            Ok(now) => self.advance_clock_to(now),
            Err(_) => false,
        }
    }

    fn advance_clock_to(&mut self, now: Duration) -> bool {
        let host = self.router.platform_mut();
        if now < host.clock().now_mono() {
            return false;
        }
        host.clock_mut().set(now);
        true
    }

    /// Report the page's scroll geometry.
    pub fn set_metrics(
        &mut self,
        offset: f64,
        viewport_width: f64,
        viewport_height: f64,
        content_height: f64,
    ) {
        self.router.platform_mut().set_metrics(ScrollMetrics {
            offset,
            viewport_width,
            viewport_height,
            content_height,
        });
    }

    /// Replace the configuration from JSON (camelCase keys, missing keys
    /// take defaults). Out-of-range values are logged and clamped at use.
    pub fn set_config_json(&mut self, json: &str) -> Result<(), ConfigError> {
        let config = ScrollConfig::from_json_str(json)?;
        let problems = config.validate();
        if !problems.is_empty() {
            tracing::warn!(
                target: "kinescroll.web",
                problems = %problems.join("; "),
                "configuration accepted with problems"
            );
        }
        self.router.push_config(config);
        Ok(())
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<ScrollConfig> {
        self.router.config().load()
    }

    /// Toggle activation for the current site. Closing the gate stops
    /// everything immediately.
    pub fn set_site_active(&mut self, active: bool) {
        self.gate.set(active);
        self.router.sync_gate();
    }

    #[must_use]
    pub fn is_site_active(&self) -> bool {
        self.gate.get()
    }

    /// Attach or detach the page.
    pub fn set_attached(&mut self, attached: bool) {
        self.router.platform_mut().set_attached(attached);
    }

    /// Stop autoscroll (popup or keyboard shortcut).
    pub fn stop(&mut self) -> bool {
        self.router.stop()
    }

    /// Navigation away: stop everything silently.
    pub fn teardown(&mut self) {
        self.router.teardown();
    }

    #[must_use]
    pub fn state(&self) -> ScrollState {
        self.router.state()
    }

    /// Current speed (px/s); meaningful while active.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.router.engine().speed()
    }

    #[must_use]
    pub fn is_tap_scrolling(&self) -> bool {
        self.router.tap_scroll().is_running()
    }

    /// Inputs that failed to parse since creation.
    #[must_use]
    pub const fn rejected_inputs(&self) -> u64 {
        self.rejected_inputs
    }

    /// Take queued host commands in issue order.
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        self.router.platform_mut().drain_commands()
    }

    /// Take queued actions in emission order.
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut *self.actions.borrow_mut())
    }

    /// Latest speed to persist since the last call, if any.
    pub fn take_persisted_speed(&mut self) -> Option<f64> {
        self.persisted_speed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn runner() -> RunnerCore {
        let mut core = RunnerCore::new(ScrollConfig::default());
        core.set_metrics(0.0, 400.0, 800.0, 10_000.0);
        core
    }

    fn touch(core: &mut RunnerCore, phase: &str, x: f64, y: f64, touches: u8, t: f64) -> Disposition {
        core.push_input(&format!(
            r#"{{"kind":"pointer","phase":"{phase}","x":{x},"y":{y},"touches":{touches},"t":{t}}}"#
        ))
        .unwrap()
    }

    fn tap(core: &mut RunnerCore, fingers: u8, x: f64, t: f64) {
        touch(core, "down", x, 300.0, fingers, t);
        touch(core, "up", x, 300.0, 0, t + 50.0);
    }

    fn requested_frame(commands: &[HostCommand]) -> u64 {
        commands
            .iter()
            .rev()
            .find_map(|c| match c {
                HostCommand::RequestFrame { id } => Some(id.0),
                _ => None,
            })
            .expect("a frame was requested")
    }

    #[test]
    fn two_finger_tap_starts_and_frames_scroll() {
        let mut core = runner();
        tap(&mut core, 2, 100.0, 1000.0);
        assert_eq!(core.state(), ScrollState::Scrolling);
        assert_eq!(core.take_actions(), vec![Action::Activated { speed: 50.0 }]);

        let commands = core.take_commands();
        assert_eq!(commands.len(), 1);
        let first = requested_frame(&commands);

        // First frame only anchors the timeline.
        core.frame(first, 1100.0);
        let commands = core.take_commands();
        assert_eq!(commands[0], HostCommand::ScrollTo { offset: 0.0 });
        let second = requested_frame(&commands);

        core.frame(second, 1300.0);
        let commands = core.take_commands();
        assert_eq!(commands[0], HostCommand::ScrollTo { offset: 10.0 });
    }

    #[test]
    fn unknown_frame_is_dropped() {
        let mut core = runner();
        core.frame(42, 16.0);
        assert!(core.take_commands().is_empty());
        assert_eq!(core.state(), ScrollState::Inactive);
    }

    #[test]
    fn single_tap_while_scrolling_pauses() {
        let mut core = runner();
        tap(&mut core, 2, 100.0, 0.0);
        core.take_actions();
        core.take_commands();

        tap(&mut core, 1, 100.0, 500.0);
        assert_eq!(core.state(), ScrollState::Paused);
        assert_eq!(
            core.take_actions(),
            vec![Action::PausedStateChanged { paused: true }]
        );
        assert!(matches!(
            core.take_commands().as_slice(),
            [HostCommand::CancelFrame { .. }]
        ));
    }

    #[test]
    fn single_tap_while_inactive_pages_down() {
        let mut core = runner();
        tap(&mut core, 1, 300.0, 0.0);
        assert!(core.is_tap_scrolling());
        let mut commands = core.take_commands();
        let mut now = 50.0;
        let mut last = None;
        while core.is_tap_scrolling() {
            now += 16.0;
            core.frame(requested_frame(&commands), now);
            commands = core.take_commands();
            if let Some(HostCommand::ScrollTo { offset }) = commands.first() {
                last = Some(*offset);
            }
        }
        assert_eq!(last, Some(720.0));
    }

    #[test]
    fn vertical_drag_adjusts_and_persists_speed() {
        let mut core = runner();
        tap(&mut core, 2, 100.0, 0.0);
        core.take_actions();

        assert_eq!(touch(&mut core, "down", 200.0, 400.0, 1, 200.0), Disposition::PassThrough);
        assert_eq!(touch(&mut core, "move", 200.0, 380.0, 1, 220.0), Disposition::Consumed);
        touch(&mut core, "move", 200.0, 360.0, 1, 240.0);
        touch(&mut core, "move", 200.0, 340.0, 1, 260.0);
        touch(&mut core, "up", 200.0, 340.0, 0, 280.0);

        let speeds: Vec<f64> = core
            .take_actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::SpeedChanged { speed } => Some(speed),
                _ => None,
            })
            .collect();
        assert!(!speeds.is_empty());
        assert_eq!(core.take_persisted_speed(), speeds.last().copied());
        assert_eq!(core.take_persisted_speed(), None);
    }

    #[test]
    fn closing_site_gate_stops_immediately() {
        let mut core = runner();
        tap(&mut core, 2, 100.0, 0.0);
        core.take_actions();
        tap(&mut core, 1, 100.0, 300.0);
        assert_eq!(core.state(), ScrollState::Paused);
        core.take_actions();

        core.set_site_active(false);
        assert_eq!(core.state(), ScrollState::Inactive);
        assert_eq!(core.take_actions(), vec![Action::Deactivated]);

        tap(&mut core, 2, 100.0, 600.0);
        assert_eq!(core.state(), ScrollState::Inactive);
        assert!(!core.is_site_active());
    }

    #[test]
    fn three_finger_tap_toggles_site_even_when_gated() {
        let mut core = runner();
        core.set_site_active(false);
        tap(&mut core, 3, 100.0, 0.0);
        assert_eq!(core.take_actions(), vec![Action::ToggleSiteActivation]);
    }

    #[test]
    fn wheel_down_starts_autoscroll() {
        let mut core = runner();
        let disposition = core
            .push_input(r#"{"kind":"wheel","dy":100,"mods":0,"t":10}"#)
            .unwrap();
        assert_eq!(disposition, Disposition::Consumed);
        assert_eq!(core.state(), ScrollState::Scrolling);

        let disposition = core
            .push_input(r#"{"kind":"wheel","dy":100,"mods":4,"t":20}"#)
            .unwrap();
        assert_eq!(disposition, Disposition::PassThrough);
    }

    #[test]
    fn bad_input_is_counted_and_harmless() {
        let mut core = runner();
        assert!(core.push_input("{").is_err());
        assert!(core.push_input(r#"{"kind":"focus"}"#).is_err());
        assert_eq!(core.rejected_inputs(), 2);
        assert_eq!(core.state(), ScrollState::Inactive);
        assert!(core.take_commands().is_empty());
    }

    #[test]
    fn config_push_uses_camel_case_and_defaults() {
        let mut core = runner();
        core.set_config_json(r#"{"defaultSpeed":120,"tapNavigationEnabled":false}"#)
            .unwrap();
        let config = core.config();
        assert_eq!(config.default_speed, 120.0);
        assert!(!config.tap_navigation_enabled);
        assert_eq!(config.max_speed, ScrollConfig::default().max_speed);

        tap(&mut core, 1, 300.0, 0.0);
        assert!(!core.is_tap_scrolling());

        assert!(core.set_config_json("[1,2]").is_err());
    }

    #[test]
    fn detached_page_fails_start() {
        let mut core = runner();
        core.set_attached(false);
        tap(&mut core, 2, 100.0, 0.0);
        assert_eq!(core.state(), ScrollState::Inactive);
        assert!(matches!(
            core.take_actions().as_slice(),
            [Action::Failure { .. }]
        ));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut core = runner();
        assert!(core.set_time_ms(100.0));
        assert!(!core.set_time_ms(50.0));
        assert!(!core.set_time_ms(f64::NAN));
        assert!(!core.set_time_ms(-1.0));
        assert!(core.set_time_ms(100.0));
    }

    #[test]
    fn teardown_is_silent() {
        let mut core = runner();
        tap(&mut core, 2, 100.0, 0.0);
        core.take_actions();
        core.teardown();
        assert_eq!(core.state(), ScrollState::Inactive);
        assert!(core.take_actions().is_empty());
        assert!(matches!(
            core.take_commands().last(),
            Some(HostCommand::CancelFrame { .. })
        ));
    }
}
