#![forbid(unsafe_code)]

//! Gesture routing: the policy that binds classified gestures to the engine,
//! the tap-scroll animator, and the host's collaborators.
//!
//! The same gesture means different things depending on engine state:
//!
//! | Engine | Gesture | Effect |
//! |---|---|---|
//! | any | 3-finger tap | [`Action::ToggleSiteActivation`] (works even when the gate is closed) |
//! | any | 4-finger tap | [`Action::EnterElementPick`] |
//! | inactive | 2-finger tap | start |
//! | active | 1-finger tap | pause / resume |
//! | inactive | 1-finger tap off interactive elements | tap-scroll in the tap-zone direction |
//! | active | vertical speed signal | faster (up) / slower (down) |
//! | active | horizontal direction change or swipe | stop + [`Action::Deactivated`] |
//! | inactive | plain wheel-down | start |
//!
//! # Invariants
//!
//! 1. The engine and the tap-scroll animator never run together: taps only
//!    animate while the engine is inactive, and starting the engine cancels
//!    any animation.
//! 2. With the activity gate closed nothing but the 3-finger tap has an
//!    effect, and closing the gate stops a running scroll.
//! 3. The configuration snapshot is reloaded at every entry point.
//!
//! # Failure Modes
//!
//! Platform errors never escape. Both animators stop, pending frames are
//! cancelled, and an [`Action::Failure`] reaches the sink.

use core::fmt::Display;

use kinescroll_backend::{
    Action, ActionSink, ActivityGate, AlwaysActive, DomInteractivity, FrameId,
    InteractivePredicate, NoPersistence, Platform, ScrollSurface, SpeedPersistence,
};
use kinescroll_core::config::{ConfigHandle, ScrollConfig, SpeedAdjustSource};
use kinescroll_core::event::{PointerEvent, PointerPhase, WheelEvent};
use kinescroll_core::gesture::{GestureConfig, GestureSession};
use kinescroll_core::interactive::ElementTarget;
use kinescroll_core::semantic_event::{GestureEvent, Position, SwipeDirection};

use crate::scroll_engine::{FrameOutcome, ScrollEngine, ScrollState};
use crate::tap_scroll::TapScrollAnimator;

/// Whether the host should suppress the platform's default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Disposition {
    /// The router acted on the event; call `preventDefault()`.
    Consumed,
    /// Let the page handle the event.
    #[default]
    PassThrough,
}

impl Disposition {
    #[inline]
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }

    fn or(self, other: Self) -> Self {
        if self.is_consumed() { self } else { other }
    }
}

/// The collaborators a router talks to.
pub struct RouterPorts {
    pub actions: Box<dyn ActionSink>,
    pub persistence: Box<dyn SpeedPersistence>,
    pub gate: Box<dyn ActivityGate>,
    pub interactive: Box<dyn InteractivePredicate>,
}

impl Default for RouterPorts {
    fn default() -> Self {
        Self {
            actions: Box::new(|_action: Action| {}),
            persistence: Box::new(NoPersistence),
            gate: Box::new(AlwaysActive),
            interactive: Box::new(DomInteractivity),
        }
    }
}

impl RouterPorts {
    /// Builder: set the action sink.
    #[must_use]
    pub fn with_actions(mut self, sink: impl ActionSink + 'static) -> Self {
        self.actions = Box::new(sink);
        self
    }

    /// Builder: set the speed persistence callback.
    #[must_use]
    pub fn with_persistence(mut self, persistence: impl SpeedPersistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    /// Builder: set the activity gate.
    #[must_use]
    pub fn with_gate(mut self, gate: impl ActivityGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    /// Builder: set the interactive-element predicate.
    #[must_use]
    pub fn with_interactive(mut self, predicate: impl InteractivePredicate + 'static) -> Self {
        self.interactive = Box::new(predicate);
        self
    }
}

impl core::fmt::Debug for RouterPorts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouterPorts").finish_non_exhaustive()
    }
}

/// Per-page gesture policy over one [`Platform`].
#[derive(Debug)]
pub struct GestureRouter<P: Platform> {
    platform: P,
    config: ConfigHandle,
    ports: RouterPorts,
    session: GestureSession,
    engine: ScrollEngine,
    tap_scroll: TapScrollAnimator,
}

impl<P: Platform> GestureRouter<P> {
    /// Create a router with default gesture thresholds.
    pub fn new(platform: P, config: ConfigHandle, ports: RouterPorts) -> Self {
        Self {
            platform,
            config,
            ports,
            session: GestureSession::default(),
            engine: ScrollEngine::new(),
            tap_scroll: TapScrollAnimator::new(),
        }
    }

    /// Builder: replace the gesture thresholds.
    #[must_use]
    pub fn with_gesture_config(mut self, config: GestureConfig) -> Self {
        self.session.set_config(config);
        self
    }

    // --- accessors ---

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[inline]
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    #[inline]
    pub fn engine(&self) -> &ScrollEngine {
        &self.engine
    }

    #[inline]
    pub fn tap_scroll(&self) -> &TapScrollAnimator {
        &self.tap_scroll
    }

    #[inline]
    pub fn state(&self) -> ScrollState {
        self.engine.state()
    }

    /// The live configuration handle.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Accept a configuration push. Takes effect at the next checkpoint.
    pub fn push_config(&mut self, config: ScrollConfig) {
        tracing::debug!(
            target: "kinescroll.router",
            min_speed = config.min_speed,
            max_speed = config.max_speed,
            "configuration pushed"
        );
        self.config.store(config);
    }

    // --- entry points ---

    /// Feed one pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Disposition {
        let active = self.check_gate();
        let tracking = active && self.engine.is_active();
        let gestures = self.session.process(event, tracking);

        let mut disposition = if tracking
            && event.phase == PointerPhase::Move
            && self.session.is_tracking_contact()
        {
            Disposition::Consumed
        } else {
            Disposition::PassThrough
        };

        for gesture in gestures {
            disposition = disposition.or(self.route(gesture, active));
        }
        disposition
    }

    /// Feed one wheel event.
    pub fn handle_wheel(&mut self, event: &WheelEvent) -> Disposition {
        if !self.check_gate() {
            return Disposition::PassThrough;
        }
        let config = self.config.load();
        if self.engine.state() == ScrollState::Inactive
            && config.autoscroll_enabled
            && event.is_plain_scroll_down()
        {
            tracing::debug!(target: "kinescroll.router", delta_y = event.delta_y, "wheel start");
            if self.start_engine(&config) {
                return Disposition::Consumed;
            }
        }
        Disposition::PassThrough
    }

    /// Deliver a frame callback.
    pub fn on_frame(&mut self, frame: FrameId) {
        if !self.check_gate() {
            return;
        }
        let config = self.config.load();

        if self.engine.pending_frame() == Some(frame) {
            match self.engine.on_frame(frame, &config, &mut self.platform) {
                Ok(FrameOutcome::EndOfContent) => {
                    self.emit(Action::EndOfContent {
                        chain_navigation: config.chain_navigation_enabled,
                    });
                }
                Ok(_) => {}
                Err(err) => self.fail(err),
            }
        } else if self.tap_scroll.pending_frame() == Some(frame) {
            if let Err(err) = self.tap_scroll.on_frame(frame, &mut self.platform) {
                self.fail(err);
            }
        } else {
            tracing::trace!(target: "kinescroll.router", frame = frame.0, "stale frame ignored");
        }
    }

    /// Stop autoscroll from any state. Returns whether it was active.
    pub fn stop(&mut self) -> bool {
        let stopped = self.engine.stop(&mut self.platform);
        if stopped {
            self.emit(Action::Deactivated);
        }
        stopped
    }

    /// Tear down for navigation-away: stop everything and forget the contact.
    ///
    /// The router stays usable afterwards.
    pub fn teardown(&mut self) {
        self.engine.stop(&mut self.platform);
        self.tap_scroll.cancel(&mut self.platform);
        self.session.reset();
        tracing::debug!(target: "kinescroll.router", "router torn down");
    }

    /// Re-read the activity gate outside of an input or frame callback.
    ///
    /// A closed gate stops everything exactly as it would at the next entry
    /// point. Returns whether the gate is open.
    pub fn sync_gate(&mut self) -> bool {
        self.check_gate()
    }

    // --- routing ---

    fn check_gate(&mut self) -> bool {
        if self.ports.gate.is_active() {
            return true;
        }
        self.tap_scroll.cancel(&mut self.platform);
        if self.engine.stop(&mut self.platform) {
            tracing::debug!(target: "kinescroll.router", "activity gate closed");
            self.emit(Action::Deactivated);
        }
        false
    }

    fn route(&mut self, gesture: GestureEvent, active: bool) -> Disposition {
        match gesture {
            GestureEvent::Tap {
                finger_count,
                pos,
                target,
            } => self.route_tap(finger_count, pos, target.as_ref(), active),
            _ if !active || !self.engine.is_active() => Disposition::PassThrough,
            GestureEvent::DirectionChange { direction } if direction.is_horizontal() => {
                self.deactivate("horizontal drag");
                Disposition::Consumed
            }
            GestureEvent::Swipe { direction, .. } if direction.is_horizontal() => {
                self.deactivate("horizontal swipe");
                Disposition::Consumed
            }
            GestureEvent::DirectionChange { direction } => {
                self.adjust_from(SpeedAdjustSource::DirectionChange, direction)
            }
            GestureEvent::SpeedTick { direction } => {
                self.adjust_from(SpeedAdjustSource::DistanceTicks, direction)
            }
            GestureEvent::Swipe { .. } => Disposition::PassThrough,
        }
    }

    fn route_tap(
        &mut self,
        finger_count: u8,
        pos: Position,
        target: Option<&ElementTarget>,
        active: bool,
    ) -> Disposition {
        if finger_count == 3 {
            self.emit(Action::ToggleSiteActivation);
            return Disposition::Consumed;
        }
        if !active {
            return Disposition::PassThrough;
        }
        let config = self.config.load();
        match finger_count {
            0 => Disposition::PassThrough,
            1 if self.engine.is_active() => {
                self.toggle_pause();
                Disposition::Consumed
            }
            1 => self.tap_navigate(pos, target, &config),
            2 => {
                if self.engine.state() == ScrollState::Inactive
                    && config.autoscroll_enabled
                    && self.start_engine(&config)
                {
                    Disposition::Consumed
                } else {
                    Disposition::PassThrough
                }
            }
            _ => {
                self.emit(Action::EnterElementPick);
                Disposition::Consumed
            }
        }
    }

    fn tap_navigate(
        &mut self,
        pos: Position,
        target: Option<&ElementTarget>,
        config: &ScrollConfig,
    ) -> Disposition {
        if !config.tap_navigation_enabled {
            return Disposition::PassThrough;
        }
        if target.is_some_and(|t| self.ports.interactive.is_interactive(t)) {
            tracing::trace!(target: "kinescroll.router", "tap on interactive element passed through");
            return Disposition::PassThrough;
        }
        let metrics = match self.platform.surface().metrics() {
            Ok(metrics) => metrics,
            Err(err) => {
                self.fail(err);
                return Disposition::PassThrough;
            }
        };
        let direction = config.tap_zone_layout.direction_for(
            pos,
            metrics.viewport_width,
            metrics.viewport_height,
            config.tap_zone_split,
        );
        match self.tap_scroll.trigger(direction, config, &mut self.platform) {
            Ok(true) => Disposition::Consumed,
            Ok(false) => Disposition::PassThrough,
            Err(err) => {
                self.fail(err);
                Disposition::PassThrough
            }
        }
    }

    fn start_engine(&mut self, config: &ScrollConfig) -> bool {
        self.tap_scroll.cancel(&mut self.platform);
        match self.engine.start(config, &mut self.platform) {
            Ok(true) => {
                self.emit(Action::Activated {
                    speed: self.engine.speed(),
                });
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    fn toggle_pause(&mut self) {
        match self.engine.state() {
            ScrollState::Scrolling => {
                if self.engine.pause(&mut self.platform) {
                    self.emit(Action::PausedStateChanged { paused: true });
                }
            }
            ScrollState::Paused => match self.engine.resume(&mut self.platform) {
                Ok(true) => self.emit(Action::PausedStateChanged { paused: false }),
                Ok(false) => {}
                Err(err) => self.fail(err),
            },
            ScrollState::Inactive => {}
        }
    }

    fn adjust_from(&mut self, source: SpeedAdjustSource, direction: SwipeDirection) -> Disposition {
        let config = self.config.load();
        if !config.speed_adjust_source.drives(source) {
            return Disposition::PassThrough;
        }
        // Finger moving up speeds the scroll up.
        let change = match direction {
            SwipeDirection::Up => self.engine.increase_speed(&config),
            SwipeDirection::Down => self.engine.decrease_speed(&config),
            SwipeDirection::Left | SwipeDirection::Right => None,
        };
        let Some(change) = change else {
            return Disposition::PassThrough;
        };
        self.ports.persistence.on_speed_changed(change.speed);
        self.emit(Action::SpeedChanged {
            speed: change.speed,
        });
        Disposition::Consumed
    }

    fn deactivate(&mut self, reason: &'static str) {
        if self.engine.stop(&mut self.platform) {
            tracing::debug!(target: "kinescroll.router", reason, "deactivated by gesture");
            self.emit(Action::Deactivated);
        }
    }

    fn fail(&mut self, err: impl Display) {
        let message = err.to_string();
        tracing::warn!(target: "kinescroll.router", error = %message, "platform failure");
        self.engine.stop(&mut self.platform);
        self.tap_scroll.cancel(&mut self.platform);
        self.emit(Action::Failure { message });
    }

    fn emit(&mut self, action: Action) {
        tracing::debug!(target: "kinescroll.router", kind = action.kind(), "action");
        self.ports.actions.on_action(action);
    }
}
