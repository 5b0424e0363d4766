#![forbid(unsafe_code)]

//! Kinetic autoscroll: a frame-driven integrator over the document offset.
//!
//! # State Machine
//!
//! ```text
//! Inactive --start()--> Scrolling --pause()--> Paused --resume()--> Scrolling
//! {Scrolling, Paused} --stop()--> Inactive
//! Scrolling --[end of content]--> Inactive
//! ```
//!
//! # Integration
//!
//! Each frame moves `speed × elapsed` pixels, where `elapsed` is measured
//! from the previous frame (the first frame after a start or resume moves
//! nothing). Two modes, selected by speed:
//!
//! - **Low speed** (below [`LOW_SPEED_CROSSOVER`]): a fractional absolute
//!   target accumulates and is applied with `scroll_to` every frame, clamped
//!   to the document.
//! - **High speed**: fractional pixels accumulate in a remainder; whole
//!   pixels are applied with `scroll_by` and the fraction carries forward.
//!
//! # Invariants
//!
//! 1. `speed ∈ [min, max]` of the latest configuration whenever it is read
//!    or adjusted, even if the bounds arrive inverted.
//! 2. Speed never changes while `Inactive` except the reset on `start()`.
//! 3. At most one frame request is pending, and only while `Scrolling`.
//! 4. The next frame is requested only after the current frame's work.
//! 5. After `stop()` or end-of-content, no frame moves the document until
//!    the next `start()`. Stale frame ids are ignored.
//!
//! # Failure Modes
//!
//! Surface and scheduler errors propagate to the caller with the engine's
//! pending frame already released; the router then stops the engine.

use core::time::Duration;

use kinescroll_backend::{
    FrameId, FrameScheduler, HostClock, Platform, ScrollMetrics, ScrollSurface,
};
use kinescroll_core::config::ScrollConfig;

/// Distance from the content end that counts as "at the end" (px).
pub const END_OF_CONTENT_TOLERANCE: f64 = 10.0;

/// Speed (px/s) below which frames position the document absolutely.
pub const LOW_SPEED_CROSSOVER: f64 = 60.0;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollState {
    #[default]
    Inactive,
    Scrolling,
    Paused,
}

impl ScrollState {
    /// `Scrolling` or `Paused`.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Scrolling | Self::Paused)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Scrolling => "scrolling",
            Self::Paused => "paused",
        }
    }
}

/// Which integrator moved the document on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrationMode {
    /// Absolute positioning through `scroll_to`.
    LowSpeed,
    /// Whole-pixel `scroll_by` with a carried remainder.
    HighSpeed,
}

/// A speed adjustment that was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedChange {
    pub previous: f64,
    pub speed: f64,
}

/// Result of delivering a frame to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Not the pending frame, or the engine is not scrolling.
    Ignored,
    /// The document moved by `delta` px (possibly zero).
    Advanced { mode: IntegrationMode, delta: f64 },
    /// End of content: the engine is now `Inactive`.
    EndOfContent,
}

/// The autoscroll engine. One per page activation.
#[derive(Debug, Clone, Default)]
pub struct ScrollEngine {
    state: ScrollState,
    speed: f64,
    pending_frame: Option<FrameId>,
    last_frame_at: Option<Duration>,
    target_offset: Option<f64>,
    remainder: f64,
}

impl ScrollEngine {
    /// Create an inactive engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> ScrollState {
        self.state
    }

    /// Current speed in px/s.
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// `Scrolling` or `Paused`.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether frames are moving the document.
    #[inline]
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.state == ScrollState::Scrolling
    }

    /// The outstanding frame request, if any.
    #[inline]
    #[must_use]
    pub const fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    /// Sub-pixel distance carried into the next high-speed frame.
    #[must_use]
    pub const fn remainder(&self) -> f64 {
        self.remainder
    }

    /// Whether `metrics` describe a document scrolled to its end.
    #[must_use]
    pub fn is_at_end(metrics: &ScrollMetrics) -> bool {
        metrics.is_at_end(END_OF_CONTENT_TOLERANCE)
    }

    fn reset_integrator(&mut self) {
        self.last_frame_at = None;
        self.target_offset = None;
        self.remainder = 0.0;
    }

    fn release_frame<P: Platform>(&mut self, platform: &mut P) {
        if let Some(id) = self.pending_frame.take() {
            platform.frames().cancel_frame(id);
        }
    }

    fn schedule<P: Platform>(&mut self, platform: &mut P) -> Result<(), P::Error> {
        self.pending_frame = Some(platform.frames().request_frame()?);
        Ok(())
    }

    /// Begin scrolling at the configured default speed.
    ///
    /// Returns `Ok(false)` unless the engine was `Inactive`. If the first
    /// frame cannot be requested the engine stays `Inactive`.
    pub fn start<P: Platform>(
        &mut self,
        config: &ScrollConfig,
        platform: &mut P,
    ) -> Result<bool, P::Error> {
        if self.state != ScrollState::Inactive {
            return Ok(false);
        }
        self.reset_integrator();
        self.speed = config.initial_speed();
        self.state = ScrollState::Scrolling;
        if let Err(err) = self.schedule(platform) {
            self.state = ScrollState::Inactive;
            return Err(err);
        }
        tracing::debug!(
            target: "kinescroll.engine",
            speed = self.speed,
            state = self.state.as_str(),
            "autoscroll started"
        );
        Ok(true)
    }

    /// Go `Inactive` from any state and cancel the pending frame.
    ///
    /// Returns whether the engine was active.
    pub fn stop<P: Platform>(&mut self, platform: &mut P) -> bool {
        self.release_frame(platform);
        self.reset_integrator();
        let was_active = self.state.is_active();
        self.state = ScrollState::Inactive;
        if was_active {
            tracing::debug!(target: "kinescroll.engine", "autoscroll stopped");
        }
        was_active
    }

    /// `Scrolling → Paused`. The frame loop is cancelled, not skipped.
    pub fn pause<P: Platform>(&mut self, platform: &mut P) -> bool {
        if self.state != ScrollState::Scrolling {
            return false;
        }
        self.release_frame(platform);
        self.reset_integrator();
        self.state = ScrollState::Paused;
        tracing::debug!(target: "kinescroll.engine", speed = self.speed, "autoscroll paused");
        true
    }

    /// `Paused → Scrolling`.
    pub fn resume<P: Platform>(&mut self, platform: &mut P) -> Result<bool, P::Error> {
        if self.state != ScrollState::Paused {
            return Ok(false);
        }
        self.reset_integrator();
        self.state = ScrollState::Scrolling;
        self.schedule(platform)?;
        tracing::debug!(target: "kinescroll.engine", speed = self.speed, "autoscroll resumed");
        Ok(true)
    }

    /// Raise the speed by one step. `None` while `Inactive`.
    pub fn increase_speed(&mut self, config: &ScrollConfig) -> Option<SpeedChange> {
        self.adjust_speed(config, config.speed_step())
    }

    /// Lower the speed by one step. `None` while `Inactive`.
    pub fn decrease_speed(&mut self, config: &ScrollConfig) -> Option<SpeedChange> {
        self.adjust_speed(config, -config.speed_step())
    }

    fn adjust_speed(&mut self, config: &ScrollConfig, step: f64) -> Option<SpeedChange> {
        if !self.state.is_active() {
            return None;
        }
        let bounds = config.speed_bounds();
        let previous = bounds.clamp(self.speed);
        self.speed = bounds.clamp(previous + step);
        tracing::debug!(
            target: "kinescroll.engine",
            previous,
            speed = self.speed,
            "speed adjusted"
        );
        Some(SpeedChange {
            previous,
            speed: self.speed,
        })
    }

    /// Advance one frame.
    ///
    /// Checks end-of-content before moving, then integrates, then requests
    /// the next frame.
    pub fn on_frame<P: Platform>(
        &mut self,
        frame: FrameId,
        config: &ScrollConfig,
        platform: &mut P,
    ) -> Result<FrameOutcome, P::Error> {
        if self.state != ScrollState::Scrolling || self.pending_frame != Some(frame) {
            return Ok(FrameOutcome::Ignored);
        }
        self.pending_frame = None;

        let now = platform.clock().now_mono();
        let elapsed = self
            .last_frame_at
            .map_or(Duration::ZERO, |prev| now.saturating_sub(prev));
        self.last_frame_at = Some(now);
        self.speed = config.speed_bounds().clamp(self.speed);

        let metrics = platform.surface().metrics()?;
        if Self::is_at_end(&metrics) {
            self.reset_integrator();
            self.state = ScrollState::Inactive;
            tracing::debug!(
                target: "kinescroll.engine",
                offset = metrics.offset,
                content_height = metrics.content_height,
                "end of content"
            );
            return Ok(FrameOutcome::EndOfContent);
        }

        let distance = self.speed * elapsed.as_secs_f64();
        let (mode, delta) = if self.speed < LOW_SPEED_CROSSOVER {
            self.remainder = 0.0;
            let base = self.target_offset.unwrap_or(metrics.offset);
            let target = metrics.clamp_offset(base + distance);
            self.target_offset = Some(target);
            platform.surface().scroll_to(target)?;
            (IntegrationMode::LowSpeed, target - metrics.offset)
        } else {
            self.target_offset = None;
            self.remainder += distance;
            let whole = self.remainder.floor();
            if whole >= 1.0 {
                self.remainder -= whole;
                platform.surface().scroll_by(whole)?;
                (IntegrationMode::HighSpeed, whole)
            } else {
                (IntegrationMode::HighSpeed, 0.0)
            }
        };

        tracing::trace!(
            target: "kinescroll.engine",
            elapsed_us = elapsed.as_micros() as u64,
            delta,
            speed = self.speed,
            "frame advanced"
        );

        self.schedule(platform)?;
        Ok(FrameOutcome::Advanced { mode, delta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinescroll_backend::testing::{FakePlatform, SurfaceOp};

    const FRAME: Duration = Duration::from_millis(16);

    fn doc() -> FakePlatform {
        FakePlatform::with_document(400.0, 800.0, 10_000.0)
    }

    fn config(min: f64, max: f64, default: f64, granularity: f64) -> ScrollConfig {
        ScrollConfig {
            min_speed: min,
            max_speed: max,
            default_speed: default,
            granularity,
            ..ScrollConfig::default()
        }
    }

    fn pump(engine: &mut ScrollEngine, cfg: &ScrollConfig, p: &mut FakePlatform) -> FrameOutcome {
        let id = p.next_frame(FRAME).expect("frame pending");
        engine.on_frame(id, cfg, p).expect("fake platform")
    }

    #[test]
    fn start_resets_speed_and_requests_frame() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        assert!(e.start(&config(1.0, 50.0, 20.0, 10.0), &mut p).unwrap());
        assert_eq!(e.state(), ScrollState::Scrolling);
        assert_eq!(e.speed(), 20.0);
        assert_eq!(p.frames.pending().len(), 1);
    }

    #[test]
    fn start_is_noop_unless_inactive() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = ScrollConfig::default();
        e.start(&cfg, &mut p).unwrap();
        e.increase_speed(&cfg);
        assert!(!e.start(&cfg, &mut p).unwrap());
        assert_eq!(e.speed(), cfg.default_speed + cfg.granularity);
        assert_eq!(p.frames.requested, 1);
    }

    #[test]
    fn increase_clamps_at_max() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(1.0, 50.0, 20.0, 10.0);
        e.start(&cfg, &mut p).unwrap();
        let speeds: Vec<f64> = (0..4)
            .filter_map(|_| e.increase_speed(&cfg).map(|c| c.speed))
            .collect();
        assert_eq!(speeds, vec![30.0, 40.0, 50.0, 50.0]);
    }

    #[test]
    fn speed_frozen_while_inactive() {
        let mut e = ScrollEngine::new();
        let cfg = ScrollConfig::default();
        assert_eq!(e.increase_speed(&cfg), None);
        assert_eq!(e.decrease_speed(&cfg), None);
        assert_eq!(e.speed(), 0.0);
    }

    #[test]
    fn adjust_survives_inverted_bounds() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(80.0, 20.0, 50.0, 10.0);
        e.start(&cfg, &mut p).unwrap();
        for _ in 0..10 {
            e.increase_speed(&cfg);
        }
        assert_eq!(e.speed(), 80.0);
    }

    #[test]
    fn first_frame_moves_nothing() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        e.start(&ScrollConfig::default(), &mut p).unwrap();
        let out = pump(&mut e, &ScrollConfig::default(), &mut p);
        assert_eq!(
            out,
            FrameOutcome::Advanced {
                mode: IntegrationMode::LowSpeed,
                delta: 0.0
            }
        );
        assert_eq!(p.offset(), 0.0);
    }

    #[test]
    fn low_speed_uses_absolute_target() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(10.0, 500.0, 50.0, 10.0);
        e.start(&cfg, &mut p).unwrap();
        pump(&mut e, &cfg, &mut p);
        for _ in 0..5 {
            pump(&mut e, &cfg, &mut p);
        }
        // 5 × 16ms at 50px/s = 4px, applied as fractional absolute targets.
        assert!((p.offset() - 4.0).abs() < 1e-9);
        assert!(
            p.surface
                .ops
                .iter()
                .all(|op| matches!(op, SurfaceOp::ScrollTo(_)))
        );
    }

    #[test]
    fn high_speed_applies_whole_pixels_with_remainder() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(10.0, 500.0, 100.0, 10.0);
        e.start(&cfg, &mut p).unwrap();
        pump(&mut e, &cfg, &mut p);
        // 16ms at 100px/s = 1.6px → 1px applied, 0.6 carried.
        let out = pump(&mut e, &cfg, &mut p);
        assert_eq!(
            out,
            FrameOutcome::Advanced {
                mode: IntegrationMode::HighSpeed,
                delta: 1.0
            }
        );
        assert!((e.remainder() - 0.6).abs() < 1e-9);
        // Next frame: 0.6 + 1.6 = 2.2 → 2px applied.
        pump(&mut e, &cfg, &mut p);
        assert_eq!(p.offset(), 3.0);
        assert!(
            p.surface
                .ops
                .iter()
                .all(|op| matches!(op, SurfaceOp::ScrollBy(d) if d.fract() == 0.0))
        );
    }

    #[test]
    fn end_of_content_stops_before_moving() {
        let mut p = FakePlatform::with_document(400.0, 800.0, 1800.0);
        p.surface.metrics.offset = 990.0;
        let mut e = ScrollEngine::new();
        let cfg = ScrollConfig::default();
        e.start(&cfg, &mut p).unwrap();
        assert_eq!(pump(&mut e, &cfg, &mut p), FrameOutcome::EndOfContent);
        assert_eq!(e.state(), ScrollState::Inactive);
        assert!(p.surface.ops.is_empty());
        assert!(p.frames.pending().is_empty());
    }

    #[test]
    fn pause_cancels_frame_and_resume_restarts_clock() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(10.0, 500.0, 100.0, 10.0);
        e.start(&cfg, &mut p).unwrap();
        pump(&mut e, &cfg, &mut p);
        assert!(e.pause(&mut p));
        assert!(p.frames.pending().is_empty());
        assert_eq!(p.frames.cancelled, 1);

        p.clock.advance(Duration::from_secs(10));
        assert!(e.resume(&mut p).unwrap());
        // The pause gap is not integrated.
        pump(&mut e, &cfg, &mut p);
        assert_eq!(p.offset(), 0.0);
    }

    #[test]
    fn pause_and_resume_only_from_matching_state() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        assert!(!e.pause(&mut p));
        assert!(!e.resume(&mut p).unwrap());
        e.start(&ScrollConfig::default(), &mut p).unwrap();
        assert!(!e.resume(&mut p).unwrap());
    }

    #[test]
    fn stale_frame_after_stop_is_ignored() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = ScrollConfig::default();
        e.start(&cfg, &mut p).unwrap();
        let stale = e.pending_frame().unwrap();
        assert!(e.stop(&mut p));
        assert!(!e.stop(&mut p));
        assert_eq!(
            e.on_frame(stale, &cfg, &mut p).unwrap(),
            FrameOutcome::Ignored
        );
        assert!(p.surface.ops.is_empty());
    }

    #[test]
    fn speed_changes_while_paused_apply_on_resume() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = config(10.0, 500.0, 100.0, 50.0);
        e.start(&cfg, &mut p).unwrap();
        e.pause(&mut p);
        assert_eq!(e.increase_speed(&cfg).map(|c| c.speed), Some(150.0));
        e.resume(&mut p).unwrap();
        pump(&mut e, &cfg, &mut p);
        pump(&mut e, &cfg, &mut p);
        // 16ms at 150px/s = 2.4px → 2px.
        assert_eq!(p.offset(), 2.0);
    }

    #[test]
    fn tightened_bounds_apply_at_next_frame() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        e.start(&ScrollConfig::default(), &mut p).unwrap();
        let tighter = config(10.0, 30.0, 20.0, 10.0);
        pump(&mut e, &tighter, &mut p);
        assert_eq!(e.speed(), 30.0);
    }

    #[test]
    fn surface_error_releases_frame() {
        let mut p = doc();
        let mut e = ScrollEngine::new();
        let cfg = ScrollConfig::default();
        e.start(&cfg, &mut p).unwrap();
        p.surface.fail_with = Some("detached".into());
        let id = p.next_frame(FRAME).unwrap();
        assert!(e.on_frame(id, &cfg, &mut p).is_err());
        assert_eq!(e.pending_frame(), None);
    }
}
