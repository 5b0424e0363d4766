#![forbid(unsafe_code)]

//! Discrete page-up / page-down motion with an eased transition.
//!
//! A trigger computes a target one tap-scroll distance away (clamped to the
//! document) and animates the absolute offset toward it over
//! [`TAP_SCROLL_DURATION`] with cubic ease-out. While an animation is in
//! flight further triggers are ignored; the lock releases only on completion
//! or cancellation.

use core::time::Duration;

use kinescroll_backend::{FrameId, FrameScheduler, HostClock, Platform, ScrollSurface};
use kinescroll_core::animation::{self, EasingFn};
use kinescroll_core::config::{PageDirection, ScrollConfig};

/// Length of one tap-scroll animation.
pub const TAP_SCROLL_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flight {
    from: f64,
    to: f64,
    started_at: Duration,
}

/// Result of delivering a frame to the animator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapFrame {
    /// Not the pending frame.
    Ignored,
    /// Moved to `offset`; more frames follow.
    Animating { offset: f64 },
    /// Reached the target; the animator is idle again.
    Completed { offset: f64 },
}

/// Eased page-up/page-down animator.
#[derive(Debug, Clone)]
pub struct TapScrollAnimator {
    duration: Duration,
    easing: EasingFn,
    flight: Option<Flight>,
    pending_frame: Option<FrameId>,
}

impl Default for TapScrollAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TapScrollAnimator {
    /// 500ms cubic ease-out.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timing(TAP_SCROLL_DURATION, animation::ease_out_cubic)
    }

    /// Custom duration and curve.
    #[must_use]
    pub fn with_timing(duration: Duration, easing: EasingFn) -> Self {
        Self {
            duration,
            easing,
            flight: None,
            pending_frame: None,
        }
    }

    /// Whether an animation holds the lock.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flight.is_some()
    }

    /// Offset the running animation ends at.
    #[must_use]
    pub fn target(&self) -> Option<f64> {
        self.flight.map(|f| f.to)
    }

    #[inline]
    #[must_use]
    pub const fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    /// Start a page move. Returns `Ok(false)` when already animating or when
    /// the document cannot move further in `direction`.
    pub fn trigger<P: Platform>(
        &mut self,
        direction: PageDirection,
        config: &ScrollConfig,
        platform: &mut P,
    ) -> Result<bool, P::Error> {
        if self.flight.is_some() {
            tracing::trace!(target: "kinescroll.tap_scroll", "trigger ignored: animation in flight");
            return Ok(false);
        }
        let metrics = platform.surface().metrics()?;
        let distance = config.tap_scroll_distance(metrics.viewport_height);
        let to = metrics.clamp_offset(metrics.offset + direction.sign() * distance);
        if to == metrics.offset {
            return Ok(false);
        }
        let id = platform.frames().request_frame()?;
        self.flight = Some(Flight {
            from: metrics.offset,
            to,
            started_at: platform.clock().now_mono(),
        });
        self.pending_frame = Some(id);
        tracing::debug!(
            target: "kinescroll.tap_scroll",
            from = metrics.offset,
            to,
            "tap scroll started"
        );
        Ok(true)
    }

    /// Apply one animation frame.
    pub fn on_frame<P: Platform>(
        &mut self,
        frame: FrameId,
        platform: &mut P,
    ) -> Result<TapFrame, P::Error> {
        let Some(flight) = self.flight else {
            return Ok(TapFrame::Ignored);
        };
        if self.pending_frame != Some(frame) {
            return Ok(TapFrame::Ignored);
        }
        self.pending_frame = None;

        let elapsed = platform
            .clock()
            .now_mono()
            .saturating_sub(flight.started_at);
        let t = animation::progress(elapsed, self.duration);
        let offset = flight.from + (flight.to - flight.from) * (self.easing)(t);

        if let Err(err) = platform.surface().scroll_to(offset) {
            self.flight = None;
            return Err(err);
        }
        if t >= 1.0 {
            self.flight = None;
            tracing::debug!(target: "kinescroll.tap_scroll", offset, "tap scroll completed");
            return Ok(TapFrame::Completed { offset });
        }
        match platform.frames().request_frame() {
            Ok(id) => {
                self.pending_frame = Some(id);
                Ok(TapFrame::Animating { offset })
            }
            Err(err) => {
                self.flight = None;
                Err(err)
            }
        }
    }

    /// Abandon the animation and release the lock.
    pub fn cancel<P: Platform>(&mut self, platform: &mut P) -> bool {
        if let Some(id) = self.pending_frame.take() {
            platform.frames().cancel_frame(id);
        }
        self.flight.take().is_some()
    }
}
