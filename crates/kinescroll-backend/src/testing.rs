#![forbid(unsafe_code)]

//! In-memory platform for tests.
//!
//! [`FakePlatform`] simulates a document: scroll calls move a stored offset
//! (clamped to the content), frame requests are queued until the test fires
//! them, and the clock only moves when told to.

use core::time::Duration;

use crate::{FrameId, FrameScheduler, HostClock, Platform, ScrollMetrics, ScrollSurface};

/// Error raised by the fakes when a failure is injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeError(pub String);

impl core::fmt::Display for FakeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "fake platform error: {}", self.0)
    }
}

impl std::error::Error for FakeError {}

/// Clock that moves only when told.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl HostClock for ManualClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// A recorded surface mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceOp {
    ScrollTo(f64),
    ScrollBy(f64),
}

/// Simulated document.
#[derive(Debug, Clone, Default)]
pub struct FakeSurface {
    pub metrics: ScrollMetrics,
    pub ops: Vec<SurfaceOp>,
    /// When set, every call fails with this message.
    pub fail_with: Option<String>,
}

impl FakeSurface {
    fn check(&self) -> Result<(), FakeError> {
        match &self.fail_with {
            Some(msg) => Err(FakeError(msg.clone())),
            None => Ok(()),
        }
    }
}

impl ScrollSurface for FakeSurface {
    type Error = FakeError;

    fn metrics(&self) -> Result<ScrollMetrics, FakeError> {
        self.check()?;
        Ok(self.metrics)
    }

    fn scroll_to(&mut self, offset: f64) -> Result<(), FakeError> {
        self.check()?;
        self.ops.push(SurfaceOp::ScrollTo(offset));
        self.metrics.offset = self.metrics.clamp_offset(offset);
        Ok(())
    }

    fn scroll_by(&mut self, delta: f64) -> Result<(), FakeError> {
        self.check()?;
        self.ops.push(SurfaceOp::ScrollBy(delta));
        self.metrics.offset = self.metrics.clamp_offset(self.metrics.offset + delta);
        Ok(())
    }
}

/// Frame scheduler holding at most one pending request per id.
#[derive(Debug, Clone, Default)]
pub struct FakeFrames {
    next_id: u64,
    pending: Vec<FrameId>,
    pub requested: u64,
    pub cancelled: u64,
}

impl FakeFrames {
    /// Requests not yet fired or cancelled.
    #[must_use]
    pub fn pending(&self) -> &[FrameId] {
        &self.pending
    }

    /// Remove and return the oldest pending request.
    pub fn take_next(&mut self) -> Option<FrameId> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameScheduler for FakeFrames {
    type Error = FakeError;

    fn request_frame(&mut self) -> Result<FrameId, FakeError> {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.pending.push(id);
        self.requested += 1;
        Ok(id)
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let before = self.pending.len();
        self.pending.retain(|p| *p != id);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

/// In-memory [`Platform`].
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    pub clock: ManualClock,
    pub surface: FakeSurface,
    pub frames: FakeFrames,
}

impl FakePlatform {
    /// A document of `content_height` in a `width × height` viewport.
    #[must_use]
    pub fn with_document(width: f64, height: f64, content_height: f64) -> Self {
        Self {
            surface: FakeSurface {
                metrics: ScrollMetrics {
                    offset: 0.0,
                    viewport_width: width,
                    viewport_height: height,
                    content_height,
                },
                ..FakeSurface::default()
            },
            ..Self::default()
        }
    }

    /// Current scroll offset.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.surface.metrics.offset
    }

    /// Advance the clock by `dt` and pop the oldest pending frame.
    pub fn next_frame(&mut self, dt: Duration) -> Option<FrameId> {
        self.clock.advance(dt);
        self.frames.take_next()
    }
}

impl Platform for FakePlatform {
    type Error = FakeError;
    type Clock = ManualClock;
    type Surface = FakeSurface;
    type Frames = FakeFrames;

    fn clock(&self) -> &ManualClock {
        &self.clock
    }

    fn surface(&mut self) -> &mut FakeSurface {
        &mut self.surface
    }

    fn frames(&mut self) -> &mut FakeFrames {
        &mut self.frames
    }
}
