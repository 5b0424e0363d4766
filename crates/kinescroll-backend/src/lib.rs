#![forbid(unsafe_code)]
#![doc = "Platform traits for kinescroll: the thin adapter between the scroll runtime and a host page."]
#![doc = ""]
#![doc = "The runtime never touches a DOM, a window, or a wall clock directly. Time,"]
#![doc = "scroll position, and frame scheduling all flow through the traits below, so"]
#![doc = "the engine and router run unchanged in unit tests, in a headless host, and"]
#![doc = "behind `wasm-bindgen` in a browser (`kinescroll-web`)."]

pub mod ports;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

use core::time::Duration;

pub use ports::{
    Action, ActionSink, ActivityGate, AlwaysActive, ConfigStore, DomInteractivity,
    InteractivePredicate, MemoryConfigStore, NoPersistence, SpeedPersistence,
};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Monotonic clock abstraction.
///
/// Native hosts use [`SystemClock`]; browser hosts forward `performance.now()`.
/// The runtime never reads the wall clock itself.
pub trait HostClock {
    /// Elapsed time since an unspecified epoch, monotonically non-decreasing.
    fn now_mono(&self) -> Duration;
}

/// [`HostClock`] backed by `web_time::Instant`, which maps to
/// `performance.now()` on `wasm32` and `std::time::Instant` elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: web_time::Instant,
}

impl SystemClock {
    /// A clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: web_time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.epoch.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Scroll surface
// ---------------------------------------------------------------------------

/// Geometry of the scrolling document, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Current vertical scroll offset.
    pub offset: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Total scrollable content height.
    pub content_height: f64,
}

impl ScrollMetrics {
    /// Largest reachable offset.
    #[must_use]
    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// Clamp `offset` into `[0, max_offset]`.
    #[must_use]
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        if offset.is_nan() {
            return 0.0;
        }
        offset.max(0.0).min(self.max_offset())
    }

    /// Whether the viewport bottom is within `tolerance` of the content end.
    #[must_use]
    pub fn is_at_end(&self, tolerance: f64) -> bool {
        self.offset + self.viewport_height >= self.content_height - tolerance
    }
}

/// The document scroll position.
pub trait ScrollSurface {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Read the current geometry.
    fn metrics(&self) -> Result<ScrollMetrics, Self::Error>;

    /// Set the absolute offset. Hosts clamp to the document.
    fn scroll_to(&mut self, offset: f64) -> Result<(), Self::Error>;

    /// Move by a whole-pixel delta. Hosts clamp to the document.
    fn scroll_by(&mut self, delta: f64) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// Frame scheduling
// ---------------------------------------------------------------------------

/// Handle for a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Display-synchronized callback scheduling (`requestAnimationFrame`).
///
/// A requested frame is delivered back to the runtime by the host exactly
/// once, unless cancelled first.
pub trait FrameScheduler {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Request one frame callback.
    fn request_frame(&mut self) -> Result<FrameId, Self::Error>;

    /// Cancel a pending request. Unknown or already-fired ids are ignored.
    fn cancel_frame(&mut self, id: FrameId);
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Unified platform combining clock, scroll surface, and frame scheduler.
///
/// The runtime is generic over this trait. Implementations:
/// - `kinescroll-web::WebHost`: host-driven, records commands for JS.
/// - `testing::FakePlatform`: in-memory document for tests.
pub trait Platform {
    /// Platform-specific error type shared across sub-traits.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Clock implementation.
    type Clock: HostClock;

    /// Scroll surface implementation.
    type Surface: ScrollSurface<Error = Self::Error>;

    /// Frame scheduler implementation.
    type Frames: FrameScheduler<Error = Self::Error>;

    /// Access the monotonic clock.
    fn clock(&self) -> &Self::Clock;

    /// Access the scroll surface.
    fn surface(&mut self) -> &mut Self::Surface;

    /// Access the frame scheduler.
    fn frames(&mut self) -> &mut Self::Frames;
}
