#![forbid(unsafe_code)]

//! `kinescroll-web` runs the autoscroll runtime inside a browser page.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding script pushes pointer, wheel, frame,
//!   and geometry updates; the runtime never touches the DOM itself.
//! - **Deterministic time**: the host stamps every frame with its own clock.
//! - **Command outbox**: scroll moves and frame requests are recorded as
//!   [`HostCommand`]s that JS drains and applies after each call.
//!
//! The `wasm-bindgen` surface ([`AutoscrollRunner`]) is compiled only for
//! `wasm32`; everything else builds and tests natively.

#[cfg(feature = "input-parser")]
pub mod input_parser;
#[cfg(feature = "input-parser")]
pub mod runner_core;
#[cfg(all(target_arch = "wasm32", feature = "input-parser"))]
mod wasm;

#[cfg(all(target_arch = "wasm32", feature = "input-parser"))]
pub use wasm::AutoscrollRunner;

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use kinescroll_backend::{
    ActivityGate, FrameId, FrameScheduler, HostClock, Platform, ScrollMetrics, ScrollSurface,
};

/// Web platform error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebHostError {
    /// The host has not provided what the operation needs.
    Unsupported(&'static str),
    /// The page detached the runner (navigation, hidden document).
    Detached,
}

impl core::fmt::Display for WebHostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Self::Detached => write!(f, "host document detached"),
        }
    }
}

impl std::error::Error for WebHostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl HostClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// A side effect the JS host must perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    /// `window.scrollTo(0, offset)`.
    ScrollTo { offset: f64 },
    /// `window.scrollBy(0, delta)`.
    ScrollBy { delta: f64 },
    /// `requestAnimationFrame`, answering with `id`.
    RequestFrame { id: FrameId },
    /// `cancelAnimationFrame` for `id`.
    CancelFrame { id: FrameId },
}

impl HostCommand {
    /// Stable identifier used in the JS payload.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::ScrollTo { .. } => "scrollTo",
            Self::ScrollBy { .. } => "scrollBy",
            Self::RequestFrame { .. } => "requestFrame",
            Self::CancelFrame { .. } => "cancelFrame",
        }
    }
}

#[derive(Debug)]
struct Link {
    attached: bool,
    outbox: Vec<HostCommand>,
}

/// Outbox shared by the surface and the frame scheduler so commands keep
/// their relative order.
type SharedLink = Rc<RefCell<Link>>;

fn ensure_attached(link: &SharedLink) -> Result<(), WebHostError> {
    if link.borrow().attached {
        Ok(())
    } else {
        Err(WebHostError::Detached)
    }
}

/// Mirror of the page's scroll geometry.
///
/// Moves update the mirror immediately (clamped) and are queued for the host;
/// the host overwrites the mirror with real values via
/// [`WebHost::set_metrics`].
#[derive(Debug)]
pub struct WebSurface {
    metrics: Option<ScrollMetrics>,
    link: SharedLink,
}

impl WebSurface {
    fn mirror(&mut self) -> Result<&mut ScrollMetrics, WebHostError> {
        ensure_attached(&self.link)?;
        self.metrics
            .as_mut()
            .ok_or(WebHostError::Unsupported("scroll metrics not reported"))
    }
}

impl ScrollSurface for WebSurface {
    type Error = WebHostError;

    fn metrics(&self) -> Result<ScrollMetrics, Self::Error> {
        ensure_attached(&self.link)?;
        self.metrics
            .ok_or(WebHostError::Unsupported("scroll metrics not reported"))
    }

    fn scroll_to(&mut self, offset: f64) -> Result<(), Self::Error> {
        let metrics = self.mirror()?;
        metrics.offset = metrics.clamp_offset(offset);
        let offset = metrics.offset;
        self.link
            .borrow_mut()
            .outbox
            .push(HostCommand::ScrollTo { offset });
        Ok(())
    }

    fn scroll_by(&mut self, delta: f64) -> Result<(), Self::Error> {
        let metrics = self.mirror()?;
        metrics.offset = metrics.clamp_offset(metrics.offset + delta);
        self.link
            .borrow_mut()
            .outbox
            .push(HostCommand::ScrollBy { delta });
        Ok(())
    }
}

/// `requestAnimationFrame` bookkeeping.
#[derive(Debug)]
pub struct WebFrames {
    next_id: u64,
    pending: Vec<FrameId>,
    link: SharedLink,
}

impl WebFrames {
    /// Requested frames the host has not delivered yet.
    #[must_use]
    pub fn pending(&self) -> &[FrameId] {
        &self.pending
    }

    /// Mark `id` as delivered. Returns `false` for unknown or cancelled ids.
    pub fn acknowledge(&mut self, id: FrameId) -> bool {
        match self.pending.iter().position(|p| *p == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }
}

impl FrameScheduler for WebFrames {
    type Error = WebHostError;

    fn request_frame(&mut self) -> Result<FrameId, Self::Error> {
        ensure_attached(&self.link)?;
        self.next_id = self.next_id.wrapping_add(1);
        let id = FrameId(self.next_id);
        self.pending.push(id);
        self.link
            .borrow_mut()
            .outbox
            .push(HostCommand::RequestFrame { id });
        Ok(id)
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.acknowledge(id) {
            self.link
                .borrow_mut()
                .outbox
                .push(HostCommand::CancelFrame { id });
        }
    }
}

/// Host-driven [`Platform`] for browser pages.
#[derive(Debug)]
pub struct WebHost {
    clock: DeterministicClock,
    surface: WebSurface,
    frames: WebFrames,
    link: SharedLink,
}

impl Default for WebHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WebHost {
    /// Create an attached host with no geometry reported yet.
    #[must_use]
    pub fn new() -> Self {
        let link = Rc::new(RefCell::new(Link {
            attached: true,
            outbox: Vec::new(),
        }));
        Self {
            clock: DeterministicClock::new(),
            surface: WebSurface {
                metrics: None,
                link: Rc::clone(&link),
            },
            frames: WebFrames {
                next_id: 0,
                pending: Vec::new(),
                link: Rc::clone(&link),
            },
            link,
        }
    }

    /// Mutably access the clock.
    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    /// Replace the geometry mirror with the page's real values.
    pub fn set_metrics(&mut self, metrics: ScrollMetrics) {
        self.surface.metrics = Some(metrics);
    }

    /// Last known geometry.
    #[must_use]
    pub fn metrics(&self) -> Option<ScrollMetrics> {
        self.surface.metrics
    }

    /// Attach or detach the page. While detached every host call fails with
    /// [`WebHostError::Detached`].
    pub fn set_attached(&mut self, attached: bool) {
        self.link.borrow_mut().attached = attached;
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.link.borrow().attached
    }

    /// Frame bookkeeping.
    #[must_use]
    pub fn frame_queue(&self) -> &WebFrames {
        &self.frames
    }

    /// Mark a delivered frame; see [`WebFrames::acknowledge`].
    pub fn acknowledge_frame(&mut self, id: FrameId) -> bool {
        self.frames.acknowledge(id)
    }

    /// Take all queued commands in issue order.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.link.borrow_mut().outbox)
    }
}

impl Platform for WebHost {
    type Error = WebHostError;
    type Clock = DeterministicClock;
    type Surface = WebSurface;
    type Frames = WebFrames;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn surface(&mut self) -> &mut Self::Surface {
        &mut self.surface
    }

    fn frames(&mut self) -> &mut Self::Frames {
        &mut self.frames
    }
}

/// Per-site activation flag shared between the JS side and the router.
#[derive(Debug, Clone)]
pub struct SiteGate {
    active: Rc<Cell<bool>>,
}

impl Default for SiteGate {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SiteGate {
    #[must_use]
    pub fn new(active: bool) -> Self {
        Self {
            active: Rc::new(Cell::new(active)),
        }
    }

    pub fn set(&self, active: bool) {
        self.active.set(active);
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.active.get()
    }
}

impl ActivityGate for SiteGate {
    fn is_active(&self) -> bool {
        self.active.get()
    }
}
