#![forbid(unsafe_code)]

//! Kinetic autoscroll runtime.
//!
//! - [`ScrollEngine`]: frame-driven autoscroll with pause, resume, speed
//!   adjustment, and end-of-content detection.
//! - [`TapScrollAnimator`]: eased page-up / page-down moves.
//! - [`GestureRouter`]: binds classified gestures to both, and to the host's
//!   collaborators, depending on engine state.
//!
//! Everything is single-threaded and host-driven: the host feeds pointer,
//! wheel, and frame callbacks; the runtime calls back into a
//! [`Platform`](kinescroll_backend::Platform) and the router's ports.
//!
//! # Logging
//!
//! Events go through `tracing` with targets `kinescroll.engine`,
//! `kinescroll.tap_scroll`, and `kinescroll.router`.

pub mod router;
pub mod scroll_engine;
pub mod tap_scroll;

pub use router::{Disposition, GestureRouter, RouterPorts};
pub use scroll_engine::{
    END_OF_CONTENT_TOLERANCE, FrameOutcome, IntegrationMode, LOW_SPEED_CROSSOVER, ScrollEngine,
    ScrollState, SpeedChange,
};
pub use tap_scroll::{TAP_SCROLL_DURATION, TapFrame, TapScrollAnimator};
