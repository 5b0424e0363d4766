#![forbid(unsafe_code)]

//! Core: pointer sampling, gesture classification, and configuration.
//!
//! # Role in kinescroll
//! `kinescroll-core` is the input layer. It turns raw touch and mouse events
//! into classified gestures and owns the read-only configuration snapshot the
//! rest of the system consumes. Nothing here touches a real page: time is a
//! `Duration` handed in by the caller and positions are plain `f64` pixels.
//!
//! # Primary responsibilities
//! - **PointerSampler**: one contact lifecycle (press → release) regardless of
//!   whether it came from a finger or a mouse.
//! - **GestureSession**: tap / swipe classification at release plus the
//!   mid-contact direction-change and speed-tick streams.
//! - **ScrollConfig**: numeric bounds and feature toggles, swappable at any
//!   time through [`config::ConfigHandle`].
//! - **Interactive predicate**: the pure DOM-shape check that keeps taps on
//!   links and buttons away from tap navigation.
//!
//! # How it fits in the system
//! `kinescroll-runtime` feeds [`event::PointerEvent`] values into a
//! [`gesture::GestureSession`] and routes the resulting
//! [`semantic_event::GestureEvent`]s to the scroll engine. The platform
//! boundary lives in `kinescroll-backend`.

pub mod animation;
pub mod config;
pub mod event;
pub mod gesture;
pub mod interactive;
pub mod logging;
pub mod pointer;
pub mod semantic_event;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, warn};
