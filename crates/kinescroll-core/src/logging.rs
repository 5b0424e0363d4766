#![forbid(unsafe_code)]

//! Logging shims.
//!
//! With the `tracing` feature the usual `tracing` macros are re-exported from
//! here. Without it, same-named no-op macros are exported at the crate root so
//! call sites compile unchanged:
//!
//! ```ignore
//! #[cfg(feature = "tracing")]
//! use crate::logging::{debug, trace};
//! #[cfg(not(feature = "tracing"))]
//! use crate::{debug, trace};
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, info, trace, warn};

/// No-op `debug!` used when the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

/// No-op `trace!` used when the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// No-op `warn!` used when the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
