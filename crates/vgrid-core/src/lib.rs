#![forbid(unsafe_code)]

//! Core: pixel geometry, body configuration, and logging for vgrid.

pub mod config;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
