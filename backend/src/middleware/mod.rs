//! Request middleware.
//!
//! Purpose: request-lifecycle concerns that wrap every route, currently
//! the trace-identifier middleware.

pub mod trace;

pub use trace::Trace;
