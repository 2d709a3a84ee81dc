//! Request handler module
//!
//! The host side of the pipeline: runs the gate for every request and applies
//! the host's own handling when the gate declines.

pub mod fallback;
pub mod router;

// Re-export main entry point
pub use router::{dispatch, handle_request};
