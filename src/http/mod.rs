//! HTTP protocol layer module
//!
//! Response writing and content-type detection, decoupled from the gate's decisions.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use mime::{ExtensionDetector, MimeDetector, SniffingDetector};
pub use response::{write_status_page, ResponseError, ResponseWriter};
