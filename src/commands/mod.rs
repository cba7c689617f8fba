//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod report;
pub mod utils;

// Re-export main command functions
pub use models::{Backend, CaptureMode, ReportArgs};
pub use report::{capture_and_aggregate, execute_report, validate_args};
pub use utils::{display_version, validate_recording};
