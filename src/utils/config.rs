//! Configuration and constants for the profiler report.

/// Current JSON export schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Line written in place of a symbol that could not be resolved
pub const FAILED_TO_SYMBOLIZE: &str = "Failed to symbolize";

// Symbol names at or above this length are treated as unresolved.
pub const MAX_SYMBOL_LEN: usize = 256;

/// Default number of call stacks rendered in a report
pub const DEFAULT_MAX_CALL_STACKS: usize = 1000;
pub const MAX_CALL_STACKS_LIMIT: usize = 100_000;

/// Default duration of a timed allocation profile
pub const DEFAULT_PROFILE_SECONDS: u64 = 60;
pub const MAX_PROFILE_SECONDS: u64 = 3600;

/// Default sampling interval (bytes between samples) during a timed profile
pub const DEFAULT_SAMPLE_FREQ_BYTES: i64 = 1024 * 1024;
