//! Heap Trace Studio
//!
//! Aggregation and reporting for sampled allocator heap profiles.
//!
//! Raw samples captured from an allocator's profiling engine are
//! symbolized, grouped by call stack, ranked by bytes or count and
//! rendered as an HTML table:
//!
//! ```ignore
//! let profile = get_heap_snapshot(&engine, HeapSnapshotKind::Current);
//! let samples = aggregate_session_profile(&profile, &symbols, false, SampleOrder::Bytes);
//! let html = generate_table(&samples, "current heap snapshot", 1000);
//! ```
//!
//! This crate also provides the `heap-trace` CLI, which replays recorded
//! profiles through the same pipeline.

pub mod aggregator;
pub mod capture;
pub mod commands;
pub mod report;
pub mod symbolizer;
pub mod utils;
