//! Aggregation of raw allocation samples into ranked call stacks.
//!
//! This module transforms raw profiler output into:
//! - Backend-neutral raw samples (one decoder per backend format)
//! - Per-stack byte and count totals, keyed by symbolized stack text
//! - Heap distribution statistics

pub mod decode;
pub mod metrics;
pub mod sample;
pub mod stack_aggregator;

// Re-export main types and functions
pub use decode::{decode_session_profile, decode_stack_traces};
pub use metrics::{calculate_heap_distribution, HeapDistribution};
pub use sample::{sort_samples, RawSample, Sample, SampleInfo, SampleOrder};
pub use stack_aggregator::{aggregate_samples, symbolize_stack, StackAggregator};

#[cfg(feature = "session-backend")]
pub use decode::aggregate_session_profile;
#[cfg(feature = "stack-trace-backend")]
pub use decode::aggregate_stack_traces;
