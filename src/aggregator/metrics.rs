//! Summary statistics over aggregated heap samples.
//!
//! A handful of call stacks usually hold most sampled bytes. These numbers
//! show how concentrated a profile is before anyone reads the table.

use super::sample::Sample;
use serde::{Deserialize, Serialize};

/// Calculate heap distribution statistics
///
/// **Public** - provides summary statistics
///
/// # Arguments
/// * `samples` - Aggregated samples, in any order
///
/// # Returns
/// Statistics about how sampled bytes are spread across call stacks
pub fn calculate_heap_distribution(samples: &[Sample]) -> HeapDistribution {
    if samples.is_empty() {
        return HeapDistribution::default();
    }

    let total_bytes = samples
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.info.bytes));
    let total_count = samples
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.info.count));
    let stack_count = samples.len();
    let mean = total_bytes / stack_count as u64;

    // Largest first, independent of the order the caller sorted by
    let mut bytes: Vec<u64> = samples.iter().map(|s| s.info.bytes).collect();
    bytes.sort_unstable_by(|a, b| b.cmp(a));
    let median = bytes[bytes.len() / 2];

    // Top 10% of stacks
    let top_10_percent_count = (stack_count as f64 * 0.1).ceil() as usize;
    let top_10_percent_bytes = bytes
        .iter()
        .take(top_10_percent_count)
        .fold(0u64, |acc, b| acc.saturating_add(*b));

    HeapDistribution {
        total_bytes,
        total_count,
        stack_count,
        mean_bytes_per_stack: mean,
        median_bytes_per_stack: median,
        top_10_percent_percentage: if total_bytes > 0 {
            (top_10_percent_bytes as f64 / total_bytes as f64) * 100.0
        } else {
            0.0
        },
    }
}

/// Heap distribution statistics
///
/// **Public** - returned from calculate_heap_distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeapDistribution {
    /// Sampled bytes across all stacks
    pub total_bytes: u64,

    /// Samples across all stacks
    pub total_count: u64,

    /// Number of unique stacks
    pub stack_count: usize,

    pub mean_bytes_per_stack: u64,

    pub median_bytes_per_stack: u64,

    /// Percentage of sampled bytes held by the top 10% of stacks
    pub top_10_percent_percentage: f64,
}

impl HeapDistribution {
    /// Check if sampled bytes are highly concentrated
    ///
    /// Returns true if the top 10% of stacks hold more than 80% of bytes
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} bytes in {} samples | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_bytes,
            self.total_count,
            self.stack_count,
            self.mean_bytes_per_stack,
            self.median_bytes_per_stack,
            self.top_10_percent_percentage
        )
    }
}
