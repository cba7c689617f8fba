//! Sample types shared by the capture adapters, the aggregator and the report.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;

/// One backend-neutral observation from the profiling engine
///
/// **Public** - produced by the decode adapters, consumed by `StackAggregator`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    /// Raw code addresses, in the order the backend reports them
    pub stack: Vec<u64>,

    /// Number of allocations this record stands for (<= 0 marks a deallocation)
    pub count: i64,

    /// Bytes attributed to this record
    pub size: u64,

    /// Allocation observed without a matching deallocation
    pub censored: bool,
}

impl RawSample {
    pub fn new(stack: Vec<u64>, count: i64, size: u64, censored: bool) -> Self {
        Self {
            stack,
            count,
            size,
            censored,
        }
    }
}

/// Cumulative totals for one resolved call stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Sum of the sizes of every contributing raw sample
    pub bytes: u64,

    /// Sum of the counts of every contributing raw sample
    pub count: u64,
}

impl SampleInfo {
    pub fn new(bytes: u64, count: u64) -> Self {
        Self { bytes, count }
    }

    /// Average bytes per sample, floored; zero when nothing was counted
    pub fn avg_bytes(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.bytes / self.count
        }
    }
}

/// A resolved call stack with its aggregated totals
///
/// **Public** - output of aggregation, input of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Newline-terminated symbol lines, outermost frame order as captured
    pub stack: String,

    #[serde(flatten)]
    pub info: SampleInfo,
}

impl Sample {
    pub fn new(stack: impl Into<String>, info: SampleInfo) -> Self {
        Self {
            stack: stack.into(),
            info,
        }
    }
}

/// Ranking key for aggregated samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleOrder {
    /// Descending total bytes
    #[default]
    Bytes,
    /// Descending sample count
    Count,
}

impl FromStr for SampleOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bytes" => Ok(Self::Bytes),
            "count" => Ok(Self::Count),
            other => Err(format!("unknown sample order '{}' (expected bytes or count)", other)),
        }
    }
}

/// Sort samples descending by the requested key
///
/// Equal-ranked samples end up in no particular order.
pub fn sort_samples(samples: &mut [Sample], order: SampleOrder) {
    match order {
        SampleOrder::Bytes => samples.sort_unstable_by_key(|s| Reverse(s.info.bytes)),
        SampleOrder::Count => samples.sort_unstable_by_key(|s| Reverse(s.info.count)),
    }
}
