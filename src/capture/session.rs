//! Token/session profiling backend.
//!
//! A lifetime-profiling session records allocation events (positive count)
//! and deallocation events (non-positive count) until it is stopped. Heap
//! snapshots are taken immediately without a session.

use serde::{Deserialize, Serialize};

#[cfg(feature = "session-backend")]
use super::{HeapSnapshotKind, SampleRateControl, SamplingRateGuard};
#[cfg(feature = "session-backend")]
use crate::utils::error::CaptureError;
#[cfg(feature = "session-backend")]
use log::info;
#[cfg(feature = "session-backend")]
use std::time::Duration;

/// One sample as reported by the session backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSample {
    /// Total bytes this sample stands for (`allocated_size * count`)
    #[serde(default)]
    pub sum: i64,

    /// Allocations represented; non-positive for deallocation events
    pub count: i64,

    #[serde(default)]
    pub requested_size: u64,

    pub allocated_size: u64,

    /// Allocation seen without a matching deallocation
    #[serde(default)]
    pub is_censored: bool,

    #[serde(default)]
    pub avg_lifetime_ns: u64,

    #[serde(default)]
    pub allocator_deallocator_cpu_matched: Option<bool>,

    /// Raw code addresses
    pub stack: Vec<u64>,
}

/// Samples returned by a stopped session or a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProfile {
    samples: Vec<SessionSample>,
}

impl SessionProfile {
    pub fn new(samples: Vec<SessionSample>) -> Self {
        Self { samples }
    }

    /// Visit every sample in capture order
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&SessionSample),
    {
        for sample in &self.samples {
            f(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// An in-flight lifetime-profiling session
#[cfg(feature = "session-backend")]
pub trait ProfilingSession {
    /// End the session and hand back everything it recorded
    fn stop(self: Box<Self>) -> SessionProfile;
}

/// Allocator exposing the token/session profiling API
#[cfg(feature = "session-backend")]
pub trait SessionEngine: SampleRateControl {
    fn start_lifetime_profiling(&self, seed_with_live_allocs: bool)
        -> Box<dyn ProfilingSession + '_>;

    fn snapshot(&self, kind: HeapSnapshotKind) -> SessionProfile;
}

/// Collect a timed allocation/lifetime profile
///
/// **Public** - main entry point for timed captures
///
/// Swaps the sampling rate to `sample_freq_bytes`, runs an unseeded
/// lifetime session for `duration`, restores the previous rate and then
/// stops the session. The calling thread sleeps for the whole window and
/// the capture cannot be cancelled.
///
/// # Errors
/// * `CaptureError::InvalidSampleRate` - `sample_freq_bytes` is not positive
#[cfg(feature = "session-backend")]
pub fn get_allocation_profile<E>(
    engine: &E,
    duration: Duration,
    sample_freq_bytes: i64,
) -> Result<SessionProfile, CaptureError>
where
    E: SessionEngine + ?Sized,
{
    if sample_freq_bytes <= 0 {
        return Err(CaptureError::InvalidSampleRate(sample_freq_bytes));
    }

    let rate = SamplingRateGuard::acquire(engine, sample_freq_bytes);
    let session = engine.start_lifetime_profiling(false);

    info!(
        "Sleeping for {} seconds while profile is collected.",
        duration.as_secs()
    );
    std::thread::sleep(duration);

    rate.restore();
    Ok(session.stop())
}

/// Take an immediate snapshot of the current or peak heap
#[cfg(feature = "session-backend")]
pub fn get_heap_snapshot<E>(engine: &E, kind: HeapSnapshotKind) -> SessionProfile
where
    E: SessionEngine + ?Sized,
{
    info!("Taking {} snapshot", kind);
    engine.snapshot(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterate_visits_in_order() {
        let profile = SessionProfile::new(vec![
            SessionSample {
                count: 1,
                allocated_size: 16,
                stack: vec![0x1],
                ..Default::default()
            },
            SessionSample {
                count: -1,
                allocated_size: 32,
                stack: vec![0x2],
                ..Default::default()
            },
        ]);

        let mut sizes = Vec::new();
        profile.iterate(|s| sizes.push(s.allocated_size));

        assert_eq!(sizes, vec![16, 32]);
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_sample_deserializes_with_defaults() {
        let sample: SessionSample =
            serde_json::from_str(r#"{"count": 2, "allocated_size": 64, "stack": [4096, 8192]}"#)
                .unwrap();

        assert_eq!(sample.count, 2);
        assert!(!sample.is_censored);
        assert_eq!(sample.allocator_deallocator_cpu_matched, None);
        assert_eq!(sample.stack, vec![4096, 8192]);
    }
}
