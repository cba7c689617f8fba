//! Capture of raw allocation samples from an allocator's profiling engine.
//!
//! Two backend shapes are supported, each behind its own cargo feature:
//! - `session-backend`: token/session API with lifetime profiles and
//!   current/peak heap snapshots, reported sample by sample
//! - `stack-trace-backend`: a flattened array of stack traces for the
//!   current heap
//!
//! With neither feature enabled no capture entry point exists.

pub mod recorded;
pub mod session;
pub mod stack_traces;

pub use recorded::{RecordedEngine, Recording};
pub use session::{SessionProfile, SessionSample};
pub use stack_traces::RawStackTraces;

#[cfg(feature = "session-backend")]
pub use session::{get_allocation_profile, get_heap_snapshot, ProfilingSession, SessionEngine};
#[cfg(feature = "stack-trace-backend")]
pub use stack_traces::{read_heap_stack_traces, StackTraceEngine};

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which heap a snapshot describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeapSnapshotKind {
    /// Allocations live right now
    #[default]
    Current,
    /// Allocations live at the point of highest heap usage
    Peak,
}

impl FromStr for HeapSnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "peak" => Ok(Self::Peak),
            other => Err(format!("unknown snapshot kind '{}' (expected current or peak)", other)),
        }
    }
}

impl fmt::Display for HeapSnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current heap"),
            Self::Peak => write!(f, "peak heap"),
        }
    }
}

/// Profiling backends compiled into this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub session: bool,
    pub stack_traces: bool,
}

impl Capability {
    /// Resolve the compiled-in backends
    pub const fn detect() -> Self {
        Self {
            session: cfg!(feature = "session-backend"),
            stack_traces: cfg!(feature = "stack-trace-backend"),
        }
    }

    /// False when no capture entry point exists at all
    pub fn is_available(&self) -> bool {
        self.session || self.stack_traces
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.session, self.stack_traces) {
            (true, true) => write!(f, "session, stack-traces"),
            (true, false) => write!(f, "session"),
            (false, true) => write!(f, "stack-traces"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Process-wide allocator sampling rate
///
/// The rate is shared by every profiling request in the process; writers
/// race and the last one wins.
pub trait SampleRateControl {
    /// Average number of allocated bytes between samples
    fn sampling_rate(&self) -> i64;

    fn set_sampling_rate(&self, bytes: i64);
}

/// Scoped swap of the allocator sampling rate
///
/// `restore` puts the previous rate back on the normal path. If the guard
/// is dropped without it (early return or unwinding) the rate is restored
/// on drop instead, so it is put back exactly once.
pub struct SamplingRateGuard<'a, C: SampleRateControl + ?Sized> {
    control: &'a C,
    previous: i64,
    restored: bool,
}

impl<'a, C: SampleRateControl + ?Sized> SamplingRateGuard<'a, C> {
    /// Set the sampling rate to `bytes`, remembering the current one
    pub fn acquire(control: &'a C, bytes: i64) -> Self {
        let previous = control.sampling_rate();
        control.set_sampling_rate(bytes);
        debug!("Sampling rate changed from {} to {} bytes", previous, bytes);

        Self {
            control,
            previous,
            restored: false,
        }
    }

    /// Rate that will be put back
    pub fn previous(&self) -> i64 {
        self.previous
    }

    /// Put the previous sampling rate back
    pub fn restore(mut self) {
        self.restore_once();
    }

    fn restore_once(&mut self) {
        if !self.restored {
            self.control.set_sampling_rate(self.previous);
            self.restored = true;
            debug!("Sampling rate restored to {} bytes", self.previous);
        }
    }
}

impl<C: SampleRateControl + ?Sized> Drop for SamplingRateGuard<'_, C> {
    fn drop(&mut self) {
        self.restore_once();
    }
}
