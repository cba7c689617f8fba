//! Recorded allocator profiles.
//!
//! A recording is a JSON document holding what an allocator's profiling
//! engine reported on some host: heap snapshots, the events of a lifetime
//! profile, the flattened stack-trace records, and the symbol names the
//! host resolved. `RecordedEngine` replays it through the same engine
//! traits a live allocator implements.

use super::session::SessionSample;
use super::SampleRateControl;
use crate::symbolizer::SymbolMap;
use crate::utils::error::{OutputError, RecordingError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

#[cfg(feature = "session-backend")]
use super::session::{ProfilingSession, SessionEngine, SessionProfile};
#[cfg(feature = "session-backend")]
use super::HeapSnapshotKind;
#[cfg(feature = "stack-trace-backend")]
use super::stack_traces::{RawStackTraces, StackTraceEngine};

/// One record of the flattened stack-trace form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTraceRecord {
    pub count: u64,
    pub size: u64,
    pub stack: Vec<u64>,
}

/// Everything a profiling engine reported, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Sampling rate in effect when the recording was made
    #[serde(default)]
    pub sampling_rate: i64,

    /// Hex address ("0x...") to symbol name
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,

    /// Current heap snapshot
    #[serde(default)]
    pub heap: Vec<SessionSample>,

    /// Peak heap snapshot
    #[serde(default)]
    pub peak_heap: Vec<SessionSample>,

    /// Allocation and deallocation events of a lifetime profile
    #[serde(default)]
    pub allocations: Vec<SessionSample>,

    /// Current heap in the flattened stack-trace form
    #[serde(default)]
    pub stack_traces: Vec<StackTraceRecord>,
}

impl Recording {
    /// Load a recording from a JSON file
    ///
    /// **Public** - main entry point for replaying profiles
    ///
    /// # Errors
    /// * `RecordingError::Io` - file cannot be opened
    /// * `RecordingError::Json` - file is not a valid recording
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let path = path.as_ref();
        info!("Loading recording from: {}", path.display());

        let file = File::open(path)?;
        let recording: Recording = serde_json::from_reader(BufReader::new(file))?;

        debug!(
            "Recording: {} heap, {} peak, {} allocation events, {} stack traces, {} symbols",
            recording.heap.len(),
            recording.peak_heap.len(),
            recording.allocations.len(),
            recording.stack_traces.len(),
            recording.symbols.len()
        );

        Ok(recording)
    }

    /// Write the recording as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OutputError> {
        let path = path.as_ref();
        crate::report::validate_path(path)?;
        crate::report::create_parent_dirs(path)?;

        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;

        info!("Recording written to: {}", path.display());
        Ok(())
    }

    /// Parse the recorded symbol names into a lookup table
    ///
    /// # Errors
    /// * `RecordingError::InvalidAddress` - a key is not a hex address
    pub fn symbol_map(&self) -> Result<SymbolMap, RecordingError> {
        self.symbols
            .iter()
            .map(|(addr, name)| -> Result<(u64, String), RecordingError> {
                Ok((parse_address(addr)?, name.clone()))
            })
            .collect()
    }
}

/// Parse "0x1a2b" or "1a2b" as a hex address
pub fn parse_address(text: &str) -> Result<u64, RecordingError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    u64::from_str_radix(digits, 16).map_err(|_| RecordingError::InvalidAddress(text.to_string()))
}

/// Profiling engine replaying a `Recording`
pub struct RecordedEngine {
    recording: Recording,
    sampling_rate: AtomicI64,
}

impl RecordedEngine {
    pub fn new(recording: Recording) -> Self {
        let sampling_rate = AtomicI64::new(recording.sampling_rate);
        Self {
            recording,
            sampling_rate,
        }
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

impl SampleRateControl for RecordedEngine {
    fn sampling_rate(&self) -> i64 {
        self.sampling_rate.load(Ordering::SeqCst)
    }

    fn set_sampling_rate(&self, bytes: i64) {
        self.sampling_rate.store(bytes, Ordering::SeqCst);
    }
}

#[cfg(feature = "session-backend")]
struct RecordedSession<'a> {
    engine: &'a RecordedEngine,
    seed_with_live_allocs: bool,
}

#[cfg(feature = "session-backend")]
impl ProfilingSession for RecordedSession<'_> {
    fn stop(self: Box<Self>) -> SessionProfile {
        let recording = &self.engine.recording;
        let mut samples = Vec::with_capacity(recording.allocations.len());

        // Seeded sessions also report what was live when they started.
        if self.seed_with_live_allocs {
            samples.extend(recording.heap.iter().cloned().map(|mut s| {
                s.is_censored = true;
                s
            }));
        }
        samples.extend(recording.allocations.iter().cloned());

        SessionProfile::new(samples)
    }
}

#[cfg(feature = "session-backend")]
impl SessionEngine for RecordedEngine {
    fn start_lifetime_profiling(
        &self,
        seed_with_live_allocs: bool,
    ) -> Box<dyn ProfilingSession + '_> {
        debug!(
            "Starting recorded lifetime session (seeded: {})",
            seed_with_live_allocs
        );
        Box::new(RecordedSession {
            engine: self,
            seed_with_live_allocs,
        })
    }

    fn snapshot(&self, kind: HeapSnapshotKind) -> SessionProfile {
        let samples = match kind {
            HeapSnapshotKind::Current => &self.recording.heap,
            HeapSnapshotKind::Peak => &self.recording.peak_heap,
        };
        SessionProfile::new(samples.clone())
    }
}

#[cfg(feature = "stack-trace-backend")]
impl StackTraceEngine for RecordedEngine {
    fn read_stack_traces(&self) -> RawStackTraces {
        let period = i32::try_from(self.sampling_rate()).unwrap_or(i32::MAX);
        RawStackTraces::from_records(
            self.recording
                .stack_traces
                .iter()
                .map(|r| (r.count, r.size, r.stack.as_slice())),
            period,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x4005d0").unwrap(), 0x4005d0);
        assert_eq!(parse_address("4005D0").unwrap(), 0x4005d0);
        assert!(matches!(
            parse_address("main"),
            Err(RecordingError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_symbol_map_from_recording() {
        let mut recording = Recording::default();
        recording
            .symbols
            .insert("0x10".to_string(), "malloc".to_string());

        let map = recording.symbol_map().unwrap();
        assert_eq!(map.len(), 1);

        recording
            .symbols
            .insert("zz".to_string(), "bogus".to_string());
        assert!(recording.symbol_map().is_err());
    }

    #[test]
    fn test_sampling_rate_starts_from_recording() {
        let engine = RecordedEngine::new(Recording {
            sampling_rate: 2048,
            ..Default::default()
        });

        assert_eq!(engine.sampling_rate(), 2048);
        engine.set_sampling_rate(1);
        assert_eq!(engine.sampling_rate(), 1);
    }
}
