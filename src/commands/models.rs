use crate::aggregator::SampleOrder;
use crate::capture::HeapSnapshotKind;
use crate::utils::config::{DEFAULT_MAX_CALL_STACKS, DEFAULT_PROFILE_SECONDS, DEFAULT_SAMPLE_FREQ_BYTES};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Profiling backend a report is captured from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Token/session API
    #[default]
    Session,
    /// Flattened stack-trace array
    StackTraces,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::StackTraces => "stack-traces",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "stack-traces" | "stacktraces" => Ok(Self::StackTraces),
            other => Err(format!(
                "unknown backend '{}' (expected session or stack-traces)",
                other
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    /// Immediate heap snapshot
    Heap { kind: HeapSnapshotKind },

    /// Timed allocation/lifetime profile
    Allocations {
        duration: Duration,
        sample_freq_bytes: i64,
        only_growth: bool,
    },
}

impl Default for CaptureMode {
    fn default() -> Self {
        Self::Heap {
            kind: HeapSnapshotKind::Current,
        }
    }
}

impl CaptureMode {
    /// Default allocation profile settings
    pub fn allocations() -> Self {
        Self::Allocations {
            duration: Duration::from_secs(DEFAULT_PROFILE_SECONDS),
            sample_freq_bytes: DEFAULT_SAMPLE_FREQ_BYTES,
            only_growth: false,
        }
    }

    /// Title used when the caller does not provide one
    pub fn default_title(&self) -> String {
        match self {
            Self::Heap { kind } => format!("{} snapshot", kind),
            Self::Allocations {
                duration,
                only_growth,
                ..
            } => {
                let growth = if *only_growth { " (growth only)" } else { "" };
                format!(
                    "sampled allocations over {} seconds{}",
                    duration.as_secs(),
                    growth
                )
            }
        }
    }
}

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Recorded allocator profile to replay
    pub recording: PathBuf,

    /// Backend the capture goes through
    pub backend: Backend,

    /// Snapshot or timed profile
    pub mode: CaptureMode,

    /// Binary with symbols for address resolution (optional)
    pub binary: Option<PathBuf>,

    /// Ranking key
    pub order: SampleOrder,

    /// Maximum number of call stacks rendered
    pub max_call_stacks: usize,

    /// Report title (None = derived from the capture mode)
    pub title: Option<String>,

    /// Output path for the HTML report
    pub output_html: PathBuf,

    /// Output path for the JSON export (optional)
    pub output_json: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ReportArgs {
    fn default() -> Self {
        Self {
            recording: PathBuf::new(),
            backend: Backend::default(),
            mode: CaptureMode::default(),
            binary: None,
            order: SampleOrder::default(),
            max_call_stacks: DEFAULT_MAX_CALL_STACKS,
            title: None,
            output_html: PathBuf::from("heap-profile.html"),
            output_json: None,
            print_summary: false,
        }
    }
}

impl ReportArgs {
    /// Title shown in the report
    pub fn report_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.mode.default_title())
    }
}
