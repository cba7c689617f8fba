//! Heap Trace Studio CLI
//!
//! Replays recorded allocator profiles and renders ranked call stack reports.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::time::Duration;

use heap_trace_studio::aggregator::SampleOrder;
use heap_trace_studio::capture::HeapSnapshotKind;
use heap_trace_studio::commands::{
    display_version, execute_report, validate_args, validate_recording, Backend, CaptureMode,
    ReportArgs,
};
use heap_trace_studio::utils::config::{
    DEFAULT_MAX_CALL_STACKS, DEFAULT_PROFILE_SECONDS, DEFAULT_SAMPLE_FREQ_BYTES,
};

/// Heap Trace Studio - call stack reports for sampled heap profiles
#[derive(Parser, Debug)]
#[command(name = "heap-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by every report
#[derive(Args, Debug)]
struct ReportOptions {
    /// Recorded allocator profile (JSON)
    #[arg(short, long)]
    recording: PathBuf,

    /// Binary with debug info or a symbol table for address resolution
    #[arg(long, env = "HEAP_TRACE_BINARY")]
    binary: Option<PathBuf>,

    /// Rank call stacks by "bytes" or "count"
    #[arg(long, default_value = "bytes")]
    order: SampleOrder,

    /// Maximum number of call stacks in the table
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_STACKS)]
    max_call_stacks: usize,

    /// Report title
    #[arg(long)]
    title: Option<String>,

    /// Output path for the HTML report
    #[arg(short, long, default_value = "heap-profile.html")]
    output: PathBuf,

    /// Output path for a JSON export (optional)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print text summary to stdout
    #[arg(long)]
    summary: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Report on a heap snapshot
    Heap {
        #[command(flatten)]
        report: ReportOptions,

        /// Snapshot of the "current" or "peak" heap
        #[arg(long, default_value = "current")]
        kind: HeapSnapshotKind,

        /// Capture through the "session" or "stack-traces" backend
        #[arg(long, default_value = "session")]
        backend: Backend,
    },

    /// Report on allocations sampled over a time window
    Allocations {
        #[command(flatten)]
        report: ReportOptions,

        /// Length of the profiling window
        #[arg(long, default_value_t = DEFAULT_PROFILE_SECONDS)]
        seconds: u64,

        /// Average bytes allocated between samples during the window
        #[arg(long, default_value_t = DEFAULT_SAMPLE_FREQ_BYTES)]
        sample_freq_bytes: i64,

        /// Only keep allocations that were not freed during the window
        #[arg(long)]
        only_growth: bool,
    },

    /// Validate a recorded profile
    Validate {
        /// Path to recording JSON file
        #[arg(short, long)]
        recording: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Heap {
            report,
            kind,
            backend,
        } => {
            let args = report_args(report, backend, CaptureMode::Heap { kind });
            validate_args(&args)?;
            execute_report(args)?;
        }

        Commands::Allocations {
            report,
            seconds,
            sample_freq_bytes,
            only_growth,
        } => {
            let mode = CaptureMode::Allocations {
                duration: Duration::from_secs(seconds),
                sample_freq_bytes,
                only_growth,
            };
            let args = report_args(report, Backend::Session, mode);
            validate_args(&args)?;
            execute_report(args)?;
        }

        Commands::Validate { recording } => {
            validate_recording(&recording)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Build report arguments from parsed CLI options
fn report_args(options: ReportOptions, backend: Backend, mode: CaptureMode) -> ReportArgs {
    ReportArgs {
        recording: options.recording,
        backend,
        mode,
        binary: options.binary,
        order: options.order,
        max_call_stacks: options.max_call_stacks,
        title: options.title,
        output_html: options.output,
        output_json: options.json,
        print_summary: options.summary,
    }
}
