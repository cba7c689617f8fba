//! Report command implementation.
//!
//! The report command:
//! 1. Loads the recorded profile and symbols
//! 2. Captures samples through the selected backend
//! 3. Aggregates them by symbolized call stack
//! 4. Writes the HTML table (and optionally JSON)

use super::models::{Backend, CaptureMode, ReportArgs};
use crate::aggregator::{calculate_heap_distribution, HeapDistribution, Sample};
use crate::capture::{Capability, RecordedEngine, Recording};
use crate::report::{generate_table, wrap_page, write_html, write_report, HeapReport};
use crate::symbolizer::{ChainedSymbolizer, DwarfSymbolizer, Symbolize};
use crate::utils::config::{MAX_CALL_STACKS_LIMIT, MAX_PROFILE_SECONDS};
use crate::utils::error::CaptureError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

#[cfg(feature = "session-backend")]
use crate::aggregator::aggregate_session_profile;
#[cfg(feature = "stack-trace-backend")]
use crate::aggregator::aggregate_stack_traces;
#[cfg(feature = "session-backend")]
use crate::capture::{get_allocation_profile, get_heap_snapshot};
#[cfg(feature = "stack-trace-backend")]
use crate::capture::{read_heap_stack_traces, HeapSnapshotKind};

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Recording cannot be read or parsed
/// * Backend not compiled in, or does not support the requested mode
/// * Symbol binary cannot be loaded
/// * Output files cannot be written
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();
    let capability = Capability::detect();
    debug!("Compiled backends: {}", capability);
    if !capability.is_available() {
        anyhow::bail!("No profiling backend is compiled into this build");
    }

    // Step 1: Load recording and symbols
    info!("Step 1/4: Loading recording...");
    let recording = Recording::load(&args.recording)
        .with_context(|| format!("Failed to load recording {}", args.recording.display()))?;
    let recorded_symbols = recording
        .symbol_map()
        .context("Failed to parse recorded symbols")?;
    let binary_symbols = args
        .binary
        .as_ref()
        .map(|path| {
            DwarfSymbolizer::new(path)
                .with_context(|| format!("Failed to load symbols from {}", path.display()))
        })
        .transpose()?;

    let mut resolvers: Vec<&dyn Symbolize> = vec![&recorded_symbols];
    if let Some(binary) = binary_symbols.as_ref() {
        resolvers.push(binary);
    }
    let symbolizer = ChainedSymbolizer::new(resolvers);
    let engine = RecordedEngine::new(recording);

    // Step 2 and 3: Capture and aggregate
    info!(
        "Step 2/4: Capturing {} via {} backend...",
        args.mode.default_title(),
        args.backend
    );
    let samples = capture_and_aggregate(&engine, &args, &symbolizer)?;

    info!("Step 3/4: Summarizing {} call stacks...", samples.len());
    let distribution = calculate_heap_distribution(&samples);
    info!("Heap distribution: {}", distribution.summary());
    if distribution.is_highly_concentrated() {
        info!(
            "Top 10% of call stacks hold {:.1}% of sampled bytes",
            distribution.top_10_percent_percentage
        );
    }

    // Step 4: Write outputs
    info!("Step 4/4: Writing output files...");
    let title = args.report_title();
    let table = generate_table(&samples, &title, args.max_call_stacks);
    write_html(&wrap_page(&title, &table), &args.output_html)
        .context("Failed to write HTML report")?;
    info!("✓ Report written to: {}", args.output_html.display());

    if args.print_summary {
        print_summary(&title, &distribution, &samples);
    }

    if let Some(json_path) = &args.output_json {
        let report = HeapReport::new(title, args.order, distribution, samples);
        write_report(&report, json_path).context("Failed to write JSON report")?;
        info!("✓ JSON written to: {}", json_path.display());
    }

    let elapsed = start_time.elapsed();
    info!("Report completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Run the capture for `args` and aggregate the result
///
/// **Public** - the capture/aggregate half of the report
#[cfg_attr(
    not(any(feature = "session-backend", feature = "stack-trace-backend")),
    allow(unused_variables)
)]
pub fn capture_and_aggregate(
    engine: &RecordedEngine,
    args: &ReportArgs,
    symbolizer: &dyn Symbolize,
) -> Result<Vec<Sample>> {
    match (args.backend, &args.mode) {
        #[cfg(feature = "session-backend")]
        (Backend::Session, CaptureMode::Heap { kind }) => {
            let profile = get_heap_snapshot(engine, *kind);
            Ok(aggregate_session_profile(
                &profile,
                symbolizer,
                false,
                args.order,
            ))
        }

        #[cfg(feature = "session-backend")]
        (
            Backend::Session,
            CaptureMode::Allocations {
                duration,
                sample_freq_bytes,
                only_growth,
            },
        ) => {
            let profile = get_allocation_profile(engine, *duration, *sample_freq_bytes)?;
            Ok(aggregate_session_profile(
                &profile,
                symbolizer,
                *only_growth,
                args.order,
            ))
        }

        #[cfg(feature = "stack-trace-backend")]
        (
            Backend::StackTraces,
            CaptureMode::Heap {
                kind: HeapSnapshotKind::Current,
            },
        ) => {
            let traces = read_heap_stack_traces(engine);
            aggregate_stack_traces(traces, symbolizer, args.order)
                .context("Failed to decode heap stack traces")
        }

        (backend, mode) => Err(unsupported(backend, mode).into()),
    }
}

/// Explain why a backend/mode pair has no capture path
fn unsupported(backend: Backend, mode: &CaptureMode) -> CaptureError {
    let capability = Capability::detect();
    let compiled = match backend {
        Backend::Session => capability.session,
        Backend::StackTraces => capability.stack_traces,
    };

    if !compiled {
        return CaptureError::NotCompiled(backend.name());
    }

    match mode {
        CaptureMode::Allocations { .. } => CaptureError::Unsupported("timed allocation profiles"),
        CaptureMode::Heap { .. } => CaptureError::Unsupported("peak heap snapshots"),
    }
}

/// Print a short text summary to stdout
fn print_summary(title: &str, distribution: &HeapDistribution, samples: &[Sample]) {
    println!("\n{}", "=".repeat(80));
    println!("HEAP PROFILE SUMMARY: {}", title);
    println!("{}", "=".repeat(80));
    println!("Sampled bytes:  {}", distribution.total_bytes);
    println!("Samples:        {}", distribution.total_count);
    println!("Unique stacks:  {}", distribution.stack_count);
    println!();

    for (i, sample) in samples.iter().take(10).enumerate() {
        let frame = sample.stack.lines().next().unwrap_or("<empty stack>");
        println!(
            "{:>2}. {:>12} bytes {:>8} samples  {}",
            i + 1,
            sample.info.bytes,
            sample.info.count,
            frame
        );
    }
    println!("{}", "=".repeat(80));
}

/// Validate report arguments
///
/// **Public** - can be called before execute_report for early validation
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.recording.as_os_str().is_empty() {
        anyhow::bail!("Recording path cannot be empty");
    }

    if args.max_call_stacks == 0 {
        anyhow::bail!("max_call_stacks must be greater than 0");
    }

    if args.max_call_stacks > MAX_CALL_STACKS_LIMIT {
        anyhow::bail!(
            "max_call_stacks is too large (max {})",
            MAX_CALL_STACKS_LIMIT
        );
    }

    if let CaptureMode::Allocations {
        duration,
        sample_freq_bytes,
        ..
    } = &args.mode
    {
        let seconds = duration.as_secs();
        if seconds == 0 || seconds > MAX_PROFILE_SECONDS {
            anyhow::bail!(
                "Profile duration must be between 1 and {} seconds",
                MAX_PROFILE_SECONDS
            );
        }

        if *sample_freq_bytes <= 0 {
            anyhow::bail!("Sample frequency must be greater than 0 bytes");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args() -> ReportArgs {
        ReportArgs {
            recording: PathBuf::from("recording.json"),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args_valid() {
        assert!(validate_args(&args()).is_ok());
    }

    #[test]
    fn test_validate_args_empty_recording() {
        let args = ReportArgs {
            recording: PathBuf::new(),
            ..args()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_max_call_stacks() {
        let zero = ReportArgs {
            max_call_stacks: 0,
            ..args()
        };
        assert!(validate_args(&zero).is_err());

        let huge = ReportArgs {
            max_call_stacks: MAX_CALL_STACKS_LIMIT + 1,
            ..args()
        };
        assert!(validate_args(&huge).is_err());
    }

    #[test]
    fn test_validate_args_profile_window() {
        let zero_seconds = ReportArgs {
            mode: CaptureMode::Allocations {
                duration: Duration::from_secs(0),
                sample_freq_bytes: 1024,
                only_growth: false,
            },
            ..args()
        };
        assert!(validate_args(&zero_seconds).is_err());

        let bad_rate = ReportArgs {
            mode: CaptureMode::Allocations {
                duration: Duration::from_secs(10),
                sample_freq_bytes: 0,
                only_growth: false,
            },
            ..args()
        };
        assert!(validate_args(&bad_rate).is_err());

        let ok = ReportArgs {
            mode: CaptureMode::allocations(),
            ..args()
        };
        assert!(validate_args(&ok).is_ok());
    }

    #[cfg(not(any(feature = "session-backend", feature = "stack-trace-backend")))]
    #[test]
    fn test_no_backend_compiled() {
        let engine = RecordedEngine::new(Recording::default());
        let symbols = crate::symbolizer::SymbolMap::new();

        let err = capture_and_aggregate(&engine, &args(), &symbols).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CaptureError>(),
            Some(CaptureError::NotCompiled("session"))
        ));
    }
}
