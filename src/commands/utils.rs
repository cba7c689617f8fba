use crate::capture::{Capability, Recording};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a recorded profile file
pub fn validate_recording(file_path: &Path) -> Result<()> {
    println!("Validating recording: {}", file_path.display());

    let recording = Recording::load(file_path)
        .with_context(|| format!("Failed to load recording {}", file_path.display()))?;
    let symbols = recording
        .symbol_map()
        .context("Recording contains an invalid symbol address")?;

    println!("✓ Valid recording JSON");
    println!("  Sampling rate:     {} bytes", recording.sampling_rate);
    println!("  Heap samples:      {}", recording.heap.len());
    println!("  Peak heap samples: {}", recording.peak_heap.len());
    println!("  Allocation events: {}", recording.allocations.len());
    println!("  Stack traces:      {}", recording.stack_traces.len());
    println!("  Symbols:           {}", symbols.len());

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Heap Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!("Backends: {}", Capability::detect());
    println!();
    println!("Aggregates sampled allocator heap profiles into ranked call stack reports.");
}
