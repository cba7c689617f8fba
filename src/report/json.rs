//! JSON export of aggregated heap samples.

use crate::aggregator::{HeapDistribution, Sample, SampleOrder};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Machine-readable form of a heap report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapReport {
    /// Export schema version
    pub version: String,

    pub title: String,

    /// Key the samples are sorted by
    pub order: SampleOrder,

    pub distribution: HeapDistribution,

    /// Every aggregated stack, not just the rendered rows
    pub samples: Vec<Sample>,

    /// RFC 3339 timestamp
    pub generated_at: String,
}

impl HeapReport {
    /// Build a report stamped with the current time
    pub fn new(
        title: impl Into<String>,
        order: SampleOrder,
        distribution: HeapDistribution,
        samples: Vec<Sample>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            title: title.into(),
            order,
            distribution,
            samples,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Write a heap report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &HeapReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing JSON report to: {}", output_path.display());

    super::validate_path(output_path)?;
    super::create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;

    info!("JSON report written ({} stacks)", report.samples.len());
    Ok(())
}

/// Read a heap report from a JSON file
///
/// **Public** - useful for validation and testing
pub fn read_report(input_path: impl AsRef<Path>) -> Result<HeapReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading JSON report from: {}", input_path.display());

    let file = File::open(input_path)?;
    let report: HeapReport = serde_json::from_reader(BufReader::new(file))?;

    Ok(report)
}
