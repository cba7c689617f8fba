//! HTML table rendering for aggregated heap samples.
//!
//! The table is an HTML fragment meant to be embedded in a larger page.
//! Rows are rendered in the order given; sorting happens upstream.

use crate::aggregator::Sample;
use crate::utils::error::OutputError;
use html_escape::encode_text;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append the call stack table for `samples` to `output`
///
/// **Public** - main entry point for report rendering
///
/// # Arguments
/// * `output` - Buffer the fragment is appended to
/// * `samples` - Aggregated samples, already sorted
/// * `title` - Report title, shown after "Top N Call Stacks for:"
/// * `max_call_stacks` - Maximum number of rows rendered
pub fn write_table(output: &mut String, samples: &[Sample], title: &str, max_call_stacks: usize) {
    let shown = max_call_stacks.min(samples.len());

    output.push_str(&format!(
        "<b>Top {} Call Stacks for: {}</b>\n",
        shown,
        encode_text(title)
    ));
    if samples.len() > max_call_stacks {
        output.push_str(&format!(
            "{} call stacks truncated\n",
            samples.len() - max_call_stacks
        ));
    }
    output.push_str("<p>\n");
    output.push_str("<table style=\"border-collapse: collapse\" border=1 cellpadding=5>\n");
    output.push_str("<tr>\n");
    output.push_str("<th>Total bytes</th>\n");
    output.push_str("<th>Count</th>\n");
    output.push_str("<th>Avg bytes</th>\n");
    output.push_str("<th>Call Stack</th>\n");
    output.push_str("</tr>\n");

    for sample in &samples[..shown] {
        output.push_str("<tr>");
        output.push_str(&format!("<td>{}</td>", sample.info.bytes));
        output.push_str(&format!("<td>{}</td>", sample.info.count));
        output.push_str(&format!("<td>{}</td>", sample.info.avg_bytes()));
        output.push_str(&format!("<td><pre>{}</pre></td>", encode_text(&sample.stack)));
        output.push_str("</tr>");
    }
    output.push_str("</table>");

    debug!("Rendered {} of {} call stacks", shown, samples.len());
}

/// Render the call stack table into a new string
pub fn generate_table(samples: &[Sample], title: &str, max_call_stacks: usize) -> String {
    let mut output = String::new();
    write_table(&mut output, samples, title, max_call_stacks);
    output
}

/// Wrap a fragment into a standalone HTML document
pub fn wrap_page(title: &str, fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        encode_text(title),
        fragment
    )
}

/// Write HTML content to a file
///
/// **Public** - main entry point for HTML output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_html(html: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing HTML report to: {}", output_path.display());

    super::validate_path(output_path)?;
    super::create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(html.as_bytes())?;
    writer.flush()?;

    info!(
        "HTML report written successfully ({} bytes, {:.2} KB)",
        html.len(),
        html.len() as f64 / 1024.0
    );

    Ok(())
}
