use heap_trace_studio::aggregator::{calculate_heap_distribution, Sample, SampleInfo, SampleOrder};
use heap_trace_studio::report::{generate_table, read_report, write_html, write_report, write_table, HeapReport};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample(stack: &str, bytes: u64, count: u64) -> Sample {
    Sample::new(stack, SampleInfo::new(bytes, count))
}

#[test]
fn test_average_is_floored() {
    let html = generate_table(&[sample("f\n", 10, 3)], "t", 10);
    assert!(html.contains("<tr><td>10</td><td>3</td><td>3</td><td><pre>f\n</pre></td></tr>"));
}

#[test]
fn test_rows_are_capped_and_truncation_reported() {
    let samples: Vec<Sample> = (0..50)
        .map(|i| sample(&format!("frame_{}\n", i), 1000 - i, 1))
        .collect();

    let html = generate_table(&samples, "current heap snapshot", 10);

    assert!(html.starts_with("<b>Top 10 Call Stacks for: current heap snapshot</b>\n"));
    assert!(html.contains("40 call stacks truncated\n"));
    assert_eq!(html.matches("<tr><td>").count(), 10);
    assert!(html.contains("frame_9\n"));
    assert!(!html.contains("frame_10\n"));
}

#[test]
fn test_empty_table() {
    let html = generate_table(&[], "empty", 1000);

    assert!(html.starts_with("<b>Top 0 Call Stacks for: empty</b>\n<p>\n"));
    assert!(!html.contains("truncated"));
    assert_eq!(html.matches("<tr><td>").count(), 0);
    assert!(html.ends_with("</table>"));
}

#[test]
fn test_exact_fit_is_not_truncated() {
    let samples = vec![sample("a\n", 2, 1), sample("b\n", 1, 1)];
    let html = generate_table(&samples, "t", 2);

    assert!(html.starts_with("<b>Top 2 Call Stacks for: t</b>\n<p>\n"));
    assert!(!html.contains("truncated"));
}

#[test]
fn test_full_fragment_layout() {
    let mut html = String::from("<div>");
    write_table(&mut html, &[sample("malloc\nmain\n", 64, 2)], "heap", 5);

    let expected = concat!(
        "<div>",
        "<b>Top 1 Call Stacks for: heap</b>\n",
        "<p>\n",
        "<table style=\"border-collapse: collapse\" border=1 cellpadding=5>\n",
        "<tr>\n",
        "<th>Total bytes</th>\n",
        "<th>Count</th>\n",
        "<th>Avg bytes</th>\n",
        "<th>Call Stack</th>\n",
        "</tr>\n",
        "<tr><td>64</td><td>2</td><td>32</td><td><pre>malloc\nmain\n</pre></td></tr>",
        "</table>",
    );
    assert_eq!(html, expected);
}

#[test]
fn test_stack_text_is_escaped() {
    let html = generate_table(&[sample("Vec<u8>::push\n", 8, 1)], "t", 1);
    assert!(html.contains("<pre>Vec&lt;u8&gt;::push\n</pre>"));
}

#[test]
fn test_write_html_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("report.html");

    write_html("<p>ok</p>", &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>ok</p>");
}

#[test]
fn test_write_html_rejects_directory() {
    let dir = TempDir::new().unwrap();
    assert!(write_html("<p></p>", dir.path()).is_err());
}

#[test]
fn test_json_report_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");

    let samples = vec![sample("a\n", 300, 3), sample("b\n", 100, 1)];
    let distribution = calculate_heap_distribution(&samples);
    let report = HeapReport::new("peak heap snapshot", SampleOrder::Count, distribution, samples);

    write_report(&report, &path).unwrap();
    let loaded = read_report(&path).unwrap();

    assert_eq!(loaded.title, "peak heap snapshot");
    assert_eq!(loaded.order, SampleOrder::Count);
    assert_eq!(loaded.samples, report.samples);
    assert_eq!(loaded.generated_at, report.generated_at);
    assert_eq!(loaded.distribution.total_bytes, 400);
}
