//! Group raw samples by their symbolized call stack.
//!
//! Two raw stacks that symbolize to the same text are merged: the resolved
//! text is the grouping key, not the addresses.

use super::sample::{sort_samples, RawSample, Sample, SampleInfo, SampleOrder};
use crate::symbolizer::Symbolize;
use crate::utils::config::FAILED_TO_SYMBOLIZE;
use log::{debug, trace, warn};
use std::collections::HashMap;

/// Accumulates raw samples into per-stack totals
///
/// **Public** - one instance per aggregation pass
///
/// # Example
/// ```ignore
/// let mut aggregator = StackAggregator::new(&symbols, false);
/// for sample in decode_session_profile(&profile) {
///     aggregator.add(&sample);
/// }
/// let samples = aggregator.finish(SampleOrder::Bytes);
/// ```
pub struct StackAggregator<'a> {
    symbolizer: &'a dyn Symbolize,
    only_growth: bool,
    samples: HashMap<String, SampleInfo>,
    failed_symbolizations: usize,
    skipped: usize,
}

impl<'a> StackAggregator<'a> {
    /// Start an empty pass
    ///
    /// With `only_growth`, samples whose deallocation was observed are
    /// dropped and only censored samples are kept.
    pub fn new(symbolizer: &'a dyn Symbolize, only_growth: bool) -> Self {
        Self {
            symbolizer,
            only_growth,
            samples: HashMap::new(),
            failed_symbolizations: 0,
            skipped: 0,
        }
    }

    /// Fold one raw sample into the pass
    ///
    /// Returns false if the sample was filtered out.
    pub fn add(&mut self, sample: &RawSample) -> bool {
        // Deallocation events repeat the allocation with a non-positive count.
        if sample.count <= 0 {
            self.skipped += 1;
            return false;
        }

        if self.only_growth && !sample.censored {
            self.skipped += 1;
            return false;
        }

        let stack = symbolize_stack(self.symbolizer, &sample.stack, &mut self.failed_symbolizations);
        trace!(
            "Sampled stack: {:?}, size: {}, count: {}, censored: {}",
            stack,
            sample.size,
            sample.count,
            sample.censored
        );

        let entry = self.samples.entry(stack).or_default();
        entry.bytes = entry.bytes.saturating_add(sample.size);
        entry.count = entry.count.saturating_add(sample.count as u64);
        true
    }

    /// Addresses that failed to resolve so far in this pass
    pub fn failed_symbolizations(&self) -> usize {
        self.failed_symbolizations
    }

    /// Distinct stacks seen so far
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Materialize the pass as samples sorted by `order`
    ///
    /// Logs a single warning if any address failed to resolve.
    pub fn finish(self, order: SampleOrder) -> Vec<Sample> {
        if self.failed_symbolizations > 0 {
            warn!("Failed to symbolize {} symbols", self.failed_symbolizations);
        }

        let mut samples: Vec<Sample> = self
            .samples
            .into_iter()
            .map(|(stack, info)| Sample::new(stack, info))
            .collect();
        sort_samples(&mut samples, order);

        debug!(
            "Aggregated {} unique stacks ({} samples filtered out)",
            samples.len(),
            self.skipped
        );
        samples
    }
}

/// Resolve every address of `stack` into one newline-terminated line each
///
/// Unresolvable addresses become a placeholder line and bump `failures`.
pub fn symbolize_stack(symbolizer: &dyn Symbolize, stack: &[u64], failures: &mut usize) -> String {
    let mut text = String::new();
    for &address in stack {
        match symbolizer.symbolize(address) {
            Some(name) => text.push_str(&name),
            None => {
                *failures += 1;
                text.push_str(FAILED_TO_SYMBOLIZE);
            }
        }
        text.push('\n');
    }
    text
}

/// Aggregate backend-neutral samples in one pass
///
/// **Public** - shared pipeline behind both backend adapters
///
/// # Arguments
/// * `samples` - Decoded raw samples
/// * `symbolizer` - Address resolver
/// * `only_growth` - Keep only censored samples
/// * `order` - Ranking key
///
/// # Returns
/// One sample per distinct symbolized stack, sorted descending by `order`
pub fn aggregate_samples<I>(
    samples: I,
    symbolizer: &dyn Symbolize,
    only_growth: bool,
    order: SampleOrder,
) -> Vec<Sample>
where
    I: IntoIterator<Item = RawSample>,
{
    let mut aggregator = StackAggregator::new(symbolizer, only_growth);
    for sample in samples {
        aggregator.add(&sample);
    }
    aggregator.finish(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolizer::SymbolMap;

    fn symbols() -> SymbolMap {
        [
            (0x1, "malloc".to_string()),
            (0x2, "Vec::push".to_string()),
            (0x3, "main".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_symbolize_stack_lines() {
        let symbols = symbols();
        let mut failures = 0;

        let text = symbolize_stack(&symbols, &[0x1, 0x2, 0x3], &mut failures);

        assert_eq!(text, "malloc\nVec::push\nmain\n");
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_symbolize_stack_placeholder() {
        let symbols = symbols();
        let mut failures = 0;

        let text = symbolize_stack(&symbols, &[0x1, 0xdead, 0x3], &mut failures);

        assert_eq!(text, "malloc\nFailed to symbolize\nmain\n");
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_empty_stack_is_empty_key() {
        let symbols = symbols();
        let mut failures = 0;
        assert_eq!(symbolize_stack(&symbols, &[], &mut failures), "");
    }

    #[test]
    fn test_add_reports_filtering() {
        let symbols = symbols();
        let mut aggregator = StackAggregator::new(&symbols, true);

        assert!(!aggregator.add(&RawSample::new(vec![0x1], -1, 16, true)));
        assert!(!aggregator.add(&RawSample::new(vec![0x1], 1, 16, false)));
        assert!(aggregator.add(&RawSample::new(vec![0x1], 1, 16, true)));
        assert_eq!(aggregator.len(), 1);
    }

    #[test]
    fn test_totals_saturate() {
        let symbols = symbols();
        let samples = aggregate_samples(
            vec![
                RawSample::new(vec![0x1], i64::MAX, u64::MAX, false),
                RawSample::new(vec![0x1], i64::MAX, 1, false),
                RawSample::new(vec![0x1], 2, 1, false),
            ],
            &symbols,
            false,
            SampleOrder::Bytes,
        );

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].info.bytes, u64::MAX);
        assert_eq!(samples[0].info.count, u64::MAX);
    }

    mod warnings {
        use super::*;
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
        }

        // Records per thread so concurrently running tests do not mix.
        struct CaptureLogger;

        impl Log for CaptureLogger {
            fn enabled(&self, _metadata: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                RECORDS.with(|r| {
                    r.borrow_mut()
                        .push((record.level(), record.args().to_string()))
                });
            }

            fn flush(&self) {}
        }

        static LOGGER: CaptureLogger = CaptureLogger;
        static INIT: Once = Once::new();

        fn capture_warnings<F: FnOnce()>(f: F) -> Vec<String> {
            INIT.call_once(|| {
                log::set_logger(&LOGGER).expect("no other logger in unit tests");
                log::set_max_level(LevelFilter::Trace);
            });
            RECORDS.with(|r| r.borrow_mut().clear());
            f();
            RECORDS.with(|r| {
                r.borrow()
                    .iter()
                    .filter(|(level, _)| *level == Level::Warn)
                    .map(|(_, message)| message.clone())
                    .collect()
            })
        }

        #[test]
        fn test_single_warning_counts_every_failed_address() {
            let symbols = symbols();
            let warnings = capture_warnings(|| {
                let mut aggregator = StackAggregator::new(&symbols, false);
                aggregator.add(&RawSample::new(vec![0x1, 0xdead], 1, 8, false));
                aggregator.add(&RawSample::new(vec![0xbeef, 0x3], 1, 8, false));
                aggregator.finish(SampleOrder::Bytes);
            });

            assert_eq!(warnings, vec!["Failed to symbolize 2 symbols".to_string()]);
        }

        #[test]
        fn test_no_warning_when_everything_resolves() {
            let symbols = symbols();
            let warnings = capture_warnings(|| {
                let mut aggregator = StackAggregator::new(&symbols, false);
                aggregator.add(&RawSample::new(vec![0x1, 0x2, 0x3], 1, 8, false));
                aggregator.finish(SampleOrder::Bytes);
            });

            assert!(warnings.is_empty());
        }
    }
}
