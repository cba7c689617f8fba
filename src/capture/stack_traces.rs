//! Flattened stack-trace backend.
//!
//! The engine hands back one buffer of machine words laid out as
//! `[count, size, depth, pc_0, .., pc_{depth-1}]` per record, terminated by
//! a record whose count is zero. The buffer is owned by whoever reads it.

#[cfg(feature = "stack-trace-backend")]
use log::{debug, info};

/// Owned flattened stack-trace buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStackTraces {
    words: Vec<u64>,
    sample_period: i32,
}

impl RawStackTraces {
    /// Wrap an engine buffer as-is
    pub fn from_words(words: Vec<u64>, sample_period: i32) -> Self {
        Self {
            words,
            sample_period,
        }
    }

    /// Lay out `(count, size, stack)` records and append the terminator
    ///
    /// Zero-count records are left out; a zero count ends the buffer.
    pub fn from_records<'a, I>(records: I, sample_period: i32) -> Self
    where
        I: IntoIterator<Item = (u64, u64, &'a [u64])>,
    {
        let mut words = Vec::new();
        for (count, size, stack) in records {
            if count == 0 {
                continue;
            }
            words.push(count);
            words.push(size);
            words.push(stack.len() as u64);
            words.extend_from_slice(stack);
        }
        words.push(0);

        Self {
            words,
            sample_period,
        }
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Sampling period the engine was running with
    pub fn sample_period(&self) -> i32 {
        self.sample_period
    }
}

/// Allocator exposing the flattened stack-trace API
#[cfg(feature = "stack-trace-backend")]
pub trait StackTraceEngine {
    /// Stack traces of every sampled allocation currently live
    fn read_stack_traces(&self) -> RawStackTraces;
}

/// Snapshot the current heap as a flattened buffer
///
/// **Public** - capture entry point for the stack-trace backend
#[cfg(feature = "stack-trace-backend")]
pub fn read_heap_stack_traces<E>(engine: &E) -> RawStackTraces
where
    E: StackTraceEngine + ?Sized,
{
    info!("Reading heap stack traces");
    let traces = engine.read_stack_traces();
    debug!(
        "Read {} words, sample period {}",
        traces.words.len(),
        traces.sample_period
    );
    traces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_records_layout() {
        let first = [0x10, 0x20];
        let second = [0x30];
        let traces = RawStackTraces::from_records(
            vec![(1, 64, &first[..]), (3, 96, &second[..])],
            512,
        );

        assert_eq!(
            traces.words(),
            &[1, 64, 2, 0x10, 0x20, 3, 96, 1, 0x30, 0]
        );
        assert_eq!(traces.sample_period(), 512);
    }

    #[test]
    fn test_empty_records_still_terminated() {
        let traces = RawStackTraces::from_records(std::iter::empty(), 0);
        assert_eq!(traces.words(), &[0]);
    }
}
