//! Adapters from the backend raw formats to `RawSample`.
//!
//! Each backend's raw shape is decoded here and nowhere else; everything
//! downstream only sees `RawSample`.

use super::sample::RawSample;
use crate::capture::{RawStackTraces, SessionProfile};
use crate::utils::error::DecodeError;
use log::trace;

#[cfg(any(feature = "session-backend", feature = "stack-trace-backend"))]
use super::{
    sample::{Sample, SampleOrder},
    stack_aggregator::aggregate_samples,
};
#[cfg(any(feature = "session-backend", feature = "stack-trace-backend"))]
use crate::symbolizer::Symbolize;
#[cfg(any(feature = "session-backend", feature = "stack-trace-backend"))]
use log::info;

// count, size, depth
const RECORD_HEADER_WORDS: usize = 3;

/// Decode a session profile, one raw sample per reported sample
///
/// The aggregated size is the sample's allocated size.
pub fn decode_session_profile(profile: &SessionProfile) -> Vec<RawSample> {
    let mut samples = Vec::with_capacity(profile.len());
    profile.iterate(|sample| {
        trace!(
            "Session sample: sum: {}, count: {}, requested_size: {}, allocated_size: {}, \
             is_censored: {}, avg_lifetime_ns: {}, allocator_deallocator_cpu_matched: {}",
            sample.sum,
            sample.count,
            sample.requested_size,
            sample.allocated_size,
            sample.is_censored,
            sample.avg_lifetime_ns,
            sample
                .allocator_deallocator_cpu_matched
                .map_or_else(|| "N/A".to_string(), |m| m.to_string())
        );
        samples.push(RawSample::new(
            sample.stack.clone(),
            sample.count,
            sample.allocated_size,
            sample.is_censored,
        ));
    });
    samples
}

/// Decode a flattened stack-trace buffer
///
/// Every record describes a live allocation, so all decoded samples are
/// censored.
///
/// # Errors
/// * `DecodeError::Truncated` - a record runs past the end of the buffer
/// * `DecodeError::MissingTerminator` - the buffer ends without a zero count
pub fn decode_stack_traces(traces: &RawStackTraces) -> Result<Vec<RawSample>, DecodeError> {
    let words = traces.words();
    let mut samples = Vec::new();
    let mut offset = 0;

    loop {
        let count = *words.get(offset).ok_or(DecodeError::MissingTerminator)?;
        if count == 0 {
            break;
        }

        let available = words.len() - offset;
        if available < RECORD_HEADER_WORDS {
            return Err(DecodeError::Truncated {
                offset,
                needed: RECORD_HEADER_WORDS,
                available,
            });
        }

        let size = words[offset + 1];
        let depth = usize::try_from(words[offset + 2]).unwrap_or(usize::MAX);
        let needed = RECORD_HEADER_WORDS.saturating_add(depth);
        if available < needed {
            return Err(DecodeError::Truncated {
                offset,
                needed,
                available,
            });
        }

        let stack_start = offset + RECORD_HEADER_WORDS;
        let stack = words[stack_start..stack_start + depth].to_vec();
        samples.push(RawSample::new(
            stack,
            i64::try_from(count).unwrap_or(i64::MAX),
            size,
            true,
        ));

        offset += needed;
    }

    Ok(samples)
}

/// Aggregate a session-backend profile
///
/// **Public** - session backend entry point
#[cfg(feature = "session-backend")]
pub fn aggregate_session_profile(
    profile: &SessionProfile,
    symbolizer: &dyn Symbolize,
    only_growth: bool,
    order: SampleOrder,
) -> Vec<Sample> {
    info!("Analyzing sampling profile ({} samples)", profile.len());
    aggregate_samples(decode_session_profile(profile), symbolizer, only_growth, order)
}

/// Aggregate a flattened stack-trace buffer
///
/// **Public** - stack-trace backend entry point
///
/// Takes the buffer by value; it is released when the pass ends, whether
/// decoding succeeds or not.
#[cfg(feature = "stack-trace-backend")]
pub fn aggregate_stack_traces(
    traces: RawStackTraces,
    symbolizer: &dyn Symbolize,
    order: SampleOrder,
) -> Result<Vec<Sample>, DecodeError> {
    info!(
        "Analyzing heap stack traces (sample period {})",
        traces.sample_period()
    );
    let samples = decode_stack_traces(&traces)?;
    drop(traces);

    Ok(aggregate_samples(samples, symbolizer, false, order))
}
