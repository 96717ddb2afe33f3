//! Resolution-aware contact maps.
//!
//! Every position pair `(i, j)` with `i <= j` is scored by the edit distance of
//! the windows starting at `i` and `j`. The window length depends only on
//! `j - i`:
//!
//! | j - i                  | window  |
//! |------------------------|---------|
//! | <= 100,000             | 10      |
//! | <= 1,000,000           | 100     |
//! | larger                 | 1,000   |
//!
//! Pairs whose windows run past the end of the sequence are skipped.

mod levenshtein;
mod pool;
mod resolution;
mod scheduler;
mod sink;

pub use levenshtein::{levenshtein, Levenshtein};
pub use pool::{Batch, CancelToken, WorkerPool};
pub use resolution::{decide, Resolution, MID_MAX_DISTANCE, NEAR_MAX_DISTANCE};
pub use scheduler::{evaluate_pair, ChunkReport, ChunkScheduler, ContactOpts, RunSummary, ROW_BATCH};
pub use sink::{open_sink, BatchSink, ResultSink, SinkOpts, SinkStrategy, StreamSink, Triple};

use crate::libs::error::ContactError;

/// Runs the whole map into `sink` and finishes it.
///
/// The sink is finished even when the run fails, so the destination is flushed
/// and the writer thread joined. If the run failed because the writer stopped,
/// the writer's own error is returned since it names the cause.
///
/// ```
/// use gcmap::libs::contact::{compute, BatchSink, ContactOpts};
/// let sink = Box::new(BatchSink::new(Vec::new(), "mem", false));
/// let summary = compute(b"ACGTACGTAC", &ContactOpts::default(), sink, |_| {}).unwrap();
/// assert_eq!(summary.pairs, 1);
/// assert_eq!(summary.rows, 1);
/// ```
pub fn compute<P>(
    seq: &[u8],
    opts: &ContactOpts,
    sink: Box<dyn ResultSink>,
    progress: P,
) -> Result<RunSummary, ContactError>
where
    P: FnMut(&ChunkReport),
{
    let outcome = ChunkScheduler::new(opts).and_then(|s| s.run(seq, sink.as_ref(), progress));
    let finished = sink.finish();

    match (outcome, finished) {
        (Ok(summary), Ok(rows)) => Ok(RunSummary { rows, ..summary }),
        (Err(ContactError::OutputWrite(_)), Err(err)) => Err(err),
        (Err(err), _) => Err(err),
        (Ok(_), Err(err)) => Err(err),
    }
}
