use super::levenshtein::{levenshtein, Levenshtein};
use super::pool::{CancelToken, WorkerPool};
use super::resolution;
use super::sink::{ResultSink, Triple};
use crate::libs::error::ContactError;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Pairs evaluated between two reads of the clock
const DEADLINE_POLL: usize = 256;

/// Default for [`ContactOpts::batch_size`]
pub const ROW_BATCH: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactOpts {
    /// Outer positions per synchronized chunk
    pub chunk_size: usize,
    /// Only positions that are multiples of `step` are compared
    pub step: usize,
    /// Worker threads, 0 for one per logical core
    pub parallel: usize,
    pub timeout: Option<Duration>,
    /// Largest batch of triples a task hands to the sink at once
    pub batch_size: usize,
}

impl Default for ContactOpts {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            step: 1,
            parallel: 0,
            timeout: None,
            batch_size: ROW_BATCH,
        }
    }
}

/// Progress of a run, reported after each chunk's barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReport {
    /// 0-based
    pub index: usize,
    pub total: usize,
    pub range: (usize, usize),
    /// Triples computed in this chunk, mirrors not included
    pub pairs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: usize,
    pub pairs: u64,
    /// Lines written by the sink, mirrors included
    pub rows: u64,
}

/// Walks the outer index range chunk by chunk, fanning each chunk out over a
/// worker pool.
///
/// Chunk k+1 starts only after every row of chunk k has been evaluated and
/// handed to the sink.
pub struct ChunkScheduler {
    pool: WorkerPool,
    chunk_size: usize,
    step: usize,
    batch_size: usize,
    cancel: CancelToken,
}

impl ChunkScheduler {
    pub fn new(opts: &ContactOpts) -> Result<Self, ContactError> {
        if opts.chunk_size == 0 {
            return Err(ContactError::InvalidConfig("chunk size must be positive".to_string()));
        }
        if opts.step == 0 {
            return Err(ContactError::InvalidConfig("step must be positive".to_string()));
        }
        if opts.batch_size == 0 {
            return Err(ContactError::InvalidConfig("batch size must be positive".to_string()));
        }

        let cancel = match opts.timeout {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        };

        Ok(Self {
            pool: WorkerPool::new(opts.parallel)?,
            chunk_size: opts.chunk_size,
            step: opts.step,
            batch_size: opts.batch_size,
            cancel,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    /// Handle to stop the run from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Contiguous chunks covering `[0, len)`
    pub fn chunks(&self, len: usize) -> Vec<Range<usize>> {
        (0..len)
            .step_by(self.chunk_size)
            .map(|start| start..(start + self.chunk_size).min(len))
            .collect()
    }

    /// Evaluates every eligible pair of `seq` and forwards the triples to `sink`.
    ///
    /// `progress` is called once per finished chunk. The sink is not finished
    /// here, so `rows` of the returned summary stays 0; see [`compute`](super::compute).
    pub fn run<P>(
        &self,
        seq: &[u8],
        sink: &dyn ResultSink,
        mut progress: P,
    ) -> Result<RunSummary, ContactError>
    where
        P: FnMut(&ChunkReport),
    {
        let chunks = self.chunks(seq.len());
        let total = chunks.len();
        let step = self.step;
        let batch_size = self.batch_size;
        let cancel = &self.cancel;

        let mut summary = RunSummary::default();
        for (index, range) in chunks.into_iter().enumerate() {
            cancel.check()?;

            let pairs = AtomicU64::new(0);
            self.pool.barrier(cancel, |batch| {
                for i in range.clone().filter(|i| i % step == 0) {
                    let pairs = &pairs;
                    batch.submit(move || {
                        let emitted =
                            evaluate_row(seq, i, step, batch_size, cancel, |triples| {
                                sink.emit_all(triples)
                            })?;
                        pairs.fetch_add(emitted, Ordering::Relaxed);
                        Ok(())
                    });
                }
            })?;

            if cancel.is_cancelled() {
                return Err(if cancel.expired() {
                    ContactError::DeadlineExceeded
                } else {
                    ContactError::Cancelled
                });
            }

            let report = ChunkReport {
                index,
                total,
                range: (range.start, range.end),
                pairs: pairs.into_inner(),
            };
            summary.chunks += 1;
            summary.pairs += report.pairs;
            progress(&report);
        }

        Ok(summary)
    }
}

/// Evaluates all triples with outer index `i`, in increasing `j`, and hands
/// them to `flush` in batches of at most `batch_size`.
///
/// Returns the number of triples flushed. The unflushed tail of a row cut
/// short by a cancel is dropped.
fn evaluate_row<F>(
    seq: &[u8],
    i: usize,
    step: usize,
    batch_size: usize,
    cancel: &CancelToken,
    mut flush: F,
) -> Result<u64, ContactError>
where
    F: FnMut(Vec<Triple>) -> Result<(), ContactError>,
{
    if cancel.expired() {
        cancel.cancel();
        return Ok(0);
    }

    let n = seq.len();
    let mut engine = Levenshtein::new();
    let mut pending = Vec::new();
    let mut emitted = 0u64;

    for (k, j) in (i..n).step_by(step).enumerate() {
        if cancel.is_cancelled() {
            return Ok(emitted);
        }
        if k % DEADLINE_POLL == DEADLINE_POLL - 1 && cancel.expired() {
            cancel.cancel();
            return Ok(emitted);
        }

        let len = resolution::decide(j - i);
        // j + len never decreases as j grows
        if j + len > n {
            break;
        }
        let distance = engine.distance(&seq[i..i + len], &seq[j..j + len]);
        pending.push(Triple::new(i, j, distance));

        if pending.len() >= batch_size {
            emitted += pending.len() as u64;
            flush(std::mem::take(&mut pending))?;
        }
    }

    if !pending.is_empty() {
        emitted += pending.len() as u64;
        flush(pending)?;
    }
    Ok(emitted)
}

/// Compares the windows at `a` and `b`, in either order.
///
/// Returns `None` when either window would run past the end of `seq`.
///
/// ```
/// use gcmap::libs::contact::evaluate_pair;
/// let seq = b"ACGTACGTACGT";
/// assert_eq!(evaluate_pair(seq, 0, 1).unwrap().distance, 2);
/// assert_eq!(evaluate_pair(seq, 2, 3), None);
/// ```
pub fn evaluate_pair(seq: &[u8], a: usize, b: usize) -> Option<Triple> {
    let len = resolution::decide(a.abs_diff(b));
    if len > seq.len() || a.max(b) > seq.len() - len {
        return None;
    }
    let distance = levenshtein(&seq[a..a + len], &seq[b..b + len]);
    Some(Triple::new(a, b, distance))
}
