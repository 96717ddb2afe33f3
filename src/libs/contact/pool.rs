use crate::libs::error::ContactError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared stop flag with an optional deadline.
///
/// Clones share the same flag. Workers poll `is_cancelled` per pair and
/// `expired` every few hundred pairs.
///
/// ```
/// use gcmap::libs::contact::CancelToken;
/// let token = CancelToken::new();
/// let other = token.clone();
/// assert!(other.check().is_ok());
/// token.cancel();
/// assert!(other.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err` once the deadline has passed or the token was cancelled.
    /// An expired deadline also raises the flag so running workers stop.
    pub fn check(&self) -> Result<(), ContactError> {
        if self.expired() {
            self.cancel();
            return Err(ContactError::DeadlineExceeded);
        }
        if self.is_cancelled() {
            return Err(ContactError::Cancelled);
        }
        Ok(())
    }
}

/// Fixed-size pool of worker threads.
///
/// Work is submitted in fork-join batches: `barrier` hands out a [`Batch`],
/// every submitted task is picked up by an idle worker (rayon's work stealing),
/// and `barrier` returns only after all of them have finished.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// `threads == 0` uses one thread per logical core
    pub fn new(threads: usize) -> Result<Self, ContactError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("gcmap-worker-{}", idx))
            .build()
            .map_err(|e| ContactError::ThreadPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `submit_all`, then blocks until every task it submitted is done.
    ///
    /// The first task error cancels `cancel`, so the remaining tasks of the batch
    /// are dropped without running, and is returned once the batch has drained.
    pub fn barrier<'scope, F>(&self, cancel: &CancelToken, submit_all: F) -> Result<(), ContactError>
    where
        F: FnOnce(&Batch<'_, 'scope>) + Send,
    {
        let failure: Arc<Mutex<Option<ContactError>>> = Arc::new(Mutex::new(None));

        self.pool.scope(|scope: &rayon::Scope<'scope>| {
            let batch = Batch {
                scope,
                failure: Arc::clone(&failure),
                cancel: cancel.clone(),
            };
            submit_all(&batch);
        });

        let mut slot = failure.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Handle for submitting tasks into the current barrier.
pub struct Batch<'a, 'scope> {
    scope: &'a rayon::Scope<'scope>,
    failure: Arc<Mutex<Option<ContactError>>>,
    cancel: CancelToken,
}

impl<'a, 'scope> Batch<'a, 'scope> {
    pub fn submit<T>(&self, task: T)
    where
        T: FnOnce() -> Result<(), ContactError> + Send + 'scope,
    {
        let failure = Arc::clone(&self.failure);
        let cancel = self.cancel.clone();

        self.scope.spawn(move |_| {
            if cancel.is_cancelled() {
                return;
            }
            if let Err(err) = task() {
                cancel.cancel();
                let mut slot = failure.lock().unwrap_or_else(|e| e.into_inner());
                if slot.is_none() {
                    *slot = Some(err);
                }
            }
        });
    }
}
