//! Keyed worker pool with bounded, drop-when-full partitions.
//!
//! Every key hashes to one partition. A partition is a bounded queue served
//! by a single worker task, so work submitted under the same key runs one
//! at a time in submission order while different partitions run
//! concurrently.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Default number of partitions.
pub const DEFAULT_NUM_WORKERS: usize = 10;

/// Default queue depth per partition.
pub const DEFAULT_QUEUE_SIZE: usize = 100;

/// A unit of work executed by a partition worker.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Running,
    Draining,
    Killed,
}

/// Fixed set of partition workers.
pub struct QueuePool {
    senders: Vec<mpsc::Sender<Task>>,
    accepting: AtomicBool,
    state: watch::Sender<PoolState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl QueuePool {
    /// Spawns `num_workers` partitions, each holding up to `queue_size`
    /// waiting tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(num_workers: usize, queue_size: usize) -> Self {
        let num_workers = num_workers.max(1);
        let queue_size = queue_size.max(1);
        let (state, _) = watch::channel(PoolState::Running);

        let mut senders = Vec::with_capacity(num_workers);
        let mut workers = Vec::with_capacity(num_workers);
        for partition in 0..num_workers {
            let (tx, rx) = mpsc::channel(queue_size);
            senders.push(tx);
            workers.push(tokio::spawn(worker_loop(partition, rx, state.subscribe())));
        }

        Self {
            senders,
            accepting: AtomicBool::new(true),
            state,
            workers: Mutex::new(workers),
        }
    }

    /// Returns the number of partitions.
    pub fn num_workers(&self) -> usize {
        self.senders.len()
    }

    /// Returns the partition a key is routed to.
    pub fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    /// Queues a task on the key's partition without waiting.
    ///
    /// Returns false, without running the task, when the partition is full
    /// or the pool is shutting down.
    pub fn submit(&self, key: &str, task: Task) -> bool {
        if !self.accepting.load(Ordering::Acquire) {
            return false;
        }

        let partition = self.partition_for(key);
        match self.senders[partition].try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(partition, "webhook worker is gone, rejecting task");
                false
            }
        }
    }

    /// Returns the number of tasks waiting across all partitions.
    pub fn queued(&self) -> usize {
        self.senders
            .iter()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .sum()
    }

    /// Stops accepting work, runs everything already queued and waits for
    /// the workers to exit. Concurrent callers all wait for completion.
    pub async fn drain(&self) {
        self.shutdown(PoolState::Draining).await;
    }

    /// Stops accepting work, discards queued tasks and waits for the
    /// workers to finish their current task.
    pub async fn kill(&self) {
        self.shutdown(PoolState::Killed).await;
    }

    async fn shutdown(&self, mode: PoolState) {
        self.accepting.store(false, Ordering::Release);
        self.state.send_if_modified(|state| {
            if *state == PoolState::Killed || *state == mode {
                return false;
            }
            *state = mode;
            true
        });

        // Held until every worker is joined, so later callers wait too.
        let mut workers = self.workers.lock().await;
        while let Some(worker) = workers.last_mut() {
            if let Err(err) = worker.await {
                tracing::warn!(error = %err, "webhook worker exited abnormally");
            }
            workers.pop();
        }
    }
}

async fn worker_loop(
    partition: usize,
    mut rx: mpsc::Receiver<Task>,
    mut state: watch::Receiver<PoolState>,
) {
    let mut watching = true;
    loop {
        tokio::select! {
            biased;

            changed = state.changed(), if watching => {
                if changed.is_err() {
                    // pool dropped without an explicit stop: finish what is queued
                    watching = false;
                    rx.close();
                    continue;
                }
                match *state.borrow_and_update() {
                    PoolState::Killed => break,
                    PoolState::Draining => rx.close(),
                    PoolState::Running => {}
                }
            }
            task = rx.recv() => match task {
                Some(task) => run_task(partition, task).await,
                None => break,
            },
        }
    }
    tracing::debug!(partition, "webhook worker stopped");
}

/// Runs a task on its own so a panic does not take the worker down.
async fn run_task(partition: usize, task: Task) {
    if let Err(err) = tokio::spawn(task).await {
        if err.is_panic() {
            tracing::error!(partition, "webhook task panicked");
        }
    }
}
