/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! A bounded-queue pool of long-lived workers used to run order admission
//! and matching work off of callers' own tasks, with per-task timeouts and
//! panic containment.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Semaphore};
use tracing::{error, warn};

use crate::engine::error::WorkerPoolError;

type BoxedTask = Box<dyn FnOnce() + Send>;

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker task panicked with a non-string payload".to_string()
    }
}

/// A bounded-queue task pool backed by a small number of long-lived workers.
///
/// A floor worker is always running, draining the bounded task queue.
/// Workers beyond the floor are spawned on demand, up to `worker_count`, and
/// exit after sitting idle for `idle_timeout` — the pool grows and shrinks
/// with load rather than paying the cost of one `tokio::spawn` per task.
/// `submit` rejects immediately with [`WorkerPoolError::QueueFull`] once the
/// number of tasks queued or executing reaches `queue_capacity`, and a
/// panicking task is caught and reported as [`WorkerPoolError::Panicked`]
/// without taking the worker down.
pub struct WorkerPool {
    task_tx: mpsc::Sender<BoxedTask>,
    task_rx: Arc<AsyncMutex<mpsc::Receiver<BoxedTask>>>,
    queue_capacity: usize,
    task_timeout: Duration,
    worker_count: usize,
    idle_timeout: Duration,
    spawn_guard: Arc<Semaphore>,
    queued: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
    timed_out: Arc<AtomicU64>,
    panicked: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    current_workers: Arc<AtomicU64>,
    total_duration_us: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Creates a pool that grows up to `worker_count` long-lived workers, a
    /// queue of `queue_capacity` outstanding tasks, `task_timeout` per task,
    /// and `idle_timeout` before a worker above the floor of 1 exits.
    #[must_use]
    pub fn new(worker_count: usize, queue_capacity: usize, task_timeout: Duration, idle_timeout: Duration) -> Self {
        let worker_count = worker_count.max(1);
        let (task_tx, task_rx) = mpsc::channel(queue_capacity.max(1));
        let task_rx = Arc::new(AsyncMutex::new(task_rx));
        let queued = Arc::new(AtomicU64::new(0));
        let in_flight = Arc::new(AtomicU64::new(0));
        let current_workers = Arc::new(AtomicU64::new(1));

        tokio::spawn(Self::run_worker(
            task_rx.clone(),
            queued.clone(),
            in_flight.clone(),
            current_workers.clone(),
            None,
            None,
        ));

        Self {
            task_tx,
            task_rx,
            queue_capacity,
            task_timeout,
            worker_count,
            idle_timeout,
            spawn_guard: Arc::new(Semaphore::new(worker_count.saturating_sub(1))),
            queued,
            in_flight,
            completed: Arc::new(AtomicU64::new(0)),
            timed_out: Arc::new(AtomicU64::new(0)),
            panicked: Arc::new(AtomicU64::new(0)),
            rejected: Arc::new(AtomicU64::new(0)),
            current_workers,
            total_duration_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Worker loop. The floor worker (`idle_timeout: None`) runs until the
    /// channel closes; a demand-spawned worker exits once `recv` sits idle
    /// past its timeout, releasing `spawn_permit` so another can take its
    /// place later.
    async fn run_worker(
        rx: Arc<AsyncMutex<mpsc::Receiver<BoxedTask>>>,
        queued: Arc<AtomicU64>,
        in_flight: Arc<AtomicU64>,
        current_workers: Arc<AtomicU64>,
        idle_timeout: Option<Duration>,
        spawn_permit: Option<tokio::sync::OwnedSemaphorePermit>,
    ) {
        loop {
            let next = {
                let mut guard = rx.lock().await;
                match idle_timeout {
                    Some(timeout) => match tokio::time::timeout(timeout, guard.recv()).await {
                        Ok(task) => task,
                        Err(_) => None,
                    },
                    None => guard.recv().await,
                }
            };
            let Some(task) = next else { break };
            queued.fetch_sub(1, Ordering::AcqRel);
            in_flight.fetch_add(1, Ordering::AcqRel);
            // Run on the blocking pool so a slow or panicking task cannot
            // stall this worker's own timeout bookkeeping on the submitter
            // side; `task` has already wrapped itself in `catch_unwind`.
            let _ = tokio::task::spawn_blocking(task).await;
            in_flight.fetch_sub(1, Ordering::AcqRel);
        }
        current_workers.fetch_sub(1, Ordering::AcqRel);
        drop(spawn_permit);
    }

    /// Spawns another worker if the pool has room below `worker_count` and a
    /// spawn permit is available. A no-op once the pool is already at full
    /// strength.
    fn maybe_spawn_worker(&self) {
        if self.current_workers.load(Ordering::Acquire) as usize >= self.worker_count {
            return;
        }
        if let Ok(permit) = self.spawn_guard.clone().try_acquire_owned() {
            self.current_workers.fetch_add(1, Ordering::AcqRel);
            tokio::spawn(Self::run_worker(
                self.task_rx.clone(),
                self.queued.clone(),
                self.in_flight.clone(),
                self.current_workers.clone(),
                Some(self.idle_timeout),
                Some(permit),
            ));
        }
    }

    /// Submits `task` for execution, awaiting its result.
    ///
    /// Rejects immediately with [`WorkerPoolError::QueueFull`] if the number
    /// of tasks already queued or executing has reached `queue_capacity`.
    /// Otherwise runs `task` on a worker under `task_timeout`, converting a
    /// panic into [`WorkerPoolError::Panicked`] instead of propagating it.
    pub async fn submit<F, T>(&self, task: F) -> Result<T, WorkerPoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let outstanding = self.queued.load(Ordering::Acquire) + self.in_flight.load(Ordering::Acquire);
        if outstanding as usize >= self.queue_capacity {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(WorkerPoolError::QueueFull);
        }

        let (reply_tx, reply_rx) = oneshot::channel::<Result<T, WorkerPoolError>>();
        let completed = self.completed.clone();
        let panicked = self.panicked.clone();
        let total_duration_us = self.total_duration_us.clone();
        let boxed: BoxedTask = Box::new(move || {
            let started = Instant::now();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task));
            total_duration_us.fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
            let reply = match outcome {
                Ok(value) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                    Ok(value)
                }
                Err(payload) => {
                    panicked.fetch_add(1, Ordering::Relaxed);
                    let message = panic_message(payload.as_ref());
                    error!(%message, "worker pool task panicked");
                    Err(WorkerPoolError::Panicked { message })
                }
            };
            let _ = reply_tx.send(reply);
        });

        self.queued.fetch_add(1, Ordering::AcqRel);
        self.maybe_spawn_worker();
        if self.task_tx.try_send(boxed).is_err() {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(WorkerPoolError::QueueFull);
        }

        let timeout_ms = self.task_timeout.as_millis() as u64;
        match tokio::time::timeout(self.task_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(WorkerPoolError::ShuttingDown),
            Err(_) => {
                self.timed_out.fetch_add(1, Ordering::Relaxed);
                warn!(timeout_ms, "worker pool task timed out");
                Err(WorkerPoolError::Timeout { timeout_ms })
            }
        }
    }

    /// Snapshot of the pool's counters.
    #[must_use]
    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            in_flight: self.in_flight.load(Ordering::Relaxed),
            current_workers: self.current_workers.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            total_duration_us: self.total_duration_us.load(Ordering::Relaxed),
            available_spawn_permits: self.spawn_guard.available_permits(),
        }
    }
}

/// Point-in-time view of a [`WorkerPool`]'s counters.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerPoolStats {
    pub in_flight: u64,
    pub current_workers: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub panicked: u64,
    pub rejected: u64,
    pub total_duration_us: u64,
    pub available_spawn_permits: usize,
}
