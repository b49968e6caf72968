// src/pipeline/scheduler.rs

//! Timer-driven job scheduling.
//!
//! A job is a plain closure producing a future; a trigger says how often it
//! repeats. `IntervalScheduler` runs each registered job on its own tokio
//! task, firing once right away and then every interval. Firings of one job
//! never overlap: the next tick is only awaited after the previous firing
//! finished, and ticks missed meanwhile are delayed rather than bunched up.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, Result};

/// Future returned by one firing of a job.
pub type JobFuture = BoxFuture<'static, Result<()>>;

/// A repeatable unit of work.
pub type Job = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Fixed-interval trigger that starts immediately and repeats forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub interval: Duration,
}

impl Trigger {
    /// Fire immediately, then every `interval`.
    pub fn repeat_forever(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Registers jobs against triggers.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, job: Job, trigger: Trigger) -> Result<()>;
}

/// Counters shared with the job tasks.
#[derive(Debug, Default)]
struct Counters {
    firings: AtomicUsize,
    failures: AtomicUsize,
}

/// Scheduler backed by `tokio::time::interval`.
///
/// A firing that returns an error or panics is logged and counted; the next
/// firing still happens on schedule.
pub struct IntervalScheduler {
    tasks: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    stop: watch::Sender<bool>,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            counters: Arc::default(),
            stop: watch::Sender::new(false),
        }
    }
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Firings started so far, across all jobs.
    pub fn firing_count(&self) -> usize {
        self.counters.firings.load(Ordering::SeqCst)
    }

    /// Firings that ended in an error or a panic.
    pub fn failure_count(&self) -> usize {
        self.counters.failures.load(Ordering::SeqCst)
    }

    /// Stop every scheduled job and wait until each has returned. A firing
    /// in progress runs to completion before this resolves; once it does,
    /// the jobs and everything they captured have been dropped.
    pub async fn shutdown(&self) {
        self.stop.send_replace(true);
        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return,
        };
        for task in tasks {
            if let Err(error) = task.await {
                log::warn!("Scheduled job task ended abnormally: {}", error);
            }
        }
        log::info!("Scheduler shut down");
    }

    async fn run(
        job: Job,
        trigger: Trigger,
        counters: Arc<Counters>,
        mut stop: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(trigger.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => break,
                _ = ticker.tick() => {}
            }
            let firing = counters.firings.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!("Job firing #{} started", firing);

            // Run on a separate task so a panic is reported, not fatal.
            match tokio::spawn(job()).await {
                Ok(Ok(())) => log::debug!("Job firing #{} finished", firing),
                Ok(Err(error)) => {
                    counters.failures.fetch_add(1, Ordering::SeqCst);
                    log::error!("Job firing #{} failed: {}", firing, error);
                }
                Err(error) => {
                    counters.failures.fetch_add(1, Ordering::SeqCst);
                    log::error!("Job firing #{} aborted: {}", firing, error);
                }
            }
        }
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule(&self, job: Job, trigger: Trigger) -> Result<()> {
        if trigger.interval.is_zero() {
            return Err(AppError::schedule("trigger interval must be > 0"));
        }
        if *self.stop.borrow() {
            return Err(AppError::schedule("scheduler is shut down"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::schedule(format!("no async runtime: {e}")))?;
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| AppError::schedule("scheduler task list poisoned"))?;

        let counters = Arc::clone(&self.counters);
        let stop = self.stop.subscribe();
        tasks.push(runtime.spawn(Self::run(job, trigger, counters, stop)));
        log::info!("Scheduled job every {:?}", trigger.interval);
        Ok(())
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}
