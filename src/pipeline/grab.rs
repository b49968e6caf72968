// src/pipeline/grab.rs

//! Recurring crawl-and-persist job.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::scheduler::{Job, JobFuture, Scheduler, Trigger};
use crate::services::Parse;
use crate::storage::Store;

/// Lifecycle of a [`Grabber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabberState {
    /// Constructed, nothing registered yet
    Idle,
    /// A repeating trigger is registered with a scheduler
    Scheduled,
}

/// Wires a crawler and a store into a job repeating at a fixed interval.
#[derive(Debug)]
pub struct Grabber {
    source_url: String,
    interval: Duration,
    state: GrabberState,
}

impl Grabber {
    pub fn new(config: &Config) -> Self {
        Self::with_interval(&config.crawler.source_url, config.scheduler.interval())
    }

    pub fn with_interval(source_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            source_url: source_url.into(),
            interval,
            state: GrabberState::Idle,
        }
    }

    pub fn state(&self) -> GrabberState {
        self.state
    }

    /// Register the crawl job with `scheduler`: first firing now, then
    /// every interval, forever. Can only be called once.
    pub fn init(
        &mut self,
        parse: Arc<dyn Parse>,
        store: Arc<dyn Store>,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        if self.state == GrabberState::Scheduled {
            return Err(AppError::schedule("grab job is already scheduled"));
        }

        let job = grab_job(parse, store, self.source_url.clone());
        scheduler.schedule(job, Trigger::repeat_forever(self.interval))?;
        self.state = GrabberState::Scheduled;
        Ok(())
    }
}

/// One firing: crawl the source and hand every post to the store.
///
/// Returns the number of posts handed over. Save failures are the store's
/// to log; only a failed crawl is reported.
pub async fn run_grab(parse: &dyn Parse, store: &dyn Store, source_url: &str) -> Result<usize> {
    let posts = parse.list(source_url).await?;
    for post in &posts {
        store.save(post).await;
    }
    log::info!("Handed {} posts to the store", posts.len());
    Ok(posts.len())
}

fn grab_job(parse: Arc<dyn Parse>, store: Arc<dyn Store>, source_url: String) -> Job {
    Arc::new(move || -> JobFuture {
        let parse = Arc::clone(&parse);
        let store = Arc::clone(&store);
        let source_url = source_url.clone();
        async move {
            run_grab(parse.as_ref(), store.as_ref(), &source_url)
                .await
                .map(|_| ())
        }
        .boxed()
    })
}
