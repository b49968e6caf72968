//! Scheduling of the crawl-and-persist job.
//!
//! - `scheduler`: fixed-interval timer that runs jobs
//! - `grab`: the job itself and the `Grabber` that registers it

pub mod grab;
pub mod scheduler;

pub use grab::{Grabber, GrabberState, run_grab};
pub use scheduler::{IntervalScheduler, Job, JobFuture, Scheduler, Trigger};
