//! Rate-limited write dispatch.
//!
//! GitHub asks integrators to space write requests out to one per second.
//! All outbound writes in a cycle (mark-read, reply, reactions) flow
//! through one pacer: an mpsc-fed pump that gates task starts on a fixed
//! interval and bounds how many run at once.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use remind_github::GithubError;

type TaskFuture = Pin<Box<dyn Future<Output = Result<(), GithubError>> + Send>>;

struct Job {
    label: String,
    fut: TaskFuture,
    done: oneshot::Sender<Result<(), GithubError>>,
}

/// Outcome receiver for a submitted task.
///
/// Resolves to `Err(RecvError)` only if the pump was torn down before the
/// task ran.
pub type TaskOutcome = oneshot::Receiver<Result<(), GithubError>>;

/// The shared write pacer for one cycle.
///
/// Tasks start in submission order, at least one pace interval apart, with
/// at most `max_in_flight` running concurrently. A failing task reports
/// its error through its outcome channel and never aborts siblings.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
    pump: JoinHandle<()>,
}

impl Dispatcher {
    pub fn new(pace: Duration, max_in_flight: usize) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let limiter = Arc::new(Semaphore::new(max_in_flight.max(1)));
        // tokio::time::interval panics on a zero period.
        let pace = pace.max(Duration::from_millis(1));

        let pump = tokio::spawn(async move {
            let mut interval = tokio::time::interval(pace);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while let Some(job) = rx.recv().await {
                interval.tick().await;
                let permit = Arc::clone(&limiter)
                    .acquire_owned()
                    .await
                    .expect("pacer semaphore closed");
                tokio::spawn(async move {
                    tracing::debug!(task = %job.label, "Dispatching");
                    let result = job.fut.await;
                    // The submitter may have gone away; that is fine.
                    let _ = job.done.send(result);
                    drop(permit);
                });
            }
        });

        Self { tx, pump }
    }

    /// Enqueue a write task. Returns a receiver for its outcome.
    pub fn submit<F>(&self, label: impl Into<String>, fut: F) -> TaskOutcome
    where
        F: Future<Output = Result<(), GithubError>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job = Job {
            label: label.into(),
            fut: Box::pin(fut),
            done: done_tx,
        };
        // A send error means the pump is gone; the receiver resolves to
        // RecvError and the caller counts it as a failure.
        let _ = self.tx.send(job);
        done_rx
    }

    /// Close the queue and wait for the pump to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.pump.await;
    }
}
