//! Cycle orchestration.
//!
//! One poll cycle: fetch notifications, keep the mentions, pool and dedupe
//! their thread comments, screen and classify each comment, then dispatch
//! the derived actions through the shared write pacer. The outer loop runs
//! forever on a fixed interval, gated by the cycle lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;

use remind_core::{Comment, Notification, RemindConfig};
use remind_github::ReminderApi;
use remind_parse::MentionScanner;

use crate::dedup::dedupe;
use crate::derive::{ActionDeriver, CommentAction};
use crate::dispatch::Dispatcher;
use crate::error::CycleError;
use crate::lock::CycleLock;

/// Counters from one completed pass, for the cycle log.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleReport {
    /// Mention notifications in the feed this pass.
    pub mentions: usize,
    /// Unique comments after pooling and dedup.
    pub comments_seen: usize,
    /// Comments that derived a non-empty action.
    pub responded: usize,
    /// Write tasks that completed successfully.
    pub dispatched: usize,
    /// Write tasks that failed (partial delivery, not fatal).
    pub dispatch_failures: usize,
}

/// Runs poll cycles against the API boundary, under the cycle lock.
pub struct CycleRunner {
    api: Arc<dyn ReminderApi>,
    lock: Arc<dyn CycleLock>,
    scanner: MentionScanner,
    deriver: ActionDeriver,
    handle: String,
    write_pace: Duration,
    max_in_flight: usize,
    interval: Duration,
}

impl CycleRunner {
    pub fn new(
        config: &RemindConfig,
        api: Arc<dyn ReminderApi>,
        lock: Arc<dyn CycleLock>,
    ) -> Self {
        Self {
            api,
            lock,
            scanner: MentionScanner::new(&config.github.handle),
            deriver: ActionDeriver::new(&config.github.handle),
            handle: config.github.handle.clone(),
            write_pace: Duration::from_millis(config.dispatch.write_pace_ms),
            max_in_flight: config.dispatch.max_in_flight,
            interval: Duration::from_secs(config.poll.interval_secs),
        }
    }

    /// Cycle forever: lock, pass, release, sleep. Returns on shutdown.
    ///
    /// A failed cycle is logged and the next one is scheduled regardless;
    /// nothing here is fatal to the process.
    pub async fn run(&self, shutdown: &Notify) {
        loop {
            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    mentions = report.mentions,
                    comments = report.comments_seen,
                    responded = report.responded,
                    dispatched = report.dispatched,
                    failures = report.dispatch_failures,
                    "Cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "Cycle failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.notified() => return,
            }
        }
    }

    /// Run one pass under the cycle lock.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let code = match self.lock.acquire().await {
            Ok(Some(code)) => code,
            Ok(None) => return Err(CycleError::LockHeld),
            Err(e) => return Err(CycleError::Lock(e.to_string())),
        };
        tracing::info!("Cycle lock acquired");

        let outcome = self.run_pass().await;

        match self.lock.release(code).await {
            Ok(true) => tracing::info!("Cycle lock released"),
            Ok(false) => tracing::warn!("Could not release cycle lock"),
            Err(e) => tracing::warn!(error = %e, "Cycle lock release failed"),
        }

        outcome
    }

    /// The pipeline itself. Each step depends on the previous one
    /// succeeding; any failure aborts the remainder of the pass.
    async fn run_pass(&self) -> Result<CycleReport, CycleError> {
        let now = Utc::now();
        let mut report = CycleReport::default();

        let notifications = self.api.notifications().await?;
        let mentions: Vec<Notification> = notifications
            .into_iter()
            .filter(Notification::is_mention)
            .collect();
        report.mentions = mentions.len();

        // Pool the comments of every mentioned thread. Fetches stay
        // sequential so dedup's first-seen tie-break follows fetch order.
        let mut pooled: Vec<Comment> = Vec::new();
        for notification in &mentions {
            pooled.extend(self.api.thread_comments(&notification.subject.url).await?);
        }

        let unique = dedupe(pooled);
        report.comments_seen = unique.len();

        // Coarse screen, then drop comments the bot already acknowledged.
        let mut pending: Vec<Comment> = Vec::new();
        for comment in unique {
            if !self.scanner.mentions_anywhere(&comment.body) {
                continue;
            }
            let existing = self.api.comment_reactions(&comment.url).await?;
            if existing.iter().any(|r| r.is_by(&self.handle)) {
                tracing::debug!(comment_id = comment.id, "Already acknowledged; skipping");
                continue;
            }
            pending.push(comment);
        }

        // Classify. No-op actions never reach the dispatcher.
        let mut planned: Vec<(Comment, CommentAction)> = Vec::new();
        for comment in pending {
            let captures = self.scanner.extract(&comment.body, now);
            let action = self.deriver.derive(&comment.user.login, &captures);
            if action.is_noop() {
                continue;
            }
            planned.push((comment, action));
        }
        report.responded = planned.len();

        self.dispatch(&mentions, &planned, &mut report).await;

        let quota = self.api.rate_limit().await?;
        tracing::info!(
            remaining = quota.remaining,
            limit = quota.limit,
            reset = quota.reset,
            "Rate limit status"
        );

        Ok(report)
    }

    /// Feed every write of this pass through one pacer and collect the
    /// outcomes. Failures are counted, logged, and otherwise tolerated.
    async fn dispatch(
        &self,
        mentions: &[Notification],
        planned: &[(Comment, CommentAction)],
        report: &mut CycleReport,
    ) {
        if mentions.is_empty() {
            return;
        }

        let dispatcher = Dispatcher::new(self.write_pace, self.max_in_flight);
        let mut outcomes = Vec::new();

        for notification in mentions {
            let api = Arc::clone(&self.api);
            let url = notification.url.clone();
            outcomes.push(dispatcher.submit(
                format!("mark-read {}", notification.id),
                async move { api.mark_read(&url).await },
            ));
        }

        for (comment, action) in planned {
            tracing::info!(comment_id = comment.id, url = %comment.url, "Responding");

            if let Some(reply) = action.reply.clone() {
                let api = Arc::clone(&self.api);
                let issue_url = comment.issue_url.clone();
                outcomes.push(dispatcher.submit(
                    format!("reply {}", comment.id),
                    async move { api.post_reply(&issue_url, &reply).await },
                ));
            }

            for &reaction in &action.reactions {
                let api = Arc::clone(&self.api);
                let url = comment.url.clone();
                outcomes.push(dispatcher.submit(
                    format!("reaction {} {}", comment.id, reaction),
                    async move { api.add_reaction(&url, reaction).await },
                ));
            }
        }

        for outcome in outcomes {
            match outcome.await {
                Ok(Ok(())) => report.dispatched += 1,
                Ok(Err(e)) => {
                    report.dispatch_failures += 1;
                    tracing::warn!(error = %e, "Dispatch task failed");
                }
                Err(_) => report.dispatch_failures += 1,
            }
        }

        dispatcher.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::{Author, Subject};
    use remind_github::MockApi;
    use crate::lock::ProcessLock;

    fn config() -> RemindConfig {
        let mut config = RemindConfig::default();
        config.github.handle = "RemindMe".to_string();
        config.github.token = "ghp_test".to_string();
        config.dispatch.write_pace_ms = 1;
        config.poll.interval_secs = 1;
        config
    }

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            reason: "mention".to_string(),
            subject: Subject {
                url: format!("https://api.test/repos/a/b/issues/{id}"),
            },
            url: format!("https://api.test/notifications/threads/{id}"),
        }
    }

    fn comment(id: u64, body: &str) -> Comment {
        Comment {
            id,
            body: body.to_string(),
            url: format!("https://api.test/comments/{id}"),
            issue_url: "https://api.test/repos/a/b/issues/1".to_string(),
            user: Author {
                login: "alice".to_string(),
            },
        }
    }

    fn runner(api: MockApi) -> CycleRunner {
        let lock = Arc::new(ProcessLock::new(Duration::from_secs(120)));
        CycleRunner::new(&config(), Arc::new(api), lock)
    }

    #[tokio::test]
    async fn test_empty_feed_is_a_clean_cycle() {
        let report = runner(MockApi::new()).run_cycle().await.unwrap();
        assert_eq!(report.mentions, 0);
        assert_eq!(report.dispatched, 0);
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_cycle() {
        let mut api = MockApi::new();
        api.fail_notifications = true;
        let err = runner(api).run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Github(_)));
    }

    #[tokio::test]
    async fn test_lock_held_aborts_cycle() {
        let api = Arc::new(MockApi::new());
        let lock = Arc::new(ProcessLock::new(Duration::from_secs(120)));
        let runner = CycleRunner::new(&config(), api, Arc::clone(&lock) as Arc<dyn CycleLock>);

        let held = lock.acquire().await.unwrap().unwrap();
        let err = runner.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::LockHeld));
        lock.release(held).await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_pass() {
        let mut api = MockApi::new();
        api.fail_notifications = true;
        let lock = Arc::new(ProcessLock::new(Duration::from_secs(120)));
        let runner = CycleRunner::new(&config(), Arc::new(api), Arc::clone(&lock) as Arc<dyn CycleLock>);

        assert!(runner.run_cycle().await.is_err());
        // The lock must be free again for the next cycle.
        let code = lock.acquire().await.unwrap();
        assert!(code.is_some());
    }

    #[tokio::test]
    async fn test_non_mention_notifications_ignored() {
        let mut api = MockApi::new();
        let mut other = notification("1");
        other.reason = "subscribed".to_string();
        api.notifications.push(other);

        let report = runner(api).run_cycle().await.unwrap();
        assert_eq!(report.mentions, 0);
        assert_eq!(report.comments_seen, 0);
    }

    #[tokio::test]
    async fn test_already_acknowledged_comment_skipped() {
        let mut api = MockApi::new();
        api.notifications.push(notification("1"));
        let c = comment(7, "@RemindMe in 2 hours");
        api.reactions.insert(
            c.url.clone(),
            vec![remind_core::ReactionRecord {
                user: Author {
                    login: "remindme".to_string(),
                },
                content: "+1".to_string(),
            }],
        );
        api.comments
            .insert("https://api.test/repos/a/b/issues/1".to_string(), vec![c]);

        let api = Arc::new(api);
        let lock = Arc::new(ProcessLock::new(Duration::from_secs(120)));
        let runner = CycleRunner::new(&config(), Arc::clone(&api) as Arc<dyn ReminderApi>, lock);

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.comments_seen, 1);
        assert_eq!(report.responded, 0);
        assert!(api.posted_reactions.lock().unwrap().is_empty());
        // The notification is still marked read.
        assert_eq!(api.marked_read.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_returns_on_shutdown() {
        let runner = runner(MockApi::new());
        let shutdown = Notify::new();
        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), runner.run(&shutdown))
            .await
            .expect("run should return after the first cycle on shutdown");
    }
}
