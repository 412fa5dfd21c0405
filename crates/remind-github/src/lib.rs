//! GitHub API boundary for the RemindMe bot.
//!
//! Provides the ReminderApi trait covering every endpoint the cycle
//! touches, a MockApi for testing, and a reqwest-backed GithubClient for
//! production use.

pub mod client;
pub mod error;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use remind_core::{Comment, Notification, RateLimitStatus, Reaction, ReactionRecord};

pub use client::GithubClient;
pub use error::GithubError;

/// The external API surface the cycle orchestrator depends on.
///
/// Implementations must be safe to share across tasks; reads are paced by
/// the caller, writes go through the rate-limited dispatcher.
#[async_trait]
pub trait ReminderApi: Send + Sync {
    /// Fetch the notification feed.
    async fn notifications(&self) -> Result<Vec<Notification>, GithubError>;

    /// Fetch all comments in a notification subject's thread.
    async fn thread_comments(&self, subject_url: &str) -> Result<Vec<Comment>, GithubError>;

    /// Fetch the reactions already present on a comment.
    async fn comment_reactions(
        &self,
        comment_url: &str,
    ) -> Result<Vec<ReactionRecord>, GithubError>;

    /// Attach a reaction to a comment.
    async fn add_reaction(&self, comment_url: &str, reaction: Reaction)
        -> Result<(), GithubError>;

    /// Post a reply comment on the issue or pull request.
    async fn post_reply(&self, issue_url: &str, body: &str) -> Result<(), GithubError>;

    /// Mark a notification thread as read.
    async fn mark_read(&self, thread_url: &str) -> Result<(), GithubError>;

    /// Read the remaining API quota.
    async fn rate_limit(&self) -> Result<RateLimitStatus, GithubError>;
}

/// Mock API for testing.
///
/// Reads serve canned data; writes are recorded so tests can assert on
/// what was dispatched. Failure toggles simulate transport errors.
#[derive(Debug, Default)]
pub struct MockApi {
    pub notifications: Vec<Notification>,
    /// Thread comments keyed by subject URL.
    pub comments: HashMap<String, Vec<Comment>>,
    /// Existing reactions keyed by comment URL.
    pub reactions: HashMap<String, Vec<ReactionRecord>>,
    /// When set, the notification fetch fails (aborts the cycle).
    pub fail_notifications: bool,
    /// When set, every write fails (exercises partial delivery).
    pub fail_writes: bool,
    pub posted_reactions: Mutex<Vec<(String, Reaction)>>,
    pub posted_replies: Mutex<Vec<(String, String)>>,
    pub marked_read: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_failure(&self, what: &str) -> Result<(), GithubError> {
        if self.fail_writes {
            return Err(GithubError::Status {
                status: 502,
                url: what.to_string(),
                body: "simulated write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderApi for MockApi {
    async fn notifications(&self) -> Result<Vec<Notification>, GithubError> {
        if self.fail_notifications {
            return Err(GithubError::Status {
                status: 503,
                url: "notifications".to_string(),
                body: "simulated feed failure".to_string(),
            });
        }
        Ok(self.notifications.clone())
    }

    async fn thread_comments(&self, subject_url: &str) -> Result<Vec<Comment>, GithubError> {
        Ok(self.comments.get(subject_url).cloned().unwrap_or_default())
    }

    async fn comment_reactions(
        &self,
        comment_url: &str,
    ) -> Result<Vec<ReactionRecord>, GithubError> {
        Ok(self.reactions.get(comment_url).cloned().unwrap_or_default())
    }

    async fn add_reaction(
        &self,
        comment_url: &str,
        reaction: Reaction,
    ) -> Result<(), GithubError> {
        self.write_failure(comment_url)?;
        self.posted_reactions
            .lock()
            .unwrap()
            .push((comment_url.to_string(), reaction));
        Ok(())
    }

    async fn post_reply(&self, issue_url: &str, body: &str) -> Result<(), GithubError> {
        self.write_failure(issue_url)?;
        self.posted_replies
            .lock()
            .unwrap()
            .push((issue_url.to_string(), body.to_string()));
        Ok(())
    }

    async fn mark_read(&self, thread_url: &str) -> Result<(), GithubError> {
        self.write_failure(thread_url)?;
        self.marked_read.lock().unwrap().push(thread_url.to_string());
        Ok(())
    }

    async fn rate_limit(&self) -> Result<RateLimitStatus, GithubError> {
        Ok(RateLimitStatus {
            remaining: 4_900,
            limit: 5_000,
            reset: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::{Author, Subject};

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

    fn comment(id: u64) -> Comment {
        Comment {
            id,
            body: "@RemindMe tomorrow".to_string(),
            url: format!("https://api.test/comments/{id}"),
            issue_url: "https://api.test/repos/a/b/issues/1".to_string(),
            user: Author {
                login: "alice".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_mock_serves_canned_reads() {
        let mut api = MockApi::new();
        api.notifications.push(notification("1"));
        api.comments.insert(
            "https://api.test/repos/a/b/issues/1".to_string(),
            vec![comment(7)],
        );

        let feed = api.notifications().await.unwrap();
        assert_eq!(feed.len(), 1);

        let comments = api
            .thread_comments("https://api.test/repos/a/b/issues/1")
            .await
            .unwrap();
        assert_eq!(comments[0].id, 7);

        // Unknown thread yields an empty list, not an error.
        let none = api.thread_comments("https://api.test/other").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mock_records_writes() {
        let api = MockApi::new();
        api.add_reaction("https://api.test/comments/7", Reaction::ThumbsUp)
            .await
            .unwrap();
        api.post_reply("https://api.test/repos/a/b/issues/1", "hello")
            .await
            .unwrap();
        api.mark_read("https://api.test/notifications/threads/1")
            .await
            .unwrap();

        assert_eq!(api.posted_reactions.lock().unwrap().len(), 1);
        assert_eq!(api.posted_replies.lock().unwrap()[0].1, "hello");
        assert_eq!(api.marked_read.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_toggles() {
        let mut api = MockApi::new();
        api.fail_notifications = true;
        assert!(api.notifications().await.is_err());

        let mut api = MockApi::new();
        api.fail_writes = true;
        assert!(api
            .add_reaction("url", Reaction::Party)
            .await
            .is_err());
        assert!(api.posted_reactions.lock().unwrap().is_empty());
    }
}
