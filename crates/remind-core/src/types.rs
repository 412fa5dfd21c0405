use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enums
// =============================================================================

/// Acknowledgement reactions the bot can attach to a comment.
///
/// Wire names follow the GitHub reactions vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    #[serde(rename = "+1")]
    ThumbsUp,
    #[serde(rename = "-1")]
    ThumbsDown,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "heart")]
    Heart,
    #[serde(rename = "hooray")]
    Party,
}

impl Reaction {
    /// The `content` value accepted by the reactions endpoint.
    pub fn content(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "+1",
            Reaction::ThumbsDown => "-1",
            Reaction::Confused => "confused",
            Reaction::Heart => "heart",
            Reaction::Party => "hooray",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content())
    }
}

impl std::str::FromStr for Reaction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+1" => Ok(Reaction::ThumbsUp),
            "-1" => Ok(Reaction::ThumbsDown),
            "confused" => Ok(Reaction::Confused),
            "heart" => Ok(Reaction::Heart),
            "hooray" => Ok(Reaction::Party),
            _ => Err(format!("Unknown reaction content: {}", s)),
        }
    }
}

// =============================================================================
// Feed payloads
// =============================================================================

/// One entry from the notification feed. Ephemeral: fetched each cycle,
/// discarded after the cycle completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub reason: String,
    pub subject: Subject,
    /// Thread URL; a PATCH here marks the notification read.
    pub url: String,
}

impl Notification {
    /// Whether this notification is an @-mention of the bot.
    pub fn is_mention(&self) -> bool {
        self.reason == "mention"
    }
}

/// The subject of a notification thread (an issue or pull request).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub url: String,
}

/// A comment fetched from a notification thread.
///
/// Identity is `id`: two records with the same id arriving from different
/// threads are the same comment and must collapse to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    /// Comment URL; keys the reactions endpoints.
    pub url: String,
    /// Issue URL; keys the reply endpoint.
    pub issue_url: String,
    pub user: Author,
}

/// A comment or reaction author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
}

/// An existing reaction read back from a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub user: Author,
    pub content: String,
}

impl ReactionRecord {
    /// Whether this reaction was left by the given login (case-insensitive).
    pub fn is_by(&self, login: &str) -> bool {
        self.user.login.eq_ignore_ascii_case(login)
    }
}

/// Remaining API quota, read once per cycle and logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub remaining: u64,
    pub limit: u64,
    /// Unix timestamp at which the quota window resets.
    pub reset: i64,
}
