use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RemindError, Result};

/// Top-level configuration for the RemindMe bot.
///
/// Loaded from `~/.remindme/config.toml` by default. Each section corresponds
/// to one collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemindConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RemindConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RemindConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RemindError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the fields that have no sensible default.
    ///
    /// The bot cannot run without credentials and an identity to match
    /// mentions against.
    pub fn validate(&self) -> Result<()> {
        if self.github.handle.is_empty() {
            return Err(RemindError::Config("github.handle is required".into()));
        }
        if self.github.token.is_empty() {
            return Err(RemindError::Config("github.token is required".into()));
        }
        Ok(())
    }
}

/// GitHub identity and endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Bot account login, without the leading `@`. Used for mention matching
    /// and for filtering out the bot's own reactions (case-insensitive).
    pub handle: String,
    /// Personal access token for the bot account.
    pub token: String,
    /// User-Agent header sent on every request.
    pub user_agent: String,
    /// API base URL. Overridable for tests and GitHub Enterprise.
    pub api_base: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            handle: String::new(),
            token: String::new(),
            user_agent: "remindme-bot".to_string(),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

/// Poll cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    /// Per-request timeout in seconds. A hung call fails the cycle rather
    /// than wedging the lock past its expiry.
    pub request_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            request_timeout_secs: 30,
        }
    }
}

/// Outbound write pacing settings.
///
/// GitHub asks integrators to space write requests out to one per second;
/// the defaults encode that contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum milliseconds between consecutive write requests.
    pub write_pace_ms: u64,
    /// Maximum write requests in flight at once.
    pub max_in_flight: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            write_pace_ms: 1_000,
            max_in_flight: 1,
        }
    }
}

/// Cycle lock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Seconds after which a held lock expires, so a crashed holder cannot
    /// starve every other instance.
    pub timeout_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
