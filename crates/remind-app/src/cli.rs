//! CLI argument definitions for the RemindMe bot.
//!
//! Uses `clap` with derive macros. Priority resolution: CLI args > env
//! vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// RemindMe — a GitHub bot that turns @-mentions into scheduled reminders.
#[derive(Parser, Debug)]
#[command(name = "remindme", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Run a single poll cycle and exit.
    #[arg(long = "once")]
    pub once: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > REMINDME_CONFIG env var > ~/.remindme/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("REMINDME_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".remindme").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_flag_wins() {
        let args = CliArgs {
            config: Some(PathBuf::from("/etc/remindme.toml")),
            log_level: None,
            once: false,
        };
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/etc/remindme.toml")
        );
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs {
            config: None,
            log_level: None,
            once: false,
        };
        assert_eq!(args.resolve_log_level("warn"), "warn");

        let args = CliArgs {
            config: None,
            log_level: Some("debug".to_string()),
            once: false,
        };
        assert_eq!(args.resolve_log_level("warn"), "debug");
    }

    #[test]
    fn test_args_parse_defaults() {
        let args = CliArgs::parse_from(["remindme"]);
        assert!(args.config.is_none());
        assert!(!args.once);
    }

    #[test]
    fn test_args_parse_once_flag() {
        let args = CliArgs::parse_from(["remindme", "--once", "-c", "x.toml"]);
        assert!(args.once);
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
    }
}
