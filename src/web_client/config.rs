//! Configuration for the feedline-web server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::lookup::DEFAULT_LOOKUP_TIMEOUT;

pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Web server for the feedline social feed.
///
/// Values come from CLI arguments or environment variables; CLI arguments
/// take precedence.
#[derive(Parser, Debug, Default)]
#[command(name = "feedline-web", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: FEEDLINE_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Directory holding the database [env: FEEDLINE_HOME] [default: ~/.feedline]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Upper bound for a single profile or engagement lookup, in
    /// milliseconds [env: FEEDLINE_LOOKUP_TIMEOUT_MS] [default: 5000]
    #[arg(long, short = 't')]
    pub lookup_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub lookup_timeout: Duration,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("FEEDLINE_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("FEEDLINE_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let lookup_timeout = cli
            .lookup_timeout_ms
            .or_else(|| {
                std::env::var("FEEDLINE_LOOKUP_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT);

        Self {
            bind_addr,
            data_dir,
            lookup_timeout,
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".feedline"))
        .unwrap_or_else(|_| PathBuf::from(".feedline"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_win() {
        let config = Config::from_cli_and_env(Cli {
            bind: Some("0.0.0.0:8080".to_string()),
            data_dir: Some(PathBuf::from("/srv/feedline")),
            lookup_timeout_ms: Some(250),
        });
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/srv/feedline"));
        assert_eq!(config.lookup_timeout, Duration::from_millis(250));
    }
}
