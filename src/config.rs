use std::time::Duration;

use chrono_tz::Tz;

use crate::error::{AppError, Result};

pub const MLB_API_URL: &str = "https://statsapi.mlb.com/api/v1";
pub const MLB_FEED_API_URL: &str = "https://statsapi.mlb.com/api/v1.1";

/// Upstream sport id for Major League Baseball.
pub const SPORT_ID: u32 = 1;

/// Poll interval (seconds): how often the roster is checked for new at-bats.
pub const POLL_INTERVAL_SECS: u64 = 300;

/// Per-request timeout for upstream calls (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 15;

/// Upper bound on one roster entry's processing within a cycle (seconds).
/// A handful of sequential upstream calls, each bounded by HTTP_TIMEOUT_SECS.
pub const PLAYER_TIMEOUT_SECS: u64 = 60;

/// Game-day zone. "Today" and scheduled start times are resolved here.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Result events that count as hits. Everything else renders as an out.
pub const HIT_EVENTS: &[&str] = &["Single", "Double", "Triple", "Home Run"];

/// Bases that put a runner in scoring position.
pub const SCORING_BASES: &[&str] = &["2B", "3B"];

/// Rendered for average/OBP/slugging when the upstream split is missing.
pub const EMPTY_RATE: &str = ".000";

/// Where roster and marker state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Json,
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "STORE_BACKEND must be one of json, sqlite, memory (got {other:?})"
            ))),
        }
    }
}

/// When a player's marker advances relative to notification delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPolicy {
    /// Advance only once the notifier confirmed delivery. A failed post is
    /// retried on the next cycle.
    AfterDelivery,
    /// Advance as soon as the event is detected, even if the post failed.
    Always,
}

impl std::str::FromStr for MarkerPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "after_delivery" => Ok(MarkerPolicy::AfterDelivery),
            "always" => Ok(MarkerPolicy::Always),
            other => Err(AppError::Config(format!(
                "MARKER_POLICY must be after_delivery or always (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub feed_api_url: String,
    pub sport_id: u32,
    pub log_level: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub player_timeout: Duration,
    pub timezone: Tz,
    pub store_backend: StoreBackend,
    /// Directory holding players.json / last_atbats.json (STORE_BACKEND=json)
    pub data_dir: String,
    /// SQLite file (STORE_BACKEND=sqlite)
    pub db_path: String,
    /// Chat webhook. None → notifications are only logged.
    pub webhook_url: Option<String>,
    pub marker_policy: MarkerPolicy,
    pub daily_schedule: bool,
    pub api_bind: String,
    pub api_port: u16,
    /// Required in `x-admin-token` for roster mutations when set.
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let timezone_name =
            std::env::var("TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name.parse::<Tz>().map_err(|_| {
            AppError::Config(format!("TIMEZONE {timezone_name:?} is not a valid IANA zone"))
        })?;

        Ok(Self {
            api_url: std::env::var("MLB_API_URL").unwrap_or_else(|_| MLB_API_URL.to_string()),
            feed_api_url: std::env::var("MLB_FEED_API_URL")
                .unwrap_or_else(|_| MLB_FEED_API_URL.to_string()),
            sport_id: std::env::var("SPORT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(SPORT_ID),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            poll_interval: Duration::from_secs(secs_var("POLL_INTERVAL_SECS", POLL_INTERVAL_SECS)),
            http_timeout: Duration::from_secs(secs_var("HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)),
            player_timeout: Duration::from_secs(secs_var(
                "PLAYER_TIMEOUT_SECS",
                PLAYER_TIMEOUT_SECS,
            )),
            timezone,
            store_backend: std::env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "json".to_string())
                .parse()?,
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "tracker.db".to_string()),
            webhook_url: non_empty_var("WEBHOOK_URL"),
            marker_policy: std::env::var("MARKER_POLICY")
                .unwrap_or_else(|_| "after_delivery".to_string())
                .parse()?,
            daily_schedule: std::env::var("DAILY_SCHEDULE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            api_bind: std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            admin_token: non_empty_var("ADMIN_TOKEN"),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: MLB_API_URL.to_string(),
            feed_api_url: MLB_FEED_API_URL.to_string(),
            sport_id: SPORT_ID,
            log_level: "info".to_string(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            player_timeout: Duration::from_secs(PLAYER_TIMEOUT_SECS),
            timezone: chrono_tz::America::New_York,
            store_backend: StoreBackend::Json,
            data_dir: ".".to_string(),
            db_path: "tracker.db".to_string(),
            webhook_url: None,
            marker_policy: MarkerPolicy::AfterDelivery,
            daily_schedule: true,
            api_bind: "127.0.0.1".to_string(),
            api_port: 3000,
            admin_token: None,
        }
    }
}

fn secs_var(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
