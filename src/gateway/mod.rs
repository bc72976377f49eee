pub mod parse;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::types::{GameBattingLine, GameSnapshot, PlateAppearance, SeasonStats, TrackedPlayer};

/// `Ok(Some)` = data, `Ok(None)` = legitimately nothing there, `Err` = the
/// upstream call itself failed.
pub type Lookup<T> = std::result::Result<Option<T>, GatewayError>;

/// Typed reads against the stats API. No caching: every call hits upstream.
#[async_trait]
pub trait StatsGateway: Send + Sync {
    /// Every current-season player whose name contains `name`.
    async fn search_players(&self, name: &str) -> std::result::Result<Vec<TrackedPlayer>, GatewayError>;

    /// Today's game for the player's current team, if any.
    async fn current_game(&self, player_id: i64) -> Lookup<GameSnapshot>;

    /// Last completed plate appearance by the player in `game`.
    async fn latest_at_bat(&self, player_id: i64, game: &GameSnapshot) -> Lookup<PlateAppearance>;

    /// Season hitting line; a placeholder when the player has no split yet.
    async fn season_stats(&self, player_id: i64) -> std::result::Result<SeasonStats, GatewayError>;

    /// The player's boxscore line for one game.
    async fn game_batting_line(&self, player_id: i64, game_pk: i64) -> Lookup<GameBattingLine>;
}

/// Stats API client over reqwest. Each request is bounded by the configured
/// timeout so a hung call cannot stall a poll cycle.
pub struct MlbStatsClient {
    client: reqwest::Client,
    api_url: String,
    feed_api_url: String,
    sport_id: u32,
    timezone: Tz,
}

impl MlbStatsClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .user_agent(concat!("atbat-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            feed_api_url: cfg.feed_api_url.trim_end_matches('/').to_string(),
            sport_id: cfg.sport_id,
            timezone: cfg.timezone,
        })
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<Value, GatewayError> {
        debug!(url, "GET stats API");
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { url: url.to_string(), source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status { url: url.to_string(), status: status.as_u16() });
        }

        resp.json::<Value>().await.map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl StatsGateway for MlbStatsClient {
    async fn search_players(&self, name: &str) -> std::result::Result<Vec<TrackedPlayer>, GatewayError> {
        let url = format!("{}/sports/{}/players", self.api_url, self.sport_id);
        let query = [
            ("season", self.today().year().to_string()),
            ("gameType", "R".to_string()),
        ];
        let resp = self.get_json(&url, &query).await?;
        Ok(parse::matching_players(&resp, name))
    }

    async fn current_game(&self, player_id: i64) -> Lookup<GameSnapshot> {
        let url = format!("{}/people/{player_id}", self.api_url);
        let person = self.get_json(&url, &[]).await?;
        let Some(team_id) = parse::current_team_id(&person) else {
            return Ok(None);
        };

        let url = format!("{}/schedule", self.api_url);
        let query = [
            ("teamId", team_id.to_string()),
            ("date", self.today().format("%Y-%m-%d").to_string()),
            ("sportId", self.sport_id.to_string()),
            ("hydrate", "linescore,team".to_string()),
        ];
        let schedule = self.get_json(&url, &query).await?;
        Ok(parse::first_scheduled_game(&schedule, self.timezone))
    }

    async fn latest_at_bat(&self, player_id: i64, game: &GameSnapshot) -> Lookup<PlateAppearance> {
        let url = format!("{}/game/{}/feed/live", self.feed_api_url, game.game_pk);
        let feed = self.get_json(&url, &[]).await?;
        Ok(parse::latest_plate_appearance(&feed, player_id))
    }

    async fn season_stats(&self, player_id: i64) -> std::result::Result<SeasonStats, GatewayError> {
        let url = format!("{}/people/{player_id}/stats", self.api_url);
        let query = [
            ("stats", "season".to_string()),
            ("season", self.today().year().to_string()),
            ("group", "hitting".to_string()),
        ];
        let resp = self.get_json(&url, &query).await?;
        Ok(parse::season_stats(&resp))
    }

    async fn game_batting_line(&self, player_id: i64, game_pk: i64) -> Lookup<GameBattingLine> {
        let url = format!("{}/game/{game_pk}/boxscore", self.api_url);
        let boxscore = self.get_json(&url, &[]).await?;
        Ok(parse::batting_line(&boxscore, player_id))
    }
}
