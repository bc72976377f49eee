use serde::{Deserialize, Serialize};

use crate::config::EMPTY_RATE;

// ---------------------------------------------------------------------------
// Tracked player
// ---------------------------------------------------------------------------

/// A roster entry. Field names on the wire match players.json as written by
/// earlier versions of the bot, so existing rosters load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPlayer {
    pub id: i64,
    pub name: String,
    #[serde(rename = "primaryNumber", default)]
    pub jersey_number: Option<String>,
    pub team: String,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default = "unknown_position")]
    pub position: String,
}

fn unknown_position() -> String {
    "N/A".to_string()
}

impl TrackedPlayer {
    pub fn jersey_label(&self) -> &str {
        self.jersey_number.as_deref().unwrap_or("N/A")
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InningHalf {
    Top,
    Bottom,
}

impl std::fmt::Display for InningHalf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InningHalf::Top => write!(f, "Top"),
            InningHalf::Bottom => write!(f, "Bottom"),
        }
    }
}

/// A game as seen at fetch time. Never persisted; only `game_pk` is stable
/// across polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub game_pk: i64,
    pub away_team: String,
    pub home_team: String,
    pub away_score: u32,
    pub home_score: u32,
    pub inning: u32,
    pub inning_half: InningHalf,
    /// Start time rendered in the game-day zone, or "TBD".
    pub scheduled_time: String,
    pub is_complete: bool,
}

// ---------------------------------------------------------------------------
// At-bats
// ---------------------------------------------------------------------------

/// A completed plate appearance pulled from the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateAppearance {
    /// Zero-based play index within the game. Unique per game only.
    pub at_bat_index: i64,
    pub event_type: String,
    pub description: String,
    pub was_hit: bool,
    pub risp: bool,
    /// e.g. "Bottom 7"
    pub inning_label: String,
}

/// A plate appearance that has not been notified yet, with the season line
/// fetched at detection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtBatEvent {
    pub game_pk: i64,
    pub play: PlateAppearance,
    pub season: SeasonStats,
}

impl AtBatEvent {
    pub fn event_id(&self) -> i64 {
        self.play.at_bat_index
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Season hitting line. Rates are display strings without a leading zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonStats {
    pub avg: String,
    pub obp: String,
    pub slg: String,
    pub hits: u32,
    pub at_bats: u32,
    pub rbi: u32,
    pub runs: u32,
    pub home_runs: u32,
}

impl SeasonStats {
    /// Stand-in used before a player's first game of the season.
    pub fn placeholder() -> Self {
        Self {
            avg: EMPTY_RATE.to_string(),
            obp: EMPTY_RATE.to_string(),
            slg: EMPTY_RATE.to_string(),
            hits: 0,
            at_bats: 0,
            rbi: 0,
            runs: 0,
            home_runs: 0,
        }
    }

    pub fn slash_line(&self) -> String {
        format!("{} / {} / {}", self.avg, self.obp, self.slg)
    }
}

/// A player's line for a single game, from the boxscore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameBattingLine {
    pub hits: u32,
    pub at_bats: u32,
    pub rbi: u32,
    pub runs: u32,
}

// ---------------------------------------------------------------------------
// Daily schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ScheduleStatus {
    Game(GameSnapshot),
    NoGame,
    /// The lookup failed; shown as an error line rather than dropped.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub player: TrackedPlayer,
    pub status: ScheduleStatus,
}
