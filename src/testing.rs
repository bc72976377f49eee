//! Fixtures and fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GatewayError, NotifyError};
use crate::gateway::{Lookup, StatsGateway};
use crate::notifier::{render, Message, Notifier};
use crate::types::{
    AtBatEvent, GameBattingLine, GameSnapshot, InningHalf, PlateAppearance, ScheduleEntry,
    SeasonStats, TrackedPlayer,
};

pub fn player(id: i64, name: &str) -> TrackedPlayer {
    TrackedPlayer {
        id,
        name: name.to_string(),
        jersey_number: Some("17".to_string()),
        team: "Los Angeles Dodgers".to_string(),
        team_id: Some(119),
        position: "DH".to_string(),
    }
}

pub fn game(game_pk: i64, is_complete: bool) -> GameSnapshot {
    GameSnapshot {
        game_pk,
        away_team: "New York Mets".to_string(),
        home_team: "Los Angeles Dodgers".to_string(),
        away_score: 2,
        home_score: 5,
        inning: 6,
        inning_half: InningHalf::Bottom,
        scheduled_time: "07:10 PM ET".to_string(),
        is_complete,
    }
}

pub fn season() -> SeasonStats {
    SeasonStats {
        avg: ".275".to_string(),
        obp: ".350".to_string(),
        slg: ".600".to_string(),
        hits: 120,
        at_bats: 436,
        rbi: 88,
        runs: 97,
        home_runs: 41,
    }
}

pub fn appearance(at_bat_index: i64, event_type: &str, was_hit: bool) -> PlateAppearance {
    PlateAppearance {
        at_bat_index,
        event_type: event_type.to_string(),
        description: format!("{event_type} on a 2-1 count."),
        was_hit,
        risp: false,
        inning_label: "Bottom 6".to_string(),
    }
}

pub fn home_run(game_pk: i64, at_bat_index: i64) -> AtBatEvent {
    AtBatEvent { game_pk, play: appearance(at_bat_index, "Home Run", true), season: season() }
}

pub fn strikeout(game_pk: i64, at_bat_index: i64) -> AtBatEvent {
    AtBatEvent { game_pk, play: appearance(at_bat_index, "Strikeout", false), season: season() }
}

// ---------------------------------------------------------------------------
// ScriptedGateway
// ---------------------------------------------------------------------------

/// Canned answer for one lookup.
#[derive(Debug, Clone)]
pub enum Script<T> {
    Found(T),
    Missing,
    /// Upstream failure (surfaces as HTTP 503)
    Fail,
}

impl<T: Clone> Script<T> {
    fn resolve(script: Option<&Script<T>>, what: &str) -> Lookup<T> {
        match script {
            Some(Script::Found(v)) => Ok(Some(v.clone())),
            Some(Script::Missing) | None => Ok(None),
            Some(Script::Fail) => Err(GatewayError::Status { url: format!("fake://{what}"), status: 503 }),
        }
    }
}

/// Gateway answering from per-player scripts. Unscripted lookups find nothing;
/// unscripted season stats return [`season`].
#[derive(Default)]
pub struct ScriptedGateway {
    search: Mutex<Vec<TrackedPlayer>>,
    games: Mutex<HashMap<i64, Script<GameSnapshot>>>,
    at_bats: Mutex<HashMap<i64, Script<PlateAppearance>>>,
    seasons: Mutex<HashMap<i64, Script<SeasonStats>>>,
    lines: Mutex<HashMap<i64, Script<GameBattingLine>>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&self, players: Vec<TrackedPlayer>) {
        *self.search.lock().unwrap() = players;
    }

    pub fn set_game(&self, player_id: i64, script: Script<GameSnapshot>) {
        self.games.lock().unwrap().insert(player_id, script);
    }

    pub fn set_at_bat(&self, player_id: i64, script: Script<PlateAppearance>) {
        self.at_bats.lock().unwrap().insert(player_id, script);
    }

    pub fn set_season(&self, player_id: i64, script: Script<SeasonStats>) {
        self.seasons.lock().unwrap().insert(player_id, script);
    }

    pub fn set_line(&self, player_id: i64, script: Script<GameBattingLine>) {
        self.lines.lock().unwrap().insert(player_id, script);
    }

    /// Total number of gateway calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatsGateway for ScriptedGateway {
    async fn search_players(&self, name: &str) -> Result<Vec<TrackedPlayer>, GatewayError> {
        self.count();
        let needle = name.to_lowercase();
        Ok(self
            .search
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn current_game(&self, player_id: i64) -> Lookup<GameSnapshot> {
        self.count();
        Script::resolve(self.games.lock().unwrap().get(&player_id), "schedule")
    }

    async fn latest_at_bat(&self, player_id: i64, _game: &GameSnapshot) -> Lookup<PlateAppearance> {
        self.count();
        Script::resolve(self.at_bats.lock().unwrap().get(&player_id), "feed/live")
    }

    async fn season_stats(&self, player_id: i64) -> Result<SeasonStats, GatewayError> {
        self.count();
        match self.seasons.lock().unwrap().get(&player_id) {
            None => Ok(season()),
            Some(script) => Script::resolve(Some(script), "stats")
                .map(|s| s.unwrap_or_else(SeasonStats::placeholder)),
        }
    }

    async fn game_batting_line(&self, player_id: i64, _game_pk: i64) -> Lookup<GameBattingLine> {
        self.count();
        Script::resolve(self.lines.lock().unwrap().get(&player_id), "boxscore")
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Posted {
    AtBat { player_id: i64, event_id: i64, message: Message },
    Summary { player_id: i64, game_pk: i64, line: GameBattingLine },
    Schedule { entries: usize },
}

/// Records successful posts. While failing, every post errors and nothing is
/// recorded.
#[derive(Default)]
pub struct RecordingNotifier {
    posted: Mutex<Vec<Posted>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }

    pub fn at_bats(&self) -> Vec<(i64, i64)> {
        self.posted()
            .into_iter()
            .filter_map(|p| match p {
                Posted::AtBat { player_id, event_id, .. } => Some((player_id, event_id)),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<(i64, i64)> {
        self.posted()
            .into_iter()
            .filter_map(|p| match p {
                Posted::Summary { player_id, game_pk, .. } => Some((player_id, game_pk)),
                _ => None,
            })
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, posted: Posted) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Status(503));
        }
        self.posted.lock().unwrap().push(posted);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, _message: Message) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn post_at_bat(
        &self,
        player: &TrackedPlayer,
        event: &AtBatEvent,
        game: &GameSnapshot,
    ) -> Result<(), NotifyError> {
        self.record(Posted::AtBat {
            player_id: player.id,
            event_id: event.event_id(),
            message: render::at_bat(player, event, game),
        })
    }

    async fn post_game_summary(
        &self,
        player: &TrackedPlayer,
        game: &GameSnapshot,
        line: &GameBattingLine,
    ) -> Result<(), NotifyError> {
        self.record(Posted::Summary { player_id: player.id, game_pk: game.game_pk, line: *line })
    }

    async fn post_daily_schedule(&self, entries: &[ScheduleEntry]) -> Result<(), NotifyError> {
        self.record(Posted::Schedule { entries: entries.len() })
    }
}
