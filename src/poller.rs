use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::health::HealthState;
use crate::config::{Config, MarkerPolicy};
use crate::detector::{detect, Detection};
use crate::error::{NotifyError, Result};
use crate::gateway::StatsGateway;
use crate::notifier::Notifier;
use crate::store::{LastSeen, TrackerStore};
use crate::types::{GameBattingLine, GameSnapshot, ScheduleEntry, ScheduleStatus, TrackedPlayer};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Cap on one roster entry's processing.
    pub player_timeout: Duration,
    pub marker_policy: MarkerPolicy,
    pub daily_schedule: bool,
    pub timezone: Tz,
}

impl From<&Config> for PollSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.poll_interval,
            player_timeout: cfg.player_timeout,
            marker_policy: cfg.marker_policy,
            daily_schedule: cfg.daily_schedule,
            timezone: cfg.timezone,
        }
    }
}

/// Tally of one pass over the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub players: usize,
    pub at_bats_posted: usize,
    pub summaries_posted: usize,
    pub schedules_posted: usize,
    pub delivery_failures: usize,
    /// Roster entries that errored or timed out (plus a failed roster load).
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was already running.
    Skipped,
}

#[derive(Debug, Default)]
struct PlayerOutcome {
    at_bats_posted: usize,
    summaries_posted: usize,
    delivery_failures: usize,
}

/// Returns the health state to IDLE however the cycle ends, including when
/// the cycle future is dropped mid-roster.
struct CycleGuard<'a> {
    health: &'a HealthState,
    report: Option<CycleReport>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.health.finish_cycle(Utc::now(), self.report.take());
    }
}

/// Drives at-bat detection over the whole roster on a fixed interval.
///
/// Ticks only produce cycles; a tick that lands while a cycle is still
/// running is skipped. Within a cycle players are processed one at a time and
/// a failure for one player never stops the rest. Each player's marker is
/// written immediately after their notification, so an abandoned cycle keeps
/// all progress made before it stopped.
pub struct Poller {
    gateway: Arc<dyn StatsGateway>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn TrackerStore>,
    health: Arc<HealthState>,
    settings: PollSettings,
    /// Game day the daily schedule was last posted for.
    schedule_posted_for: Mutex<Option<NaiveDate>>,
}

impl Poller {
    pub fn new(
        gateway: Arc<dyn StatsGateway>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn TrackerStore>,
        health: Arc<HealthState>,
        settings: PollSettings,
    ) -> Self {
        Self {
            gateway,
            notifier,
            store,
            health,
            settings,
            schedule_posted_for: Mutex::new(None),
        }
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = self.settings.interval.as_secs(),
            "Poller started: checking roster every {}s",
            self.settings.interval.as_secs()
        );

        loop {
            ticker.tick().await;
            self.trigger();
        }
    }

    /// Start a cycle in the background. False if one is already running.
    pub fn trigger(self: &Arc<Self>) -> bool {
        if self.health.is_running() {
            debug!("Poll tick skipped: previous cycle still running");
            return false;
        }
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            poller.run_cycle().await;
        });
        true
    }

    /// One IDLE → RUNNING → IDLE pass over the roster.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if !self.health.try_start_cycle(Utc::now()) {
            debug!("Poll cycle skipped: previous cycle still running");
            return CycleOutcome::Skipped;
        }
        let mut guard = CycleGuard { health: &self.health, report: None };

        let report = self.poll_roster().await;
        guard.report = Some(report.clone());
        drop(guard);

        CycleOutcome::Completed(report)
    }

    async fn poll_roster(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let roster = match self.store.roster().await {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to load roster: {e}");
                report.failures += 1;
                return report;
            }
        };
        if roster.is_empty() {
            debug!("Roster empty, nothing to poll");
            return report;
        }
        report.players = roster.len();

        if self.settings.daily_schedule {
            self.post_daily_schedule_once(&roster, &mut report).await;
        }

        for player in &roster {
            match timeout(self.settings.player_timeout, self.process_player(player)).await {
                Ok(Ok(outcome)) => {
                    report.at_bats_posted += outcome.at_bats_posted;
                    report.summaries_posted += outcome.summaries_posted;
                    report.delivery_failures += outcome.delivery_failures;
                }
                Ok(Err(e)) => {
                    warn!(player_id = player.id, "Error checking {}: {e}", player.name);
                    report.failures += 1;
                }
                Err(_) => {
                    warn!(
                        player_id = player.id,
                        "Checking {} timed out after {}s",
                        player.name,
                        self.settings.player_timeout.as_secs()
                    );
                    report.failures += 1;
                }
            }
        }

        if report.at_bats_posted + report.summaries_posted + report.failures + report.delivery_failures > 0 {
            info!(
                players = report.players,
                at_bats = report.at_bats_posted,
                summaries = report.summaries_posted,
                delivery_failures = report.delivery_failures,
                failures = report.failures,
                "Poll cycle complete: {} at-bat(s), {} summary(ies) posted, {} failure(s)",
                report.at_bats_posted,
                report.summaries_posted,
                report.failures + report.delivery_failures,
            );
        } else {
            debug!(players = report.players, "Poll cycle complete: nothing new");
        }

        report
    }

    async fn process_player(&self, player: &TrackedPlayer) -> Result<PlayerOutcome> {
        let mut outcome = PlayerOutcome::default();
        let last_seen = self.store.last_seen(player.id).await?;
        let detection = detect(self.gateway.as_ref(), player, last_seen.as_ref()).await?;

        if let Detection::New { game, event } = &detection {
            info!(
                player_id = player.id,
                game_pk = game.game_pk,
                at_bat_index = event.event_id(),
                result = %event.play.event_type,
                "New at-bat for {}: {}",
                player.name,
                event.play.event_type,
            );

            let sent = self.check_delivery(
                "at-bat",
                player,
                self.notifier.post_at_bat(player, event, game).await,
                &mut outcome,
            );
            if sent {
                outcome.at_bats_posted += 1;
            }
            if sent || self.settings.marker_policy == MarkerPolicy::Always {
                self.store
                    .set_last_seen(player.id, LastSeen::new(game.game_pk, event.event_id()))
                    .await?;
            } else {
                // Retried next cycle; hold the summary back so it follows the at-bat.
                return Ok(outcome);
            }
        }

        if let Some(game) = detection.batted_in().filter(|g| g.is_complete) {
            self.post_summary_once(player, game, &mut outcome).await?;
        }

        Ok(outcome)
    }

    async fn post_summary_once(
        &self,
        player: &TrackedPlayer,
        game: &GameSnapshot,
        outcome: &mut PlayerOutcome,
    ) -> Result<()> {
        if self.store.summarized_game(player.id).await? == Some(game.game_pk) {
            return Ok(());
        }

        let line = match self.gateway.game_batting_line(player.id, game.game_pk).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(player_id = player.id, game_pk = game.game_pk, "No boxscore line, summarizing as zeros");
                GameBattingLine::default()
            }
            Err(e) => {
                warn!(
                    player_id = player.id,
                    game_pk = game.game_pk,
                    "Boxscore unavailable for {}, summarizing as zeros: {e}",
                    player.name
                );
                GameBattingLine::default()
            }
        };

        let sent = self.check_delivery(
            "game summary",
            player,
            self.notifier.post_game_summary(player, game, &line).await,
            outcome,
        );
        if sent {
            outcome.summaries_posted += 1;
            info!(player_id = player.id, game_pk = game.game_pk, "Game summary posted for {}", player.name);
        }
        if sent || self.settings.marker_policy == MarkerPolicy::Always {
            self.store.set_summarized_game(player.id, game.game_pk).await?;
        }
        Ok(())
    }

    async fn post_daily_schedule_once(&self, roster: &[TrackedPlayer], report: &mut CycleReport) {
        let today = Utc::now().with_timezone(&self.settings.timezone).date_naive();
        let mut posted_for = self.schedule_posted_for.lock().await;
        if *posted_for == Some(today) {
            return;
        }

        let mut entries = Vec::with_capacity(roster.len());
        for player in roster {
            let status = match self.gateway.current_game(player.id).await {
                Ok(Some(game)) => ScheduleStatus::Game(game),
                Ok(None) => ScheduleStatus::NoGame,
                Err(e) => {
                    warn!(player_id = player.id, "Error getting schedule for {}: {e}", player.name);
                    ScheduleStatus::Unavailable
                }
            };
            entries.push(ScheduleEntry { player: player.clone(), status });
        }

        match self.notifier.post_daily_schedule(&entries).await {
            Ok(()) => {
                info!(date = %today, players = entries.len(), "Daily schedule posted");
                report.schedules_posted += 1;
                *posted_for = Some(today);
            }
            Err(e) => {
                warn!(date = %today, "Failed to post daily schedule: {e}");
                report.delivery_failures += 1;
                if self.settings.marker_policy == MarkerPolicy::Always {
                    *posted_for = Some(today);
                }
            }
        }
    }

    fn check_delivery(
        &self,
        what: &str,
        player: &TrackedPlayer,
        result: std::result::Result<(), NotifyError>,
        outcome: &mut PlayerOutcome,
    ) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(player_id = player.id, "Failed to post {what} for {}: {e}", player.name);
                outcome.delivery_failures += 1;
                false
            }
        }
    }
}
