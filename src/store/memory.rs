use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{LastSeen, TrackerStore};
use crate::error::{AppError, Result};
use crate::types::TrackedPlayer;

/// Process-local store. Used by tests and by `STORE_BACKEND=memory` dry runs;
/// nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    /// Insertion-ordered roster
    roster: Mutex<Vec<TrackedPlayer>>,
    /// player_id → last notified at-bat
    markers: DashMap<i64, LastSeen>,
    /// player_id → game_pk of the last posted summary
    summaries: DashMap<i64, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(players: Vec<TrackedPlayer>) -> Self {
        Self { roster: Mutex::new(players), ..Self::default() }
    }

    fn lock_roster(&self) -> Result<std::sync::MutexGuard<'_, Vec<TrackedPlayer>>> {
        self.roster
            .lock()
            .map_err(|_| AppError::Store("roster lock poisoned".to_string()))
    }
}

#[async_trait]
impl TrackerStore for MemoryStore {
    async fn roster(&self) -> Result<Vec<TrackedPlayer>> {
        Ok(self.lock_roster()?.clone())
    }

    async fn add_player(&self, player: TrackedPlayer) -> Result<bool> {
        let mut roster = self.lock_roster()?;
        if roster.iter().any(|p| p.id == player.id) {
            return Ok(false);
        }
        roster.push(player);
        Ok(true)
    }

    async fn remove_player(&self, player_id: i64) -> Result<bool> {
        let mut roster = self.lock_roster()?;
        let before = roster.len();
        roster.retain(|p| p.id != player_id);
        self.markers.remove(&player_id);
        self.summaries.remove(&player_id);
        Ok(roster.len() != before)
    }

    async fn last_seen(&self, player_id: i64) -> Result<Option<LastSeen>> {
        Ok(self.markers.get(&player_id).map(|m| *m))
    }

    async fn set_last_seen(&self, player_id: i64, marker: LastSeen) -> Result<()> {
        // roster lock held so a concurrent remove cannot interleave
        let roster = self.lock_roster()?;
        if roster.iter().any(|p| p.id == player_id) {
            self.markers.insert(player_id, marker);
        }
        Ok(())
    }

    async fn summarized_game(&self, player_id: i64) -> Result<Option<i64>> {
        Ok(self.summaries.get(&player_id).map(|g| *g))
    }

    async fn set_summarized_game(&self, player_id: i64, game_pk: i64) -> Result<()> {
        let roster = self.lock_roster()?;
        if roster.iter().any(|p| p.id == player_id) {
            self.summaries.insert(player_id, game_pk);
        }
        Ok(())
    }
}
