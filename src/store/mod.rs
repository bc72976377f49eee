pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::TrackedPlayer;

/// Last notified at-bat for one player.
///
/// At-bat indices restart every game, so the game is kept alongside the
/// index. Markers written as a bare index (older marker files) carry no game
/// and compare on the index alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredMarker")]
pub struct LastSeen {
    pub game_pk: Option<i64>,
    pub at_bat_index: i64,
}

impl LastSeen {
    pub fn new(game_pk: i64, at_bat_index: i64) -> Self {
        Self { game_pk: Some(game_pk), at_bat_index }
    }

    /// True if this marker already covers the given at-bat.
    pub fn covers(&self, game_pk: i64, at_bat_index: i64) -> bool {
        self.at_bat_index == at_bat_index && self.game_pk.map_or(true, |g| g == game_pk)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMarker {
    Index(i64),
    Full { game_pk: Option<i64>, at_bat_index: i64 },
}

impl From<StoredMarker> for LastSeen {
    fn from(raw: StoredMarker) -> Self {
        match raw {
            StoredMarker::Index(at_bat_index) => LastSeen { game_pk: None, at_bat_index },
            StoredMarker::Full { game_pk, at_bat_index } => LastSeen { game_pk, at_bat_index },
        }
    }
}

/// Durable roster and per-player marker state.
///
/// Every marker read and write is keyed by a single player id; nothing here
/// touches more than one player's marker at a time. An absent backing store
/// reads as an empty roster with no markers.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Roster in insertion order.
    async fn roster(&self) -> Result<Vec<TrackedPlayer>>;

    /// Appends a player. Returns false (and changes nothing) if the id is
    /// already tracked.
    async fn add_player(&self, player: TrackedPlayer) -> Result<bool>;

    /// Removes a player together with their marker and summary record.
    async fn remove_player(&self, player_id: i64) -> Result<bool>;

    async fn last_seen(&self, player_id: i64) -> Result<Option<LastSeen>>;

    /// No-op for a player no longer on the roster, so a cycle racing a
    /// removal cannot leave a marker behind.
    async fn set_last_seen(&self, player_id: i64, marker: LastSeen) -> Result<()>;

    /// Game the player's most recent summary was posted for.
    async fn summarized_game(&self, player_id: i64) -> Result<Option<i64>>;

    /// No-op for a player no longer on the roster.
    async fn set_summarized_game(&self, player_id: i64, game_pk: i64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_reads_bare_index_and_full_form() {
        let legacy: LastSeen = serde_json::from_str("12").unwrap();
        assert_eq!(legacy, LastSeen { game_pk: None, at_bat_index: 12 });

        let full: LastSeen =
            serde_json::from_str(r#"{"game_pk": 745001, "at_bat_index": 12}"#).unwrap();
        assert_eq!(full, LastSeen::new(745001, 12));
    }

    #[test]
    fn same_index_in_a_new_game_is_not_covered() {
        let marker = LastSeen::new(745001, 12);
        assert!(marker.covers(745001, 12));
        assert!(!marker.covers(745001, 13));
        assert!(!marker.covers(745099, 12));
    }

    #[test]
    fn legacy_marker_compares_on_index_only() {
        let marker = LastSeen { game_pk: None, at_bat_index: 12 };
        assert!(marker.covers(1, 12));
        assert!(!marker.covers(1, 11));
    }
}
