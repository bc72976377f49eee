//! JSON files in a data directory:
//!
//! - `players.json`: roster, an array in insertion order
//! - `last_atbats.json`: `{"<player id>": marker}`
//! - `game_summaries.json`: `{"<player id>": game_pk}`
//!
//! A missing file reads as empty. Writes go to a `.tmp` sibling, are synced,
//! then renamed over the target so a crash leaves either the old or the new
//! file, never a partial one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{LastSeen, TrackerStore};
use crate::error::Result;
use crate::types::TrackedPlayer;

pub const ROSTER_FILE: &str = "players.json";
pub const MARKERS_FILE: &str = "last_atbats.json";
pub const SUMMARIES_FILE: &str = "game_summaries.json";

pub struct JsonFileStore {
    roster_path: PathBuf,
    markers_path: PathBuf,
    summaries_path: PathBuf,
    /// Serializes read-modify-write cycles on the files.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            roster_path: dir.join(ROSTER_FILE),
            markers_path: dir.join(MARKERS_FILE),
            summaries_path: dir.join(SUMMARIES_FILE),
            write_lock: Mutex::new(()),
        }
    }

    /// Callers hold `write_lock`.
    async fn is_tracked(&self, player_id: i64) -> Result<bool> {
        let roster: Vec<TrackedPlayer> = read_json(&self.roster_path).await?;
        Ok(roster.iter().any(|p| p.id == player_id))
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(&body).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, path).await?;
    debug!(path = %path.display(), bytes = body.len(), "wrote store file");
    Ok(())
}

#[async_trait]
impl TrackerStore for JsonFileStore {
    async fn roster(&self) -> Result<Vec<TrackedPlayer>> {
        read_json(&self.roster_path).await
    }

    async fn add_player(&self, player: TrackedPlayer) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut roster: Vec<TrackedPlayer> = read_json(&self.roster_path).await?;
        if roster.iter().any(|p| p.id == player.id) {
            return Ok(false);
        }
        roster.push(player);
        write_json_atomic(&self.roster_path, &roster).await?;
        Ok(true)
    }

    async fn remove_player(&self, player_id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = player_id.to_string();

        let mut roster: Vec<TrackedPlayer> = read_json(&self.roster_path).await?;
        let before = roster.len();
        roster.retain(|p| p.id != player_id);
        let removed = roster.len() != before;
        if removed {
            write_json_atomic(&self.roster_path, &roster).await?;
        }

        let mut markers: BTreeMap<String, LastSeen> = read_json(&self.markers_path).await?;
        if markers.remove(&key).is_some() {
            write_json_atomic(&self.markers_path, &markers).await?;
        }

        let mut summaries: BTreeMap<String, i64> = read_json(&self.summaries_path).await?;
        if summaries.remove(&key).is_some() {
            write_json_atomic(&self.summaries_path, &summaries).await?;
        }

        Ok(removed)
    }

    async fn last_seen(&self, player_id: i64) -> Result<Option<LastSeen>> {
        let markers: BTreeMap<String, LastSeen> = read_json(&self.markers_path).await?;
        Ok(markers.get(&player_id.to_string()).copied())
    }

    async fn set_last_seen(&self, player_id: i64, marker: LastSeen) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.is_tracked(player_id).await? {
            return Ok(());
        }
        let mut markers: BTreeMap<String, LastSeen> = read_json(&self.markers_path).await?;
        markers.insert(player_id.to_string(), marker);
        write_json_atomic(&self.markers_path, &markers).await
    }

    async fn summarized_game(&self, player_id: i64) -> Result<Option<i64>> {
        let summaries: BTreeMap<String, i64> = read_json(&self.summaries_path).await?;
        Ok(summaries.get(&player_id.to_string()).copied())
    }

    async fn set_summarized_game(&self, player_id: i64, game_pk: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.is_tracked(player_id).await? {
            return Ok(());
        }
        let mut summaries: BTreeMap<String, i64> = read_json(&self.summaries_path).await?;
        summaries.insert(player_id.to_string(), game_pk);
        write_json_atomic(&self.summaries_path, &summaries).await
    }
}
