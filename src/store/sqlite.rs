use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use super::{LastSeen, TrackerStore};
use crate::error::Result;
use crate::types::TrackedPlayer;

#[derive(Debug, sqlx::FromRow)]
struct PlayerRow {
    id: i64,
    name: String,
    jersey_number: Option<String>,
    team: String,
    team_id: Option<i64>,
    position: String,
}

impl From<PlayerRow> for TrackedPlayer {
    fn from(r: PlayerRow) -> Self {
        TrackedPlayer {
            id: r.id,
            name: r.name,
            jersey_number: r.jersey_number,
            team: r.team,
            team_id: r.team_id,
            position: r.position,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MarkerRow {
    game_pk: Option<i64>,
    at_bat_index: i64,
}

/// Roster and markers in SQLite. Each marker write is a single-row upsert.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self::from_pool(pool).await?;
        info!("Database ready at {db_path}");
        Ok(store)
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

#[async_trait]
impl TrackerStore for SqliteStore {
    async fn roster(&self) -> Result<Vec<TrackedPlayer>> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            r#"
            SELECT id, name, jersey_number, team, team_id, position
            FROM players
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TrackedPlayer::from).collect())
    }

    async fn add_player(&self, player: TrackedPlayer) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO players (id, name, jersey_number, team, team_id, position, seq)
            SELECT ?, ?, ?, ?, ?, ?, COALESCE(MAX(seq), 0) + 1 FROM players
            "#,
        )
        .bind(player.id)
        .bind(&player.name)
        .bind(&player.jersey_number)
        .bind(&player.team)
        .bind(player.team_id)
        .bind(&player.position)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_player(&self, player_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM players WHERE id = ?")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM markers WHERE player_id = ?")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM game_summaries WHERE player_id = ?")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn last_seen(&self, player_id: i64) -> Result<Option<LastSeen>> {
        let row = sqlx::query_as::<_, MarkerRow>(
            "SELECT game_pk, at_bat_index FROM markers WHERE player_id = ?",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LastSeen { game_pk: r.game_pk, at_bat_index: r.at_bat_index }))
    }

    async fn set_last_seen(&self, player_id: i64, marker: LastSeen) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO markers (player_id, game_pk, at_bat_index, updated_at)
            SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM players WHERE id = ?)
            ON CONFLICT(player_id) DO UPDATE SET
                game_pk = excluded.game_pk,
                at_bat_index = excluded.at_bat_index,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(player_id)
        .bind(marker.game_pk)
        .bind(marker.at_bat_index)
        .bind(now_ns())
        .bind(player_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn summarized_game(&self, player_id: i64) -> Result<Option<i64>> {
        let game_pk = sqlx::query_scalar::<_, i64>(
            "SELECT game_pk FROM game_summaries WHERE player_id = ?",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(game_pk)
    }

    async fn set_summarized_game(&self, player_id: i64, game_pk: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO game_summaries (player_id, game_pk, updated_at)
            SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM players WHERE id = ?)
            ON CONFLICT(player_id) DO UPDATE SET
                game_pk = excluded.game_pk,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(player_id)
        .bind(game_pk)
        .bind(now_ns())
        .bind(player_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
