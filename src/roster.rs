//! Roster administration: name search, disambiguation, add and remove.

use serde::Serialize;
use tracing::info;

use crate::error::{AppError, Result};
use crate::gateway::StatsGateway;
use crate::store::TrackerStore;
use crate::types::TrackedPlayer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "players", rename_all = "snake_case")]
pub enum AddOutcome {
    Added(TrackedPlayer),
    AlreadyTracked(TrackedPlayer),
    /// Several players matched and no selection was given.
    Ambiguous(Vec<TrackedPlayer>),
}

impl AddOutcome {
    pub fn message(&self) -> String {
        match self {
            AddOutcome::Added(p) => format!("Now tracking {} ({})", p.name, p.team),
            AddOutcome::AlreadyTracked(p) => format!("{} is already being tracked", p.name),
            AddOutcome::Ambiguous(candidates) => {
                let mut msg = String::from("Multiple players found:\n");
                for (i, p) in candidates.iter().enumerate() {
                    msg.push_str(&format!(
                        "{}. {} (#{}) - {} {}\n",
                        i + 1,
                        p.name,
                        p.jersey_label(),
                        p.team,
                        p.position
                    ));
                }
                msg.push_str("Repeat the request with the number of the player you want.");
                msg
            }
        }
    }
}

pub async fn search_candidates(gateway: &dyn StatsGateway, name: &str) -> Result<Vec<TrackedPlayer>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidSelection("Player name must not be empty".to_string()));
    }
    Ok(gateway.search_players(name).await?)
}

/// Add the 1-based `index`-th candidate.
pub async fn confirm_candidate(
    store: &dyn TrackerStore,
    candidates: &[TrackedPlayer],
    index: usize,
) -> Result<AddOutcome> {
    let chosen = index
        .checked_sub(1)
        .and_then(|i| candidates.get(i))
        .ok_or_else(|| {
            AppError::InvalidSelection(format!(
                "Invalid selection {index}: choose a number between 1 and {}",
                candidates.len()
            ))
        })?
        .clone();

    if store.add_player(chosen.clone()).await? {
        info!(player_id = chosen.id, team = %chosen.team, "Tracking {}", chosen.name);
        Ok(AddOutcome::Added(chosen))
    } else {
        Ok(AddOutcome::AlreadyTracked(chosen))
    }
}

pub async fn add_by_name(
    gateway: &dyn StatsGateway,
    store: &dyn TrackerStore,
    name: &str,
    index: Option<usize>,
) -> Result<AddOutcome> {
    let candidates = search_candidates(gateway, name).await?;
    match (candidates.len(), index) {
        (0, _) => Err(AppError::NotFound(format!(
            "Could not find any players matching: {}",
            name.trim()
        ))),
        (1, None) => confirm_candidate(store, &candidates, 1).await,
        (_, None) => Ok(AddOutcome::Ambiguous(candidates)),
        (_, Some(i)) => confirm_candidate(store, &candidates, i).await,
    }
}

/// Drop every tracked player whose name contains `fragment`, ignoring case.
/// Returns the removed players.
pub async fn remove_by_name(store: &dyn TrackerStore, fragment: &str) -> Result<Vec<TrackedPlayer>> {
    let needle = fragment.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::InvalidSelection("Player name must not be empty".to_string()));
    }

    let mut removed = Vec::new();
    for player in store.roster().await? {
        if player.name.to_lowercase().contains(&needle) && store.remove_player(player.id).await? {
            info!(player_id = player.id, "Stopped tracking {}", player.name);
            removed.push(player);
        }
    }

    if removed.is_empty() {
        return Err(AppError::NotFound(format!(
            "No tracked players matching: {}",
            fragment.trim()
        )));
    }
    Ok(removed)
}

pub async fn list(store: &dyn TrackerStore) -> Result<Vec<TrackedPlayer>> {
    store.roster().await
}
