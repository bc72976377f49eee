use tracing::warn;

use crate::error::GatewayError;
use crate::gateway::StatsGateway;
use crate::store::LastSeen;
use crate::types::{AtBatEvent, GameSnapshot, SeasonStats, TrackedPlayer};

/// What one poll found for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// No team, or no game scheduled today.
    NoGame,
    /// Game found, but the player has no completed plate appearance yet.
    NoAtBat(GameSnapshot),
    /// Latest plate appearance is the one already notified.
    AlreadySeen(GameSnapshot),
    New { game: GameSnapshot, event: AtBatEvent },
}

impl Detection {
    /// The game, when the player has batted in it.
    pub fn batted_in(&self) -> Option<&GameSnapshot> {
        match self {
            Detection::AlreadySeen(game) | Detection::New { game, .. } => Some(game),
            Detection::NoGame | Detection::NoAtBat(_) => None,
        }
    }
}

/// Resolve today's game and latest completed at-bat for `player` and compare
/// against their marker. Season stats are fetched only for a new event; if
/// that fetch fails the event still goes out with a placeholder line.
///
/// Reads upstream only. Updating the marker is the caller's job.
pub async fn detect(
    gateway: &dyn StatsGateway,
    player: &TrackedPlayer,
    last_seen: Option<&LastSeen>,
) -> Result<Detection, GatewayError> {
    let Some(game) = gateway.current_game(player.id).await? else {
        return Ok(Detection::NoGame);
    };

    let Some(play) = gateway.latest_at_bat(player.id, &game).await? else {
        return Ok(Detection::NoAtBat(game));
    };

    if last_seen.is_some_and(|m| m.covers(game.game_pk, play.at_bat_index)) {
        return Ok(Detection::AlreadySeen(game));
    }

    let season = match gateway.season_stats(player.id).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!(
                player_id = player.id,
                "Season stats unavailable for {}, using placeholder: {e}", player.name
            );
            SeasonStats::placeholder()
        }
    };

    let event = AtBatEvent { game_pk: game.game_pk, play, season };
    Ok(Detection::New { game, event })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{appearance, game, player, season, Script, ScriptedGateway};

    const OHTANI: i64 = 660271;

    fn gateway_with_game() -> ScriptedGateway {
        let gw = ScriptedGateway::new();
        gw.set_game(OHTANI, Script::Found(game(745001, false)));
        gw
    }

    #[tokio::test]
    async fn no_game_stops_before_feed_lookup() {
        let gw = ScriptedGateway::new();
        let d = detect(&gw, &player(OHTANI, "Shohei Ohtani"), None).await.unwrap();
        assert_eq!(d, Detection::NoGame);
        assert_eq!(gw.calls(), 1);
    }

    #[tokio::test]
    async fn game_without_plate_appearance() {
        let gw = gateway_with_game();
        let d = detect(&gw, &player(OHTANI, "Shohei Ohtani"), None).await.unwrap();
        assert_eq!(d, Detection::NoAtBat(game(745001, false)));
        assert!(d.batted_in().is_none());
    }

    #[tokio::test]
    async fn first_at_bat_without_marker_is_new() {
        let gw = gateway_with_game();
        gw.set_at_bat(OHTANI, Script::Found(appearance(12, "Home Run", true)));

        match detect(&gw, &player(OHTANI, "Shohei Ohtani"), None).await.unwrap() {
            Detection::New { game, event } => {
                assert_eq!(game.game_pk, 745001);
                assert_eq!(event.event_id(), 12);
                assert!(event.play.was_hit);
                assert_eq!(event.season, season());
            }
            other => panic!("expected new event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn marker_on_same_at_bat_is_already_seen() {
        let gw = gateway_with_game();
        gw.set_at_bat(OHTANI, Script::Found(appearance(12, "Home Run", true)));
        let marker = LastSeen::new(745001, 12);

        let d = detect(&gw, &player(OHTANI, "Shohei Ohtani"), Some(&marker)).await.unwrap();
        assert!(matches!(d, Detection::AlreadySeen(_)));
        // schedule + feed only; no season stats for a repeat
        assert_eq!(gw.calls(), 2);
    }

    #[tokio::test]
    async fn same_index_from_yesterdays_game_is_new() {
        let gw = gateway_with_game();
        gw.set_at_bat(OHTANI, Script::Found(appearance(12, "Walk", false)));
        let marker = LastSeen::new(744990, 12);

        let d = detect(&gw, &player(OHTANI, "Shohei Ohtani"), Some(&marker)).await.unwrap();
        assert!(matches!(d, Detection::New { .. }));
    }

    #[tokio::test]
    async fn feed_failure_is_an_error() {
        let gw = gateway_with_game();
        gw.set_at_bat(OHTANI, Script::Fail);
        assert!(detect(&gw, &player(OHTANI, "Shohei Ohtani"), None).await.is_err());
    }

    #[tokio::test]
    async fn season_failure_falls_back_to_placeholder() {
        let gw = gateway_with_game();
        gw.set_at_bat(OHTANI, Script::Found(appearance(3, "Single", true)));
        gw.set_season(OHTANI, Script::Fail);

        match detect(&gw, &player(OHTANI, "Shohei Ohtani"), None).await.unwrap() {
            Detection::New { event, .. } => assert_eq!(event.season, SeasonStats::placeholder()),
            other => panic!("expected new event, got {other:?}"),
        }
    }
}
