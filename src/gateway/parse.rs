//! Stats API JSON → domain records.
//!
//! Everything here is pure so upstream schema churn is contained (and tested)
//! in one place. Missing fields degrade to defaults; only structurally
//! unusable records (no id, no gamePk) are dropped.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::detector::classifier::{format_rate, inning_label, is_hit, runner_in_scoring_position};
use crate::types::{
    GameBattingLine, GameSnapshot, InningHalf, PlateAppearance, SeasonStats, TrackedPlayer,
};

/// Detailed state the schedule reports for a finished game.
pub const FINAL_STATE: &str = "Final";

/// Parse a `people` entry. Returns None without an id or name.
pub fn player(v: &Value) -> Option<TrackedPlayer> {
    let id = v.get("id")?.as_i64()?;
    let name = v.get("fullName")?.as_str()?.to_string();
    let team = v.get("currentTeam");

    Some(TrackedPlayer {
        id,
        name,
        jersey_number: v
            .get("primaryNumber")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string()),
        team: team
            .and_then(|t| t.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        team_id: team.and_then(|t| t.get("id")).and_then(|i| i.as_i64()),
        position: v
            .get("primaryPosition")
            .and_then(|p| p.get("abbreviation"))
            .and_then(|a| a.as_str())
            .unwrap_or("N/A")
            .to_string(),
    })
}

/// All players in a season roster response whose full name contains `name`
/// (case-insensitive), in upstream order.
pub fn matching_players(v: &Value, name: &str) -> Vec<TrackedPlayer> {
    let needle = name.trim().to_lowercase();
    v.get("people")
        .and_then(|p| p.as_array())
        .map(|people| {
            people
                .iter()
                .filter(|p| {
                    p.get("fullName")
                        .and_then(|n| n.as_str())
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
                })
                .filter_map(player)
                .collect()
        })
        .unwrap_or_default()
}

/// `currentTeam.id` from a `/people/{id}` response.
pub fn current_team_id(v: &Value) -> Option<i64> {
    v.get("people")?
        .as_array()?
        .first()?
        .get("currentTeam")?
        .get("id")?
        .as_i64()
}

/// First game on the first date of a schedule response. A doubleheader's
/// second game is not considered.
pub fn first_scheduled_game(v: &Value, tz: Tz) -> Option<GameSnapshot> {
    let game = v
        .get("dates")?
        .as_array()?
        .first()?
        .get("games")?
        .as_array()?
        .first()?;
    game_snapshot(game, tz)
}

pub fn game_snapshot(game: &Value, tz: Tz) -> Option<GameSnapshot> {
    let game_pk = game.get("gamePk")?.as_i64()?;
    let teams = game.get("teams");
    let linescore = game.get("linescore");

    let team_name = |side: &str| {
        teams
            .and_then(|t| t.get(side))
            .and_then(|s| s.get("team"))
            .and_then(|t| t.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("")
            .to_string()
    };
    let runs = |side: &str| {
        linescore
            .and_then(|l| l.get("teams"))
            .and_then(|t| t.get(side))
            .and_then(|s| s.get("runs"))
            .and_then(|r| r.as_u64())
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or(0)
    };

    Some(GameSnapshot {
        game_pk,
        away_team: team_name("away"),
        home_team: team_name("home"),
        away_score: runs("away"),
        home_score: runs("home"),
        inning: linescore
            .and_then(|l| l.get("currentInning"))
            .and_then(|i| i.as_u64())
            .and_then(|i| u32::try_from(i).ok())
            .unwrap_or(1),
        inning_half: inning_half(
            linescore
                .and_then(|l| l.get("inningState"))
                .and_then(|s| s.as_str())
                .unwrap_or(""),
        ),
        scheduled_time: game
            .get("gameDate")
            .and_then(|d| d.as_str())
            .map(|d| format_game_time(d, tz))
            .unwrap_or_else(|| "TBD".to_string()),
        is_complete: game
            .get("status")
            .and_then(|s| s.get("detailedState"))
            .and_then(|s| s.as_str())
            == Some(FINAL_STATE),
    })
}

/// `Top`/`Middle` → top half, `Bottom`/`End` → bottom half.
pub fn inning_half(state: &str) -> InningHalf {
    match state.to_lowercase().as_str() {
        "bottom" | "end" => InningHalf::Bottom,
        _ => InningHalf::Top,
    }
}

/// RFC 3339 UTC start time → "07:10 PM ET" in the game-day zone.
pub fn format_game_time(iso: &str, tz: Tz) -> String {
    match iso.parse::<DateTime<Utc>>() {
        Ok(dt) => {
            let local = dt.with_timezone(&tz);
            format!("{} {}", local.format("%I:%M %p"), zone_label(&local))
        }
        Err(_) => "TBD".to_string(),
    }
}

fn zone_label(local: &DateTime<Tz>) -> String {
    if local.timezone() == chrono_tz::America::New_York {
        "ET".to_string()
    } else {
        local.format("%Z").to_string()
    }
}

/// The last completed plate appearance by `player_id` in a live feed, by feed
/// order. Plays without both a result event and description are still in
/// progress and skipped.
pub fn latest_plate_appearance(feed: &Value, player_id: i64) -> Option<PlateAppearance> {
    let plays = feed
        .get("liveData")?
        .get("plays")?
        .get("allPlays")?
        .as_array()?;

    plays
        .iter()
        .enumerate()
        .filter(|(_, play)| batter_id(play) == Some(player_id))
        .filter_map(|(position, play)| plate_appearance(play, position))
        .last()
}

fn batter_id(play: &Value) -> Option<i64> {
    play.get("matchup")?.get("batter")?.get("id")?.as_i64()
}

/// `position` is the play's index in `allPlays`, used when `atBatIndex` is absent.
pub fn plate_appearance(play: &Value, position: usize) -> Option<PlateAppearance> {
    let result = play.get("result")?;
    let event_type = result.get("event")?.as_str().filter(|s| !s.is_empty())?;
    let description = result.get("description")?.as_str().filter(|s| !s.is_empty())?;

    let about = play.get("about");
    let half = about
        .and_then(|a| a.get("halfInning"))
        .and_then(|h| h.as_str())
        .unwrap_or("top");
    let inning = about
        .and_then(|a| a.get("inning"))
        .and_then(|i| i.as_u64())
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(1);

    let starts = play
        .get("runners")
        .and_then(|r| r.as_array())
        .map(|runners| {
            runners
                .iter()
                .map(|r| {
                    r.get("movement")
                        .and_then(|m| m.get("start"))
                        .and_then(|s| s.as_str())
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(PlateAppearance {
        at_bat_index: play
            .get("atBatIndex")
            .and_then(|i| i.as_i64())
            .unwrap_or(position as i64),
        event_type: event_type.to_string(),
        description: description.to_string(),
        was_hit: is_hit(event_type),
        risp: runner_in_scoring_position(starts),
        inning_label: inning_label(half, inning),
    })
}

/// Season hitting line from `/people/{id}/stats`. No split yet → placeholder.
pub fn season_stats(v: &Value) -> SeasonStats {
    let stat = v
        .get("stats")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .and_then(|s| s.get("splits"))
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .and_then(|s| s.get("stat"));

    let Some(stat) = stat else {
        return SeasonStats::placeholder();
    };

    let rate = |key: &str| format_rate(stat.get(key).and_then(|r| r.as_str()).unwrap_or(""));

    SeasonStats {
        avg: rate("avg"),
        obp: rate("obp"),
        slg: rate("slg"),
        hits: count(stat, "hits"),
        at_bats: count(stat, "atBats"),
        rbi: count(stat, "rbi"),
        runs: count(stat, "runs"),
        home_runs: count(stat, "homeRuns"),
    }
}

/// A player's batting line from a boxscore, searching away then home.
pub fn batting_line(boxscore: &Value, player_id: i64) -> Option<GameBattingLine> {
    let teams = boxscore.get("teams")?;

    ["away", "home"]
        .iter()
        .filter_map(|side| teams.get(*side)?.get("players")?.as_object())
        .flat_map(|players| players.values())
        .find(|p| {
            p.get("person")
                .and_then(|person| person.get("id"))
                .and_then(|id| id.as_i64())
                == Some(player_id)
        })
        .map(|p| {
            let batting = p.get("stats").and_then(|s| s.get("batting"));
            match batting {
                Some(b) => GameBattingLine {
                    hits: count(b, "hits"),
                    at_bats: count(b, "atBats"),
                    rbi: count(b, "rbi"),
                    runs: count(b, "runs"),
                },
                None => GameBattingLine::default(),
            }
        })
}

fn count(v: &Value, key: &str) -> u32 {
    v.get(key)
        .and_then(|n| n.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
