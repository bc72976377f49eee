use chrono::Utc;

use super::{Field, Message, Sentiment};
use crate::types::{
    AtBatEvent, GameBattingLine, GameSnapshot, ScheduleEntry, ScheduleStatus, TrackedPlayer,
};

fn field(name: &str, value: String, inline: bool) -> Field {
    Field { name: name.to_string(), value, inline }
}

pub fn at_bat(player: &TrackedPlayer, event: &AtBatEvent, game: &GameSnapshot) -> Message {
    let sentiment = if event.play.was_hit { Sentiment::Positive } else { Sentiment::Negative };

    let mut context = format!(
        "**{} @ {}** | Score: {}-{} | {}",
        game.away_team, game.home_team, game.away_score, game.home_score, event.play.inning_label,
    );
    if event.play.risp {
        context.push_str(" | 🔶 **RISP**");
    }

    Message {
        title: format!("⚾ {} - At Bat", player.name),
        sentiment,
        description: Some(event.play.description.clone()),
        fields: vec![
            field("Result", format!("**{}**", event.play.event_type), false),
            field("Season Slash Line", event.season.slash_line(), false),
            field("Game Context", context, false),
        ],
        footer: player.team.clone(),
        timestamp: Utc::now(),
    }
}

pub fn game_summary(player: &TrackedPlayer, game: &GameSnapshot, line: &GameBattingLine) -> Message {
    let mut fields = vec![field("Final Line", format!("{}-for-{}", line.hits, line.at_bats), true)];
    if line.rbi > 0 {
        fields.push(field("RBI", line.rbi.to_string(), true));
    }
    if line.runs > 0 {
        fields.push(field("Runs", line.runs.to_string(), true));
    }
    fields.push(field(
        "Game Result",
        format!(
            "**{} {}, {} {}**",
            game.away_team, game.away_score, game.home_team, game.home_score
        ),
        false,
    ));

    Message {
        title: format!("📊 Game Complete - {}", player.name),
        sentiment: Sentiment::Info,
        description: None,
        fields,
        footer: player.team.clone(),
        timestamp: Utc::now(),
    }
}

pub fn daily_schedule(entries: &[ScheduleEntry]) -> Message {
    let lines: Vec<String> = entries
        .iter()
        .map(|e| match &e.status {
            ScheduleStatus::Game(g) => format!(
                "**{}**: {} @ {} - {}",
                e.player.name, g.away_team, g.home_team, g.scheduled_time
            ),
            ScheduleStatus::NoGame => format!("**{}**: No game scheduled", e.player.name),
            ScheduleStatus::Unavailable => format!("**{}**: Error fetching schedule", e.player.name),
        })
        .collect();

    Message {
        title: "📅 Today's Games".to_string(),
        sentiment: Sentiment::Highlight,
        description: Some(lines.join("\n")),
        fields: Vec::new(),
        footer: format!("Tracking {} player(s)", entries.len()),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{game, home_run, player, strikeout};

    #[test]
    fn hit_renders_positive_with_slash_line() {
        let p = player(660271, "Shohei Ohtani");
        let g = game(745001, false);
        let msg = at_bat(&p, &home_run(745001, 12), &g);

        assert_eq!(msg.title, "⚾ Shohei Ohtani - At Bat");
        assert_eq!(msg.sentiment, Sentiment::Positive);
        assert_eq!(msg.field("Result"), Some("**Home Run**"));
        assert_eq!(msg.field("Season Slash Line"), Some(".275 / .350 / .600"));
        assert_eq!(msg.footer, p.team);
    }

    #[test]
    fn out_renders_negative_and_flags_risp() {
        let mut event = strikeout(745001, 4);
        event.play.risp = true;
        let msg = at_bat(&player(1, "A"), &event, &game(745001, false));

        assert_eq!(msg.sentiment, Sentiment::Negative);
        let context = msg.field("Game Context").unwrap();
        assert!(context.starts_with("**New York Mets @ Los Angeles Dodgers** | Score: 2-5 | "));
        assert!(context.ends_with("RISP**"));
    }

    #[test]
    fn summary_omits_zero_rbi_and_runs() {
        let g = game(745001, true);
        let msg = game_summary(&player(1, "A"), &g, &GameBattingLine { hits: 0, at_bats: 3, rbi: 0, runs: 0 });
        assert_eq!(msg.field("Final Line"), Some("0-for-3"));
        assert!(msg.field("RBI").is_none());
        assert!(msg.field("Runs").is_none());
        assert_eq!(msg.field("Game Result"), Some("**New York Mets 2, Los Angeles Dodgers 5**"));

        let msg = game_summary(&player(1, "A"), &g, &GameBattingLine { hits: 2, at_bats: 4, rbi: 3, runs: 1 });
        assert_eq!(msg.field("RBI"), Some("3"));
        assert_eq!(msg.field("Runs"), Some("1"));
    }

    #[test]
    fn schedule_lists_every_player() {
        let entries = vec![
            ScheduleEntry { player: player(1, "A"), status: ScheduleStatus::Game(game(9, false)) },
            ScheduleEntry { player: player(2, "B"), status: ScheduleStatus::NoGame },
            ScheduleEntry { player: player(3, "C"), status: ScheduleStatus::Unavailable },
        ];
        let msg = daily_schedule(&entries);
        let body = msg.description.unwrap();
        assert_eq!(body.lines().count(), 3);
        assert!(body.contains("**A**: New York Mets @ Los Angeles Dodgers - 07:10 PM ET"));
        assert!(body.contains("**B**: No game scheduled"));
        assert!(body.contains("**C**: Error fetching schedule"));
        assert_eq!(msg.footer, "Tracking 3 player(s)");
    }
}
