use crate::config::{EMPTY_RATE, HIT_EVENTS, SCORING_BASES};

/// Hit vs. out, for coloring only. Every completed at-bat is notified either way.
pub fn is_hit(event_type: &str) -> bool {
    HIT_EVENTS.contains(&event_type)
}

/// True if any runner movement in the play started on second or third.
pub fn runner_in_scoring_position<'a, I>(start_bases: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    start_bases
        .into_iter()
        .flatten()
        .any(|base| SCORING_BASES.contains(&base))
}

/// "top", 3 → "Top 3"
pub fn inning_label(half: &str, inning: u32) -> String {
    let mut chars = half.chars();
    let half: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => "Top".to_string(),
    };
    format!("{half} {inning}")
}

/// Drops a single leading zero from a rate string: "0.275" → ".275".
/// Already-bare and >= 1 values pass through, as does a lone "0". Blank input
/// renders as ".000".
pub fn format_rate(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" || raw.starts_with("-.") {
        return EMPTY_RATE.to_string();
    }
    match raw.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => raw.to_string(),
    }
}
