use std::fmt::Write;

use crate::monitor::models::RoundRecord;

pub const TEST_MESSAGE: &str = "🧪 Test notification from OINP Monitor";

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// One-line summary used as the webhook `message` field.
pub fn headline(rounds: &[RoundRecord]) -> String {
    let n = rounds.len();
    format!(
        "🚨 New OINP Round{} Open! {n} invitation round{} detected.",
        plural(n),
        plural(n)
    )
}

/// Full plain-text alert: the headline followed by one block per round.
pub fn round_summary(rounds: &[RoundRecord]) -> String {
    let mut out = headline(rounds);
    for round in rounds {
        // Writing into a String cannot fail.
        let _ = write!(out, "\n\n• {} ({})", round.category, round.date);
        let _ = write!(out, "\n  Invitations: {}", round.invitation_count);
        if let Some(score) = round.min_score {
            let _ = write!(out, "\n  Minimum score: {score}");
        }
        if !round.streams.is_empty() {
            let _ = write!(out, "\n  Streams: {}", round.streams.join(", "));
        }
    }
    out
}
