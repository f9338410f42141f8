use crate::accuracy::{
    history_for_teams, recent_misses, recent_rounds_summary, season_summary, tier_summary,
};
use crate::record::{ActualResult, PredictionRecord, Tier};

pub const MAX_TREND_ROUNDS: usize = 5;
pub const MAX_TEAM_HISTORY: usize = 5;
pub const MAX_RECENT_MISSES: usize = 4;

/// A fixture the predictor is about to tip; drives which team histories are
/// surfaced in the feedback block.
#[derive(Debug, Clone)]
pub struct UpcomingFixture {
    pub round_id: u32,
    pub home_team: String,
    pub away_team: String,
}

/// Renders the accuracy feedback block injected into the next prediction
/// request. Output is bounded (fixed caps per section) and deterministic for
/// a given ledger snapshot and fixture list. Undefined statistics are
/// omitted, never printed as 0%.
pub fn render_feedback(records: &[PredictionRecord], upcoming: &[UpcomingFixture]) -> String {
    let season = season_summary(records);
    if season.total == 0 {
        return "No prediction history yet - this is the first round of the season.".to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push("TIPPING ACCURACY THIS SEASON:".to_string());
    if let Some(pct) = season.accuracy_pct {
        lines.push(format!(
            "  Overall: {}/{} ({pct:.1}% correct)",
            season.correct_count, season.total
        ));
    }
    for (label, tier) in [
        ("Favourite picks", Tier::Favourite),
        ("Underdog picks", Tier::Underdog),
    ] {
        let summary = tier_summary(records, tier);
        if let Some(pct) = summary.accuracy_pct {
            lines.push(format!(
                "  {label}: {}/{} ({pct:.1}%)",
                summary.correct_count, summary.total
            ));
        }
    }

    let trend = recent_rounds_summary(records, MAX_TREND_ROUNDS);
    if !trend.is_empty() {
        let parts: Vec<String> = trend
            .iter()
            .map(|r| format!("Rd {}: {}/{}", r.round_id, r.correct_count, r.total))
            .collect();
        lines.push(format!("  Recent rounds: {}", parts.join(", ")));
    }

    for fixture in upcoming {
        let history =
            history_for_teams(records, &fixture.home_team, &fixture.away_team, MAX_TEAM_HISTORY);
        if history.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!(
            "PAST TIPS INVOLVING {} OR {}:",
            fixture.home_team.to_uppercase(),
            fixture.away_team.to_uppercase()
        ));
        for record in history {
            lines.push(format!("  {}", history_line(record)));
        }
    }

    let misses = recent_misses(records, MAX_RECENT_MISSES);
    if !misses.is_empty() {
        lines.push(String::new());
        lines.push("RECENT INCORRECT TIPS (recalibrate against these):".to_string());
        for record in misses {
            lines.push(format!("  {}", miss_line(record)));
        }
    }

    lines.join("\n")
}

fn history_line(record: &PredictionRecord) -> String {
    let verdict = if record.correct == Some(true) {
        "CORRECT"
    } else {
        "WRONG"
    };
    format!(
        "Rd {}: {} vs {} - tipped {} ({:.0}% confidence) - {} (actual: {})",
        record.round_id,
        record.home_team,
        record.away_team,
        record.predicted_winner,
        record.confidence_pct,
        verdict,
        actual_label(record),
    )
}

fn miss_line(record: &PredictionRecord) -> String {
    match &record.actual_result {
        Some(ActualResult::Draw) => format!(
            "Rd {}: {} vs {} - tipped {}, match drawn",
            record.round_id, record.home_team, record.away_team, record.predicted_winner
        ),
        Some(ActualResult::Team(winner)) => match record.actual_margin {
            Some(margin) => format!(
                "Rd {}: tipped {}, {} won by {} pts",
                record.round_id, record.predicted_winner, winner, margin
            ),
            None => format!(
                "Rd {}: tipped {}, {} won",
                record.round_id, record.predicted_winner, winner
            ),
        },
        _ => format!(
            "Rd {}: tipped {}, result unresolved",
            record.round_id, record.predicted_winner
        ),
    }
}

fn actual_label(record: &PredictionRecord) -> &str {
    record
        .actual_result
        .as_ref()
        .map(|r| r.label())
        .unwrap_or("unresolved")
}
