use crate::error::Result;
use crate::ledger::Ledger;
use crate::record::ActualResult;

/// Final-score report for one fixture from the results provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReport {
    pub finished: bool,
    pub home_score: i64,
    pub away_score: i64,
}

/// Authoritative results source, queried per fixture. `Ok(None)` means the
/// provider does not know the fixture; an `Err` aborts the current round's
/// remaining reconciliation work.
pub trait ResultsProvider {
    fn final_score(
        &self,
        round_id: u32,
        home_team: &str,
        away_team: &str,
    ) -> Result<Option<ScoreReport>>;
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileSummary {
    pub round_id: u32,
    pub resolved: usize,
    pub pending: usize,
    /// One human-readable line per fixture settled in this call.
    pub lines: Vec<String>,
}

/// Closes the loop between a round's predictions and reality. Each record is
/// committed independently, so a provider failure mid-round leaves earlier
/// marks standing and the call safe to retry. A fully resolved round is a
/// no-op.
pub fn reconcile_round(
    ledger: &Ledger,
    provider: &dyn ResultsProvider,
    round_id: u32,
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary {
        round_id,
        ..ReconcileSummary::default()
    };

    for record in ledger.unresolved_records_for_round(round_id)? {
        let report = provider.final_score(round_id, &record.home_team, &record.away_team)?;
        let Some(report) = report else {
            summary.pending += 1;
            continue;
        };
        if !report.finished {
            summary.pending += 1;
            continue;
        }

        let result = if report.home_score > report.away_score {
            ActualResult::Team(record.home_team.clone())
        } else if report.home_score < report.away_score {
            ActualResult::Team(record.away_team.clone())
        } else {
            ActualResult::Draw
        };
        let margin = (report.home_score - report.away_score).abs();

        let updated =
            ledger.mark_result_with_margin(&record.match_key, result, Some(margin), false)?;
        summary.resolved += 1;
        summary.lines.push(format!(
            "{} {} vs {}: tipped {}, actual {}",
            if updated.correct == Some(true) {
                "[CORRECT]"
            } else {
                "[WRONG]  "
            },
            updated.home_team,
            updated.away_team,
            updated.predicted_winner,
            updated
                .actual_result
                .as_ref()
                .map(|r| r.label().to_string())
                .unwrap_or_else(|| "unresolved".to_string()),
        ));
    }

    Ok(summary)
}
