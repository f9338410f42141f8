use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::{PredictionRecord, Tier};

/// Correct/total tally over a set of resolved predictions. `accuracy_pct` is
/// absent when nothing has resolved yet; it is never fabricated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TallySummary {
    pub total: usize,
    pub correct_count: usize,
    pub accuracy_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundTally {
    pub round_id: u32,
    pub correct_count: usize,
    pub total: usize,
}

pub fn season_summary(records: &[PredictionRecord]) -> TallySummary {
    tally(records.iter())
}

pub fn tier_summary(records: &[PredictionRecord], tier: Tier) -> TallySummary {
    tally(records.iter().filter(|r| r.tier == tier))
}

/// Per-round tallies for the last `n` rounds carrying at least one resolved
/// record, ordered oldest to newest.
pub fn recent_rounds_summary(records: &[PredictionRecord], n: usize) -> Vec<RoundTally> {
    let mut rounds: BTreeMap<u32, RoundTally> = BTreeMap::new();
    for record in records {
        let Some(correct) = record.correct else {
            continue;
        };
        let entry = rounds.entry(record.round_id).or_insert(RoundTally {
            round_id: record.round_id,
            correct_count: 0,
            total: 0,
        });
        entry.total += 1;
        if correct {
            entry.correct_count += 1;
        }
    }
    let all: Vec<RoundTally> = rounds.into_values().collect();
    let skip = all.len().saturating_sub(n);
    all.into_iter().skip(skip).collect()
}

/// Resolved records involving either team, newest first, capped at `limit`.
/// Ordering is by round then insertion order, both descending, so output is
/// stable for a given ledger state.
pub fn history_for_teams<'a>(
    records: &'a [PredictionRecord],
    team_a: &str,
    team_b: &str,
    limit: usize,
) -> Vec<&'a PredictionRecord> {
    let mut hits: Vec<(usize, &PredictionRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_resolved())
        .filter(|(_, r)| r.involves(team_a) || r.involves(team_b))
        .collect();
    hits.sort_by(|a, b| (b.1.round_id, b.0).cmp(&(a.1.round_id, a.0)));
    hits.into_iter().take(limit).map(|(_, r)| r).collect()
}

/// Incorrect tips, newest first, capped at `limit`.
pub fn recent_misses(records: &[PredictionRecord], limit: usize) -> Vec<&PredictionRecord> {
    let mut hits: Vec<(usize, &PredictionRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.correct == Some(false))
        .collect();
    hits.sort_by(|a, b| (b.1.round_id, b.0).cmp(&(a.1.round_id, a.0)));
    hits.into_iter().take(limit).map(|(_, r)| r).collect()
}

fn tally<'a>(records: impl Iterator<Item = &'a PredictionRecord>) -> TallySummary {
    let mut total = 0usize;
    let mut correct_count = 0usize;
    for record in records {
        let Some(correct) = record.correct else {
            continue;
        };
        total += 1;
        if correct {
            correct_count += 1;
        }
    }
    let accuracy_pct = if total > 0 {
        Some(100.0 * correct_count as f64 / total as f64)
    } else {
        None
    };
    TallySummary {
        total,
        correct_count,
        accuracy_pct,
    }
}
