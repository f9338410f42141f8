use std::collections::HashMap;

use afl_tipster::record::match_key;
use afl_tipster::{
    ActualResult, Ledger, NewPrediction, ResultsProvider, ScoreReport, Tier, TipsterError,
    accuracy, reconcile_round,
};

struct StubProvider {
    scores: HashMap<String, ScoreReport>,
    fail_for: Option<String>,
}

impl StubProvider {
    fn new() -> StubProvider {
        StubProvider {
            scores: HashMap::new(),
            fail_for: None,
        }
    }

    fn with_score(
        mut self,
        round_id: u32,
        home: &str,
        away: &str,
        home_score: i64,
        away_score: i64,
    ) -> Self {
        self.scores.insert(
            match_key(round_id, home, away),
            ScoreReport {
                finished: true,
                home_score,
                away_score,
            },
        );
        self
    }

    fn with_unfinished(mut self, round_id: u32, home: &str, away: &str) -> Self {
        self.scores.insert(
            match_key(round_id, home, away),
            ScoreReport {
                finished: false,
                home_score: 0,
                away_score: 0,
            },
        );
        self
    }

    fn failing_for(mut self, round_id: u32, home: &str, away: &str) -> Self {
        self.fail_for = Some(match_key(round_id, home, away));
        self
    }
}

impl ResultsProvider for StubProvider {
    fn final_score(
        &self,
        round_id: u32,
        home_team: &str,
        away_team: &str,
    ) -> afl_tipster::Result<Option<ScoreReport>> {
        let key = match_key(round_id, home_team, away_team);
        if self.fail_for.as_deref() == Some(key.as_str()) {
            return Err(TipsterError::ProviderUnavailable(
                "stub outage".to_string(),
            ));
        }
        Ok(self.scores.get(&key).copied())
    }
}

fn tip(
    round_id: u32,
    home: &str,
    away: &str,
    winner: &str,
    favourite: &str,
    conf: f64,
) -> NewPrediction {
    NewPrediction {
        round_id,
        home_team: home.to_string(),
        away_team: away.to_string(),
        predicted_winner: winner.to_string(),
        confidence_pct: conf,
        market_favourite: favourite.to_string(),
        venue: None,
        scheduled_at: None,
    }
}

const ROUND_9: &[(&str, &str)] = &[
    ("Carlton", "Richmond"),
    ("Collingwood", "Essendon"),
    ("Geelong", "Sydney"),
    ("Hawthorn", "Fremantle"),
    ("Melbourne", "Brisbane"),
    ("Adelaide", "Port Adelaide"),
    ("West Coast", "Gold Coast"),
    ("St Kilda", "North Melbourne"),
    ("Bulldogs", "GWS"),
];

#[test]
fn full_round_reconciles_and_aggregates() {
    let ledger = Ledger::open_in_memory().expect("open ledger");

    // Tip every home side; two are underdog picks against the market.
    for (i, (home, away)) in ROUND_9.iter().enumerate() {
        let favourite = if i < 7 { home } else { away };
        let conf = 50.0 + i as f64 * 5.0;
        ledger
            .append_or_replace(&tip(9, home, away, home, favourite, conf.min(100.0)))
            .expect("append");
    }

    // Home side wins the even games, away the odd ones, one draw at index 4.
    let mut provider = StubProvider::new();
    for (i, (home, away)) in ROUND_9.iter().enumerate() {
        provider = if i == 4 {
            provider.with_score(9, home, away, 77, 77)
        } else if i % 2 == 0 {
            provider.with_score(9, home, away, 95, 60)
        } else {
            provider.with_score(9, home, away, 55, 80)
        };
    }

    let summary = reconcile_round(&ledger, &provider, 9).expect("reconcile");
    assert_eq!(summary.resolved, 9);
    assert_eq!(summary.pending, 0);

    let records = ledger.all_records().expect("history");
    assert!(records.iter().all(|r| r.correct.is_some()));

    // Home tips land for indices 0,2,6,8; the draw at 4 is a miss.
    let expected_correct = 4;
    let season = accuracy::season_summary(&records);
    assert_eq!(season.total, 9);
    assert_eq!(season.correct_count, expected_correct);
    let pct = season.accuracy_pct.expect("defined accuracy");
    assert!((pct - 100.0 * expected_correct as f64 / 9.0).abs() < 1e-9);

    let fav = accuracy::tier_summary(&records, Tier::Favourite);
    let dog = accuracy::tier_summary(&records, Tier::Underdog);
    assert_eq!(fav.total + dog.total, 9);
    assert_eq!(dog.total, 2);

    let trend = accuracy::recent_rounds_summary(&records, 1);
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].round_id, 9);
    assert_eq!(trend[0].total, 9);
    assert_eq!(trend[0].correct_count, expected_correct);

    // The drawn fixture resolved without error and is never correct.
    let (home, away) = ROUND_9[4];
    let drawn = ledger
        .record(&match_key(9, home, away))
        .expect("query")
        .expect("stored");
    assert_eq!(drawn.actual_result, Some(ActualResult::Draw));
    assert_eq!(drawn.correct, Some(false));
    assert_eq!(drawn.actual_margin, Some(0));
}

#[test]
fn reconcile_is_idempotent_and_skips_unfinished_games() {
    let ledger = Ledger::open_in_memory().expect("open ledger");
    ledger
        .append_or_replace(&tip(3, "Carlton", "Richmond", "Carlton", "Carlton", 64.0))
        .expect("append");
    ledger
        .append_or_replace(&tip(3, "Geelong", "Sydney", "Sydney", "Geelong", 51.0))
        .expect("append");

    let provider = StubProvider::new()
        .with_score(3, "Carlton", "Richmond", 90, 70)
        .with_unfinished(3, "Geelong", "Sydney");

    let first = reconcile_round(&ledger, &provider, 3).expect("first pass");
    assert_eq!(first.resolved, 1);
    assert_eq!(first.pending, 1);

    let snapshot = ledger.all_records().expect("history");
    let second = reconcile_round(&ledger, &provider, 3).expect("second pass");
    assert_eq!(second.resolved, 0);
    assert_eq!(second.pending, 1);
    assert_eq!(ledger.all_records().expect("history"), snapshot);
}

#[test]
fn provider_outage_keeps_earlier_commits_and_is_retryable() {
    let ledger = Ledger::open_in_memory().expect("open ledger");
    ledger
        .append_or_replace(&tip(5, "Carlton", "Richmond", "Carlton", "Carlton", 70.0))
        .expect("append");
    ledger
        .append_or_replace(&tip(5, "Geelong", "Sydney", "Geelong", "Geelong", 60.0))
        .expect("append");
    ledger
        .append_or_replace(&tip(5, "Hawthorn", "Fremantle", "Hawthorn", "Hawthorn", 55.0))
        .expect("append");

    let flaky = StubProvider::new()
        .with_score(5, "Carlton", "Richmond", 88, 71)
        .with_score(5, "Hawthorn", "Fremantle", 64, 90)
        .failing_for(5, "Geelong", "Sydney");

    let err = reconcile_round(&ledger, &flaky, 5).expect_err("outage propagates");
    assert!(err.is_provider_unavailable());

    // The record reconciled before the outage is committed.
    let unresolved = ledger.unresolved_records_for_round(5).expect("query");
    assert_eq!(unresolved.len(), 2);
    assert!(
        ledger
            .record(&match_key(5, "Carlton", "Richmond"))
            .expect("query")
            .expect("stored")
            .is_resolved()
    );

    // Retry with a healthy provider completes the round.
    let healthy = StubProvider::new()
        .with_score(5, "Carlton", "Richmond", 88, 71)
        .with_score(5, "Geelong", "Sydney", 100, 99)
        .with_score(5, "Hawthorn", "Fremantle", 64, 90);
    let summary = reconcile_round(&ledger, &healthy, 5).expect("retry");
    assert_eq!(summary.resolved, 2);
    assert!(
        ledger
            .unresolved_records_for_round(5)
            .expect("query")
            .is_empty()
    );
}
