use afl_tipster::feedback::UpcomingFixture;
use afl_tipster::{ActualResult, Ledger, NewPrediction, accuracy, render_feedback};

fn tip(round_id: u32, home: &str, away: &str, winner: &str, conf: f64) -> NewPrediction {
    NewPrediction {
        round_id,
        home_team: home.to_string(),
        away_team: away.to_string(),
        predicted_winner: winner.to_string(),
        confidence_pct: conf,
        market_favourite: winner.to_string(),
        venue: None,
        scheduled_at: None,
    }
}

#[test]
fn collingwood_essendon_history_surfaces_in_feedback() {
    let ledger = Ledger::open_in_memory().expect("open ledger");

    let pred = tip(4, "Collingwood", "Essendon", "Collingwood", 62.0);
    ledger.append_or_replace(&pred).expect("append");
    ledger
        .mark_result(
            &pred.match_key(),
            ActualResult::Team("Collingwood".to_string()),
            false,
        )
        .expect("resolve");

    // Unrelated noise that must not leak into the team section.
    let other = tip(4, "Carlton", "Richmond", "Carlton", 58.0);
    ledger.append_or_replace(&other).expect("append");
    ledger
        .mark_result(
            &other.match_key(),
            ActualResult::Team("Richmond".to_string()),
            false,
        )
        .expect("resolve");

    let records = ledger.all_records().expect("history");
    let history = accuracy::history_for_teams(&records, "Collingwood", "Essendon", 5);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].round_id, 4);
    assert_eq!(history[0].correct, Some(true));

    let upcoming = vec![UpcomingFixture {
        round_id: 5,
        home_team: "Essendon".to_string(),
        away_team: "Collingwood".to_string(),
    }];
    let block = render_feedback(&records, &upcoming);
    assert!(block.contains("PAST TIPS INVOLVING ESSENDON OR COLLINGWOOD:"));
    assert!(block.contains(
        "Rd 4: Collingwood vs Essendon - tipped Collingwood (62% confidence) - CORRECT (actual: Collingwood)"
    ));
    // The Carlton game is not part of the team section, only the miss recap.
    assert!(!block.contains("Carlton vs Richmond - tipped Carlton"));
    assert!(block.contains("Rd 4: tipped Carlton, Richmond won"));
}

#[test]
fn team_history_limit_holds_for_long_seasons() {
    let ledger = Ledger::open_in_memory().expect("open ledger");
    for round in 1..=12 {
        let pred = tip(round, "Collingwood", "Essendon", "Collingwood", 60.0);
        ledger.append_or_replace(&pred).expect("append");
        ledger
            .mark_result(
                &pred.match_key(),
                ActualResult::Team("Collingwood".to_string()),
                false,
            )
            .expect("resolve");
    }

    let records = ledger.all_records().expect("history");
    let history = accuracy::history_for_teams(&records, "Collingwood", "Essendon", 5);
    assert_eq!(history.len(), 5);
    // Newest first.
    assert_eq!(history[0].round_id, 12);
    assert_eq!(history[4].round_id, 8);
}

#[test]
fn feedback_block_is_bounded_per_section() {
    let ledger = Ledger::open_in_memory().expect("open ledger");
    for round in 1..=10 {
        let pred = tip(round, "Collingwood", "Essendon", "Collingwood", 60.0);
        ledger.append_or_replace(&pred).expect("append");
        // Every tip is wrong, feeding both the history and the miss section.
        ledger
            .mark_result(
                &pred.match_key(),
                ActualResult::Team("Essendon".to_string()),
                false,
            )
            .expect("resolve");
    }

    let records = ledger.all_records().expect("history");
    let upcoming = vec![UpcomingFixture {
        round_id: 11,
        home_team: "Collingwood".to_string(),
        away_team: "Essendon".to_string(),
    }];
    let block = render_feedback(&records, &upcoming);

    let history_lines = block
        .lines()
        .filter(|line| line.contains("tipped Collingwood (60% confidence)"))
        .count();
    assert_eq!(history_lines, 5);

    let trend_line = block
        .lines()
        .find(|line| line.contains("Recent rounds:"))
        .expect("trend line");
    assert_eq!(trend_line.matches("Rd ").count(), 5);

    let miss_lines = block
        .lines()
        .filter(|line| line.contains("Essendon won"))
        .count();
    assert!(miss_lines <= 4);
}
