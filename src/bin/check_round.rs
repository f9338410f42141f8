use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use afl_tipster::feedback::UpcomingFixture;
use afl_tipster::squiggle::SquiggleProvider;
use afl_tipster::{Ledger, accuracy, reconcile_round, render_feedback};

const DEFAULT_SEASON: i32 = 2026;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let round_id = parse_round_arg().ok_or_else(|| anyhow!("usage: check_round <round>"))?;
    let season = std::env::var("AFL_SEASON")
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .unwrap_or(DEFAULT_SEASON);

    let db_path = std::env::var("AFL_TIPSTER_DB")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
        .or_else(Ledger::default_path)
        .context("unable to resolve ledger path")?;

    let ledger = Ledger::open(&db_path).context("open tipping ledger")?;
    let provider = SquiggleProvider::new(season);
    let summary = reconcile_round(&ledger, &provider, round_id)
        .with_context(|| format!("reconcile round {round_id}"))?;

    println!("Round {round_id} reconciliation ({season})");
    println!("Ledger: {}", db_path.display());
    for line in &summary.lines {
        println!("  {line}");
    }
    println!(
        "Resolved {} result(s), {} still pending.",
        summary.resolved, summary.pending
    );

    let records = ledger.all_records().context("load season history")?;
    let season_tally = accuracy::season_summary(&records);
    match season_tally.accuracy_pct {
        Some(pct) => println!(
            "Season to date: {}/{} ({pct:.1}%)",
            season_tally.correct_count, season_tally.total
        ),
        None => println!("Season to date: no resolved tips yet"),
    }

    let upcoming: Vec<UpcomingFixture> = ledger
        .records_for_round(round_id)
        .context("load round fixtures")?
        .iter()
        .map(|record| UpcomingFixture {
            round_id: record.round_id,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
        })
        .collect();

    println!();
    println!("Feedback block for the next prompt:");
    println!("{}", render_feedback(&records, &upcoming));

    Ok(())
}

fn parse_round_arg() -> Option<u32> {
    std::env::args()
        .nth(1)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
}
