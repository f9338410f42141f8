use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{Result, TipsterError};
use crate::reconcile::{ResultsProvider, ScoreReport};
use crate::record::normalize_team;

const SQUIGGLE_BASE: &str = "https://api.squiggle.com.au/";
const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("afl_tipster/0.1 (weekly tipping ledger)")
            .build()
            .map_err(|err| {
                TipsterError::ProviderUnavailable(format!("failed to build http client: {err}"))
            })
    })
}

#[derive(Debug, Clone)]
struct SquiggleGame {
    home_team: String,
    away_team: String,
    finished: bool,
    home_score: i64,
    away_score: i64,
}

/// Results provider backed by the Squiggle AFL API. One round payload is
/// fetched and cached per round for the life of the provider, so a nine-game
/// round costs one request.
pub struct SquiggleProvider {
    year: i32,
    rounds: RefCell<HashMap<u32, Vec<SquiggleGame>>>,
}

impl SquiggleProvider {
    pub fn new(year: i32) -> SquiggleProvider {
        SquiggleProvider {
            year,
            rounds: RefCell::new(HashMap::new()),
        }
    }

    fn ensure_round(&self, round_id: u32) -> Result<()> {
        if self.rounds.borrow().contains_key(&round_id) {
            return Ok(());
        }
        let games = fetch_round_games(self.year, round_id)?;
        self.rounds.borrow_mut().insert(round_id, games);
        Ok(())
    }
}

impl ResultsProvider for SquiggleProvider {
    fn final_score(
        &self,
        round_id: u32,
        home_team: &str,
        away_team: &str,
    ) -> Result<Option<ScoreReport>> {
        self.ensure_round(round_id)?;
        let rounds = self.rounds.borrow();
        let Some(games) = rounds.get(&round_id) else {
            return Ok(None);
        };

        let home = normalize_team(home_team);
        let away = normalize_team(away_team);
        let hit = games.iter().find(|game| {
            normalize_team(&game.home_team) == home && normalize_team(&game.away_team) == away
        });
        Ok(hit.map(|game| ScoreReport {
            finished: game.finished,
            home_score: game.home_score,
            away_score: game.away_score,
        }))
    }
}

fn fetch_round_games(year: i32, round_id: u32) -> Result<Vec<SquiggleGame>> {
    let client = http_client()?;
    let url = format!("{SQUIGGLE_BASE}?q=games;year={year};round={round_id}");
    let resp = client.get(&url).send().map_err(|err| {
        TipsterError::ProviderUnavailable(format!("squiggle request failed: {err}"))
    })?;
    let status = resp.status();
    let body = resp.text().map_err(|err| {
        TipsterError::ProviderUnavailable(format!("squiggle body read failed: {err}"))
    })?;
    if !status.is_success() {
        return Err(TipsterError::ProviderUnavailable(format!(
            "squiggle http {status}"
        )));
    }
    let value = serde_json::from_str::<Value>(body.trim()).map_err(|err| {
        TipsterError::ProviderUnavailable(format!("squiggle returned invalid json: {err}"))
    })?;
    parse_games(&value)
}

fn parse_games(value: &Value) -> Result<Vec<SquiggleGame>> {
    let games = value
        .get("games")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            TipsterError::ProviderUnavailable("squiggle payload missing games array".to_string())
        })?;

    let mut out = Vec::with_capacity(games.len());
    for game in games {
        if let Some(parsed) = parse_game(game) {
            out.push(parsed);
        }
    }
    Ok(out)
}

fn parse_game(v: &Value) -> Option<SquiggleGame> {
    let home_team = v.get("hteam")?.as_str()?.to_string();
    let away_team = v.get("ateam")?.as_str()?.to_string();
    // Squiggle reports completion as a 0-100 percentage.
    let finished = v.get("complete").and_then(as_i64_any).unwrap_or(0) == 100;
    let home_score = v.get("hscore").and_then(as_i64_any).unwrap_or(0);
    let away_score = v.get("ascore").and_then(as_i64_any).unwrap_or(0);
    Some(SquiggleGame {
        home_team,
        away_team,
        finished,
        home_score,
        away_score,
    })
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}
