use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TipsterError};

/// Favourite/underdog classification of a tip, fixed at prediction time from
/// the betting market supplied by the collaborator. Never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Favourite,
    Underdog,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Favourite => "favourite",
            Tier::Underdog => "underdog",
        }
    }
}

/// Authoritative outcome attached to a prediction at reconciliation.
///
/// `Unresolved` is the explicit policy for postponed or abandoned fixtures:
/// it never counts as correct and never leaves the ledger, but unlike a team
/// win or a draw it is not final and may be replaced without an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "team", rename_all = "lowercase")]
pub enum ActualResult {
    Team(String),
    Draw,
    Unresolved,
}

impl ActualResult {
    pub fn is_final(&self) -> bool {
        !matches!(self, ActualResult::Unresolved)
    }

    pub fn label(&self) -> &str {
        match self {
            ActualResult::Team(team) => team.as_str(),
            ActualResult::Draw => "draw",
            ActualResult::Unresolved => "unresolved",
        }
    }

    pub(crate) fn db_value(&self) -> &str {
        self.label()
    }

    pub(crate) fn from_db(raw: &str) -> ActualResult {
        match raw {
            "draw" => ActualResult::Draw,
            "unresolved" => ActualResult::Unresolved,
            team => ActualResult::Team(team.to_string()),
        }
    }
}

/// A prediction as handed over by the generator, before it is keyed and
/// stamped by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrediction {
    pub round_id: u32,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    /// Stated win probability for the predicted winner, in (0, 100].
    pub confidence_pct: f64,
    /// Betting-market favourite at prediction time, one of the two teams.
    pub market_favourite: String,
    pub venue: Option<String>,
    pub scheduled_at: Option<String>,
}

impl NewPrediction {
    pub fn match_key(&self) -> String {
        match_key(self.round_id, &self.home_team, &self.away_team)
    }

    pub fn tier(&self) -> Tier {
        if normalize_team(&self.predicted_winner) == normalize_team(&self.market_favourite) {
            Tier::Favourite
        } else {
            Tier::Underdog
        }
    }

    pub fn validate(&self) -> Result<()> {
        let home = normalize_team(&self.home_team);
        let away = normalize_team(&self.away_team);
        if home.is_empty() || away.is_empty() {
            return Err(TipsterError::Validation(
                "home and away team names are required".to_string(),
            ));
        }
        if home == away {
            return Err(TipsterError::Validation(format!(
                "fixture pairs a team against itself: {}",
                self.home_team
            )));
        }
        let winner = normalize_team(&self.predicted_winner);
        if winner != home && winner != away {
            return Err(TipsterError::Validation(format!(
                "predicted winner {} is neither {} nor {}",
                self.predicted_winner, self.home_team, self.away_team
            )));
        }
        let favourite = normalize_team(&self.market_favourite);
        if favourite != home && favourite != away {
            return Err(TipsterError::Validation(format!(
                "market favourite {} is neither {} nor {}",
                self.market_favourite, self.home_team, self.away_team
            )));
        }
        if !self.confidence_pct.is_finite()
            || self.confidence_pct <= 0.0
            || self.confidence_pct > 100.0
        {
            return Err(TipsterError::Validation(format!(
                "confidence {} outside (0, 100]",
                self.confidence_pct
            )));
        }
        Ok(())
    }
}

/// One row of the season ledger: a tip, and once reconciled, its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub match_key: String,
    pub round_id: u32,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    pub confidence_pct: f64,
    pub tier: Tier,
    pub venue: Option<String>,
    pub scheduled_at: Option<String>,
    pub created_at: String,
    pub actual_result: Option<ActualResult>,
    /// Absolute final-score margin, recorded alongside a team result.
    pub actual_margin: Option<i64>,
    pub correct: Option<bool>,
    pub resolved_at: Option<String>,
}

impl PredictionRecord {
    pub(crate) fn from_input(input: &NewPrediction) -> PredictionRecord {
        PredictionRecord {
            match_key: input.match_key(),
            round_id: input.round_id,
            home_team: input.home_team.trim().to_string(),
            away_team: input.away_team.trim().to_string(),
            predicted_winner: input.predicted_winner.trim().to_string(),
            confidence_pct: input.confidence_pct,
            tier: input.tier(),
            venue: input.venue.clone(),
            scheduled_at: input.scheduled_at.clone(),
            created_at: Utc::now().to_rfc3339(),
            actual_result: None,
            actual_margin: None,
            correct: None,
            resolved_at: None,
        }
    }

    /// Resolved means a final result is attached (team win or draw).
    pub fn is_resolved(&self) -> bool {
        self.correct.is_some()
    }

    pub fn involves(&self, team: &str) -> bool {
        let team = normalize_team(team);
        normalize_team(&self.home_team) == team || normalize_team(&self.away_team) == team
    }
}

/// Unique fixture key within a season: round plus normalized team pair.
pub fn match_key(round_id: u32, home_team: &str, away_team: &str) -> String {
    format!(
        "{round_id}:{}:{}",
        normalize_team(home_team),
        normalize_team(away_team)
    )
}

pub fn normalize_team(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Derives `correct` from a result. A draw is a miss for either tip; an
/// unresolved fixture stays undecided.
pub fn correctness(predicted_winner: &str, result: &ActualResult) -> Option<bool> {
    match result {
        ActualResult::Team(team) => {
            Some(normalize_team(team) == normalize_team(predicted_winner))
        }
        ActualResult::Draw => Some(false),
        ActualResult::Unresolved => None,
    }
}
