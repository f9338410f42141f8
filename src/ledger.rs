use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, TipsterError};
use crate::record::{ActualResult, NewPrediction, PredictionRecord, Tier, correctness};

const DB_DIR: &str = "afl_tipster";
const DB_FILE: &str = "tipping_ledger.sqlite";

/// Durable store of every prediction made over a season. Sole owner and sole
/// mutator of persisted records: readers get cloned snapshots, and each
/// mutation commits before the call returns.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    pub fn open(path: &Path) -> Result<Ledger> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Ledger { conn })
    }

    pub fn open_in_memory() -> Result<Ledger> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Ledger { conn })
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
            if !base.trim().is_empty() {
                return Some(PathBuf::from(base).join(DB_DIR).join(DB_FILE));
            }
        }
        let home = std::env::var("HOME").ok()?;
        if home.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(home).join(".cache").join(DB_DIR).join(DB_FILE))
    }

    /// Stores a prediction, replacing any earlier tip for the same fixture.
    /// A fixture that already carries a final result is immutable and the
    /// replacement is rejected.
    pub fn append_or_replace(&self, input: &NewPrediction) -> Result<PredictionRecord> {
        input.validate()?;
        let record = PredictionRecord::from_input(input);

        if let Some(existing) = self.record(&record.match_key)? {
            if let Some(result) = existing.actual_result.as_ref() {
                if result.is_final() {
                    return Err(TipsterError::AlreadyResolved {
                        match_key: record.match_key.clone(),
                        existing: result.label().to_string(),
                        proposed: format!("re-prediction of {}", record.predicted_winner),
                    });
                }
            }
        }

        // Upsert keeps the rowid, so insertion order survives a re-tip.
        self.conn.execute(
            r#"
            INSERT INTO predictions (
                match_key, round_id, home_team, away_team,
                predicted_winner, confidence_pct, tier, venue, scheduled_at,
                created_at, actual_result, actual_margin, correct, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, NULL, NULL, NULL)
            ON CONFLICT(match_key) DO UPDATE SET
                round_id = excluded.round_id,
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                predicted_winner = excluded.predicted_winner,
                confidence_pct = excluded.confidence_pct,
                tier = excluded.tier,
                venue = excluded.venue,
                scheduled_at = excluded.scheduled_at,
                created_at = excluded.created_at,
                actual_result = NULL,
                actual_margin = NULL,
                correct = NULL,
                resolved_at = NULL
            "#,
            params![
                record.match_key,
                record.round_id as i64,
                record.home_team,
                record.away_team,
                record.predicted_winner,
                record.confidence_pct,
                record.tier.as_str(),
                record.venue,
                record.scheduled_at,
                record.created_at,
            ],
        )?;
        Ok(record)
    }

    pub fn record(&self, match_key: &str) -> Result<Option<PredictionRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_RECORD} WHERE match_key = ?1"),
                params![match_key],
                row_to_record,
            )
            .optional()?;
        Ok(row)
    }

    /// Records for one round in insertion order.
    pub fn records_for_round(&self, round_id: u32) -> Result<Vec<PredictionRecord>> {
        self.query_records(
            &format!("{SELECT_RECORD} WHERE round_id = ?1 ORDER BY rowid ASC"),
            params![round_id as i64],
        )
    }

    /// Round records still awaiting any result, including a provisional one.
    pub fn unresolved_records_for_round(&self, round_id: u32) -> Result<Vec<PredictionRecord>> {
        self.query_records(
            &format!(
                "{SELECT_RECORD} WHERE round_id = ?1 AND actual_result IS NULL ORDER BY rowid ASC"
            ),
            params![round_id as i64],
        )
    }

    /// Full season history in insertion order. Each call re-reads the store,
    /// so the returned snapshot is always fully committed state.
    pub fn all_records(&self) -> Result<Vec<PredictionRecord>> {
        self.query_records(&format!("{SELECT_RECORD} ORDER BY rowid ASC"), params![])
    }

    pub fn mark_result(
        &self,
        match_key: &str,
        result: ActualResult,
        override_resolved: bool,
    ) -> Result<PredictionRecord> {
        self.mark_result_with_margin(match_key, result, None, override_resolved)
    }

    /// Attaches an authoritative result and recomputes `correct`. Re-marking
    /// with the identical result is a no-op; a conflicting final result needs
    /// the override flag (provider corrections).
    pub fn mark_result_with_margin(
        &self,
        match_key: &str,
        result: ActualResult,
        margin: Option<i64>,
        override_resolved: bool,
    ) -> Result<PredictionRecord> {
        let existing = self
            .record(match_key)?
            .ok_or_else(|| TipsterError::NotFound(match_key.to_string()))?;

        if let Some(current) = existing.actual_result.as_ref() {
            if *current == result {
                return Ok(existing);
            }
            if current.is_final() && !override_resolved {
                return Err(TipsterError::AlreadyResolved {
                    match_key: match_key.to_string(),
                    existing: current.label().to_string(),
                    proposed: result.label().to_string(),
                });
            }
        }

        let correct = correctness(&existing.predicted_winner, &result);
        self.conn.execute(
            r#"
            UPDATE predictions
            SET actual_result = ?1, actual_margin = ?2, correct = ?3, resolved_at = ?4
            WHERE match_key = ?5
            "#,
            params![
                result.db_value(),
                margin,
                correct,
                Utc::now().to_rfc3339(),
                match_key,
            ],
        )?;

        self.record(match_key)?
            .ok_or_else(|| TipsterError::NotFound(match_key.to_string()))
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<PredictionRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_record)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const SELECT_RECORD: &str = r#"
    SELECT
        match_key, round_id, home_team, away_team,
        predicted_winner, confidence_pct, tier, venue, scheduled_at,
        created_at, actual_result, actual_margin, correct, resolved_at
    FROM predictions
"#;

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS predictions (
            match_key TEXT PRIMARY KEY,
            round_id INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            predicted_winner TEXT NOT NULL,
            confidence_pct REAL NOT NULL,
            tier TEXT NOT NULL,
            venue TEXT NULL,
            scheduled_at TEXT NULL,
            created_at TEXT NOT NULL,
            actual_result TEXT NULL,
            actual_margin INTEGER NULL,
            correct INTEGER NULL,
            resolved_at TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_round ON predictions(round_id);
        CREATE INDEX IF NOT EXISTS idx_predictions_correct ON predictions(correct);
        "#,
    )?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let tier: String = row.get(6)?;
    let tier = match tier.as_str() {
        "favourite" => Tier::Favourite,
        _ => Tier::Underdog,
    };
    let actual_result: Option<String> = row.get(10)?;
    Ok(PredictionRecord {
        match_key: row.get(0)?,
        round_id: row.get::<_, i64>(1)? as u32,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        predicted_winner: row.get(4)?,
        confidence_pct: row.get(5)?,
        tier,
        venue: row.get(7)?,
        scheduled_at: row.get(8)?,
        created_at: row.get(9)?,
        actual_result: actual_result.as_deref().map(ActualResult::from_db),
        actual_margin: row.get(11)?,
        correct: row.get::<_, Option<i64>>(12)?.map(|v| v != 0),
        resolved_at: row.get(13)?,
    })
}
