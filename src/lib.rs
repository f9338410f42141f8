pub mod accuracy;
pub mod error;
pub mod feedback;
pub mod ledger;
pub mod reconcile;
pub mod record;
pub mod squiggle;

pub use error::{Result, TipsterError};
pub use feedback::{UpcomingFixture, render_feedback};
pub use ledger::Ledger;
pub use reconcile::{ReconcileSummary, ResultsProvider, ScoreReport, reconcile_round};
pub use record::{ActualResult, NewPrediction, PredictionRecord, Tier};
