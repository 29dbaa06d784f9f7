//! Performance feedback loop.
//!
//! Every research action that carries a forecast is scheduled for an outcome
//! evaluation at `issued_at + horizon`. When the horizon closes the realized
//! value is compared to the forecast, exactly one [`PerformanceRecord`] is
//! written, and the analyst's [`RollingPerformance`] is updated. That rolling
//! confidence is the only channel through which past outcomes reach future
//! decisions.
//!
//! # Modules
//! - [`horizon`]: evaluation horizon per action type
//! - [`record`]: forecasts, pending evaluations, and performance records
//! - [`scheduler`]: the idempotent outcome scheduler
//! - [`rolling`]: EWMA accuracy, streaks, and performance state
//! - [`window`]: time-bounded rolling window used for 30/90 day accuracy

pub mod error;
pub mod horizon;
pub mod record;
pub mod rolling;
pub mod scheduler;
pub mod window;

pub use error::{PerformanceError, Result};
pub use horizon::Horizons;
pub use record::{Forecast, PendingEvaluation, PerformanceRecord};
pub use rolling::{FeedbackConfig, PerformanceSnapshot, RollingPerformance};
pub use scheduler::{EvaluationBatch, OutcomeScheduler};
pub use window::TimedWindow;
