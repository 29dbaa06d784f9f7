use thiserror::Error;
use types::{ActionId, Timestamp};

pub type Result<T> = std::result::Result<T, PerformanceError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerformanceError {
    #[error("{action} ({horizon_days}d) is not due until {due_at}, evaluated at {now}")]
    NotDue {
        action: ActionId,
        horizon_days: u32,
        due_at: Timestamp,
        now: Timestamp,
    },

    #[error("{action} ({horizon_days}d) is already scheduled")]
    AlreadyScheduled { action: ActionId, horizon_days: u32 },

    #[error("{action}: invalid realized value {value}")]
    InvalidOutcome { action: ActionId, value: f64 },

    #[error("invalid feedback config: {0}")]
    InvalidConfig(String),
}
