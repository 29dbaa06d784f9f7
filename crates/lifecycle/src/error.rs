use thiserror::Error;
use types::{IdeaId, IdeaStage, Timestamp};

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("{idea} is terminal at {stage}")]
    Terminal { idea: IdeaId, stage: IdeaStage },

    #[error("{idea}: illegal transition {from} -> {to}")]
    IllegalTransition {
        idea: IdeaId,
        from: IdeaStage,
        to: IdeaStage,
    },

    #[error("{idea}: {stage} minimum duration not met (ready at {ready_at}, attempted at {attempted_at})")]
    TooEarly {
        idea: IdeaId,
        stage: IdeaStage,
        ready_at: Timestamp,
        attempted_at: Timestamp,
    },

    #[error("{idea}: Active -> Exit requires a closing action")]
    MissingClosingAction { idea: IdeaId },

    #[error("path must start at NewIdea, found {0}")]
    BadStart(IdeaStage),

    #[error("path step {step}: illegal transition {from} -> {to}")]
    InvalidPath {
        step: usize,
        from: IdeaStage,
        to: IdeaStage,
    },

    #[error("empty path")]
    EmptyPath,
}
