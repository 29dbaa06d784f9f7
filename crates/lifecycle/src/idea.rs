//! A single research idea and its recorded stage history.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use types::{ActionId, AnalystId, IdeaId, IdeaStage, SecurityId, Timestamp};

use crate::error::{LifecycleError, Result};
use crate::policy::LifecyclePolicy;

/// One recorded stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub from: IdeaStage,
    pub to: IdeaStage,
    pub at: Timestamp,
    /// Action that caused the change, if any.
    pub action: Option<ActionId>,
}

/// Per-security thesis owned by one analyst for its whole life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    id: IdeaId,
    security_id: SecurityId,
    opened_at: Timestamp,
    stage: IdeaStage,
    entered_stage_at: Timestamp,
    min_stage_duration: Duration,
    history: Vec<StageChange>,
}

impl Idea {
    /// Open a new idea in the NewIdea stage.
    pub fn open(
        id: IdeaId,
        security_id: impl Into<SecurityId>,
        opened_at: Timestamp,
        min_stage_duration: Duration,
    ) -> Self {
        Self {
            id,
            security_id: security_id.into(),
            opened_at,
            stage: IdeaStage::NewIdea,
            entered_stage_at: opened_at,
            min_stage_duration: min_stage_duration.max(Duration::zero()),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> IdeaId {
        self.id
    }

    pub fn analyst(&self) -> AnalystId {
        self.id.analyst
    }

    pub fn security_id(&self) -> &str {
        &self.security_id
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    pub fn stage(&self) -> IdeaStage {
        self.stage
    }

    pub fn entered_stage_at(&self) -> Timestamp {
        self.entered_stage_at
    }

    pub fn history(&self) -> &[StageChange] {
        &self.history
    }

    /// Non-terminal ideas count against coverage capacity.
    pub fn is_open(&self) -> bool {
        !self.stage.is_terminal()
    }

    /// Earliest instant the current stage may be left.
    pub fn ready_at(&self) -> Timestamp {
        self.entered_stage_at + self.min_stage_duration
    }

    pub fn is_ready(&self, now: Timestamp) -> bool {
        now >= self.ready_at()
    }

    /// Stages visited so far, starting with NewIdea.
    pub fn path(&self) -> Vec<IdeaStage> {
        std::iter::once(IdeaStage::NewIdea)
            .chain(self.history.iter().map(|c| c.to))
            .collect()
    }

    /// Attempt a stage transition.
    ///
    /// On success the idea enters `to` at `at`, with `next_min_duration` as
    /// the minimum time before it may move again. On failure the idea is
    /// left untouched.
    pub fn transition(
        &mut self,
        to: IdeaStage,
        at: Timestamp,
        action: Option<ActionId>,
        next_min_duration: Duration,
        policy: &LifecyclePolicy,
    ) -> Result<&StageChange> {
        let from = self.stage;
        if from.is_terminal() {
            return Err(LifecycleError::Terminal {
                idea: self.id,
                stage: from,
            });
        }
        if !policy.allows(from, to) {
            return Err(LifecycleError::IllegalTransition {
                idea: self.id,
                from,
                to,
            });
        }
        if !self.is_ready(at) {
            return Err(LifecycleError::TooEarly {
                idea: self.id,
                stage: from,
                ready_at: self.ready_at(),
                attempted_at: at,
            });
        }
        if from == IdeaStage::Active && to == IdeaStage::Exit && action.is_none() {
            return Err(LifecycleError::MissingClosingAction { idea: self.id });
        }

        self.stage = to;
        self.entered_stage_at = at;
        self.min_stage_duration = if to.is_terminal() {
            Duration::zero()
        } else {
            next_min_duration.max(Duration::zero())
        };
        self.history.push(StageChange {
            from,
            to,
            at,
            action,
        });
        Ok(&self.history[self.history.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2023, 5, day, 9, 0, 0).unwrap()
    }

    fn idea() -> Idea {
        Idea::open(IdeaId::new(AnalystId(1), 1), "AAA", t(1), Duration::days(2))
    }

    #[test]
    fn test_full_lifecycle() {
        let policy = LifecyclePolicy::default();
        let mut idea = idea();
        idea.transition(IdeaStage::Wip, t(3), Some(ActionId(2)), Duration::days(5), &policy)
            .unwrap();
        idea.transition(IdeaStage::Active, t(8), Some(ActionId(3)), Duration::days(10), &policy)
            .unwrap();
        idea.transition(IdeaStage::Exit, t(20), Some(ActionId(4)), Duration::zero(), &policy)
            .unwrap();
        assert!(!idea.is_open());
        assert_eq!(
            idea.path(),
            vec![IdeaStage::NewIdea, IdeaStage::Wip, IdeaStage::Active, IdeaStage::Exit]
        );
    }

    #[test]
    fn test_too_early_leaves_idea_unchanged() {
        let policy = LifecyclePolicy::default();
        let mut idea = idea();
        let before = idea.clone();
        let err = idea
            .transition(IdeaStage::Wip, t(2), None, Duration::days(1), &policy)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::TooEarly { .. }));
        assert_eq!(idea, before);
    }

    #[test]
    fn test_exit_requires_closing_action() {
        let policy = LifecyclePolicy::default();
        let mut idea = Idea::open(IdeaId::new(AnalystId(1), 1), "AAA", t(1), Duration::zero());
        idea.transition(IdeaStage::Wip, t(1), None, Duration::zero(), &policy)
            .unwrap();
        idea.transition(IdeaStage::Active, t(1), None, Duration::zero(), &policy)
            .unwrap();
        let id = idea.id();
        let before = idea.clone();
        assert_eq!(
            idea.transition(IdeaStage::Exit, t(2), None, Duration::zero(), &policy),
            Err(LifecycleError::MissingClosingAction { idea: id })
        );
        assert_eq!(idea, before);
    }

    #[test]
    fn test_terminal_is_frozen() {
        let policy = LifecyclePolicy::default();
        let mut idea = Idea::open(IdeaId::new(AnalystId(1), 1), "AAA", t(1), Duration::zero());
        idea.transition(IdeaStage::Wip, t(1), None, Duration::zero(), &policy)
            .unwrap();
        idea.transition(IdeaStage::Pass, t(2), None, Duration::zero(), &policy)
            .unwrap();
        let err = idea
            .transition(IdeaStage::Active, t(3), None, Duration::zero(), &policy)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Terminal { .. }));
        assert_eq!(idea.history().len(), 2);
    }
}
