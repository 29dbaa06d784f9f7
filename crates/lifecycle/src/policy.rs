//! Transition graph and path validation.

use serde::{Deserialize, Serialize};
use types::IdeaStage;

use crate::error::{LifecycleError, Result};

/// Configurable parts of the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    /// Permit Active -> Pass in addition to Active -> Exit. Off by default.
    pub allow_active_to_pass: bool,
}

impl LifecyclePolicy {
    pub fn with_active_to_pass(mut self, allow: bool) -> Self {
        self.allow_active_to_pass = allow;
        self
    }

    /// Stages reachable from `from` in one step.
    pub fn next_stages(&self, from: IdeaStage) -> &'static [IdeaStage] {
        match from {
            IdeaStage::NewIdea => &[IdeaStage::Wip],
            IdeaStage::Wip => &[IdeaStage::Active, IdeaStage::Pass],
            IdeaStage::Active if self.allow_active_to_pass => &[IdeaStage::Exit, IdeaStage::Pass],
            IdeaStage::Active => &[IdeaStage::Exit],
            IdeaStage::Exit | IdeaStage::Pass => &[],
        }
    }

    pub fn allows(&self, from: IdeaStage, to: IdeaStage) -> bool {
        self.next_stages(from).contains(&to)
    }
}

/// Check a scripted stage sequence starting at NewIdea.
pub fn validate_path(path: &[IdeaStage], policy: &LifecyclePolicy) -> Result<()> {
    let first = *path.first().ok_or(LifecycleError::EmptyPath)?;
    if first != IdeaStage::NewIdea {
        return Err(LifecycleError::BadStart(first));
    }
    for (step, pair) in path.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        if !policy.allows(from, to) {
            return Err(LifecycleError::InvalidPath {
                step: step + 1,
                from,
                to,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use IdeaStage::*;

    #[test]
    fn test_default_paths() {
        let policy = LifecyclePolicy::default();
        assert!(validate_path(&[NewIdea, Wip, Active, Exit], &policy).is_ok());
        assert!(validate_path(&[NewIdea, Wip, Pass], &policy).is_ok());
        assert!(validate_path(&[NewIdea], &policy).is_ok());
    }

    #[test]
    fn test_rejected_paths() {
        let policy = LifecyclePolicy::default();
        assert_eq!(
            validate_path(&[NewIdea, Active], &policy),
            Err(LifecycleError::InvalidPath {
                step: 1,
                from: NewIdea,
                to: Active
            })
        );
        assert!(validate_path(&[NewIdea, Wip, Active, Pass], &policy).is_err());
        assert_eq!(
            validate_path(&[Wip, Active], &policy),
            Err(LifecycleError::BadStart(Wip))
        );
        assert_eq!(validate_path(&[], &policy), Err(LifecycleError::EmptyPath));
    }

    #[test]
    fn test_active_to_pass_is_opt_in() {
        let policy = LifecyclePolicy::default().with_active_to_pass(true);
        assert!(validate_path(&[NewIdea, Wip, Active, Pass], &policy).is_ok());
    }
}
