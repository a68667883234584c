use super::domain::{IdentityRecord, Stage};
use serde::{Deserialize, Serialize};

/// Configuration for the stage machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    pub entry_stage: Stage,
    /// When set, score-bearing stages also need at least one scored answer.
    pub results_require_answers: bool,
}

impl GatePolicy {
    /// Stage a fresh gate starts on. A gated entry stage is replaced by `Identity`
    /// until the guard has seen a complete identity.
    pub const fn start_stage(&self) -> Stage {
        if self.entry_stage.requires_identity() {
            Stage::Identity
        } else {
            self.entry_stage
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            entry_stage: Stage::Welcome,
            results_require_answers: false,
        }
    }
}

/// Facts the guard looks at when deciding reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateContext<'a> {
    pub identity: &'a IdentityRecord,
    pub scored_answers: usize,
}

/// Why a transition was refused. The current stage is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GateNotice {
    #[error("complete the identity form before opening {}", .target.label())]
    IdentityIncomplete {
        target: Stage,
        missing: Vec<&'static str>,
    },
    #[error("answer at least one question before opening {}", .target.label())]
    NoAnswers { target: Stage },
}

impl GateNotice {
    pub fn target(&self) -> Stage {
        match self {
            Self::IdentityIncomplete { target, .. } | Self::NoAnswers { target } => *target,
        }
    }
}

/// Finite-state machine over the assessment stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    policy: GatePolicy,
    current: Stage,
}

impl AccessGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            current: policy.start_stage(),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Single guard deciding whether `target` may be entered.
    pub fn evaluate(&self, target: Stage, context: GateContext<'_>) -> Result<(), GateNotice> {
        if target.requires_identity() && !context.identity.is_complete() {
            return Err(GateNotice::IdentityIncomplete {
                target,
                missing: context.identity.missing_fields(),
            });
        }

        if self.policy.results_require_answers
            && target.shows_scores()
            && context.scored_answers == 0
        {
            return Err(GateNotice::NoAnswers { target });
        }

        Ok(())
    }

    pub fn reachable(&self, context: GateContext<'_>) -> Vec<Stage> {
        Stage::ordered()
            .into_iter()
            .filter(|stage| self.evaluate(*stage, context).is_ok())
            .collect()
    }

    /// Move to `target` if the guard allows it; otherwise stay put.
    pub fn navigate(
        &mut self,
        target: Stage,
        context: GateContext<'_>,
    ) -> Result<Stage, GateNotice> {
        self.evaluate(target, context)?;
        self.current = target;
        Ok(self.current)
    }

    /// Re-check the current stage after its preconditions changed.
    ///
    /// A stage that is no longer reachable falls back to `Identity`, or to
    /// `Questionnaire` when only the answer requirement broke.
    pub fn enforce(&mut self, context: GateContext<'_>) -> Option<GateNotice> {
        let notice = self.evaluate(self.current, context).err()?;
        self.current = match &notice {
            GateNotice::IdentityIncomplete { .. } => Stage::Identity,
            GateNotice::NoAnswers { .. } => {
                if self.evaluate(Stage::Questionnaire, context).is_ok() {
                    Stage::Questionnaire
                } else {
                    self.policy.start_stage()
                }
            }
        };
        Some(notice)
    }

    /// Move to the configured entry stage when the guard allows it.
    pub fn enter(&mut self, context: GateContext<'_>) -> Stage {
        if self.evaluate(self.policy.entry_stage, context).is_ok() {
            self.current = self.policy.entry_stage;
        }
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.policy.start_stage();
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(GatePolicy::default())
    }
}
