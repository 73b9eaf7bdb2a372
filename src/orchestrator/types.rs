use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    router::{CrisisCategory, Mood, RiskTier},
    types::SessionId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorLimits {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_optimal_steps")]
    pub optimal_steps: u32,
    #[serde(default = "default_high_risk_max_steps")]
    pub high_risk_max_steps: u32,
}

impl Default for OrchestratorLimits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            optimal_steps: default_optimal_steps(),
            high_risk_max_steps: default_high_risk_max_steps(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitsError {
    #[error("max_steps must be at least 1")]
    ZeroMaxSteps,
    #[error("optimal_steps ({optimal}) must not exceed max_steps ({max})")]
    OptimalAboveMax { optimal: u32, max: u32 },
    #[error("high_risk_max_steps ({high_risk}) must be between 1 and max_steps ({max})")]
    HighRiskOutOfRange { high_risk: u32, max: u32 },
}

impl OrchestratorLimits {
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.max_steps == 0 {
            return Err(LimitsError::ZeroMaxSteps);
        }
        if self.optimal_steps > self.max_steps {
            return Err(LimitsError::OptimalAboveMax {
                optimal: self.optimal_steps,
                max: self.max_steps,
            });
        }
        if self.high_risk_max_steps == 0 || self.high_risk_max_steps > self.max_steps {
            return Err(LimitsError::HighRiskOutOfRange {
                high_risk: self.high_risk_max_steps,
                max: self.max_steps,
            });
        }
        Ok(())
    }

    /// Iteration budget for one guidance run at the given tier.
    pub fn steps_for(&self, tier: RiskTier) -> u32 {
        if tier == RiskTier::High {
            self.high_risk_max_steps
        } else {
            self.max_steps
        }
    }
}

fn default_max_steps() -> u32 {
    7
}

fn default_optimal_steps() -> u32 {
    4
}

fn default_high_risk_max_steps() -> u32 {
    3
}

/// Inbound request for `assess` and `guide`. Mood and category are detected from the
/// text when the caller leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisRequest {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub user_text: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub category: Option<CrisisCategory>,
}

impl CrisisRequest {
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            session_id: None,
            user_text: user_text.into(),
            mood: None,
            category: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_category(mut self, category: CrisisCategory) -> Self {
        self.category = Some(category);
        self
    }
}
