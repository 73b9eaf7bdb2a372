use serde::Serialize;

/// States of the assessment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Normalizing,
    Classifying,
    AssessingRisk,
    PlanningActions,
    FormattingOutput,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalizing => "normalizing",
            Self::Classifying => "classifying",
            Self::AssessingRisk => "assessing_risk",
            Self::PlanningActions => "planning_actions",
            Self::FormattingOutput => "formatting_output",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Successor of `self`. A stage that left an error routes through `Failed`, which
    /// always hands over to `FormattingOutput` so the caller still gets an outcome.
    pub fn next(self, stage_failed: bool) -> Self {
        match self {
            Self::Done => Self::Done,
            Self::FormattingOutput => Self::Done,
            Self::Failed => Self::FormattingOutput,
            _ if stage_failed => Self::Failed,
            Self::Normalizing => Self::Classifying,
            Self::Classifying => Self::AssessingRisk,
            Self::AssessingRisk => Self::PlanningActions,
            Self::PlanningActions => Self::FormattingOutput,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}
