use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    session::record::SessionRecord,
    types::{SeverityLevel, StepId},
};

/// One repair made by [`reconcile_in_place`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum InvariantCorrection {
    EscalationRestored,
    SeverityRestored {
        from: SeverityLevel,
        to: SeverityLevel,
    },
    CompletedStepsPruned {
        removed: Vec<StepId>,
    },
}

/// Pure form of [`reconcile_in_place`].
pub fn reconcile(record: &SessionRecord) -> SessionRecord {
    let mut next = record.clone();
    reconcile_in_place(&mut next);
    next
}

/// Re-establishes the safety invariants after a mutation:
///
/// 1. any required entry in the escalation history keeps escalation required;
/// 2. severity never drops below `previous_severity`;
/// 3. completions recorded during this run must refer to steps in the current plan.
///    Completions inherited from an earlier run are left alone.
///
/// Idempotent: a second call on the result makes no corrections.
pub fn reconcile_in_place(record: &mut SessionRecord) -> Vec<InvariantCorrection> {
    let mut corrections = Vec::new();

    if !record.escalation_required && record.escalation_history.iter().any(|entry| entry.required)
    {
        record.escalation_required = true;
        record.escalation.required = true;
        corrections.push(InvariantCorrection::EscalationRestored);
    }

    if let Some(previous) = record.previous_severity {
        if previous > record.severity_level {
            corrections.push(InvariantCorrection::SeverityRestored {
                from: record.severity_level,
                to: previous,
            });
            record.severity_level = previous;
        }
    }

    if !record.completions_inherited && !record.current_plan.is_empty() {
        let plan_ids = record.plan_step_ids();
        let removed = record
            .completed_steps
            .difference(&plan_ids)
            .copied()
            .collect::<Vec<_>>();
        if !removed.is_empty() {
            record.completed_steps = record
                .completed_steps
                .intersection(&plan_ids)
                .copied()
                .collect::<BTreeSet<_>>();
            corrections.push(InvariantCorrection::CompletedStepsPruned { removed });
        }
    }

    for correction in &corrections {
        tracing::warn!(
            target: "session",
            session_id = %record.session_id,
            correction = ?correction,
            "invariant_violation_corrected"
        );
    }
    corrections
}
