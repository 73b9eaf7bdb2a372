use serde_json::{Map, Value};

use crate::{
    types::{
        ActionStep, ContactKind, EscalationDecision, GuidanceStep, MAX_PLAN_STEPS, MAX_STEP_DURATION_SECONDS,
        MIN_PLAN_STEPS, MIN_STEP_DURATION_SECONDS, SeverityLevel,
    },
    validator::{
        fallback::{DEFAULT_DO_NOT_DO, DEFAULT_REASSURANCE, FallbackContext, fallback_plan_for},
        types::{
            ActionPlan, Classification, Fallback, FallbackReason, RecheckVerdict, RiskAssessment,
        },
    },
};

pub const DEFAULT_GUIDANCE_INSTRUCTION: &str = "Pause. Take a slow breath.";
pub const DEFAULT_GUIDANCE_TIMER_SECONDS: u32 = 30;
pub const DEFAULT_CRISIS_TYPE: &str = "Unknown medical issue";
pub const DEFAULT_ASSESSMENT: &str = "Medical situation requiring assessment";
pub const DEFAULT_RISK_REASON: &str = "Based on symptom severity";
pub const DEFAULT_STEP_INSTRUCTION: &str = "Follow medical guidance";

/// A result shape the validator can coerce an arbitrary JSON mapping into.
pub trait Schema: Sized {
    type Context;
    const KIND: &'static str;

    fn conform(fields: &mut Fields<'_>, ctx: &Self::Context) -> Self;
}

/// Typed reads over one JSON mapping. Every default it hands out is recorded.
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
    fallbacks: &'a mut Vec<Fallback>,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a Map<String, Value>, fallbacks: &'a mut Vec<Fallback>) -> Self {
        Self {
            map,
            prefix: String::new(),
            fallbacks,
        }
    }

    fn nested<'b>(&'b mut self, map: &'b Map<String, Value>, prefix: String) -> Fields<'b> {
        Fields {
            map,
            prefix,
            fallbacks: &mut *self.fallbacks,
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    pub fn record(&mut self, field: &str, reason: FallbackReason) {
        let path = self.path(field);
        self.fallbacks.push(Fallback::new(path, reason));
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    pub fn text(&mut self, field: &str, default: &str) -> String {
        match self.get(field) {
            Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Some(Value::String(_)) | None => {
                self.record(field, FallbackReason::Missing);
                default.to_string()
            }
            Some(_) => {
                self.record(field, FallbackReason::WrongType);
                default.to_string()
            }
        }
    }

    pub fn flag(&mut self, field: &str, default: bool) -> bool {
        match self.get(field) {
            Some(Value::Bool(value)) => *value,
            None => {
                self.record(field, FallbackReason::Missing);
                default
            }
            Some(_) => {
                self.record(field, FallbackReason::WrongType);
                default
            }
        }
    }

    pub fn severity(&mut self, field: &str, default: SeverityLevel) -> SeverityLevel {
        match self.get(field) {
            Some(Value::String(raw)) => SeverityLevel::parse(raw).unwrap_or_else(|| {
                self.record(field, FallbackReason::OutOfRange);
                default
            }),
            None => {
                self.record(field, FallbackReason::Missing);
                default
            }
            Some(_) => {
                self.record(field, FallbackReason::WrongType);
                default
            }
        }
    }

    /// Whole-number value within `[min, max]`; `None` when absent or null.
    pub fn bounded_u32(&mut self, field: &str, min: u32, max: u32) -> Option<u32> {
        let value = self.get(field)?;
        match as_whole_number(value) {
            Some(number) if (u64::from(min)..=u64::from(max)).contains(&number) => {
                u32::try_from(number).ok()
            }
            Some(_) => {
                self.record(field, FallbackReason::OutOfRange);
                None
            }
            None => {
                self.record(field, FallbackReason::WrongType);
                None
            }
        }
    }

    pub fn strings(&mut self, field: &str, default: &[&str]) -> Vec<String> {
        let defaults = || -> Vec<String> { default.iter().map(|item| item.to_string()).collect() };
        let Some(value) = self.get(field) else {
            self.record(field, FallbackReason::Missing);
            return defaults();
        };
        let Value::Array(items) = value else {
            self.record(field, FallbackReason::WrongType);
            return defaults();
        };

        let strings = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if strings.len() != items.len() {
            self.record(field, FallbackReason::WrongType);
        }
        if strings.is_empty() {
            return defaults();
        }
        strings
    }

    pub fn contacts(&mut self, field: &str, default: &[ContactKind]) -> Vec<ContactKind> {
        let Some(value) = self.get(field) else {
            self.record(field, FallbackReason::Missing);
            return default.to_vec();
        };
        let Value::Array(items) = value else {
            self.record(field, FallbackReason::WrongType);
            return default.to_vec();
        };

        let mut contacts = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str().and_then(ContactKind::parse) {
                Some(contact) if !contacts.contains(&contact) => contacts.push(contact),
                Some(_) => {}
                None => self.record(field, FallbackReason::WrongType),
            }
        }
        contacts
    }

    /// Reads a plan list. Lists outside `[3, cap]`, or lacking a critical step when
    /// `severity` demands one, are replaced wholesale by the context's fallback plan.
    pub fn plan(&mut self, field: &str, ctx: &PlanContext) -> Vec<ActionStep> {
        let max = ctx.cap();
        let items = match self.get(field) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.record(field, FallbackReason::WrongType);
                return fallback_plan_for(ctx.fallback, ctx.severity);
            }
            None => {
                self.record(field, FallbackReason::Missing);
                return fallback_plan_for(ctx.fallback, ctx.severity);
            }
        };

        if !(MIN_PLAN_STEPS..=max).contains(&items.len()) {
            self.record(
                field,
                FallbackReason::PlanSizeOutOfBounds {
                    count: items.len(),
                    max,
                },
            );
            return fallback_plan_for(ctx.fallback, ctx.severity);
        }

        let empty = Map::new();
        let steps = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let prefix = self.path(&format!("{field}[{index}]"));
                let map = match item {
                    Value::Object(map) => map,
                    _ => {
                        self.fallbacks
                            .push(Fallback::new(prefix.clone(), FallbackReason::WrongType));
                        &empty
                    }
                };
                let step_id = u32::try_from(index + 1).unwrap_or(u32::MAX);
                conform_step(&mut self.nested(map, prefix), step_id)
            })
            .collect::<Vec<_>>();

        if ctx.severity.requires_critical_step() && !steps.iter().any(|step| step.critical) {
            self.record(field, FallbackReason::PlanMissingCriticalStep);
            return fallback_plan_for(ctx.fallback, ctx.severity);
        }
        steps
    }
}

fn as_whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|number| *number >= 0.0 && number.fract() == 0.0)
            .map(|number| number as u64)
    })
}

// Step ids are renumbered from 1 regardless of what the oracle sent.
fn conform_step(fields: &mut Fields<'_>, step_id: u32) -> ActionStep {
    ActionStep {
        step_id,
        title: fields.text("title", &format!("Action {step_id}")),
        instruction: fields.text("instruction", DEFAULT_STEP_INSTRUCTION),
        duration_seconds: fields.bounded_u32(
            "duration_seconds",
            MIN_STEP_DURATION_SECONDS,
            MAX_STEP_DURATION_SECONDS,
        ),
        user_confirmation_required: fields.flag("user_confirmation_required", true),
        critical: fields.flag("critical", false),
        repeatable: fields.flag("repeatable", false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanContext {
    pub max_steps: usize,
    pub fallback: FallbackContext,
    pub severity: SeverityLevel,
}

impl PlanContext {
    pub fn initial(severity: SeverityLevel) -> Self {
        Self {
            max_steps: MAX_PLAN_STEPS,
            fallback: FallbackContext::StableOrInitial,
            severity,
        }
    }

    pub fn cap(&self) -> usize {
        self.max_steps.clamp(MIN_PLAN_STEPS, MAX_PLAN_STEPS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidanceContext {
    pub step: u32,
}

/// Defaults a recheck answer falls back to, derived from the session before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecheckContext {
    pub plan: PlanContext,
    pub prior_assessment: String,
    pub escalation_required: bool,
    pub contacts: Vec<ContactKind>,
    pub escalation_reason: String,
    pub reassurance_message: String,
}

impl Schema for Classification {
    type Context = ();
    const KIND: &'static str = "classification";

    fn conform(fields: &mut Fields<'_>, _ctx: &()) -> Self {
        Self {
            crisis_type: fields.text("crisis_type", DEFAULT_CRISIS_TYPE),
            severity_level: fields.severity("severity_level", SeverityLevel::Moderate),
            assessment: fields.text("assessment", DEFAULT_ASSESSMENT),
        }
    }
}

impl Schema for RiskAssessment {
    type Context = ();
    const KIND: &'static str = "risk_assessment";

    fn conform(fields: &mut Fields<'_>, _ctx: &()) -> Self {
        let required = fields.flag("escalation_required", false);
        let contacts = fields.contacts("who_to_contact", &[ContactKind::Relative]);
        let reason = fields.text("reason", DEFAULT_RISK_REASON);
        Self {
            escalation: EscalationDecision::new(required, contacts, reason),
        }
    }
}

impl Schema for ActionPlan {
    type Context = PlanContext;
    const KIND: &'static str = "action_plan";

    fn conform(fields: &mut Fields<'_>, ctx: &PlanContext) -> Self {
        Self {
            steps: fields.plan("immediate_actions", ctx),
            do_not_do: fields.strings("do_not_do", &DEFAULT_DO_NOT_DO),
            reassurance_message: fields.text("reassurance_message", DEFAULT_REASSURANCE),
        }
    }
}

impl Schema for GuidanceStep {
    type Context = GuidanceContext;
    const KIND: &'static str = "guidance_step";

    fn conform(fields: &mut Fields<'_>, ctx: &GuidanceContext) -> Self {
        match fields.get("step").map(as_whole_number) {
            Some(Some(step)) if step == u64::from(ctx.step) => {}
            Some(Some(_)) => fields.record("step", FallbackReason::OutOfRange),
            Some(None) => fields.record("step", FallbackReason::WrongType),
            None => fields.record("step", FallbackReason::Missing),
        }
        let timer_seconds = match fields.get("timer_seconds") {
            None => {
                fields.record("timer_seconds", FallbackReason::Missing);
                DEFAULT_GUIDANCE_TIMER_SECONDS
            }
            Some(_) => fields
                .bounded_u32(
                    "timer_seconds",
                    MIN_STEP_DURATION_SECONDS,
                    MAX_STEP_DURATION_SECONDS,
                )
                .unwrap_or(DEFAULT_GUIDANCE_TIMER_SECONDS),
        };

        Self {
            step: ctx.step,
            instruction: fields.text("instruction", DEFAULT_GUIDANCE_INSTRUCTION),
            timer_seconds,
            actionable: fields.flag("actionable", true),
            resolved: fields.flag("resolved", false),
        }
    }
}

impl Schema for RecheckVerdict {
    type Context = RecheckContext;
    const KIND: &'static str = "recheck";

    fn conform(fields: &mut Fields<'_>, ctx: &RecheckContext) -> Self {
        Self {
            assessment: fields.text("assessment", &ctx.prior_assessment),
            steps: fields.plan("immediate_actions", &ctx.plan),
            escalation_required: fields.flag("escalation_required", ctx.escalation_required),
            contacts: fields.contacts("who_to_contact", &ctx.contacts),
            escalation_reason: fields.text("escalation_reason", &ctx.escalation_reason),
            reassurance_message: fields.text("reassurance_message", &ctx.reassurance_message),
        }
    }
}
