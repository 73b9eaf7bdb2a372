use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::oracle::types::{ChatMessage, ChatPayload, ChatRole, OraclePurpose, OracleRequest, PriorTurn};

/// Answer the normalization stage returns for anything that is not a medical situation.
pub const NON_MEDICAL_SENTINEL: &str = "NON_MEDICAL_INPUT";

const NORMALIZE_PROMPT: &str = "You are a medical crisis input processor. \
Extract the core medical concern from the user's message and restate it briefly, \
keeping only the symptoms and circumstances. If the message is not about a medical \
situation, answer exactly NON_MEDICAL_INPUT.";

const CLASSIFY_PROMPT: &str = "You are a medical crisis classifier. Identify the type of \
medical crisis and its severity (low, moderate, high, critical). Be conservative: when in \
doubt, choose the higher severity. Answer with a JSON object: \
{\"crisis_type\": string, \"severity_level\": \"low|moderate|high|critical\", \
\"assessment\": string}. The assessment must be calm and non-alarming.";

const ASSESS_RISK_PROMPT: &str = "You are a medical safety risk assessor. Decide whether \
the person needs outside help and whom to contact. Allowed contacts: relative, friend, \
ambulance, nearby hospital. Answer with a JSON object: {\"escalation_required\": bool, \
\"who_to_contact\": [string], \"reason\": string}.";

const PLAN_ACTIONS_PROMPT: &str = "You are a medical first-response guide for people \
without medical training. Produce between 3 and {max_steps} short, concrete, safe actions. \
At high or critical severity at least one action must be marked critical. Answer with a \
JSON object: {\"immediate_actions\": [{\"step_id\": int, \"title\": string, \
\"instruction\": string, \"duration_seconds\": int|null, \"user_confirmation_required\": \
bool, \"critical\": bool, \"repeatable\": bool}], \"do_not_do\": [string], \
\"reassurance_message\": string}. Durations are between 5 and 120 seconds.";

const GUIDE_STEP_PROMPT: &str = "You are a calm crisis companion guiding someone one \
small step at a time through a financial or personal emergency. Give exactly one \
instruction for the current step. Answer with a JSON object: {\"step\": int, \
\"instruction\": string, \"timer_seconds\": int, \"actionable\": bool, \"resolved\": bool}. \
Set actionable to false when the person cannot act on their own, and resolved to true \
only when the immediate problem is handled.";

const RECHECK_PROMPT: &str = "You are re-evaluating a medical situation after the person \
answered whether symptoms got worse. Produce an updated plan of between 3 and {max_steps} \
actions. When force_escalation is true, escalation is mandatory. Answer with a JSON object: \
{\"assessment\": string, \"immediate_actions\": [ ...same step shape as the initial plan... ], \
\"escalation_required\": bool, \"who_to_contact\": [string], \"escalation_reason\": string, \
\"reassurance_message\": string}.";

pub fn system_prompt(request: &OracleRequest) -> String {
    let template = match request.purpose {
        OraclePurpose::Normalize => NORMALIZE_PROMPT,
        OraclePurpose::Classify => CLASSIFY_PROMPT,
        OraclePurpose::AssessRisk => ASSESS_RISK_PROMPT,
        OraclePurpose::PlanActions => PLAN_ACTIONS_PROMPT,
        OraclePurpose::GuideStep => GUIDE_STEP_PROMPT,
        OraclePurpose::Recheck => RECHECK_PROMPT,
    };
    let max_steps = request
        .field("max_steps")
        .map(ToString::to_string)
        .unwrap_or_else(|| "7".to_string());
    template.replace("{max_steps}", &max_steps)
}

/// System prompt, then replayed prior turns, then the live request rendered as
/// `key: value` lines in key order.
pub fn render(request: &OracleRequest) -> ChatPayload {
    let mut messages = Vec::with_capacity(2 + request.prior_turns.len() * 2);
    messages.push(ChatMessage::new(ChatRole::System, system_prompt(request)));
    for turn in &request.prior_turns {
        messages.push(ChatMessage::new(ChatRole::User, turn.user.clone()));
        messages.push(ChatMessage::new(ChatRole::Assistant, turn.assistant.clone()));
    }

    let mut body = request
        .context_fields
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");
    if request.purpose.expects_json() {
        body.push_str("\n\nReturn ONLY valid JSON. Do not explain.");
    }
    messages.push(ChatMessage::new(ChatRole::User, body));

    ChatPayload {
        messages,
        json_output: request.purpose.expects_json(),
    }
}

#[derive(Debug, Deserialize)]
struct FewShotExample {
    user: String,
    assistant: Value,
}

/// Loads `[{"user": "...", "assistant": {...}}]` example turns. Object answers are
/// replayed as their JSON text.
pub fn load_prior_turns(path: &Path) -> Result<Vec<PriorTurn>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read few-shot file {}", path.display()))?;
    let examples: Vec<FewShotExample> = serde_json::from_str(&text)
        .with_context(|| format!("few-shot file {} is not a JSON array", path.display()))?;

    Ok(examples
        .into_iter()
        .map(|example| PriorTurn {
            user: example.user,
            assistant: match example.assistant {
                Value::String(text) => text,
                other => other.to_string(),
            },
        })
        .collect())
}
