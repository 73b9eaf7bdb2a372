//! Turns raw oracle output into well-typed results. Validation never fails: anything
//! missing or malformed is replaced by a documented default and recorded as a fallback.

pub mod fallback;
pub mod schema;
pub mod types;

use serde_json::{Map, Value};

use crate::oracle::RawResult;

pub use fallback::FallbackContext;
pub use schema::{Fields, GuidanceContext, PlanContext, RecheckContext, Schema};
pub use types::{
    ActionPlan, Classification, Fallback, FallbackReason, RecheckVerdict, RiskAssessment,
    Validated,
};

pub fn validate<S: Schema>(raw: &RawResult, ctx: &S::Context) -> Validated<S> {
    let validated = validate_content::<S>(&raw.content, ctx);
    for fallback in validated.fallbacks() {
        tracing::info!(
            target: "validator",
            request_id = %raw.request_id,
            kind = S::KIND,
            field = %fallback.field,
            reason = ?fallback.reason,
            "validation_fallback"
        );
    }
    validated
}

pub fn validate_content<S: Schema>(content: &str, ctx: &S::Context) -> Validated<S> {
    let mut fallbacks = Vec::new();
    let map = parse_mapping(content, &mut fallbacks);
    let value = S::conform(&mut Fields::new(&map, &mut fallbacks), ctx);
    Validated::from_parts(value, fallbacks)
}

fn parse_mapping(content: &str, fallbacks: &mut Vec<Fallback>) -> Map<String, Value> {
    let body = strip_code_fence(content);
    let parsed = serde_json::from_str::<Value>(body).or_else(|err| {
        // Prose around a single object is common enough to retry on the outermost braces.
        match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<Value>(&body[start..=end])
            }
            _ => Err(err),
        }
    });

    match parsed {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            fallbacks.push(Fallback::new("$", FallbackReason::NotAMapping));
            Map::new()
        }
        Err(_) => {
            fallbacks.push(Fallback::new("$", FallbackReason::Unparseable));
            Map::new()
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
