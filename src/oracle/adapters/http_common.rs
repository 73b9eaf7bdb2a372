use serde_json::{Value, json};

use crate::oracle::{
    error::{OracleError, malformed_response, timeout, unreachable},
    types::{ChatMessage, ChatRole},
};

pub fn role_to_wire(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

pub fn messages_to_openai(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": role_to_wire(message.role),
                "content": message.content,
            })
        })
        .collect()
}

/// Gateway timeouts from the backend count as timeouts; any other non-2xx status means
/// the oracle could not answer.
pub fn map_http_error(status: u16, body: &str) -> OracleError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 408 || status == 504 {
        timeout(format!("backend returned status {status}"))
    } else {
        unreachable(format!("backend returned status {status}"))
    }
    .with_http_status(status);

    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }
    err
}

pub fn extract_message_content(body: &Value) -> Result<String, OracleError> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed_response("response has no choices[0].message.content"))
}
