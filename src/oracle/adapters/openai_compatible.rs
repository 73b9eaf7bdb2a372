use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::{Value, json};

use crate::oracle::{
    adapters::{BackendAdapter, http_common},
    error::{OracleError, malformed_response, timeout, unreachable},
    types::{AdapterContext, ChatPayload, RawResult},
};

#[derive(Clone)]
pub struct OpenAiCompatibleAdapter {
    client: Client,
}

impl Default for OpenAiCompatibleAdapter {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
        }
    }
}

#[async_trait]
impl BackendAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    async fn complete(
        &self,
        ctx: AdapterContext,
        payload: ChatPayload,
    ) -> Result<RawResult, OracleError> {
        let url = format!("{}/chat/completions", ctx.endpoint.trim_end_matches('/'));

        let mut body = json!({
            "model": ctx.model,
            "messages": http_common::messages_to_openai(&payload.messages),
            "temperature": ctx.temperature,
            "stream": false,
        });
        if payload.json_output {
            body["response_format"] = json!({"type": "json_object"});
        }
        if let Some(max_tokens) = ctx.max_output_tokens {
            body["max_tokens"] = Value::Number(max_tokens.into());
        }

        let mut request = self
            .client
            .post(url)
            .timeout(ctx.timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", ctx.request_id.as_str())
            .json(&body);
        if let Some(auth_header) = &ctx.credential.auth_header {
            request = request.header(header::AUTHORIZATION, auth_header);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                timeout(format!("oracle request timed out: {err}"))
            } else {
                unreachable(format!("oracle request failed: {err}"))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            if err.is_timeout() {
                timeout(format!("oracle response timed out: {err}"))
            } else {
                unreachable(format!("failed to read oracle response: {err}"))
            }
        })?;
        if !status.is_success() {
            return Err(http_common::map_http_error(status.as_u16(), &text));
        }

        let parsed = serde_json::from_str::<Value>(&text)
            .map_err(|err| malformed_response(format!("oracle body is not JSON: {err}")))?;
        let content = http_common::extract_message_content(&parsed)?;
        Ok(RawResult::new(ctx.request_id, content))
    }
}
