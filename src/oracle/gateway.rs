use std::{sync::Arc, time::Instant};

use async_trait::async_trait;

use crate::oracle::{
    Oracle,
    adapters::{BackendAdapter, openai_compatible::OpenAiCompatibleAdapter},
    credentials::{CredentialProvider, EnvCredentialProvider},
    error::{OracleError, timeout},
    prompts,
    telemetry::{NoopTelemetrySink, OracleTelemetryEvent, TelemetrySink},
    types::{AdapterContext, OracleConfig, OracleRequest, RawResult},
};

/// Single-shot oracle access: one backend call per request, bounded by the configured
/// timeout, never retried.
pub struct OracleGateway {
    config: OracleConfig,
    adapter: Arc<dyn BackendAdapter>,
    credential_provider: Arc<dyn CredentialProvider>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl OracleGateway {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            adapter: Arc::new(OpenAiCompatibleAdapter::default()),
            credential_provider: Arc::new(EnvCredentialProvider),
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credential_provider = provider;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    async fn call_backend(&self, request: &OracleRequest) -> Result<RawResult, OracleError> {
        let credential = self
            .credential_provider
            .resolve(&self.config.credential)
            .await?;
        let ctx = AdapterContext {
            request_id: request.request_id.clone(),
            endpoint: self.config.endpoint.clone(),
            model: self.config.model.clone(),
            credential,
            timeout: self.config.request_timeout(),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };
        let payload = prompts::render(request);

        match tokio::time::timeout(
            self.config.request_timeout(),
            self.adapter.complete(ctx, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(timeout(format!(
                "oracle did not answer within {}ms",
                self.config.request_timeout_ms
            ))),
        }
    }
}

#[async_trait]
impl Oracle for OracleGateway {
    async fn invoke(&self, request: OracleRequest) -> Result<RawResult, OracleError> {
        let started_at = Instant::now();
        self.telemetry.on_event(OracleTelemetryEvent::RequestStarted {
            request_id: request.request_id.clone(),
            purpose: request.purpose,
            model: self.config.model.clone(),
        });

        let result = self.call_backend(&request).await;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        match &result {
            Ok(raw) => {
                self.telemetry.on_event(OracleTelemetryEvent::RequestCompleted {
                    request_id: request.request_id.clone(),
                    purpose: request.purpose,
                    elapsed_ms,
                    content_chars: raw.content.chars().count(),
                });
                tracing::debug!(
                    target: "oracle",
                    request_id = %request.request_id,
                    adapter = self.adapter.name(),
                    purpose = request.purpose.as_str(),
                    elapsed_ms = elapsed_ms,
                    "oracle_invoked"
                );
            }
            Err(err) => {
                self.telemetry.on_event(OracleTelemetryEvent::RequestFailed {
                    request_id: request.request_id.clone(),
                    purpose: request.purpose,
                    elapsed_ms,
                    kind: err.kind,
                });
                tracing::warn!(
                    target: "oracle",
                    request_id = %request.request_id,
                    adapter = self.adapter.name(),
                    purpose = request.purpose.as_str(),
                    elapsed_ms = elapsed_ms,
                    error_kind = err.kind.as_str(),
                    error = %err,
                    "oracle_invoke_failed"
                );
            }
        }
        result
    }
}
