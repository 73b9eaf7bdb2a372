use std::sync::OnceLock;

use crate::oracle::{
    error::OracleErrorKind,
    types::{OraclePurpose, RequestId},
};

#[derive(Debug, Clone)]
pub enum OracleTelemetryEvent {
    RequestStarted {
        request_id: RequestId,
        purpose: OraclePurpose,
        model: String,
    },
    RequestCompleted {
        request_id: RequestId,
        purpose: OraclePurpose,
        elapsed_ms: u64,
        content_chars: usize,
    },
    RequestFailed {
        request_id: RequestId,
        purpose: OraclePurpose,
        elapsed_ms: u64,
        kind: OracleErrorKind,
    },
}

pub trait TelemetrySink: Send + Sync {
    fn on_event(&self, event: OracleTelemetryEvent);
}

pub fn oracle_debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("LIFELINE_DEBUG_ORACLE")
            .ok()
            .is_some_and(|raw| env_flag_enabled(&raw))
    })
}

fn env_flag_enabled(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "debug"
    )
}

#[derive(Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn on_event(&self, _event: OracleTelemetryEvent) {}
}

#[derive(Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn on_event(&self, event: OracleTelemetryEvent) {
        match event {
            OracleTelemetryEvent::RequestStarted {
                request_id,
                purpose,
                model,
            } => {
                tracing::debug!(
                    target: "oracle",
                    request_id = %request_id,
                    purpose = purpose.as_str(),
                    model = %model,
                    "request_started"
                );
            }
            OracleTelemetryEvent::RequestCompleted {
                request_id,
                purpose,
                elapsed_ms,
                content_chars,
            } => {
                tracing::debug!(
                    target: "oracle",
                    request_id = %request_id,
                    purpose = purpose.as_str(),
                    elapsed_ms = elapsed_ms,
                    content_chars = content_chars,
                    "request_completed"
                );
            }
            OracleTelemetryEvent::RequestFailed {
                request_id,
                purpose,
                elapsed_ms,
                kind,
            } => {
                tracing::warn!(
                    target: "oracle",
                    request_id = %request_id,
                    purpose = purpose.as_str(),
                    elapsed_ms = elapsed_ms,
                    kind = kind.as_str(),
                    "request_failed"
                );
            }
        }
    }
}
