//! Deterministic stand-ins for the oracle and the lifecycle sink, for tests.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    oracle::{Oracle, OracleError, OracleErrorKind, OraclePurpose, OracleRequest, RawResult},
    orchestrator::{LifecycleEvent, LifecycleSink},
};

pub type OracleFuture = Pin<Box<dyn Future<Output = Result<RawResult, OracleError>> + Send>>;

pub type OracleHook = Arc<dyn Fn(OracleRequest) -> OracleFuture + Send + Sync>;

pub fn boxed<T>(
    future: impl Future<Output = T> + Send + 'static,
) -> Pin<Box<dyn Future<Output = T> + Send>>
where
    T: Send + 'static,
{
    Box::pin(future)
}

/// Oracle answering from per-purpose hooks. Purposes without a hook fail as
/// unreachable, so a test only scripts the calls it expects.
#[derive(Default)]
pub struct ScriptedOracle {
    hooks: HashMap<OraclePurpose, OracleHook>,
    fallback: Option<OracleHook>,
    calls: AtomicUsize,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(mut self, purpose: OraclePurpose, hook: OracleHook) -> Self {
        self.hooks.insert(purpose, hook);
        self
    }

    /// Same content for every call with `purpose`.
    pub fn respond(self, purpose: OraclePurpose, content: impl Into<String>) -> Self {
        let content = content.into();
        self.hook(
            purpose,
            Arc::new(move |request: OracleRequest| -> OracleFuture {
                let raw = RawResult::new(request.request_id, content.clone());
                boxed(async move { Ok(raw) })
            }),
        )
    }

    /// One answer per call, in order. The last answer repeats once the queue drains.
    pub fn respond_in_order(self, purpose: OraclePurpose, contents: Vec<String>) -> Self {
        let last = contents.last().cloned().unwrap_or_default();
        let queue = Arc::new(Mutex::new(VecDeque::from(contents)));
        self.hook(
            purpose,
            Arc::new(move |request: OracleRequest| -> OracleFuture {
                let content = queue
                    .lock()
                    .ok()
                    .and_then(|mut queue| queue.pop_front())
                    .unwrap_or_else(|| last.clone());
                let raw = RawResult::new(request.request_id, content);
                boxed(async move { Ok(raw) })
            }),
        )
    }

    pub fn fail(self, purpose: OraclePurpose, kind: OracleErrorKind) -> Self {
        self.hook(purpose, failing_hook(kind))
    }

    /// Every purpose without its own hook fails with `kind`.
    pub fn fail_everything(mut self, kind: OracleErrorKind) -> Self {
        self.fallback = Some(failing_hook(kind));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn purposes(&self) -> Vec<OraclePurpose> {
        self.requests()
            .into_iter()
            .map(|request| request.purpose)
            .collect()
    }
}

fn failing_hook(kind: OracleErrorKind) -> OracleHook {
    Arc::new(move |_request: OracleRequest| -> OracleFuture {
        boxed(async move { Err(OracleError::new(kind, "scripted oracle failure")) })
    })
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, request: OracleRequest) -> Result<RawResult, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let hook = self
            .hooks
            .get(&request.purpose)
            .or(self.fallback.as_ref())
            .cloned();
        match hook {
            Some(hook) => hook(request).await,
            None => Err(OracleError::new(
                OracleErrorKind::Unreachable,
                format!("no scripted answer for {}", request.purpose.as_str()),
            )),
        }
    }
}

/// Keeps every lifecycle event in emission order.
#[derive(Default)]
pub struct RecordingLifecycleSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingLifecycleSink {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl LifecycleSink for RecordingLifecycleSink {
    fn on_event(&self, event: LifecycleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
