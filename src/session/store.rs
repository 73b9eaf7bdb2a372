use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::{
    session::{
        error::{SessionError, unknown_session, unknown_step},
        invariants::reconcile_in_place,
        record::SessionRecord,
    },
    types::{SessionId, StepId},
};

/// Exclusive access to one session for the duration of a run. Mutations are applied
/// in place, so whatever a run committed before being dropped stays in the store.
pub type SessionLease = OwnedMutexGuard<SessionRecord>;

/// In-memory keyed store. Each record sits behind its own lock: runs on one session
/// are serialized, different sessions proceed in parallel.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionRecord>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leases the session, creating it on first contact. A fresh id is minted when none
    /// is given.
    pub async fn open(&self, session_id: Option<SessionId>) -> SessionLease {
        let session_id = session_id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let existing = self.sessions.read().await.get(&session_id).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut sessions = self.sessions.write().await;
                let slot = sessions.entry(session_id.clone()).or_insert_with(|| {
                    tracing::info!(target: "session", session_id = %session_id, "session_created");
                    Arc::new(Mutex::new(SessionRecord::new(session_id.clone())))
                });
                Arc::clone(slot)
            }
        };
        slot.lock_owned().await
    }

    /// Leases an existing session.
    pub async fn lease(&self, session_id: &str) -> Result<SessionLease, SessionError> {
        let slot = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| unknown_session(session_id))?;
        Ok(slot.lock_owned().await)
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let lease = self.lease(session_id).await?;
        Ok(lease.clone())
    }

    /// Records a user-confirmed step. Only ids in the current plan are accepted.
    pub async fn complete_step(
        &self,
        session_id: &str,
        step_id: StepId,
    ) -> Result<BTreeSet<StepId>, SessionError> {
        let mut lease = self.lease(session_id).await?;
        if !lease.current_plan.iter().any(|step| step.step_id == step_id) {
            return Err(unknown_step(session_id, step_id));
        }
        lease.completed_steps.insert(step_id);
        reconcile_in_place(&mut lease);
        tracing::info!(
            target: "session",
            session_id = %session_id,
            step_id = step_id,
            completed = lease.completed_steps.len(),
            "step_completed"
        );
        Ok(lease.completed_steps.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
