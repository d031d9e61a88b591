use crate::ambient::{self, AmbientScene};
use crate::dashboard::{DashboardError, DashboardService, RenderOutput, SessionState, Trigger};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error("event seq {seq} is not newer than {last}")]
    Stale { seq: u64, last: u64 },
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

#[derive(Debug, Default)]
struct Session {
    state: SessionState,
    last_theme: Option<String>,
    last_seq: u64,
}

/// Result of one accepted event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub seq: u64,
    pub output: RenderOutput,
    /// Only present when the theme changed since the previous render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient: Option<AmbientScene>,
}

/// Per-session UI state. The map lock is only held for lookups and inserts;
/// each session has its own lock that spans a whole event.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(Session::default())));
        tracing::info!("Created session {}", id);
        id
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn state(&self, id: Uuid) -> Result<SessionState, SessionError> {
        let entry = self.entry(id).await?;
        let session = entry.lock().await;
        Ok(session.state)
    }

    pub async fn dispatch(
        &self,
        service: &DashboardService,
        id: Uuid,
        seq: Option<u64>,
        trigger: Trigger,
        city: &str,
    ) -> Result<EventOutcome, SessionError> {
        self.dispatch_at(service, id, seq, trigger, city, service.now())
            .await
    }

    /// Run one event against a session. Without `seq` the event is numbered
    /// after the last accepted one.
    pub async fn dispatch_at(
        &self,
        service: &DashboardService,
        id: Uuid,
        seq: Option<u64>,
        trigger: Trigger,
        city: &str,
        now: DateTime<Tz>,
    ) -> Result<EventOutcome, SessionError> {
        let entry = self.entry(id).await?;
        let mut session = entry.lock().await;

        let seq = match seq {
            Some(seq) if seq <= session.last_seq => {
                return Err(SessionError::Stale {
                    seq,
                    last: session.last_seq,
                })
            }
            Some(seq) => seq,
            None => session.last_seq.checked_add(1).ok_or(SessionError::Stale {
                seq: u64::MAX,
                last: session.last_seq,
            })?,
        };

        let (state, output) = service.handle_at(&session.state, trigger, city, now).await?;

        let ambient = if session.last_theme.as_deref() != Some(output.theme_class.as_str()) {
            let seed = ambient::fresh_seed();
            tracing::debug!("Session {} theme now {:?}, seed {}", id, output.theme_class, seed);
            Some(ambient::generate_for_theme(&output.theme_class, seed))
        } else {
            None
        };

        session.state = state;
        session.last_theme = Some(output.theme_class.clone());
        session.last_seq = seq;

        Ok(EventOutcome {
            seq,
            output,
            ambient,
        })
    }
}
