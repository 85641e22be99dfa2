use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::quiz_session::QuizSession;
use crate::services::session_store::{session_key, SessionStore};

/// Gates how many times a member may start a quiz. Counts only go down here;
/// `max_attempts` is applied once, when a session is first registered.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn SessionStore>,
    max_attempts: i32,
}

impl AttemptService {
    pub fn new(store: Arc<dyn SessionStore>, max_attempts: i32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    pub fn load(&self, quiz_id: &str) -> Result<Option<QuizSession>> {
        self.store.get(&session_key(quiz_id))
    }

    pub fn register(&self, quiz_id: &str, membership_id: &str) -> Result<QuizSession> {
        let key = session_key(quiz_id);
        if let Some(existing) = self.store.get(&key)? {
            if existing.membership_id != membership_id {
                tracing::warn!(
                    quiz_id,
                    "Ignoring registration for a different member; session already exists"
                );
            }
            return Ok(existing);
        }

        let session = QuizSession::new(membership_id, self.max_attempts);
        self.store.set(&key, &session)?;
        tracing::info!(quiz_id, attempts_left = session.attempts_left, "Registered quiz session");
        Ok(session)
    }

    /// Consumes one attempt and persists the decremented session before returning it.
    pub fn start(&self, quiz_id: &str) -> Result<QuizSession> {
        let key = session_key(quiz_id);
        let mut session = self
            .store
            .get(&key)?
            .ok_or_else(|| Error::NoSession(quiz_id.to_string()))?;

        if !session.can_start() {
            tracing::info!(quiz_id, attempts_left = session.attempts_left, "Attempt denied");
            return Err(Error::AttemptsExhausted {
                attempts_left: session.attempts_left,
            });
        }

        session.attempts_left -= 1;
        self.store.set(&key, &session)?;
        tracing::info!(quiz_id, attempts_left = session.attempts_left, "Attempt granted");
        Ok(session)
    }
}
