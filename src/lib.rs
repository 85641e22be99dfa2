pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    attempt_service::AttemptService,
    question_bank::QuestionBank,
    quiz_engine::{QuizEngine, QuizTimings},
    quiz_runtime::QuizRuntime,
    quiz_service::QuizService,
    session_store::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<QuestionBank>,
    pub engine: Arc<QuizEngine>,
    pub attempt_service: AttemptService,
    runtimes: Arc<Mutex<HashMap<String, Arc<QuizRuntime>>>>,
}

impl AppState {
    pub fn new(config: &Config, bank: QuestionBank, store: Arc<dyn SessionStore>) -> Self {
        let timings = QuizTimings {
            countdown_seconds: config.countdown_seconds,
            break_seconds: config.break_seconds,
        };
        let engine = Arc::new(QuizEngine::new(&bank, timings));
        let attempt_service = AttemptService::new(store, config.max_attempts);

        Self {
            bank: Arc::new(bank),
            engine,
            attempt_service,
            runtimes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ensure_quiz(&self, quiz_id: &str) -> Result<()> {
        if self.bank.quiz_id == quiz_id {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Quiz '{}' not found", quiz_id)))
        }
    }

    /// Returns the live runtime for a quiz, creating a fresh one on first use.
    pub async fn runtime(&self, quiz_id: &str) -> Result<Arc<QuizRuntime>> {
        self.ensure_quiz(quiz_id)?;
        let mut runtimes = self.runtimes.lock().await;
        let runtime = runtimes
            .entry(quiz_id.to_string())
            .or_insert_with(|| {
                tracing::info!(quiz_id, "Creating quiz runtime");
                Arc::new(QuizRuntime::new(QuizService::new(
                    self.engine.clone(),
                    self.attempt_service.clone(),
                )))
            })
            .clone();
        Ok(runtime)
    }

    /// Tears down a quiz runtime, as when the player navigates away.
    pub async fn leave(&self, quiz_id: &str) -> Result<bool> {
        self.ensure_quiz(quiz_id)?;
        let removed = self.runtimes.lock().await.remove(quiz_id);
        match removed {
            Some(runtime) => {
                runtime.shutdown().await;
                tracing::info!(quiz_id, "Quiz runtime torn down");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn shutdown(&self) {
        let runtimes: Vec<_> = self.runtimes.lock().await.drain().collect();
        for (quiz_id, runtime) in runtimes {
            runtime.shutdown().await;
            tracing::info!(%quiz_id, "Quiz runtime stopped");
        }
    }
}
