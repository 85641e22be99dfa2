use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dto::quiz_dto::{QuizResultsResponse, QuizView};
use crate::error::Result;
use crate::services::quiz_engine::UserIntent;
use crate::services::quiz_service::QuizService;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

struct Ticker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Ticker {
    fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Drives a [`QuizService`] in real time. At most one ticker task exists per
/// runtime and it never touches the state once cancelled.
pub struct QuizRuntime {
    service: Arc<Mutex<QuizService>>,
    ticker: Mutex<Option<Ticker>>,
    period: Duration,
}

impl QuizRuntime {
    pub fn new(service: QuizService) -> Self {
        Self::with_period(service, TICK_PERIOD)
    }

    pub fn with_period(service: QuizService, period: Duration) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            ticker: Mutex::new(None),
            period,
        }
    }

    pub async fn view(&self) -> Result<QuizView> {
        Ok(self.service.lock().await.view())
    }

    pub async fn results(&self) -> Result<QuizResultsResponse> {
        self.service.lock().await.results()
    }

    /// The ticker is synced before the service lock is released.
    pub async fn dispatch(&self, intent: UserIntent) -> Result<QuizView> {
        let mut service = self.service.lock().await;
        let outcome = service.handle(intent);
        self.sync_ticker(service.live_timer().is_some()).await;
        outcome?;
        Ok(service.view())
    }

    pub async fn ticker_running(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map(Ticker::is_running)
            .unwrap_or(false)
    }

    /// Stops the ticker; pending ticks are discarded.
    pub async fn shutdown(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.stop();
            tracing::debug!("Quiz ticker cancelled on shutdown");
        }
    }

    /// Callers hold the service lock. Lock order is service, then ticker slot.
    async fn sync_ticker(&self, live: bool) {
        let mut slot = self.ticker.lock().await;
        let running = slot.as_ref().map(Ticker::is_running).unwrap_or(false);

        match (live, running) {
            (true, false) => {
                if let Some(old) = slot.take() {
                    old.stop();
                }
                let cancel = CancellationToken::new();
                let task = spawn_ticker(Arc::downgrade(&self.service), cancel.clone(), self.period);
                *slot = Some(Ticker { cancel, task });
            }
            (false, true) => {
                if let Some(old) = slot.take() {
                    old.stop();
                }
            }
            _ => {}
        }
    }
}

impl Drop for QuizRuntime {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.get_mut().take() {
            ticker.stop();
        }
    }
}

fn spawn_ticker(
    service: Weak<Mutex<QuizService>>,
    cancel: CancellationToken,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let Some(service) = service.upgrade() else { break };
                    let mut service = service.lock().await;
                    // teardown may have raced with the lock
                    if cancel.is_cancelled() {
                        break;
                    }
                    service.tick();
                    if service.live_timer().is_none() {
                        cancel.cancel();
                        break;
                    }
                }
            }
        }
        tracing::trace!("Quiz ticker stopped");
    })
}
