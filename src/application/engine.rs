use crate::application::recorder::SessionRecorder;
use crate::domain::models::{Phase, SessionRecord};
use crate::domain::timer::{IntervalTimer, TimerSnapshot};
use crate::infrastructure::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;

type PhaseCallback = Arc<dyn Fn(Phase) + Send + Sync>;

/// Drives an [`IntervalTimer`] on a background tick and records phase
/// boundaries to the session log.
///
/// A start record is written only when a phase begins from its full
/// duration; resuming a paused countdown does not re-record. A skip flips
/// the phase without writing anything, since the abandoned phase never ran
/// to completion.
#[derive(Clone)]
pub struct TimerEngine {
    timer: Arc<Mutex<IntervalTimer>>,
    recorder: Arc<SessionRecorder>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    on_phase_complete: Option<PhaseCallback>,
}

impl TimerEngine {
    pub fn new(
        study_duration_seconds: u32,
        break_duration_seconds: u32,
        recorder: Arc<SessionRecorder>,
    ) -> Self {
        Self {
            timer: Arc::new(Mutex::new(IntervalTimer::new(
                study_duration_seconds,
                break_duration_seconds,
            ))),
            recorder,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            on_phase_complete: None,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_phase_callback(mut self, callback: PhaseCallback) -> Self {
        self.on_phase_complete = Some(callback);
        self
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.timer.lock().await.snapshot()
    }

    pub async fn start(&self) -> Result<TimerSnapshot, AppError> {
        {
            let mut timer = self.timer.lock().await;
            if !timer.is_running() {
                if timer.at_phase_start() {
                    let phase = timer.phase();
                    let duration = timer.duration_of(phase);
                    self.recorder.record_phase_start(phase, duration)?;
                }
                timer.start();
            }
        }
        self.spawn_ticker().await;
        Ok(self.snapshot().await)
    }

    pub async fn pause(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        let mut timer = self.timer.lock().await;
        timer.pause();
        timer.snapshot()
    }

    pub async fn reset(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        let mut timer = self.timer.lock().await;
        timer.reset();
        timer.snapshot()
    }

    /// Flips to the other phase immediately. The completion callback fires
    /// for the abandoned phase, but no record is written for it.
    pub async fn skip(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        let (completed, snapshot) = {
            let mut timer = self.timer.lock().await;
            let completed = timer.skip();
            (completed, timer.snapshot())
        };
        if let Some(callback) = &self.on_phase_complete {
            callback(completed);
        }
        snapshot
    }

    pub async fn set_study_duration(&self, seconds: u32) -> TimerSnapshot {
        let mut timer = self.timer.lock().await;
        timer.set_study_duration(seconds);
        timer.snapshot()
    }

    pub async fn set_break_duration(&self, seconds: u32) -> TimerSnapshot {
        let mut timer = self.timer.lock().await;
        timer.set_break_duration(seconds);
        timer.snapshot()
    }

    pub fn history(&self) -> Result<Vec<SessionRecord>, AppError> {
        self.recorder.history()
    }

    pub fn clear_history(&self) -> Result<(), AppError> {
        self.recorder.clear_history()
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let timer = self.timer.clone();
        let recorder = self.recorder.clone();
        let tick_interval = self.tick_interval;
        let on_phase_complete = self.on_phase_complete.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The first tick of a tokio interval fires immediately; consume
            // it so the countdown loses its first second a full tick later.
            interval.tick().await;
            loop {
                interval.tick().await;

                let completed = {
                    let mut guard = timer.lock().await;
                    if !guard.is_running() {
                        break;
                    }
                    let completed = guard.tick();
                    if let Some(completed) = completed {
                        let completed_duration = guard.duration_of(completed);
                        let next = guard.phase();
                        let next_duration = guard.duration_of(next);
                        if let Err(error) =
                            recorder.record_phase_complete(completed, completed_duration)
                        {
                            tracing::error!("failed recording phase completion: {error}");
                        }
                        if let Err(error) = recorder.record_phase_start(next, next_duration) {
                            tracing::error!("failed recording phase start: {error}");
                        }
                    }
                    completed
                };

                if let Some(completed) = completed {
                    tracing::info!(phase = completed.as_str(), "phase completed");
                    if let Some(callback) = &on_phase_complete {
                        callback(completed);
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
