use crate::domain::models::{Phase, SessionRecord};
use crate::infrastructure::error::AppError;
use crate::infrastructure::session_log::SessionLogStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Writes session records to the log as phases begin and end.
///
/// Record ids are derived from the start timestamp in milliseconds and are
/// strictly increasing even when two phases start within the same
/// millisecond.
pub struct SessionRecorder {
    store: Arc<dyn SessionLogStore>,
    last_id: AtomicI64,
    now_provider: NowProvider,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionLogStore>) -> Self {
        Self {
            store,
            last_id: AtomicI64::new(0),
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        // fetch_update yields the previous value; recompute the stored one.
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |previous| {
                Some(candidate.max(previous + 1))
            })
            .map(|previous| candidate.max(previous + 1))
            .unwrap_or(candidate)
    }

    fn record(&self, phase: Phase, duration_seconds: u32, completed: bool) -> Result<SessionRecord, AppError> {
        let now = (self.now_provider)();
        let record = SessionRecord {
            id: self.next_id(now),
            kind: phase,
            started_at: now,
            duration_seconds,
            completed,
        };
        record.validate().map_err(AppError::Validation)?;
        self.store.append(&record)?;
        tracing::debug!(
            phase = phase.as_str(),
            completed,
            id = record.id,
            "recorded session event"
        );
        Ok(record)
    }

    pub fn record_phase_start(
        &self,
        phase: Phase,
        duration_seconds: u32,
    ) -> Result<SessionRecord, AppError> {
        self.record(phase, duration_seconds, false)
    }

    pub fn record_phase_complete(
        &self,
        phase: Phase,
        duration_seconds: u32,
    ) -> Result<SessionRecord, AppError> {
        self.record(phase, duration_seconds, true)
    }

    pub fn history(&self) -> Result<Vec<SessionRecord>, AppError> {
        self.store.load_all()
    }

    pub fn clear_history(&self) -> Result<(), AppError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::session_log::InMemorySessionLog;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn frozen_recorder(at: &str) -> SessionRecorder {
        let instant = fixed_time(at);
        SessionRecorder::new(Arc::new(InMemorySessionLog::default()))
            .with_now_provider(Arc::new(move || instant))
    }

    #[test]
    fn phase_start_appends_incomplete_record() {
        let recorder = frozen_recorder("2026-02-16T09:00:00Z");
        let record = recorder
            .record_phase_start(Phase::Study, 7200)
            .expect("record start");

        assert_eq!(record.kind, Phase::Study);
        assert_eq!(record.duration_seconds, 7200);
        assert!(!record.completed);
        assert_eq!(record.id, fixed_time("2026-02-16T09:00:00Z").timestamp_millis());

        let history = recorder.history().expect("history");
        assert_eq!(history, vec![record]);
    }

    #[test]
    fn phase_complete_appends_new_record_not_update() {
        let recorder = frozen_recorder("2026-02-16T09:00:00Z");
        recorder
            .record_phase_start(Phase::Break, 300)
            .expect("start");
        recorder
            .record_phase_complete(Phase::Break, 300)
            .expect("complete");

        let history = recorder.history().expect("history");
        assert_eq!(history.len(), 2);
        assert!(!history[0].completed);
        assert!(history[1].completed);
    }

    #[test]
    fn ids_stay_strictly_increasing_under_a_frozen_clock() {
        let recorder = frozen_recorder("2026-02-16T09:00:00Z");
        let first = recorder
            .record_phase_start(Phase::Study, 3600)
            .expect("first");
        let second = recorder
            .record_phase_start(Phase::Study, 3600)
            .expect("second");
        let third = recorder
            .record_phase_complete(Phase::Study, 3600)
            .expect("third");

        assert!(second.id > first.id);
        assert!(third.id > second.id);
    }

    #[test]
    fn ids_follow_the_clock_when_it_advances() {
        let recorder = frozen_recorder("2026-02-16T09:00:00Z");
        let early = recorder
            .record_phase_start(Phase::Study, 3600)
            .expect("early");

        let later = fixed_time("2026-02-16T10:00:00Z");
        let recorder = recorder.with_now_provider(Arc::new(move || later));
        let late = recorder
            .record_phase_start(Phase::Study, 3600)
            .expect("late");

        assert_eq!(late.id, later.timestamp_millis());
        assert!(late.id > early.id);
    }

    #[test]
    fn clear_history_empties_the_log() {
        let recorder = frozen_recorder("2026-02-16T09:00:00Z");
        recorder
            .record_phase_start(Phase::Study, 7200)
            .expect("start");
        recorder.clear_history().expect("clear");
        assert!(recorder.history().expect("history").is_empty());
    }
}
