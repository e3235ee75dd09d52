use crate::domain::models::Phase;
use serde::Serialize;

/// Two-state interval countdown: Study -> Break -> Study -> ...
///
/// All operations are total over valid state. Completions are reported as
/// return values (the phase that just ended) rather than fired as side
/// effects, so callers decide what a completion means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    phase: Phase,
    remaining_seconds: u32,
    running: bool,
    study_duration_seconds: u32,
    break_duration_seconds: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub running: bool,
    pub study_duration_seconds: u32,
    pub break_duration_seconds: u32,
}

impl IntervalTimer {
    pub fn new(study_duration_seconds: u32, break_duration_seconds: u32) -> Self {
        Self {
            phase: Phase::Study,
            remaining_seconds: study_duration_seconds,
            running: false,
            study_duration_seconds,
            break_duration_seconds,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Study => self.study_duration_seconds,
            Phase::Break => self.break_duration_seconds,
        }
    }

    /// True when the current phase has not lost any seconds yet.
    pub fn at_phase_start(&self) -> bool {
        self.remaining_seconds == self.duration_of(self.phase)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            running: self.running,
            study_duration_seconds: self.study_duration_seconds,
            break_duration_seconds: self.break_duration_seconds,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Study;
        self.remaining_seconds = self.study_duration_seconds;
    }

    /// Forces an immediate transition to the other phase and reports the
    /// abandoned phase as completed. The timer is left paused.
    pub fn skip(&mut self) -> Phase {
        self.running = false;
        let completed = self.phase;
        self.flip();
        completed
    }

    /// Advances the countdown by one second. Returns the phase that just
    /// ended when this tick reaches zero; `None` otherwise or while paused.
    pub fn tick(&mut self) -> Option<Phase> {
        if !self.running {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return None;
        }
        let completed = self.phase;
        self.flip();
        Some(completed)
    }

    /// While paused and in the Study phase, the countdown is reloaded with
    /// the new duration. A running countdown is never altered in flight.
    pub fn set_study_duration(&mut self, seconds: u32) {
        self.study_duration_seconds = seconds;
        if !self.running && self.phase == Phase::Study {
            self.remaining_seconds = seconds;
        }
    }

    pub fn set_break_duration(&mut self, seconds: u32) {
        self.break_duration_seconds = seconds;
        if !self.running && self.phase == Phase::Break {
            self.remaining_seconds = seconds;
        }
    }

    fn flip(&mut self) {
        self.phase = self.phase.other();
        self.remaining_seconds = self.duration_of(self.phase);
    }
}
