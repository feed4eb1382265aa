// src/exam/timer.rs

//! Time budget countdown for an attempt in progress.
//!
//! The countdown lives in memory only. Whoever drives the session calls
//! [`AttemptTimer::tick`] once per second; pausing just stops those ticks
//! from counting.

use std::fmt;

use serde::Serialize;

/// Seconds below which the remaining time is shown as critical.
pub const CRITICAL_SECS: u32 = 120;
/// Seconds below which the remaining time is shown as a warning.
pub const WARNING_SECS: u32 = 600;

/// Outcome of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Running(u32),
    Paused,
    Expired,
}

/// How close the countdown is to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone)]
pub struct AttemptTimer {
    remaining: u32,
    running: bool,
}

impl AttemptTimer {
    /// Starts a running countdown of `time_limit` minutes.
    pub fn new(time_limit_minutes: u32) -> Self {
        Self::from_secs(time_limit_minutes.saturating_mul(60))
    }

    pub fn from_secs(secs: u32) -> Self {
        Self {
            remaining: secs,
            running: true,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_paused(&self) -> bool {
        !self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Counts one second down.
    pub fn tick(&mut self) -> TimerTick {
        if !self.running {
            return TimerTick::Paused;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TimerTick::Expired
        } else {
            TimerTick::Running(self.remaining)
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resumes the countdown. Refused once the budget is spent.
    pub fn resume(&mut self) -> bool {
        if self.is_expired() {
            return false;
        }
        self.running = true;
        true
    }

    pub fn urgency(&self) -> Urgency {
        if self.remaining < CRITICAL_SECS {
            Urgency::Critical
        } else if self.remaining < WARNING_SECS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

impl fmt::Display for AttemptTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}
