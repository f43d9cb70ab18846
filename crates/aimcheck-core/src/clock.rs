use serde::{Deserialize, Serialize};

/// Default countdown length in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 30;
/// Seconds remaining at which the countdown enters its warning phase.
pub const DEFAULT_WARNING_SECS: u32 = 10;
/// Period of one clock tick in logical milliseconds.
pub const CLOCK_TICK_MS: u64 = 1000;

/// Result of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The clock is stopped; nothing changed.
    Stopped,
    Running {
        time_left: u32,
        /// True only on the tick that crossed into the warning threshold.
        warning_started: bool,
    },
    /// The tick that brought `time_left` to zero. The clock stops itself.
    Expired,
}

/// Whole-second countdown that drives challenge timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeClock {
    duration_secs: u32,
    warning_secs: u32,
    time_left: u32,
    running: bool,
    warning: bool,
}

impl ChallengeClock {
    pub fn new(duration_secs: u32, warning_secs: u32) -> Self {
        Self {
            duration_secs,
            warning_secs,
            time_left: duration_secs,
            running: false,
            warning: false,
        }
    }

    /// Rewind to the full duration and start counting.
    pub fn start(&mut self) {
        self.time_left = self.duration_secs;
        self.warning = self.duration_secs <= self.warning_secs;
        self.running = true;
    }

    /// Freeze the countdown where it is.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop and rewind to the full duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.time_left = self.duration_secs;
        self.warning = false;
    }

    /// Count down one second. Never goes below zero.
    pub fn tick(&mut self) -> ClockTick {
        if !self.running {
            return ClockTick::Stopped;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.running = false;
            return ClockTick::Expired;
        }
        let warning_started = !self.warning && self.time_left <= self.warning_secs;
        if warning_started {
            self.warning = true;
        }
        ClockTick::Running {
            time_left: self.time_left,
            warning_started,
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_warning(&self) -> bool {
        self.warning
    }
}

impl Default for ChallengeClock {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS, DEFAULT_WARNING_SECS)
    }
}
