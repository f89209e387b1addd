//! Match clock: a countdown per period, driven by an external tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchClock {
    current_period: u8,
    total_periods: u8,
    period_length_seconds: u32,
    seconds_remaining: u32,
    is_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock was stopped; nothing changed.
    Idle,
    Ticked,
    /// This tick used up the period. The clock has stopped but not advanced.
    PeriodExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodAdvance {
    Advanced(u8),
    /// Already in the final period; the clock is unchanged.
    MatchComplete,
}

impl MatchClock {
    pub fn new(total_periods: u8, period_length_seconds: u32) -> Result<Self> {
        if total_periods != 2 && total_periods != 4 {
            return Err(CoreError::InvalidMatchFormat(format!(
                "a match has 2 or 4 periods, not {total_periods}"
            )));
        }
        if period_length_seconds == 0 {
            return Err(CoreError::InvalidMatchFormat(
                "period length must be at least one second".into(),
            ));
        }
        if u32::from(total_periods).checked_mul(period_length_seconds).is_none() {
            return Err(CoreError::InvalidMatchFormat(format!(
                "{total_periods} periods of {period_length_seconds}s is too long a match"
            )));
        }

        Ok(Self {
            current_period: 1,
            total_periods,
            period_length_seconds,
            seconds_remaining: period_length_seconds,
            is_running: false,
        })
    }

    /// Two 40 minute halves.
    pub fn fifteens() -> Self {
        Self {
            current_period: 1,
            total_periods: 2,
            period_length_seconds: 2400,
            seconds_remaining: 2400,
            is_running: false,
        }
    }

    pub fn current_period(&self) -> u8 {
        self.current_period
    }

    pub fn total_periods(&self) -> u8 {
        self.total_periods
    }

    pub fn period_length_seconds(&self) -> u32 {
        self.period_length_seconds
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_final_period(&self) -> bool {
        self.current_period == self.total_periods
    }

    pub fn is_period_expired(&self) -> bool {
        self.seconds_remaining == 0
    }

    pub fn start(&mut self) {
        if self.is_running || self.is_period_expired() {
            return;
        }
        info!(period = self.current_period, remaining = self.seconds_remaining, "clock started");
        self.is_running = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Idle;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.is_running = false;
            info!(period = self.current_period, "period expired");
            return TickOutcome::PeriodExpired;
        }

        debug!(remaining = self.seconds_remaining, "tick");
        TickOutcome::Ticked
    }

    pub fn pause(&mut self) {
        if self.is_running {
            info!(elapsed = self.elapsed_seconds(), "clock paused");
        }
        self.is_running = false;
    }

    pub fn resume(&mut self) {
        self.start();
    }

    pub fn advance_period(&mut self) -> PeriodAdvance {
        if self.current_period >= self.total_periods {
            return PeriodAdvance::MatchComplete;
        }

        self.current_period += 1;
        self.seconds_remaining = self.period_length_seconds;
        self.is_running = false;
        info!(period = self.current_period, "advanced to next period");
        PeriodAdvance::Advanced(self.current_period)
    }

    /// Seconds since kick-off, summed over completed periods. Every roster
    /// change and stat event is timestamped with this value.
    pub fn elapsed_seconds(&self) -> u32 {
        (u32::from(self.current_period) - 1)
            .saturating_mul(self.period_length_seconds)
            .saturating_add(self.period_length_seconds.saturating_sub(self.seconds_remaining))
    }

    /// Remaining time in the period as `mm:ss`.
    pub fn display(&self) -> String {
        format_mm_ss(self.seconds_remaining)
    }

    pub fn period_label(&self) -> String {
        period_label(self.current_period, self.total_periods)
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::fifteens()
    }
}

pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn period_label(period: u8, total_periods: u8) -> String {
    if total_periods == 4 {
        format!("Q{period}")
    } else {
        format!("H{period}")
    }
}
