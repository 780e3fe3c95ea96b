//! Fixed-step scheduler turning real elapsed time into whole simulated
//! seconds.
//!
//! Real time is scaled by the configured time scale and added to an
//! accumulator. Every whole second in the accumulator becomes one tick;
//! the fraction carries over to the next wake-up. After a long stall the
//! scheduler runs at most `max_catch_up_steps` ticks and drops the rest,
//! so one wake-up can never monopolise the world actor.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;

use crate::config::SimulationConfig;

/// Accumulates scaled real time into whole simulated seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    time_scale: Decimal,
    max_catch_up_steps: u32,
    accumulator: Decimal,
    dropped: u64,
}

impl Scheduler {
    /// Create a scheduler. A negative time scale counts as zero.
    pub fn new(time_scale: Decimal, max_catch_up_steps: u32) -> Self {
        Self {
            time_scale: time_scale.max(Decimal::ZERO),
            max_catch_up_steps: max_catch_up_steps.max(1),
            accumulator: Decimal::ZERO,
            dropped: 0,
        }
    }

    /// Create a scheduler from the simulation configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.time_scale, config.max_catch_up_steps)
    }

    /// Add real elapsed time and return how many ticks to run now.
    ///
    /// Ticks past `max_catch_up_steps` are discarded, not carried: after a
    /// stall the world clock stays behind real time by the dropped amount.
    /// A large enough cap drains every whole second.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let millis = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        let simulated = Decimal::new(millis, 3).saturating_mul(self.time_scale);
        self.accumulator = self.accumulator.saturating_add(simulated);

        let whole = self.accumulator.floor();
        self.accumulator = self.accumulator.saturating_sub(whole);
        let due = whole.to_u64().unwrap_or(u64::MAX);
        let limit = u64::from(self.max_catch_up_steps);
        if due > limit {
            let skipped = due.saturating_sub(limit);
            self.dropped = self.dropped.saturating_add(skipped);
            warn!(due, skipped, "Scheduler fell behind, dropping ticks");
        }
        u32::try_from(due.min(limit)).unwrap_or(self.max_catch_up_steps)
    }

    /// Fraction of a simulated second carried to the next wake-up.
    pub const fn carried(&self) -> Decimal {
        self.accumulator
    }

    /// Total ticks dropped after stalls.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
