//! Alignment of raw timestamps onto a fixed time grid.
//!
//! Begin times are floored to the grid and end times are ceiled, so a
//! quantized interval always covers its raw interval.

use crate::error::{Result, TimeblockError};
use crate::interval::{Interval, RawInterval};
use std::fmt;

/// Positive grid step in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStep(i64);

impl TimeStep {
    /// Returns a config error for zero or negative steps
    pub fn new(seconds: i64) -> Result<Self> {
        if seconds <= 0 {
            return Err(TimeblockError::Config(format!(
                "time_step must be a positive number of seconds, got {}",
                seconds
            )));
        }
        Ok(Self(seconds))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Length of `steps` grid cells
    pub fn span(self, steps: u32) -> i64 {
        self.0.saturating_mul(i64::from(steps))
    }

    /// Truncates to an integer, then rounds down to the grid. Values beyond
    /// the `i64` range clamp to the outermost grid point.
    pub fn floor(self, t: f64) -> i64 {
        let whole = t.trunc() as i64;
        let rem = whole.rem_euclid(self.0);
        whole
            .checked_sub(rem)
            .unwrap_or_else(|| whole + (self.0 - rem))
    }

    /// Rounds up to the grid; values already on the grid are unchanged
    pub fn ceil(self, t: f64) -> i64 {
        if t.fract() == 0.0 {
            let whole = t as i64;
            let rem = whole.rem_euclid(self.0);
            if rem == 0 {
                whole
            } else {
                whole.checked_add(self.0 - rem).unwrap_or(whole - rem)
            }
        } else {
            // |t| < 2^52 here, every larger f64 is integral
            (t / self.0 as f64).ceil() as i64 * self.0
        }
    }

    pub fn quantize(self, raw: &RawInterval) -> Interval {
        Interval {
            begin: self.floor(raw.begin),
            end: self.ceil(raw.end),
            polarity: raw.polarity,
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_TIME_STEP)
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Quantizes every record, preserving order
pub fn quantize_all(raw: &[RawInterval], step: TimeStep) -> Vec<Interval> {
    raw.iter().map(|r| step.quantize(r)).collect()
}
