use crate::constants::DEFAULT_POLARITY;

/// One input record as read from a table, before grid alignment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInterval {
    pub begin: f64,
    pub end: f64,
    pub polarity: f64,
}

impl RawInterval {
    pub fn new(begin: f64, end: f64) -> Self {
        Self {
            begin,
            end,
            polarity: DEFAULT_POLARITY,
        }
    }

    pub fn with_polarity(mut self, polarity: f64) -> Self {
        self.polarity = polarity;
        self
    }
}

/// Grid-aligned interval, the allocator's input unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub begin: i64,
    pub end: i64,
    /// Carried through untouched; only the renderer looks at it
    pub polarity: f64,
}

impl Interval {
    pub fn new(begin: i64, end: i64) -> Self {
        Self {
            begin,
            end,
            polarity: DEFAULT_POLARITY,
        }
    }

    pub fn with_polarity(mut self, polarity: f64) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_positive(&self) -> bool {
        self.polarity >= 0.0
    }
}

/// Interval placed on a lane (1-based)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanedInterval {
    pub interval: Interval,
    pub lane: u32,
}

impl LanedInterval {
    pub fn begin(&self) -> i64 {
        self.interval.begin
    }

    pub fn end(&self) -> i64 {
        self.interval.end
    }

    /// `[begin, end, lane]`, the shape written to tables
    pub fn as_row(&self) -> [i64; 3] {
        [self.interval.begin, self.interval.end, i64::from(self.lane)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_polarity_is_positive() {
        let raw = RawInterval::new(1.0, 2.0);
        assert_eq!(raw.polarity, 1.0);
        assert!(Interval::new(0, 10).is_positive());
    }

    #[test]
    fn test_negative_polarity() {
        let interval = Interval::new(0, 10).with_polarity(-1.0);
        assert!(!interval.is_positive());
        assert_eq!(interval.duration(), 10);
    }

    #[test]
    fn test_laned_row() {
        let laned = LanedInterval {
            interval: Interval::new(4, 8),
            lane: 2,
        };
        assert_eq!(laned.as_row(), [4, 8, 2]);
    }
}
