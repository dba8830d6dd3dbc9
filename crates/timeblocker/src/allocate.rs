//! Lane assignment for grid-aligned intervals.
//!
//! Intervals are consumed in ascending `begin` order and grouped by identical
//! `begin`. Each group first probes the lowest free lanes, then hands those
//! lanes out according to [`GroupOrder`] before marking them busy. A lane is
//! freed once its occupant's end plus the configured idle offset is at or
//! before the next group's begin.
//!
//! Input must already be sorted by `begin`; unsorted input yields lanes that
//! may overlap and is not detected here.

use crate::interval::{Interval, LanedInterval};
use crate::quantize::TimeStep;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::mem;

/// How probed lanes are handed out within a group sharing one `begin`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// Longest interval gets the lowest lane; ties keep input order
    #[default]
    LongestFirst,
    /// Lanes follow input order
    Arrival,
}

/// Busy lanes and the time each one stays busy until
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyMap {
    busy_until: BTreeMap<u32, i64>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, lane: u32) -> bool {
        self.busy_until.contains_key(&lane)
    }

    pub fn occupy(&mut self, lane: u32, until: i64) {
        self.busy_until.insert(lane, until);
    }

    /// Frees every lane with `until + offset <= begin`, returning how many
    pub fn release_until(&mut self, begin: i64, offset: i64) -> usize {
        let before = self.busy_until.len();
        self.busy_until
            .retain(|_, until| until.saturating_add(offset) > begin);
        before - self.busy_until.len()
    }

    pub fn len(&self) -> usize {
        self.busy_until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busy_until.is_empty()
    }
}

/// Summary of one allocation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    pub intervals: usize,
    pub groups: usize,
    pub peak_lane: u32,
    pub releases: usize,
}

/// Result of an allocation run, in flush order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub intervals: Vec<LanedInterval>,
    pub stats: AllocationStats,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn peak_lane(&self) -> u32 {
        self.stats.peak_lane
    }

    /// `[begin, end, lane]` rows in emitted order
    pub fn rows(&self) -> Vec<[i64; 3]> {
        self.intervals.iter().map(LanedInterval::as_row).collect()
    }
}

/// Allocator parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorOptions {
    pub time_step: TimeStep,
    /// Idle grid steps a lane must stay empty before reuse
    pub min_time_block_offset: u32,
    pub group_order: GroupOrder,
}

impl AllocatorOptions {
    pub fn minimum_offset(&self) -> i64 {
        self.time_step.span(self.min_time_block_offset)
    }
}

/// Single-pass lane allocator; feed it with [`push`](Self::push), then call
/// [`finish`](Self::finish)
#[derive(Debug)]
pub struct LaneAllocator {
    offset: i64,
    order: GroupOrder,
    occupancy: OccupancyMap,
    last_begin: Option<i64>,
    group: Vec<Interval>,
    probed: Vec<u32>,
    probe_cursor: u32,
    output: Vec<LanedInterval>,
    stats: AllocationStats,
}

impl LaneAllocator {
    pub fn new(options: &AllocatorOptions) -> Self {
        Self {
            offset: options.minimum_offset(),
            order: options.group_order,
            occupancy: OccupancyMap::new(),
            last_begin: None,
            group: Vec::new(),
            probed: Vec::new(),
            probe_cursor: 0,
            output: Vec::new(),
            stats: AllocationStats::default(),
        }
    }

    pub fn push(&mut self, interval: Interval) {
        let starts_group = self.last_begin.is_none_or(|last| interval.begin > last);
        if starts_group {
            self.flush();
            self.stats.releases += self.occupancy.release_until(interval.begin, self.offset);
            self.probe_cursor = 0;
        }

        let lane = self.probe();
        self.group.push(interval);
        self.probed.push(lane);
        self.last_begin = Some(interval.begin);
        self.stats.intervals += 1;
    }

    pub fn finish(mut self) -> Layout {
        self.flush();
        debug!(
            "allocated {} intervals in {} groups, peak lane {}",
            self.stats.intervals, self.stats.groups, self.stats.peak_lane
        );
        Layout {
            intervals: self.output,
            stats: self.stats,
        }
    }

    /// Next lane after the cursor that is not held by an earlier group
    fn probe(&mut self) -> u32 {
        let mut lane = self.probe_cursor + 1;
        while self.occupancy.is_busy(lane) {
            lane += 1;
        }
        self.probe_cursor = lane;
        lane
    }

    fn flush(&mut self) {
        if self.group.is_empty() {
            return;
        }
        let group = mem::take(&mut self.group);
        let lanes = mem::take(&mut self.probed);

        let mut ranked: Vec<usize> = (0..group.len()).collect();
        if self.order == GroupOrder::LongestFirst {
            // stable: equal durations keep input order
            ranked.sort_by(|&a, &b| group[b].duration().cmp(&group[a].duration()));
        }

        trace!(
            "flushing group at {} with {} intervals, lanes {:?}",
            group[0].begin,
            group.len(),
            lanes
        );

        for (idx, lane) in ranked.into_iter().zip(lanes) {
            let interval = group[idx];
            self.occupancy.occupy(lane, interval.end);
            self.stats.peak_lane = self.stats.peak_lane.max(lane);
            self.output.push(LanedInterval { interval, lane });
        }
        self.stats.groups += 1;
    }
}

/// Assigns lanes to `intervals`, which must be sorted by `begin`
pub fn allocate<I>(intervals: I, options: &AllocatorOptions) -> Layout
where
    I: IntoIterator<Item = Interval>,
{
    let mut allocator = LaneAllocator::new(options);
    for interval in intervals {
        allocator.push(interval);
    }
    allocator.finish()
}
