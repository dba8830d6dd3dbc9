use crate::quantize::TimeStep;
use chrono::DateTime;

const SECONDS_PER_DAY: i64 = 86_400;

/// Evenly spread tick positions over `[t_min, t_max]`, snapped down to the
/// grid and deduplicated
pub fn time_ticks(t_min: i64, t_max: i64, step: TimeStep, count: usize) -> Vec<i64> {
    if count == 0 || t_max < t_min {
        return Vec::new();
    }
    if count == 1 || t_max == t_min {
        return vec![t_min];
    }
    let span = (t_max - t_min) as f64;
    let mut ticks: Vec<i64> = (0..count)
        .map(|i| {
            let t = t_min as f64 + span * i as f64 / (count - 1) as f64;
            step.floor(t).max(t_min)
        })
        .collect();
    ticks.dedup();
    ticks
}

/// UTC label for a tick; day-sized steps drop the time of day
pub fn format_time(t: i64, step: TimeStep) -> String {
    match DateTime::from_timestamp(t, 0) {
        Some(dt) if step.get() % SECONDS_PER_DAY == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%m-%d %H:%M").to_string(),
        None => t.to_string(),
    }
}

/// Lanes to label: every lane when few, otherwise a stride that keeps
/// roughly `max_labels` of them
pub fn lane_ticks(peak_lane: u32, max_labels: u32) -> Vec<u32> {
    if peak_lane == 0 || max_labels == 0 {
        return Vec::new();
    }
    let stride = peak_lane.div_ceil(max_labels).max(1);
    (1..=peak_lane).step_by(stride as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(seconds: i64) -> TimeStep {
        TimeStep::new(seconds).unwrap()
    }

    #[test]
    fn test_ticks_cover_range_on_grid() {
        let ticks = time_ticks(0, 100, step(10), 6);
        assert_eq!(ticks, vec![0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn test_ticks_dedup_on_coarse_grid() {
        let ticks = time_ticks(0, 10, step(10), 6);
        assert_eq!(ticks, vec![0, 10]);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(time_ticks(5, 5, step(1), 6), vec![5]);
        assert!(time_ticks(5, 4, step(1), 6).is_empty());
        assert!(time_ticks(0, 10, step(1), 0).is_empty());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0, step(86_400)), "1970-01-01");
        assert_eq!(format_time(1_700_006_400, step(86_400)), "2023-11-15");
        assert_eq!(format_time(3_600, step(3_600)), "01-01 01:00");
    }

    #[test]
    fn test_lane_ticks() {
        assert_eq!(lane_ticks(3, 10), vec![1, 2, 3]);
        assert_eq!(lane_ticks(10, 5), vec![1, 3, 5, 7, 9]);
        assert!(lane_ticks(0, 5).is_empty());
    }
}
