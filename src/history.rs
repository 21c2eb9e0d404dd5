use std::collections::VecDeque;

use crate::models::{Aggregate, MonitoringResult};

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct TargetHistory {
    target: String,
    results: VecDeque<MonitoringResult>,
}

impl TargetHistory {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            results: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn record(&mut self, result: MonitoringResult) {
        if self.results.len() >= HISTORY_CAPACITY {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn latest(&self) -> Option<&MonitoringResult> {
        self.results.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MonitoringResult> {
        self.results.iter()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &MonitoringResult> {
        self.results.iter().rev()
    }

    /// Recomputed over the retained window on every call, so the numbers
    /// describe the last `HISTORY_CAPACITY` probes only.
    pub fn aggregate(&self) -> Aggregate {
        if self.is_empty() {
            return Aggregate::default();
        }
        let samples = self.results.len();

        let up = self.iter().filter(|r| r.is_up()).count();
        let total_ms: f64 = self.iter().map(|r| r.response_time_ms()).sum();

        Aggregate {
            availability: up as f64 / samples as f64 * 100.0,
            avg_response_time_ms: total_ms / samples as f64,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(i: u32, status: u16, ms: f64) -> MonitoringResult {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, i).unwrap();
        MonitoringResult::at(ts, status, ms)
    }

    #[test]
    fn length_is_capped_at_capacity() {
        for n in 0..25u32 {
            let mut history = TargetHistory::new("https://example.com/");
            for i in 0..n {
                history.record(sample(i % 60, 200, 1.0));
            }
            assert_eq!(history.len(), (n as usize).min(HISTORY_CAPACITY));
        }
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut history = TargetHistory::new("host");
        for i in 0..=10u32 {
            history.record(sample(i, 200, i as f64));
        }

        let kept: Vec<f64> = history.iter().map(|r| r.response_time_ms()).collect();
        assert_eq!(kept, (1..=10).map(|i| i as f64).collect::<Vec<_>>());

        let newest: Vec<f64> = history.newest_first().map(|r| r.response_time_ms()).collect();
        assert_eq!(newest.first(), Some(&10.0));
        assert_eq!(newest.last(), Some(&1.0));
    }

    #[test]
    fn availability_is_share_of_up_results() {
        let mut history = TargetHistory::new("host");
        for (i, status) in [200, 503, 200, 0, 200].into_iter().enumerate() {
            history.record(sample(i as u32, status, 10.0));
        }
        let agg = history.aggregate();
        assert_eq!(agg.samples, 5);
        assert!((agg.availability - 60.0).abs() < 1e-9);
    }

    #[test]
    fn two_of_three_renders_as_66_7() {
        let mut history = TargetHistory::new("host");
        for (i, status) in [200, 503, 200].into_iter().enumerate() {
            history.record(sample(i as u32, status, 10.0));
        }
        assert_eq!(format!("{:.1}", history.aggregate().availability), "66.7");
    }

    #[test]
    fn average_is_mean_of_retained_window() {
        let mut history = TargetHistory::new("host");
        // The first two fall out of the window.
        for (i, ms) in [1000.0, 1000.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
            .into_iter()
            .enumerate()
        {
            history.record(sample(i as u32, 200, ms));
        }
        let agg = history.aggregate();
        assert_eq!(agg.samples, HISTORY_CAPACITY);
        assert!((agg.avg_response_time_ms - 55.0).abs() < 1e-9);
        assert!((agg.availability - 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_sample_is_all_or_nothing() {
        let mut history = TargetHistory::new("host");
        history.record(sample(0, 0, 0.0));
        assert_eq!(history.aggregate().availability, 0.0);

        let mut history = TargetHistory::new("host");
        history.record(sample(0, 200, 5.0));
        assert_eq!(history.aggregate().availability, 100.0);
    }

    #[test]
    fn empty_history_aggregates_to_zero() {
        let history = TargetHistory::new("host");
        assert_eq!(history.aggregate(), Aggregate::default());
        assert!(history.latest().is_none());
    }
}
