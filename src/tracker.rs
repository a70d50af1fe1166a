use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One recorded scroll event, relative to the start of the session
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSample {
    /// Milliseconds since tracking started
    pub timestamp: u64,

    /// Vertical scroll offset in pixels at that moment
    pub scroll_position: f64,
}

/// Summary of a finished session's scroll activity
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollData {
    pub total_scroll_events: usize,
    pub scroll_pattern: Vec<ScrollSample>,
}

/// Records scroll positions over the course of one reading session
///
/// A tracker is started when the reader begins, fed a sample per scroll
/// event, and stopped when they finish. Samples carry timestamps relative
/// to the session start so a session can be replayed or analyzed later.
/// Every scroll event is recorded; sampling is not throttled.
#[derive(Debug)]
pub struct ReadingTracker {
    started_at: Option<Instant>,
    tracking: bool,
    samples: Vec<ScrollSample>,
}

impl ReadingTracker {
    pub fn new() -> Self {
        ReadingTracker {
            started_at: None,
            tracking: false,
            samples: Vec::new(),
        }
    }

    /// Begins a session, discarding samples from any previous one
    pub fn start(&mut self) {
        self.samples.clear();
        self.started_at = Some(Instant::now());
        self.tracking = true;
    }

    /// Records the current scroll offset
    ///
    /// Ignored unless the tracker is running, so stray events before
    /// start or after stop never pollute the session.
    pub fn record_scroll(&mut self, scroll_position: f64) {
        if !self.tracking {
            return;
        }
        let Some(started_at) = self.started_at else {
            return;
        };
        self.samples.push(ScrollSample {
            timestamp: started_at.elapsed().as_millis() as u64,
            scroll_position,
        });
    }

    /// Ends the session; recorded samples stay available
    pub fn stop(&mut self) {
        self.tracking = false;
    }

    /// Returns to the pre-start state and drops all samples
    pub fn reset(&mut self) {
        self.started_at = None;
        self.tracking = false;
        self.samples.clear();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Whole seconds elapsed since the session started, rounded
    ///
    /// Returns 0 when no session has been started.
    pub fn elapsed_seconds(&self) -> u64 {
        match self.started_at {
            Some(started_at) => {
                (started_at.elapsed().as_millis() as f64 / 1000.0).round() as u64
            }
            None => 0,
        }
    }

    pub fn samples(&self) -> &[ScrollSample] {
        &self.samples
    }

    /// Session summary in the shape stored with a result record
    pub fn scroll_data(&self) -> ScrollData {
        ScrollData {
            total_scroll_events: self.samples.len(),
            scroll_pattern: self.samples.clone(),
        }
    }
}

impl Default for ReadingTracker {
    fn default() -> Self {
        ReadingTracker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_nothing_before_start() {
        let mut tracker = ReadingTracker::new();
        tracker.record_scroll(120.0);
        assert!(tracker.samples().is_empty());
        assert_eq!(tracker.elapsed_seconds(), 0);
    }

    #[test]
    fn start_begins_a_fresh_session() {
        let mut tracker = ReadingTracker::new();
        tracker.start();
        tracker.record_scroll(0.0);
        tracker.record_scroll(40.0);
        assert!(tracker.is_tracking());
        assert_eq!(tracker.samples().len(), 2);

        tracker.start();
        assert!(tracker.samples().is_empty());
    }

    #[test]
    fn timestamps_are_monotonic() {
        let mut tracker = ReadingTracker::new();
        tracker.start();
        tracker.record_scroll(10.0);
        tracker.record_scroll(20.0);
        tracker.record_scroll(30.0);
        let samples = tracker.samples();
        assert!(samples[0].timestamp <= samples[1].timestamp);
        assert!(samples[1].timestamp <= samples[2].timestamp);
    }

    #[test]
    fn stop_is_idempotent_and_keeps_samples() {
        let mut tracker = ReadingTracker::new();
        tracker.stop();
        assert!(!tracker.is_tracking());

        tracker.start();
        tracker.record_scroll(15.0);
        tracker.stop();
        tracker.stop();
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.samples().len(), 1);

        tracker.record_scroll(99.0);
        assert_eq!(tracker.samples().len(), 1);
    }

    #[test]
    fn reset_returns_to_pre_start_state() {
        let mut tracker = ReadingTracker::new();
        tracker.start();
        tracker.record_scroll(5.0);
        tracker.reset();
        assert!(!tracker.is_tracking());
        assert!(tracker.samples().is_empty());
        assert_eq!(tracker.elapsed_seconds(), 0);
    }

    #[test]
    fn scroll_data_summarizes_the_session() {
        let mut tracker = ReadingTracker::new();
        tracker.start();
        tracker.record_scroll(0.0);
        tracker.record_scroll(80.0);
        let data = tracker.scroll_data();
        assert_eq!(data.total_scroll_events, 2);
        assert_eq!(data.scroll_pattern.len(), 2);
        assert_eq!(data.scroll_pattern[1].scroll_position, 80.0);
    }

    #[test]
    fn scroll_data_serializes_with_camel_case_keys() {
        let data = ScrollData {
            total_scroll_events: 1,
            scroll_pattern: vec![ScrollSample {
                timestamp: 250,
                scroll_position: 40.0,
            }],
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["totalScrollEvents"], 1);
        assert_eq!(value["scrollPattern"][0]["scrollPosition"], 40.0);
    }
}
