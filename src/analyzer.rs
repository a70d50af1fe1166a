use crate::text::eligible_lines;
use crate::tracker::ScrollSample;
use serde::{Deserialize, Serialize};

/// Assumed rendered height of one text line, in pixels
///
/// The real height depends on the reader's device and font settings; this
/// approximation is applied uniformly so results stay comparable.
pub const LINE_HEIGHT_PX: f64 = 40.0;

/// Assumed height of the reading viewport, in pixels
pub const VIEWPORT_HEIGHT_PX: f64 = 600.0;

/// Number of lines visible at once under the assumed layout
pub const VISIBLE_LINES: usize = (VIEWPORT_HEIGHT_PX / LINE_HEIGHT_PX) as usize;

/// One stretch of time during which a line was on screen
///
/// All fields are in seconds from the session start.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewInterval {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Accumulated screen time for one eligible line
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineViewTime {
    /// Total seconds the line was inside the viewport
    pub total_view_time: f64,
    pub intervals: Vec<ViewInterval>,
}

/// A graph point tracking progress through the passage
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    /// Percentage of the passage reached at this line
    pub progress: f64,
    /// Seconds spent on this line
    pub view_time: f64,
    /// Speed relative to the average line (above 1 is faster)
    pub speed: f64,
    pub line_index: usize,
}

/// Per-line timing derived from a session's scroll pattern
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingAnalysis {
    /// One entry per eligible line, in passage order
    pub line_view_times: Vec<LineViewTime>,
    pub avg_view_time: f64,
    pub max_view_time: f64,
    pub min_view_time: f64,
    pub progress_points: Vec<ProgressPoint>,
    /// Count of eligible lines in the passage
    pub total_lines: usize,
    /// Count of lines that were on screen at least once
    pub analyzed_lines: usize,
}

/// One line of the passage annotated with its timing, for display
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    pub text: String,
    pub view_time: f64,
    /// Ratio of this line's view time to the average line's
    pub normalized: f64,
    pub intervals: Vec<ViewInterval>,
}

/// Reading pace of a single line relative to the session average
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReadingPace {
    /// The line never entered the viewport
    NotShown,
    Slow,
    Normal,
    Fast,
}

/// CSS-ready colors for rendering one line of the timing view
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    pub background_color: &'static str,
    pub color: &'static str,
    pub border_left: &'static str,
}

impl ReadingPace {
    /// Classifies one line from its view time and its normalized ratio
    ///
    /// Exactly 1.5 and exactly 0.7 both count as Normal; only strictly
    /// slower or faster lines are highlighted.
    pub fn classify(view_time: f64, normalized: f64) -> ReadingPace {
        if view_time == 0.0 {
            ReadingPace::NotShown
        } else if normalized > 1.5 {
            ReadingPace::Slow
        } else if normalized < 0.7 {
            ReadingPace::Fast
        } else {
            ReadingPace::Normal
        }
    }

    pub fn style(&self) -> LineStyle {
        match self {
            ReadingPace::NotShown => LineStyle {
                background_color: "#f8fafc",
                color: "#64748b",
                border_left: "3px solid #e2e8f0",
            },
            ReadingPace::Slow => LineStyle {
                background_color: "#fef2f2",
                color: "#dc2626",
                border_left: "3px solid #ef4444",
            },
            ReadingPace::Fast => LineStyle {
                background_color: "#f0fdf4",
                color: "#16a34a",
                border_left: "3px solid #22c55e",
            },
            ReadingPace::Normal => LineStyle {
                background_color: "#ffffff",
                color: "#374151",
                border_left: "3px solid #d1d5db",
            },
        }
    }
}

/// Reconstructs per-line view times from a session's scroll samples
///
/// Each consecutive pair of samples contributes its duration to every line
/// that was visible at the first sample's scroll offset. Returns `None`
/// when fewer than two samples were recorded, since no duration can be
/// derived from a single point in time.
pub fn analyze_line_view_times(
    text: &str,
    samples: &[ScrollSample],
) -> Option<ReadingAnalysis> {
    if samples.len() < 2 {
        return None;
    }

    let lines = eligible_lines(text);
    let mut line_view_times: Vec<LineViewTime> = lines
        .iter()
        .map(|_| LineViewTime {
            total_view_time: 0.0,
            intervals: Vec::new(),
        })
        .collect();

    for pair in samples.windows(2) {
        let start = pair[0].timestamp as f64 / 1000.0;
        let end = pair[1].timestamp as f64 / 1000.0;
        let duration = end - start;

        let first_visible = (pair[0].scroll_position / LINE_HEIGHT_PX).floor() as i64;
        let last_visible = (first_visible + VISIBLE_LINES as i64 - 1).min(lines.len() as i64 - 1);

        for line_index in first_visible..=last_visible {
            if line_index >= 0 && (line_index as usize) < lines.len() {
                let entry = &mut line_view_times[line_index as usize];
                entry.total_view_time += duration;
                entry.intervals.push(ViewInterval {
                    start,
                    end,
                    duration,
                });
            }
        }
    }

    let view_times: Vec<f64> = line_view_times
        .iter()
        .map(|line| line.total_view_time)
        .filter(|time| *time > 0.0)
        .collect();
    let avg_view_time = if view_times.is_empty() {
        0.0
    } else {
        view_times.iter().sum::<f64>() / view_times.len() as f64
    };
    let max_view_time = view_times.iter().cloned().fold(0.0, f64::max);
    let min_view_time = if view_times.is_empty() {
        0.0
    } else {
        view_times.iter().cloned().fold(f64::INFINITY, f64::min)
    };

    let mut progress_points = Vec::new();
    for (index, line_data) in line_view_times.iter().enumerate() {
        if line_data.total_view_time > 0.0 {
            progress_points.push(ProgressPoint {
                progress: (index + 1) as f64 / lines.len() as f64 * 100.0,
                view_time: line_data.total_view_time,
                speed: if avg_view_time > 0.0 {
                    avg_view_time / line_data.total_view_time
                } else {
                    1.0
                },
                line_index: index,
            });
        }
    }

    let analyzed_lines = view_times.len();
    Some(ReadingAnalysis {
        line_view_times,
        avg_view_time,
        max_view_time,
        min_view_time,
        progress_points,
        total_lines: lines.len(),
        analyzed_lines,
    })
}

/// Pairs each eligible line of the passage with its analyzed timing
pub fn text_segments(text: &str, analysis: &ReadingAnalysis) -> Vec<TextSegment> {
    eligible_lines(text)
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let line_data = analysis.line_view_times.get(index);
            let view_time = line_data.map(|l| l.total_view_time).unwrap_or(0.0);
            TextSegment {
                text: (*line).to_string(),
                view_time,
                normalized: if analysis.avg_view_time > 0.0 {
                    view_time / analysis.avg_view_time
                } else {
                    1.0
                },
                intervals: line_data.map(|l| l.intervals.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: u64, scroll_position: f64) -> ScrollSample {
        ScrollSample {
            timestamp,
            scroll_position,
        }
    }

    fn twenty_lines() -> String {
        (1..=20)
            .map(|n| format!("{n}行目のテキストです。"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn fewer_than_two_samples_yields_none() {
        let text = twenty_lines();
        assert!(analyze_line_view_times(&text, &[]).is_none());
        assert!(analyze_line_view_times(&text, &[sample(0, 0.0)]).is_none());
    }

    #[test]
    fn view_time_accumulates_over_visible_windows() {
        let text = twenty_lines();
        let samples = vec![
            sample(0, 0.0),
            sample(1000, 400.0),
            sample(2000, 400.0),
        ];
        let analysis = analyze_line_view_times(&text, &samples).unwrap();

        assert_eq!(analysis.total_lines, 20);
        assert_eq!(analysis.analyzed_lines, 20);
        // first window covers lines 0-14, second 10-19
        assert_eq!(analysis.line_view_times[0].total_view_time, 1.0);
        assert_eq!(analysis.line_view_times[12].total_view_time, 2.0);
        assert_eq!(analysis.line_view_times[19].total_view_time, 1.0);
        assert_eq!(analysis.line_view_times[12].intervals.len(), 2);
        assert_eq!(analysis.avg_view_time, 1.25);
        assert_eq!(analysis.max_view_time, 2.0);
        assert_eq!(analysis.min_view_time, 1.0);
    }

    #[test]
    fn progress_points_cover_nonzero_lines_in_order() {
        let text = twenty_lines();
        let samples = vec![sample(0, 0.0), sample(1000, 400.0), sample(2000, 400.0)];
        let analysis = analyze_line_view_times(&text, &samples).unwrap();

        assert_eq!(analysis.progress_points.len(), 20);
        let first = &analysis.progress_points[0];
        assert_eq!(first.line_index, 0);
        assert_eq!(first.progress, 5.0);
        assert_eq!(first.speed, 1.25);
        let last = &analysis.progress_points[19];
        assert_eq!(last.progress, 100.0);
    }

    #[test]
    fn scrolling_past_the_text_counts_no_lines() {
        let text = "一行目\n二行目\n三行目";
        let samples = vec![sample(0, 10_000.0), sample(500, 10_000.0)];
        let analysis = analyze_line_view_times(text, &samples).unwrap();
        assert_eq!(analysis.analyzed_lines, 0);
        assert_eq!(analysis.avg_view_time, 0.0);
        assert!(analysis.progress_points.is_empty());
    }

    #[test]
    fn image_lines_are_excluded_from_analysis() {
        let text = "一行目\n{{IMAGE:fig}}\n二行目";
        let samples = vec![sample(0, 0.0), sample(1000, 0.0)];
        let analysis = analyze_line_view_times(text, &samples).unwrap();
        assert_eq!(analysis.total_lines, 2);
    }

    #[test]
    fn segments_follow_the_analysis() {
        let text = twenty_lines();
        let samples = vec![sample(0, 0.0), sample(1000, 400.0), sample(2000, 400.0)];
        let analysis = analyze_line_view_times(&text, &samples).unwrap();
        let segments = text_segments(&text, &analysis);

        assert_eq!(segments.len(), 20);
        assert_eq!(segments[0].normalized, 0.8);
        assert_eq!(segments[12].normalized, 1.6);
        assert_eq!(segments[12].intervals.len(), 2);
        assert!(segments[0].text.starts_with("1行目"));
    }

    #[test]
    fn zero_duration_sessions_keep_normalized_at_one() {
        let text = "一行目\n二行目";
        let samples = vec![sample(100, 0.0), sample(100, 0.0)];
        let analysis = analyze_line_view_times(text, &samples).unwrap();
        assert_eq!(analysis.avg_view_time, 0.0);
        let segments = text_segments(text, &analysis);
        assert_eq!(segments[0].normalized, 1.0);
    }

    #[test]
    fn classification_uses_strict_thresholds() {
        assert_eq!(ReadingPace::classify(0.0, 2.0), ReadingPace::NotShown);
        assert_eq!(ReadingPace::classify(1.0, 1.5), ReadingPace::Normal);
        assert_eq!(ReadingPace::classify(1.0, 1.51), ReadingPace::Slow);
        assert_eq!(ReadingPace::classify(1.0, 0.7), ReadingPace::Normal);
        assert_eq!(ReadingPace::classify(1.0, 0.69), ReadingPace::Fast);
    }

    #[test]
    fn styles_match_their_pace() {
        assert_eq!(ReadingPace::NotShown.style().background_color, "#f8fafc");
        assert_eq!(ReadingPace::Slow.style().color, "#dc2626");
        assert_eq!(ReadingPace::Fast.style().border_left, "3px solid #22c55e");
        assert_eq!(ReadingPace::Normal.style().background_color, "#ffffff");
    }
}
