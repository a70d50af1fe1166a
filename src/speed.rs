use crate::text::strip_image_placeholders;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Per-class character tally for one passage
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetails {
    /// Hiragana and katakana
    pub kana: u32,
    pub kanji: u32,
    pub punctuation: u32,
    pub alphanumeric: u32,
    pub other: u32,
}

/// Character count of a passage, raw and weighted
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterCount {
    /// Number of non-whitespace characters
    pub total: u32,
    /// Weighted count rounded to the nearest integer
    pub standard_count: u32,
    pub details: CharacterDetails,
}

/// Per-kind word tally for one passage
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WordDetails {
    pub hiragana_words: u32,
    pub katakana_words: u32,
    pub kanji_words: u32,
    pub alphanumeric_words: u32,
    pub mixed_words: u32,
}

/// Word count of a passage, raw and weighted
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordCount {
    pub total_words: u32,
    /// Weighted count rounded to the nearest integer
    pub standard_word_count: u32,
    pub details: WordDetails,
}

fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FAF}').contains(&c)
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '、' | '。' | '！' | '？' | '「' | '」' | '『' | '』' | '（' | '）' | '[' | ']'
            | '【' | '】' | '〈' | '〉' | '《' | '》' | '・' | '…' | 'ー' | '～'
    )
}

fn is_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Counts the characters of a Japanese passage
///
/// Whitespace and `{{IMAGE:...}}` placeholders are ignored. The standard
/// count weights each class by how much reading effort it carries:
/// kana and kanji 1.0, punctuation 0.5, alphanumerics 0.3 (several of
/// them form one word), anything else 0.5.
pub fn count_characters(text: &str) -> CharacterCount {
    let clean = strip_image_placeholders(text);
    let mut details = CharacterDetails::default();

    for c in clean.chars() {
        if c.is_whitespace() {
            continue;
        }
        if is_hiragana(c) || is_katakana(c) {
            details.kana += 1;
        } else if is_kanji(c) {
            details.kanji += 1;
        } else if is_punctuation(c) {
            details.punctuation += 1;
        } else if is_alphanumeric(c) {
            details.alphanumeric += 1;
        } else {
            details.other += 1;
        }
    }

    let standard = details.kana as f64
        + details.kanji as f64
        + details.punctuation as f64 * 0.5
        + details.alphanumeric as f64 * 0.3
        + details.other as f64 * 0.5;

    CharacterCount {
        total: details.kana + details.kanji + details.punctuation + details.alphanumeric
            + details.other,
        standard_count: standard.round() as u32,
        details,
    }
}

enum WordKind {
    Kanji,
    Katakana,
    Hiragana,
    Alphanumeric,
    Mixed,
}

lazy_static! {
    /// Word patterns in claim order; earlier patterns take the positions
    /// they match and later patterns skip anything already claimed.
    static ref WORD_PATTERNS: Vec<(Regex, WordKind)> = vec![
        // kanji runs, at most 4 characters per word
        (Regex::new("[\u{4E00}-\u{9FAF}]{1,4}").unwrap(), WordKind::Kanji),
        // katakana runs (loanwords)
        (Regex::new("[\u{30A0}-\u{30FF}]+").unwrap(), WordKind::Katakana),
        // hiragana runs of two or more
        (Regex::new("[\u{3040}-\u{309F}]{2,}").unwrap(), WordKind::Hiragana),
        (Regex::new("[a-zA-Z0-9]+").unwrap(), WordKind::Alphanumeric),
        // kanji followed by hiragana (inflected verbs and adjectives)
        (
            Regex::new("[\u{4E00}-\u{9FAF}]+[\u{3040}-\u{309F}]+").unwrap(),
            WordKind::Mixed
        ),
    ];
}

/// Counts the words of a Japanese passage with a rough segmentation
///
/// Runs of kanji (up to four per word), katakana, hiragana pairs and
/// longer, and alphanumerics each count as one word; positions already
/// claimed by an earlier pattern are skipped. A hiragana character with
/// no hiragana neighbor counts as a particle. The standard count weights
/// hiragana-only words at 0.5 and every other kind at 1.0.
pub fn count_words(text: &str) -> WordCount {
    let clean = strip_image_placeholders(text);
    let processed = clean.replace('\n', " ");
    let mut details = WordDetails::default();
    let mut claimed = vec![false; processed.len()];

    for (pattern, kind) in WORD_PATTERNS.iter() {
        for found in pattern.find_iter(&processed) {
            if claimed[found.start()..found.end()].iter().any(|c| *c) {
                continue;
            }
            for position in found.start()..found.end() {
                claimed[position] = true;
            }
            match kind {
                WordKind::Kanji => details.kanji_words += 1,
                WordKind::Katakana => details.katakana_words += 1,
                WordKind::Hiragana => details.hiragana_words += 1,
                WordKind::Alphanumeric => details.alphanumeric_words += 1,
                WordKind::Mixed => details.mixed_words += 1,
            }
        }
    }

    // isolated single hiragana are particles (は, を, と, ...)
    let chars: Vec<char> = processed.chars().collect();
    for (index, &c) in chars.iter().enumerate() {
        if !is_hiragana(c) {
            continue;
        }
        let prev_is_hiragana = index
            .checked_sub(1)
            .map_or(false, |j| is_hiragana(chars[j]));
        let next_is_hiragana = chars.get(index + 1).map_or(false, |&n| is_hiragana(n));
        if !prev_is_hiragana && !next_is_hiragana {
            details.hiragana_words += 1;
        }
    }

    let total_words = details.hiragana_words
        + details.katakana_words
        + details.kanji_words
        + details.alphanumeric_words
        + details.mixed_words;

    let standard = details.kanji_words as f64
        + details.katakana_words as f64
        + details.mixed_words as f64
        + details.alphanumeric_words as f64
        + details.hiragana_words as f64 * 0.5;

    WordCount {
        total_words,
        standard_word_count: standard.round() as u32,
        details,
    }
}

/// Reading speed in units per minute, rounded
///
/// Works for characters and words alike. Returns 0 when the count is
/// zero or the elapsed time is not positive.
pub fn reading_speed(count: u32, reading_time_seconds: f64) -> u32 {
    if count == 0 || reading_time_seconds <= 0.0 {
        return 0;
    }
    let minutes = reading_time_seconds / 60.0;
    (count as f64 / minutes).round() as u32
}

/// Band thresholds for one level, in units per minute
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeedCriteria {
    pub slow: u32,
    pub normal: u32,
    pub fast: u32,
    pub very_fast: u32,
}

/// The five speed bands, slowest to fastest
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SpeedBand {
    Slow,
    BelowNormal,
    Normal,
    Fast,
    VeryFast,
}

/// A speed judged against the thresholds of a level
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeedEvaluation {
    pub level: SpeedBand,
    pub message: &'static str,
    pub color: &'static str,
    pub speed: u32,
    pub criteria: SpeedCriteria,
    pub unit: &'static str,
}

fn cpm_criteria(level_code: &str) -> SpeedCriteria {
    match level_code {
        "beginner" => SpeedCriteria {
            slow: 100,
            normal: 150,
            fast: 200,
            very_fast: 250,
        },
        "advanced" => SpeedCriteria {
            slow: 400,
            normal: 500,
            fast: 600,
            very_fast: 700,
        },
        _ => SpeedCriteria {
            slow: 200,
            normal: 300,
            fast: 400,
            very_fast: 500,
        },
    }
}

fn wpm_criteria(level_code: &str) -> SpeedCriteria {
    match level_code {
        "beginner" => SpeedCriteria {
            slow: 50,
            normal: 75,
            fast: 100,
            very_fast: 125,
        },
        "advanced" => SpeedCriteria {
            slow: 200,
            normal: 250,
            fast: 300,
            very_fast: 350,
        },
        _ => SpeedCriteria {
            slow: 100,
            normal: 150,
            fast: 200,
            very_fast: 250,
        },
    }
}

fn evaluate(speed: u32, criteria: SpeedCriteria, unit: &'static str) -> SpeedEvaluation {
    let (level, message, color) = if speed < criteria.slow {
        (SpeedBand::Slow, "ゆっくり", "#ef4444")
    } else if speed < criteria.normal {
        (SpeedBand::BelowNormal, "やや遅い", "#f97316")
    } else if speed < criteria.fast {
        (SpeedBand::Normal, "標準的", "#10b981")
    } else if speed < criteria.very_fast {
        (SpeedBand::Fast, "速い", "#3b82f6")
    } else {
        (SpeedBand::VeryFast, "とても速い", "#8b5cf6")
    };
    SpeedEvaluation {
        level,
        message,
        color,
        speed,
        criteria,
        unit,
    }
}

/// Judges a characters-per-minute speed against a level's thresholds
///
/// Unknown level codes use the intermediate thresholds.
pub fn evaluate_speed_cpm(speed: u32, level_code: &str) -> SpeedEvaluation {
    evaluate(speed, cpm_criteria(level_code), "文字/分")
}

/// Judges a words-per-minute speed against a level's thresholds
pub fn evaluate_speed_wpm(speed: u32, level_code: &str) -> SpeedEvaluation {
    evaluate(speed, wpm_criteria(level_code), "語/分")
}

/// Average reading speed of one native-speaker age group
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeBand {
    pub min: u32,
    pub max: u32,
    pub label: &'static str,
}

/// Average speeds by age group, in one unit
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeAverages {
    pub elementary: NativeBand,
    pub junior: NativeBand,
    pub high: NativeBand,
    pub adult: NativeBand,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NativeLevel {
    BelowElementary,
    Elementary,
    Junior,
    High,
    Adult,
}

/// Where a speed lands among native-speaker age groups
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeComparison {
    pub level: NativeLevel,
    pub message: &'static str,
    /// How much of the band's reference speed was reached, capped at 100
    pub percentage: u32,
}

/// A native-speaker comparison with the bands it was judged against
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeComparisonReport {
    pub comparison: NativeComparison,
    pub native_averages: NativeAverages,
    pub speed: u32,
    pub unit: &'static str,
}

const NATIVE_CPM: NativeAverages = NativeAverages {
    elementary: NativeBand {
        min: 200,
        max: 400,
        label: "小学生",
    },
    junior: NativeBand {
        min: 400,
        max: 600,
        label: "中学生",
    },
    high: NativeBand {
        min: 600,
        max: 800,
        label: "高校生",
    },
    adult: NativeBand {
        min: 800,
        max: 1200,
        label: "大学生・成人",
    },
};

const NATIVE_WPM: NativeAverages = NativeAverages {
    elementary: NativeBand {
        min: 100,
        max: 200,
        label: "小学生",
    },
    junior: NativeBand {
        min: 200,
        max: 300,
        label: "中学生",
    },
    high: NativeBand {
        min: 300,
        max: 400,
        label: "高校生",
    },
    adult: NativeBand {
        min: 400,
        max: 600,
        label: "大学生・成人",
    },
};

fn compare(speed: u32, averages: NativeAverages, unit: &'static str) -> NativeComparisonReport {
    let comparison = if speed < averages.elementary.min {
        NativeComparison {
            level: NativeLevel::BelowElementary,
            message: "小学生レベル未満",
            percentage: (speed as f64 / averages.elementary.min as f64 * 100.0).round() as u32,
        }
    } else if speed <= averages.elementary.max {
        NativeComparison {
            level: NativeLevel::Elementary,
            message: "小学生レベル",
            percentage: 100,
        }
    } else if speed <= averages.junior.max {
        NativeComparison {
            level: NativeLevel::Junior,
            message: "中学生レベル",
            percentage: 100,
        }
    } else if speed <= averages.high.max {
        NativeComparison {
            level: NativeLevel::High,
            message: "高校生レベル",
            percentage: 100,
        }
    } else {
        let percentage = (speed as f64 / averages.adult.max as f64 * 100.0).round() as u32;
        NativeComparison {
            level: NativeLevel::Adult,
            message: "大学生・成人レベル",
            percentage: percentage.min(100),
        }
    };
    NativeComparisonReport {
        comparison,
        native_averages: averages,
        speed,
        unit,
    }
}

/// Compares a characters-per-minute speed with native-speaker averages
pub fn compare_with_native_cpm(speed: u32) -> NativeComparisonReport {
    compare(speed, NATIVE_CPM, "文字/分")
}

/// Compares a words-per-minute speed with native-speaker averages
pub fn compare_with_native_wpm(speed: u32) -> NativeComparisonReport {
    compare(speed, NATIVE_WPM, "語/分")
}

/// Full speed report for one reading session, in both units
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatistics {
    /// Weighted character count
    pub character_count: u32,
    pub actual_character_count: u32,
    pub character_details: CharacterDetails,
    /// Weighted word count
    pub word_count: u32,
    pub actual_word_count: u32,
    pub word_details: WordDetails,
    pub reading_time: f64,
    #[serde(rename = "readingSpeedCPM")]
    pub reading_speed_cpm: u32,
    #[serde(rename = "readingSpeedWPM")]
    pub reading_speed_wpm: u32,
    #[serde(rename = "speedEvaluationCPM")]
    pub speed_evaluation_cpm: SpeedEvaluation,
    #[serde(rename = "speedEvaluationWPM")]
    pub speed_evaluation_wpm: SpeedEvaluation,
    #[serde(rename = "nativeComparisonCPM")]
    pub native_comparison_cpm: NativeComparisonReport,
    #[serde(rename = "nativeComparisonWPM")]
    pub native_comparison_wpm: NativeComparisonReport,
    pub content_level: String,
}

/// Builds the combined speed report for a passage read in the given time
pub fn reading_statistics(
    text: &str,
    reading_time_seconds: f64,
    level_code: &str,
) -> ReadingStatistics {
    let characters = count_characters(text);
    let words = count_words(text);
    let speed_cpm = reading_speed(characters.standard_count, reading_time_seconds);
    let speed_wpm = reading_speed(words.standard_word_count, reading_time_seconds);

    ReadingStatistics {
        character_count: characters.standard_count,
        actual_character_count: characters.total,
        character_details: characters.details,
        word_count: words.standard_word_count,
        actual_word_count: words.total_words,
        word_details: words.details,
        reading_time: reading_time_seconds,
        reading_speed_cpm: speed_cpm,
        reading_speed_wpm: speed_wpm,
        speed_evaluation_cpm: evaluate_speed_cpm(speed_cpm, level_code),
        speed_evaluation_wpm: evaluate_speed_wpm(speed_wpm, level_code),
        native_comparison_cpm: compare_with_native_cpm(speed_cpm),
        native_comparison_wpm: compare_with_native_wpm(speed_wpm),
        content_level: level_code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_classes_are_tallied() {
        let count = count_characters("私は日本語を勉強しています。");
        assert_eq!(count.details.kana, 7);
        assert_eq!(count.details.kanji, 6);
        assert_eq!(count.details.punctuation, 1);
        assert_eq!(count.total, 14);
        // 7 + 6 + 0.5 rounds up
        assert_eq!(count.standard_count, 14);
    }

    #[test]
    fn whitespace_is_not_counted() {
        let count = count_characters("あ い\nう\t");
        assert_eq!(count.total, 3);
        assert_eq!(count.details.kana, 3);
    }

    #[test]
    fn alphanumerics_carry_a_light_weight() {
        let count = count_characters("ABC 123");
        assert_eq!(count.details.alphanumeric, 6);
        assert_eq!(count.total, 6);
        // 6 * 0.3 = 1.8
        assert_eq!(count.standard_count, 2);
    }

    #[test]
    fn brackets_count_as_punctuation() {
        let count = count_characters("「こんにちは」");
        assert_eq!(count.details.punctuation, 2);
        assert_eq!(count.standard_count, 6);
    }

    #[test]
    fn image_placeholders_are_not_counted() {
        let count = count_characters("あい{{IMAGE:fig1}}うえ");
        assert_eq!(count.total, 4);
        assert_eq!(count.details.kana, 4);
    }

    #[test]
    fn empty_text_counts_nothing() {
        let count = count_characters("");
        assert_eq!(count.total, 0);
        assert_eq!(count.standard_count, 0);
        let words = count_words("  \n ");
        assert_eq!(words.total_words, 0);
    }

    #[test]
    fn word_segmentation_matches_the_weighting_example() {
        let words = count_words("私は日本語を勉強しています。");
        assert_eq!(words.details.kanji_words, 3);
        // しています plus the particles は and を
        assert_eq!(words.details.hiragana_words, 3);
        assert_eq!(words.total_words, 6);
        // 3 * 1.0 + 3 * 0.5 = 4.5
        assert_eq!(words.standard_word_count, 5);
    }

    #[test]
    fn long_kanji_runs_split_into_several_words() {
        let words = count_words("日本国憲法前文");
        assert_eq!(words.details.kanji_words, 2);
    }

    #[test]
    fn katakana_runs_are_loanwords() {
        let words = count_words("コーヒーとケーキ");
        assert_eq!(words.details.katakana_words, 2);
        assert_eq!(words.details.hiragana_words, 1);
        assert_eq!(words.total_words, 3);
        assert_eq!(words.standard_word_count, 3);
    }

    #[test]
    fn alphanumeric_runs_are_single_words() {
        let words = count_words("JLPT N2レベル");
        assert_eq!(words.details.alphanumeric_words, 2);
        assert_eq!(words.details.katakana_words, 1);
    }

    #[test]
    fn speed_is_rounded_units_per_minute() {
        assert_eq!(reading_speed(400, 120.0), 200);
        assert_eq!(reading_speed(100, 45.0), 133);
        assert_eq!(reading_speed(0, 60.0), 0);
        assert_eq!(reading_speed(100, 0.0), 0);
        assert_eq!(reading_speed(100, -5.0), 0);
    }

    #[test]
    fn cpm_bands_follow_the_level_thresholds() {
        let eval = evaluate_speed_cpm(150, "intermediate");
        assert_eq!(eval.level, SpeedBand::Slow);
        assert_eq!(eval.message, "ゆっくり");
        assert_eq!(eval.color, "#ef4444");

        assert_eq!(
            evaluate_speed_cpm(200, "intermediate").level,
            SpeedBand::BelowNormal
        );
        assert_eq!(evaluate_speed_cpm(350, "intermediate").level, SpeedBand::Normal);
        assert_eq!(evaluate_speed_cpm(450, "intermediate").level, SpeedBand::Fast);
        assert_eq!(
            evaluate_speed_cpm(500, "intermediate").level,
            SpeedBand::VeryFast
        );
    }

    #[test]
    fn beginner_thresholds_are_lower() {
        let eval = evaluate_speed_cpm(150, "beginner");
        assert_eq!(eval.level, SpeedBand::Normal);
        assert_eq!(evaluate_speed_wpm(50, "beginner").level, SpeedBand::BelowNormal);
    }

    #[test]
    fn unknown_levels_use_intermediate_thresholds() {
        assert_eq!(
            evaluate_speed_cpm(350, "mystery").criteria,
            evaluate_speed_cpm(350, "intermediate").criteria
        );
    }

    #[test]
    fn native_comparison_picks_the_matching_band() {
        let below = compare_with_native_cpm(150);
        assert_eq!(below.comparison.level, NativeLevel::BelowElementary);
        assert_eq!(below.comparison.percentage, 75);

        assert_eq!(
            compare_with_native_cpm(400).comparison.level,
            NativeLevel::Elementary
        );
        assert_eq!(
            compare_with_native_cpm(500).comparison.level,
            NativeLevel::Junior
        );
        assert_eq!(compare_with_native_cpm(700).comparison.level, NativeLevel::High);

        let adult = compare_with_native_cpm(1000);
        assert_eq!(adult.comparison.level, NativeLevel::Adult);
        assert_eq!(adult.comparison.percentage, 83);
        assert_eq!(compare_with_native_cpm(2000).comparison.percentage, 100);
    }

    #[test]
    fn wpm_comparison_uses_its_own_bands() {
        assert_eq!(
            compare_with_native_wpm(150).comparison.level,
            NativeLevel::Elementary
        );
        assert_eq!(compare_with_native_wpm(150).unit, "語/分");
    }

    #[test]
    fn statistics_combine_both_units() {
        let stats = reading_statistics("私は日本語を勉強しています。", 30.0, "intermediate");
        assert_eq!(stats.character_count, 14);
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.reading_speed_cpm, 28);
        assert_eq!(stats.reading_speed_wpm, 10);
        assert_eq!(stats.speed_evaluation_cpm.level, SpeedBand::Slow);
        assert_eq!(stats.content_level, "intermediate");
    }

    #[test]
    fn statistics_serialize_with_unit_suffixed_keys() {
        let stats = reading_statistics("あいうえお", 60.0, "beginner");
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("readingSpeedCPM").is_some());
        assert!(value.get("speedEvaluationWPM").is_some());
        assert!(value.get("nativeComparisonCPM").is_some());
        assert_eq!(value["characterDetails"]["kana"], 5);
    }
}
