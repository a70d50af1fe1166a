use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    /// Explicit notation: ｜base《ruby》 (ASCII | accepted)
    static ref BASIC_PATTERN: Regex = Regex::new("[｜|]([^｜|《》()]+)《([^《》]+)》").unwrap();

    /// Shorthand notation: base《ruby》, kanji base with kana ruby
    static ref SHORT_PATTERN: Regex =
        Regex::new("([\u{4E00}-\u{9FAF}]+)《([\u{3040}-\u{309F}\u{30A0}-\u{30FF}]+)》").unwrap();

    /// Parenthesis notation: base(ruby), half- or full-width parens
    static ref PAREN_PATTERN: Regex =
        Regex::new("([\u{4E00}-\u{9FAF}]+)[（(]([\u{3040}-\u{309F}\u{30A0}-\u{30FF}]+)[)）]")
            .unwrap();

    /// Escape notation: base｜(text) keeps the parentheses literal
    static ref ESCAPE_PATTERN: Regex =
        Regex::new("([\u{4E00}-\u{9FAF}]+)[｜|]\\(([^)]+)\\)").unwrap();

    static ref ALL_KANA: Regex =
        Regex::new("^[\u{3040}-\u{309F}\u{30A0}-\u{30FF}]+$").unwrap();
    static ref HAS_KANJI: Regex = Regex::new("[\u{4E00}-\u{9FAF}]").unwrap();
    static ref FORBIDDEN_CHARS: Regex = Regex::new("[&\"<>]").unwrap();
}

/// Raised when a base/ruby pair fails validation
#[derive(Debug, Error, PartialEq, Eq)]
#[error("無効なルビです")]
pub struct InvalidRubyError;

/// The three ways a ruby annotation can be written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubyForm {
    /// ｜base《ruby》
    Basic,
    /// base《ruby》
    Short,
    /// base(ruby)
    Paren,
}

/// One run of parsed passage text
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RubySegment {
    /// Plain text between annotations
    Text { content: String },
    /// An annotated base with its reading
    Ruby {
        #[serde(rename = "content")]
        base: String,
        ruby: String,
    },
}

/// Checks the constraints on a base/ruby pair
///
/// Both strings must be 1 to 10 characters and free of `& " < >`,
/// which would break the rendered markup.
pub fn validate_ruby(ruby: &str, base_text: &str) -> bool {
    let ruby_len = ruby.chars().count();
    if ruby_len == 0 || ruby_len > 10 {
        return false;
    }
    let base_len = base_text.chars().count();
    if base_len == 0 || base_len > 10 {
        return false;
    }
    !FORBIDDEN_CHARS.is_match(ruby) && !FORBIDDEN_CHARS.is_match(base_text)
}

struct RubyMatch {
    start: usize,
    end: usize,
    base: String,
    ruby: String,
}

fn collect_matches(processed: &str) -> Vec<RubyMatch> {
    let mut matches = Vec::new();

    for caps in BASIC_PATTERN.captures_iter(processed) {
        push_if_valid(&mut matches, &caps, false);
    }
    for caps in SHORT_PATTERN.captures_iter(processed) {
        push_if_valid(&mut matches, &caps, true);
    }
    for caps in PAREN_PATTERN.captures_iter(processed) {
        // the escape form ｜( must not read as ruby
        let whole = caps.get(0).unwrap();
        let preceding = processed[..whole.start()].chars().next_back();
        if matches!(preceding, Some('｜') | Some('|')) {
            continue;
        }
        push_if_valid(&mut matches, &caps, true);
    }

    // stable sort keeps the explicit notation ahead on ties
    matches.sort_by_key(|m| m.start);
    matches
}

fn push_if_valid(matches: &mut Vec<RubyMatch>, caps: &Captures, shorthand: bool) {
    let whole = caps.get(0).unwrap();
    let base = &caps[1];
    let ruby = &caps[2];
    if !validate_ruby(ruby, base) {
        return;
    }
    if shorthand && (!HAS_KANJI.is_match(base) || !ALL_KANA.is_match(ruby)) {
        return;
    }
    matches.push(RubyMatch {
        start: whole.start(),
        end: whole.end(),
        base: base.to_string(),
        ruby: ruby.to_string(),
    });
}

/// Splits a passage into plain-text and ruby segments
///
/// All three notations are recognized; where candidates overlap, the
/// earliest match wins. The escape form `base｜(text)` is protected
/// before matching and restored afterwards so its parentheses stay
/// literal. Whitespace-only gaps between annotations are dropped.
pub fn parse_ruby_text(text: &str) -> Vec<RubySegment> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut escapes: Vec<(String, String)> = Vec::new();
    let processed = ESCAPE_PATTERN
        .replace_all(text, |caps: &Captures| {
            let placeholder = format!("__ESCAPE_{}__", escapes.len());
            escapes.push((caps[1].to_string(), caps[2].to_string()));
            placeholder
        })
        .into_owned();

    let mut filtered: Vec<RubyMatch> = Vec::new();
    for current in collect_matches(&processed) {
        let overlaps = filtered
            .iter()
            .any(|existing| current.start < existing.end && existing.start < current.end);
        if !overlaps {
            filtered.push(current);
        }
    }

    let mut segments = Vec::new();
    let mut text_index = 0;
    for found in &filtered {
        if found.start > text_index {
            let before = &processed[text_index..found.start];
            if !before.trim().is_empty() {
                segments.push(RubySegment::Text {
                    content: before.to_string(),
                });
            }
        }
        segments.push(RubySegment::Ruby {
            base: found.base.clone(),
            ruby: found.ruby.clone(),
        });
        text_index = found.end;
    }
    if text_index < processed.len() {
        let remaining = &processed[text_index..];
        if !remaining.trim().is_empty() {
            segments.push(RubySegment::Text {
                content: remaining.to_string(),
            });
        }
    }

    segments
        .into_iter()
        .map(|segment| match segment {
            RubySegment::Text { mut content } => {
                for (index, (base, inner)) in escapes.iter().enumerate() {
                    let placeholder = format!("__ESCAPE_{index}__");
                    content = content.replacen(&placeholder, &format!("{base}({inner})"), 1);
                }
                RubySegment::Text { content }
            }
            ruby => ruby,
        })
        .collect()
}

/// Writes a base/ruby pair in the requested notation
///
/// The shorthand and parenthesis forms require a kanji base with kana
/// ruby; pairs that do not qualify fall back to the explicit form.
pub fn format_ruby(
    base_text: &str,
    ruby: &str,
    form: RubyForm,
) -> Result<String, InvalidRubyError> {
    if !validate_ruby(ruby, base_text) {
        return Err(InvalidRubyError);
    }
    let qualifies = HAS_KANJI.is_match(base_text) && ALL_KANA.is_match(ruby);
    Ok(match form {
        RubyForm::Basic => format!("｜{base_text}《{ruby}》"),
        RubyForm::Short if qualifies => format!("{base_text}《{ruby}》"),
        RubyForm::Paren if qualifies => format!("{base_text}({ruby})"),
        _ => format!("｜{base_text}《{ruby}》"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruby(base: &str, ruby: &str) -> RubySegment {
        RubySegment::Ruby {
            base: base.to_string(),
            ruby: ruby.to_string(),
        }
    }

    fn text(content: &str) -> RubySegment {
        RubySegment::Text {
            content: content.to_string(),
        }
    }

    #[test]
    fn validation_checks_length_and_forbidden_characters() {
        assert!(validate_ruby("かんじ", "漢字"));
        assert!(!validate_ruby("", "漢字"));
        assert!(!validate_ruby("かんじ", ""));
        assert!(!validate_ruby("a&b", "x"));
        assert!(!validate_ruby("かんじ", "漢<字"));
        assert!(!validate_ruby("あいうえおかきくけこさ", "漢字"));
        assert!(validate_ruby("あいうえおかきくけこ", "漢字"));
    }

    #[test]
    fn explicit_notation_is_parsed() {
        assert_eq!(parse_ruby_text("｜漢字《かんじ》"), vec![ruby("漢字", "かんじ")]);
        // ASCII pipe works too
        assert_eq!(parse_ruby_text("|漢字《かんじ》"), vec![ruby("漢字", "かんじ")]);
    }

    #[test]
    fn shorthand_notation_requires_kanji_base_and_kana_ruby() {
        assert_eq!(
            parse_ruby_text("私は漢字《かんじ》を読む"),
            vec![text("私は"), ruby("漢字", "かんじ"), text("を読む")]
        );
        assert_eq!(parse_ruby_text("珈琲《コーヒー》"), vec![ruby("珈琲", "コーヒー")]);
        // non-kana ruby never matches the shorthand
        assert_eq!(parse_ruby_text("漢字《kanji》"), vec![text("漢字《kanji》")]);
    }

    #[test]
    fn paren_notation_accepts_both_widths() {
        assert_eq!(parse_ruby_text("漢字(かんじ)"), vec![ruby("漢字", "かんじ")]);
        assert_eq!(parse_ruby_text("漢字（かんじ）"), vec![ruby("漢字", "かんじ")]);
    }

    #[test]
    fn escape_notation_keeps_parentheses_literal() {
        assert_eq!(
            parse_ruby_text("その漢字｜(注釈)を見る"),
            vec![text("その漢字(注釈)を見る")]
        );
    }

    #[test]
    fn pipe_before_paren_base_blocks_the_match() {
        assert_eq!(
            parse_ruby_text("｜漢字(かんじ)"),
            vec![text("｜漢字(かんじ)")]
        );
    }

    #[test]
    fn overlapping_candidates_keep_the_explicit_match() {
        // the shorthand also matches inside, but the explicit span wins
        assert_eq!(parse_ruby_text("｜漢字《かんじ》"), vec![ruby("漢字", "かんじ")]);
    }

    #[test]
    fn invalid_pairs_are_left_as_text() {
        let input = "｜漢字《あいうえおかきくけこさ》";
        assert_eq!(parse_ruby_text(input), vec![text(input)]);
    }

    #[test]
    fn whitespace_gaps_between_annotations_are_dropped() {
        assert_eq!(
            parse_ruby_text("｜漢《かん》 ｜字《じ》"),
            vec![ruby("漢", "かん"), ruby("字", "じ")]
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(parse_ruby_text(""), Vec::<RubySegment>::new());
        assert_eq!(parse_ruby_text("こんにちは"), vec![text("こんにちは")]);
    }

    #[test]
    fn segments_serialize_with_a_type_tag() {
        let value = serde_json::to_value(parse_ruby_text("漢字《かんじ》")).unwrap();
        assert_eq!(value[0]["type"], "ruby");
        assert_eq!(value[0]["content"], "漢字");
        assert_eq!(value[0]["ruby"], "かんじ");
    }

    #[test]
    fn formatting_emits_the_requested_notation() {
        assert_eq!(
            format_ruby("漢字", "かんじ", RubyForm::Basic).unwrap(),
            "｜漢字《かんじ》"
        );
        assert_eq!(
            format_ruby("漢字", "かんじ", RubyForm::Short).unwrap(),
            "漢字《かんじ》"
        );
        assert_eq!(
            format_ruby("漢字", "かんじ", RubyForm::Paren).unwrap(),
            "漢字(かんじ)"
        );
    }

    #[test]
    fn formatting_falls_back_to_the_explicit_form() {
        assert_eq!(
            format_ruby("ABC", "エービーシー", RubyForm::Short).unwrap(),
            "｜ABC《エービーシー》"
        );
        assert_eq!(
            format_ruby("ABC", "エービーシー", RubyForm::Paren).unwrap(),
            "｜ABC《エービーシー》"
        );
    }

    #[test]
    fn formatting_rejects_invalid_pairs() {
        let error = format_ruby("漢字", "", RubyForm::Basic).unwrap_err();
        assert_eq!(error.to_string(), "無効なルビです");
    }
}
