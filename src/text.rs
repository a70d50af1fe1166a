use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Placeholder for a single inline image, e.g. `{{IMAGE:fig1}}`
    static ref IMAGE_PLACEHOLDER: Regex = Regex::new(r"\{\{IMAGE:[^}]+\}\}").unwrap();

    /// Heuristics that flag a line as carrying an image rather than prose.
    /// Checked in order against the trimmed line; first hit wins.
    static ref IMAGE_LINE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\{\{IMAGE:[^}]+\}\}").unwrap(),
        Regex::new(r"\{\{IMAGES:[^}]+\}\}").unwrap(),
        Regex::new(r"!\[.*?\]\(.*?\)").unwrap(),
        Regex::new(r"(?i)<img[^>]*>").unwrap(),
        Regex::new(r"[【\[（(].*?画像.*?[】\]）)]").unwrap(),
        Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)(\?.*)?$").unwrap(),
        Regex::new(r"^(図|画像|写真|イラスト)\s*[:：]?").unwrap(),
    ];
}

/// Returns true when a line is an image reference or caption, not prose
///
/// Recognizes image placeholders, markdown/HTML image syntax, bracketed
/// notes containing 画像, bare image file names, and caption lines that
/// open with 図, 画像, 写真 or イラスト.
pub fn is_image_line(line: &str) -> bool {
    let trimmed = line.trim();
    IMAGE_LINE_PATTERNS.iter().any(|pattern| pattern.is_match(trimmed))
}

/// Splits a passage into the lines a reader actually reads
///
/// Blank lines and image lines are dropped; surviving lines keep their
/// original indentation so displayed text matches the stored text.
pub fn eligible_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !is_image_line(trimmed)
        })
        .collect()
}

/// Removes `{{IMAGE:...}}` placeholders before character counting
///
/// Only the single-image form is stripped; the text around the placeholder
/// is left untouched.
pub fn strip_image_placeholders(text: &str) -> String {
    IMAGE_PLACEHOLDER.replace_all(text, "").into_owned()
}
