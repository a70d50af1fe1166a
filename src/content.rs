use serde::{Deserialize, Serialize};

/// Default badge color assigned to labels created without an explicit color
pub const DEFAULT_LABEL_COLOR: &str = "#6366f1";

/// A reading passage with its metadata and comprehension questions
///
/// This is the central record of the library: the passage text (which may
/// contain `{{IMAGE:<id>}}` placeholders and ruby annotations), its difficulty
/// level, optional inline images, and the questions asked after reading.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Unique identifier for the passage
    pub id: String,

    /// Display title shown in listings and on results
    pub title: String,

    /// Level display name as shown to readers (e.g. 中級レベル)
    pub level: String,

    /// Level id this passage belongs to (e.g. "intermediate")
    pub level_code: String,

    /// Passage body: plain text with newline-separated lines, image
    /// placeholders and ruby notation
    pub text: String,

    /// Optional commentary shown on the result page
    #[serde(default)]
    pub explanation: Option<String>,

    /// Manually entered standard word count used for speed statistics
    #[serde(default)]
    pub word_count: Option<u32>,

    /// Manually entered standard character count used for speed statistics
    #[serde(default)]
    pub character_count: Option<u32>,

    /// Inline images referenced from the text via `{{IMAGE:<id>}}`
    #[serde(default)]
    pub images: Vec<ContentImage>,

    /// Optional thumbnail shown in the passage list (a data URL)
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Position in the manually curated listing order
    #[serde(default)]
    pub order_index: i64,

    /// Ids of the labels attached to this passage
    #[serde(default)]
    pub label_ids: Vec<String>,

    /// Comprehension questions, in presentation order
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Content {
    /// Reassign the 1-based question ids from their position
    ///
    /// Question ids are presentational (問題 1, 問題 2, ...) and derived from
    /// order, so they are renumbered whenever a passage is stored.
    pub fn renumber_questions(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            question.id = index as u32 + 1;
        }
    }
}

/// A single comprehension question with its answer options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// 1-based display number, derived from position
    #[serde(default)]
    pub id: u32,

    /// Question text
    pub question: String,

    /// Answer options in display order (2 to 6 entries)
    pub options: Vec<String>,

    /// 0-based index of the correct option
    pub correct_answer: usize,

    /// Optional explanation shown with the per-question result
    #[serde(default)]
    pub explanation: Option<String>,
}

/// An inline image carried by a passage
///
/// Images travel as already-encoded data URLs in the `base64` field; the
/// server never decodes or recompresses them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentImage {
    /// Identifier referenced from the passage text
    pub id: String,

    /// Image payload as a data URL
    pub base64: String,

    /// Alt text for accessibility
    #[serde(default)]
    pub alt: Option<String>,

    /// Caption rendered under the image
    #[serde(default)]
    pub caption: Option<String>,
}

/// An ordered difficulty tier
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Identifier, lowercase alphanumerics and hyphens (e.g. "beginner")
    pub id: String,

    /// Name shown to readers, at most 20 characters
    pub display_name: String,

    /// Optional alternate name, at most 20 characters
    #[serde(default)]
    pub alt_name: Option<String>,

    /// Position in level listings
    pub order_index: i64,

    /// Whether new passages fall into this level by default
    #[serde(default)]
    pub is_default: bool,
}

/// A free-form tag that can be attached to passages
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,

    /// Label name, unique across the library
    pub name: String,

    /// Badge color as a hex string
    pub color: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// The singleton "about this site" page
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AboutPage {
    /// Page body (markdown-ish free text)
    pub content: String,

    /// Optional image attachments, carried as an opaque JSON string
    #[serde(default)]
    pub images: Option<String>,

    /// RFC 3339 timestamp of the last update
    pub updated_at: String,
}

/// The singleton site description shown on the landing page
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    /// Fixed record id, always "default"
    pub id: String,
    pub title: String,
    pub description: String,
    pub developers: Vec<Developer>,
    pub features: Vec<SiteFeature>,
    pub usage: Vec<UsageStep>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub name: String,
    pub role: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteFeature {
    pub icon: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageStep {
    pub step: u32,
    pub description: String,
}

/// Returns the display name for a built-in level code
///
/// Unknown codes are echoed back unchanged so that custom levels created
/// by staff keep whatever name they were stored with.
pub fn level_display_name(level_code: &str) -> &str {
    match level_code {
        "beginner" => "中級前半",
        "intermediate" => "中級レベル",
        "advanced" => "上級レベル",
        other => other,
    }
}

/// Returns the level code for a built-in display name, defaulting to beginner
pub fn level_code_for(display_name: &str) -> &str {
    match display_name {
        "中級前半" => "beginner",
        "中級レベル" => "intermediate",
        "上級レベル" => "advanced",
        _ => "beginner",
    }
}

/// Level names used in the Excel workbooks
///
/// The workbook templates predate the level rename and still use
/// 初級修了レベル for the beginner tier.
pub fn excel_level_name(level_code: &str) -> &str {
    match level_code {
        "intermediate" => "中級レベル",
        "advanced" => "上級レベル",
        _ => "初級修了レベル",
    }
}

/// Maps an Excel workbook level name to its level code, defaulting to beginner
pub fn excel_level_code(level_name: &str) -> &str {
    match level_name {
        "中級レベル" => "intermediate",
        "上級レベル" => "advanced",
        _ => "beginner",
    }
}

/// The three built-in levels seeded into a fresh library
pub fn default_levels() -> Vec<Level> {
    vec![
        Level {
            id: "beginner".to_string(),
            display_name: "中級前半".to_string(),
            alt_name: None,
            order_index: 1,
            is_default: true,
        },
        Level {
            id: "intermediate".to_string(),
            display_name: "中級レベル".to_string(),
            alt_name: None,
            order_index: 2,
            is_default: false,
        },
        Level {
            id: "advanced".to_string(),
            display_name: "上級レベル".to_string(),
            alt_name: None,
            order_index: 3,
            is_default: false,
        },
    ]
}

impl SiteInfo {
    /// The default site description, materialized on first read
    pub fn default_info() -> SiteInfo {
        SiteInfo {
            id: "default".to_string(),
            title: "SuiReN".to_string(),
            description: "SuiReN（スイレン）は、日本語学習者のための速読練習アプリケーションです。"
                .to_string(),
            developers: vec![Developer {
                name: "開発者名".to_string(),
                role: "開発責任者".to_string(),
                description: "プロジェクトの企画・開発を担当".to_string(),
            }],
            features: vec![
                SiteFeature {
                    icon: "⏱️".to_string(),
                    title: "読書時間の測定".to_string(),
                    description: "読み始めから読み終わりまでの時間を正確に計測".to_string(),
                },
                SiteFeature {
                    icon: "📊".to_string(),
                    title: "理解度チェック".to_string(),
                    description: "読み物に関する問題で理解度を確認".to_string(),
                },
                SiteFeature {
                    icon: "🎯".to_string(),
                    title: "レベル別コンテンツ".to_string(),
                    description: "中級前半、中級、上級の3つのレベルに対応".to_string(),
                },
                SiteFeature {
                    icon: "📱".to_string(),
                    title: "結果のQRコード化".to_string(),
                    description: "成績に応じて色分けされたQRコードで結果を共有".to_string(),
                },
            ],
            usage: vec![
                UsageStep {
                    step: 1,
                    description: "ホーム画面から読みたい読み物を選択".to_string(),
                },
                UsageStep {
                    step: 2,
                    description: "「読み始める」ボタンをクリックして速読開始".to_string(),
                },
                UsageStep {
                    step: 3,
                    description: "読み終わったら「読み終わった」ボタンをクリック".to_string(),
                },
                UsageStep {
                    step: 4,
                    description: "理解度チェックの問題に回答".to_string(),
                },
                UsageStep {
                    step: 5,
                    description: "結果を確認し、QRコードで記録を保存".to_string(),
                },
            ],
        }
    }
}
