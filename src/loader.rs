#![cfg(feature = "web")]

use crate::content::{excel_level_code, ContentImage, Question};
use crate::downloader::{CONTENT_SHEET, QUESTIONS_SHEET};
use calamine::{Data, Reader, Xlsx};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

/// Why an uploaded workbook could not be turned into a content draft
///
/// The display strings double as the user-facing error messages of the
/// upload endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExcelImportError {
    #[error("テンプレートファイルが正しくありません。「コンテンツ」シートが見つかりません。")]
    MissingContentSheet,
    #[error("タイトルが入力されていません")]
    MissingTitle,
    #[error("本文が入力されていません")]
    MissingText,
    #[error("ファイルの処理中にエラーが発生しました: {0}")]
    Unreadable(String),
}

/// Content draft extracted from an uploaded template workbook
///
/// This is not stored directly: it is returned to the editor UI, where the
/// author reviews it, optionally adds images and a thumbnail, and saves it
/// through the regular content endpoints.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportedContent {
    pub title: String,
    pub level: String,
    pub level_code: String,
    pub text: String,
    pub explanation: String,
    pub word_count: Option<u32>,
    pub character_count: Option<u32>,
    pub questions: Vec<Question>,
    pub images: Vec<ContentImage>,
    pub thumbnail: Option<String>,
    pub is_from_excel: bool,
}

/// Parse an uploaded template workbook into a content draft
///
/// The 「コンテンツ」 sheet is scanned row by row for the labelled slots
/// (title, level, standard counts) and for the 本文 and 文章の解説（任意）
/// sections. Placeholder and instruction lines left over from the blank
/// template are dropped, so uploading an untouched template fails with
/// `MissingText` rather than producing instruction text as a passage.
/// The 「問題」 sheet is optional; malformed question rows are skipped.
///
/// # Arguments
/// * `bytes` - Raw bytes of the uploaded XLSX file
///
/// # Returns
/// * `Result<ImportedContent, ExcelImportError>` - The extracted draft or an error
pub fn parse_content_workbook(bytes: &[u8]) -> Result<ImportedContent, ExcelImportError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|error| ExcelImportError::Unreadable(error.to_string()))?;

    if !workbook
        .sheet_names()
        .iter()
        .any(|name| name == CONTENT_SHEET)
    {
        return Err(ExcelImportError::MissingContentSheet);
    }

    let range = workbook
        .worksheet_range(CONTENT_SHEET)
        .map_err(|error| ExcelImportError::Unreadable(error.to_string()))?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let mut title = String::new();
    let mut level = "初級修了レベル".to_string();
    let mut character_count = None;
    let mut word_count = None;
    let mut text = String::new();
    let mut explanation = String::new();

    for (index, row) in rows.iter().enumerate() {
        let heading = row.first().map(String::as_str).unwrap_or("");
        let value = row.get(1).map(String::as_str).unwrap_or("");

        match heading {
            "タイトル" if !value.is_empty() => {
                title = value.to_string();
            }
            "レベル" if !value.is_empty() => {
                if matches!(value, "初級修了レベル" | "中級レベル" | "上級レベル") {
                    level = value.to_string();
                }
            }
            "標準文字数" if !value.is_empty() => {
                character_count = value.parse::<u32>().ok();
            }
            "標準語数" if !value.is_empty() => {
                word_count = value.parse::<u32>().ok();
            }
            "本文" => {
                text = section_text(&rows[index + 1..], Some("文章の解説（任意）"));
            }
            "文章の解説（任意）" => {
                explanation = section_text(&rows[index + 1..], None);
            }
            _ => {}
        }
    }

    if title.is_empty() {
        return Err(ExcelImportError::MissingTitle);
    }
    if text.is_empty() {
        return Err(ExcelImportError::MissingText);
    }

    let mut questions = Vec::new();
    if workbook
        .sheet_names()
        .iter()
        .any(|name| name == QUESTIONS_SHEET)
    {
        let range = workbook
            .worksheet_range(QUESTIONS_SHEET)
            .map_err(|error| ExcelImportError::Unreadable(error.to_string()))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        questions = parse_questions(&rows);
    }

    let level_code = excel_level_code(&level).to_string();

    Ok(ImportedContent {
        title,
        level,
        level_code,
        text,
        explanation,
        word_count,
        character_count,
        questions,
        images: Vec::new(),
        thumbnail: None,
        is_from_excel: true,
    })
}

/// Placeholder and instruction lines from the blank template that must not
/// leak into an imported passage.
pub fn is_template_boilerplate(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("例：")
        || trimmed.starts_with('・')
        || trimmed.starts_with('※')
        || (trimmed.starts_with("ここに") && trimmed.ends_with("入力してください。"))
        || trimmed == "ルビを振る場合は次の記法を使用してください："
}

/// Collect the lines of a 本文 or 解説 section
///
/// A row belongs to the section when one of its first two cells is filled.
/// All filled cells of a row are joined with spaces into one line. Scanning
/// stops at `stop_heading` when given, otherwise at the end of the sheet.
fn section_text(rows: &[Vec<String>], stop_heading: Option<&str>) -> String {
    let mut lines = Vec::new();

    for row in rows {
        let heading = row.first().map(String::as_str).unwrap_or("");
        if stop_heading == Some(heading) {
            break;
        }

        let second = row.get(1).map(String::as_str).unwrap_or("");
        if heading.is_empty() && second.is_empty() {
            continue;
        }

        let line = row
            .iter()
            .filter(|cell| !cell.is_empty())
            .cloned()
            .collect::<Vec<String>>()
            .join(" ");
        if is_template_boilerplate(&line) {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Parse question rows below the 問題番号 header row
///
/// Columns are located by their headings, so extra option columns
/// (選択肢7, 選択肢8, ...) are picked up in numeric order. Rows without a
/// question text, rows whose text is an 例： sample and rows with fewer
/// than two options are skipped. A correct-answer number outside 1..=n
/// falls back to the first option.
fn parse_questions(rows: &[Vec<String>]) -> Vec<Question> {
    let Some(header_index) = rows
        .iter()
        .position(|row| row.first().map(String::as_str) == Some("問題番号"))
    else {
        return Vec::new();
    };

    let mut question_column = None;
    let mut correct_column = None;
    let mut explanation_column = None;
    let mut option_columns: Vec<(u32, usize)> = Vec::new();

    for (column, heading) in rows[header_index].iter().enumerate() {
        if heading == "問題文" {
            question_column = Some(column);
        } else if let Some(suffix) = heading.strip_prefix("選択肢") {
            option_columns.push((suffix.parse().unwrap_or(0), column));
        } else if heading.contains("正解番号") {
            correct_column = Some(column);
        } else if heading.contains("解説") {
            explanation_column = Some(column);
        }
    }
    option_columns.sort_by_key(|(number, _)| *number);

    let mut questions = Vec::new();
    for row in &rows[header_index + 1..] {
        let question_text = question_column
            .and_then(|column| row.get(column))
            .map(String::as_str)
            .unwrap_or("");
        if question_text.is_empty() || question_text.starts_with("例：") {
            continue;
        }

        let options: Vec<String> = option_columns
            .iter()
            .filter_map(|(_, column)| row.get(*column))
            .filter(|cell| !cell.is_empty())
            .cloned()
            .collect();
        if options.len() < 2 {
            continue;
        }

        let correct_answer = correct_column
            .and_then(|column| row.get(column))
            .and_then(|cell| cell.parse::<usize>().ok())
            .filter(|answer| (1..=options.len()).contains(answer))
            .map(|answer| answer - 1)
            .unwrap_or(0);

        let explanation = explanation_column
            .and_then(|column| row.get(column))
            .filter(|cell| !cell.is_empty())
            .cloned();

        questions.push(Question {
            id: 0,
            question: question_text.to_string(),
            options,
            correct_answer,
            explanation,
        });
    }

    questions
}

/// Text of a cell as entered by the author, trimmed. Whole numbers are
/// rendered without a decimal point so 「3」 typed as a number reads back
/// as "3".
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.trim().to_string(),
        Data::Float(value) => {
            if value.fract() == 0.0 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::downloader::{content_export_workbook, content_template_workbook};
    use rust_xlsxwriter::{Workbook, Worksheet};

    fn minimal_content_sheet() -> Worksheet {
        let mut sheet = Worksheet::new();
        sheet.set_name("コンテンツ").unwrap();
        sheet.write_string(0, 0, "タイトル").unwrap();
        sheet.write_string(0, 1, "てすと").unwrap();
        sheet.write_string(1, 0, "本文").unwrap();
        sheet.write_string(2, 0, "これは本文です。").unwrap();
        sheet
    }

    #[test]
    fn export_then_import_round_trips() {
        let content = Content {
            id: "momotaro".to_string(),
            title: "ももたろう".to_string(),
            level: "初級修了レベル".to_string(),
            level_code: "beginner".to_string(),
            text: "むかし、むかし、あるところに。\nおじいさんとおばあさんが｜住《す》んでいました。"
                .to_string(),
            explanation: Some("昔話の定番です。".to_string()),
            word_count: Some(18),
            character_count: Some(33),
            images: Vec::new(),
            thumbnail: None,
            order_index: 0,
            label_ids: Vec::new(),
            questions: vec![Question {
                id: 1,
                question: "おじいさんは何をしに山に行きましたか。".to_string(),
                options: vec![
                    "しば刈り".to_string(),
                    "つり".to_string(),
                    "買い物".to_string(),
                    "散歩".to_string(),
                ],
                correct_answer: 2,
                explanation: Some("本文の二行目にあります。".to_string()),
            }],
        };

        let buffer = content_export_workbook(&content).unwrap();
        let imported = parse_content_workbook(&buffer).unwrap();

        assert_eq!(imported.title, "ももたろう");
        assert_eq!(imported.level, "初級修了レベル");
        assert_eq!(imported.level_code, "beginner");
        assert_eq!(imported.text, content.text);
        assert_eq!(imported.explanation, "昔話の定番です。");
        assert_eq!(imported.word_count, Some(18));
        assert_eq!(imported.character_count, Some(33));
        assert!(imported.is_from_excel);
        assert_eq!(imported.questions.len(), 1);
        let question = &imported.questions[0];
        assert_eq!(question.question, "おじいさんは何をしに山に行きましたか。");
        assert_eq!(question.options.len(), 4);
        assert_eq!(question.correct_answer, 2);
        assert_eq!(
            question.explanation.as_deref(),
            Some("本文の二行目にあります。")
        );
    }

    #[test]
    fn pristine_template_has_no_body() {
        let buffer = content_template_workbook().unwrap();
        let error = parse_content_workbook(&buffer).unwrap_err();
        assert_eq!(error, ExcelImportError::MissingText);
    }

    #[test]
    fn missing_content_sheet_is_rejected() {
        let mut workbook = Workbook::new();
        let mut sheet = Worksheet::new();
        sheet.set_name("シート1").unwrap();
        sheet.write_string(0, 0, "データ").unwrap();
        workbook.push_worksheet(sheet);
        let buffer = workbook.save_to_buffer().unwrap();

        let error = parse_content_workbook(&buffer).unwrap_err();
        assert_eq!(error, ExcelImportError::MissingContentSheet);
    }

    #[test]
    fn unreadable_bytes_report_processing_error() {
        let error = parse_content_workbook(b"not an excel file").unwrap_err();
        assert!(matches!(error, ExcelImportError::Unreadable(_)));
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut workbook = Workbook::new();
        let mut sheet = Worksheet::new();
        sheet.set_name("コンテンツ").unwrap();
        sheet.write_string(0, 0, "本文").unwrap();
        sheet.write_string(1, 0, "本文だけのファイルです。").unwrap();
        workbook.push_worksheet(sheet);
        let buffer = workbook.save_to_buffer().unwrap();

        let error = parse_content_workbook(&buffer).unwrap_err();
        assert_eq!(error, ExcelImportError::MissingTitle);
    }

    #[test]
    fn unknown_level_falls_back_to_beginner() {
        let mut workbook = Workbook::new();
        let mut sheet = Worksheet::new();
        sheet.set_name("コンテンツ").unwrap();
        sheet.write_string(0, 0, "タイトル").unwrap();
        sheet.write_string(0, 1, "てすと").unwrap();
        sheet.write_string(1, 0, "レベル").unwrap();
        sheet.write_string(1, 1, "未知のレベル").unwrap();
        sheet.write_string(2, 0, "本文").unwrap();
        sheet.write_string(3, 0, "これは本文です。").unwrap();
        workbook.push_worksheet(sheet);
        let buffer = workbook.save_to_buffer().unwrap();

        let imported = parse_content_workbook(&buffer).unwrap();
        assert_eq!(imported.level, "初級修了レベル");
        assert_eq!(imported.level_code, "beginner");
    }

    #[test]
    fn body_rows_join_filled_cells_with_spaces() {
        let mut workbook = Workbook::new();
        let mut sheet = Worksheet::new();
        sheet.set_name("コンテンツ").unwrap();
        sheet.write_string(0, 0, "タイトル").unwrap();
        sheet.write_string(0, 1, "セル結合").unwrap();
        sheet.write_string(1, 0, "本文").unwrap();
        sheet.write_string(2, 0, "左の セル").unwrap();
        sheet.write_string(2, 1, "右のセル").unwrap();
        workbook.push_worksheet(sheet);
        let buffer = workbook.save_to_buffer().unwrap();

        let imported = parse_content_workbook(&buffer).unwrap();
        assert_eq!(imported.text, "左の セル 右のセル");
    }

    #[test]
    fn malformed_question_rows_are_skipped() {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(minimal_content_sheet());

        let mut questions = Worksheet::new();
        questions.set_name("問題").unwrap();
        let header = [
            "問題番号",
            "問題文",
            "選択肢1",
            "選択肢2",
            "選択肢3",
            "選択肢4",
            "選択肢5",
            "選択肢6",
            "正解番号（1から）",
            "問題の解説（任意）",
        ];
        for (column, heading) in header.iter().enumerate() {
            questions.write_string(0, column as u16, *heading).unwrap();
        }
        // sample row left over from the template
        questions.write_string(1, 1, "例：これはサンプルです。").unwrap();
        questions.write_string(1, 2, "あ").unwrap();
        questions.write_string(1, 3, "い").unwrap();
        // one option only
        questions.write_string(2, 1, "一つしかない問題。").unwrap();
        questions.write_string(2, 2, "あ").unwrap();
        // valid row with out-of-range correct number and no explanation
        questions.write_string(3, 1, "どちらですか。").unwrap();
        questions.write_string(3, 2, "あ").unwrap();
        questions.write_string(3, 3, "い").unwrap();
        questions.write_number(3, 8, 9.0).unwrap();
        workbook.push_worksheet(questions);
        let buffer = workbook.save_to_buffer().unwrap();

        let imported = parse_content_workbook(&buffer).unwrap();
        assert_eq!(imported.questions.len(), 1);
        let question = &imported.questions[0];
        assert_eq!(question.question, "どちらですか。");
        assert_eq!(question.options, vec!["あ".to_string(), "い".to_string()]);
        assert_eq!(question.correct_answer, 0);
        assert_eq!(question.explanation, None);
    }

    #[test]
    fn boilerplate_detection() {
        assert!(is_template_boilerplate("例：ももたろう"));
        assert!(is_template_boilerplate("・基本記法: ｜漢字《かんじ》"));
        assert!(is_template_boilerplate("※注意事項"));
        assert!(is_template_boilerplate("ここに本文を入力してください。"));
        assert!(is_template_boilerplate(
            "ルビを振る場合は次の記法を使用してください："
        ));
        assert!(!is_template_boilerplate("むかし、むかし、あるところに。"));
        assert!(!is_template_boilerplate("ここにある湖は大きい。"));
    }
}
