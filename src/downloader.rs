#![cfg(feature = "web")]

use crate::content::{excel_level_name, Content};
use crate::speed::{count_characters, count_words};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::error::Error;

/// Download filename for the blank content template workbook.
pub const TEMPLATE_FILENAME: &str = "speed_reading_template.xlsx";

/// Name of the sheet holding title, level, counts, body and explanation.
pub const CONTENT_SHEET: &str = "コンテンツ";

/// Name of the sheet holding comprehension questions.
pub const QUESTIONS_SHEET: &str = "問題";

/// Name of the read-only instructions sheet.
pub const INSTRUCTIONS_SHEET: &str = "使用方法";

const QUESTION_NOTES: [&str; 5] = [
    "・選択肢は最低2つ、最大6つまで設定できます",
    "・選択肢列は必要な数だけ使用してください（選択肢1、選択肢2...）。列を追加する場合は「選択肢7」「選択肢8」のように番号を続けてください",
    "・正解番号は1から始まる数字で指定してください",
    "・問題数に制限はありません。必要な分だけ行を追加してください",
    "・問題が不要な場合は、ヘッダー行以下を空のままにしてください",
];

const QUESTION_HEADER: [&str; 10] = [
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

const INSTRUCTIONS: [&str; 29] = [
    "使用方法",
    "",
    "1. 基本情報の入力",
    "・「コンテンツ」シートでタイトルとレベルを入力してください",
    "・レベルは「初級修了レベル」「中級レベル」「上級レベル」から選択してください",
    "",
    "2. 本文の入力",
    "・「コンテンツ」シートの本文欄に読解練習用の文章を入力してください",
    "・ルビ（振り仮名）を使用する場合は、指定の記法を使用してください",
    "・文章の解説は任意です",
    "",
    "3. 問題の入力",
    "・「問題」シートに理解度確認問題を入力してください",
    "・問題数に制限はありません（必要な分だけ行を追加できます）",
    "・選択肢は最低2つ、最大6つまで設定できます",
    "・選択肢は左から順に配置し、空欄があれば無視されます",
    "・正解番号と解説は必ず選択肢の右側に配置されています",
    "・問題が不要な場合は、ヘッダー行より下を空のままにしてください",
    "",
    "4. 重要な注意事項",
    "・「問題」シートのヘッダー行（問題番号、問題文、選択肢1...）は変更しないでください",
    "・選択肢の列は「選択肢1」「選択肢2」...という名前である必要があります",
    "・「正解番号（1から）」と「問題の解説（任意）」の列名も変更しないでください",
    "",
    "5. アップロード後の作業",
    "・Excelファイルをアップロード後、編集画面で以下の作業が可能です：",
    "  - サムネイル画像の追加",
    "  - 本文中に画像の挿入",
    "  - 内容の最終確認と修正",
];

/// Build the blank content template workbook
///
/// This function produces the Excel template that authors download, fill in
/// and upload back. It contains three sheets:
/// - 「コンテンツ」 with labelled slots for title, level, the optional
///   standard character/word counts, the body text and the explanation
/// - 「問題」 with usage notes, a header row and one worked sample question
/// - 「使用方法」 with step-by-step instructions
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn content_template_workbook() -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();

    let mut content = content_sheet_scaffold()?;
    content.write_string(3, 1, "例：ももたろう")?;
    content.write_string(4, 1, "初級修了レベル")?;
    content.write_string(9, 0, "ここに本文を入力してください。")?;
    content.write_string(10, 0, "ルビを振る場合は次の記法を使用してください：")?;
    content.write_string(11, 0, "・基本記法: ｜漢字《かんじ》")?;
    content.write_string(12, 0, "・省略記法: 漢字《かんじ》")?;
    content.write_string(13, 0, "・括弧記法: 漢字(かんじ)")?;
    content.write_string(15, 0, "文章の解説（任意）")?;
    content.write_string(16, 0, "ここに文章の解説を入力してください。")?;
    workbook.push_worksheet(content);

    let mut questions = questions_sheet_scaffold()?;
    questions.write_string(10, 0, "1")?;
    questions.write_string(10, 1, "例：おじいさんは何をしに山に行きましたか。")?;
    questions.write_string(10, 2, "しば刈り")?;
    questions.write_string(10, 3, "つり")?;
    questions.write_string(10, 4, "買い物")?;
    questions.write_string(10, 5, "散歩")?;
    questions.write_string(10, 8, "1")?;
    questions.write_string(10, 9, "おじいさんは山にしば刈りに行きました。")?;
    for number in 2..=10u32 {
        questions.write_string(9 + number, 0, number.to_string())?;
    }
    workbook.push_worksheet(questions);

    workbook.push_worksheet(instructions_sheet()?);

    // Save to memory buffer
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Export an existing content as a filled-in template workbook
///
/// The output uses the same sheet layout as the blank template, so an
/// exported file can be edited and uploaded again. Standard counts come
/// from the stored content when present and are recomputed from the body
/// text otherwise. Ruby notation in the text is exported verbatim.
///
/// # Arguments
/// * `content` - The content to export
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn content_export_workbook(content: &Content) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();

    let character_count = match content.character_count {
        Some(count) => count,
        None => count_characters(&content.text).standard_count,
    };
    let word_count = match content.word_count {
        Some(count) => count,
        None => count_words(&content.text).standard_word_count,
    };

    let mut sheet = content_sheet_scaffold()?;
    sheet.write_string(3, 1, &content.title)?;
    sheet.write_string(4, 1, excel_level_name(&content.level_code))?;
    sheet.write_number(5, 1, character_count as f64)?;
    sheet.write_number(6, 1, word_count as f64)?;

    let mut row = 9u32;
    for line in content.text.lines() {
        sheet.write_string(row, 0, line)?;
        row += 1;
    }
    row += 1;
    sheet.write_string(row, 0, "文章の解説（任意）")?;
    row += 1;
    if let Some(explanation) = &content.explanation {
        for line in explanation.lines() {
            sheet.write_string(row, 0, line)?;
            row += 1;
        }
    }
    workbook.push_worksheet(sheet);

    let mut questions = questions_sheet_scaffold()?;
    for (index, question) in content.questions.iter().enumerate() {
        let row = 10 + index as u32;
        questions.write_number(row, 0, (index + 1) as f64)?;
        questions.write_string(row, 1, &question.question)?;
        for (slot, option) in question.options.iter().take(6).enumerate() {
            questions.write_string(row, 2 + slot as u16, option)?;
        }
        questions.write_number(row, 8, (question.correct_answer + 1) as f64)?;
        if let Some(explanation) = &question.explanation {
            questions.write_string(row, 9, explanation)?;
        }
    }
    workbook.push_worksheet(questions);

    workbook.push_worksheet(instructions_sheet()?);

    // Save to memory buffer
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Shared skeleton of the 「コンテンツ」 sheet: section headings, the level
/// choices hint and the count hints, without any content-specific values.
fn content_sheet_scaffold() -> Result<Worksheet, Box<dyn Error>> {
    let mut sheet = Worksheet::new();
    sheet.set_name(CONTENT_SHEET)?;

    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 40)?;
    sheet.set_column_width(2, 40)?;
    sheet.set_column_width(3, 20)?;
    sheet.set_column_width(4, 20)?;

    sheet.write_string(0, 0, "速読ゴリラ コンテンツテンプレート")?;
    sheet.write_string(2, 0, "基本情報")?;
    sheet.write_string(3, 0, "タイトル")?;
    sheet.write_string(4, 0, "レベル")?;
    sheet.write_string(4, 2, "※選択肢: 初級修了レベル、中級レベル、上級レベル")?;
    sheet.write_string(5, 0, "標準文字数")?;
    sheet.write_string(5, 2, "※任意：未入力の場合は本文から自動計算")?;
    sheet.write_string(6, 0, "標準語数")?;
    sheet.write_string(6, 2, "※任意：未入力の場合は本文から自動計算")?;
    sheet.write_string(8, 0, "本文")?;

    Ok(sheet)
}

/// Shared skeleton of the 「問題」 sheet: title, usage notes and the header
/// row. Question rows start at row 10.
fn questions_sheet_scaffold() -> Result<Worksheet, Box<dyn Error>> {
    let mut sheet = Worksheet::new();
    sheet.set_name(QUESTIONS_SHEET)?;

    sheet.set_column_width(0, 10)?;
    sheet.set_column_width(1, 50)?;
    for column in 2..=7u16 {
        sheet.set_column_width(column, 20)?;
    }
    sheet.set_column_width(8, 15)?;
    sheet.set_column_width(9, 50)?;

    sheet.write_string(0, 0, "理解度確認問題")?;
    sheet.write_string(2, 0, "※注意事項")?;
    for (offset, note) in QUESTION_NOTES.iter().enumerate() {
        sheet.write_string(3 + offset as u32, 0, *note)?;
    }
    for (column, heading) in QUESTION_HEADER.iter().enumerate() {
        sheet.write_string(9, column as u16, *heading)?;
    }

    Ok(sheet)
}

fn instructions_sheet() -> Result<Worksheet, Box<dyn Error>> {
    let mut sheet = Worksheet::new();
    sheet.set_name(INSTRUCTIONS_SHEET)?;

    sheet.set_column_width(0, 60)?;
    sheet.set_column_width(1, 60)?;

    for (row, line) in INSTRUCTIONS.iter().enumerate() {
        if !line.is_empty() {
            sheet.write_string(row as u32, 0, *line)?;
        }
    }

    Ok(sheet)
}
