use crate::content::{
    AboutPage, Content, ContentImage, Developer, Label, Level, Question, SiteFeature, SiteInfo,
    UsageStep, DEFAULT_LABEL_COLOR,
};
use crate::result::now_timestamp;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref LEVEL_ID_REGEX: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

/// Errors raised by library operations
///
/// The display strings double as the API error messages, which is why the
/// level and about variants carry Japanese text: the admin screens show them
/// verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Content not found")]
    ContentNotFound,

    #[error("Content with this ID already exists")]
    ContentIdTaken,

    #[error("Content not found in level")]
    ContentNotInLevel,

    #[error("レベルが見つかりません")]
    LevelNotFound,

    #[error("必須項目が不足しています")]
    LevelFieldsMissing,

    #[error("レベルIDは英小文字、数字、ハイフンのみ使用可能です")]
    LevelIdInvalid,

    #[error("このレベルIDは既に使用されています")]
    LevelIdTaken,

    #[error("表示名は20文字以内で入力してください")]
    LevelNameTooLong,

    #[error("別名は20文字以内で入力してください")]
    LevelAltNameTooLong,

    #[error("デフォルトレベルは削除できません")]
    DefaultLevelUndeletable,

    #[error("移行先レベルを指定してください")]
    MigrationTargetRequired,

    #[error("移行先レベルが見つかりません")]
    MigrationTargetNotFound,

    #[error("Label not found")]
    LabelNotFound,

    #[error("Label name is required")]
    LabelNameRequired,

    #[error("Label with this name already exists")]
    LabelNameTaken,
}

/// Payload for creating or replacing a passage
///
/// Carries everything a passage stores except its id, listing position and
/// label attachments, which are managed by their own operations.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
    pub title: String,
    pub level: String,
    pub level_code: String,
    pub text: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub word_count: Option<u32>,
    #[serde(default)]
    pub character_count: Option<u32>,
    #[serde(default)]
    pub images: Vec<ContentImage>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Payload for creating a level; all fields are required but arrive optional
/// so the missing-field error can be reported instead of a decode failure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LevelDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// Partial update for a level; absent fields keep their stored value
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub alt_name: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// Payload for creating a label
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update for a label; absent fields keep their stored value
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update for the site description
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfoUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub developers: Option<Vec<Developer>>,
    #[serde(default)]
    pub features: Option<Vec<SiteFeature>>,
    #[serde(default)]
    pub usage: Option<Vec<UsageStep>>,
}

/// Outcome of deleting a level, echoed back to the admin screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDeletion {
    /// Level the orphaned passages were moved to, if any were moved
    pub moved_contents_to: Option<String>,
    /// How many passages were moved
    pub deleted_content_count: usize,
}

/// The whole site library: passages, levels, labels and the two singleton
/// pages
///
/// This is the unit of persistence; the server keeps one instance behind a
/// lock and snapshots it to disk after every mutation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Library {
    pub contents: Vec<Content>,
    pub levels: Vec<Level>,
    pub labels: Vec<Label>,
    pub about: Option<AboutPage>,
    pub site_info: Option<SiteInfo>,
}

impl Library {
    /// Creates an empty library seeded with the built-in levels
    pub fn new() -> Self {
        Library {
            contents: Vec::new(),
            levels: crate::content::default_levels(),
            labels: Vec::new(),
            about: None,
            site_info: None,
        }
    }

    // ----- contents -----

    /// All passages in listing order: manual position first, id as tiebreak
    pub fn contents_ordered(&self) -> Vec<&Content> {
        let mut ordered: Vec<&Content> = self.contents.iter().collect();
        ordered.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.id.cmp(&b.id))
        });
        ordered
    }

    pub fn content(&self, id: &str) -> Option<&Content> {
        self.contents.iter().find(|c| c.id == id)
    }

    /// Stores a new passage under the given id
    ///
    /// Listing position and labels start empty; question ids are renumbered
    /// from their order in the draft.
    pub fn create_content(&mut self, id: String, draft: ContentDraft) -> Result<Content, StoreError> {
        if self.content(&id).is_some() {
            return Err(StoreError::ContentIdTaken);
        }
        let content = content_from_draft(id, draft, 0, Vec::new());
        self.contents.push(content.clone());
        Ok(content)
    }

    /// Replaces a passage, keeping its listing position and labels
    pub fn update_content(&mut self, id: &str, draft: ContentDraft) -> Result<Content, StoreError> {
        let index = self
            .contents
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::ContentNotFound)?;
        let order_index = self.contents[index].order_index;
        let label_ids = self.contents[index].label_ids.clone();
        let content = content_from_draft(id.to_string(), draft, order_index, label_ids);
        self.contents[index] = content.clone();
        Ok(content)
    }

    pub fn delete_content(&mut self, id: &str) -> Result<(), StoreError> {
        let index = self
            .contents
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::ContentNotFound)?;
        self.contents.remove(index);
        Ok(())
    }

    /// Moves a passage one step up or down inside its level's listing
    ///
    /// Positions that were never assigned are backfilled as `index * 10`
    /// before the two neighbours swap, so a library that predates manual
    /// ordering starts from its current listing order. Any other direction,
    /// or a move past either end, leaves the order untouched and succeeds.
    pub fn move_content(
        &mut self,
        id: &str,
        direction: &str,
        level_code: &str,
    ) -> Result<(), StoreError> {
        if self.content(id).is_none() {
            return Err(StoreError::ContentNotFound);
        }

        // Snapshot of the level in listing order, taken before any backfill
        let mut level_entries: Vec<(i64, String)> = self
            .contents
            .iter()
            .filter(|c| c.level_code == level_code)
            .map(|c| (c.order_index, c.id.clone()))
            .collect();
        level_entries.sort();

        let current_index = level_entries
            .iter()
            .position(|(_, entry_id)| entry_id == id)
            .ok_or(StoreError::ContentNotInLevel)?;

        let new_index = match direction {
            "up" if current_index > 0 => current_index - 1,
            "down" if current_index + 1 < level_entries.len() => current_index + 1,
            _ => current_index,
        };
        if new_index == current_index {
            return Ok(());
        }

        for (i, (order_index, entry_id)) in level_entries.iter().enumerate() {
            if *order_index == 0 {
                if let Some(content) = self.contents.iter_mut().find(|c| c.id == *entry_id) {
                    content.order_index = i as i64 * 10;
                }
            }
        }

        let current_value = match level_entries[current_index].0 {
            0 => current_index as i64 * 10,
            value => value,
        };
        let target_value = match level_entries[new_index].0 {
            0 => new_index as i64 * 10,
            value => value,
        };
        let target_id = level_entries[new_index].1.clone();

        if let Some(content) = self.contents.iter_mut().find(|c| c.id == id) {
            content.order_index = target_value;
        }
        if let Some(content) = self.contents.iter_mut().find(|c| c.id == target_id) {
            content.order_index = current_value;
        }
        Ok(())
    }

    /// Applies a full set of listing positions in one step
    ///
    /// Every id must exist; an unknown id leaves the library unchanged.
    pub fn apply_batch_order(&mut self, updates: &[(String, i64)]) -> Result<usize, StoreError> {
        for (id, _) in updates {
            if self.content(id).is_none() {
                return Err(StoreError::ContentNotFound);
            }
        }
        for (id, order_index) in updates {
            if let Some(content) = self.contents.iter_mut().find(|c| c.id == *id) {
                content.order_index = *order_index;
            }
        }
        Ok(updates.len())
    }

    // ----- content labels -----

    /// Labels attached to a passage, in attachment order
    ///
    /// An unknown passage id yields an empty list rather than an error, the
    /// same as a passage with no labels.
    pub fn content_labels(&self, id: &str) -> Vec<Label> {
        let Some(content) = self.content(id) else {
            return Vec::new();
        };
        content
            .label_ids
            .iter()
            .filter_map(|label_id| self.label(label_id).cloned())
            .collect()
    }

    /// Replaces the labels attached to a passage
    pub fn set_content_labels(
        &mut self,
        id: &str,
        label_ids: &[String],
    ) -> Result<Vec<Label>, StoreError> {
        if self.content(id).is_none() {
            return Err(StoreError::ContentNotFound);
        }
        for label_id in label_ids {
            if self.label(label_id).is_none() {
                return Err(StoreError::LabelNotFound);
            }
        }

        let mut deduped: Vec<String> = Vec::new();
        for label_id in label_ids {
            if !deduped.contains(label_id) {
                deduped.push(label_id.clone());
            }
        }

        if let Some(content) = self.contents.iter_mut().find(|c| c.id == id) {
            content.label_ids = deduped.clone();
        }
        Ok(deduped
            .iter()
            .filter_map(|label_id| self.label(label_id).cloned())
            .collect())
    }

    // ----- levels -----

    /// All levels with their passage counts, ordered for display
    pub fn levels_with_counts(&self) -> Vec<(Level, usize)> {
        let mut levels: Vec<Level> = self.levels.clone();
        levels.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.id.cmp(&b.id))
        });
        levels
            .into_iter()
            .map(|level| {
                let count = self.level_content_count(&level.id);
                (level, count)
            })
            .collect()
    }

    pub fn level(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Number of passages filed under a level
    pub fn level_content_count(&self, id: &str) -> usize {
        self.contents.iter().filter(|c| c.level_code == id).count()
    }

    /// Adds a level after validating its id and name
    ///
    /// Checks run in the order the admin screen reports them: missing
    /// fields, malformed id, name too long, then a duplicate id.
    pub fn create_level(&mut self, draft: LevelDraft) -> Result<Level, StoreError> {
        let id = draft.id.unwrap_or_default();
        let display_name = draft.display_name.unwrap_or_default();
        let Some(order_index) = draft.order_index else {
            return Err(StoreError::LevelFieldsMissing);
        };
        if id.is_empty() || display_name.is_empty() {
            return Err(StoreError::LevelFieldsMissing);
        }
        if !LEVEL_ID_REGEX.is_match(&id) {
            return Err(StoreError::LevelIdInvalid);
        }
        if display_name.chars().count() > 20 {
            return Err(StoreError::LevelNameTooLong);
        }
        if self.level(&id).is_some() {
            return Err(StoreError::LevelIdTaken);
        }

        let level = Level {
            id,
            display_name,
            alt_name: None,
            order_index,
            is_default: false,
        };
        self.levels.push(level.clone());
        Ok(level)
    }

    /// Updates a level's names and position
    ///
    /// A changed display name is written through to the passages filed under
    /// the level so their stored `level` field keeps matching.
    pub fn update_level(&mut self, id: &str, update: LevelUpdate) -> Result<Level, StoreError> {
        if let Some(name) = &update.display_name {
            if name.chars().count() > 20 {
                return Err(StoreError::LevelNameTooLong);
            }
        }
        if let Some(name) = &update.alt_name {
            if name.chars().count() > 20 {
                return Err(StoreError::LevelAltNameTooLong);
            }
        }

        let level = self
            .levels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::LevelNotFound)?;

        if let Some(name) = update.display_name.clone() {
            level.display_name = name;
        }
        if let Some(name) = update.alt_name {
            level.alt_name = Some(name);
        }
        if let Some(order_index) = update.order_index {
            level.order_index = order_index;
        }
        let updated = level.clone();

        if let Some(name) = update.display_name {
            if !name.is_empty() {
                for content in self.contents.iter_mut().filter(|c| c.level_code == id) {
                    content.level = name.clone();
                }
            }
        }
        Ok(updated)
    }

    /// Deletes a level, moving its passages to a target level first
    ///
    /// The default level cannot be deleted. A level that still holds
    /// passages needs an existing target level; the passages' level code and
    /// display name are rewritten to the target before the level goes away.
    pub fn delete_level(
        &mut self,
        id: &str,
        target_level_id: Option<&str>,
    ) -> Result<LevelDeletion, StoreError> {
        let level = self.level(id).ok_or(StoreError::LevelNotFound)?;
        if level.is_default {
            return Err(StoreError::DefaultLevelUndeletable);
        }

        let content_count = self.level_content_count(id);
        if content_count > 0 {
            let Some(target_id) = target_level_id else {
                return Err(StoreError::MigrationTargetRequired);
            };
            let target = self
                .level(target_id)
                .filter(|l| l.id != id)
                .ok_or(StoreError::MigrationTargetNotFound)?;
            let target_name = target.display_name.clone();
            let target_id = target_id.to_string();
            for content in self.contents.iter_mut().filter(|c| c.level_code == id) {
                content.level_code = target_id.clone();
                content.level = target_name.clone();
            }
        }

        self.levels.retain(|l| l.id != id);
        Ok(LevelDeletion {
            moved_contents_to: if content_count > 0 {
                target_level_id.map(String::from)
            } else {
                None
            },
            deleted_content_count: content_count,
        })
    }

    /// Makes a level the default, clearing the flag everywhere else
    ///
    /// Setting the current default again is a no-op that still reports
    /// success, so exactly one level carries the flag at all times.
    pub fn set_default_level(&mut self, id: &str) -> Result<Level, StoreError> {
        let level = self.level(id).ok_or(StoreError::LevelNotFound)?;
        if level.is_default {
            return Ok(level.clone());
        }
        let mut updated = None;
        for level in self.levels.iter_mut() {
            level.is_default = level.id == id;
            if level.is_default {
                updated = Some(level.clone());
            }
        }
        updated.ok_or(StoreError::LevelNotFound)
    }

    // ----- labels -----

    /// All labels with their passage counts, sorted by name
    pub fn labels_sorted(&self) -> Vec<(Label, usize)> {
        let mut labels: Vec<Label> = self.labels.clone();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        labels
            .into_iter()
            .map(|label| {
                let count = self
                    .contents
                    .iter()
                    .filter(|c| c.label_ids.contains(&label.id))
                    .count();
                (label, count)
            })
            .collect()
    }

    pub fn label(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    /// Adds a label; names are unique and the color falls back to the
    /// default badge color
    pub fn create_label(&mut self, id: String, draft: LabelDraft) -> Result<Label, StoreError> {
        let name = draft.name.unwrap_or_default();
        if name.is_empty() {
            return Err(StoreError::LabelNameRequired);
        }
        if self.labels.iter().any(|l| l.name == name) {
            return Err(StoreError::LabelNameTaken);
        }

        let label = Label {
            id,
            name,
            color: draft
                .color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string()),
            description: normalize_text(draft.description),
        };
        self.labels.push(label.clone());
        Ok(label)
    }

    /// Updates a label, rejecting a rename onto an existing name
    pub fn update_label(&mut self, id: &str, patch: LabelPatch) -> Result<Label, StoreError> {
        let index = self
            .labels
            .iter()
            .position(|l| l.id == id)
            .ok_or(StoreError::LabelNotFound)?;

        if let Some(name) = &patch.name {
            if !name.is_empty()
                && *name != self.labels[index].name
                && self.labels.iter().any(|l| l.name == *name)
            {
                return Err(StoreError::LabelNameTaken);
            }
        }

        let label = &mut self.labels[index];
        if let Some(name) = patch.name.filter(|n| !n.is_empty()) {
            label.name = name;
        }
        if let Some(color) = patch.color.filter(|c| !c.is_empty()) {
            label.color = color;
        }
        if let Some(description) = patch.description {
            label.description = normalize_text(Some(description));
        }
        Ok(label.clone())
    }

    /// Deletes a label and detaches it from every passage
    pub fn delete_label(&mut self, id: &str) -> Result<(), StoreError> {
        if self.label(id).is_none() {
            return Err(StoreError::LabelNotFound);
        }
        self.labels.retain(|l| l.id != id);
        for content in self.contents.iter_mut() {
            content.label_ids.retain(|label_id| label_id != id);
        }
        Ok(())
    }

    // ----- singleton pages -----

    pub fn about(&self) -> Option<&AboutPage> {
        self.about.as_ref()
    }

    /// Replaces the about page, stamping the update time
    pub fn set_about(&mut self, content: String, images: Option<String>) -> AboutPage {
        let page = AboutPage {
            content,
            images,
            updated_at: now_timestamp(),
        };
        self.about = Some(page.clone());
        page
    }

    /// The site description, materialized from the defaults on first access
    pub fn site_info(&mut self) -> &SiteInfo {
        self.site_info.get_or_insert_with(SiteInfo::default_info)
    }

    /// Applies a partial update to the site description
    pub fn update_site_info(&mut self, update: SiteInfoUpdate) -> SiteInfo {
        let info = self.site_info.get_or_insert_with(SiteInfo::default_info);
        if let Some(title) = update.title {
            info.title = title;
        }
        if let Some(description) = update.description {
            info.description = description;
        }
        if let Some(developers) = update.developers {
            info.developers = developers;
        }
        if let Some(features) = update.features {
            info.features = features;
        }
        if let Some(usage) = update.usage {
            info.usage = usage;
        }
        info.clone()
    }
}

/// Builds a stored passage from a draft, normalizing empty optional text to
/// absent and renumbering the questions
fn content_from_draft(
    id: String,
    draft: ContentDraft,
    order_index: i64,
    label_ids: Vec<String>,
) -> Content {
    let mut content = Content {
        id,
        title: draft.title,
        level: draft.level,
        level_code: draft.level_code,
        text: draft.text,
        explanation: normalize_text(draft.explanation),
        word_count: draft.word_count.filter(|v| *v != 0),
        character_count: draft.character_count.filter(|v| *v != 0),
        images: draft.images,
        thumbnail: normalize_text(draft.thumbnail),
        order_index,
        label_ids,
        questions: draft
            .questions
            .into_iter()
            .map(|mut question| {
                question.explanation = normalize_text(question.explanation.take());
                question
            })
            .collect(),
    };
    content.renumber_questions();
    content
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, level_code: &str) -> ContentDraft {
        ContentDraft {
            title: title.to_string(),
            level: crate::content::level_display_name(level_code).to_string(),
            level_code: level_code.to_string(),
            text: "むかし、むかし、あるところに。".to_string(),
            explanation: None,
            word_count: None,
            character_count: None,
            images: vec![],
            thumbnail: None,
            questions: vec![],
        }
    }

    fn library_with_contents(ids: &[&str], level_code: &str) -> Library {
        let mut library = Library::new();
        for id in ids {
            library
                .create_content(id.to_string(), draft(id, level_code))
                .unwrap();
        }
        library
    }

    #[test]
    fn new_library_has_builtin_levels() {
        let library = Library::new();
        assert_eq!(library.levels.len(), 3);
        assert_eq!(
            library
                .levels
                .iter()
                .filter(|l| l.is_default)
                .map(|l| l.id.as_str())
                .collect::<Vec<_>>(),
            vec!["beginner"]
        );
    }

    #[test]
    fn create_content_renumbers_questions_and_rejects_duplicate_ids() {
        let mut library = Library::new();
        let mut content_draft = draft("t", "beginner");
        content_draft.questions = vec![
            Question {
                id: 99,
                question: "一".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                correct_answer: 0,
                explanation: Some(String::new()),
            },
            Question {
                id: 0,
                question: "二".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                correct_answer: 1,
                explanation: Some("そのとおり".to_string()),
            },
        ];

        let created = library
            .create_content("c1".to_string(), content_draft.clone())
            .unwrap();
        assert_eq!(created.questions[0].id, 1);
        assert_eq!(created.questions[1].id, 2);
        assert_eq!(created.questions[0].explanation, None);
        assert_eq!(
            created.questions[1].explanation.as_deref(),
            Some("そのとおり")
        );

        assert_eq!(
            library.create_content("c1".to_string(), content_draft),
            Err(StoreError::ContentIdTaken)
        );
    }

    #[test]
    fn update_content_keeps_order_and_labels() {
        let mut library = library_with_contents(&["c1"], "beginner");
        library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();
        library
            .set_content_labels("c1", &["l1".to_string()])
            .unwrap();
        library.contents[0].order_index = 30;

        let mut new_draft = draft("改訂版", "beginner");
        new_draft.explanation = Some(String::new());
        let updated = library.update_content("c1", new_draft).unwrap();

        assert_eq!(updated.title, "改訂版");
        assert_eq!(updated.order_index, 30);
        assert_eq!(updated.label_ids, vec!["l1".to_string()]);
        assert_eq!(updated.explanation, None);
    }

    #[test]
    fn update_missing_content_fails() {
        let mut library = Library::new();
        assert_eq!(
            library.update_content("nope", draft("t", "beginner")),
            Err(StoreError::ContentNotFound)
        );
        assert_eq!(library.delete_content("nope"), Err(StoreError::ContentNotFound));
    }

    #[test]
    fn contents_ordered_sorts_by_position_then_id() {
        let mut library = library_with_contents(&["b", "a", "c"], "beginner");
        library.contents[2].order_index = -5;
        let ids: Vec<&str> = library
            .contents_ordered()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn move_content_backfills_then_swaps() {
        let mut library = library_with_contents(&["a", "b", "c"], "beginner");

        library.move_content("b", "up", "beginner").unwrap();

        let ids: Vec<&str> = library
            .contents_ordered()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        // Unmoved neighbour got a backfilled slot
        assert_eq!(library.content("c").unwrap().order_index, 20);
        assert_eq!(library.content("b").unwrap().order_index, 0);
        assert_eq!(library.content("a").unwrap().order_index, 10);
    }

    #[test]
    fn move_content_at_edge_is_a_no_op() {
        let mut library = library_with_contents(&["a", "b"], "beginner");
        library.move_content("a", "up", "beginner").unwrap();
        assert_eq!(library.content("a").unwrap().order_index, 0);
        assert_eq!(library.content("b").unwrap().order_index, 0);
    }

    #[test]
    fn move_content_checks_level_membership() {
        let mut library = library_with_contents(&["a"], "beginner");
        assert_eq!(
            library.move_content("a", "up", "advanced"),
            Err(StoreError::ContentNotInLevel)
        );
        assert_eq!(
            library.move_content("ghost", "up", "beginner"),
            Err(StoreError::ContentNotFound)
        );
    }

    #[test]
    fn batch_order_is_all_or_nothing() {
        let mut library = library_with_contents(&["a", "b"], "beginner");
        let updates = vec![("a".to_string(), 20), ("ghost".to_string(), 10)];
        assert_eq!(
            library.apply_batch_order(&updates),
            Err(StoreError::ContentNotFound)
        );
        assert_eq!(library.content("a").unwrap().order_index, 0);

        let updates = vec![("a".to_string(), 20), ("b".to_string(), 10)];
        assert_eq!(library.apply_batch_order(&updates), Ok(2));
        assert_eq!(library.content("a").unwrap().order_index, 20);
        assert_eq!(library.content("b").unwrap().order_index, 10);
    }

    #[test]
    fn level_creation_validates_in_report_order() {
        let mut library = Library::new();

        assert_eq!(
            library.create_level(LevelDraft::default()),
            Err(StoreError::LevelFieldsMissing)
        );
        assert_eq!(
            library.create_level(LevelDraft {
                id: Some("N5級".to_string()),
                display_name: Some("はじめて".to_string()),
                order_index: Some(4),
            }),
            Err(StoreError::LevelIdInvalid)
        );
        assert_eq!(
            library.create_level(LevelDraft {
                id: Some("n5".to_string()),
                display_name: Some("あ".repeat(21)),
                order_index: Some(4),
            }),
            Err(StoreError::LevelNameTooLong)
        );
        assert_eq!(
            library.create_level(LevelDraft {
                id: Some("beginner".to_string()),
                display_name: Some("はじめて".to_string()),
                order_index: Some(4),
            }),
            Err(StoreError::LevelIdTaken)
        );

        let level = library
            .create_level(LevelDraft {
                id: Some("n5".to_string()),
                display_name: Some("はじめて".to_string()),
                order_index: Some(4),
            })
            .unwrap();
        assert!(!level.is_default);
        assert_eq!(library.levels.len(), 4);
    }

    #[test]
    fn level_display_name_change_propagates_to_contents() {
        let mut library = library_with_contents(&["a"], "beginner");
        let updated = library
            .update_level("beginner", LevelUpdate {
                display_name: Some("入門レベル".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.display_name, "入門レベル");
        assert_eq!(library.content("a").unwrap().level, "入門レベル");
    }

    #[test]
    fn level_update_validates_name_lengths() {
        let mut library = Library::new();
        assert_eq!(
            library.update_level("beginner", LevelUpdate {
                display_name: Some("あ".repeat(21)),
                ..Default::default()
            }),
            Err(StoreError::LevelNameTooLong)
        );
        assert_eq!(
            library.update_level("beginner", LevelUpdate {
                alt_name: Some("あ".repeat(21)),
                ..Default::default()
            }),
            Err(StoreError::LevelAltNameTooLong)
        );
        assert_eq!(
            library.update_level("ghost", LevelUpdate::default()),
            Err(StoreError::LevelNotFound)
        );
    }

    #[test]
    fn delete_level_migrates_contents() {
        let mut library = library_with_contents(&["a", "b"], "intermediate");

        assert_eq!(
            library.delete_level("beginner", None),
            Err(StoreError::DefaultLevelUndeletable)
        );
        assert_eq!(
            library.delete_level("intermediate", None),
            Err(StoreError::MigrationTargetRequired)
        );
        assert_eq!(
            library.delete_level("intermediate", Some("ghost")),
            Err(StoreError::MigrationTargetNotFound)
        );

        let deletion = library
            .delete_level("intermediate", Some("advanced"))
            .unwrap();
        assert_eq!(deletion.moved_contents_to.as_deref(), Some("advanced"));
        assert_eq!(deletion.deleted_content_count, 2);
        assert!(library.level("intermediate").is_none());
        assert_eq!(library.content("a").unwrap().level_code, "advanced");
        assert_eq!(library.content("a").unwrap().level, "上級レベル");
    }

    #[test]
    fn delete_empty_level_needs_no_target() {
        let mut library = Library::new();
        let deletion = library.delete_level("advanced", None).unwrap();
        assert_eq!(deletion.moved_contents_to, None);
        assert_eq!(deletion.deleted_content_count, 0);
        assert_eq!(library.levels.len(), 2);
    }

    #[test]
    fn set_default_level_keeps_exactly_one_default() {
        let mut library = Library::new();
        library.set_default_level("advanced").unwrap();
        let defaults: Vec<&str> = library
            .levels
            .iter()
            .filter(|l| l.is_default)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["advanced"]);

        // Setting the current default again changes nothing
        library.set_default_level("advanced").unwrap();
        assert_eq!(
            library.levels.iter().filter(|l| l.is_default).count(),
            1
        );
        assert_eq!(
            library.set_default_level("ghost"),
            Err(StoreError::LevelNotFound)
        );
    }

    #[test]
    fn labels_require_unique_names() {
        let mut library = Library::new();
        assert_eq!(
            library.create_label("l1".to_string(), LabelDraft::default()),
            Err(StoreError::LabelNameRequired)
        );

        let label = library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(label.color, DEFAULT_LABEL_COLOR);

        assert_eq!(
            library.create_label("l2".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            }),
            Err(StoreError::LabelNameTaken)
        );
    }

    #[test]
    fn label_rename_checks_other_labels_only() {
        let mut library = Library::new();
        library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();
        library
            .create_label("l2".to_string(), LabelDraft {
                name: Some("歴史".to_string()),
                color: Some("#000000".to_string()),
                ..Default::default()
            })
            .unwrap();

        // Keeping its own name is fine
        let kept = library
            .update_label("l1", LabelPatch {
                name: Some("動物".to_string()),
                description: Some("生き物の話".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(kept.description.as_deref(), Some("生き物の話"));

        assert_eq!(
            library.update_label("l2", LabelPatch {
                name: Some("動物".to_string()),
                ..Default::default()
            }),
            Err(StoreError::LabelNameTaken)
        );
        assert_eq!(
            library.update_label("ghost", LabelPatch::default()),
            Err(StoreError::LabelNotFound)
        );
    }

    #[test]
    fn delete_label_detaches_it_from_contents() {
        let mut library = library_with_contents(&["a"], "beginner");
        library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();
        library
            .set_content_labels("a", &["l1".to_string()])
            .unwrap();

        library.delete_label("l1").unwrap();
        assert!(library.content("a").unwrap().label_ids.is_empty());
        assert_eq!(library.delete_label("l1"), Err(StoreError::LabelNotFound));
    }

    #[test]
    fn set_content_labels_validates_and_dedupes() {
        let mut library = library_with_contents(&["a"], "beginner");
        library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            library.set_content_labels("ghost", &["l1".to_string()]),
            Err(StoreError::ContentNotFound)
        );
        assert_eq!(
            library.set_content_labels("a", &["ghost".to_string()]),
            Err(StoreError::LabelNotFound)
        );

        let labels = library
            .set_content_labels("a", &["l1".to_string(), "l1".to_string()])
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(library.content_labels("a")[0].name, "動物");
        assert!(library.content_labels("ghost").is_empty());
    }

    #[test]
    fn labels_sorted_counts_attachments() {
        let mut library = library_with_contents(&["a", "b"], "beginner");
        library
            .create_label("l2".to_string(), LabelDraft {
                name: Some("歴史".to_string()),
                ..Default::default()
            })
            .unwrap();
        library
            .create_label("l1".to_string(), LabelDraft {
                name: Some("動物".to_string()),
                ..Default::default()
            })
            .unwrap();
        library
            .set_content_labels("a", &["l1".to_string()])
            .unwrap();
        library
            .set_content_labels("b", &["l1".to_string()])
            .unwrap();

        let listed = library.labels_sorted();
        assert_eq!(listed[0].0.name, "動物");
        assert_eq!(listed[0].1, 2);
        assert_eq!(listed[1].0.name, "歴史");
        assert_eq!(listed[1].1, 0);
    }

    #[test]
    fn site_info_materializes_defaults_once() {
        let mut library = Library::new();
        assert!(library.site_info.is_none());
        assert_eq!(library.site_info().title, "SuiReN");
        assert!(library.site_info.is_some());

        let updated = library.update_site_info(SiteInfoUpdate {
            title: Some("速読ゴリラ".to_string()),
            ..Default::default()
        });
        assert_eq!(updated.title, "速読ゴリラ");
        assert_eq!(updated.id, "default");
        assert!(!library.site_info().description.is_empty());
    }

    #[test]
    fn about_page_is_stamped_on_write() {
        let mut library = Library::new();
        assert!(library.about().is_none());
        let page = library.set_about("このサイトについて".to_string(), None);
        assert_eq!(page.content, "このサイトについて");
        assert!(page.updated_at.ends_with('Z'));
        assert_eq!(library.about().map(|p| p.content.as_str()), Some("このサイトについて"));
    }
}
