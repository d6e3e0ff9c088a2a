//! Notes kept alongside the calendar.
//!
//! There is no notes backend; the notebook starts from sample notes and
//! lives for the duration of the process.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Note {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Note {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            is_pinned: false,
            color: None,
        }
    }
}

/// Sample notes shown when nothing else is available.
pub fn demo_notes(now: DateTime<Utc>) -> Vec<Note> {
    let mut important = Note::new(
        "1",
        "Important Note",
        "This is a demo note. Full integration with Apple Notes requires creating a native plugin.",
        now,
    );
    important.is_pinned = true;
    important.tags = vec!["daybook".to_string()];

    let mut shopping = Note::new(
        "2",
        "Shopping List",
        "Milk\nBread\nEggs\nFruits",
        now - TimeDelta::days(1),
    );
    shopping.tags = vec!["personal".to_string()];

    let mut ideas = Note::new(
        "3",
        "Project Ideas",
        "Add dark theme\nOptimize performance\nWrite tests",
        now - TimeDelta::days(2),
    );
    ideas.tags = vec!["work".to_string(), "daybook".to_string()];

    vec![important, shopping, ideas]
}

/// Search text and tag criteria. Empty criteria match every note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub search: String,
    pub tags: Vec<String>,
}

impl NoteQuery {
    /// Case-insensitive substring over title and content; any one tag.
    pub fn matches(&self, note: &Note) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text_ok = needle.is_empty()
            || note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle);
        let tags_ok = self.tags.is_empty() || note.tags.iter().any(|t| self.tags.contains(t));
        text_ok && tags_ok
    }
}

#[derive(Debug, Clone, Default)]
pub struct Notebook {
    notes: Vec<Note>,
}

impl Notebook {
    pub fn new(notes: Vec<Note>) -> Self {
        Notebook { notes }
    }

    /// All notes in insertion order, newest added first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Apply `edit` and stamp `updated_at`. Returns false for unknown ids.
    pub fn update_note(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut Note),
    ) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                edit(note);
                note.updated_at = now;
                true
            }
            None => false,
        }
    }

    pub fn remove_note(&mut self, id: &str) -> Option<Note> {
        let index = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(index))
    }

    pub fn toggle_pin(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.update_note(id, now, |note| note.is_pinned = !note.is_pinned)
    }

    /// Distinct tags in first-seen order.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.notes.iter().flat_map(|n| &n.tags) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Notes matching `query`: pinned first, then most recently updated.
    pub fn visible(&self, query: &NoteQuery) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().filter(|n| query.matches(n)).collect();
        notes.sort_by_key(|n| (!n.is_pinned, std::cmp::Reverse(n.updated_at)));
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn titles(notes: Vec<&Note>) -> Vec<&str> {
        notes.into_iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_demo_notes_are_dated_back_from_now() {
        let notes = demo_notes(now());
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[1].created_at, now() - TimeDelta::days(1));
        assert_eq!(notes[2].updated_at, now() - TimeDelta::days(2));
        assert!(notes[0].is_pinned);
    }

    #[test]
    fn test_pinned_first_then_recently_updated() {
        let mut book = Notebook::new(demo_notes(now()));
        assert_eq!(
            titles(book.visible(&NoteQuery::default())),
            vec!["Important Note", "Shopping List", "Project Ideas"]
        );

        book.toggle_pin("3", now() + TimeDelta::minutes(1));
        book.toggle_pin("1", now() + TimeDelta::minutes(2));
        assert_eq!(
            titles(book.visible(&NoteQuery::default())),
            vec!["Project Ideas", "Important Note", "Shopping List"]
        );
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let book = Notebook::new(demo_notes(now()));
        let query = |search: &str| NoteQuery {
            search: search.to_string(),
            ..NoteQuery::default()
        };

        assert_eq!(titles(book.visible(&query("eggs"))), vec!["Shopping List"]);
        assert_eq!(titles(book.visible(&query("PROJECT"))), vec!["Project Ideas"]);
        assert!(book.visible(&query("calendar sync")).is_empty());
    }

    #[test]
    fn test_tag_filter_matches_any_tag() {
        let book = Notebook::new(demo_notes(now()));
        let query = NoteQuery {
            tags: vec!["work".to_string(), "personal".to_string()],
            ..NoteQuery::default()
        };
        assert_eq!(titles(book.visible(&query)), vec!["Shopping List", "Project Ideas"]);
        assert_eq!(book.all_tags(), vec!["daybook", "personal", "work"]);
    }

    #[test]
    fn test_add_update_and_remove() {
        let mut book = Notebook::new(demo_notes(now()));
        let later = now() + TimeDelta::hours(1);

        book.add_note(Note::new("4", "Standup", "Blocked on review", later));
        assert_eq!(book.notes()[0].id, "4");

        assert!(book.update_note("2", later + TimeDelta::minutes(5), |n| n.content.push_str("\nCoffee")));
        let shopping = book.get("2").unwrap();
        assert!(shopping.content.ends_with("Coffee"));
        assert_eq!(shopping.updated_at, later + TimeDelta::minutes(5));
        assert_eq!(shopping.created_at, now() - TimeDelta::days(1));
        assert!(!book.update_note("missing", later, |_| {}));

        assert_eq!(book.remove_note("4").map(|n| n.title), Some("Standup".to_string()));
        assert!(book.remove_note("4").is_none());
        assert_eq!(book.notes().len(), 3);
    }

    #[test]
    fn test_note_json_uses_camel_case() {
        let json = serde_json::to_value(&demo_notes(now())[0]).unwrap();
        assert_eq!(json["isPinned"], true);
        assert!(json.get("color").is_none());
    }
}
