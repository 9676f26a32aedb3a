use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{JsonFile, StoreError};

/// Tag name and the words that imply it.
const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("work", &["work", "office", "project", "meeting", "deadline"]),
    ("personal", &["family", "friend", "personal", "home"]),
    ("health", &["doctor", "health", "sport", "exercise"]),
    ("shopping", &["buy", "shopping", "store", "order"]),
    ("urgent", &["urgent", "important", "quickly", "asap"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Tags whose keywords appear as words in `content`.
pub fn extract_tags(content: &str) -> Vec<String> {
    let words: Vec<String> = content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    TAG_KEYWORDS
        .iter()
        .filter(|(_, keys)| words.iter().any(|w| keys.contains(&w.as_str())))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

pub struct NoteBook {
    file: JsonFile<Vec<Note>>,
    notes: Vec<Note>,
}

impl NoteBook {
    pub fn open(path: PathBuf) -> Self {
        let file = JsonFile::new(path);
        let notes: Vec<Note> = file.load_or_default();
        log::info!("Loaded {} notes", notes.len());
        Self { file, notes }
    }

    /// Store a note stamped `now` and return its id.
    pub fn add(&mut self, content: &str, now: DateTime<Local>) -> Result<u32, StoreError> {
        let id = self.notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        self.notes.push(Note {
            id,
            content: content.trim().to_string(),
            timestamp: now,
            tags: extract_tags(content),
        });
        self.file.save(&self.notes)?;
        Ok(id)
    }

    /// Case-insensitive match on content or tag.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        self.notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&q) || n.tags.iter().any(|t| *t == q))
            .collect()
    }

    /// Newest `n` notes, newest first.
    pub fn recent(&self, n: usize) -> Vec<&Note> {
        let mut sorted: Vec<&Note> = self.notes.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        sorted.truncate(n);
        sorted
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn tags_from_keywords() {
        assert_eq!(extract_tags("Buy milk ASAP"), vec!["shopping", "urgent"]);
        assert_eq!(extract_tags("Meeting with the doctor"), vec!["work", "health"]);
        assert!(extract_tags("nothing special").is_empty());
    }

    #[test]
    fn tags_match_whole_words_only() {
        // "homework" is not "home" nor "work"
        assert!(extract_tags("homework").is_empty());
    }

    #[test]
    fn ids_increase_from_max() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = NoteBook::open(dir.path().join("notes.json"));
        assert_eq!(book.add("first", t0()).unwrap(), 1);
        assert_eq!(book.add("second", t0()).unwrap(), 2);

        let mut reopened = NoteBook::open(dir.path().join("notes.json"));
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.add("third", t0()).unwrap(), 3);
    }

    #[test]
    fn search_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = NoteBook::open(dir.path().join("notes.json"));
        book.add("call family", t0()).unwrap();
        book.add("buy bread", t0() + Duration::hours(1)).unwrap();
        book.add("project deadline friday", t0() + Duration::hours(2)).unwrap();

        let hits = book.search("BREAD");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "buy bread");
        assert_eq!(book.search("work").len(), 1);
        assert!(book.search("  ").is_empty());

        let recent: Vec<&str> = book.recent(2).iter().map(|n| n.content.as_str()).collect();
        assert_eq!(recent, vec!["project deadline friday", "buy bread"]);
    }
}
