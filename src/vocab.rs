use std::fmt;

use log::warn;
use serde::{
    Deserialize,
    Serialize,
};
use wana_kana::IsJapaneseStr;

use crate::core::AnkiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordType {
    #[serde(alias = "Adj", alias = "adjective")]
    Adjective,
    #[serde(alias = "Phra", alias = "phrase")]
    Phrase,
    #[serde(alias = "N", alias = "noun")]
    Noun,
    #[serde(alias = "V", alias = "verb")]
    Verb,
    #[serde(alias = "Prep", alias = "preposition")]
    Preposition,
    #[serde(alias = "Adv", alias = "adverb")]
    Adverb,
}

impl WordType {
    pub const ALL: [WordType; 6] = [
        WordType::Adjective,
        WordType::Phrase,
        WordType::Noun,
        WordType::Verb,
        WordType::Preposition,
        WordType::Adverb,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WordType::Adjective => "Adjective",
            WordType::Phrase => "Phrase",
            WordType::Noun => "Noun",
            WordType::Verb => "Verb",
            WordType::Preposition => "Preposition",
            WordType::Adverb => "Adverb",
        }
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One flashcard candidate from a user-supplied vocabulary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    #[serde(alias = "Lesson")]
    pub lesson: String,
    #[serde(alias = "WordType", alias = "type", alias = "Type")]
    pub word_type: WordType,
    #[serde(alias = "Japanese")]
    pub japanese: String,
    #[serde(alias = "English")]
    pub english: String,
}

impl VocabularyEntry {
    /// Lesson label as a tag; hyphen separators become spaces.
    pub fn lesson_tag(&self) -> String {
        self.lesson.replace('-', " ")
    }

    pub fn tags(&self) -> Vec<String> {
        vec![self.word_type.label().to_string(), self.lesson_tag()]
    }

    fn normalize(mut self) -> Self {
        self.lesson = self.lesson.trim().to_string();
        self.japanese = self.japanese.trim().to_string();
        self.english = self.english.trim().to_string();
        self
    }
}

/// Parses a vocabulary document: a JSON array of entries, optionally wrapped
/// in a markdown code fence as text generators tend to reply.
pub fn parse_document(input: &str) -> Result<Vec<VocabularyEntry>, AnkiError> {
    let json = strip_code_fence(input.trim());
    if json.is_empty() {
        return Err(AnkiError::MalformedInput("document is empty".to_string()));
    }

    let entries: Vec<VocabularyEntry> = serde_json::from_str(json)
        .map_err(|e| AnkiError::MalformedInput(format!("expected a list of entries: {e}")))?;

    let entries: Vec<VocabularyEntry> =
        entries.into_iter().map(VocabularyEntry::normalize).collect();

    for (index, entry) in entries.iter().enumerate() {
        if entry.english.is_empty() {
            return Err(AnkiError::MalformedInput(format!("entry {index} has no english text")));
        }
        if entry.japanese.is_empty() {
            return Err(AnkiError::MalformedInput(format!("entry {index} has no japanese text")));
        }
        if !contains_japanese(&entry.japanese) {
            warn!("Entry {} ('{}') has no Japanese script in its japanese field", index, entry.english);
        }
    }

    Ok(entries)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    // Drop the info string ("json") when the body starts on the next line.
    match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['[', '{']) => body.trim(),
        _ => rest.trim(),
    }
}

fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| c.to_string().as_str().is_japanese())
}

/// Prompt handed to a text generator to produce a document `parse_document`
/// accepts.
pub fn generator_prompt() -> String {
    let labels: Vec<&str> = WordType::ALL.iter().map(|w| w.label()).collect();
    format!(
        "Create a JSON array of vocabulary objects with these fields:\n\
         lesson (string, e.g. \"Lesson-1\")\n\
         wordType (one of: {})\n\
         japanese (string, kanji with reading if any)\n\
         english (string)\n\n\
         Only respond with the JSON array.",
        labels.join(", ")
    )
}
