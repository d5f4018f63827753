use serde::{
    Deserialize,
    Serialize,
};

/// Remote-assigned note handle, stable for the lifetime of the note.
pub type NoteId = u64;

pub const PROTOCOL_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub action: &'a str,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    /// Name exactly as Anki reports it, usable in queries.
    pub name: String,
    pub display_name: String,
}

/// The subset of `notesInfo` this crate reads. Anki sends many more keys;
/// they are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: NoteId,
    #[serde(default)]
    pub tags: Vec<String>,
    pub model_name: String,
}

impl NoteInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoteFields {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub options: NoteOptions,
    pub tags: Vec<String>,
}

/// Query scoping a search to exactly one deck. Search wildcards in the
/// name are escaped so they match literally.
pub fn deck_query(deck: &str) -> String {
    let mut escaped = String::with_capacity(deck.len());
    for c in deck.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("deck:\"{escaped}\"")
}
