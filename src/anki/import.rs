use log::{
    info,
    warn,
};

use super::{
    api::AnkiClient,
    outcome::ImportOutcome,
    types::{
        NewNote,
        NoteFields,
        NoteOptions,
    },
};
use crate::{
    core::AnkiError,
    vocab::VocabularyEntry,
};

pub const DEFAULT_NOTE_MODEL: &str = "Basic (and reversed card)";

/// Turns vocabulary entries into `addNote` calls against one deck.
pub struct CardImporter {
    client: AnkiClient,
    model_name: String,
}

impl CardImporter {
    pub fn new(client: AnkiClient) -> Self {
        Self::with_model(client, DEFAULT_NOTE_MODEL)
    }

    pub fn with_model(client: AnkiClient, model_name: &str) -> Self {
        Self { client, model_name: model_name.to_string() }
    }

    pub fn build_note(&self, deck: &str, entry: &VocabularyEntry) -> NewNote {
        NewNote {
            deck_name: deck.to_string(),
            model_name: self.model_name.clone(),
            fields: NoteFields { front: entry.english.clone(), back: entry.japanese.clone() },
            options: NoteOptions { allow_duplicate: false },
            tags: entry.tags(),
        }
    }

    /// Submits every entry in order. A rejected entry does not stop the rest;
    /// each entry gets exactly one outcome. Once Anki stops answering, the
    /// remaining entries are reported unavailable without being sent.
    pub async fn import_cards(&self, deck: &str, entries: &[VocabularyEntry]) -> Vec<ImportOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());
        let mut unreachable: Option<String> = None;

        for (index, entry) in entries.iter().enumerate() {
            let result = match &unreachable {
                Some(reason) => Err(AnkiError::RemoteUnavailable(format!("not attempted: {reason}"))),
                None => self.client.add_note(&self.build_note(deck, entry)).await,
            };

            if let Err(err) = &result {
                warn!("Failed to add '{}' to '{}': {}", entry.english, deck, err);
                if unreachable.is_none() {
                    if let AnkiError::RemoteUnavailable(reason) = err {
                        unreachable = Some(reason.clone());
                    }
                }
            }

            outcomes.push(ImportOutcome { index, front: entry.english.clone(), result });
        }

        let added = outcomes.iter().filter(|o| o.is_ok()).count();
        info!("Imported {}/{} cards into '{}'", added, entries.len(), deck);
        outcomes
    }
}
