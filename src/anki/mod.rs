use std::{
    collections::HashSet,
    time::Duration,
};

use log::{
    debug,
    info,
    warn,
};
use tokio::time::sleep;

use crate::core::AnkiError;

pub mod api;
pub mod deck_name;
pub mod import;
pub mod outcome;
pub mod styling;
pub mod tags;
pub mod types;

pub use api::{
    AnkiClient,
    AnkiConnect,
    AnkiTransport,
};
pub use deck_name::extract_display_name;
pub use import::CardImporter;
pub use outcome::{
    BatchReport,
    ImportOutcome,
    NoteStatus,
    SkipReason,
    Target,
};
pub use styling::StyleUpdater;
pub use tags::{
    TagMergePlan,
    TagReconciler,
};
pub use types::{
    Deck,
    NoteId,
    NoteInfo,
};

pub async fn list_decks(client: &AnkiClient) -> Result<Vec<Deck>, AnkiError> {
    let names = client.deck_names().await?;
    Ok(names
        .into_iter()
        .map(|name| Deck { display_name: extract_display_name(&name).to_string(), name })
        .collect())
}

/// Display names with duplicates removed, first occurrence kept.
pub fn display_names(decks: &[Deck]) -> Vec<&str> {
    let mut seen = HashSet::new();
    decks
        .iter()
        .map(|deck| deck.display_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// A note listed in a deck, or the id of one whose info Anki could not
/// return (typically deleted between listing and lookup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckNote {
    Found(NoteInfo),
    Unreadable(NoteId),
}

/// Every note in `deck`, fetched fresh from Anki, in listing order.
pub async fn deck_notes(client: &AnkiClient, deck: &str) -> Result<Vec<DeckNote>, AnkiError> {
    let note_ids = client.find_notes(&types::deck_query(deck)).await?;
    debug!("Found {} notes in '{}'", note_ids.len(), deck);

    if note_ids.is_empty() {
        return Ok(Vec::new());
    }

    let infos = client.notes_info(&note_ids).await?;
    let mut infos = infos.into_iter();

    Ok(note_ids
        .into_iter()
        .map(|id| match infos.next().flatten() {
            Some(note) => DeckNote::Found(note),
            None => {
                warn!("No note info for note {} in '{}'", id, deck);
                DeckNote::Unreadable(id)
            }
        })
        .collect())
}

/// Polls the `version` action until Anki answers or the attempts run out.
pub async fn wait_awake(
    client: &AnkiClient,
    interval: Duration,
    max_attempts: u32,
) -> Result<u32, AnkiError> {
    let mut last_error = AnkiError::RemoteUnavailable("no attempts made".to_string());

    for attempt in 1..=max_attempts {
        match client.version().await {
            Ok(version) => {
                info!("AnkiConnect is online. Version: {}", version);
                return Ok(version);
            }
            Err(err) => {
                debug!("AnkiConnect attempt {} of {} failed: {}", attempt, max_attempts, err);
                last_error = err;
                if attempt < max_attempts {
                    sleep(interval).await;
                }
            }
        }
    }

    Err(last_error)
}
