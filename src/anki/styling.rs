use std::collections::HashSet;

use log::{
    info,
    warn,
};

use super::{
    api::AnkiClient,
    deck_notes,
    outcome::{
        BatchReport,
        NoteStatus,
        Target,
    },
    DeckNote,
};
use crate::core::AnkiError;

/// Dark card theme applied when no stylesheet is supplied.
pub const DEFAULT_CSS: &str = r#"
.card, .front, .back {
    font-family: "Segoe UI", Tahoma, Geneva, Verdana, sans-serif;
    font-size: 28px !important;
    font-weight: 700 !important;
    color: #e5e5e5 !important;
    background-color: #1e1e1e !important;
    text-align: center;
    line-height: 1.6;
    padding: 24px;
    border-radius: 12px;
    box-shadow: 0 4px 12px rgba(0,0,0,0.5);
}
"#;

/// Pushes a stylesheet to every note type used in a deck.
///
/// Styling belongs to the note type, so every other deck sharing one of
/// those note types changes too.
pub struct StyleUpdater {
    client: AnkiClient,
}

impl StyleUpdater {
    pub fn new(client: AnkiClient) -> Self {
        Self { client }
    }

    /// Distinct note types in `deck`, in the order they first appear.
    pub async fn models_in_deck(&self, deck: &str) -> Result<Vec<String>, AnkiError> {
        let notes = deck_notes(&self.client, deck).await?;
        Ok(distinct_models(&notes))
    }

    pub async fn apply_stylesheet(&self, deck: &str, css: &str) -> Result<BatchReport, AnkiError> {
        let notes = deck_notes(&self.client, deck).await?;
        let mut report = BatchReport::default();

        if notes.is_empty() {
            info!("No notes found in '{}', nothing to style", deck);
            return Ok(report);
        }

        for note in &notes {
            if let DeckNote::Unreadable(id) = note {
                report.push(
                    Target::Note(*id),
                    NoteStatus::Failed(format!("no info returned for note {id}")),
                );
            }
        }

        let models = distinct_models(&notes);
        for model in models {
            let status = match self.client.update_model(&model, css).await {
                Ok(()) => NoteStatus::Changed { added: Vec::new(), removed: Vec::new() },
                Err(err) if err.is_unavailable() => return Err(err),
                Err(err) => {
                    warn!("Failed to restyle model '{}': {}", model, err);
                    NoteStatus::Failed(err.to_string())
                }
            };
            report.push(Target::Model(model), status);
        }

        info!("Applied stylesheet for '{}': {}", deck, report);
        Ok(report)
    }
}

fn distinct_models(notes: &[DeckNote]) -> Vec<String> {
    let mut seen = HashSet::new();
    notes
        .iter()
        .filter_map(|note| match note {
            DeckNote::Found(info) => Some(info.model_name.clone()),
            DeckNote::Unreadable(_) => None,
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
