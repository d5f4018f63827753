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
        SkipReason,
        Target,
    },
    types::{
        NoteId,
        NoteInfo,
    },
    DeckNote,
};
use crate::core::AnkiError;

/// Smallest "larger lesson number" for which two lesson tags get merged.
pub const MERGE_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericTag {
    pub value: i32,
    /// Tag text as stored on the note, which may differ from `value` ("05").
    pub tag: String,
}

/// Tags that parse as an integer, largest first.
pub fn numeric_tags(tags: &[String]) -> Vec<NumericTag> {
    let mut numeric: Vec<NumericTag> = tags
        .iter()
        .filter_map(|tag| tag.parse::<i32>().ok().map(|value| NumericTag { value, tag: tag.clone() }))
        .collect();
    numeric.sort_by(|a, b| b.value.cmp(&a.value));
    numeric
}

/// Tags that do not parse as an integer.
pub fn legacy_tags(tags: &[String]) -> Vec<&str> {
    tags.iter().filter(|tag| tag.parse::<i32>().is_err()).map(String::as_str).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMergePlan {
    pub larger: NumericTag,
    pub smaller: NumericTag,
}

impl TagMergePlan {
    /// Eligible only with exactly two numeric tags, the larger at or above
    /// [`MERGE_THRESHOLD`].
    pub fn for_tags(tags: &[String]) -> Result<Self, SkipReason> {
        let numeric = numeric_tags(tags);
        let [larger, smaller]: [NumericTag; 2] =
            numeric.try_into().map_err(|n: Vec<NumericTag>| SkipReason::NumericTagCount(n.len()))?;

        if larger.value < MERGE_THRESHOLD {
            return Err(SkipReason::BelowThreshold(larger.value));
        }

        Ok(Self { larger, smaller })
    }

    pub fn composite(&self) -> String {
        format!("{}-{}", self.larger.value, self.smaller.value)
    }

    pub fn source_tags(&self) -> [&str; 2] {
        [self.larger.tag.as_str(), self.smaller.tag.as_str()]
    }
}

/// Deck-scoped tag maintenance. Every pass converges: running it again on its
/// own output changes nothing.
pub struct TagReconciler {
    client: AnkiClient,
}

impl TagReconciler {
    pub fn new(client: AnkiClient) -> Self {
        Self { client }
    }

    /// Removes every tag that is not a plain integer from each note in `deck`.
    pub async fn strip_legacy_tags(&self, deck: &str) -> Result<BatchReport, AnkiError> {
        let notes = deck_notes(&self.client, deck).await?;
        let mut report = BatchReport::default();

        for entry in &notes {
            let status = match entry {
                DeckNote::Found(note) => self.strip_note(note).await,
                DeckNote::Unreadable(id) => Err(unreadable(*id)),
            };
            record(&mut report, entry_id(entry), status)?;
        }

        info!("Stripped legacy tags in '{}': {}", deck, report);
        Ok(report)
    }

    /// Folds each note's two numeric lesson tags into one `<larger>-<smaller>` tag.
    pub async fn merge_lesson_tags(&self, deck: &str) -> Result<BatchReport, AnkiError> {
        let notes = deck_notes(&self.client, deck).await?;
        let mut report = BatchReport::default();

        for entry in &notes {
            let status = match entry {
                DeckNote::Found(note) => match TagMergePlan::for_tags(&note.tags) {
                    Ok(plan) => self.merge_note(note, &plan).await,
                    Err(reason) => Ok(NoteStatus::Skipped(reason)),
                },
                DeckNote::Unreadable(id) => Err(unreadable(*id)),
            };
            record(&mut report, entry_id(entry), status)?;
        }

        info!("Merged lesson tags in '{}': {}", deck, report);
        Ok(report)
    }

    async fn strip_note(&self, note: &NoteInfo) -> Result<NoteStatus, AnkiError> {
        let legacy = legacy_tags(&note.tags);
        if legacy.is_empty() {
            return Ok(NoteStatus::Skipped(SkipReason::Converged));
        }

        self.client.remove_tags(&[note.note_id], &legacy).await?;
        Ok(NoteStatus::Changed {
            added: Vec::new(),
            removed: legacy.into_iter().map(str::to_string).collect(),
        })
    }

    async fn merge_note(&self, note: &NoteInfo, plan: &TagMergePlan) -> Result<NoteStatus, AnkiError> {
        let composite = plan.composite();
        let sources = plan.source_tags();
        let already_merged = note.has_tag(&composite);

        // An earlier run added the composite but never removed the sources.
        // The removal below repeats it, so a rejection here is only logged.
        if already_merged {
            match self.client.remove_tags(&[note.note_id], &sources).await {
                Ok(()) => {}
                Err(err) if err.is_unavailable() => return Err(err),
                Err(err) => warn!("Catch-up removal failed for note {}: {}", note.note_id, err),
            }
        }

        self.client.add_tags(&[note.note_id], &[composite.as_str()]).await?;
        self.client.remove_tags(&[note.note_id], &sources).await?;

        Ok(NoteStatus::Changed {
            added: if already_merged { Vec::new() } else { vec![composite] },
            removed: sources.iter().map(|tag| tag.to_string()).collect(),
        })
    }
}

/// Records a per-note result. Request failures are kept in the report so the
/// batch moves on; an unreachable endpoint ends the batch.
fn record(
    report: &mut BatchReport,
    note_id: NoteId,
    status: Result<NoteStatus, AnkiError>,
) -> Result<(), AnkiError> {
    let status = match status {
        Ok(status) => status,
        Err(err) if err.is_unavailable() => return Err(err),
        Err(err) => {
            warn!("Tag update failed for note {}: {}", note_id, err);
            NoteStatus::Failed(err.to_string())
        }
    };
    report.push(Target::Note(note_id), status);
    Ok(())
}

fn entry_id(entry: &DeckNote) -> NoteId {
    match entry {
        DeckNote::Found(note) => note.note_id,
        DeckNote::Unreadable(id) => *id,
    }
}

fn unreadable(note_id: NoteId) -> AnkiError {
    AnkiError::request_failed("notesInfo", format!("no info returned for note {note_id}"))
}
