use std::fmt;

use super::types::NoteId;
use crate::core::AnkiError;

/// What a batch operation acted on: a note, or for styling a note type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Note(NoteId),
    Model(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Note(id) => write!(f, "note {id}"),
            Target::Model(name) => write!(f, "model '{name}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to change; the note is already in its target state.
    Converged,
    /// Not exactly two numeric lesson tags.
    NumericTagCount(usize),
    /// Largest numeric lesson tag is below the merge threshold.
    BelowThreshold(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStatus {
    Changed { added: Vec<String>, removed: Vec<String> },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOutcome {
    pub target: Target,
    pub status: NoteStatus,
}

/// Per-target results of a best-effort batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<NoteOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, target: Target, status: NoteStatus) {
        self.outcomes.push(NoteOutcome { target, status });
    }

    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, NoteStatus::Changed { .. })).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, NoteStatus::Skipped(_))).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Target, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            NoteStatus::Failed(message) => Some((&o.target, message.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome_for(&self, target: &Target) -> Option<&NoteStatus> {
        self.outcomes.iter().find(|o| &o.target == target).map(|o| &o.status)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changed, {} skipped, {} failed",
            self.changed(),
            self.skipped(),
            self.failures().count()
        )
    }
}

/// Result of submitting one vocabulary entry.
#[derive(Debug)]
pub struct ImportOutcome {
    /// Position of the entry in the submitted sequence.
    pub index: usize,
    pub front: String,
    pub result: Result<NoteId, AnkiError>,
}

impl ImportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
