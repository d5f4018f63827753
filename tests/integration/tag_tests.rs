use ankihelper::{
    anki::{
        NoteStatus,
        SkipReason,
        TagReconciler,
        Target,
    },
    AnkiError,
};

use crate::common::{
    strings,
    Failure,
    FakeAnki,
};

#[tokio::test]
async fn test_strip_legacy_tags_keeps_only_numeric() {
    let fake = FakeAnki::new();
    let mixed = fake.add_note("Japanese", "Basic", &["Noun", "3", "Lesson", "7-5"]);
    let numeric = fake.add_note("Japanese", "Basic", &["4", "5"]);
    let legacy = fake.add_note("Japanese", "Basic", &["Verb"]);
    let other_deck = fake.add_note("French", "Basic", &["Noun"]);

    let report = TagReconciler::new(fake.client()).strip_legacy_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(mixed), strings(&["3"]));
    assert_eq!(fake.tags_of(numeric), strings(&["4", "5"]));
    assert!(fake.tags_of(legacy).is_empty());
    assert_eq!(fake.tags_of(other_deck), strings(&["Noun"]));

    assert_eq!(report.changed(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(
        report.outcome_for(&Target::Note(numeric)),
        Some(&NoteStatus::Skipped(SkipReason::Converged))
    );
    assert_eq!(fake.calls_for("removeTags").len(), 2);
    assert_eq!(fake.calls_for("removeTags")[0]["tags"], "Noun Lesson 7-5");
}

#[tokio::test]
async fn test_strip_legacy_tags_swallows_single_note_failure() {
    let fake = FakeAnki::new();
    let broken = fake.add_note("Japanese", "Basic", &["Noun", "1"]);
    let fine = fake.add_note("Japanese", "Basic", &["Verb", "2"]);
    fake.fail_for_note("removeTags", broken, Failure::Rejected("note was not found".to_string()));

    let report = TagReconciler::new(fake.client()).strip_legacy_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(fine), strings(&["2"]));
    assert_eq!(fake.tags_of(broken), strings(&["1", "Noun"]));
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, &Target::Note(broken));
}

#[tokio::test]
async fn test_strip_legacy_tags_aborts_when_unreachable() {
    let fake = FakeAnki::new();
    let first = fake.add_note("Japanese", "Basic", &["Noun"]);
    fake.add_note("Japanese", "Basic", &["Verb"]);
    fake.fail_for_note("removeTags", first, Failure::Unavailable);

    let result = TagReconciler::new(fake.client()).strip_legacy_tags("Japanese").await;

    assert!(matches!(result, Err(AnkiError::RemoteUnavailable(_))));
    assert_eq!(fake.calls_for("removeTags").len(), 1);
}

#[tokio::test]
async fn test_merge_lesson_tags() {
    let fake = FakeAnki::new();
    let eligible = fake.add_note("Japanese", "Basic", &["7", "5", "Noun"]);
    let below = fake.add_note("Japanese", "Basic", &["3", "2"]);
    let three = fake.add_note("Japanese", "Basic", &["7", "5", "2"]);
    let padded = fake.add_note("Japanese", "Basic", &["06", "12"]);
    let single = fake.add_note("Japanese", "Basic", &["9", "Verb"]);

    let report = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(eligible), strings(&["7-5", "Noun"]));
    assert_eq!(fake.tags_of(below), strings(&["2", "3"]));
    assert_eq!(fake.tags_of(three), strings(&["2", "5", "7"]));
    assert_eq!(fake.tags_of(padded), strings(&["12-6"]));
    assert_eq!(fake.tags_of(single), strings(&["9", "Verb"]));

    assert_eq!(report.changed(), 2);
    assert_eq!(
        report.outcome_for(&Target::Note(below)),
        Some(&NoteStatus::Skipped(SkipReason::BelowThreshold(3)))
    );
    assert_eq!(
        report.outcome_for(&Target::Note(three)),
        Some(&NoteStatus::Skipped(SkipReason::NumericTagCount(3)))
    );
    assert_eq!(
        report.outcome_for(&Target::Note(eligible)),
        Some(&NoteStatus::Changed {
            added: vec!["7-5".to_string()],
            removed: vec!["7".to_string(), "5".to_string()],
        })
    );
}

#[tokio::test]
async fn test_merge_lesson_tags_is_idempotent() {
    let fake = FakeAnki::new();
    let a = fake.add_note("Japanese", "Basic", &["5", "10", "Adjective"]);
    let b = fake.add_note("Japanese", "Basic", &["8", "1"]);
    let reconciler = TagReconciler::new(fake.client());

    reconciler.merge_lesson_tags("Japanese").await.unwrap();
    let after_first = (fake.tags_of(a), fake.tags_of(b));
    let calls_after_first = fake.calls_for("addTags").len();

    let second = reconciler.merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!((fake.tags_of(a), fake.tags_of(b)), after_first);
    assert_eq!(fake.tags_of(a), strings(&["10-5", "Adjective"]));
    assert_eq!(fake.tags_of(b), strings(&["8-1"]));
    assert_eq!(second.changed(), 0);
    assert_eq!(fake.calls_for("addTags").len(), calls_after_first);
}

#[tokio::test]
async fn test_merge_lesson_tags_finishes_partial_run() {
    let fake = FakeAnki::new();
    let note = fake.add_note("Japanese", "Basic", &["7", "5", "7-5"]);

    let report = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(note), strings(&["7-5"]));
    assert_eq!(fake.calls_for("removeTags").len(), 2);
    assert_eq!(
        report.outcome_for(&Target::Note(note)),
        Some(&NoteStatus::Changed {
            added: Vec::new(),
            removed: vec!["7".to_string(), "5".to_string()],
        })
    );
}

#[tokio::test]
async fn test_merge_lesson_tags_keeps_sources_when_add_fails() {
    let fake = FakeAnki::new();
    let broken = fake.add_note("Japanese", "Basic", &["6", "5"]);
    let fine = fake.add_note("Japanese", "Basic", &["9", "8"]);
    fake.fail_for_note("addTags", broken, Failure::Rejected("collection is busy".to_string()));

    let report = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(broken), strings(&["5", "6"]));
    assert_eq!(fake.tags_of(fine), strings(&["9-8"]));
    assert!(matches!(report.outcome_for(&Target::Note(broken)), Some(NoteStatus::Failed(_))));
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_empty_deck_skips_notes_info() {
    let fake = FakeAnki::new();
    fake.add_deck("Empty");
    let reconciler = TagReconciler::new(fake.client());

    let merged = reconciler.merge_lesson_tags("Empty").await.unwrap();
    let stripped = reconciler.strip_legacy_tags("Empty").await.unwrap();

    assert!(merged.outcomes.is_empty());
    assert!(stripped.outcomes.is_empty());
    assert!(fake.calls_for("notesInfo").is_empty());
}

#[tokio::test]
async fn test_listing_failure_is_an_error() {
    let fake = FakeAnki::new();
    fake.add_note("Japanese", "Basic", &["7", "5"]);
    fake.fail_when(
        |action, _| action == "notesInfo",
        Failure::Rejected("notes unavailable".to_string()),
    );

    let result = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await;

    assert!(matches!(result, Err(AnkiError::RemoteRequestFailed { .. })));
    assert!(fake.calls_for("addTags").is_empty());
}

#[tokio::test]
async fn test_strip_legacy_tags_survives_note_deleted_after_listing() {
    let fake = FakeAnki::new();
    let gone = fake.add_note("Japanese", "Basic", &["Noun"]);
    let kept = fake.add_note("Japanese", "Basic", &["Noun", "3"]);
    fake.mark_deleted(gone);

    let report = TagReconciler::new(fake.client()).strip_legacy_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(kept), strings(&["3"]));
    assert!(matches!(report.outcome_for(&Target::Note(gone)), Some(NoteStatus::Failed(_))));
    assert_eq!(report.changed(), 1);
    assert_eq!(fake.calls_for("removeTags").len(), 1);
}

#[tokio::test]
async fn test_merge_lesson_tags_survives_note_deleted_after_listing() {
    let fake = FakeAnki::new();
    let kept = fake.add_note("Japanese", "Basic", &["9", "6"]);
    let gone = fake.add_note("Japanese", "Basic", &["8", "7"]);
    fake.mark_deleted(gone);

    let report = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!(fake.tags_of(kept), strings(&["9-6"]));
    assert!(matches!(report.outcome_for(&Target::Note(gone)), Some(NoteStatus::Failed(_))));
    assert_eq!(report.outcomes.len(), 2);
}

#[tokio::test]
async fn test_merge_lesson_tags_continues_after_rejected_catch_up() {
    let fake = FakeAnki::new();
    let note = fake.add_note("Japanese", "Basic", &["7", "5", "7-5"]);
    fake.fail_once_when(
        |action, _| action == "removeTags",
        Failure::Rejected("collection is busy".to_string()),
    );

    let report = TagReconciler::new(fake.client()).merge_lesson_tags("Japanese").await.unwrap();

    assert_eq!(fake.calls_for("addTags").len(), 1);
    assert_eq!(fake.calls_for("removeTags").len(), 2);
    assert_eq!(fake.tags_of(note), strings(&["7-5"]));
    assert!(matches!(report.outcome_for(&Target::Note(note)), Some(NoteStatus::Changed { .. })));
}

#[tokio::test]
async fn test_wildcard_in_deck_name_stays_scoped() {
    let fake = FakeAnki::new();
    let starred = fake.add_note("Kanji*", "Basic", &["Noun", "1"]);
    let sibling = fake.add_note("KanjiN5", "Basic", &["Noun", "2"]);
    let underscored = fake.add_note("N5_vocab", "Basic", &["Verb"]);

    let reconciler = TagReconciler::new(fake.client());
    reconciler.strip_legacy_tags("Kanji*").await.unwrap();
    reconciler.strip_legacy_tags("N5_vocab").await.unwrap();

    assert_eq!(fake.tags_of(starred), strings(&["1"]));
    assert_eq!(fake.tags_of(sibling), strings(&["2", "Noun"]));
    assert!(fake.tags_of(underscored).is_empty());

    let queries = fake.calls_for("findNotes");
    assert_eq!(queries[0]["query"], r#"deck:"Kanji\*""#);
    assert_eq!(queries[1]["query"], r#"deck:"N5\_vocab""#);
}
