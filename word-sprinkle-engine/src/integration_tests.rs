//! End-to-end tests for the page pass
//!
//! These run the bundled vocabulary through the engine against arena
//! documents, with seeded sampling and in-memory or mock stores.

use crate::*;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use word_sprinkle::{ContentTree, Document, Level, Outline, Vocabulary};

fn builtin() -> Arc<Vocabulary> {
    Arc::new(Vocabulary::builtin().unwrap())
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

fn overrides(level: Level, frequency: u8) -> SettingsUpdate {
    SettingsUpdate {
        enabled: Some(true),
        level: Some(level),
        frequency: Some(frequency),
    }
}

async fn engine_on(store: Arc<dyn SettingsStore>, level: Level, frequency: u8) -> SprinkleEngine {
    let mut engine = SprinkleEngine::seeded(builtin(), store, 2024).with_date(date());
    engine.initialize_with(&overrides(level, frequency)).await;
    engine
}

// ============================================================================
// Substitution pipeline
// ============================================================================

#[tokio::test]
async fn test_house_scenario_and_exact_revert() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine_on(store.clone(), Level::B1, 100).await;
    let mut document = Document::from_plain_text("I see a house today.");

    let report = engine.process_page(&mut document).await.unwrap();
    assert_eq!(document.text_content(), "I sehen a Haus heute.");
    assert_eq!(report.candidates, 3);
    assert_eq!(report.placed.len(), 3);
    assert_eq!(report.failed, 0);

    let progress = report.progress.unwrap();
    assert_eq!(progress.new_count, 3);
    assert_eq!(progress.state.words_today, 3);
    assert_eq!(progress.state.pages_count, 1);

    let reverted = engine
        .on_settings_changed(
            &mut document,
            &SettingsUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(reverted, Transition::Disabled { reverted: 3 });
    assert_eq!(document.text_content(), "I see a house today.");
    assert!(document.markers().is_empty());
}

#[tokio::test]
async fn test_sentence_start_capitalization() {
    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::A1, 100).await;
    let mut document = Document::from_plain_text("Today I read a good book.");
    engine.process_page(&mut document).await;
    assert_eq!(document.text_content(), "Heute I lesen a gut Buch.");
}

#[tokio::test]
async fn test_level_limits_vocabulary() {
    let text = "The advantage of a big house.";

    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::A1, 100).await;
    let mut document = Document::from_plain_text(text);
    engine.process_page(&mut document).await;
    assert_eq!(document.text_content(), "The advantage of a groß Haus.");

    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::B2, 100).await;
    let mut document = Document::from_plain_text(text);
    engine.process_page(&mut document).await;
    assert_eq!(document.text_content(), "The Vorteil of a groß Haus.");
}

#[tokio::test]
async fn test_low_frequency_still_places_one_word() {
    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::B1, 1).await;
    let mut document = Document::from_plain_text("I see a house today.");
    let report = engine.process_page(&mut document).await.unwrap();
    assert_eq!(report.candidates, 3);
    assert_eq!(report.selected, 1);
    assert_eq!(document.markers().len(), 1);
}

#[tokio::test]
async fn test_same_seed_same_page() {
    let text = "Good morning. I see a friend, a house and water today.\n\n\
                The big book is new. I read it every day.";

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::B1, 40).await;
        let mut document = Document::from_plain_text(text);
        engine.process_page(&mut document).await;
        outputs.push(document.to_html());
    }
    assert_eq!(outputs[0], outputs[1]);
    assert!(outputs[0].contains("german-sprinkle-word"));
}

#[tokio::test]
async fn test_skipped_regions_survive_the_pass() {
    let outline: Outline = serde_json::from_value(json!({
        "type": "element",
        "tag": "body",
        "children": [
            {"type": "element", "tag": "code", "children": [{"type": "text", "text": "house"}]},
            {"type": "element", "tag": "div", "editable": true,
             "children": [{"type": "text", "text": "my house"}]},
            {"type": "element", "tag": "p", "children": [{"type": "text", "text": "a house"}]}
        ]
    }))
    .unwrap();
    let mut document = Document::from_outline(&outline);

    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::A1, 100).await;
    let report = engine.process_page(&mut document).await.unwrap();
    assert_eq!(report.candidates, 1);
    assert_eq!(document.text_content(), "housemy housea Haus");
}

#[tokio::test]
async fn test_lexicon_tagger_skips_proper_nouns() {
    let mut engine = SprinkleEngine::seeded(builtin(), Arc::new(MemoryStore::new()), 5)
        .with_options(EngineOptions {
            lexicon_tagger: true,
            ..Default::default()
        })
        .with_date(date());
    engine.initialize_with(&overrides(Level::A1, 100)).await;

    let mut document = Document::from_plain_text("We met at the Big House today.");
    engine.process_page(&mut document).await;
    assert_eq!(document.text_content(), "We met at the Big House heute.");
}

#[tokio::test]
async fn test_markers_render_as_spans() {
    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::A1, 100).await;
    let mut document = Document::from_plain_text("a house");
    let report = engine.process_page(&mut document).await.unwrap();

    let html = document.to_html();
    assert!(html.contains(r#"class="german-sprinkle-word""#));
    assert!(html.contains(r#"data-original="house""#));
    assert!(html.contains(r#"data-german="Haus""#));

    let annotation = engine
        .annotation_for(&document, report.markers[0])
        .await
        .unwrap();
    assert_eq!(annotation.example().german, "Hier ist das Haus.");
}

// ============================================================================
// Progress and persistence
// ============================================================================

#[tokio::test]
async fn test_progress_accumulates_across_pages() {
    let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());

    let mut first = engine_on(store.clone(), Level::A1, 100).await;
    let mut page = Document::from_plain_text("a house");
    let progress = first.process_page(&mut page).await.unwrap().progress.unwrap();
    assert_eq!(progress.new_count, 1);

    let mut second = engine_on(store.clone(), Level::A1, 100).await;
    let mut page = Document::from_plain_text("a house and a book");
    let progress = second.process_page(&mut page).await.unwrap().progress.unwrap();
    assert_eq!(progress.new_count, 1);
    assert_eq!(progress.state.words_today, 2);
    assert_eq!(progress.state.pages_count, 2);

    let stored = store.get(&[keys::SEEN_WORDS_LIST]).await.unwrap();
    assert_eq!(stored[keys::SEEN_WORDS_LIST], json!(["buch", "haus"]));
}

#[tokio::test]
async fn test_unavailable_store_degrades_quietly() {
    let store = Arc::new(MockStore::new(MockMode::Unavailable));
    let mut engine = SprinkleEngine::seeded(builtin(), store.clone(), 3).with_date(date());

    let settings = engine.initialize().await;
    assert_eq!(settings, Settings::default());

    let mut document = Document::from_plain_text("I see a house today.");
    let report = engine.process_page(&mut document).await.unwrap();
    assert_eq!(report.placed.len(), 1);
    assert_eq!(report.progress.unwrap().state.pages_count, 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_settings_from_json_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"enabled": true, "level": "A1", "frequency": 100}"#).unwrap();

    let store = Arc::new(JsonFileStore::new(&path));
    let mut engine = SprinkleEngine::seeded(builtin(), store, 1).with_date(date());
    let settings = engine.initialize().await;
    assert_eq!(settings.level, Level::A1);
    assert_eq!(settings.frequency, 100);

    let mut document = Document::from_plain_text("The advantage of a big house.");
    engine.process_page(&mut document).await;
    assert_eq!(document.text_content(), "The advantage of a groß Haus.");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["pagesCount"], json!(1));
    assert_eq!(written["lastResetDate"], json!("2024-09-02"));
}

// ============================================================================
// Host messages
// ============================================================================

#[tokio::test]
async fn test_host_message_drives_level_change() {
    let mut engine = engine_on(Arc::new(MemoryStore::new()), Level::A1, 100).await;
    let mut document = Document::from_plain_text("The advantage of a big house.");
    engine.process_page(&mut document).await;

    let message: HostMessage =
        serde_json::from_str(r#"{"type":"SETTINGS_UPDATED","settings":{"level":"B2"}}"#).unwrap();
    let transition = engine.handle_message(&mut document, &message).await;

    assert!(matches!(
        transition,
        Transition::LevelChanged { reverted: 2, .. }
    ));
    assert_eq!(document.text_content(), "The Vorteil of a groß Haus.");
    assert_eq!(engine.settings().level, Level::B2);
}
