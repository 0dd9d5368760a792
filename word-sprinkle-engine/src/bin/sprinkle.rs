use clap::{Arg, ArgAction, Command};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use word_sprinkle::{Document, Level, Outline, Vocabulary, load_vocabulary_from_dir};
use word_sprinkle_engine::{
    EngineOptions, JsonFileStore, MemoryStore, SeenWordsPolicy, SettingsStore, SettingsUpdate,
    SprinkleEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("sprinkle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sprinkle German vocabulary into English text")
        .arg(
            Arg::new("input")
                .help("Text file to process, or - for stdin")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .short('l')
                .help("Vocabulary level: A1, A2, B1 or B2 (default: stored setting)"),
        )
        .arg(
            Arg::new("frequency")
                .long("frequency")
                .short('f')
                .help("Percentage of eligible words to replace, 0-100")
                .value_parser(clap::value_parser!(u8).range(0..=100)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for reproducible word selection")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .short('s')
                .help("JSON file holding settings, progress and favorites"),
        )
        .arg(
            Arg::new("vocabulary")
                .long("vocabulary")
                .help("Directory with a1.json .. b2.json (default: bundled vocabulary)"),
        )
        .arg(
            Arg::new("outline")
                .long("outline")
                .help("Treat the input as a JSON document outline instead of plain text")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help("Print HTML with marked substitutions instead of plain text")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tagger")
                .long("tagger")
                .short('t')
                .help("Skip words that look like proper nouns or other parts of speech")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lifetime")
                .long("lifetime")
                .help("Count a word as new only if it was never shown before")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show detailed processing logs")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let level = matches
        .get_one::<String>("level")
        .map(|s| s.parse::<Level>())
        .transpose()?;
    let overrides = SettingsUpdate {
        enabled: None,
        level,
        frequency: matches.get_one::<u8>("frequency").copied(),
    };

    let vocabulary = match matches.get_one::<String>("vocabulary") {
        Some(dir) => load_vocabulary_from_dir(Path::new(dir))?,
        None => Vocabulary::builtin()?,
    };
    info!("Loaded {} vocabulary entries", vocabulary.len());

    let store: Arc<dyn SettingsStore> = match matches.get_one::<String>("store") {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };
    let options = EngineOptions {
        seen_words_policy: if matches.get_flag("lifetime") {
            SeenWordsPolicy::Lifetime
        } else {
            SeenWordsPolicy::Daily
        },
        lexicon_tagger: matches.get_flag("tagger"),
    };

    let vocabulary = Arc::new(vocabulary);
    let mut engine = match matches.get_one::<u64>("seed") {
        Some(seed) => SprinkleEngine::seeded(vocabulary, store, *seed),
        None => SprinkleEngine::new(vocabulary, store),
    }
    .with_options(options);
    engine.initialize_with(&overrides).await;

    let input = read_input(matches.get_one::<String>("input").map_or("-", String::as_str)).await?;
    let mut document = if matches.get_flag("outline") {
        let outline: Outline = serde_json::from_str(&input)?;
        Document::from_outline(&outline)
    } else {
        Document::from_plain_text(&input)
    };

    if let Some(report) = engine.process_page(&mut document).await {
        if let Some(progress) = &report.progress {
            info!(
                "Words learned today: {} ({} new), pages today: {}",
                progress.state.words_today, progress.new_count, progress.state.pages_count
            );
        }
    }

    if matches.get_flag("html") {
        println!("{}", document.to_html());
    } else {
        println!("{}", document.to_plain_text());
    }
    Ok(())
}

async fn read_input(source: &str) -> Result<String, Box<dyn std::error::Error>> {
    if source == "-" {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        return Ok(buffer);
    }
    tokio::fs::read_to_string(source)
        .await
        .map_err(|e| format!("Failed to read {}: {}", source, e).into())
}
