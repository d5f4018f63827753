use std::{
    fs,
    io::{
        self,
        Read,
    },
    path::{
        Path,
        PathBuf,
    },
    process::ExitCode,
};

use ankihelper::{
    anki::{
        display_names,
        list_decks,
        styling::DEFAULT_CSS,
        AnkiClient,
        BatchReport,
        CardImporter,
        StyleUpdater,
        TagReconciler,
    },
    launcher::{
        ensure_running,
        AnkiLauncher,
    },
    persistence::Settings,
    vocab::{
        generator_prompt,
        parse_document,
    },
};
use anyhow::{
    Context,
    Result,
};
use clap::{
    Parser,
    Subcommand,
};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "ankihelper", version, about = "Bulk vocabulary import and deck maintenance for Anki")]
struct Cli {
    /// AnkiConnect endpoint
    #[arg(long, env = "ANKI_CONNECT_URL", global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log every request
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List decks by display name
    Decks {
        /// Also show the raw deck names
        #[arg(long)]
        raw: bool,
    },
    /// Add one note per vocabulary entry ("-" reads stdin)
    Import {
        #[arg(long)]
        deck: String,
        file: PathBuf,
    },
    /// Remove every non-numeric tag from the deck's notes
    StripTags {
        #[arg(long)]
        deck: String,
    },
    /// Merge pairs of numeric lesson tags into one "<larger>-<smaller>" tag
    MergeTags {
        #[arg(long)]
        deck: String,
    },
    /// Replace the stylesheet of every note type used by the deck
    Style {
        #[arg(long)]
        deck: String,
        /// Stylesheet file; the built-in dark theme when omitted
        #[arg(long)]
        css: Option<PathBuf>,
    },
    /// Print the prompt for generating a vocabulary document
    Prompt,
    /// Show the effective settings
    Config {
        /// Write them to the settings file
        #[arg(long)]
        save: bool,
    },
    /// Start Anki unless AnkiConnect already answers
    EnsureRunning,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

/// Returns whether every entry or note succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let mut settings = Settings::load();
    if let Some(endpoint) = cli.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(timeout) = cli.timeout {
        settings.request_timeout_secs = timeout;
    }

    let client = AnkiClient::connect(&settings).context("Failed to set up the AnkiConnect client")?;

    match cli.command {
        Command::Decks { raw } => {
            let decks = list_decks(&client).await.context("Failed to list decks")?;
            if raw {
                for deck in &decks {
                    println!("{}\t{}", deck.display_name, deck.name);
                }
            } else {
                for name in display_names(&decks) {
                    println!("{name}");
                }
            }
            Ok(true)
        }
        Command::Import { deck, file } => {
            let document = read_input(&file)?;
            let entries = parse_document(&document)?;

            let importer = CardImporter::with_model(client, &settings.note_model);
            let outcomes = importer.import_cards(&deck, &entries).await;

            for outcome in &outcomes {
                match &outcome.result {
                    Ok(id) => println!("added   #{} '{}' as note {}", outcome.index, outcome.front, id),
                    Err(e) => println!("failed  #{} '{}': {}", outcome.index, outcome.front, e),
                }
            }
            Ok(outcomes.iter().all(|o| o.is_ok()))
        }
        Command::StripTags { deck } => {
            let report = TagReconciler::new(client).strip_legacy_tags(&deck).await?;
            Ok(print_report(&report))
        }
        Command::MergeTags { deck } => {
            let report = TagReconciler::new(client).merge_lesson_tags(&deck).await?;
            Ok(print_report(&report))
        }
        Command::Style { deck, css } => {
            let css = match css {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read stylesheet {}", path.display()))?,
                None => DEFAULT_CSS.to_string(),
            };
            let report = StyleUpdater::new(client).apply_stylesheet(&deck, &css).await?;
            Ok(print_report(&report))
        }
        Command::Prompt => {
            println!("{}", generator_prompt());
            Ok(true)
        }
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                let path = settings.save()?;
                println!("Saved to {}", path.display());
            }
            Ok(true)
        }
        Command::EnsureRunning => {
            let launcher = AnkiLauncher::new(client, &settings);
            match ensure_running(&launcher).await? {
                Some(child) => println!("Started Anki (pid {})", child.id()),
                None => println!("Anki is already running"),
            }
            Ok(true)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_report(report: &BatchReport) -> bool {
    for (target, message) in report.failures() {
        println!("failed  {target}: {message}");
    }
    println!("{report}");
    !report.has_failures()
}
