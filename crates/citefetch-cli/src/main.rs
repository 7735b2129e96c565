use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

mod json_store;
mod prompt;

use citefetch_core::sources::dblp::Dblp;
use citefetch_core::sources::semantic_scholar::SemanticScholar;
use citefetch_core::{
    BatchSummary, CandidateSelector, Config, FirstCandidate, ItemId, ProgressEvent, SourceBackend,
    config_file, update_items,
};
use json_store::JsonStore;
use prompt::TerminalSelector;

/// Enrich bibliographic item metadata from DBLP and Semantic Scholar
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update items in a JSON library from a scholarly database
    Update {
        /// Path to the JSON library file
        library: PathBuf,

        /// Database to query
        #[arg(long, value_enum, default_value_t = SourceKind::Dblp)]
        source: SourceKind,

        /// Item ids to update (default: every item in the library)
        #[arg(long, value_delimiter = ',')]
        items: Vec<ItemId>,

        /// Pick the first candidate without prompting
        #[arg(long)]
        first: bool,

        /// Semantic Scholar API key
        #[arg(long)]
        s2_api_key: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Search a database by title and print the candidates
    Search {
        /// Publication title to search for
        title: String,

        /// Database to query
        #[arg(long, value_enum, default_value_t = SourceKind::Dblp)]
        source: SourceKind,

        /// Semantic Scholar API key
        #[arg(long)]
        s2_api_key: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SourceKind {
    Dblp,
    #[value(name = "semantic-scholar", alias = "s2")]
    SemanticScholar,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Update {
            library,
            source,
            items,
            first,
            s2_api_key,
            timeout,
        } => update(library, source, items, first, s2_api_key, timeout).await,
        Command::Search {
            title,
            source,
            s2_api_key,
        } => search(title, source, s2_api_key).await,
    }
}

/// Effective config: file cascade, then env, then CLI flags.
fn resolve_config(s2_api_key: Option<String>, timeout: Option<u64>) -> Config {
    let mut config = config_file::load_config().into_config();
    if let Ok(key) = std::env::var("CITEFETCH_S2_API_KEY") {
        config.s2_api_key = Some(key);
    }
    if let Some(key) = s2_api_key {
        config.s2_api_key = Some(key);
    }
    if let Some(secs) = timeout {
        config.http_timeout_secs = secs;
    }
    config
}

fn build_source(kind: SourceKind, config: &Config) -> Box<dyn SourceBackend> {
    match kind {
        SourceKind::Dblp => Box::new(Dblp::new(config.max_concurrent_fetches)),
        SourceKind::SemanticScholar => {
            Box::new(SemanticScholar::new(config.s2_api_key.clone()))
        }
    }
}

async fn update(
    library: PathBuf,
    source: SourceKind,
    items: Vec<ItemId>,
    first: bool,
    s2_api_key: Option<String>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let config = resolve_config(s2_api_key, timeout);
    let source = build_source(source, &config);
    let client = reqwest::Client::new();

    let mut store = JsonStore::open(&library)?;
    let item_ids = if items.is_empty() { store.ids() } else { items };
    if item_ids.is_empty() {
        println!("{}", "library has no items".yellow());
        return Ok(());
    }

    let bar = ProgressBar::new(item_ids.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg} [{bar:40.cyan/dim}]")
            .expect("static template")
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let selector: Box<dyn CandidateSelector> = if first {
        Box::new(FirstCandidate)
    } else {
        Box::new(TerminalSelector::new(bar.clone()))
    };

    let progress_bar = bar.clone();
    let summary = update_items(
        &mut store,
        &item_ids,
        source.as_ref(),
        selector.as_ref(),
        &client,
        &config,
        move |event| match event {
            ProgressEvent::Searching { title, .. } => progress_bar.set_message(title),
            ProgressEvent::Finished { .. } => progress_bar.inc(1),
        },
    )
    .await;
    bar.finish_and_clear();

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    let line = format!("{}/{} items updated", summary.updated, summary.total);
    if summary.updated == summary.total {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.yellow().bold());
    }
}

async fn search(
    title: String,
    source: SourceKind,
    s2_api_key: Option<String>,
) -> anyhow::Result<()> {
    let config = resolve_config(s2_api_key, None);
    let source = build_source(source, &config);
    let client = reqwest::Client::new();

    let candidates = source
        .search_by_title(
            &title,
            &client,
            Duration::from_secs(config.http_timeout_secs),
        )
        .await;

    if candidates.is_empty() {
        println!("{}", "no results".yellow());
        return Ok(());
    }
    for (index, record) in candidates.iter().enumerate() {
        println!("{}", prompt::format_candidate(index, record));
    }
    Ok(())
}
