use anyhow::Context;
use clap::Parser;
use socialpedia_api::{EmbeddingClient, RetryConfig};
use socialpedia_cache::EmbeddingCache;
use socialpedia_core::{
    boundary, Collection, Config, EmbeddingBackend, ExportFormat, Exporter, JsonFileStore,
    ProjectionMode, RecordStore,
};
use socialpedia_semantic::{CachedProvider, EmbeddingProvider, FastEmbedProvider, RankingEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "socialpedia")]
#[command(version, about = "Meaning-based search over posts, events and users", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank a collection against a free-text query
    Search(SearchArgs),
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the embedding cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Collection to search: posts or users
    #[arg(short = 't', long = "type", default_value = "posts")]
    collection: String,

    /// Directory holding posts.json(l) / users.json(l)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Minimum similarity
    #[arg(long)]
    threshold: Option<f32>,

    /// Drop scores equal to the threshold
    #[arg(long)]
    exclusive: bool,

    /// Compare title/description/bio on every record, ignoring the kind field
    #[arg(long)]
    flat: bool,

    /// Keep at most this many results
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Embedding backend: local or remote
    #[arg(long)]
    backend: Option<String>,

    /// API key for the remote backend
    #[arg(long, env = "SOCIALPEDIA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip the embedding cache
    #[arg(long)]
    no_cache: bool,

    /// Output format: json, csv or md
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init,
    /// Print the config file location
    Path,
}

#[derive(clap::Subcommand)]
enum CacheAction {
    /// Entry count and age
    Stats,
    /// Remove every cached embedding
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean payload
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "socialpedia=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Search(args) => run_search(config, args).await,
        Commands::Config { action } => run_config(&config, action),
        Commands::Cache { action } => run_cache(&config, action),
    }
}

async fn run_search(mut config: Config, args: SearchArgs) -> anyhow::Result<()> {
    // Reject unknown selectors before touching the store or the model
    let collection: Collection = args.collection.parse()?;

    let format = ExportFormat::from_extension(&args.format)
        .with_context(|| format!("unknown format '{}'", args.format))?;

    apply_overrides(&mut config, &args)?;

    tracing::info!("Searching {} for: {}", collection, args.query);

    let store = JsonFileStore::new(&config.store.data_dir);
    let records = store.fetch_all(collection).await?;

    let provider = build_provider(&config, args.no_cache).await?;
    let engine = RankingEngine::new(provider, config.search.clone())?;
    let outcome = engine.rank(&args.query, &records).await?;

    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {}", warning);
    }

    let mut results = outcome.into_records();
    results.iter_mut().for_each(boundary::plain_identifiers);

    match args.output {
        Some(path) => {
            Exporter::export_to_file_with_format(&results, &path, format)?;
            tracing::info!("Wrote {} results to {}", results.len(), path.display());
        }
        None => println!("{}", Exporter::render(&results, format)?),
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &SearchArgs) -> anyhow::Result<()> {
    if let Some(dir) = &args.data_dir {
        config.store.data_dir = dir.clone();
    }
    if let Some(threshold) = args.threshold {
        config.search.threshold = threshold;
    }
    if args.exclusive {
        config.search.threshold_inclusive = false;
    }
    if args.flat {
        config.search.projection = ProjectionMode::Flat;
    }
    if args.limit.is_some() {
        config.search.max_results = args.limit;
    }
    if let Some(backend) = &args.backend {
        config.embedding.backend = match backend.to_lowercase().as_str() {
            "local" => EmbeddingBackend::Local,
            "remote" => EmbeddingBackend::Remote,
            other => anyhow::bail!("unknown backend '{}'. Use 'local' or 'remote'.", other),
        };
    }
    if args.api_key.is_some() {
        config.embedding.api_key = args.api_key.clone();
    }
    if args.no_cache {
        config.cache.enabled = false;
    }

    config.search.validate()?;
    Ok(())
}

async fn build_provider(
    config: &Config,
    no_cache: bool,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let embedding = &config.embedding;

    let provider: Arc<dyn EmbeddingProvider> = match embedding.backend {
        EmbeddingBackend::Local => {
            let local = FastEmbedProvider::new(embedding.model.clone());
            local.initialize().await?;
            Arc::new(local)
        }
        EmbeddingBackend::Remote => {
            let client = EmbeddingClient::new(
                embedding.api_url.clone(),
                embedding.api_model.clone(),
                embedding.api_key.clone(),
                Duration::from_secs(embedding.timeout_secs),
            )?
            .with_retry_config(RetryConfig::with_max_retries(embedding.max_retries));
            Arc::new(client)
        }
    };

    if !config.cache.enabled || no_cache {
        return Ok(provider);
    }

    let cache = EmbeddingCache::open(&config.cache.path, config.cache.max_entries)
        .with_context(|| format!("opening cache at {}", config.cache.path.display()))?;
    tracing::debug!("Embedding cache at {}", config.cache.path.display());

    Ok(Arc::new(CachedProvider::new(
        provider,
        cache,
        embedding.active_model(),
    )))
}

fn run_config(config: &Config, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Init => {
            let path = Config::config_path()?;
            if path.exists() {
                anyhow::bail!("config already exists at {}", path.display());
            }
            let path = Config::default().save()?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }

    Ok(())
}

fn run_cache(config: &Config, action: CacheAction) -> anyhow::Result<()> {
    let cache = EmbeddingCache::open(&config.cache.path, config.cache.max_entries)
        .with_context(|| format!("opening cache at {}", config.cache.path.display()))?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            println!("Cache:   {}", config.cache.path.display());
            println!("Entries: {}", stats.entries);
            println!("Models:  {}", stats.models);
            if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                println!("Oldest:  {}", oldest.to_rfc3339());
                println!("Newest:  {}", newest.to_rfc3339());
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {} cached embeddings", removed);
        }
    }

    Ok(())
}
