use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use catalog::{CandidateItem, CatalogId, FilterSet, GenreId};
use discovery::{DiscoverySource, FixtureDiscovery};
use feed::{jitter, JsonFileStore, KeyValueStore, MemoryStore, ProgressStore};
use pager::{FeedPager, LoadReport, PagerConfig};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// MovieMatch - swipe-style discovery feed
#[derive(Parser)]
#[command(name = "moviematch")]
#[command(about = "Paginated, de-duplicated, resumable movie discovery feed", long_about = None)]
struct Cli {
    /// Catalog dump (JSON array of raw rows, or {"results": [...]})
    #[arg(short, long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// JSON file used to persist feed progress (in-memory when absent)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Pager configuration (JSON, every field optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session id; seeds the shuffle and keys saved progress
    #[arg(long)]
    session: Option<String>,

    /// User id; seeds the shuffle
    #[arg(long)]
    user: Option<String>,

    /// Results per discovery page
    #[arg(long, default_value = "20")]
    page_size: usize,

    /// Override the configured number of tail retries
    #[arg(long)]
    tail_retries: Option<u32>,

    /// Override the configured jitter strength
    #[arg(long)]
    jitter_strength: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the feed and walk through it
    Browse {
        /// Number of advances after the initial load
        #[arg(long, default_value = "10")]
        count: usize,

        /// Continue from the saved position for these filters
        #[arg(long)]
        resume: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the jitter fingerprint of a catalog id for the session/user
    Fingerprint {
        #[arg(long)]
        catalog_id: CatalogId,
    },

    /// Inspect or clear saved progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Print the filter signature and number of active filters
    Signature {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Generate a new six-character session code
    SessionCode,
}

#[derive(Subcommand)]
enum ProgressAction {
    Show {
        #[command(flatten)]
        filters: FilterArgs,
    },
    Clear {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Genre ids every result must have (comma separated)
    #[arg(long, value_delimiter = ',')]
    genre: Vec<GenreId>,

    /// Genre ids no result may have (comma separated)
    #[arg(long, value_delimiter = ',')]
    exclude_genre: Vec<GenreId>,

    /// Earliest release year (default: 1990)
    #[arg(long)]
    year_min: Option<u16>,

    /// Latest release year
    #[arg(long)]
    year_max: Option<u16>,

    /// Drop the default earliest release year
    #[arg(long, conflicts_with = "year_min")]
    any_year: bool,

    /// Minimum average rating
    #[arg(long, default_value = "0")]
    rating_min: f32,

    /// Original language (ISO 639-1)
    #[arg(long)]
    language: Option<String>,

    /// Sort order passed to discovery
    #[arg(long)]
    sort: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> FilterSet {
        let defaults = FilterSet::default();
        let year_min = if self.any_year {
            None
        } else {
            self.year_min.or(defaults.year_min)
        };

        let mut filters = defaults
            .with_genres(self.genre.clone())
            .with_excluded_genres(self.exclude_genre.clone())
            .with_year_range(year_min, self.year_max)
            .with_rating_min(self.rating_min);
        if let Some(language) = &self.language {
            filters = filters.with_language(language.as_str());
        }
        if let Some(sort) = &self.sort {
            filters = filters.with_sort(sort.as_str());
        }
        filters
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Browse {
            count,
            resume,
            filters,
        } => handle_browse(&cli, config, *count, *resume, filters.to_filters()).await?,
        Commands::Fingerprint { catalog_id } => handle_fingerprint(&cli, &config, *catalog_id),
        Commands::Progress { action } => handle_progress(&cli, action)?,
        Commands::Signature { filters } => handle_signature(&filters.to_filters()),
        Commands::SessionCode => println!("{}", session_code().bold()),
    }

    Ok(())
}

/// Config file first, then flag overrides
fn load_config(cli: &Cli) -> Result<PagerConfig> {
    let mut config = match &cli.config {
        Some(path) => PagerConfig::from_json_file(path)
            .with_context(|| format!("Failed to read pager config {}", path.display()))?,
        None => PagerConfig::default(),
    };
    if let Some(retries) = cli.tail_retries {
        config = config.with_tail_retries(retries);
    }
    if let Some(strength) = cli.jitter_strength {
        config = config.with_jitter_strength(strength);
    }
    Ok(config)
}

fn open_store(cli: &Cli) -> Result<Arc<dyn KeyValueStore>> {
    Ok(match &cli.store {
        Some(path) => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("Failed to open progress store {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    })
}

/// Handle the 'browse' command
async fn handle_browse(
    cli: &Cli,
    config: PagerConfig,
    count: usize,
    resume: bool,
    filters: FilterSet,
) -> Result<()> {
    println!("Loading catalog from {}...", cli.catalog.display());
    let start = Instant::now();
    let source: Arc<dyn DiscoverySource> = Arc::new(
        FixtureDiscovery::from_json_file(&cli.catalog)
            .context("Failed to load catalog")?
            .with_page_size(cli.page_size),
    );
    println!("{} Loaded catalog in {:?}", "✓".green(), start.elapsed());

    let pager = FeedPager::new(source, open_store(cli)?, cli.session.clone(), cli.user.clone())
        .with_config(config);

    info!("Browsing with signature {}", filters.signature());
    match pager.reset_and_load(resume, filters).await {
        LoadReport::Ready { cursor, len } => {
            println!("{}", format!("Feed ready: {} items, cursor {}", len, cursor).bold().blue());
        }
        LoadReport::Exhausted => {
            println!("{}", "No movies match these filters.".yellow());
            print_notices(&pager);
            return Ok(());
        }
        LoadReport::Superseded => return Err(anyhow!("Feed load was superseded")),
    }

    if let Some(item) = pager.current() {
        print_item(pager.cursor(), &item);
    }
    for _ in 0..count {
        match pager.advance().await {
            Some(item) => print_item(pager.cursor(), &item),
            None => {
                println!("{}", "End of feed.".yellow());
                break;
            }
        }
    }

    println!(
        "State: {:?}, cursor {} of {} (last page {})",
        pager.state(),
        pager.cursor(),
        pager.len(),
        pager.last_page()
    );
    print_notices(&pager);
    Ok(())
}

/// Handle the 'fingerprint' command
fn handle_fingerprint(cli: &Cli, config: &PagerConfig, catalog_id: CatalogId) {
    let session = cli.session.as_deref();
    let user = cli.user.as_deref();
    println!(
        "fingerprint {} -> {} (jitter {:+.4})",
        catalog_id,
        jitter::fingerprint(session, user, catalog_id),
        jitter::jitter(session, user, catalog_id, config.jitter_strength)
    );
}

/// Handle the 'progress' command
fn handle_progress(cli: &Cli, action: &ProgressAction) -> Result<()> {
    if cli.store.is_none() {
        return Err(anyhow!("--store is required to inspect saved progress"));
    }
    let session = cli
        .session
        .as_deref()
        .ok_or_else(|| anyhow!("--session is required: progress is kept per session"))?;
    let progress = ProgressStore::new(open_store(cli)?);

    match action {
        ProgressAction::Show { filters } => {
            let filters = filters.to_filters();
            let key = ProgressStore::key(Some(session), &filters).unwrap_or_default();
            println!("{} = {}", key, progress.load(Some(session), &filters));
        }
        ProgressAction::Clear { filters } => {
            progress.clear(Some(session), &filters.to_filters());
            println!("{} Cleared progress", "✓".green());
        }
    }
    Ok(())
}

/// Handle the 'signature' command
fn handle_signature(filters: &FilterSet) {
    println!("{}", filters.signature());
    println!("{} active filters", filters.active_count());
}

/// Six uppercase base-36 characters, e.g. `K3Q9ZD`
fn session_code() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::rng();
    (0..6)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

fn print_item(index: usize, item: &CandidateItem) {
    let genres = item
        .genre_ids
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "{}. {} [{}] (catalog {})",
        (index + 1).to_string().green(),
        item.display_title(),
        genres,
        item.catalog_id
    );
}

fn print_notices(pager: &FeedPager) {
    for notice in pager.drain_notices() {
        println!("{} {}", "!".yellow(), notice);
    }
}
