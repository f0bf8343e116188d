//! m2v-orphans - MythTV orphan recording tool
//!
//! Scans the backend's recordings directory for files the backend no longer
//! lists, generates Ogg preview clips for them and promotes titled orphans
//! into the Videos storage group.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use m2v_common::config::LoggingConfig;
use m2v_common::{ConfigSource, Settings};
use m2v_orphans::catalog::CatalogClient;
use m2v_orphans::db::orphans::{load_all_orphans, load_orphan, update_orphan_titles};
use m2v_orphans::db::videos::CatalogDb;
use m2v_orphans::services::{classify_all, sample_generator, PromotionService, Reconciler, SampleConfig};

/// Command-line arguments for m2v-orphans
#[derive(Parser, Debug)]
#[command(name = "m2v-orphans")]
#[command(about = "Reconcile MythTV recordings with the backend catalog")]
#[command(version)]
struct Args {
    /// Configuration file (overrides M2V_CONFIG and the default locations)
    #[arg(short, long, env = "M2V_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the orphan list from the recordings directory
    Scan {
        /// Replace existing orphan records
        #[arg(long = "override")]
        override_existing: bool,
    },
    /// Print the stored orphans
    List,
    /// Report how many orphans need preview clips
    Classify {
        /// Treat existing clips as missing
        #[arg(long = "override")]
        override_existing: bool,
    },
    /// Generate missing preview clips
    Samples {
        /// Regenerate clips that already exist
        #[arg(long = "override")]
        override_existing: bool,
    },
    /// Set an orphan's title and subtitle
    Title {
        id: i64,
        title: String,
        #[arg(long, default_value = "")]
        subtitle: String,
    },
    /// Copy an orphan into the video catalog
    Promote {
        id: i64,
        /// Target host (defaults to the backend host)
        #[arg(long)]
        host: Option<String>,
        /// Remove the recording file and orphan record afterwards
        #[arg(long)]
        delete: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The configured subscriber depends on the settings; until then, stderr
    let settings = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        Settings::load(args.config.as_deref())
    })
    .context("Failed to load configuration")?;
    init_tracing(&settings.logging)?;

    info!(
        "Starting m2v-orphans v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &settings.source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Defaults => {
            warn!("No config file found, using environment and built-in defaults")
        }
    }
    info!("Backend: {}:{}", settings.mythbackend, settings.api_port);

    // Every step is awaited in sequence; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    runtime.block_on(run(args.command, settings))
}

fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .finish()
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, stderr_layer) = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

async fn run(command: Commands, settings: Settings) -> Result<()> {
    let pool = m2v_common::db::init_database(&settings.database_path)
        .await
        .context("Failed to open orphan database")?;
    info!("Database: {}", settings.database_path.display());

    match command {
        Commands::Scan { override_existing } => {
            let catalog = Arc::new(connect(&settings).await?);
            let reconciler = Reconciler::new(pool, catalog.clone(), catalog.backend_host());
            let created = reconciler
                .scan(
                    &settings.tv_recordings_dir,
                    &settings.recording_filename_pattern,
                    override_existing,
                )
                .await
                .context("Orphan scan failed")?;
            println!("Found {} orphan files.", created);
        }

        Commands::List => {
            let orphans = load_all_orphans(&pool).await?;
            for o in &orphans {
                println!(
                    "{:>5}  {}  {} {}  ch {:<4} {:<12} {:>4} min  {}",
                    o.intid,
                    o.filename,
                    o.start_date,
                    o.start_time,
                    o.channel_number,
                    o.channel_name,
                    o.duration,
                    o.title
                );
            }
            println!("{} orphan records.", orphans.len());
        }

        Commands::Classify { override_existing } => {
            let config = SampleConfig::from_settings(&settings, override_existing);
            let classified = classify_all(&pool, &config).await?;
            println!("A total of {} orphans were checked.", classified.total());
            println!(
                "Of these, {} were empty files (zero bytes) and {} already had samples present.",
                classified.empty.len(),
                classified.already_sampled.len()
            );
            println!("{} need video samples.", classified.needs_sample.len());
        }

        Commands::Samples { override_existing } => {
            let config = SampleConfig::from_settings(&settings, override_existing);
            let classified = classify_all(&pool, &config).await?;
            if classified.total() == 0 {
                println!("No orphan records to process -- exiting.");
                return Ok(());
            }

            println!("A total of {} orphans were checked.", classified.total());
            println!(
                "Of these, {} were empty files (zero bytes) and {} already had samples present.",
                classified.empty.len(),
                classified.already_sampled.len()
            );

            let commands = classified.commands();
            if commands.is_empty() {
                println!("There were no orphan records which needed samples made.");
                return Ok(());
            }

            println!(
                "I will attempt to make video samples for the remaining {}...",
                commands.len()
            );
            let outcomes = sample_generator::run(&commands).await;
            let failures: Vec<_> = outcomes.iter().filter(|o| !o.succeeded()).collect();
            println!(
                "{} attempts succeeded and {} encountered problems.",
                outcomes.len() - failures.len(),
                failures.len()
            );
            if !failures.is_empty() {
                println!("Here are the error messages:");
                for f in failures {
                    let message = String::from_utf8_lossy(f.diagnostic());
                    println!("{}: {}", f.filename, message.trim_end());
                }
            }
        }

        Commands::Title { id, title, subtitle } => {
            if !update_orphan_titles(&pool, id, &title, &subtitle).await? {
                return Err(anyhow!("No orphan with id {}", id));
            }
            println!("Orphan {} titled \"{}\".", id, title);
        }

        Commands::Promote { id, host, delete } => {
            let orphan = load_orphan(&pool, id)
                .await?
                .ok_or_else(|| anyhow!("No orphan with id {}", id))?;
            let url = settings
                .mythtv_database_url
                .as_deref()
                .context("MYTHTV_DATABASE_URL is not set; promotion updates the backend's catalog database")?;
            let catalog_db = CatalogDb::connect(url)
                .await
                .context("Failed to open catalog database")?;
            let catalog = Arc::new(connect(&settings).await?);
            let service = PromotionService::new(
                pool,
                catalog_db,
                catalog,
                settings.local_hostname.clone(),
            );
            let video = service
                .promote(&orphan, host.as_deref(), delete)
                .await
                .with_context(|| format!("Failed to promote {}", orphan.filename))?;
            println!(
                "Promoted {} as video {} ({}).",
                orphan.filename, video.intid, video.filename
            );
        }
    }

    Ok(())
}

async fn connect(settings: &Settings) -> Result<CatalogClient> {
    CatalogClient::connect(settings)
        .await
        .with_context(|| format!("Failed to reach MythTV backend {}", settings.mythbackend))
}
