use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use esports_insights::agents::backend::{create_backend, AiBackend};
use esports_insights::agents::narrator::NarratorAgent;
use esports_insights::api::{self, state::AppState};
use esports_insights::calculate::{analyze_with, BaselinePerformance};
use esports_insights::config::AppConfig;
use esports_insights::fetch::StatsApiClient;
use esports_insights::ingest::{self, ImportPayload};
use esports_insights::models::{Dataset, MultiMatchAnalysis};
use esports_insights::storage::{self, StorageConfig, StorageError};

#[derive(Parser)]
#[command(name = "esports-insights")]
#[command(about = "Mistake trends, player trends and correlation insights for esports teams")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the stored dataset and print the result as JSON
    Analyze {
        /// Only analyze the N most recent matches
        #[arg(long)]
        recent: Option<usize>,

        /// Only analyze one player's mistakes
        #[arg(long)]
        player: Option<String>,

        /// Also write the result to the derived directory
        #[arg(long)]
        save: bool,

        /// Print the snapshot last written with --save instead of re-analyzing
        #[arg(long, conflicts_with_all = ["recent", "player", "save"])]
        cached: bool,
    },

    /// Print an AI-written summary of the stored dataset
    Narrate {
        /// Only analyze the N most recent matches
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Validate import payload files and merge them into storage
    Import {
        /// Glob of payload files, e.g. "inbox/*.json"
        pattern: String,
    },

    /// Pull a team's series from the stats API into storage
    Fetch {
        /// Team id on the stats service
        #[arg(long)]
        team: String,
    },

    /// Start the API server
    Serve {
        /// Bind address (defaults to the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (defaults to the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn load_scoped(
    storage: &StorageConfig,
    recent: Option<usize>,
    player: Option<&str>,
) -> Result<Dataset> {
    let mut dataset = storage::load_dataset(storage)?;
    if let Some(n) = recent {
        if n == 0 {
            return Err(anyhow!("--recent must be greater than 0"));
        }
        dataset = dataset.recent(n);
    }
    if let Some(id) = player {
        dataset = dataset
            .for_player(id)
            .ok_or_else(|| anyhow!("Unknown player: {}", id))?;
    }
    Ok(dataset)
}

fn analyze(config: &AppConfig, dataset: &Dataset) -> MultiMatchAnalysis {
    analyze_with(
        &config.analysis,
        &BaselinePerformance,
        &dataset.matches,
        &dataset.mistakes,
        &dataset.players,
    )
}

fn cached_analysis(storage: &StorageConfig) -> Result<MultiMatchAnalysis> {
    storage::read_analysis(storage).map_err(|e| match e {
        StorageError::PathNotFound(path) => anyhow!(
            "No saved analysis at {}; run `analyze --save` first",
            path.display()
        ),
        other => other.into(),
    })
}

fn backend(config: &AppConfig) -> Result<Arc<dyn AiBackend>> {
    Ok(Arc::from(create_backend(&config.ai)?))
}

fn storage_for(config: &AppConfig) -> StorageConfig {
    StorageConfig::new(config.data_dir.clone())
}

fn print_import_summary(result: &ingest::ImportResult, source: &Path) {
    println!("\n=== Import Results ===");
    println!("Source:           {}", source.display());
    println!("Files imported:   {}", result.files_imported);
    println!("Records added:    {}", result.merged.added);
    println!("Records replaced: {}", result.merged.replaced);
    if result.orphan_mistakes > 0 {
        println!(
            "Orphan mistakes:  {} (ignored by analysis until their match is imported)",
            result.orphan_mistakes
        );
    }
    if !result.errors.is_empty() {
        println!("\nErrors:");
        for err in &result.errors {
            println!("  - {}", err);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting esports-insights v{}", env!("CARGO_PKG_VERSION"));

    let storage = storage_for(&config);

    match cli.command {
        Commands::Analyze { cached: true, .. } => {
            let analysis = cached_analysis(&storage)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Analyze {
            recent,
            player,
            save,
            ..
        } => {
            let dataset = load_scoped(&storage, recent, player.as_deref())?;
            let analysis = analyze(&config, &dataset);
            println!("{}", serde_json::to_string_pretty(&analysis)?);

            if save {
                let path = storage::write_analysis(&storage, &analysis)?;
                tracing::info!("Saved analysis to {}", path.display());
            }
        }
        Commands::Narrate { recent } => {
            let dataset = load_scoped(&storage, recent, None)?;
            let analysis = analyze(&config, &dataset);

            let narrator = NarratorAgent::new(backend(&config)?);
            let narrative = narrator
                .summarize(&analysis, dataset.matches.len(), dataset.mistakes.len())
                .await;
            if !narrative.generated {
                tracing::warn!("Showing fallback text; see earlier warnings for the cause");
            }
            println!("{}", narrative.text);
        }
        Commands::Import { pattern } => {
            let result = ingest::import_files(&storage, &pattern)?;
            print_import_summary(&result, Path::new(&pattern));
            if result.files_imported == 0 && !result.errors.is_empty() {
                return Err(anyhow!("No files could be imported"));
            }
        }
        Commands::Fetch { team } => {
            let client = StatsApiClient::new(&config.stats_api)?;
            let fetched = client.fetch_dataset(&team).await?;

            let payload = ImportPayload::Dataset(fetched);
            for warning in ingest::validate(&payload)? {
                tracing::warn!("{}", warning);
            }

            let mut dataset = storage::load_dataset(&storage)?;
            let summary = ingest::merge_into(&mut dataset, &payload);
            storage::save_dataset(&storage, &dataset)?;

            println!(
                "Fetched team {}: {} records added, {} replaced",
                team, summary.added, summary.replaced
            );
        }
        Commands::Serve { host, port } => {
            let state = AppState {
                storage: Arc::new(storage),
                params: Arc::new(config.analysis.clone()),
                ai_backend: backend(&config)?,
                cors_origin: config.server.cors_origin.clone(),
            };
            let app = api::build_router(state);

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
