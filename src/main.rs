use anyhow::Result;
use clap::{Parser, Subcommand};
use lasercut_catalog::catalog_stores::sqlite::SqliteCatalog;
use lasercut_catalog::config::AppConfig;
use lasercut_catalog::scanner::DirectoryScanner;
use lasercut_catalog::thumbnail::ThumbnailResolver;
use lasercut_catalog::web_server::{self, AppState};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about = "Catalog and preview a library of laser cut templates")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the catalog web interface (default)
    Serve,
    /// Scan the data directory once and exit
    Scan {
        /// Directory to scan instead of the configured one
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn run_scan(config: &AppConfig, root: Option<PathBuf>) -> Result<()> {
    let catalog = SqliteCatalog::open(Path::new(&config.database_path))?;
    let resolver = ThumbnailResolver::new(&config.thumbnail_directory)?;
    let root = root.unwrap_or_else(|| PathBuf::from(&config.scan_directory));

    let count = DirectoryScanner::new(&catalog, resolver).scan(&root);
    println!("Scanned {} files", count);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting lasercut catalog");
    info!("Data directory: {}", config.scan_directory);
    info!("Thumbnails directory: {}", config.thumbnail_directory);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::from_config(&config)?;
            if let Err(e) = web_server::start_web_server(&config, state).await {
                log::error!("Web server error: {}", e);
            }
        }
        Command::Scan { root } => run_scan(&config, root)?,
    }

    info!("Lasercut catalog finished");

    Ok(())
}
