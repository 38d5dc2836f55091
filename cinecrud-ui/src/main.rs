//! cinecrud-ui - Movie catalog manager
//!
//! Seeds a local catalog from TMDb and edits it from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use cinecrud_common::config::{
    config_file_path, load_toml_config, write_toml_config, RootFolderInitializer, RootFolderResolver,
    TomlConfig,
};
use cinecrud_common::{FileStore, KeyValueStore, Movie, SnapshotStore};
use cinecrud_ui::config::resolve_credentials;
use cinecrud_ui::shell::{render_details, render_page, run_shell};
use cinecrud_ui::terminal::stdio;
use cinecrud_ui::{CatalogPresenter, EditorDialogs, TmdbClient};

const MODULE_NAME: &str = "cinecrud-ui";

#[derive(Parser)]
#[command(name = "cinecrud-ui", version, about = "Movie catalog manager backed by TMDb")]
struct Cli {
    /// Root folder for local data (overrides env and config)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Config file (default: <config_dir>/cinecrud/cinecrud-ui.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collection name
    #[arg(long)]
    collection: Option<String>,

    /// Search query used to seed the catalog
    #[arg(long)]
    query: Option<String>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,
    /// Print one page of the local catalog
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Reload from TMDb, discarding local edits
    Reset,
    /// Return to the last loaded data
    Restore,
    /// Remote details and videos for a movie
    Info { id: i64 },
    /// Write the effective configuration (file plus command-line overrides)
    InitConfig {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply command-line overrides to the loaded config
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(collection) = &self.collection {
            config.catalog.collection = collection.clone();
        }
        if let Some(query) = &self.query {
            config.catalog.default_query = query.clone();
        }
        if let Some(page_size) = self.page_size {
            config.catalog.page_size = page_size;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path(MODULE_NAME)?,
    };
    let mut config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    // Logs go to stderr; stdout carries the table
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting cinecrud-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config file: {}", config_path.display());

    let command = cli.command.take().unwrap_or(Commands::Shell);
    if let Commands::InitConfig { force } = command {
        if config_path.exists() && !force {
            bail!("{} already exists (use --force to replace it)", config_path.display());
        }
        write_toml_config(&config, &config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        info!("Wrote {}", config_path.display());
        return Ok(());
    }

    let root_folder = RootFolderResolver::new(cli.root_folder.clone(), &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let storage_path = initializer.storage_path();
    info!("Storage path: {}", storage_path.display());

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&storage_path)?);
    let store = SnapshotStore::<Movie>::with_prefix(kv, config.catalog.key_prefix.clone());

    let credentials = resolve_credentials(&config);
    let client = Arc::new(TmdbClient::new(&credentials)?);

    let terminal = Arc::new(stdio());
    let dialogs = Arc::new(EditorDialogs::new(terminal.clone()));
    let mut presenter = CatalogPresenter::new(client, dialogs, terminal.clone(), store, &config.catalog);

    match command {
        Commands::Shell => {
            presenter.activate().await;
            run_shell(&mut presenter, &*terminal).await?;
        }
        Commands::List { page } => {
            presenter.load_work()?;
            presenter.go_to_page(page);
            terminal.write(&render_page(&presenter.page_view())).await?;
        }
        Commands::Reset => {
            presenter.reset_from_source().await;
            terminal.write(&render_page(&presenter.page_view())).await?;
        }
        Commands::Restore => {
            presenter.restore_init().await;
            terminal.write(&render_page(&presenter.page_view())).await?;
        }
        Commands::Info { id } => {
            if let Some(details) = presenter.details(id).await {
                terminal.write(&render_details(&details)).await?;
            }
        }
        Commands::InitConfig { .. } => {}
    }

    info!("cinecrud-ui exiting");
    Ok(())
}
