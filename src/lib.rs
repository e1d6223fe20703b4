pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod library;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, TrashCommands};
pub use config::Config;
use state::SharedState;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_observability(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;

        let builder = PrometheusBuilder::new();
        if let Some(port) = config.observability.metrics_port {
            builder
                .with_http_listener(([127, 0, 0, 1], port))
                .install()
                .context("Failed to start Prometheus exporter")?;
            info!(port, "Prometheus exporter listening");
        } else {
            builder
                .install_recorder()
                .context("Failed to install Prometheus recorder")?;
            info!("Prometheus metrics recorder initialized");
        }
    }

    Ok(())
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists.");
        }
        return Ok(());
    }

    config.validate()?;
    init_observability(&config)?;

    let state = SharedState::new(config)
        .await
        .context("Failed to initialize catalog")?;

    match command {
        Commands::Resolve { id } => cli::cmd_resolve(&state, &id).await,
        Commands::Sync { id } => cli::cmd_sync_series(&state, &id).await,
        Commands::SyncAll => cli::cmd_sync_all(&state).await,
        Commands::Search {
            query,
            kind,
            catalog_only,
        } => cli::cmd_search(&state, &query.join(" "), kind.map(Into::into), catalog_only).await,
        Commands::Trash { command } => match command {
            TrashCommands::List => cli::cmd_trash_list(&state).await,
            TrashCommands::Add { id, request } => cli::cmd_trash_add(&state, &id, request).await,
            TrashCommands::Restore { id } => cli::cmd_trash_restore(&state, &id).await,
            TrashCommands::Purge { id } => cli::cmd_trash_purge(&state, &id).await,
            TrashCommands::Empty => cli::cmd_trash_empty(&state).await,
            TrashCommands::Cleanup => cli::cmd_trash_cleanup(&state).await,
        },
        Commands::Init => Ok(()),
    }
}
