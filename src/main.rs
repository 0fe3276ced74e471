use axum::{middleware, routing::get, Router};
use clap::Parser;
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chika_pos::cli::{Cli, Commands, DbCommands, TokenCommands};
use chika_pos::config::Config;
use chika_pos::services::{Notifier, SettingsCache};
use chika_pos::{cli, create_app, db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Tokens(TokenCommands::Credit { store_id, tokens }) => {
            let pool = db::create_pool(&config).await?;
            cli::handle_tokens_credit(&pool, store_id, &tokens).await
        }
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    // Fee and point settings cache with background refresh
    let settings = SettingsCache::start(pool.clone(), Duration::from_secs(60)).await;

    // WhatsApp notifier (disabled unless a gateway is configured)
    let notifier = Notifier::from_config(&config);

    // Metrics endpoint, behind its own bearer key
    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {}", e))?;
    let metrics_route = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            metrics::metrics_auth_middleware,
        ))
        .with_state(metrics_handle);

    let state = AppState {
        db: pool,
        config: config.clone(),
        settings,
        notifier,
    };
    let app = create_app(state).merge(metrics_route);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
