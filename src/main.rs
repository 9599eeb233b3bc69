use std::sync::Arc;

use anyhow::Context;
use config::{Backend, Config};
use repositories::{JsonFileRepo, PostgresRepo, PostsRepository};
use routes::create_routes;
use services::{assets::AssetStore, posts::PostsService};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use self::errors::{Error, Result};

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub posts_service: PostsService,
}

async fn connect_repository(
    config: &Config,
    assets: &AssetStore,
) -> anyhow::Result<Arc<dyn PostsRepository>> {
    match config.backend {
        Backend::File => {
            let repo = JsonFileRepo::open(&config.data_file, assets.clone())
                .await
                .with_context(|| format!("failed to open {}", config.data_file.display()))?;
            info!("✅ Storing posts in {}", repo.path().display());
            Ok(Arc::new(repo))
        }
        Backend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when BLOG_BACKEND=postgres")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect(database_url)
                .await
                .context("🔥 Failed to connect to the database")?;
            info!("✅ Connection to the database is successful!");
            Ok(Arc::new(PostgresRepo::new(pool, assets.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init()?;

    let assets = AssetStore::new(&config.assets_dir);
    assets
        .ensure_dirs()
        .await
        .with_context(|| format!("failed to create {}", config.assets_dir.display()))?;
    info!("Serving uploads from {}", assets.root().display());

    let repo = connect_repository(&config, &assets).await?;

    let app_state = AppState {
        config: config.clone(),
        posts_service: PostsService::new(repo, assets),
    };

    let app = create_routes(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    info!("Server is running on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
