use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use storefront_service::{
    app_error,
    app_state::AppState,
    bootstrap::{self, bootstrap},
    config, db, routes,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;
    app_error::init(config.environment);

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let pool = db::create_pool(&config.database).await?;
    let server = config.server.clone();
    let state = AppState::new(pool, config);
    let app = routes::app(state)?;

    tracing::info!("Bootstrapping...");
    bootstrap("StorefrontService", app, &server).await?;
    Ok(())
}
