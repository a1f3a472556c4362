use anyhow::Context;
use clap::Parser;

use hotel_api::{
    cli::Cli,
    config::Config,
    database::create_pool,
    observability::init_tracing,
    server::Server,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;
    init_tracing(&config)?;

    let state = match config.database.clone() {
        Some(db) => {
            let pool = create_pool(&db)
                .await
                .context("failed to open the database")?;
            AppState::postgres(config, pool, db.query_timeout())?
        }
        None => {
            tracing::warn!("No database configured; data is kept in memory and lost on exit");
            AppState::in_memory(config)?
        }
    };

    Server::new(state).serve().await?;
    Ok(())
}
