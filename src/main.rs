use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use seafood_orderservice::{
    bootstrap::{self, bootstrap},
    config::{self, StorageBackend},
    db, notifications,
    notifications::OutboxDispatcher,
    routes,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    if config.database.backend == StorageBackend::Postgres {
        tracing::info!("Running migrations...");
        let migrations_count =
            db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
        tracing::info!("Run {} new migrations successfully", migrations_count);
    }

    tracing::info!("Bootstrapping...");
    let store = bootstrap::connect_store(&config).await?;
    let notifier = notifications::from_config(&config.notifications).await?;
    let dispatcher = OutboxDispatcher::new(store.clone(), notifier, &config.notifications);
    tokio::spawn(dispatcher.run());

    let app = routes::app(bootstrap::build_state(&config, store));
    bootstrap("OrderService", app, &config).await?;
    Ok(())
}
