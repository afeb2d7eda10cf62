pub mod config;
pub mod controllers;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use services::notification::NotificationClient;
use store::postgres::PgStore;
use store::Store;

// Shared state for the whole application.
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub store: Arc<dyn Store>,
    pub notifier: NotificationClient,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size)
            .await
            .context("failed to connect to the database")?;

        db.run_migrations()
            .await
            .context("failed to run database migrations")?;

        let store: Arc<dyn Store> = Arc::new(PgStore::new(
            db.clone(),
            Duration::from_secs(config.database.query_timeout_seconds),
        ));
        let notifier = NotificationClient::from_config(&config.notification);

        Ok(Arc::new(Self {
            db,
            store,
            notifier,
            config,
        }))
    }
}
