pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod extract;
pub mod models;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::{Config, StoreBackend};
use database::Database;
use services::BookingService;
use store::{MemorySeatStore, PgSeatStore, SeatStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub booking: BookingService,
    // None при SEAT_STORE=memory
    pub db: Option<Database>,
}

impl AppState {
    /// Поднимает хранилище по конфигу, прогоняет миграции и заполняет вагон.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let (store, db): (Arc<dyn SeatStore>, Option<Database>) = match config.store.backend {
            StoreBackend::Postgres => {
                let db = connect(&config).await?;
                (Arc::new(PgSeatStore::new(db.clone())), Some(db))
            }
            StoreBackend::Memory => {
                info!("Using in-memory seat store");
                (Arc::new(MemorySeatStore::new()), None)
            }
        };

        let state = Self::with_store(config, store, db);
        state.booking.ensure_seeded().await?;
        Ok(state)
    }

    /// Состояние поверх готового хранилища (без заполнения).
    pub fn with_store(config: Config, store: Arc<dyn SeatStore>, db: Option<Database>) -> Arc<Self> {
        let booking = BookingService::new(
            store,
            config.booking.capacity,
            config.booking.store_deadline(),
        );
        Arc::new(Self { config, booking, db })
    }

    pub async fn shutdown(&self) {
        if let Some(db) = &self.db {
            db.close().await;
        }
    }
}

/// Подключение к Postgres и миграции.
pub async fn connect(config: &Config) -> anyhow::Result<Database> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let db = Database::new(url, config.database.pool_size, config.booking.store_deadline()).await?;
    info!("Database connected");
    db.run_migrations().await?;
    Ok(db)
}

/// Основной роутер приложения.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Train Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
