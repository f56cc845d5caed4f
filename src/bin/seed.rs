//! Полная пересборка вагона: удалить все места и создать 1..N свободными.
//! Запускается отдельно от сервиса.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use train_booking::{
    config::{Config, StoreBackend},
    connect,
    store::{PgSeatStore, SeatStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.store.backend != StoreBackend::Postgres {
        anyhow::bail!("seeding only makes sense for SEAT_STORE=postgres");
    }

    let db = connect(&config).await?;
    let store: Arc<dyn SeatStore> = Arc::new(PgSeatStore::new(db.clone()));

    store.reseed(config.booking.capacity).await?;
    info!("Seeded database with {} seats", config.booking.capacity);

    db.close().await;
    Ok(())
}
