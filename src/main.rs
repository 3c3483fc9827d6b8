use std::sync::Arc;

use anyhow::Context as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use catalogd::config::Config;
use catalogd::events::NoopPublisher;
use catalogd::store::{PostgresStore, Store};
use catalogd::{Server, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Handler panics are caught and answered downstream; this routes the
    // panic site itself into the log instead of raw stderr.
    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "panic");
    }));

    let config = Config::load().context("loading configuration")?;
    info!(version = env!("CARGO_PKG_VERSION"), addr = %config.addr(), "catalogd starting");

    let store = PostgresStore::connect(&config.database_url(), config.database.max_connections)
        .await
        .context("connecting to postgres")?;
    store.ping().await.context("pinging postgres")?;

    let app = handlers::api(Arc::new(store), Arc::new(NoopPublisher), &config);

    Server::bind(&config.addr()).grace(config.grace()).serve(app).await.context("serving")?;

    Ok(())
}
