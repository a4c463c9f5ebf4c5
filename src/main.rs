use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tubewatch::commands::CommandAdapter;
use tubewatch::config::Config;
use tubewatch::notify::{discord::DiscordChannel, Notifier};
use tubewatch::scanner::cache::LastSeenCache;
use tubewatch::scanner::service::{Scanner, ScannerConfig};
use tubewatch::server::app::{bind_address, build_router};
use tubewatch::server::state::AppState;
use tubewatch::store::db::SqliteStore;
use tubewatch::store::subscriptions::SubscriptionStore;
use tubewatch::youtube::client::YouTubeClient;
use tubewatch::youtube::VideoQuery;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Startup failures here are fatal: the serving loop is never entered
    // half-initialized.
    let config = Config::load()?;

    let store = SqliteStore::new(config.database_path.clone());
    store.touch().context("opening subscription database")?;
    let subscriptions = SubscriptionStore::new(store);

    let youtube: Arc<dyn VideoQuery> = Arc::new(
        YouTubeClient::new(config.youtube_api_key.clone())
            .context("constructing YouTube client")?,
    );
    let discord = DiscordChannel::new(config.discord_bot_token.clone())
        .context("constructing Discord client")?;
    let notifier = Notifier::new(Arc::new(discord));

    let scanner = Scanner::new(
        subscriptions.clone(),
        youtube,
        notifier,
        LastSeenCache::new(),
        ScannerConfig {
            poll_interval: config.poll_interval,
            channel_delay: config.channel_delay,
        },
    );

    let shutdown = CancellationToken::new();
    let scan_task = tokio::spawn(scanner.run_loop(shutdown.clone()));

    let state = AppState {
        commands: CommandAdapter::new(subscriptions.clone()),
        subscriptions,
    };
    let router = build_router(state);
    let addr = bind_address(&config.bind);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(event = "startup", bind = %addr, poll_interval_secs = config.poll_interval.as_secs(), "tubewatch running");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = scan_task.await;
    tracing::info!(event = "shutdown", "tubewatch stopped");
    Ok(())
}
