use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use translate_relay::api::{self, AppState};
use translate_relay::config::{Config, ConfigHandle};
use translate_relay::hook::{self, HookState, MessageHook};
use translate_relay::i18n::TranslationMetrics;
use translate_relay::preferences::PreferenceStore;
use translate_relay::provider::ChatCompletionsProvider;
use translate_relay::relay::Dispatcher;
use translate_relay::{db, platform};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translate_relay=info".parse()?),
        )
        .init();

    info!("Starting translate relay");

    let config = Config::from_env()?;
    let handle = ConfigHandle::new(config.provider.clone());
    if let Err(e) = config.provider.validate() {
        // Not fatal: API calls get 501 until a reload fixes it
        error!("{}", e);
    }

    let kv = db::open_store(config.database_url.as_deref())
        .await
        .context("Failed to open preference store")?;

    let client = reqwest::Client::new();
    let (posts, events) = platform::connect(
        client.clone(),
        config.platform_url.as_deref(),
        config.platform_token.clone(),
    );

    let preferences = PreferenceStore::new(kv, events);
    let provider = ChatCompletionsProvider::new(client, handle.clone());
    let dispatcher = Dispatcher::new(Arc::new(provider));

    let api_app = api::router(AppState {
        preferences: preferences.clone(),
        dispatcher: dispatcher.clone(),
        posts,
        config: handle.clone(),
    });
    let hook_app = hook::router(HookState {
        hook: Arc::new(
            MessageHook::new(preferences, dispatcher, handle.clone())
                .with_deadline(config.hook_deadline),
        ),
        secret: Arc::from(config.hook_secret.as_str()),
    });

    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let hook_addr = SocketAddr::from(([0, 0, 0, 0], config.hook_port));
    let api_listener = TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("Failed to bind API listener on {}", api_addr))?;
    let hook_listener = TcpListener::bind(hook_addr)
        .await
        .with_context(|| format!("Failed to bind hook listener on {}", hook_addr))?;

    info!("API listening on {}", api_addr);
    info!("Hook listening on {}", hook_addr);

    tokio::spawn(reload_on_sighup(handle));

    tokio::try_join!(
        async {
            axum::serve(api_listener, api_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
        async {
            axum::serve(hook_listener, hook_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
    )?;

    let report = TranslationMetrics::global().report();
    info!(
        "Shutting down: {} detections ({:.1}% ok), {} translations ({:.1}% ok), {} skipped",
        report.detections,
        report.detection_success_rate,
        report.translations,
        report.translation_success_rate,
        report.skipped
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn reload_on_sighup(handle: ConfigHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGHUP handler: {}", e);
            return;
        }
    };

    while hangups.recv().await.is_some() {
        handle.reload_from_env();
    }
}

#[cfg(not(unix))]
async fn reload_on_sighup(_handle: ConfigHandle) {}
