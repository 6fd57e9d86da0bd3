use crate::assistant::{Assistant, ChatApiClient, ChatCompletion};
use crate::config::Config;
use crate::error::Error;
use crate::proxy::chat::ChatProxy;
use crate::proxy::map::MapProxy;
use crate::server::{build_router, AppState};
use crate::shutdown;
use crate::store::EventStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config and apply the configured locale
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => {
            rust_i18n::set_locale(&config.locale);
            info!("Setting locale to {}", config.locale);
            Ok(Arc::new(config))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize the state and serve until a termination signal arrives
pub async fn start_server(config: Arc<Config>) -> miette::Result<()> {
    let store = Arc::new(EventStore::load(&config.events_file)?);

    let client = reqwest::Client::new();
    let chat_proxy = Arc::new(ChatProxy::new(&config, client.clone()));
    let map_proxy = Arc::new(MapProxy::new(&config, client.clone()));
    let chat_api: Arc<dyn ChatCompletion> = Arc::new(ChatApiClient::new(&config, client));
    let assistant = Arc::new(Assistant::new(chat_api, config.tz()));

    let state = AppState {
        config: Arc::clone(&config),
        store,
        chat_proxy,
        map_proxy,
        assistant,
        messages: Arc::new(tokio::sync::RwLock::new(Vec::new())),
    };
    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Io)?;
    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(|e| Error::Other(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}
