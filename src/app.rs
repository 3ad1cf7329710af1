use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{AppConfig, ConfigService, StoreBackend, StoreConfig};
use crate::infrastructure::db::{RecordStore, RestStore, SqliteStore};
use crate::interfaces::http::{add_log, start_server, AppState, SharedLogs};

pub fn run() -> Result<()> {
    let config = ConfigService::load()?;

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    actix_web::rt::System::new().block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = build_store(&config.store).await?;
    let state = Arc::new(AppState::new(store, &config.import));
    let logs: SharedLogs = Arc::new(Mutex::new(Vec::new()));

    let server = start_server(state, logs.clone(), &config.server)?;

    info!(host = %config.server.host, port = config.server.port, "HTTP server listening");
    add_log(
        &logs,
        "INFO",
        "Server",
        &format!("Listening on {}:{}", config.server.host, config.server.port),
    );

    server.await?;
    Ok(())
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::init(&config.sqlite_url).await?)),
        StoreBackend::Rest => {
            let (Some(url), Some(key)) = (&config.rest_url, &config.rest_api_key) else {
                return Err(AppError::ConfigError(
                    "REST backend selected without URL or API key".to_string(),
                ));
            };
            info!(url = %url, "Using REST store");
            Ok(Arc::new(RestStore::new(url, key)?))
        }
    }
}
