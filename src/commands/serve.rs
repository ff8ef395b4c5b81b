use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::router;
use crate::config::Config;
use crate::store::{self, StoreError};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("initializing storage backend: `{0}`")]
    Store(#[from] StoreError),
    #[error("binding `{address}`: `{source}`")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serving requests: `{0}`")]
    Serve(#[source] std::io::Error),
}

pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the gateway until a shutdown signal arrives, then releases the storage backend.
    pub async fn run(self) -> Result<(), ServeError> {
        let store = store::connect(&self.config.backend, self.config.http.to_owned()).await?;
        let app = router(store.clone(), &self.config.cors);

        let address = self.config.listener.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServeError::Bind {
                address: address.to_owned(),
                source,
            })?;
        info!(
            %address,
            backend = %self.config.backend.kind(),
            "form gateway listening"
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServeError::Serve);

        store.close().await;
        info!("form gateway stopped");
        served
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("unable to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("unable to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;
    use crate::config::{CorsConfig, DatabaseConfig, Listener, StorageBackend};
    use crate::http::config::HttpConfig;

    #[tokio::test]
    async fn address_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let dir = TempDir::new().unwrap();

        let config = Config {
            listener: Listener {
                host: "127.0.0.1".into(),
                port,
            },
            cors: CorsConfig::default(),
            backend: StorageBackend::Database(DatabaseConfig {
                url: format!("sqlite://{}", dir.path().join("gateway.db").display()),
            }),
            http: HttpConfig::default(),
        };

        assert_matches!(
            ServeCommand::new(config).run().await,
            Err(ServeError::Bind { address, .. }) if address == format!("127.0.0.1:{port}")
        );
    }
}
