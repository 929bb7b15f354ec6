use crate::services::metrics::record_connection;
use crate::services::store::{Connector, ItemStore};
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Owns the process-wide store handle.
///
/// The first successful [`get_database`](Self::get_database) call establishes
/// the session; every later call, from any task, gets the same `Arc`.
/// Concurrent first calls share one in-flight connect. A failed connect
/// caches nothing, so the next caller tries again.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    handle: OnceCell<Arc<dyn ItemStore>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            handle: OnceCell::new(),
        }
    }

    pub async fn get_database(&self) -> Result<Arc<dyn ItemStore>, AppError> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let backend = self.connector.backend();
                tracing::info!(backend, "Establishing store connection");
                match self.connector.connect().await {
                    Ok(store) => {
                        record_connection(backend, true);
                        tracing::info!(backend, "Store connection established");
                        Ok(store)
                    }
                    Err(e) => {
                        record_connection(backend, false);
                        tracing::error!(backend, error = %e, "Failed to establish store connection");
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    /// Closes the cached handle, if one was ever established.
    pub async fn shutdown(&self) {
        if let Some(store) = self.handle.get() {
            store.close().await;
        }
    }
}
