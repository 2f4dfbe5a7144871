//! Server state

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::{DynStorage, MemoryStorage, PgStorage};
use crate::orders::OrderService;
use crate::products::ProductService;

/// Shared state handed to every handler
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: DynStorage,
    pub orders: OrderService,
    pub products: ProductService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Build state on top of an existing storage backend
    pub fn new(config: Config, storage: DynStorage) -> Self {
        let orders = OrderService::new(storage.clone(), config.enforce_status_transitions);
        let products = ProductService::new(storage.clone());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config: Arc::new(config),
            storage,
            orders,
            products,
            jwt_service,
        }
    }

    /// Connect the configured storage backend and build state.
    ///
    /// PostgreSQL when `DATABASE_URL` is set (migrations are applied),
    /// otherwise the in-memory store, which is refused outside development.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let storage: DynStorage = match &config.database_url {
            Some(url) => {
                let pg =
                    PgStorage::connect(url, config.db_max_connections, config.db_isolation).await?;
                pg.migrate().await?;
                tracing::info!(
                    isolation = pg.isolation().as_str(),
                    max_connections = config.db_max_connections,
                    "PostgreSQL storage ready"
                );
                Arc::new(pg)
            }
            None if config.is_development() => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage (data is not persisted)");
                Arc::new(MemoryStorage::new())
            }
            None => {
                return Err(ServerError::Config(format!(
                    "DATABASE_URL must be set in {} environment",
                    config.environment
                )));
            }
        };

        Ok(Self::new(config.clone(), storage))
    }
}
