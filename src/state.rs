use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ItemService, SeaOrmAuthService, SeaOrmItemService, TokenIssuer,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenIssuer>,

    pub auth_service: Arc<dyn AuthService>,

    pub item_service: Arc<dyn ItemService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services over an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let tokens = Arc::new(TokenIssuer::new(
            &config.security.jwt_secret,
            config.security.token_ttl_minutes,
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        ));

        let item_service: Arc<dyn ItemService> = Arc::new(SeaOrmItemService::new(
            store.clone(),
            config.items.strict_transitions,
        ));

        Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            item_service,
        }
    }
}
