use std::sync::Arc;

use crate::config::ServerConfig;

/// Handler state. Cloned per request, so everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    pub pool: scout_db::DbPool,
    /// Read by the auth handlers and the `AuthUser` extractor for JWT settings.
    pub config: Arc<ServerConfig>,
}
