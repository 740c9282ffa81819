use std::sync::Arc;

use crate::auth::{TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::Store;

/// Shared handles every handler and middleware reads from
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Fails when the configured signing secret or token lifetime is unusable
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;
        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        })
    }
}
