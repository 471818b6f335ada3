use dokira_identity::{Authenticator, SessionAuthority};
use sqlx::SqlitePool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Authenticator,
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let authority = SessionAuthority::new(config.auth.secret.as_bytes());
        let auth = Authenticator::new(pool.clone(), authority, config.auth.token_ttl());

        Self { config, auth, pool }
    }
}
