use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, shared_pool},
    services::token_service::TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(orm: OrmConn, config: &AppConfig) -> Self {
        Self {
            pool: shared_pool(&orm),
            orm,
            tokens: TokenService::new(&config.jwt_secret, config.user_token_ttl_hours),
        }
    }
}
