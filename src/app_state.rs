use std::sync::Arc;

use sqlx::PgPool;

use crate::config;
use crate::db::repositories::{EntityStore, PgStore};
use crate::engine::PairLocks;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: config::Config,
    pub store: Arc<dyn EntityStore>,
    pub pair_locks: Arc<PairLocks>,
}

impl AppState {
    pub fn new(db: PgPool, env: config::Config) -> Self {
        let store = Arc::new(PgStore::new(db.clone()));
        Self {
            db,
            env,
            store,
            pair_locks: Arc::new(PairLocks::new()),
        }
    }
}
