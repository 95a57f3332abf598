// src/state.rs

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{channel::ChannelRegistry, config::Config};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub channel: ChannelRegistry,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ChannelRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.channel.clone()
    }
}
