//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::services::otp::{CodeStore, MemoryCodeStore};
use crate::services::token::TokenService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool,
/// the token signer, and the one-time-code store. Configuration is
/// consumed at construction time; only the token secret outlives it,
/// baked into the [`TokenService`] keys.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    tokens: TokenService,
    codes: Arc<dyn CodeStore>,
}

impl AppState {
    /// Create a new application state with the default in-process code store.
    #[must_use]
    pub fn new(config: &StoreConfig, pool: PgPool) -> Self {
        Self::with_code_store(config, pool, Arc::new(MemoryCodeStore::new()))
    }

    /// Create a new application state with an explicit code store.
    #[must_use]
    pub fn with_code_store(config: &StoreConfig, pool: PgPool, codes: Arc<dyn CodeStore>) -> Self {
        let tokens = TokenService::new(&config.token_secret);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                tokens,
                codes,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token signer/verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the one-time-code store.
    #[must_use]
    pub fn codes(&self) -> &dyn CodeStore {
        self.inner.codes.as_ref()
    }
}
