//! Session handling. Users live in the shared store, sessions in the shared cache.

use super::PlatformError;
use crate::services::{Cache, MemoryStore};
use async_trait::async_trait;
use module_orchestrator::{DependencyBundle, HealthSnapshot, Module, ModuleError, SharedContext};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const USERS: &str = "users";

pub struct AuthModule {
    store: Arc<MemoryStore>,
    cache: Arc<Cache>,
    token_prefix: String,
    next_token: AtomicU64,
}

impl AuthModule {
    pub async fn build(deps: DependencyBundle, ctx: SharedContext) -> Result<Self, ModuleError> {
        let token_prefix = deps.config()["token_prefix"]
            .as_str()
            .unwrap_or("sess")
            .to_string();
        Ok(Self {
            store: ctx.require::<MemoryStore>()?,
            cache: ctx.require::<Cache>()?,
            token_prefix,
            next_token: AtomicU64::new(1),
        })
    }

    #[instrument(skip(self))]
    pub async fn register_user(&self, user_id: &str, email: &str) -> Result<(), PlatformError> {
        if !email.contains('@') {
            return Err(PlatformError::Validation(format!("invalid email: {}", email)));
        }
        self.store
            .put(USERS, user_id, serde_json::json!({ "email": email }))
            .await;
        info!(user_id, "User registered");
        Ok(())
    }

    /// Issues a session token for a registered user.
    #[instrument(skip(self))]
    pub async fn login(&self, user_id: &str) -> Result<String, PlatformError> {
        if self.store.get(USERS, user_id).await.is_none() {
            return Err(PlatformError::NotFound(user_id.to_string()));
        }
        let n = self.next_token.fetch_add(1, Ordering::SeqCst);
        let token = format!("{}_{}_{}", self.token_prefix, user_id, n);
        self.cache.set(session_key(&token), user_id).await;
        debug!(user_id, "Session issued");
        Ok(token)
    }

    /// Resolves a token to its user id.
    pub async fn authenticate(&self, token: &str) -> Result<String, PlatformError> {
        self.cache
            .get(&session_key(token))
            .await
            .ok_or(PlatformError::Unauthorized)
    }

    pub async fn logout(&self, token: &str) {
        self.cache.remove(&session_key(token)).await;
    }
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

#[async_trait]
impl Module for AuthModule {
    fn reports_health(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<HealthSnapshot, ModuleError> {
        let stats = self.cache.stats().await;
        let details = serde_json::to_value(stats).map_err(|e| ModuleError::Other(Box::new(e)))?;
        Ok(HealthSnapshot::healthy().with_details(details))
    }
}
