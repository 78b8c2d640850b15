//! User profiles, keyed by the user id that [`AuthModule`] authenticates.

use super::{AuthModule, PlatformError};
use crate::services::MemoryStore;
use async_trait::async_trait;
use module_orchestrator::{DependencyBundle, Module, ModuleError, SharedContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

const PROFILES: &str = "profiles";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
}

pub struct ProfilesModule {
    auth: Arc<AuthModule>,
    store: Arc<MemoryStore>,
}

impl ProfilesModule {
    pub async fn build(deps: DependencyBundle, ctx: SharedContext) -> Result<Self, ModuleError> {
        Ok(Self {
            auth: deps.get_as::<AuthModule>("auth")?,
            store: ctx.require::<MemoryStore>()?,
        })
    }

    #[instrument(skip(self, token))]
    pub async fn update_profile(&self, token: &str, display_name: &str) -> Result<Profile, PlatformError> {
        let user_id = self.auth.authenticate(token).await?;
        if display_name.trim().is_empty() {
            return Err(PlatformError::Validation("display name is empty".into()));
        }
        let profile = Profile {
            user_id: user_id.clone(),
            display_name: display_name.trim().to_string(),
        };
        let value = serde_json::to_value(&profile).map_err(|e| PlatformError::Validation(e.to_string()))?;
        self.store.put(PROFILES, &user_id, value).await;
        Ok(profile)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile, PlatformError> {
        let value = self
            .store
            .get(PROFILES, user_id)
            .await
            .ok_or_else(|| PlatformError::NotFound(user_id.to_string()))?;
        serde_json::from_value(value).map_err(|e| PlatformError::Validation(e.to_string()))
    }
}

#[async_trait]
impl Module for ProfilesModule {}
