//! # Shared Context
//!
//! Cross-cutting services (persistence handle, cache handle, event bus, ...) are built once by
//! the process entry point and handed to every module factory through [`SharedContext`].
//! The orchestrator never looks inside; it only clones the context into each factory call.
//!
//! Services are keyed by their concrete type:
//!
//! ```rust
//! use module_orchestrator::SharedContext;
//!
//! struct Database { url: String }
//!
//! let ctx = SharedContext::builder()
//!     .with(Database { url: "postgres://localhost".into() })
//!     .build();
//!
//! let db = ctx.get::<Database>().unwrap();
//! assert_eq!(db.url, "postgres://localhost");
//! ```

use crate::error::ModuleError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-keyed bag of shared services. Cheap to clone.
#[derive(Clone, Default)]
pub struct SharedContext {
    services: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SharedContext {
    pub fn builder() -> SharedContextBuilder {
        SharedContextBuilder::default()
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| service.clone().downcast::<T>().ok())
    }

    /// Like [`SharedContext::get`], but as a `ModuleError` for use inside factories.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ModuleError> {
        self.get::<T>()
            .ok_or(ModuleError::ServiceMissing(std::any::type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("services", &self.services.len())
            .finish()
    }
}

/// Builder for [`SharedContext`]. Registering the same type twice keeps the last value.
#[derive(Default)]
pub struct SharedContextBuilder {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl SharedContextBuilder {
    pub fn with<T: Any + Send + Sync>(self, service: T) -> Self {
        self.with_arc(Arc::new(service))
    }

    pub fn with_arc<T: Any + Send + Sync>(mut self, service: Arc<T>) -> Self {
        self.services.insert(TypeId::of::<T>(), service);
        self
    }

    pub fn build(self) -> SharedContext {
        SharedContext {
            services: Arc::new(self.services),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cache(u32);

    #[test]
    fn test_missing_service() {
        let ctx = SharedContext::builder().with(Cache(1)).build();
        assert_eq!(ctx.get::<Cache>().unwrap().0, 1);
        assert!(ctx.get::<String>().is_none());
        assert!(matches!(ctx.require::<String>(), Err(ModuleError::ServiceMissing(_))));
    }

    #[test]
    fn test_clone_shares_services() {
        let cache = Arc::new(Cache(7));
        let ctx = SharedContext::builder().with_arc(cache.clone()).build();
        let copy = ctx.clone();
        assert!(Arc::ptr_eq(&copy.get::<Cache>().unwrap(), &cache));
    }
}
