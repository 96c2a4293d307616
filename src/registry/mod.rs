//! Message model lookup
//!
//! An interchange names the model of each message in its UNH header. The
//! envelope asks a [`MappingRegistry`] for the [`Edimap`] registered under
//! that [`MessageKey`]. Registries are shared read-only between parses.
//!
//! ```text
//! MappingRegistry
//!   ├── StaticRegistry   every model built up front
//!   ├── LazyRegistry     loader callback, cached on first use
//!   └── ArchiveRegistry  zip archive of serialized models (feature "archive")
//! ```

mod lazy;

#[cfg(feature = "archive")]
mod archive;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

pub use crate::model::MessageKey;
use crate::model::Edimap;
use crate::parser::errors::{EdiError, Result};

#[cfg(feature = "archive")]
pub use archive::{ArchiveRegistry, LoadMode, Manifest, ManifestEntry, paths, write_archive};
pub use lazy::LazyRegistry;

/// Resolves message keys to mapping models.
pub trait MappingRegistry: Send + Sync {
    /// The model registered for `key`, or [`EdiError::UnresolvedMessageModel`].
    fn resolve(&self, key: &MessageKey) -> Result<Arc<Edimap>>;

    /// Release resources held for lazy loading. Resolving afterwards only
    /// serves models that were already loaded.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: MappingRegistry + ?Sized> MappingRegistry for Arc<T> {
    fn resolve(&self, key: &MessageKey) -> Result<Arc<Edimap>> {
        (**self).resolve(key)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

// ============================================================================
// STATIC REGISTRY
// ============================================================================

/// A registry holding models that were all built before the first parse.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    models: IndexMap<MessageKey, Arc<Edimap>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from models, validating each one.
    pub fn from_models(models: impl IntoIterator<Item = Edimap>) -> Result<Self> {
        let mut registry = Self::new();
        for model in models {
            registry.register(model)?;
        }
        Ok(registry)
    }

    /// Validate and add a model. A later model replaces an earlier one with the same key.
    pub fn register(&mut self, edimap: Edimap) -> Result<()> {
        edimap.validate()?;
        let key = edimap.key();
        debug!(key = %key, "registered message model");
        self.models.insert(key, Arc::new(edimap));
        Ok(())
    }

    pub fn with(mut self, edimap: Edimap) -> Result<Self> {
        self.register(edimap)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &MessageKey> {
        self.models.keys()
    }
}

impl MappingRegistry for StaticRegistry {
    fn resolve(&self, key: &MessageKey) -> Result<Arc<Edimap>> {
        self.models
            .get(key)
            .cloned()
            .ok_or_else(|| EdiError::unresolved(key))
    }
}
