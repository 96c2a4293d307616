//! Registry that builds models on first request

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{MappingRegistry, MessageKey};
use crate::model::Edimap;
use crate::parser::errors::{EdiError, Result};

type Loader = dyn Fn(&MessageKey) -> Result<Option<Edimap>> + Send + Sync;

/// Calls a loader the first time a key is requested and caches the model.
///
/// The loader returns `Ok(None)` for keys it does not know. Misses are not
/// cached, so a loader backed by a growing store can serve them later.
pub struct LazyRegistry {
    loader: Box<Loader>,
    cache: RwLock<FxHashMap<MessageKey, Arc<Edimap>>>,
    closed: RwLock<bool>,
}

impl LazyRegistry {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&MessageKey) -> Result<Option<Edimap>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cache: RwLock::new(FxHashMap::default()),
            closed: RwLock::new(false),
        }
    }

    /// Number of models loaded so far.
    pub fn loaded(&self) -> usize {
        self.cache.read().len()
    }
}

impl std::fmt::Debug for LazyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRegistry")
            .field("loaded", &self.loaded())
            .field("closed", &*self.closed.read())
            .finish_non_exhaustive()
    }
}

impl MappingRegistry for LazyRegistry {
    fn resolve(&self, key: &MessageKey) -> Result<Arc<Edimap>> {
        if let Some(model) = self.cache.read().get(key) {
            return Ok(Arc::clone(model));
        }
        if *self.closed.read() {
            return Err(EdiError::unresolved(key));
        }

        let mut cache = self.cache.write();
        // Another caller may have loaded it while we waited for the lock.
        if let Some(model) = cache.get(key) {
            return Ok(Arc::clone(model));
        }
        let Some(model) = (self.loader)(key)? else {
            return Err(EdiError::unresolved(key));
        };
        model.validate()?;
        debug!(key = %key, "loaded message model");
        let model = Arc::new(model);
        cache.insert(key.clone(), Arc::clone(&model));
        Ok(model)
    }

    fn close(&self) -> Result<()> {
        *self.closed.write() = true;
        Ok(())
    }
}
