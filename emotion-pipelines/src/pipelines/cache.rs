//! Process-wide cache of loaded models.
//!
//! Building several pipelines from the same artifacts on the same device loads the
//! model once and shares it behind an [`Arc`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::Result;

/// Options that identify a model for caching purposes.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

#[derive(Default)]
pub struct ModelCache {
    models: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the model cached under `key`, or build it with `create` and cache it.
    ///
    /// A failed build caches nothing.
    pub fn get_or_create<M, F>(&self, key: &str, create: F) -> Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> Result<M>,
    {
        let mut models = self.models.lock();

        if let Some(model) = models.get(key) {
            if let Ok(model) = Arc::clone(model).downcast::<M>() {
                tracing::debug!(key, "model cache hit");
                return Ok(model);
            }
        }

        let model = Arc::new(create()?);
        models.insert(key.to_string(), model.clone() as Arc<dyn Any + Send + Sync>);
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.lock().is_empty()
    }

    pub fn clear(&self) {
        self.models.lock().clear();
    }
}

/// The cache shared by every pipeline builder in the process.
pub fn global_cache() -> &'static ModelCache {
    static CACHE: OnceLock<ModelCache> = OnceLock::new();
    CACHE.get_or_init(ModelCache::new)
}
