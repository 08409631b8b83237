//! Process-wide cache of director factories keyed by schema fingerprint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scoreforge_core::{Score, SchemaFingerprint};
use tracing::debug;

use super::factory::ScoreDirectorFactory;
use crate::error::Result;

type Factories<Sc> = HashMap<SchemaFingerprint, Arc<ScoreDirectorFactory<Sc>>>;

/// Factories built on first use and dropped on unregister.
///
/// Two schemas with the same structure share one factory.
pub struct ScoreDirectorFactoryRegistry<Sc: Score> {
    factories: Mutex<Factories<Sc>>,
}

impl<Sc: Score> Default for ScoreDirectorFactoryRegistry<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ScoreDirectorFactoryRegistry<Sc> {
    pub fn new() -> Self {
        Self {
            factories: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Factories<Sc>> {
        self.factories.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The factory for `fingerprint`, building it with `init` if absent.
    ///
    /// `init` runs under the registry lock, so concurrent callers build a
    /// factory at most once. A failed `init` registers nothing.
    pub fn get_or_try_init<F>(
        &self,
        fingerprint: SchemaFingerprint,
        init: F,
    ) -> Result<Arc<ScoreDirectorFactory<Sc>>>
    where
        F: FnOnce() -> Result<ScoreDirectorFactory<Sc>>,
    {
        let mut factories = self.lock();
        if let Some(factory) = factories.get(&fingerprint) {
            return Ok(Arc::clone(factory));
        }
        let factory = Arc::new(init()?);
        debug!(event = "factory_registered", fingerprint = %fingerprint);
        factories.insert(fingerprint, Arc::clone(&factory));
        Ok(factory)
    }

    pub fn get(&self, fingerprint: SchemaFingerprint) -> Option<Arc<ScoreDirectorFactory<Sc>>> {
        self.lock().get(&fingerprint).cloned()
    }

    /// Drops the factory; directors already built keep their own reference.
    pub fn unregister(&self, fingerprint: SchemaFingerprint) -> Option<Arc<ScoreDirectorFactory<Sc>>> {
        let removed = self.lock().remove(&fingerprint);
        if removed.is_some() {
            debug!(event = "factory_unregistered", fingerprint = %fingerprint);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
