use super::{Reflector, TypeRegistry};
use crate::{ty::TypeName, Result};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// Hands out [`Reflector`]s, building each type's descriptor once.
///
/// Lookups may happen from many threads after loading finishes. A type that
/// is seen for the first time concurrently may be built more than once; the
/// first descriptor stored wins and every caller gets that one.
#[derive(Debug)]
pub struct ReflectorFactory {
    cache_enabled: bool,
    cache: RwLock<HashMap<TypeName, Arc<Reflector>>>,
}

impl ReflectorFactory {
    pub fn new() -> ReflectorFactory {
        ReflectorFactory {
            cache_enabled: true,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// With the cache disabled every lookup builds a fresh descriptor.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        if !enabled {
            self.cache.get_mut().clear();
        }
    }

    pub fn find_for_type(&self, registry: &TypeRegistry, ty: &TypeName) -> Result<Arc<Reflector>> {
        if !self.cache_enabled {
            return Reflector::build(registry, ty).map(Arc::new);
        }

        if let Some(reflector) = self.cache.read().get(ty) {
            return Ok(reflector.clone());
        }

        // Build outside the lock; building may recurse into other types.
        let built = Arc::new(Reflector::build(registry, ty)?);

        let mut cache = self.cache.write();
        Ok(cache.entry(ty.clone()).or_insert(built).clone())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for ReflectorFactory {
    fn default() -> Self {
        Self::new()
    }
}
