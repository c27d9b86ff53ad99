//! Cached access to built-in headers and precompiled module bundles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::services::ResourceProvider;

/// The OpenCL C builtin declarations header.
pub const OPENCL_C_H: &str = "opencl-c.h";
/// Base header included by [`OPENCL_C_H`].
pub const OPENCL_C_BASE_H: &str = "opencl-c-base.h";

/// Headers every compile call receives, in the order they are registered.
pub const BUILTIN_HEADERS: [&str; 2] = [OPENCL_C_H, OPENCL_C_BASE_H];

/// Loads resources from a provider once and hands out shared buffers afterwards.
pub struct ResourceManager<P> {
    provider: P,
    cache: Mutex<HashMap<(String, bool), Arc<[u8]>>>,
}

impl<P: ResourceProvider> ResourceManager<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `id`, optionally with a trailing NUL appended when the stored bytes lack one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceUnavailable`] when the provider has no such resource.
    pub fn get(&self, id: &str, null_terminate: bool) -> Result<Arc<[u8]>> {
        let key = (id.to_string(), null_terminate);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bytes) = cache.get(&key) {
            return Ok(Arc::clone(bytes));
        }
        let mut bytes = self
            .provider
            .load(id)
            .ok_or_else(|| Error::resource_unavailable(id))?;
        if null_terminate && bytes.last() != Some(&0) {
            bytes.push(0);
        }
        tracing::trace!(target: "clfe", stage = "resources.load", id, len = bytes.len());
        let bytes: Arc<[u8]> = Arc::from(bytes);
        cache.insert(key, Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Number of cached entries.
    pub fn cached(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<P> std::fmt::Debug for ResourceManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        loads: AtomicUsize,
    }

    impl ResourceProvider for CountingProvider {
        fn load(&self, id: &str) -> Option<Vec<u8>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            match id {
                OPENCL_C_H => Some(b"int x;".to_vec()),
                "terminated" => Some(b"y\0".to_vec()),
                _ => None,
            }
        }
    }

    fn manager() -> ResourceManager<CountingProvider> {
        ResourceManager::new(CountingProvider {
            loads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let resources = manager();
        let first = resources.get(OPENCL_C_H, false).expect("header");
        let second = resources.get(OPENCL_C_H, false).expect("header");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resources.provider.loads.load(Ordering::SeqCst), 1);
        assert_eq!(resources.cached(), 1);
    }

    #[test]
    fn null_termination_is_appended_once() {
        let resources = manager();
        assert_eq!(&*resources.get(OPENCL_C_H, true).expect("header"), b"int x;\0");
        assert_eq!(&*resources.get("terminated", true).expect("terminated"), b"y\0");
        assert_eq!(&*resources.get(OPENCL_C_H, false).expect("raw"), b"int x;");
    }

    #[test]
    fn missing_resource_names_the_id() {
        let err = manager().get("opencl-c-20-spir64.pcm", false).unwrap_err();
        assert!(matches!(err, Error::ResourceUnavailable { ref id } if id == "opencl-c-20-spir64.pcm"));
        assert!(err.to_string().contains("opencl-c-20-spir64.pcm"));
    }
}
