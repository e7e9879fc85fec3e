//! Process-wide compilation cache.
//!
//! Operators with the same source and compiler signature share one
//! compiled [`KernelProgram`]. The build happens under the cache lock,
//! so identical concurrent requests compile at most once and every
//! caller gets the same `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info};

use mantle_foundation::fingerprint_str;

use crate::error::Result;
use crate::jit;
use crate::jit::program::KernelProgram;
use crate::signature::CompilerSignature;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    target: String,
    flags: Vec<String>,
}

/// Cache of compiled kernels, keyed by source text and signature.
#[derive(Debug, Default)]
pub struct CompilationCache {
    programs: Mutex<HashMap<CacheKey, Arc<KernelProgram>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

static GLOBAL: OnceLock<CompilationCache> = OnceLock::new();

impl CompilationCache {
    pub fn new() -> CompilationCache {
        CompilationCache::default()
    }

    /// The shared cache every operator compiles through.
    pub fn global() -> &'static CompilationCache {
        GLOBAL.get_or_init(CompilationCache::new)
    }

    /// Fetch the compiled program for `source`, building it on first
    /// request. Holding the lock across the build keeps the build
    /// at-most-once per key.
    pub fn get_or_build(
        &self,
        source: &str,
        signature: &CompilerSignature,
    ) -> Result<Arc<KernelProgram>> {
        let key = CacheKey {
            source: source.to_string(),
            target: signature.target.clone(),
            flags: signature.flags.clone(),
        };
        let mut programs = self.programs.lock();
        if let Some(program) = programs.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(
                source = format_args!("{:016x}", fingerprint_str(source)),
                target = %signature.target,
                "kernel cache hit"
            );
            return Ok(Arc::clone(program));
        }
        let program = Arc::new(jit::build(source, signature)?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(
            source = format_args!("{:016x}", fingerprint_str(source)),
            target = %signature.target,
            params = program.params.len(),
            "compiled kernel"
        );
        programs.insert(key, Arc::clone(&program));
        Ok(program)
    }

    pub fn contains(&self, source: &str, signature: &CompilerSignature) -> bool {
        let key = CacheKey {
            source: source.to_string(),
            target: signature.target.clone(),
            flags: signature.flags.clone(),
        };
        self.programs.lock().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.programs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.lock().is_empty()
    }

    /// Drop every cached program. Counters are left running.
    pub fn clear(&self) {
        self.programs.lock().clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "int Kernel(const long x_m)\n{\n  return 0;\n}\n";

    #[test]
    fn same_source_shares_one_program() {
        let cache = CompilationCache::new();
        let signature = CompilerSignature::default();
        let a = cache.get_or_build(SOURCE, &signature).unwrap();
        let b = cache.get_or_build(SOURCE, &signature).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn signature_is_part_of_the_key() {
        let cache = CompilationCache::new();
        let a = cache
            .get_or_build(SOURCE, &CompilerSignature::default())
            .unwrap();
        let b = cache
            .get_or_build(SOURCE, &CompilerSignature::new("core", ["-O2"]))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn unknown_target_does_not_poison_the_cache() {
        let cache = CompilationCache::new();
        let signature = CompilerSignature::new("gpu-offload", ["-O3"]);
        assert!(cache.get_or_build(SOURCE, &signature).is_err());
        assert!(cache.is_empty());
    }
}
