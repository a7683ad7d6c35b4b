use crate::cache::{CacheStats, ResponseCache};
use crate::mapping::MappingValue;
use crate::providers::LookupProvider;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, warn};

/// Single entry point for resolving subjects through one provider, with
/// the on-disk response cache short-circuiting before any network call.
pub struct LookupService<V: MappingValue> {
    provider: Box<dyn LookupProvider<Value = V>>,
    cache: ResponseCache,
}

impl<V: MappingValue> LookupService<V> {
    pub fn new(provider: Box<dyn LookupProvider<Value = V>>, cache: ResponseCache) -> Self {
        Self { provider, cache }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolves one subject. Cache hits return without touching the
    /// network; successful fetches are written through to the cache
    /// immediately. Every failure mode collapses to None.
    pub async fn lookup(&mut self, subject: &str) -> Option<V> {
        let key = self.provider.cache_key(subject);

        if let Some(raw) = self.cache.get(&key) {
            match serde_json::from_value::<V>(raw.clone()) {
                Ok(value) => {
                    debug!("cache hit for '{}'", key);
                    return Some(value);
                }
                Err(e) => {
                    warn!("cache entry '{}' has unexpected shape, refetching: {}", key, e)
                }
            }
        }

        match self.provider.fetch(subject).await {
            Ok(Some(value)) => {
                match serde_json::to_value(&value) {
                    Ok(raw) => {
                        if let Err(e) = self.cache.insert(&key, raw) {
                            warn!("failed to persist cache entry '{}': {}", key, e);
                        }
                    }
                    Err(e) => warn!("could not serialize result for '{}': {}", key, e),
                }
                Some(value)
            }
            Ok(None) => {
                debug!("{} has no match for '{}'", self.provider.name(), subject);
                None
            }
            Err(e) => {
                warn!(
                    "lookup for '{}' via {} failed: {}",
                    subject,
                    self.provider.name(),
                    e
                );
                None
            }
        }
    }

    /// Resolves subjects strictly sequentially, in input order, printing
    /// per-item progress. Never deduplicates and never aborts on an
    /// individual miss; the result holds one entry per input subject.
    pub async fn batch_lookup(&mut self, subjects: &[String]) -> BTreeMap<String, Option<V>> {
        let mut results = BTreeMap::new();
        let total = subjects.len();

        for (idx, subject) in subjects.iter().enumerate() {
            print!("   [{}/{}] {} ... ", idx + 1, total, subject);
            let _ = std::io::stdout().flush();

            let value = self.lookup(subject).await;
            match &value {
                Some(v) => println!("✓ {}", v.summary()),
                None => println!("✗ not found"),
            }
            results.insert(subject.clone(), value);
        }

        results
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
