//! Custom-emoji name resolution.
//!
//! The synchronous fast path walks a fixed priority chain; the async path
//! batch-fetches whatever the chain could not answer and feeds the
//! persistent cache so every current subscriber sees the result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::fetch::EmojiFetcher;
use crate::store::EmojiStore;

pub struct EmojiResolver {
    store: Arc<EmojiStore>,
    fetcher: Arc<dyn EmojiFetcher>,
}

impl EmojiResolver {
    pub fn new(store: Arc<EmojiStore>, fetcher: Arc<dyn EmojiFetcher>) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &Arc<EmojiStore> {
        &self.store
    }

    /// Synchronous fast path. First hit wins:
    ///
    /// 1. the caller's explicit per-render map,
    /// 2. the ambient map of an enclosing provider,
    /// 3. the persistent `(host, name)` cache.
    ///
    /// `None` means the name must render as literal `:name:` for now; the
    /// caller is expected to queue it for [`EmojiResolver::prefetch_missing`].
    pub fn resolve(
        &self,
        name: &str,
        explicit: Option<&HashMap<String, String>>,
        ambient: Option<&HashMap<String, String>>,
        host: Option<&str>,
    ) -> Option<String> {
        if let Some(url) = explicit.and_then(|map| map.get(name)) {
            return Some(url.clone());
        }
        if let Some(url) = ambient.and_then(|map| map.get(name)) {
            return Some(url.clone());
        }
        let host = host?;
        match self.store.lookup(host, name) {
            Ok(Some(cached)) => cached,
            Ok(None) => None,
            Err(e) => {
                warn!(host, name, error = %e, "emoji cache lookup failed");
                None
            }
        }
    }

    /// Single-name remote resolution, for one-off lookups outside a render
    /// pass (hover previews, reaction pickers).
    ///
    /// Cached answers (hits and known misses) short-circuit; otherwise the
    /// host's single-emoji endpoint is asked and the outcome is persisted.
    /// A failed fetch is logged and folded into "not found" without touching
    /// the cache.
    pub async fn resolve_remote(&self, name: &str, host: &str) -> Option<String> {
        match self.store.lookup(host, name) {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(e) => warn!(host, name, error = %e, "emoji cache lookup failed"),
        }

        match self.fetcher.fetch_one(host, name).await {
            Ok(url) => {
                if let Err(e) = self
                    .store
                    .merge(host, &[(name.to_string(), url.clone())])
                {
                    warn!(host, name, error = %e, "emoji cache merge failed");
                }
                url
            }
            Err(e) => {
                warn!(host, name, error = %e, "emoji lookup failed, treating as not found");
                None
            }
        }
    }

    /// Batched remote resolution for one render pass.
    ///
    /// Names already cached for `host` (hits and known misses alike) are
    /// answered from the cache; if anything is left, the host's emoji
    /// listing is fetched ONCE and every remaining name is resolved against
    /// it, with the outcome merge-upserted into the cache. A failed fetch is
    /// logged and folded into "not found" without touching the cache, so a
    /// later pass retries.
    pub async fn prefetch_missing(
        &self,
        names: &[String],
        host: &str,
    ) -> HashMap<String, Option<String>> {
        let mut resolved = HashMap::new();
        let mut unknown = Vec::new();

        for name in names {
            if resolved.contains_key(name) {
                continue;
            }
            match self.store.lookup(host, name) {
                Ok(Some(cached)) => {
                    resolved.insert(name.clone(), cached);
                }
                Ok(None) => unknown.push(name.clone()),
                Err(e) => {
                    warn!(host, name, error = %e, "emoji cache lookup failed");
                    unknown.push(name.clone());
                }
            }
        }

        if unknown.is_empty() {
            return resolved;
        }

        debug!(host, missing = unknown.len(), "prefetching emoji batch");
        match self.fetcher.fetch_all(host).await {
            Ok(listing) => {
                let by_name: HashMap<&str, &Option<String>> = listing
                    .iter()
                    .map(|e| (e.name.as_str(), &e.url))
                    .collect();
                let entries: Vec<(String, Option<String>)> = unknown
                    .iter()
                    .map(|name| {
                        let url = by_name.get(name.as_str()).cloned().cloned().flatten();
                        (name.clone(), url)
                    })
                    .collect();
                if let Err(e) = self.store.merge(host, &entries) {
                    warn!(host, error = %e, "emoji cache merge failed");
                }
                for (name, url) in entries {
                    resolved.insert(name, url);
                }
            }
            Err(e) => {
                warn!(host, error = %e, "emoji prefetch failed, treating batch as not found");
                for name in unknown {
                    resolved.insert(name, None);
                }
            }
        }

        resolved
    }
}
