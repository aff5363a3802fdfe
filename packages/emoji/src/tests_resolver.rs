//! Resolver priority-chain and prefetch tests, run against a stub fetcher
//! so no network is involved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{EmojiError, EmojiResult};
use crate::fetch::{EmojiFetcher, RemoteEmoji};
use crate::resolver::EmojiResolver;
use crate::store::EmojiStore;

struct StubFetcher {
    listing: Vec<RemoteEmoji>,
    fail: bool,
    bulk_calls: AtomicUsize,
    single_calls: AtomicUsize,
}

impl StubFetcher {
    fn with_listing(pairs: &[(&str, Option<&str>)]) -> Self {
        Self {
            listing: pairs
                .iter()
                .map(|(name, url)| RemoteEmoji {
                    name: name.to_string(),
                    url: url.map(|u| u.to_string()),
                    category: None,
                    aliases: Vec::new(),
                })
                .collect(),
            fail: false,
            bulk_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            listing: Vec::new(),
            fail: true,
            bulk_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmojiFetcher for StubFetcher {
    async fn fetch_one(&self, _host: &str, name: &str) -> EmojiResult<Option<String>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmojiError::Payload("stub failure".to_string()));
        }
        Ok(self
            .listing
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.url.clone()))
    }

    async fn fetch_all(&self, _host: &str) -> EmojiResult<Vec<RemoteEmoji>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmojiError::Payload("stub failure".to_string()));
        }
        Ok(self.listing.clone())
    }
}

fn resolver_with(fetcher: StubFetcher) -> (EmojiResolver, Arc<StubFetcher>) {
    let store = Arc::new(EmojiStore::in_memory().unwrap());
    let fetcher = Arc::new(fetcher);
    (
        EmojiResolver::new(store, fetcher.clone() as Arc<dyn EmojiFetcher>),
        fetcher,
    )
}

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_explicit_map_wins_over_ambient() {
    let (resolver, _) = resolver_with(StubFetcher::with_listing(&[]));
    let explicit = map(&[("x", "A")]);
    let ambient = map(&[("x", "B")]);

    let url = resolver.resolve("x", Some(&explicit), Some(&ambient), Some("h"));
    assert_eq!(url, Some("A".to_string()));
}

#[test]
fn test_ambient_map_used_without_explicit() {
    let (resolver, _) = resolver_with(StubFetcher::with_listing(&[]));
    let ambient = map(&[("x", "B")]);

    let url = resolver.resolve("x", None, Some(&ambient), Some("h"));
    assert_eq!(url, Some("B".to_string()));
}

#[test]
fn test_cache_consulted_after_maps() {
    let (resolver, _) = resolver_with(StubFetcher::with_listing(&[]));
    resolver
        .store()
        .merge("h", &[("x".to_string(), Some("C".to_string()))])
        .unwrap();

    assert_eq!(
        resolver.resolve("x", None, None, Some("h")),
        Some("C".to_string())
    );
}

#[test]
fn test_miss_without_host_is_none() {
    let (resolver, _) = resolver_with(StubFetcher::with_listing(&[]));
    assert_eq!(resolver.resolve("x", None, None, None), None);
}

#[tokio::test]
async fn test_prefetch_fetches_once_and_caches() {
    let (resolver, fetcher) =
        resolver_with(StubFetcher::with_listing(&[("x", Some("https://x/x.png"))]));

    let results = resolver
        .prefetch_missing(&["x".to_string()], "h")
        .await;
    assert_eq!(results.get("x"), Some(&Some("https://x/x.png".to_string())));
    assert_eq!(fetcher.bulk_calls.load(Ordering::SeqCst), 1);

    // Second pass is answered from the cache, no further fetch.
    let results = resolver
        .prefetch_missing(&["x".to_string()], "h")
        .await;
    assert_eq!(results.get("x"), Some(&Some("https://x/x.png".to_string())));
    assert_eq!(fetcher.bulk_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_prefetch_caches_known_miss() {
    let (resolver, fetcher) = resolver_with(StubFetcher::with_listing(&[]));

    let results = resolver
        .prefetch_missing(&["ghost".to_string()], "h")
        .await;
    assert_eq!(results.get("ghost"), Some(&None));

    // The miss is persisted, so the next pass does not refetch.
    resolver.prefetch_missing(&["ghost".to_string()], "h").await;
    assert_eq!(fetcher.bulk_calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.store().lookup("h", "ghost").unwrap(), Some(None));
}

#[tokio::test]
async fn test_prefetch_failure_folds_to_not_found_without_caching() {
    let (resolver, _) = resolver_with(StubFetcher::failing());

    let results = resolver
        .prefetch_missing(&["x".to_string()], "h")
        .await;
    assert_eq!(results.get("x"), Some(&None));

    // Failure is not persisted as a miss; a later pass may retry.
    assert_eq!(resolver.store().lookup("h", "x").unwrap(), None);
}

#[tokio::test]
async fn test_resolve_remote_fetches_once_and_caches() {
    let (resolver, fetcher) =
        resolver_with(StubFetcher::with_listing(&[("x", Some("https://x/x.png"))]));

    let url = resolver.resolve_remote("x", "h").await;
    assert_eq!(url, Some("https://x/x.png".to_string()));
    assert_eq!(fetcher.single_calls.load(Ordering::SeqCst), 1);

    // Second lookup is answered from the cache.
    let url = resolver.resolve_remote("x", "h").await;
    assert_eq!(url, Some("https://x/x.png".to_string()));
    assert_eq!(fetcher.single_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        resolver.store().lookup("h", "x").unwrap(),
        Some(Some("https://x/x.png".to_string()))
    );
}

#[tokio::test]
async fn test_resolve_remote_failure_folds_to_not_found_without_caching() {
    let (resolver, fetcher) = resolver_with(StubFetcher::failing());

    assert_eq!(resolver.resolve_remote("x", "h").await, None);
    assert_eq!(resolver.store().lookup("h", "x").unwrap(), None);

    // Not persisted as a miss, so a later lookup retries.
    resolver.resolve_remote("x", "h").await;
    assert_eq!(fetcher.single_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_prefetch_batch_deduplicates_names() {
    let (resolver, fetcher) =
        resolver_with(StubFetcher::with_listing(&[("a", Some("ua")), ("b", None)]));

    let names = vec!["a".to_string(), "b".to_string(), "a".to_string()];
    let results = resolver.prefetch_missing(&names, "h").await;

    assert_eq!(results.len(), 2);
    assert_eq!(fetcher.bulk_calls.load(Ordering::SeqCst), 1);
}
