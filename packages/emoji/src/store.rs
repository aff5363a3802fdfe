//! SQLite-backed reactive emoji cache.
//!
//! Persists one row per `(host, name)` pair; `url` is NULL when the host was
//! asked and did not know the name, so a miss is cached the same way a hit
//! is. Rows are merge-upserted and never deleted here.
//!
//! Readers work against an in-memory snapshot published through a
//! `tokio::sync::watch` channel: every successful merge replaces the
//! snapshot and wakes all current subscribers with the full current state.
//! The snapshot is loaded lazily when the first subscriber attaches and
//! released when the last subscription guard drops.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rusqlite::{params, Connection};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::EmojiResult;

/// Full cache state: `(host, name)` → resolved URL (`None` = known miss).
pub type EmojiSnapshot = Arc<HashMap<(String, String), Option<String>>>;

pub struct EmojiStore {
    conn: Mutex<Connection>,
    /// Loaded lazily on first subscriber, dropped when the last one detaches.
    snapshot: RwLock<Option<EmojiSnapshot>>,
    tx: watch::Sender<EmojiSnapshot>,
    subscribers: AtomicUsize,
}

/// Live subscription to the cache. Holding it keeps the in-memory snapshot
/// alive; the receiver yields the full current snapshot on every change.
pub struct EmojiSubscription {
    pub rx: watch::Receiver<EmojiSnapshot>,
    store: Arc<EmojiStore>,
}

impl Drop for EmojiSubscription {
    fn drop(&mut self) {
        self.store.release_subscriber();
    }
}

impl EmojiStore {
    /// Create or open the cache database at the given path.
    pub fn open(path: impl AsRef<Path>) -> EmojiResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS emoji_cache (
                 host TEXT NOT NULL,
                 name TEXT NOT NULL,
                 url  TEXT,
                 PRIMARY KEY (host, name)
             );",
        )?;
        info!("emoji cache opened at {:?}", path.as_ref());
        Ok(Self::with_connection(conn))
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> EmojiResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS emoji_cache (
                 host TEXT NOT NULL,
                 name TEXT NOT NULL,
                 url  TEXT,
                 PRIMARY KEY (host, name)
             );",
        )?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(HashMap::new()) as EmojiSnapshot);
        Self {
            conn: Mutex::new(conn),
            snapshot: RwLock::new(None),
            tx,
            subscribers: AtomicUsize::new(0),
        }
    }

    /// Attach a subscriber. The first one triggers the snapshot load.
    pub fn subscribe(self: &Arc<Self>) -> EmojiResult<EmojiSubscription> {
        if self.subscribers.fetch_add(1, Ordering::SeqCst) == 0 {
            let loaded = self.load_snapshot()?;
            debug!(entries = loaded.len(), "emoji snapshot loaded");
            *self.snapshot.write().expect("snapshot lock poisoned") = Some(loaded.clone());
            let _ = self.tx.send(loaded);
        }
        Ok(EmojiSubscription {
            rx: self.tx.subscribe(),
            store: Arc::clone(self),
        })
    }

    fn release_subscriber(&self) {
        if self.subscribers.fetch_sub(1, Ordering::SeqCst) == 1 {
            debug!("last emoji subscriber detached, releasing snapshot");
            *self.snapshot.write().expect("snapshot lock poisoned") = None;
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    fn load_snapshot(&self) -> EmojiResult<EmojiSnapshot> {
        let conn = self.conn.lock().expect("conn lock poisoned");
        let mut stmt = conn.prepare("SELECT host, name, url FROM emoji_cache")?;
        let rows = stmt.query_map([], |row| {
            Ok(((row.get(0)?, row.get(1)?), row.get::<_, Option<String>>(2)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (key, url) = row?;
            map.insert(key, url);
        }
        Ok(Arc::new(map))
    }

    /// Cached value for `(host, name)`.
    ///
    /// `Some(Some(url))` = resolved, `Some(None)` = known miss, `None` = the
    /// pair was never fetched. Reads go through the snapshot when one is
    /// loaded and fall back to a point query otherwise.
    pub fn lookup(&self, host: &str, name: &str) -> EmojiResult<Option<Option<String>>> {
        if let Some(snapshot) = self.snapshot.read().expect("snapshot lock poisoned").as_ref() {
            return Ok(snapshot
                .get(&(host.to_string(), name.to_string()))
                .cloned());
        }

        let conn = self.conn.lock().expect("conn lock poisoned");
        let mut stmt =
            conn.prepare("SELECT url FROM emoji_cache WHERE host = ?1 AND name = ?2")?;
        let mut rows = stmt.query(params![host, name])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get::<_, Option<String>>(0)?)),
            None => Ok(None),
        }
    }

    /// Merge-upsert a batch of resolutions for one host and notify
    /// subscribers with the new full snapshot.
    ///
    /// Upserts are idempotent per `(host, name)`; concurrent writers are
    /// fine because repeated resolutions of the same pair converge to the
    /// same URL, so last-writer-wins is correct.
    pub fn merge(&self, host: &str, entries: &[(String, Option<String>)]) -> EmojiResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        {
            let mut conn = self.conn.lock().expect("conn lock poisoned");
            let tx = conn.transaction()?;
            for (name, url) in entries {
                tx.execute(
                    "INSERT INTO emoji_cache (host, name, url) VALUES (?1, ?2, ?3)
                     ON CONFLICT (host, name) DO UPDATE SET url = excluded.url",
                    params![host, name, url],
                )?;
            }
            tx.commit()?;
        }
        debug!(host, entries = entries.len(), "emoji cache merged");

        let mut guard = self.snapshot.write().expect("snapshot lock poisoned");
        if let Some(current) = guard.as_ref() {
            let mut next: HashMap<_, _> = current.as_ref().clone();
            for (name, url) in entries {
                next.insert((host.to_string(), name.clone()), url.clone());
            }
            let next: EmojiSnapshot = Arc::new(next);
            *guard = Some(next.clone());
            let _ = self.tx.send(next);
        }
        Ok(())
    }
}
