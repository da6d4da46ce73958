//! Analysis result cache.
//!
//! Maps a content fingerprint (see [`make_cache_key`]) to a previously
//! computed analysis result so identical requests inside the TTL never
//! reach the AI model twice. Expired entries are dropped lazily on
//! [`AnalysisCache::get`] and by a background sweep ([`spawn_sweeper`]).
//!
//! The whole map sits behind one mutex. There is no capacity bound: a
//! steady stream of distinct documents grows the map until entries expire.
//! Crossing the configured soft limit only logs a warning.

use chrono::{DateTime, TimeDelta, Utc};
use md5::{Digest, Md5};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::metrics::{CACHE_EVICTIONS, CACHE_HITS, CACHE_MISSES, CACHE_SIZE};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_SOFT_LIMIT: usize = 10_000;

const KEY_PREFIX: &str = "analysis";

// Inputs that change the analysis outcome, besides the document itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub marketing: bool,
    pub context: Option<String>,
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the cache key for a document (its text, or its id when the text
/// lives elsewhere) and the options it is analysed with.
///
/// Format: `analysis:<md5(text)>[:marketing][:<md5(context)>]`. An empty
/// context counts as no context.
pub fn make_cache_key(text_or_id: &str, opts: &AnalysisOptions) -> String {
    let mut key = format!("{}:{}", KEY_PREFIX, md5_hex(text_or_id));
    if opts.marketing {
        key.push_str(":marketing");
    }
    if let Some(context) = opts.context.as_deref().filter(|c| !c.is_empty()) {
        key.push(':');
        key.push_str(&md5_hex(context));
    }
    key
}

// Cache entry with insertion time and its own TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
    size_bytes: usize,
}

impl CacheEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        self.inserted_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub count: usize,
    pub hits: u64,
    pub misses: u64,
    #[serde(rename = "approxSizeKB")]
    pub approx_size_kb: f64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct AnalysisCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    soft_limit: usize,
    over_soft_limit: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl AnalysisCache {
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            soft_limit: DEFAULT_SOFT_LIMIT,
            over_soft_limit: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clock,
        }
    }

    pub fn with_soft_limit(mut self, soft_limit: usize) -> Self {
        self.soft_limit = soft_limit;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached result if present and not expired.
    ///
    /// An expired entry is removed on the way out. Absence is a normal
    /// miss; recomputing is the caller's job.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let found = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                CACHE_EVICTIONS.inc();
                CACHE_SIZE.set(entries.len() as f64);
                None
            }
            None => None,
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            CACHE_HITS.inc();
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            CACHE_MISSES.inc();
        }
        found
    }

    /// Stores `value` under `key`, replacing any existing entry and
    /// restarting its expiry. `None` uses the cache-wide default TTL.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let key = key.into();
        let size_bytes = key.len() + serde_json::to_vec(&value).map(|v| v.len()).unwrap_or(0);
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            ttl: ttl.unwrap_or(self.default_ttl),
            size_bytes,
        };

        let len = {
            let mut entries = self.entries.lock();
            entries.insert(key, entry);
            entries.len()
        };
        CACHE_SIZE.set(len as f64);
        self.note_size(len);
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.remove(key).is_some();
        CACHE_SIZE.set(entries.len() as f64);
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        CACHE_SIZE.set(0.0);
        self.over_soft_limit.store(false, Ordering::Relaxed);
        debug!(dropped, "Analysis cache cleared");
    }

    // Entry count only; does not touch hit/miss counters
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let bytes: usize = entries.values().map(|e| e.size_bytes).sum();
        CacheStats {
            count: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            approx_size_kb: bytes as f64 / 1024.0,
        }
    }

    /// Drops every expired entry, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        CACHE_SIZE.set(entries.len() as f64);
        if removed > 0 {
            CACHE_EVICTIONS.inc_by(removed as f64);
        }
        removed
    }

    fn note_size(&self, len: usize) {
        if len > self.soft_limit {
            if !self.over_soft_limit.swap(true, Ordering::Relaxed) {
                warn!(
                    entries = len,
                    soft_limit = self.soft_limit,
                    "Analysis cache is unbounded and has grown past its soft limit"
                );
            }
        } else {
            self.over_soft_limit.store(false, Ordering::Relaxed);
        }
    }
}

// Background sweep, independent of the TTL itself
pub fn spawn_sweeper(cache: Arc<AnalysisCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        debug!(interval = ?every, "Cache sweeper started");

        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                debug!(removed, remaining = cache.len(), "Swept expired cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn cache_with_clock() -> (AnalysisCache, ManualClock) {
        let clock = ManualClock::default();
        let cache = AnalysisCache::new(DEFAULT_TTL, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn key_is_deterministic() {
        let opts = AnalysisOptions {
            marketing: true,
            context: Some("EU retail".into()),
        };
        assert_eq!(make_cache_key("doc body", &opts), make_cache_key("doc body", &opts));
    }

    #[test]
    fn key_layout() {
        let plain = make_cache_key("hello", &AnalysisOptions::default());
        assert_eq!(plain, "analysis:5d41402abc4b2a76b9719d911017c592");

        let marketing = make_cache_key(
            "hello",
            &AnalysisOptions {
                marketing: true,
                context: None,
            },
        );
        assert_eq!(marketing, "analysis:5d41402abc4b2a76b9719d911017c592:marketing");

        let full = make_cache_key(
            "hello",
            &AnalysisOptions {
                marketing: true,
                context: Some("hello".into()),
            },
        );
        assert_eq!(
            full,
            "analysis:5d41402abc4b2a76b9719d911017c592:marketing:5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn key_changes_with_each_input() {
        let base = AnalysisOptions::default();
        let k = make_cache_key("text", &base);

        assert_ne!(k, make_cache_key("text2", &base));
        assert_ne!(
            k,
            make_cache_key(
                "text",
                &AnalysisOptions {
                    marketing: true,
                    ..base.clone()
                }
            )
        );
        assert_ne!(
            k,
            make_cache_key(
                "text",
                &AnalysisOptions {
                    context: Some("ctx".into()),
                    ..base.clone()
                }
            )
        );
    }

    #[test]
    fn empty_context_adds_no_suffix() {
        let none = make_cache_key("text", &AnalysisOptions::default());
        let empty = make_cache_key(
            "text",
            &AnalysisOptions {
                marketing: false,
                context: Some(String::new()),
            },
        );
        assert_eq!(none, empty);
    }

    #[test]
    fn entry_expires_at_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("analysis:abc", json!({"score": 90}), Some(Duration::from_secs(600)));

        assert_eq!(cache.get("analysis:abc"), Some(json!({"score": 90})));

        clock.advance(TimeDelta::seconds(599));
        assert!(cache.get("analysis:abc").is_some());

        clock.advance(TimeDelta::seconds(2));
        assert_eq!(cache.get("analysis:abc"), None);
        // lazily removed
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn default_ttl_applies_when_omitted() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", json!(1), None);

        clock.advance(TimeDelta::seconds(600));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn overwrite_resets_expiry() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", json!("old"), Some(Duration::from_secs(10)));
        clock.advance(TimeDelta::seconds(8));

        cache.set("k", json!("new"), Some(Duration::from_secs(10)));
        clock.advance(TimeDelta::seconds(8));

        assert_eq!(cache.get("k"), Some(json!("new")));
    }

    #[test]
    fn delete_reports_removal_once() {
        let (cache, _clock) = cache_with_clock();
        cache.set("k", json!({"score": 1}), None);

        assert!(cache.delete("k"));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.delete("k"));
    }

    #[test]
    fn clear_drops_everything() {
        let (cache, _clock) = cache_with_clock();
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let (cache, _clock) = cache_with_clock();
        cache.set("a", json!({"summary": "x".repeat(2048)}), None);

        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!(stats.approx_size_kb > 2.0);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn purge_only_removes_expired() {
        let (cache, clock) = cache_with_clock();
        cache.set("short", json!(1), Some(Duration::from_secs(30)));
        cache.set("long", json!(2), Some(Duration::from_secs(3000)));

        clock.advance(TimeDelta::seconds(60));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_reclaims_unread_entries() {
        let clock = ManualClock::default();
        let cache = Arc::new(AnalysisCache::new(DEFAULT_TTL, Arc::new(clock.clone())));
        cache.set("stale", json!(1), None);
        clock.advance(TimeDelta::seconds(601));

        let handle = spawn_sweeper(Arc::clone(&cache), SWEEP_INTERVAL);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
