//! Age-weighted LRU cache shared by the retrieval pipeline (§4.9).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, Notify};

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Exponential moving average of access latency, in microseconds.
    pub avg_access_micros: f64,
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

struct Entry<V> {
    value: V,
    size_bytes: u64,
    inserted_at: Instant,
    last_access: Instant,
    ttl: Duration,
    /// Write-watermark in effect when this entry was produced; an entry is
    /// stale if the cache's watermark has advanced past it (§4.5 coherence).
    issued_watermark: u64,
}

impl<V> Entry<V> {
    fn ttl_remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(now.duration_since(self.inserted_at))
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }

    /// Lower is evicted first: stale access time offset by however much TTL
    /// headroom remains, weighted so entries about to expire anyway are
    /// preferred eviction targets over fresh ones with long TTLs.
    fn eviction_key(&self, now: Instant, ttl_weight: f64) -> f64 {
        let last_access_secs = self.last_access.duration_since(self.inserted_at).as_secs_f64();
        last_access_secs + ttl_weight * self.ttl_remaining(now).as_secs_f64()
    }
}

/// LRU with per-entry size/TTL and an overall byte budget. Eviction on
/// pressure drops the lowest `last_access + ttl_weight * ttl_remaining`
/// entry, not strictly the oldest.
pub struct Cache<V: Clone> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    in_flight: AsyncMutex<HashMap<String, std::sync::Arc<Notify>>>,
    stats: Mutex<CacheStats>,
    capacity_bytes: u64,
    used_bytes: Mutex<u64>,
    default_ttl: Duration,
    ttl_weight: f64,
    watermark: std::sync::atomic::AtomicU64,
}

impl<V: Clone> Cache<V> {
    pub fn new(capacity_bytes: u64, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            in_flight: AsyncMutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
            capacity_bytes,
            used_bytes: Mutex::new(0),
            default_ttl,
            ttl_weight: 1.0,
            watermark: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Advance the write-watermark; called by the frame store on every
    /// create/close so fingerprinted query results computed against an
    /// older snapshot are treated as stale on next access.
    pub fn bump_watermark(&self) -> u64 {
        self.watermark.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1
    }

    pub fn watermark(&self) -> u64 {
        self.watermark.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let start = Instant::now();
        let current_watermark = self.watermark();
        let mut entries = self.entries.lock().unwrap();
        let hit = match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(start) && entry.issued_watermark >= current_watermark => {
                entry.last_access = start;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        drop(entries);
        self.record_access(hit.is_some(), start.elapsed());
        hit
    }

    pub fn insert(&self, key: impl Into<String>, value: V, size_bytes: u64) {
        self.insert_with_ttl(key, value, size_bytes, self.default_ttl)
    }

    pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, size_bytes: u64, ttl: Duration) {
        let now = Instant::now();
        let entry = Entry {
            value,
            size_bytes,
            inserted_at: now,
            last_access: now,
            ttl,
            issued_watermark: self.watermark(),
        };
        let mut entries = self.entries.lock().unwrap();
        let mut used = self.used_bytes.lock().unwrap();
        if let Some(old) = entries.insert(key.into(), entry) {
            *used = used.saturating_sub(old.size_bytes);
        }
        *used += size_bytes;
        self.evict_to_budget(&mut entries, &mut used, now);
    }

    fn evict_to_budget(&self, entries: &mut HashMap<String, Entry<V>>, used: &mut u64, now: Instant) {
        let mut evictions = 0u64;
        while *used > self.capacity_bytes {
            let victim = entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.eviction_key(now, self.ttl_weight)
                        .partial_cmp(&b.eviction_key(now, self.ttl_weight))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(k, _)| k.clone());
            match victim {
                Some(key) => {
                    if let Some(entry) = entries.remove(&key) {
                        *used = used.saturating_sub(entry.size_bytes);
                        evictions += 1;
                    }
                }
                None => break,
            }
        }
        if evictions > 0 {
            self.stats.lock().unwrap().evictions += evictions;
        }
    }

    fn record_access(&self, hit: bool, elapsed: Duration) {
        let mut stats = self.stats.lock().unwrap();
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        let sample = elapsed.as_micros() as f64;
        const ALPHA: f64 = 0.2;
        stats.avg_access_micros = if stats.hits + stats.misses == 1 {
            sample
        } else {
            ALPHA * sample + (1.0 - ALPHA) * stats.avg_access_micros
        };
    }

    /// Fetch `key`, computing via `compute` on miss. Guarantees at most one
    /// concurrent computation per key: a second caller waits on the first's
    /// result rather than recomputing.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, size_bytes: u64, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = V>,
    {
        // Either becomes the leader (registers a Notify and proceeds to
        // compute) or finds a leader already in flight and waits on it,
        // re-checking the cache each time it wakes, since the thing it
        // waited on may have raced with an eviction.
        loop {
            if let Some(hit) = self.get(key) {
                return hit;
            }
            let existing_or_leader = {
                let mut in_flight = self.in_flight.lock().await;
                match in_flight.get(key).cloned() {
                    Some(existing) => Err(existing),
                    None => {
                        let notify = std::sync::Arc::new(Notify::new());
                        in_flight.insert(key.to_string(), notify);
                        Ok(())
                    }
                }
            };
            match existing_or_leader {
                Err(existing) => {
                    existing.notified().await;
                    continue;
                }
                Ok(()) => break,
            }
        }

        let value = compute().await;
        self.insert(key, value.clone(), size_bytes);

        let notify = self.in_flight.lock().await.remove(key);
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
        value
    }

    /// Fill several keys in parallel, each via its own compute thunk.
    pub async fn warm_up<F, Fut>(&self, pairs: Vec<(String, u64, F)>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = V> + Send + 'static,
        V: Send + 'static,
    {
        let mut set = tokio::task::JoinSet::new();
        for (key, size_bytes, compute) in pairs {
            set.spawn(async move { (key, size_bytes, compute().await) });
        }
        while let Some(result) = set.join_next().await {
            if let Ok((key, size_bytes, value)) = result {
                self.insert(key, value, size_bytes);
            }
        }
    }
}

/// Build the retrieval fingerprint described in §4.5: a stable hash of the
/// query shape, independent of result content.
pub fn fingerprint(parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
