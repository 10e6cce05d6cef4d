//! Per-agent append leases
//!
//! A sharded keyed mutex map. Holding an agent's lease gives exclusive
//! access to that agent's tip-read + insert + archive-write critical
//! section; appends for distinct agents proceed in parallel.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

const DEFAULT_SHARDS: usize = 16;

/// Keyed async mutex map.
#[derive(Debug)]
pub struct LeaseMap {
    shards: Vec<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl Default for LeaseMap {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl LeaseMap {
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &str) -> &Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Acquire the lease for one key, waiting if another holder is active.
    ///
    /// The returned guard releases the lease on drop, which covers every
    /// exit path of the critical section including errors. Entries persist
    /// per key; the map grows with the number of distinct agents, not with
    /// traffic.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lease = {
            let mut shard = self.shard(key).lock().unwrap_or_else(|e| e.into_inner());
            shard
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lease.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let leases = Arc::new(LeaseMap::new(4));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let leases = leases.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = leases.acquire("agent-1").await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let leases = LeaseMap::new(4);
        let _a = leases.acquire("agent-a").await;
        // Must complete while agent-a's lease is still held.
        let b = tokio::time::timeout(Duration::from_secs(1), leases.acquire("agent-b")).await;
        assert!(b.is_ok());
    }
}
