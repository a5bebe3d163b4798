//! Single-flight, TTL-bounded cache for identity lookups.
//!
//! Concurrent `get` calls for the same key while no valid entry exists share one
//! in-flight fetch: the first caller runs the fetcher, everyone else subscribes
//! to its outcome. Failures propagate to every joined caller and are never
//! cached. Expired entries are plain misses; there is no background refresh and
//! no stale-while-revalidate.
//!
//! The registry mutex is never held across an await, so the check-then-register
//! sequence is atomic with respect to scheduler suspension points.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    // An entry is valid iff now < expires_at; expired entries are logically absent.
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

struct InFlight<T, E> {
    seq: u64,
    tx: broadcast::Sender<Result<T, E>>,
}

struct Shared<T, E> {
    entries: HashMap<String, CacheEntry<T>>,
    inflight: HashMap<String, InFlight<T, E>>,
    next_seq: u64,
}

enum Step<T, E> {
    Hit(T),
    Join(broadcast::Receiver<Result<T, E>>),
    Lead(u64, broadcast::Sender<Result<T, E>>),
}

/// Per-process cache with request coalescing.
///
/// Cloning is cheap; clones share the same entry store and in-flight registry.
pub struct SingleFlightCache<T, E> {
    inner: Arc<Mutex<Shared<T, E>>>,
}

impl<T, E> Clone for SingleFlightCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for SingleFlightCache<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> SingleFlightCache<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared {
                entries: HashMap::new(),
                inflight: HashMap::new(),
                next_seq: 0,
            })),
        }
    }

    /// Return the cached value for `key`, fetching it at most once per TTL window.
    ///
    /// A valid entry is returned without suspending. Otherwise the caller either
    /// joins the outstanding fetch for `key` or becomes its leader: the leader
    /// runs `fetcher`, stores the value on success (`expires_at = now + ttl`),
    /// and fans the outcome out to every joiner. A fetcher failure is propagated
    /// identically to all joined callers and leaves no entry behind.
    ///
    /// The cache imposes no timeout of its own; a fetcher that never settles
    /// leaves its key in-flight until invalidated. Fetchers should bound their
    /// own execution time.
    ///
    /// # Errors
    /// Returns the fetcher's error, uncached.
    pub async fn get<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (seq, tx) = loop {
            let step = {
                let mut shared = self.lock();
                if let Some(entry) = shared.entries.get(key) {
                    if entry.is_valid(Instant::now()) {
                        Step::Hit(entry.value.clone())
                    } else {
                        next_step(&mut shared, key)
                    }
                } else {
                    next_step(&mut shared, key)
                }
            };

            match step {
                Step::Hit(value) => return Ok(value),
                Step::Join(mut rx) => match rx.recv().await {
                    Ok(outcome) => return outcome,
                    // The leader vanished without settling (cancelled after its
                    // registration was invalidated). Start over.
                    Err(_) => continue,
                },
                Step::Lead(seq, tx) => break (seq, tx),
            }
        };

        // Leader path: run the fetcher outside the lock; joiners ride on `tx`.
        let outcome = fetcher().await;

        {
            let mut shared = self.lock();
            // Only drop our own registration; an invalidation may have replaced
            // it with a newer in-flight fetch for the same key.
            if shared.inflight.get(key).is_some_and(|f| f.seq == seq) {
                shared.inflight.remove(key);
            }
            match &outcome {
                Ok(value) => {
                    // Written even if the key was invalidated mid-flight: a late
                    // success repopulating the entry is the documented race, and
                    // exposure is bounded by the TTL.
                    shared.entries.insert(
                        key.to_string(),
                        CacheEntry {
                            value: value.clone(),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                }
                Err(_) => {
                    debug!("Fetch for cache key {key} failed; not cached");
                }
            }
        }

        let _ = tx.send(outcome.clone());
        outcome
    }

    /// Drop any entry and any in-flight registration for `key`.
    ///
    /// Idempotent. Does not cancel an already-running fetcher; its late success
    /// may still repopulate the entry (see the race note on [`Self::get`]).
    pub fn invalidate(&self, key: &str) {
        let mut shared = self.lock();
        shared.entries.remove(key);
        shared.inflight.remove(key);
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// No valid entry for `key`: join the outstanding fetch if one exists, otherwise
// register as its leader. Runs under the registry lock.
fn next_step<T, E>(shared: &mut Shared<T, E>, key: &str) -> Step<T, E>
where
    T: Clone,
    E: Clone,
{
    if let Some(flight) = shared.inflight.get(key) {
        return Step::Join(flight.tx.subscribe());
    }
    let (tx, _rx) = broadcast::channel(1);
    shared.next_seq += 1;
    let seq = shared.next_seq;
    shared.inflight.insert(
        key.to_string(),
        InFlight {
            seq,
            tx: tx.clone(),
        },
    );
    Step::Lead(seq, tx)
}
