//! Time-bounded snapshot cache for query services.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::Result;

/// Default time a snapshot is served before the table is read again.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2);

struct CacheState<T> {
    generation: u64,
    snapshot: Option<(Instant, Arc<Vec<T>>)>,
}

/// Caches a whole table as one snapshot.
///
/// Each invalidation bumps a generation counter; a load that started under
/// an older generation returns its rows to its caller but never installs
/// them, so a read racing an invalidation cannot bring stale rows back.
pub struct SnapshotCache<T> {
    view: &'static str,
    ttl: Duration,
    state: Mutex<CacheState<T>>,
}

impl<T> SnapshotCache<T> {
    pub fn new(view: &'static str, ttl: Duration) -> Self {
        Self {
            view,
            ttl,
            state: Mutex::new(CacheState {
                generation: 0,
                snapshot: None,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops the cached snapshot.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.snapshot = None;
    }

    /// Returns the cached snapshot if it is fresh, otherwise runs `load`.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let generation = {
            let state = self.state.lock().await;
            if let Some((loaded_at, snapshot)) = &state.snapshot
                && loaded_at.elapsed() < self.ttl
            {
                metrics::counter!("query_cache_hits_total", "view" => self.view).increment(1);
                return Ok(Arc::clone(snapshot));
            }
            state.generation
        };

        metrics::counter!("query_cache_misses_total", "view" => self.view).increment(1);
        let snapshot = Arc::new(load().await?);

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.snapshot = Some((Instant::now(), Arc::clone(&snapshot)));
        } else {
            tracing::debug!(view = self.view, "cache invalidated during load, not storing");
        }
        Ok(snapshot)
    }
}
