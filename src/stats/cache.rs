use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::ApiError;
use crate::stats::LeaveStatistics;

/// Time-bounded cache for the statistics snapshot. The view is global,
/// so there is a single key; invalidation is purely TTL-based, with no
/// bust on leave writes. Staleness within the TTL is an accepted
/// tradeoff for the dashboard.
#[derive(Clone)]
pub struct StatsCache {
    inner: Cache<(), Arc<LeaveStatistics>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        StatsCache {
            inner: Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Returns the cached snapshot, computing it via `init` on a miss.
    /// Concurrent callers on a cold or expired cache share one in-flight
    /// computation (`try_get_with` coalesces them), so expiry cannot
    /// stampede the store.
    pub async fn get_or_compute<F>(&self, init: F) -> Result<Arc<LeaveStatistics>, ApiError>
    where
        F: Future<Output = Result<LeaveStatistics, ApiError>>,
    {
        self.inner
            .try_get_with((), async { init.await.map(Arc::new) })
            .await
            .map_err(|e: Arc<ApiError>| {
                tracing::error!(error = %e, "statistics recomputation failed");
                ApiError::Internal
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_stats() -> LeaveStatistics {
        compute(&[])
    }

    #[actix_web::test]
    async fn second_call_within_ttl_hits_the_cache() {
        let cache = StatsCache::new(Duration::from_secs(60));
        let computes = AtomicUsize::new(0);

        for _ in 0..3 {
            let snapshot = cache
                .get_or_compute(async {
                    computes.fetch_add(1, Ordering::SeqCst);
                    Ok(empty_stats())
                })
                .await
                .unwrap();
            assert!(snapshot.class_stats.is_empty());
        }

        assert_eq!(computes.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn failed_compute_is_not_cached() {
        let cache = StatsCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_compute(async { Err(ApiError::Internal) })
            .await;
        assert!(err.is_err());

        // a later successful compute still goes through
        let snapshot = cache
            .get_or_compute(async { Ok(empty_stats()) })
            .await
            .unwrap();
        assert!(snapshot.trend_data.dates.is_empty());
    }

    #[actix_web::test]
    async fn concurrent_misses_share_one_compute() {
        let cache = StatsCache::new(Duration::from_secs(60));
        let computes = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let computes = computes.clone();
                actix_web::rt::spawn(async move {
                    cache
                        .get_or_compute(async {
                            computes.fetch_add(1, Ordering::SeqCst);
                            Ok(empty_stats())
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(computes.load(Ordering::SeqCst), 1);
    }
}
