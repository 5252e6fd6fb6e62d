// src/cache.rs

use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::{error::AppError, models::history::DownloadRecord};

/// Per-user read-through cache of download history rows.
///
/// The store stays the only source of truth: entries expire after `ttl` and
/// are dropped on every successful history write for that user. A failed
/// store read is never answered from here.
#[derive(Clone)]
pub struct HistoryCache {
    ttl: Duration,
    inner: Arc<RwLock<Slots>>,
}

#[derive(Default)]
struct Slots {
    entries: HashMap<i64, (Instant, Vec<DownloadRecord>)>,
    /// Bumped by every invalidation. A load only stores its rows if the
    /// user's generation is unchanged since it started.
    generations: HashMap<i64, u64>,
}

impl Slots {
    fn generation(&self, user_id: i64) -> u64 {
        self.generations.get(&user_id).copied().unwrap_or(0)
    }
}

impl HistoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(Slots::default())),
        }
    }

    /// Returns the cached rows for `user_id`, or runs `load` and caches its result.
    pub async fn get_or_load<F, Fut>(&self, user_id: i64, load: F) -> Result<Vec<DownloadRecord>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DownloadRecord>, AppError>>,
    {
        let started_at = {
            let slots = self.inner.read().await;
            if let Some((stored_at, rows)) = slots.entries.get(&user_id) {
                if stored_at.elapsed() < self.ttl {
                    tracing::debug!("History cache hit for user {}", user_id);
                    return Ok(rows.clone());
                }
            }
            slots.generation(user_id)
        };

        let rows = load().await?;
        if !self.ttl.is_zero() {
            let mut slots = self.inner.write().await;
            if slots.generation(user_id) == started_at {
                slots.entries.insert(user_id, (Instant::now(), rows.clone()));
            } else {
                tracing::debug!("History for user {} changed during load, not caching", user_id);
            }
        }
        Ok(rows)
    }

    pub async fn invalidate(&self, user_id: i64) {
        let mut slots = self.inner.write().await;
        slots.entries.remove(&user_id);
        *slots.generations.entry(user_id).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    fn row(count: i64) -> DownloadRecord {
        DownloadRecord {
            id: 1,
            user_id: 1,
            exam_id: 1,
            student_email: "a@b.pe".to_string(),
            download_count: count,
            last_downloaded_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache_until_invalidated() {
        let cache = HistoryCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(vec![row(1)])
        };

        cache.get_or_load(1, load).await.unwrap();
        cache.get_or_load(1, load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate(1).await;
        cache.get_or_load(1, load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_errors_are_not_masked_or_cached() {
        let cache = HistoryCache::new(Duration::from_secs(60));
        let failed = cache
            .get_or_load(2, || async { Err::<Vec<DownloadRecord>, _>(AppError::InternalServerError("down".into())) })
            .await;
        assert!(failed.is_err());

        let rows = cache.get_or_load(2, || async { Ok::<_, AppError>(vec![row(3)]) }).await.unwrap();
        assert_eq!(rows[0].download_count, 3);
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = HistoryCache::new(Duration::ZERO);
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(Vec::new())
        };
        cache.get_or_load(1, load).await.unwrap();
        cache.get_or_load(1, load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_during_a_load_discards_its_rows() {
        let cache = HistoryCache::new(Duration::from_secs(60));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let pending = {
            let cache = cache.clone();
            let (started, release) = (started.clone(), release.clone());
            tokio::spawn(async move {
                cache
                    .get_or_load(1, || async move {
                        started.notify_one();
                        release.notified().await;
                        Ok::<_, AppError>(Vec::new())
                    })
                    .await
            })
        };

        // a download lands while the read above is still loading
        started.notified().await;
        cache.invalidate(1).await;
        release.notify_one();
        assert!(pending.await.unwrap().unwrap().is_empty());

        let rows = cache
            .get_or_load(1, || async { Ok::<_, AppError>(vec![row(1)]) })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
