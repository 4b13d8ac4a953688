use crate::analytics::sales::{build_snapshot, PaymentsSnapshot};
use crate::db;
use crate::postgrest::RestStore;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest payments dashboard snapshot plus the in-flight flag that keeps
/// refresh cycles from overlapping.
#[derive(Default)]
pub struct PaymentsCache {
    snapshot: RwLock<Option<Arc<PaymentsSnapshot>>>,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PaymentsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<PaymentsSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Reloads the sales window and rebuilds the snapshot. Returns `None`
    /// without touching the store when another refresh is still running.
    pub async fn refresh(&self, store: &dyn RestStore, today: NaiveDate) -> Result<Option<Arc<PaymentsSnapshot>>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Payments refresh still running, skipping this cycle");
            return Ok(None);
        }
        let _guard = RunningGuard(&self.running);

        let sales = db::records::load_sales_window(store, today).await?;
        let snapshot = Arc::new(build_snapshot(&sales, today));
        *self.snapshot.write().await = Some(snapshot.clone());

        tracing::debug!(
            "Payments snapshot rebuilt from {} sales (MTD {:.2})",
            sales.len(),
            snapshot.buckets.month_to_date.total
        );
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgrest::memory::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn refresh_stores_snapshot() {
        let store = MemoryStore::new();
        store
            .seed(
                db::SALES,
                vec![json!({ "consultant_name": "Ana", "amount": 250.0, "sale_date": "2024-05-03" })],
            )
            .await;
        let cache = PaymentsCache::new();
        assert!(cache.current().await.is_none());

        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let snapshot = cache.refresh(&store, today).await.unwrap().unwrap();
        assert_eq!(snapshot.month_leaderboard[0].consultant_name, "Ana");
        assert!(cache.current().await.is_some());
    }

    #[tokio::test]
    async fn overlapping_refresh_is_skipped() {
        let store = MemoryStore::new();
        let cache = PaymentsCache::new();
        cache.running.store(true, Ordering::Release);
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert!(cache.refresh(&store, today).await.unwrap().is_none());

        cache.running.store(false, Ordering::Release);
        assert!(cache.refresh(&store, today).await.unwrap().is_some());
        assert!(!cache.running.load(Ordering::Acquire));
    }
}
