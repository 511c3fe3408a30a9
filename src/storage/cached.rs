use crate::storage::LinkRepository;
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache over a [`LinkRepository`].
///
/// Destination URLs change rarely relative to how often they are clicked,
/// so lookups (including not-found outcomes) are cached. Store errors are
/// never cached.
pub struct CachedRepository {
    inner: Arc<dyn LinkRepository>,
    read_cache: Cache<(String, String), Option<String>>,
}

impl CachedRepository {
    pub fn new(inner: Arc<dyn LinkRepository>, max_entries: u64, ttl: Duration) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { inner, read_cache }
    }
}

#[async_trait]
impl LinkRepository for CachedRepository {
    async fn destination_url(
        &self,
        smartlink_id: &str,
        service_name: &str,
    ) -> Result<Option<String>> {
        let key = (smartlink_id.to_string(), service_name.to_string());

        if let Some(cached) = self.read_cache.get(&key).await {
            return Ok(cached);
        }

        let result = self.inner.destination_url(smartlink_id, service_name).await?;
        self.read_cache.insert(key, result.clone()).await;

        Ok(result)
    }
}
