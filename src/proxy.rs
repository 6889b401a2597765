// src/proxy.rs
use log::{ info, warn };
use std::sync::Arc;
use std::time::Duration;

use crate::models::status::ServerStatusSnapshot;
use crate::storage::cache::ResponseCache;
use crate::upstream::StatusSource;
use crate::utils::FetchError;

pub struct StatusProxy<S> {
    source: Arc<S>,
    cache: ResponseCache<ServerStatusSnapshot, FetchError>,
}

impl<S: StatusSource> StatusProxy<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        info!("Status proxy for {} (cache ttl {}s)", source.request_key(), ttl.as_secs());
        Self {
            source: Arc::new(source),
            cache: ResponseCache::new(ttl),
        }
    }

    /// Latest normalized snapshot. Upstream failures come back as the fallback.
    ///
    /// Concurrent callers share one upstream request, and that request runs to
    /// completion even if every caller goes away.
    pub async fn snapshot(&self) -> ServerStatusSnapshot {
        let key = self.source.request_key();
        let source = self.source.clone();

        let result = self.cache.get_or_fetch(&key, move || async move {
            let upstream = source.fetch_status().await?;
            Ok::<_, FetchError>(ServerStatusSnapshot::from(upstream))
        }).await;

        match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Upstream status unavailable, serving fallback: {}", e);
                ServerStatusSnapshot::fallback()
            }
        }
    }
}
