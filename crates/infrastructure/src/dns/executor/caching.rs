use super::inflight::InflightRegistry;
use crate::dns::cache::{CacheKey, Clock, RecordCache};
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tracing::debug;

/// Serves fresh answers from a [`RecordCache`]; misses go to the inner
/// executor through an in-flight registry so identical concurrent misses
/// cause a single fetch, whose response is stored once.
pub struct CachingExecutor {
    inner: Arc<dyn DnsExecutor>,
    cache: Arc<RecordCache>,
    clock: Arc<dyn Clock>,
    inflight: InflightRegistry,
}

impl CachingExecutor {
    pub fn new(inner: Arc<dyn DnsExecutor>, cache: Arc<RecordCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            cache,
            clock,
            inflight: InflightRegistry::new(),
        }
    }

    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }
}

#[async_trait]
impl DnsExecutor for CachingExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        if let Some(records) = self.cache.lookup(query, self.clock.now_secs()) {
            debug!(query = %query, records = records.len(), "Cache HIT");
            return Ok(Message::response_for(query.clone(), records));
        }

        debug!(query = %query, "Cache MISS");

        let inner = Arc::clone(&self.inner);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        let owned = query.clone();

        self.inflight
            .run(CacheKey::from_query(query), move || {
                async move {
                    let response = inner.query(&owned).await?;
                    let stored = cache.store_message(clock.now_secs(), &response);
                    debug!(query = %owned, stored, "Cached response");
                    Ok(response)
                }
                .boxed()
            })
            .await
    }
}
