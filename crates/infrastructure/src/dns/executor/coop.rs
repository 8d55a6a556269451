use super::inflight::InflightRegistry;
use crate::dns::cache::CacheKey;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};

/// Coalesces identical concurrent queries into one inner query.
pub struct CoopExecutor {
    inner: Arc<dyn DnsExecutor>,
    inflight: InflightRegistry,
}

impl CoopExecutor {
    pub fn new(inner: Arc<dyn DnsExecutor>) -> Self {
        Self {
            inner,
            inflight: InflightRegistry::new(),
        }
    }

    pub fn inflight(&self) -> &InflightRegistry {
        &self.inflight
    }
}

#[async_trait]
impl DnsExecutor for CoopExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let inner = Arc::clone(&self.inner);
        let owned = query.clone();

        self.inflight
            .run(CacheKey::from_query(query), move || {
                async move { inner.query(&owned).await }.boxed()
            })
            .await
    }
}
