use async_trait::async_trait;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Rejects with `Cancelled` once `token` fires, dropping the inner query.
pub struct CancellableExecutor {
    inner: Arc<dyn DnsExecutor>,
    token: CancellationToken,
}

impl CancellableExecutor {
    pub fn new(inner: Arc<dyn DnsExecutor>, token: CancellationToken) -> Self {
        Self { inner, token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[async_trait]
impl DnsExecutor for CancellableExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(query = %query, "Query cancelled");
                Err(DomainError::Cancelled { query: query.to_string() })
            }
            result = self.inner.query(query) => result,
        }
    }
}
