use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tracing::debug;

/// Rejects with `Timeout` when the inner query has not settled in time.
/// The inner future is dropped on expiry.
pub struct TimeoutExecutor {
    inner: Arc<dyn DnsExecutor>,
    timeout: Duration,
}

impl TimeoutExecutor {
    pub fn new(inner: Arc<dyn DnsExecutor>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DnsExecutor for TimeoutExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        match tokio::time::timeout(self.timeout, self.inner.query(query)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(query = %query, timeout_ms = self.timeout.as_millis() as u64, "Query timed out");
                Err(DomainError::Timeout {
                    query: query.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}
