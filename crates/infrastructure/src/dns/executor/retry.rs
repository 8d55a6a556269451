use async_trait::async_trait;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tracing::debug;

/// Repeats timed-out queries. Any other error is returned at once.
///
/// With `retries = N` a query is attempted at most `N + 1` times; when
/// every attempt times out the last timeout is wrapped in
/// `TooManyRetries`.
pub struct RetryExecutor {
    inner: Arc<dyn DnsExecutor>,
    retries: u32,
}

impl RetryExecutor {
    pub const DEFAULT_RETRIES: u32 = 2;

    pub fn new(inner: Arc<dyn DnsExecutor>, retries: u32) -> Self {
        Self { inner, retries }
    }
}

#[async_trait]
impl DnsExecutor for RetryExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.inner.query(query).await {
                Ok(message) => return Ok(message),
                Err(e) if e.is_timeout() => {
                    if attempt > self.retries {
                        return Err(DomainError::TooManyRetries {
                            query: query.to_string(),
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    debug!(query = %query, attempt, "Retrying after timeout");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
