use async_trait::async_trait;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tracing::warn;

/// Sends to `primary`; on any failure the query goes to `fallback`. When
/// both fail the two errors are reported together.
pub struct FallbackExecutor {
    primary: Arc<dyn DnsExecutor>,
    fallback: Arc<dyn DnsExecutor>,
}

impl FallbackExecutor {
    pub fn new(primary: Arc<dyn DnsExecutor>, fallback: Arc<dyn DnsExecutor>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl DnsExecutor for FallbackExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let primary = match self.primary.query(query).await {
            Ok(message) => return Ok(message),
            Err(e) => e,
        };

        warn!(query = %query, error = %primary, "Primary failed, trying fallback");

        match self.fallback.query(query).await {
            Ok(message) => Ok(message),
            Err(fallback) => Err(DomainError::FallbackFailed {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            }),
        }
    }
}
