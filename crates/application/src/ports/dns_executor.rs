use async_trait::async_trait;
use std::sync::Arc;
use tern_domain::{DnsQuery, DomainError, Message};

/// Turns one query into one response message.
///
/// Transports implement this for a fixed server; decorators wrap another
/// executor and expose the same shape, so chains are built by nesting.
/// Dropping the returned future cancels the query and everything it is
/// waiting on.
#[async_trait]
pub trait DnsExecutor: Send + Sync {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError>;
}

#[async_trait]
impl<T: DnsExecutor + ?Sized> DnsExecutor for Arc<T> {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        (**self).query(query).await
    }
}
