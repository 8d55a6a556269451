use async_trait::async_trait;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, DomainError, Message};
use tracing::debug;

/// Datagram first; the same query is repeated over a stream transport when
/// the datagram executor reports that the exchange does not fit UDP.
pub struct SelectiveTransportExecutor {
    datagram: Arc<dyn DnsExecutor>,
    stream: Arc<dyn DnsExecutor>,
}

impl SelectiveTransportExecutor {
    pub fn new(datagram: Arc<dyn DnsExecutor>, stream: Arc<dyn DnsExecutor>) -> Self {
        Self { datagram, stream }
    }
}

#[async_trait]
impl DnsExecutor for SelectiveTransportExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        match self.datagram.query(query).await {
            Err(e) if e.wants_stream_transport() => {
                debug!(query = %query, reason = %e, "Retrying over TCP");
                self.stream.query(query).await
            }
            other => other,
        }
    }
}
