use crate::dns_message::ResponseCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid DNS message: {0}")]
    MalformedMessage(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid record data: {0}")]
    InvalidRecordData(String),

    #[error("Invalid server address: {0}")]
    InvalidServerAddress(String),

    #[error("DNS query for {query} to {server} returned a truncated result")]
    TruncatedResponse { query: String, server: String },

    #[error("DNS query for {query} is too large for UDP ({size} bytes)")]
    QueryTooLarge { query: String, size: usize },

    #[error("Connection to {server} failed: {reason}")]
    ConnectionFailed { server: String, reason: String },

    #[error("TLS handshake with {server} failed: {reason}")]
    HandshakeFailed { server: String, reason: String },

    #[error("Invalid response from {server}: {reason}")]
    InvalidResponse { server: String, reason: String },

    #[error("DNS query for {query} timed out after {timeout_ms}ms")]
    Timeout { query: String, timeout_ms: u64 },

    #[error("DNS query for {query} failed: too many retries")]
    TooManyRetries {
        query: String,
        attempts: u32,
        #[source]
        last: Box<DomainError>,
    },

    #[error("{primary}. {fallback}")]
    FallbackFailed {
        primary: Box<DomainError>,
        fallback: Box<DomainError>,
    },

    #[error("DNS query for {query} has been cancelled")]
    Cancelled { query: String },

    #[error("{message}")]
    RecordNotFound {
        message: String,
        rcode: ResponseCode,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DomainError::Timeout { .. })
    }

    /// Errors that a TCP retry may recover from.
    pub fn wants_stream_transport(&self) -> bool {
        matches!(
            self,
            DomainError::TruncatedResponse { .. } | DomainError::QueryTooLarge { .. }
        )
    }

    pub fn rcode(&self) -> Option<ResponseCode> {
        match self {
            DomainError::RecordNotFound { rcode, .. } => Some(*rcode),
            _ => None,
        }
    }
}
