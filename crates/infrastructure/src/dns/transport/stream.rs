//! Length-prefixed message exchange shared by the TCP and TLS transports
//! (RFC 1035 §4.2.2).
//!
//! One query per connection: connect, write the framed request, read the
//! 2-byte length, read the body, decode. A [`StreamConnector`] supplies the
//! byte stream; TLS layers its handshake on top of the TCP connector.

use async_trait::async_trait;
use std::fmt;
use tern_application::ports::DnsExecutor;
use tern_domain::wire;
use tern_domain::{DnsQuery, DomainError, Message};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Handshaking,
    Writing,
    ReadingLength,
    ReadingBody,
    Done,
    Cancelled,
}

impl StreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Writing => "writing",
            Self::ReadingLength => "reading length",
            Self::ReadingBody => "reading body",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks where a single exchange is. Dropping it before the exchange
/// settled means the caller cancelled; the socket goes with it.
#[derive(Debug)]
pub struct StreamProgress {
    server: String,
    query: String,
    state: StreamState,
    settled: bool,
}

impl StreamProgress {
    fn new(server: String, query: &DnsQuery) -> Self {
        Self {
            server,
            query: query.to_string(),
            state: StreamState::Connecting,
            settled: false,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn enter(&mut self, state: StreamState) {
        debug!(server = %self.server, query = %self.query, from = %self.state, to = %state, "Stream state");
        self.state = state;
        if state.is_terminal() {
            self.settled = true;
        }
    }

    /// I/O failure in the current state.
    pub fn connection_failed(&mut self, error: impl fmt::Display) -> DomainError {
        self.settled = true;
        DomainError::ConnectionFailed {
            server: self.server.clone(),
            reason: format!("{} failed: {}", self.state, error),
        }
    }

    pub fn handshake_failed(&mut self, reason: impl fmt::Display) -> DomainError {
        self.settled = true;
        DomainError::HandshakeFailed {
            server: self.server.clone(),
            reason: reason.to_string(),
        }
    }

    fn invalid_response(&mut self, reason: String) -> DomainError {
        self.settled = true;
        DomainError::InvalidResponse {
            server: self.server.clone(),
            reason,
        }
    }
}

impl Drop for StreamProgress {
    fn drop(&mut self) {
        if !self.settled {
            debug!(
                server = %self.server,
                query = %self.query,
                during = %self.state,
                state = %StreamState::Cancelled,
                "Stream exchange cancelled"
            );
        }
    }
}

/// Opens the byte stream a [`StreamExecutor`] talks over.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self, progress: &mut StreamProgress) -> Result<Self::Stream, DomainError>;

    /// Label used in errors and logs.
    fn server(&self) -> String;

    fn protocol_name(&self) -> &'static str;
}

pub struct StreamExecutor<C> {
    connector: C,
}

impl<C: StreamConnector> StreamExecutor<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[async_trait]
impl<C: StreamConnector> DnsExecutor for StreamExecutor<C> {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let id = fastrand::u16(..);
        let request = Message::request(id, query.clone());
        let frame = wire::encode_with_length_prefix(&request)?;

        let mut progress = StreamProgress::new(self.connector.server(), query);
        let mut stream = self.connector.connect(&mut progress).await?;

        progress.enter(StreamState::Writing);
        if let Err(e) = stream.write_all(&frame).await {
            return Err(progress.connection_failed(e));
        }
        if let Err(e) = stream.flush().await {
            return Err(progress.connection_failed(e));
        }

        progress.enter(StreamState::ReadingLength);
        let mut len_buf = [0u8; 2];
        if let Err(e) = stream.read_exact(&mut len_buf).await {
            return Err(progress.connection_failed(e));
        }
        let len = u16::from_be_bytes(len_buf) as usize;

        progress.enter(StreamState::ReadingBody);
        let mut body = vec![0u8; len];
        if let Err(e) = stream.read_exact(&mut body).await {
            return Err(progress.connection_failed(e));
        }

        progress.enter(StreamState::Done);
        let response = Message::from_bytes(&body)?;

        if response.id() != id {
            return Err(progress.invalid_response(format!(
                "response id {} does not match query id {}",
                response.id(),
                id
            )));
        }
        if response.is_truncated() {
            return Err(progress.invalid_response(format!(
                "truncated {} response for {}",
                self.connector.protocol_name(),
                query
            )));
        }

        debug!(
            server = %progress.server(),
            protocol = self.connector.protocol_name(),
            response_len = len,
            answers = response.answers.len(),
            "Stream response received"
        );
        Ok(response)
    }
}
