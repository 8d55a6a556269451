//! UDP transport (RFC 1035 §4.2.1)
//!
//! One ephemeral socket per query, connected to the server so the kernel
//! drops datagrams from other sources. Requests are capped at 512 bytes.
//! Replies that fail to decode, are not responses, or carry another id are
//! logged and ignored; the executor keeps waiting for the real answer. A
//! reply with the TC bit set is reported as `TruncatedResponse` and left to
//! an upper layer to retry over TCP.

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tern_application::ports::DnsExecutor;
use tern_domain::wire::MAX_UDP_MESSAGE_SIZE;
use tern_domain::{DnsQuery, DomainError, Message};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Receive buffer; servers that ignore the 512-byte limit still decode.
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpExecutor {
    server_addr: SocketAddr,
}

impl UdpExecutor {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    fn connection_failed(&self, what: &str, error: std::io::Error) -> DomainError {
        DomainError::ConnectionFailed {
            server: format!("udp://{}", self.server_addr),
            reason: format!("{}: {}", what, error),
        }
    }
}

#[async_trait]
impl DnsExecutor for UdpExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let id = fastrand::u16(..);
        let request = Message::request(id, query.clone()).to_bytes()?;
        if request.len() > MAX_UDP_MESSAGE_SIZE {
            return Err(DomainError::QueryTooLarge {
                query: query.to_string(),
                size: request.len(),
            });
        }

        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| self.connection_failed("bind", e))?;
        socket
            .connect(self.server_addr)
            .await
            .map_err(|e| self.connection_failed("connect", e))?;
        socket
            .send(&request)
            .await
            .map_err(|e| self.connection_failed("send", e))?;

        debug!(server = %self.server_addr, query = %query, bytes_sent = request.len(), "UDP query sent");

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let response = loop {
            let len = socket
                .recv(&mut buf)
                .await
                .map_err(|e| self.connection_failed("receive", e))?;

            match Message::from_bytes(&buf[..len]) {
                Ok(message) if message.is_response() && message.id() == id => break message,
                Ok(message) => {
                    warn!(
                        server = %self.server_addr,
                        expected_id = id,
                        received_id = message.id(),
                        "Ignoring UDP datagram that does not answer the query"
                    );
                }
                Err(e) => {
                    warn!(server = %self.server_addr, error = %e, "Ignoring undecodable UDP datagram");
                }
            }
        };

        if response.is_truncated() {
            return Err(DomainError::TruncatedResponse {
                query: query.to_string(),
                server: format!("udp://{}", self.server_addr),
            });
        }

        debug!(
            server = %self.server_addr,
            answers = response.answers.len(),
            "UDP response received"
        );
        Ok(response)
    }
}
