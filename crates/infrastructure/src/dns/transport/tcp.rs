use super::stream::{StreamConnector, StreamExecutor, StreamProgress, StreamState};
use async_trait::async_trait;
use std::net::SocketAddr;
use tern_domain::DomainError;
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP: one connection per query.
pub type TcpExecutor = StreamExecutor<TcpConnector>;

impl TcpExecutor {
    pub fn tcp(server_addr: SocketAddr) -> Self {
        StreamExecutor::new(TcpConnector::new(server_addr))
    }
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    server_addr: SocketAddr,
}

impl TcpConnector {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}

#[async_trait]
impl StreamConnector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, progress: &mut StreamProgress) -> Result<TcpStream, DomainError> {
        progress.enter(StreamState::Connecting);
        let stream = match TcpStream::connect(self.server_addr).await {
            Ok(stream) => stream,
            Err(e) => return Err(progress.connection_failed(e)),
        };

        if let Err(e) = stream.set_nodelay(true) {
            return Err(progress.connection_failed(e));
        }

        debug!(server = %self.server_addr, "TCP connection established");
        Ok(stream)
    }

    fn server(&self) -> String {
        format!("tcp://{}", self.server_addr)
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}
