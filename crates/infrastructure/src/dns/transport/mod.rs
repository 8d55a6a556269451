pub mod selective;
pub mod stream;
pub mod tcp;
pub mod tls;
pub mod udp;

pub use selective::SelectiveTransportExecutor;
pub use stream::{StreamConnector, StreamExecutor, StreamProgress, StreamState};
pub use tcp::{TcpConnector, TcpExecutor};
pub use tls::{build_client_config, fingerprint_hex, TlsConnector, TlsExecutor, TlsOptions};
pub use udp::UdpExecutor;
