pub mod builder;
pub mod cache;
pub mod executor;
pub mod transport;

pub use builder::ExecutorChainBuilder;
pub use cache::{CacheKey, Clock, RecordBag, RecordCache, SystemClock};
pub use executor::{
    CachingExecutor, CancellableExecutor, CoopExecutor, FallbackExecutor, HostsFileExecutor,
    InflightRegistry, MultiServerExecutor, RetryExecutor, TimeoutExecutor,
};
pub use transport::{
    SelectiveTransportExecutor, StreamExecutor, StreamState, TcpConnector, TcpExecutor,
    TlsConnector, TlsExecutor, TlsOptions, UdpExecutor,
};
