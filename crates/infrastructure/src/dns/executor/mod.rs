//! Decorators over [`DnsExecutor`](tern_application::ports::DnsExecutor).
//!
//! Each one wraps an inner executor and adds a single behaviour; the chain
//! is assembled by [`super::builder::ExecutorChainBuilder`].

pub mod caching;
pub mod cancel;
pub mod coop;
pub mod fallback;
pub mod hosts;
pub mod inflight;
pub mod multi_server;
pub mod retry;
pub mod timeout;

pub use caching::CachingExecutor;
pub use cancel::CancellableExecutor;
pub use coop::CoopExecutor;
pub use fallback::FallbackExecutor;
pub use hosts::HostsFileExecutor;
pub use inflight::InflightRegistry;
pub use multi_server::MultiServerExecutor;
pub use retry::RetryExecutor;
pub use timeout::TimeoutExecutor;
