mod dns_executor;
mod hosts_lookup;

pub use dns_executor::DnsExecutor;
pub use hosts_lookup::HostsLookup;

// Re-export for convenience
pub use tern_domain::{DnsQuery, Message};
