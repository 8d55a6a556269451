use std::net::IpAddr;
use tern_domain::HostsTable;

/// Static name/address source consulted before the network.
pub trait HostsLookup: Send + Sync {
    fn ips_for_host(&self, host: &str) -> Vec<IpAddr>;

    fn hosts_for_ip(&self, ip: IpAddr) -> Vec<String>;
}

impl HostsLookup for HostsTable {
    fn ips_for_host(&self, host: &str) -> Vec<IpAddr> {
        HostsTable::ips_for_host(self, host).to_vec()
    }

    fn hosts_for_ip(&self, ip: IpAddr) -> Vec<String> {
        HostsTable::hosts_for_ip(self, ip).to_vec()
    }
}
