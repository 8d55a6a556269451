use std::collections::HashMap;
use std::net::IpAddr;

/// Static name/address table in `/etc/hosts` format.
///
/// Lookups are case-insensitive and keep the file order of entries.
#[derive(Debug, Clone, Default)]
pub struct HostsTable {
    by_name: HashMap<String, Vec<IpAddr>>,
    by_ip: HashMap<IpAddr, Vec<String>>,
}

impl HostsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses hosts-file text. Lines whose first field is not an IP address
    /// are skipped, as is everything after `#`.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            let line = match line.split_once('#') {
                Some((content, _)) => content,
                None => line,
            };
            let mut fields = line.split_whitespace();
            let Some(ip) = fields.next().and_then(|f| f.parse::<IpAddr>().ok()) else {
                continue;
            };
            for host in fields {
                table.insert(host, ip);
            }
        }
        table
    }

    pub fn insert(&mut self, host: &str, ip: IpAddr) {
        let host = normalize(host);
        if host.is_empty() {
            return;
        }

        let ips = self.by_name.entry(host.clone()).or_default();
        if !ips.contains(&ip) {
            ips.push(ip);
        }

        let names = self.by_ip.entry(ip).or_default();
        if !names.contains(&host) {
            names.push(host);
        }
    }

    pub fn ips_for_host(&self, host: &str) -> &[IpAddr] {
        self.by_name
            .get(&normalize(host))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn hosts_for_ip(&self, ip: IpAddr) -> &[String] {
        self.by_ip.get(&ip).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}
