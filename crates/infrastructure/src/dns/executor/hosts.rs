use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tern_application::ports::{DnsExecutor, HostsLookup};
use tern_domain::{DnsQuery, DomainError, Message, Record, RecordClass, RecordData, RecordType};
use tracing::debug;

/// Answers from a static hosts table before touching the network.
///
/// A and AAAA queries are answered when the table has an address of the
/// matching family; PTR queries under `in-addr.arpa` / `ip6.arpa` when the
/// address has host names. Answers carry TTL 0. Everything else, and every
/// miss, goes to the inner executor.
pub struct HostsFileExecutor {
    hosts: Arc<dyn HostsLookup>,
    inner: Arc<dyn DnsExecutor>,
}

impl HostsFileExecutor {
    pub fn new(hosts: Arc<dyn HostsLookup>, inner: Arc<dyn DnsExecutor>) -> Self {
        Self { hosts, inner }
    }

    fn local_answers(&self, query: &DnsQuery) -> Vec<Record> {
        if query.class != RecordClass::IN {
            return Vec::new();
        }

        match query.record_type {
            RecordType::A => self
                .hosts
                .ips_for_host(&query.name)
                .into_iter()
                .filter_map(|ip| match ip {
                    IpAddr::V4(v4) => Some(Record::in_class(&*query.name, 0, RecordData::A(v4))),
                    IpAddr::V6(_) => None,
                })
                .collect(),
            RecordType::AAAA => self
                .hosts
                .ips_for_host(&query.name)
                .into_iter()
                .filter_map(|ip| match ip {
                    IpAddr::V6(v6) => Some(Record::in_class(&*query.name, 0, RecordData::Aaaa(v6))),
                    IpAddr::V4(_) => None,
                })
                .collect(),
            RecordType::PTR => match reverse_pointer_ip(&query.name) {
                Some(ip) => self
                    .hosts
                    .hosts_for_ip(ip)
                    .into_iter()
                    .map(|host| Record::in_class(&*query.name, 0, RecordData::Ptr(host)))
                    .collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl DnsExecutor for HostsFileExecutor {
    async fn query(&self, query: &DnsQuery) -> Result<Message, DomainError> {
        let answers = self.local_answers(query);
        if answers.is_empty() {
            return self.inner.query(query).await;
        }

        debug!(query = %query, answers = answers.len(), "Answered from hosts table");
        Ok(Message::response_for(query.clone(), answers))
    }
}

/// Maps a reverse-lookup name back to its address:
/// `4.3.2.1.in-addr.arpa` is 1.2.3.4, and `ip6.arpa` names hold 32
/// nibbles least-significant first.
pub fn reverse_pointer_ip(name: &str) -> Option<IpAddr> {
    let name = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();

    if let Some(rest) = name.strip_suffix(".in-addr.arpa") {
        let mut octets = [0u8; 4];
        let labels: Vec<&str> = rest.split('.').collect();
        if labels.len() != 4 {
            return None;
        }
        for (i, label) in labels.iter().rev().enumerate() {
            if label.is_empty() || (label.len() > 1 && label.starts_with('0')) {
                return None;
            }
            octets[i] = label.parse().ok()?;
        }
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }

    if let Some(rest) = name.strip_suffix(".ip6.arpa") {
        let nibbles: Vec<&str> = rest.split('.').collect();
        if nibbles.len() != 32 {
            return None;
        }
        let mut value: u128 = 0;
        for nibble in nibbles.iter().rev() {
            if nibble.len() != 1 {
                return None;
            }
            value = (value << 4) | u8::from_str_radix(nibble, 16).ok()? as u128;
        }
        return Some(IpAddr::V6(Ipv6Addr::from(value)));
    }

    None
}
