use serde::{Deserialize, Serialize};

use crate::dns_protocol::DnsProtocol;

/// How multiple name servers are combined.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Staggered parallel queries, first answer wins.
    #[default]
    Race,

    /// One server at a time, in the configured order.
    Failover,
}

impl ResolverStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Race => "race",
            Self::Failover => "failover",
        }
    }
}

impl std::str::FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "race" => Ok(Self::Race),
            "failover" => Ok(Self::Failover),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(default = "default_true")]
    pub verify: bool,

    /// Hex SHA-256 of the server's leaf certificate (colons allowed).
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// PEM bundle used instead of the built-in web PKI roots.
    #[serde(default)]
    pub ca_file: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify: true,
            fingerprint: None,
            ca_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default = "default_nameservers")]
    pub nameservers: Vec<String>,

    #[serde(default)]
    pub strategy: ResolverStrategy,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    #[serde(default)]
    pub hosts_file: Option<String>,

    #[serde(default)]
    pub tls: TlsConfig,
}

impl ResolverConfig {
    pub fn parsed_nameservers(&self) -> Result<Vec<DnsProtocol>, crate::DomainError> {
        self.nameservers.iter().map(|s| s.parse()).collect()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: default_nameservers(),
            strategy: ResolverStrategy::default(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            stagger_ms: default_stagger_ms(),
            cache_enabled: true,
            cache_max_entries: default_cache_max_entries(),
            hosts_file: None,
            tls: TlsConfig::default(),
        }
    }
}

fn default_nameservers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_retries() -> u32 {
    2
}

fn default_stagger_ms() -> u64 {
    50
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}
