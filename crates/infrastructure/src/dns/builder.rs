use super::cache::{Clock, RecordCache, SystemClock};
use super::executor::{
    CachingExecutor, CoopExecutor, FallbackExecutor, HostsFileExecutor, MultiServerExecutor,
    RetryExecutor, TimeoutExecutor,
};
use super::transport::{
    build_client_config, SelectiveTransportExecutor, TcpExecutor, TlsConnector, TlsExecutor,
    TlsOptions, UdpExecutor,
};
use rustls::ClientConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tern_application::ports::{DnsExecutor, HostsLookup};
use tern_domain::config::{ResolverConfig, ResolverStrategy};
use tern_domain::{DnsProtocol, DomainError, HostsTable};
use tracing::{debug, info};

/// Assembles the executor chain described by a [`ResolverConfig`]:
///
/// transport per server → timeout → retry → race or failover across
/// servers → cache (or bare dedup) → hosts table.
pub struct ExecutorChainBuilder {
    config: ResolverConfig,
    hosts: Option<Arc<dyn HostsLookup>>,
    cache: Option<Arc<RecordCache>>,
    clock: Arc<dyn Clock>,
}

impl ExecutorChainBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            hosts: None,
            cache: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses `hosts` instead of loading `hosts_file` from the config.
    pub fn with_hosts(mut self, hosts: Arc<dyn HostsLookup>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    /// Shares an existing cache; only used when caching is enabled.
    pub fn with_cache(mut self, cache: Arc<RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Arc<dyn DnsExecutor>, DomainError> {
        let servers = self.config.parsed_nameservers()?;
        if servers.is_empty() {
            return Err(DomainError::ConfigError("no name servers configured".to_string()));
        }

        info!(
            servers = servers.len(),
            strategy = self.config.strategy.as_str(),
            timeout_ms = self.config.timeout_ms,
            retries = self.config.retries,
            cache = self.config.cache_enabled,
            "Building executor chain"
        );

        let tls = self.tls_setup(&servers)?;
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let per_server: Vec<Arc<dyn DnsExecutor>> = servers
            .iter()
            .map(|server| {
                let transport = transport_for(server, tls.as_ref());
                let timed: Arc<dyn DnsExecutor> = Arc::new(TimeoutExecutor::new(transport, timeout));
                Arc::new(RetryExecutor::new(timed, self.config.retries)) as Arc<dyn DnsExecutor>
            })
            .collect();

        let mut executor = self.combine(per_server)?;

        executor = if self.config.cache_enabled {
            let cache = self
                .cache
                .clone()
                .unwrap_or_else(|| Arc::new(RecordCache::new(self.config.cache_max_entries)));
            Arc::new(CachingExecutor::new(executor, cache, Arc::clone(&self.clock)))
        } else {
            Arc::new(CoopExecutor::new(executor))
        };

        if let Some(hosts) = self.hosts_lookup()? {
            executor = Arc::new(HostsFileExecutor::new(hosts, executor));
        }

        info!("Executor chain built");
        Ok(executor)
    }

    fn combine(
        &self,
        mut per_server: Vec<Arc<dyn DnsExecutor>>,
    ) -> Result<Arc<dyn DnsExecutor>, DomainError> {
        if per_server.len() == 1 {
            return Ok(per_server.remove(0));
        }

        match self.config.strategy {
            ResolverStrategy::Race => Ok(Arc::new(MultiServerExecutor::new(
                per_server,
                Duration::from_millis(self.config.stagger_ms),
            )?)),
            ResolverStrategy::Failover => {
                let mut chain = per_server.into_iter().rev();
                let last = chain.next().ok_or_else(|| {
                    DomainError::ConfigError("no name servers configured".to_string())
                })?;
                Ok(chain.fold(last, |fallback, primary| {
                    Arc::new(FallbackExecutor::new(primary, fallback)) as Arc<dyn DnsExecutor>
                }))
            }
        }
    }

    fn tls_setup(&self, servers: &[DnsProtocol]) -> Result<Option<TlsSetup>, DomainError> {
        if !servers.iter().any(|s| matches!(s, DnsProtocol::Tls { .. })) {
            return Ok(None);
        }
        let options = TlsOptions::from_config(&self.config.tls)?;
        let client = build_client_config(&options)?;
        Ok(Some(TlsSetup {
            client,
            fingerprint: options.fingerprint,
        }))
    }

    fn hosts_lookup(&self) -> Result<Option<Arc<dyn HostsLookup>>, DomainError> {
        if let Some(hosts) = &self.hosts {
            return Ok(Some(Arc::clone(hosts)));
        }
        match &self.config.hosts_file {
            Some(path) => Ok(Some(Arc::new(load_hosts_file(Path::new(path))?))),
            None => Ok(None),
        }
    }
}

struct TlsSetup {
    client: Arc<ClientConfig>,
    fingerprint: Option<[u8; 32]>,
}

fn transport_for(server: &DnsProtocol, tls: Option<&TlsSetup>) -> Arc<dyn DnsExecutor> {
    debug!(server = %server, protocol = server.protocol_name(), "Creating transport");
    match server {
        DnsProtocol::Auto { addr } => Arc::new(SelectiveTransportExecutor::new(
            Arc::new(UdpExecutor::new(*addr)),
            Arc::new(TcpExecutor::tcp(*addr)),
        )),
        DnsProtocol::Udp { addr } => Arc::new(UdpExecutor::new(*addr)),
        DnsProtocol::Tcp { addr } => Arc::new(TcpExecutor::tcp(*addr)),
        DnsProtocol::Tls { addr, hostname } => match tls {
            Some(setup) => Arc::new(TlsExecutor::tls(
                TlsConnector::new(*addr, Arc::clone(hostname), Arc::clone(&setup.client))
                    .with_fingerprint(setup.fingerprint),
            )),
            // tls_setup() always yields a config when a TLS server exists
            None => Arc::new(TcpExecutor::tcp(*addr)),
        },
    }
}

/// Reads and parses a hosts file (`/etc/hosts` format).
pub fn load_hosts_file(path: &Path) -> Result<HostsTable, DomainError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DomainError::ConfigError(format!("cannot read hosts file {}: {}", path.display(), e))
    })?;
    let table = HostsTable::parse(&text);
    info!(path = %path.display(), entries = table.len(), "Loaded hosts file");
    Ok(table)
}
