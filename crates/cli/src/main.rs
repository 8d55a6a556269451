use clap::Parser;
use std::sync::Arc;
use tern_application::use_cases::Resolver;
use tern_domain::{CliOverrides, RecordType, ResolverStrategy};
use tern_infrastructure::dns::ExecutorChainBuilder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod bootstrap;

#[derive(Parser)]
#[command(name = "tern")]
#[command(version)]
#[command(about = "Tern - DNS stub resolver")]
struct Cli {
    /// Name to resolve
    name: String,

    /// Record type (A, AAAA, MX, TXT, ...)
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: String,

    /// Name server, e.g. 1.1.1.1, tcp://9.9.9.9, tls://1.1.1.1#cloudflare-dns.com
    /// (repeatable; replaces the configured list)
    #[arg(short = 's', long = "server", value_name = "ADDR")]
    servers: Vec<String>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Print every matching record instead of one address
    #[arg(short = 'a', long)]
    all: bool,

    /// Per-attempt timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Retries after a timeout
    #[arg(long)]
    retries: Option<u32>,

    /// How several servers are combined (race, failover)
    #[arg(long)]
    strategy: Option<ResolverStrategy>,

    /// Disable the record cache
    #[arg(long)]
    no_cache: bool,

    /// Hosts file consulted before the network
    #[arg(long, value_name = "FILE")]
    hosts_file: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let record_type: RecordType = cli
        .record_type
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid record type '{}': {}", cli.record_type, e))?;

    let overrides = CliOverrides {
        nameservers: cli.servers.clone(),
        strategy: cli.strategy,
        timeout_ms: cli.timeout,
        retries: cli.retries,
        no_cache: cli.no_cache,
        hosts_file: cli.hosts_file.clone(),
        insecure: cli.insecure,
        log_level: cli.log_level.clone(),
        json_logs: cli.json,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        servers = ?config.resolver.nameservers,
        "Starting tern"
    );

    if !config.resolver.tls.verify && config.resolver.tls.fingerprint.is_none() {
        warn!("TLS certificate verification is disabled");
    }

    let executor = ExecutorChainBuilder::new(config.resolver.clone()).build()?;
    let resolver = Arc::new(Resolver::new(executor));

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted");
            on_interrupt.cancel();
        }
    });

    if record_type == RecordType::A && !cli.all {
        let ip = resolver.resolve_with_cancel(&cli.name, &token).await?;
        println!("{}", ip);
        return Ok(());
    }

    let values = resolver
        .resolve_all_with_cancel(&cli.name, record_type, &token)
        .await?;
    for value in values {
        println!("{}", value);
    }

    Ok(())
}
