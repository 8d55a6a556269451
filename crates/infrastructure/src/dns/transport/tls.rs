//! DNS-over-TLS (RFC 7858).
//!
//! Composition over the TCP connector: the TCP stream is opened first, then
//! the TLS handshake runs on it, and the framing in [`super::stream`] is
//! reused unchanged. Certificate verification is on by default, against the
//! web PKI roots or a configured PEM bundle. A pinned SHA-256 leaf
//! fingerprint can be checked on top of (or instead of) chain verification.

use super::stream::{StreamConnector, StreamExecutor, StreamProgress, StreamState};
use super::tcp::TcpConnector;
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tern_domain::config::TlsConfig;
use tern_domain::DomainError;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

pub type TlsExecutor = StreamExecutor<TlsConnector>;

impl TlsExecutor {
    pub fn tls(connector: TlsConnector) -> Self {
        StreamExecutor::new(connector)
    }
}

#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub verify: bool,
    pub fingerprint: Option<[u8; 32]>,
    pub ca_file: Option<PathBuf>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify: true,
            fingerprint: None,
            ca_file: None,
        }
    }
}

impl TlsOptions {
    pub fn from_config(config: &TlsConfig) -> Result<Self, DomainError> {
        let fingerprint = config
            .fingerprint
            .as_deref()
            .map(parse_fingerprint)
            .transpose()?;

        Ok(Self {
            verify: config.verify,
            fingerprint,
            ca_file: config.ca_file.as_ref().map(PathBuf::from),
        })
    }
}

/// Parses a hex SHA-256 digest; `:` separators are ignored.
pub fn parse_fingerprint(text: &str) -> Result<[u8; 32], DomainError> {
    let hex: Vec<u8> = text.bytes().filter(|b| *b != b':').collect();
    let invalid =
        || DomainError::ConfigError(format!("'{}' is not a hex SHA-256 fingerprint", text));

    if hex.len() != 64 {
        return Err(invalid());
    }

    let mut out = [0u8; 32];
    for (i, pair) in hex.chunks(2).enumerate() {
        let digits = std::str::from_utf8(pair).map_err(|_| invalid())?;
        out[i] = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
    }
    Ok(out)
}

pub fn fingerprint_hex(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn build_client_config(options: &TlsOptions) -> Result<Arc<ClientConfig>, DomainError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| DomainError::ConfigError(format!("TLS setup failed: {}", e)))?;

    let config = if options.verify {
        let mut roots = RootCertStore::empty();
        match &options.ca_file {
            Some(path) => load_ca_file(path, &mut roots)?,
            None => roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        if options.fingerprint.is_none() {
            warn!("TLS certificate verification disabled without a pinned fingerprint");
        }
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth()
    };

    Ok(Arc::new(config))
}

fn load_ca_file(path: &Path, roots: &mut RootCertStore) -> Result<(), DomainError> {
    let file = std::fs::File::open(path).map_err(|e| {
        DomainError::ConfigError(format!("cannot open CA file {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let mut added = 0usize;
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| {
            DomainError::ConfigError(format!("invalid PEM in {}: {}", path.display(), e))
        })?;
        roots.add(cert).map_err(|e| {
            DomainError::ConfigError(format!("rejected CA in {}: {}", path.display(), e))
        })?;
        added += 1;
    }

    if added == 0 {
        return Err(DomainError::ConfigError(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(())
}

/// Skips chain and name checks; handshake signatures are still verified.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

pub struct TlsConnector {
    tcp: TcpConnector,
    hostname: Arc<str>,
    config: Arc<ClientConfig>,
    fingerprint: Option<[u8; 32]>,
}

impl TlsConnector {
    pub fn new(server_addr: SocketAddr, hostname: impl Into<Arc<str>>, config: Arc<ClientConfig>) -> Self {
        Self {
            tcp: TcpConnector::new(server_addr),
            hostname: hostname.into(),
            config,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<[u8; 32]>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn check_fingerprint(
        &self,
        stream: &TlsStream<TcpStream>,
        progress: &mut StreamProgress,
    ) -> Result<(), DomainError> {
        let Some(expected) = &self.fingerprint else {
            return Ok(());
        };

        let (_, session) = stream.get_ref();
        let Some(leaf) = session.peer_certificates().and_then(|certs| certs.first()) else {
            return Err(progress.handshake_failed("server presented no certificate"));
        };

        let der: &[u8] = leaf.as_ref();
        let digest = Sha256::digest(der);
        if digest.as_slice() != expected.as_slice() {
            return Err(progress.handshake_failed(format!(
                "certificate fingerprint mismatch (got {})",
                fingerprint_hex(&digest)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StreamConnector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    async fn connect(
        &self,
        progress: &mut StreamProgress,
    ) -> Result<TlsStream<TcpStream>, DomainError> {
        let server_name = match ServerName::try_from(self.hostname.to_string()) {
            Ok(name) => name,
            Err(e) => {
                return Err(progress.handshake_failed(format!(
                    "invalid TLS name '{}': {}",
                    self.hostname, e
                )))
            }
        };

        let tcp = self.tcp.connect(progress).await?;

        progress.enter(StreamState::Handshaking);
        let connector = tokio_rustls::TlsConnector::from(self.config.clone());
        let stream = match connector.connect(server_name, tcp).await {
            Ok(stream) => stream,
            Err(e) => return Err(progress.handshake_failed(e)),
        };

        self.check_fingerprint(&stream, progress)?;

        debug!(server = %self.tcp.server_addr(), hostname = %self.hostname, "TLS connection established");
        Ok(stream)
    }

    fn server(&self) -> String {
        let addr = self.tcp.server_addr();
        if *self.hostname == addr.ip().to_string() {
            format!("tls://{}", addr)
        } else {
            format!("tls://{}#{}", addr, self.hostname)
        }
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
