//! Network-backed probe using rustls
//!
//! Trust validation is bypassed on purpose: the probe only reads the expiry
//! of whatever leaf certificate the server presents, including self-signed
//! or already-expired ones.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use super::{CertificateProbe, ProbeError};

/// Default TLS port
pub const HTTPS_PORT: u16 = 443;

/// Probe that performs a real TLS handshake
pub struct TlsProbe {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl TlsProbe {
    /// Create a probe for port 443 bounded by `timeout` per domain
    pub fn new(timeout: Duration) -> Result<Self, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            port: HTTPS_PORT,
            timeout,
        })
    }

    /// Connect to a port other than 443
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect, handshake and take the first peer certificate. The stream is
    /// dropped (and the socket closed) before returning on every path.
    async fn leaf_certificate(&self, domain: &str) -> Result<CertificateDer<'static>, ProbeError> {
        let server_name = ServerName::try_from(domain)
            .map_err(|e| ProbeError::connect(domain, e))?
            .to_owned();

        let stream = TcpStream::connect((domain, self.port))
            .await
            .map_err(|e| ProbeError::connect(domain, e))?;

        let tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ProbeError::connect(domain, e))?;

        let (_, connection) = tls_stream.get_ref();
        connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|leaf| leaf.clone().into_owned())
            .ok_or_else(|| ProbeError::NoCertificate {
                domain: domain.to_string(),
            })
    }
}

#[async_trait]
impl CertificateProbe for TlsProbe {
    async fn fetch_expiry(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError> {
        let leaf = match timeout(self.timeout, self.leaf_certificate(domain)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProbeError::connect(
                    domain,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let not_after =
            parse_not_after(leaf.as_ref()).map_err(|reason| ProbeError::InvalidCertificate {
                domain: domain.to_string(),
                reason,
            })?;

        tracing::debug!(domain = %domain, not_after = %not_after, "Leaf certificate read");
        Ok(not_after)
    }
}

/// Extract `notAfter` from a DER-encoded certificate
pub fn parse_not_after(der: &[u8]) -> Result<DateTime<Utc>, String> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| format!("Failed to parse certificate: {}", e))?;

    let secs = cert.validity().not_after.timestamp();
    DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("notAfter {} is out of range", secs))
}

/// Verifier that accepts any server certificate and handshake signature
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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
