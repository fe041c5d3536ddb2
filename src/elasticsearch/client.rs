//! Elasticsearch client wrapper.
//!
//! Wraps reqwest with the base-URL and TLS configuration the check needs.
//! The legacy dialect requires full control over endpoint suffixes
//! (`?search_type=count`), so requests are issued as plain HTTP instead of
//! going through a version-pinned client library.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, Identity, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::health::ClusterHealth;

/// Transport timeout for the single request an invocation makes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by client construction or request execution.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// TLS settings for the connection, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Skip certificate verification.
    pub insecure: bool,
    /// Client certificate for mutual TLS (PEM).
    pub cert: Option<PathBuf>,
    /// Private key belonging to the client certificate (PEM).
    pub key: Option<PathBuf>,
}

impl TlsOptions {
    /// Whether any TLS material was supplied (which implies HTTPS).
    pub fn requested(&self) -> bool {
        self.cert.is_some() || self.key.is_some()
    }
}

/// Elasticsearch client with connection configuration
#[derive(Debug)]
pub struct EsClient {
    client: Client,
    base_url: Url,
}

impl EsClient {
    /// Create a new client for `scheme://host:port/<uri_prefix>`.
    pub fn new(
        scheme: &str,
        host: &str,
        port: u16,
        uri_prefix: &str,
        tls: &TlsOptions,
    ) -> Result<Self, ClientError> {
        let base = format!(
            "{}://{}:{}/{}",
            scheme,
            host,
            port,
            uri_prefix.trim_start_matches('/')
        );
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::Config(format!("invalid base URL {:?}: {}", base, e)))?;

        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);
        if tls.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(identity) = client_identity(tls)? {
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Base URL the client was configured with.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch `GET /_cluster/health`.
    pub async fn cluster_health(&self) -> Result<ClusterHealth, ClientError> {
        let url = self.endpoint("_cluster/health");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let response = require_success(response).await?;
        response.json::<ClusterHealth>().await.map_err(transport)
    }

    /// Execute `POST /<index>/_search<suffix>` with a JSON body.
    pub async fn search(
        &self,
        index: &str,
        suffix: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}{}", self.endpoint(&format!("{}/_search", index)), suffix);
        debug!("POST {} body={}", url, body);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let response = require_success(response).await?;
        response.json::<serde_json::Value>().await.map_err(transport)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    // reqwest keeps the interesting part (DNS, refused, TLS) in its source.
    let mut text = err.to_string();
    if let Some(source) = std::error::Error::source(&err) {
        text = format!("{}: {}", text, source);
    }
    ClientError::Transport(text)
}

async fn require_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// Load the client certificate (and key, when split across two files) into
/// a reqwest identity.
fn client_identity(tls: &TlsOptions) -> Result<Option<Identity>, ClientError> {
    let cert = match (&tls.cert, &tls.key) {
        (Some(cert), _) => cert,
        (None, None) => return Ok(None),
        (None, Some(_)) => {
            return Err(ClientError::Config(
                "--ssl-key requires --ssl-cert".to_string(),
            ))
        }
    };

    let mut pem = fs::read(cert)
        .map_err(|e| ClientError::Config(format!("cannot read {}: {}", cert.display(), e)))?;
    if let Some(key) = &tls.key {
        let key_pem = fs::read(key)
            .map_err(|e| ClientError::Config(format!("cannot read {}: {}", key.display(), e)))?;
        pem.extend(key_pem);
    }

    let identity = Identity::from_pem(&pem)
        .map_err(|e| ClientError::Config(format!("invalid client certificate: {}", e)))?;
    Ok(Some(identity))
}
