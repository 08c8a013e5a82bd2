use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::powerdns::cache::{MemoryCache, ZoneCache};

pub const DEFAULT_SERVER_ID: &str = "localhost";
pub const DEFAULT_CACHE_MEM_SIZE_MB: usize = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Connection settings handed over by whoever drives the client.
#[derive(Clone)]
pub struct ClientConfig {
    pub server_url: String, // "https://pdns.example.net:8081", "pdns:8081", ...
    pub api_key: String,
    pub server_id: String, // usually "localhost"
    /// Skip verification of the server's TLS certificate.
    pub insecure_https: bool,
    /// PEM content, or the path of a PEM file, of an extra root CA.
    pub ca_certificate: Option<String>,
    pub cache_enable: bool,
    pub cache_mem_size: usize, // MB
    pub cache_ttl: u64,        // seconds, 0 keeps entries until evicted
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            api_key: String::new(),
            server_id: DEFAULT_SERVER_ID.to_string(),
            insecure_https: false,
            ca_certificate: None,
            cache_enable: false,
            cache_mem_size: DEFAULT_CACHE_MEM_SIZE_MB,
            cache_ttl: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_url", &self.server_url)
            .field("api_key", &"<REDACTED>")
            .field("server_id", &self.server_id)
            .field("insecure_https", &self.insecure_https)
            .field("ca_certificate", &self.ca_certificate.as_ref().map(|_| "<set>"))
            .field("cache_enable", &self.cache_enable)
            .field("cache_mem_size", &self.cache_mem_size)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Zone cache sized from `cache_mem_size`, or `None` when caching is off.
    pub fn cache(&self) -> Option<Arc<dyn ZoneCache>> {
        self.cache_enable
            .then(|| Arc::new(MemoryCache::with_megabytes(self.cache_mem_size)) as Arc<dyn ZoneCache>)
    }

    /// Resolve `ca_certificate` to PEM text. A value naming an existing file is read,
    /// anything else is taken as the certificate itself.
    pub fn ca_certificate_pem(&self) -> Result<Option<String>> {
        let Some(value) = self.ca_certificate.as_deref().filter(|v| !v.trim().is_empty()) else {
            return Ok(None);
        };
        let path = Path::new(value);
        if path.is_file() {
            let pem = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("error reading CA cert {}: {e}", path.display()))
            })?;
            return Ok(Some(pem));
        }
        Ok(Some(value.to_string()))
    }

    /// HTTP transport honouring the TLS options.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let builder = reqwest::Client::builder();

        #[cfg(feature = "https-client")]
        let builder = {
            let mut builder = builder.danger_accept_invalid_certs(self.insecure_https);
            if let Some(pem) = self.ca_certificate_pem()? {
                let cert = reqwest::Certificate::from_pem(pem.as_bytes())
                    .map_err(|e| Error::config(format!("invalid CA certificate: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            builder
        };

        #[cfg(not(feature = "https-client"))]
        if self.insecure_https || self.ca_certificate_pem()?.is_some() {
            return Err(Error::config(
                "TLS options require the `https-client` feature",
            ));
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
    }
}
