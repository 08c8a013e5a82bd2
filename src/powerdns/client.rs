use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, SERVER};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_SERVER_ID};
use crate::error::{Error, Result};
use crate::powerdns::cache::ZoneCache;
use crate::powerdns::id::decode_id;
use crate::powerdns::types::*;
use crate::powerdns::url::sanitize_url;

const API_KEY_HEADER: &str = "X-API-Key";
const JSON: &str = "application/json";

/// API dialect spoken by the server: 0 is the legacy unprefixed API, N > 0 is `/api/vN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion(pub u8);

impl ApiVersion {
    pub const LEGACY: ApiVersion = ApiVersion(0);
    pub const V1: ApiVersion = ApiVersion(1);

    pub fn is_legacy(self) -> bool {
        self.0 == 0
    }

    /// Path prefix for this dialect ("" for legacy).
    pub fn prefix(self) -> String {
        if self.is_legacy() {
            String::new()
        } else {
            format!("/api/v{}", self.0)
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Status, headers and raw body of an API answer.
pub(crate) struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn error(&self, context: impl Into<String>, target: &str) -> Error {
        Error::api(self.status.as_u16(), context, target, &self.body)
    }

    /// Pass the response through when its status is one of `accepted`.
    pub fn check(self, accepted: &[StatusCode], context: impl Into<String>, target: &str) -> Result<Self> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(self.error(context, target))
        }
    }
}

#[derive(Clone)]
pub struct PowerDnsClient {
    http: Client,
    base_url: String, // e.g. "https://127.0.0.1:8081", without API prefix
    api_key: String,
    server_id: String, // usually "localhost"
    api_version: Arc<OnceCell<ApiVersion>>,
    server_version: Arc<OnceCell<String>>,
    cache: Option<Arc<dyn ZoneCache>>,
    cache_ttl: Duration,
}

impl fmt::Debug for PowerDnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerDnsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("server_id", &self.server_id)
            .field("api_version", &self.api_version.get())
            .field("cache", &self.cache.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl PowerDnsClient {
    /// Client with a default transport and no cache. Nothing is sent until the first call.
    pub fn new(
        server_url: &str,
        api_key: impl Into<String>,
        server_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: sanitize_url(server_url)?,
            api_key: api_key.into(),
            server_id: server_id.into(),
            api_version: Arc::new(OnceCell::new()),
            server_version: Arc::new(OnceCell::new()),
            cache: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let server_id = if config.server_id.is_empty() {
            DEFAULT_SERVER_ID
        } else {
            &config.server_id
        };
        let mut client = Self::new(&config.server_url, &config.api_key, server_id)?
            .with_http_client(config.http_client()?);
        if let Some(cache) = config.cache() {
            client = client.with_cache(cache, config.cache_ttl());
        }
        info!(
            server = %client.base_url,
            cache = config.cache_enable,
            "PowerDNS client configured"
        );
        Ok(client)
    }

    /// Build from `config` and talk to the server once, failing early on a bad
    /// address or key.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let client = Self::from_config(config)?;
        client.server_version().await?;
        Ok(client)
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ZoneCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Pin the API dialect instead of probing the server for it.
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Arc::new(OnceCell::new_with(Some(version)));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    fn auth_header(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, JSON)
    }

    /// Logical endpoint below the server, e.g. `endpoint("zones")` is
    /// `/servers/localhost/zones`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("/servers/{}", self.server_id)
        } else {
            format!("/servers/{}/{}", self.server_id, path)
        }
    }

    fn zone_endpoint(&self, zone: &str) -> String {
        self.endpoint(&format!("zones/{}", zone))
    }

    /// API dialect of the server, probed on first use and remembered.
    pub async fn api_version(&self) -> ApiVersion {
        *self
            .api_version
            .get_or_init(|| async {
                let version = self.detect_api_version().await;
                info!(%version, server = %self.base_url, "PowerDNS API version detected");
                version
            })
            .await
    }

    /// Probe `/api/v1/servers`; anything but success means the legacy API.
    async fn detect_api_version(&self) -> ApiVersion {
        let url = format!("{}{}/servers", self.base_url, ApiVersion::V1.prefix());
        match self.auth_header(self.http.get(url)).send().await {
            Ok(res) if res.status().is_success() => ApiVersion::V1,
            Ok(res) => {
                debug!(status = %res.status(), "versioned API not available, using legacy API");
                ApiVersion::LEGACY
            }
            Err(err) => {
                warn!(error = %err, "PowerDNS API version detection failed, assuming legacy API");
                ApiVersion::LEGACY
            }
        }
    }

    /// Authenticated request against `endpoint` in the server's API dialect.
    pub(crate) async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Vec<u8>>,
    ) -> RequestBuilder {
        let url = format!(
            "{}{}{}",
            self.base_url,
            self.api_version().await.prefix(),
            endpoint
        );
        debug!(%method, %url, "PowerDNS request");

        let is_get = method == Method::GET;
        let mut req = self.auth_header(self.http.request(method, url));
        if !is_get {
            req = req.header(CONTENT_TYPE, JSON);
        }
        if let Some(body) = body {
            req = req.body(body);
        }
        req
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse> {
        let res = self.request(method, endpoint, body).await.send().await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Server description from `GET /servers/{server_id}`.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let res = self
            .send(Method::GET, &self.endpoint(""), None)
            .await?
            .check(&[StatusCode::OK], "error getting server info", &self.server_id)?;
        res.json()
    }

    /// PowerDNS software version, taken from the server description or, failing
    /// that, from a `Server: PowerDNS/<version>` header. Fetched once.
    pub async fn server_version(&self) -> Result<String> {
        self.server_version
            .get_or_try_init(|| async {
                let res = self
                    .send(Method::GET, &self.endpoint(""), None)
                    .await?
                    .check(
                        &[StatusCode::OK],
                        "invalid response code from server",
                        &self.server_id,
                    )?;
                let version = match res.json::<ServerInfo>() {
                    Ok(info) => info.version,
                    Err(_) => version_from_header(&res.headers).ok_or_else(|| Error::Api {
                        status: res.status.as_u16(),
                        context: "error getting server version".into(),
                        message: "unable to get server version".into(),
                    })?,
                };
                info!(%version, "PowerDNS server version");
                Ok::<_, Error>(version)
            })
            .await
            .cloned()
    }

    /// All zones of the server, without records.
    pub async fn list_zones(&self) -> Result<Vec<ZoneInfo>> {
        let res = self.send(Method::GET, &self.endpoint("zones"), None).await?;
        if !res.status.is_success() {
            return Err(res.error("error listing zones", &self.server_id));
        }
        res.json()
    }

    pub async fn get_zone(&self, name: &str) -> Result<ZoneInfo> {
        self.send(Method::GET, &self.zone_endpoint(name), None)
            .await?
            .check(&[StatusCode::OK], format!("error getting zone {name}"), name)?
            .json()
    }

    pub async fn zone_exists(&self, name: &str) -> Result<bool> {
        let res = self
            .send(Method::GET, &self.zone_endpoint(name), None)
            .await?
            .check(
                &[StatusCode::OK, StatusCode::NOT_FOUND],
                format!("error getting zone {name}"),
                name,
            )?;
        Ok(res.status == StatusCode::OK)
    }

    pub async fn create_zone(&self, zone: &ZoneInfo) -> Result<ZoneInfo> {
        let body = serde_json::to_vec(zone)?;
        self.send(Method::POST, &self.endpoint("zones"), Some(body))
            .await?
            .check(
                &[StatusCode::CREATED],
                format!("error creating zone {}", zone.name),
                &zone.name,
            )?
            .json()
    }

    pub async fn update_zone(&self, name: &str, zone: &ZoneInfo) -> Result<()> {
        let body = serde_json::to_vec(zone)?;
        self.send(Method::PUT, &self.zone_endpoint(name), Some(body))
            .await?
            .check(
                &[StatusCode::NO_CONTENT],
                format!("error updating zone {name}"),
                name,
            )?;
        Ok(())
    }

    pub async fn delete_zone(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &self.zone_endpoint(name), None)
            .await?
            .check(
                &[StatusCode::NO_CONTENT],
                format!("error deleting zone {name}"),
                name,
            )?;
        Ok(())
    }

    async fn cached_zone(&self, zone: &str) -> Option<ZoneInfo> {
        let bytes = self.cache.as_ref()?.get(zone).await?;
        match serde_json::from_slice(&bytes) {
            Ok(info) => {
                debug!(zone, "zone served from cache");
                Some(info)
            }
            Err(err) => {
                warn!(zone, error = %err, "discarding undecodable cached zone");
                None
            }
        }
    }

    async fn store_zone(&self, zone: &str, info: &ZoneInfo) -> Result<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(info)?;
        cache.set(zone, bytes, self.cache_ttl).await?;
        Ok(())
    }

    /// Zone snapshot, served from and stored into the cache when caching is on.
    pub(crate) async fn zone_snapshot(&self, zone: &str) -> Result<ZoneInfo> {
        if let Some(info) = self.cached_zone(zone).await {
            return Ok(info);
        }
        let info = self.get_zone(zone).await?;
        self.store_zone(zone, &info).await?;
        Ok(info)
    }

    /// Every record of `zone` in the flat shape, whichever dialect the server speaks.
    ///
    /// With caching on, the zone snapshot (not the flattened list) is what gets cached.
    pub async fn list_records(&self, zone: &str) -> Result<Vec<Record>> {
        Ok(self.zone_snapshot(zone).await?.flattened_records())
    }

    pub async fn list_records_in_rrset(
        &self,
        zone: &str,
        name: &str,
        rtype: &str,
    ) -> Result<Vec<Record>> {
        let records = self.list_records(zone).await?;
        Ok(records
            .into_iter()
            .filter(|r| r.name == name && r.rtype == rtype)
            .collect())
    }

    pub async fn list_records_by_id(&self, zone: &str, id: &str) -> Result<Vec<Record>> {
        let (name, rtype) = decode_id(id)?;
        self.list_records_in_rrset(zone, name, rtype).await
    }

    pub async fn record_exists(&self, zone: &str, name: &str, rtype: &str) -> Result<bool> {
        let records = self.list_records(zone).await?;
        Ok(records.iter().any(|r| r.name == name && r.rtype == rtype))
    }

    pub async fn record_exists_by_id(&self, zone: &str, id: &str) -> Result<bool> {
        let (name, rtype) = decode_id(id)?;
        self.record_exists(zone, name, rtype).await
    }

    async fn send_patch(&self, zone: &str, rrsets: &[ResourceRecordSet]) -> Result<ApiResponse> {
        let body = serde_json::to_vec(&ZonePatch { rrsets })?;
        self.send(Method::PATCH, &self.zone_endpoint(zone), Some(body))
            .await
    }

    /// Apply a batch of RRSet changes to `zone` as-is.
    pub async fn patch_rrsets(&self, zone: &str, rrsets: &[ResourceRecordSet]) -> Result<()> {
        self.send_patch(zone, rrsets).await?.check(
            &[StatusCode::OK, StatusCode::NO_CONTENT],
            format!("error patching record sets of zone {zone}"),
            zone,
        )?;
        Ok(())
    }

    /// Create or overwrite one record set; returns its composite ID.
    pub async fn replace_record_set(&self, zone: &str, mut rrset: ResourceRecordSet) -> Result<String> {
        rrset.changetype = Some(ChangeType::Replace);
        let id = rrset.id();
        self.send_patch(zone, std::slice::from_ref(&rrset))
            .await?
            .check(
                &[StatusCode::OK, StatusCode::NO_CONTENT],
                format!("error creating record set {id}"),
                &id,
            )?;
        Ok(id)
    }

    pub async fn delete_record_set(&self, zone: &str, name: &str, rtype: &str) -> Result<()> {
        let rrset = ResourceRecordSet {
            name: name.to_string(),
            rtype: rtype.to_string(),
            changetype: Some(ChangeType::Delete),
            ..Default::default()
        };
        self.send_patch(zone, std::slice::from_ref(&rrset))
            .await?
            .check(
                &[StatusCode::OK, StatusCode::NO_CONTENT],
                format!("error deleting record {name} {rtype}"),
                &rrset.id(),
            )?;
        Ok(())
    }

    pub async fn delete_record_set_by_id(&self, zone: &str, id: &str) -> Result<()> {
        let (name, rtype) = decode_id(id)?;
        self.delete_record_set(zone, name, rtype).await
    }
}

fn version_from_header(headers: &HeaderMap) -> Option<String> {
    let server = headers.get(SERVER)?.to_str().ok()?;
    let (product, version) = server.split_once('/')?;
    product
        .eq_ignore_ascii_case("PowerDNS")
        .then(|| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn version_prefixes() {
        assert_eq!(ApiVersion::LEGACY.prefix(), "");
        assert_eq!(ApiVersion::V1.prefix(), "/api/v1");
        assert_eq!(ApiVersion(2).prefix(), "/api/v2");
    }

    #[test]
    fn endpoints_are_scoped_to_the_server() {
        let client = PowerDnsClient::new("pdns:8081", "key", "localhost").unwrap();
        assert_eq!(client.base_url(), "https://pdns:8081");
        assert_eq!(client.endpoint(""), "/servers/localhost");
        assert_eq!(client.endpoint("zones"), "/servers/localhost/zones");
        assert_eq!(
            client.zone_endpoint("example.com."),
            "/servers/localhost/zones/example.com."
        );
    }

    #[test]
    fn invalid_address_is_rejected_up_front() {
        assert!(matches!(
            PowerDnsClient::new("", "key", "localhost"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn debug_hides_api_key() {
        let client = PowerDnsClient::new("pdns", "very-secret", "localhost").unwrap();
        assert!(!format!("{client:?}").contains("very-secret"));
    }

    #[test]
    fn server_header_version() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("PowerDNS/4.8.3"));
        assert_eq!(version_from_header(&headers).as_deref(), Some("4.8.3"));

        headers.insert(SERVER, HeaderValue::from_static("nginx/1.25"));
        assert_eq!(version_from_header(&headers), None);
    }

    #[tokio::test]
    async fn pinned_api_version_skips_probe() {
        let client = PowerDnsClient::new("pdns", "key", "localhost")
            .unwrap()
            .with_api_version(ApiVersion::LEGACY);
        assert_eq!(client.api_version().await, ApiVersion::LEGACY);
    }
}
