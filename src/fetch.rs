//!
//! src/fetch.rs
//!
//! Fetch collaborator: performs the network calls and hands raw JSON
//! to the normalization layer. Owns client construction, bounded
//! retries, egress selection and the response caches. The creation
//! endpoint is a JSON POST; the page flow GETs an HTML document and
//! extracts the single JSON blob embedded in its data script tag.
//!

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use reqwest::{Client, header, redirect};
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{DiskCache, MemoryTtlCache};
use crate::config::{ClientConfig, HttpConfig, RetryConfig};
use crate::errors::ApiError;

pub const USER_AGENT: &str = concat!("rs-songwhip/", env!("CARGO_PKG_VERSION"));

/// Script tag the upstream embeds its page payload in.
const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

/// Boundary between transport and normalization: both calls resolve
/// to raw JSON or a failure. Implemented over HTTP below and by mocks
/// in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// POST `{url, country}` to the creation endpoint.
    async fn fetch_creation(&self, url: &str, country: &str) -> Result<Value, ApiError>;
    /// GET a page and return its embedded redux state object.
    async fn fetch_page(&self, path: &str) -> Result<Value, ApiError>;
}

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

fn build_client(http: &HttpConfig, proxy: Option<&Url>) -> Result<Client, ApiError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    let mut builder = client_helper(http)
        .default_headers(headers)
        .user_agent(USER_AGENT);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ApiError::Config(format!("proxy {proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| ApiError::Http(format!("build client: {e}")))
}

/// Simple function to generate a randomized wait for send_with_retry
fn generate_backoff(retry: &RetryConfig, attempt: u8, rng: &mut SmallRng) -> Duration {
    let base = retry.base_backoff.as_millis() as u64;
    let exp = (1_u64 << attempt.min(6)) * base;
    let jitter = if retry.jitter { rng.gen_range(50..=200) } else { 0 };
    Duration::from_millis(exp + jitter)
}

/// Sends with bounded retries on retryable statuses and transport
/// errors, then returns the final status and body; non-200 handling
/// stays with the caller so each flow can surface the original
/// status.
async fn send_with_retry(
    request: reqwest::RequestBuilder,
    retry: &RetryConfig,
) -> Result<(u16, String), ApiError> {
    let mut rng = SmallRng::from_entropy();
    let mut attempt: u8 = 0;
    loop {
        let response = request
            .try_clone()
            .ok_or_else(|| ApiError::Http("non-cloneable request".to_string()))?
            .send()
            .await;
        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                let retryable = retry.retryable_statuses.contains(&status);
                if !retryable || attempt + 1 >= retry.max_attempts {
                    return Ok((status, body));
                }
                let backoff = generate_backoff(retry, attempt, &mut rng);
                warn!(status = status, backoff_ms = backoff.as_millis() as u64, "fetch.retry");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt + 1 >= retry.max_attempts {
                    return Err(e.into());
                }
                let backoff = generate_backoff(retry, attempt, &mut rng);
                warn!(backoff_ms = backoff.as_millis() as u64, "fetch.retry.error");
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

/// Pulls the embedded JSON payload out of the page document and
/// returns its redux state object.
pub fn extract_redux_state(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(NEXT_DATA_SELECTOR).ok()?;
    let script = document.select(&selector).next()?;
    let raw = script.text().collect::<String>();
    let blob: Value = serde_json::from_str(&raw).ok()?;
    blob.get("props")?.get("initialReduxState").cloned()
}

pub struct HttpFetcher {
    api_url: Url,
    retry: RetryConfig,
    /// Egress candidates: one client per configured proxy, plus the
    /// direct client unless proxying is forced.
    egress: Vec<Client>,
    memory: Option<MemoryTtlCache>,
    disk: Option<DiskCache>,
}

impl HttpFetcher {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let mut egress = Vec::new();
        for proxy in &cfg.proxy.proxies {
            egress.push(build_client(&cfg.http, Some(proxy))?);
        }
        if egress.is_empty() || !cfg.proxy.force_proxy {
            egress.push(build_client(&cfg.http, None)?);
        }

        let memory = cfg
            .cache
            .enabled
            .then(|| MemoryTtlCache::new(cfg.cache.ttl, cfg.cache.max_entries));
        let disk = cfg
            .cache
            .enabled
            .then(|| DiskCache::new(&cfg.cache.dir, cfg.cache.ttl, cfg.cache.zstd_level));

        Ok(Self {
            api_url: cfg.api_url.clone(),
            retry: cfg.http.retry.clone(),
            egress,
            memory,
            disk,
        })
    }

    /// Uniform random pick per request; no stickiness, no health
    /// tracking, failed candidates stay in rotation.
    fn pick_client(&self) -> &Client {
        if self.egress.len() == 1 {
            return &self.egress[0];
        }
        let mut rng = SmallRng::from_entropy();
        &self.egress[rng.gen_range(0..self.egress.len())]
    }

    fn message_from(body: String) -> Option<String> {
        if body.trim().is_empty() { None } else { Some(body) }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_creation(&self, url: &str, country: &str) -> Result<Value, ApiError> {
        let key = format!("{}|url={url}|country={country}", self.api_url);
        if let Some(memory) = &self.memory {
            if let Some(hit) = memory.get(&key).await {
                debug!(url = %url, "fetch.creation.cache.hit");
                return Ok(hit);
            }
        }

        let request = self
            .pick_client()
            .post(self.api_url.clone())
            .json(&serde_json::json!({ "url": url, "country": country }));
        let (status, body) = send_with_retry(request, &self.retry).await?;

        let data: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let usable = data.as_object().map(|m| !m.is_empty()).unwrap_or(false);
        if status != 200 || !usable {
            return Err(ApiError::Status {
                status,
                message: Self::message_from(body),
            });
        }

        if let Some(memory) = &self.memory {
            memory.insert(key, data.clone()).await;
        }
        Ok(data)
    }

    async fn fetch_page(&self, path: &str) -> Result<Value, ApiError> {
        let url = self
            .api_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Config(format!("page path `{path}`: {e}")))?;
        let key = url.as_str().to_string();
        if let Some(disk) = &self.disk {
            if let Some(hit) = disk.get(&key) {
                debug!(path = %path, "fetch.page.cache.hit");
                return Ok(hit);
            }
        }

        let request = self.pick_client().get(url);
        let (status, body) = send_with_retry(request, &self.retry).await?;

        let state = match extract_redux_state(&body) {
            Some(state)
                if status == 200
                    && state.as_object().map(|m| !m.is_empty()).unwrap_or(false) =>
            {
                state
            }
            _ => {
                return Err(ApiError::Status {
                    status,
                    message: Some("embedded state payload missing".to_string()),
                });
            }
        };

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.put(&key, &state) {
                warn!(error = %e, "fetch.page.cache.write");
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use serde_json::json;

    const PAGE_HTML: &str = r#"<!DOCTYPE html>
        <html><head><title>x</title></head><body>
        <div id="app"></div>
        <script id="__NEXT_DATA__" type="application/json">
        {"props":{"initialReduxState":{"artists":{},"albums":{},"tracks":{}}},"page":"/[...path]"}
        </script>
        </body></html>"#;

    #[test]
    fn extracts_the_embedded_state_blob() {
        let state = extract_redux_state(PAGE_HTML).unwrap();
        assert_eq!(state, json!({"artists": {}, "albums": {}, "tracks": {}}));
    }

    #[test]
    fn documents_without_the_script_yield_none() {
        assert_eq!(extract_redux_state("<html><body>nope</body></html>"), None);
        let wrong_shape = r#"<html><body>
            <script id="__NEXT_DATA__">{"props":{}}</script>
        </body></html>"#;
        assert_eq!(extract_redux_state(wrong_shape), None);
    }

    #[test]
    fn backoff_grows_and_stays_jitter_bounded() {
        let retry = RetryConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let base = retry.base_backoff.as_millis() as u64;
        for attempt in 0..3_u8 {
            let wait = generate_backoff(&retry, attempt, &mut rng).as_millis() as u64;
            let exp = (1 << attempt) * base;
            assert!(wait >= exp + 50, "attempt {attempt}: {wait} < {}", exp + 50);
            assert!(wait <= exp + 200, "attempt {attempt}: {wait} > {}", exp + 200);
        }
    }

    #[test]
    fn egress_includes_direct_unless_forced() {
        let mut cfg = ClientConfig::default();
        cfg.proxy = ProxyConfig {
            proxies: vec![
                Url::parse("http://127.0.0.1:9050").unwrap(),
                Url::parse("http://127.0.0.1:9051").unwrap(),
            ],
            force_proxy: false,
        };
        let fetcher = HttpFetcher::new(&cfg).unwrap();
        assert_eq!(fetcher.egress.len(), 3);

        cfg.proxy.force_proxy = true;
        let fetcher = HttpFetcher::new(&cfg).unwrap();
        assert_eq!(fetcher.egress.len(), 2);

        cfg.proxy = ProxyConfig::default();
        let fetcher = HttpFetcher::new(&cfg).unwrap();
        assert_eq!(fetcher.egress.len(), 1);
    }

    #[test]
    fn user_agent_carries_the_crate_version() {
        assert!(USER_AGENT.starts_with("rs-songwhip/"));
    }
}
