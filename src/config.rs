//!
//! src/config.rs
//!
//! Client configuration: API endpoint, HTTP tuning, retries, egress
//! proxies, caching and logging. Everything has a usable default;
//! `load_config` overlays SONGWHIP_* environment variables on top.
//!

use serde::Deserialize;
use std::time;
use url::Url;

use crate::errors::ApiError;

/// Constants for HTTP config
pub const HTTP_TIMEOUT: u64 = 60_000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2_000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90_000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const RETRY_MAX_ATTEMPTS: u8 = 3;
pub const RETRY_BASE_BACKOFF: u64 = 250;
pub const RETRY_JITTER: bool = true;
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

pub const DEFAULT_API_URL: &str = "https://songwhip.com/";
pub const DEFAULT_COUNTRY: &str = "US";

pub const CACHE_TTL_SECS: u64 = 900;
pub const CACHE_TTL_MAX_SECS: u64 = 31 * 24 * 3600;
pub const CACHE_MAX_ENTRIES: usize = 1024;
pub const CACHE_DIR: &str = "./data/http-cache";
pub const CACHE_ZSTD_LEVEL: i32 = 3;

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn env_to_uint(s: &str, default: u64) -> u64 {
    match std::env::var(s) {
        Ok(v) => v.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_to_bool(s: &str, default: bool) -> bool {
    match std::env::var(s) {
        Ok(v) => matches!(v.trim(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

///
/// Configuration for HTTP timeouts, retries, etc.
///
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u8,
    pub base_backoff: time::Duration,
    pub jitter: bool,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_backoff: time::Duration::from_millis(RETRY_BASE_BACKOFF),
            jitter: RETRY_JITTER,
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            retry: RetryConfig::default(),
        }
    }
}

///
/// Configuration for egress proxies. Selection is a uniform random
/// choice per request with no stickiness and no health tracking; with
/// `force_proxy` unset the direct connection is one candidate among
/// the proxies.
///
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub proxies: Vec<Url>,
    pub force_proxy: bool,
}

fn build_proxy() -> Result<ProxyConfig, ApiError> {
    let proxies = match std::env::var("SONGWHIP_PROXIES") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Url::parse(s)
                    .map_err(|e| ApiError::Config(format!("SONGWHIP_PROXIES entry `{s}` invalid: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };
    let force_proxy = env_to_bool("SONGWHIP_FORCE_PROXY", false);
    if force_proxy && proxies.is_empty() {
        return Err(ApiError::Config(
            "SONGWHIP_FORCE_PROXY set with no SONGWHIP_PROXIES".to_string(),
        ));
    }
    Ok(ProxyConfig { proxies, force_proxy })
}

///
/// Configuration for the response caches (in-memory for the creation
/// flow, on-disk for page payloads)
///
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: time::Duration,
    pub max_entries: usize,
    pub dir: String,
    pub zstd_level: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: time::Duration::from_secs(CACHE_TTL_SECS),
            max_entries: CACHE_MAX_ENTRIES,
            dir: CACHE_DIR.to_string(),
            zstd_level: CACHE_ZSTD_LEVEL,
        }
    }
}

fn build_cache() -> CacheConfig {
    let enabled = env_to_bool("SONGWHIP_CACHE", true);
    let ttl = env_to_uint("SONGWHIP_CACHE_TTL_SECS", CACHE_TTL_SECS).min(CACHE_TTL_MAX_SECS);
    let max_entries = env_to_uint("SONGWHIP_CACHE_MAX_ENTRIES", CACHE_MAX_ENTRIES as u64);
    let dir = std::env::var("SONGWHIP_CACHE_DIR").unwrap_or_else(|_| CACHE_DIR.to_string());
    CacheConfig {
        enabled,
        ttl: time::Duration::from_secs(ttl),
        max_entries: max_entries as usize,
        dir,
        zstd_level: CACHE_ZSTD_LEVEL,
    }
}

///
/// Configuration for logger
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,rs_songwhip=debug,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true,
        }
    }
}

///
/// ClientConfig holds everything the client and fetcher need
///
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub default_country: String,
    pub http: HttpConfig,
    pub proxy: ProxyConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url"),
            default_country: DEFAULT_COUNTRY.to_string(),
            http: HttpConfig::default(),
            proxy: ProxyConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn build_api_url() -> Result<Url, ApiError> {
    let raw = std::env::var("SONGWHIP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    let mut api_url = Url::parse(&raw)
        .map_err(|e| ApiError::Config(format!("SONGWHIP_API_URL invalid: {e}")))?;

    ensure_https(&api_url).map_err(ApiError::Config)?;

    // ensure trailing slash so joins keep the base path
    if !api_url.path().ends_with('/') {
        let mut path = api_url.path().to_string();
        path.push('/');
        api_url.set_path(&path);
    }

    Ok(api_url)
}

///
/// Return the full configuration to the caller at program start.
///
pub fn load_config() -> Result<ClientConfig, ApiError> {
    dotenvy::dotenv().ok();

    let api_url = build_api_url()?;
    let default_country = std::env::var("SONGWHIP_COUNTRY")
        .unwrap_or_else(|_| DEFAULT_COUNTRY.to_string())
        .trim()
        .to_uppercase();
    let http = HttpConfig {
        timeout: time::Duration::from_millis(env_to_uint("SONGWHIP_TIMEOUT_MS", HTTP_TIMEOUT)),
        ..HttpConfig::default()
    };
    let proxy = build_proxy()?;
    let cache = build_cache();
    let logging = LoggingConfig::default();

    Ok(ClientConfig {
        api_url,
        default_country,
        http,
        proxy,
        cache,
        logging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_url_parses_with_trailing_slash() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_url.as_str(), "https://songwhip.com/");
        assert_eq!(cfg.default_country, "US");
    }

    #[test]
    fn https_is_enforced() {
        let url = Url::parse("http://songwhip.com/").unwrap();
        assert!(ensure_https(&url).is_err());
        let url = Url::parse("https://songwhip.com/").unwrap();
        assert!(ensure_https(&url).is_ok());
    }

    #[test]
    fn unset_env_vars_fall_back_to_defaults() {
        assert_eq!(env_to_uint("SONGWHIP_TEST_UNSET_UINT", 42), 42);
        assert!(env_to_bool("SONGWHIP_TEST_UNSET_BOOL", true));
        assert!(!env_to_bool("SONGWHIP_TEST_UNSET_BOOL", false));
    }
}
