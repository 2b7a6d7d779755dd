// REST API HTTP client.
// Handles base URL joining, cache-defeating headers and status checking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use reqwest::{
    Client, Response,
    header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA, USER_AGENT},
};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{FetchError, FetchResult, PostcacheError, Result, Resource};

use super::FetchMode;

/// Query parameter carrying the cache-busting stamp.
pub const CACHE_BUST_PARAM: &str = "_t";

/// HTTP client bound to one API base URL.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the configured API.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("postcache-tui"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(PostcacheError::Http)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        endpoint: &str,
        params: &[(&str, String)],
        mode: FetchMode,
    ) -> FetchResult<T> {
        let response = self.get(resource, endpoint, params, mode).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::decode(resource, e))
    }

    /// Make a GET request, applying the fetch mode.
    pub async fn get(
        &self,
        resource: Resource,
        endpoint: &str,
        params: &[(&str, String)],
        mode: FetchMode,
    ) -> FetchResult<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.get(&url).query(params);

        if let FetchMode::Bypass { stamp } = mode {
            request = request
                .headers(no_cache_headers())
                .query(&[(CACHE_BUST_PARAM, stamp.to_string())]);
        }

        tracing::debug!(%resource, %url, ?mode, "GET");
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(resource, e))?;

        check_response(resource, response)
    }
}

/// Headers that disable HTTP cache storage and force revalidation.
pub fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers
}

/// Check response status and convert failures.
fn check_response(resource: Resource, response: Response) -> FetchResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(%resource, url = %response.url(), %status, "request failed");
        Err(FetchError::status(resource, status.as_u16()))
    }
}

/// Source of `_t` stamps: wall-clock milliseconds, but never repeating or
/// going backwards.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicU64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_stamp(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_buster_is_strictly_increasing() {
        let buster = CacheBuster::new();
        let mut prev = buster.next_stamp();
        for _ in 0..1000 {
            let next = buster.next_stamp();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_no_cache_headers() {
        let headers = no_cache_headers();
        assert_eq!(
            headers.get(CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(EXPIRES).unwrap(), "0");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config {
            api_base_url: "http://localhost:3000/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
