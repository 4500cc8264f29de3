//! HTTP client for the listing site's results pages.

mod user_agent;

use std::collections::HashMap;
use std::time::Duration;

use carlist_core::{AppConfig, DelayRange};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT,
};
use reqwest::{Client, Proxy};

use crate::acquisition::{PageKey, PageSource};
use crate::error::ScraperError;
use crate::proxy::ProxyPool;
use crate::rate_limit::{pause, retry_with_backoff};

use user_agent::random_user_agent;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_ZH: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Connection and throttling settings for [`ListingClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root without trailing slash, e.g. `https://www.che168.com`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total tries per page, including the first.
    pub max_attempts: u32,
    /// Sleep before every request, retries included.
    pub request_delay: DelayRange,
    /// Base retry backoff, multiplied by the attempt number.
    pub retry_backoff: DelayRange,
}

impl ClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.request_timeout_secs,
            max_attempts: config.max_attempts,
            request_delay: config.request_delay,
            retry_backoff: config.retry_backoff,
        }
    }
}

/// Fetches results pages, rotating user agents and proxies per request.
///
/// One `reqwest::Client` is built per proxy up front (reqwest binds proxies
/// at build time) plus one for direct connections.
pub struct ListingClient {
    direct: Client,
    proxied: HashMap<String, Client>,
    proxies: ProxyPool,
    config: ClientConfig,
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_ZH));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

impl ListingClient {
    /// Builds the direct client and one client per proxy in `proxies`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidProxy`] for a proxy entry reqwest cannot
    /// parse, or [`ScraperError::Http`] if a client cannot be constructed.
    pub fn new(config: ClientConfig, proxies: ProxyPool) -> Result<Self, ScraperError> {
        let builder = || {
            Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .default_headers(browser_headers())
        };

        let direct = builder().build()?;
        let mut proxied = HashMap::with_capacity(proxies.len());
        for entry in proxies.entries() {
            let proxy = Proxy::all(entry).map_err(|source| ScraperError::InvalidProxy {
                proxy: entry.clone(),
                source,
            })?;
            proxied.insert(entry.clone(), builder().proxy(proxy).build()?);
        }

        Ok(Self {
            direct,
            proxied,
            proxies,
            config,
        })
    }

    /// Results page URL: `{base}/{locale}/list/{category}?page={n}`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the result is not a valid URL.
    pub fn page_url(&self, key: &PageKey) -> Result<String, ScraperError> {
        build_page_url(&self.config.base_url, key)
    }

    /// The client for the next request: the next proxy in rotation, or the
    /// direct client when no proxies are configured.
    fn next_client(&self) -> (&Client, Option<&str>) {
        match self.proxies.next_proxy() {
            Some(proxy) => (
                self.proxied.get(proxy).unwrap_or(&self.direct),
                Some(proxy),
            ),
            None => (&self.direct, None),
        }
    }

    /// GETs `url` and returns the decoded body.
    ///
    /// Each attempt sleeps for the request delay, then picks a fresh user
    /// agent and proxy. Retriable failures are retried up to `max_attempts`
    /// times in total.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] for a non-2xx response.
    /// - [`ScraperError::EmptyBody`] for a blank 2xx body.
    /// - [`ScraperError::Http`] for network failures and timeouts.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let max_attempts = self.config.max_attempts;
        let backoff = self.config.retry_backoff;

        retry_with_backoff(max_attempts, backoff, |attempt| async move {
            pause(self.config.request_delay).await;

            let (client, proxy) = self.next_client();
            tracing::debug!(url, attempt, proxy = proxy.unwrap_or("direct"), "GET");

            let response = client
                .get(url)
                .header(USER_AGENT, random_user_agent())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let body = response.text().await?;
            if body.trim().is_empty() {
                return Err(ScraperError::EmptyBody {
                    url: url.to_owned(),
                });
            }
            Ok(body)
        })
        .await
    }
}

impl PageSource for ListingClient {
    async fn fetch_page(&mut self, key: &PageKey) -> Result<String, ScraperError> {
        let url = self.page_url(key)?;
        self.fetch_html(&url).await
    }
}

pub(crate) fn build_page_url(base_url: &str, key: &PageKey) -> Result<String, ScraperError> {
    let raw = format!(
        "{}/{}/list/{}",
        base_url.trim_end_matches('/'),
        key.locale,
        key.category
    );
    let mut url = reqwest::Url::parse(&raw).map_err(|e| ScraperError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("page", &key.page.to_string());
    Ok(url.to_string())
}
