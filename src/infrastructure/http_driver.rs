//! HTTP-backed page driver
//!
//! Production implementation of the `PageDriver` capability over plain
//! HTTP: navigation fetches the page body with a rate-limited, cookie
//! reusing client, and element lookups run compiled CSS selectors against
//! the fetched document. Element data is snapshotted eagerly so no parsed
//! document is held across an await point.
//!
//! A fetched document is static, so `wait_for` amounts to bounded
//! re-selection until the timeout elapses. Live-page drivers implementing
//! the same trait get genuine wait semantics; the collection pipeline is
//! written against the trait contract, not this implementation.

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::Client;
use scraper::{Html, Selector};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use anyhow::{Context, Result};

use crate::domain::services::{DriverError, ElementSnapshot, PageDriver};
use crate::infrastructure::config::{AdvancedConfig, defaults};

/// HTTP driver configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpDriverConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl Default for HttpDriverConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl HttpDriverConfig {
    pub fn from_advanced(advanced: &AdvancedConfig) -> Self {
        Self {
            user_agent: advanced.user_agent.clone(),
            timeout_seconds: advanced.request_timeout_seconds,
            max_requests_per_second: advanced.max_requests_per_second,
        }
    }
}

struct CurrentPage {
    url: Url,
    body: String,
}

/// `PageDriver` over reqwest + scraper with respectful rate limiting.
pub struct HttpPageDriver {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    poll_interval: Duration,
    current: Option<CurrentPage>,
}

impl HttpPageDriver {
    /// Create a new driver with the given configuration.
    pub fn new(config: HttpDriverConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            poll_interval: Duration::from_millis(250),
            current: None,
        })
    }

    /// URL of the currently loaded document, if any.
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    /// Run `selector` against a document body and snapshot every match in
    /// document order. Synchronous on purpose: parsed documents must not
    /// cross await points.
    fn select_snapshots(body: &str, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        let compiled = Selector::parse(selector).map_err(|e| DriverError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        let document = Html::parse_document(body);
        let snapshots = document
            .select(&compiled)
            .map(|element| {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

                let mut snapshot = ElementSnapshot::new(normalized);
                for (name, value) in element.value().attrs() {
                    snapshot = snapshot.with_attribute(name, value);
                }
                snapshot
            })
            .collect();

        Ok(snapshots)
    }

    fn current_body(&self) -> Result<&str, DriverError> {
        self.current
            .as_ref()
            .map(|page| page.body.as_str())
            .ok_or(DriverError::NoDocument)
    }

    #[cfg(test)]
    pub(crate) fn load_fixture(&mut self, url: &str, body: &str) {
        self.current = Some(CurrentPage {
            url: Url::parse(url).expect("fixture url is valid"),
            body: body.to_string(),
        });
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let parsed = Url::parse(url).map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            reason: format!("invalid URL: {e}"),
        })?;

        self.rate_limiter.until_ready().await;
        info!("Fetching URL: {}", url);

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        debug!("Fetched {} ({} chars)", url, body.len());
        self.current = Some(CurrentPage { url: parsed, body });
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        let body = self.current_body()?;
        Self::select_snapshots(body, selector)
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementSnapshot, DriverError> {
        let start = Instant::now();

        loop {
            let found = {
                let body = self.current_body()?;
                Self::select_snapshots(body, selector)?.into_iter().next()
            };

            if let Some(element) = found {
                return Ok(element);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(DriverError::WaitTimeout {
                    selector: selector.to_string(),
                    waited: elapsed,
                });
            }

            let remaining = timeout - elapsed;
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_FIXTURE: &str = r#"
        <html><body>
          <div data-e2e="user-post-item"><a href="/@user/video/1">one</a></div>
          <div data-e2e="user-post-item"><a href="/@user/video/2">two</a></div>
          <div data-e2e="user-post-item"><a>no link</a></div>
        </body></html>
    "#;

    fn fixture_driver() -> HttpPageDriver {
        let mut driver =
            HttpPageDriver::new(HttpDriverConfig::default()).expect("driver builds");
        driver.load_fixture("https://www.tiktok.com/@user", PROFILE_FIXTURE);
        driver
    }

    #[tokio::test]
    async fn selects_elements_in_document_order_with_attributes() {
        let driver = fixture_driver();
        let links = driver
            .find_elements(r#"[data-e2e="user-post-item"] a"#)
            .await
            .expect("selection succeeds");

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].attribute("href"), Some("/@user/video/1"));
        assert_eq!(links[1].attribute("href"), Some("/@user/video/2"));
        assert_eq!(links[2].attribute("href"), None);
    }

    #[tokio::test]
    async fn snapshot_text_is_whitespace_normalized() {
        let mut driver =
            HttpPageDriver::new(HttpDriverConfig::default()).expect("driver builds");
        driver.load_fixture(
            "https://example.com/p/1",
            r#"<html><body><strong data-e2e="like-count">
                12.3K
            </strong></body></html>"#,
        );

        let element = driver
            .wait_for(r#"[data-e2e="like-count"]"#, Duration::from_millis(50))
            .await
            .expect("element is present");

        assert_eq!(element.text(), "12.3K");
    }

    #[tokio::test]
    async fn wait_for_times_out_on_missing_element() {
        let driver = fixture_driver();
        let result = driver
            .wait_for(".never-there", Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(DriverError::WaitTimeout { .. })));
    }

    #[tokio::test]
    async fn invalid_selector_is_reported_not_retried() {
        let driver = fixture_driver();
        let result = driver.find_elements(":::").await;

        assert!(matches!(result, Err(DriverError::InvalidSelector { .. })));
    }

    #[tokio::test]
    async fn lookups_before_navigation_report_no_document() {
        let driver = HttpPageDriver::new(HttpDriverConfig::default()).expect("driver builds");
        let result = driver.find_elements("a").await;

        assert!(matches!(result, Err(DriverError::NoDocument)));
    }
}
