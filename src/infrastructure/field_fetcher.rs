//! Bounded-retry retrieval of metric text from a post page
//!
//! One missing counter must never abort a post, so every failure path here
//! resolves to the default text "0": the element wait can time out on all
//! attempts, the selector can be broken by a page redesign, and the caller
//! still gets a parseable string back.

use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::services::PageDriver;
use crate::infrastructure::config::{AdvancedConfig, SelectorConfig};
use crate::infrastructure::retry::RetryPolicy;

/// Text returned when a metric cannot be read; parses to 0.
pub const DEFAULT_METRIC_TEXT: &str = "0";

/// Logical metric fields the pipeline extracts from a post page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Likes,
    Comments,
    Shares,
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricField::Likes => write!(f, "likes"),
            MetricField::Comments => write!(f, "comments"),
            MetricField::Shares => write!(f, "shares"),
        }
    }
}

/// A (logical field, locator) pair; stateless, built per call from the
/// selector configuration.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    pub field: MetricField,
    pub selector: String,
}

impl MetricQuery {
    /// Resolve the configured selector for a logical field.
    pub fn for_field(field: MetricField, selectors: &SelectorConfig) -> Self {
        let selector = match field {
            MetricField::Likes => selectors.likes.clone(),
            MetricField::Comments => selectors.comments.clone(),
            MetricField::Shares => selectors.shares.clone(),
        };
        Self { field, selector }
    }
}

/// Retrieves element text with a bounded retry budget and a default on
/// exhaustion.
#[derive(Debug, Clone, Copy)]
pub struct FieldFetcher {
    policy: RetryPolicy,
    wait_timeout: Duration,
}

impl FieldFetcher {
    pub fn new(max_attempts: u32, wait_timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            policy: RetryPolicy::new(max_attempts, retry_delay),
            wait_timeout,
        }
    }

    pub fn from_config(advanced: &AdvancedConfig) -> Self {
        Self::new(
            advanced.field_retry_count,
            Duration::from_secs(advanced.field_wait_timeout_seconds),
            Duration::from_secs(advanced.field_retry_delay_seconds),
        )
    }

    /// Fetch the text of the first element matching `selector`.
    ///
    /// Never fails: after the retry budget is exhausted the literal
    /// default "0" is returned instead of an error.
    pub async fn fetch(&self, driver: &dyn PageDriver, selector: &str) -> String {
        let result = self
            .policy
            .run(|_attempt| {
                let driver = driver;
                async move { driver.wait_for(selector, self.wait_timeout).await }
            })
            .await;

        match result {
            Ok(element) => element.text().to_string(),
            Err(exhausted) => {
                warn!(
                    "Metric lookup '{}' exhausted {} attempts ({}), using default",
                    selector, exhausted.attempts, exhausted.last_error
                );
                DEFAULT_METRIC_TEXT.to_string()
            }
        }
    }

    /// Fetch the raw display text for a logical metric field.
    pub async fn fetch_metric(&self, driver: &dyn PageDriver, query: &MetricQuery) -> String {
        let raw = self.fetch(driver, &query.selector).await;
        debug!("Fetched {} counter: '{}'", query.field, raw);
        raw
    }
}
