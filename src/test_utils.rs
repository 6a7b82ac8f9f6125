//! Test utilities for profile-pulse
//!
//! Provides scripted fakes for the capability traits so the pipeline can
//! be exercised without a network: a page driver that serves pre-scripted
//! elements per selector, a session provider over it, and a configuration
//! preset with all waits zeroed for fast tests.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::services::{
    DriverError, ElementSnapshot, PageDriver, SessionHandle, SessionProvider,
};
use crate::infrastructure::config::{AdvancedConfig, SelectorConfig};

/// Default configuration with every wait, delay, and jitter zeroed so test
/// runs do not sleep.
pub fn fast_test_config() -> AdvancedConfig {
    AdvancedConfig {
        field_wait_timeout_seconds: 0,
        field_retry_delay_seconds: 0,
        post_list_wait_timeout_seconds: 0,
        post_list_retry_delay_seconds: 0,
        post_settle_ms: 0,
        iteration_jitter_ms: (0, 0),
        profile_settle_jitter_ms: (0, 0),
        ..AdvancedConfig::default()
    }
}

/// One scripted page: a selector to elements mapping.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, selector: impl Into<String>, element: ElementSnapshot) -> Self {
        self.with_elements(selector, vec![element])
    }

    pub fn with_elements(
        mut self,
        selector: impl Into<String>,
        mut elements: Vec<ElementSnapshot>,
    ) -> Self {
        self.elements
            .entry(selector.into())
            .or_default()
            .append(&mut elements);
        self
    }

    fn select(&self, selector: &str) -> Vec<ElementSnapshot> {
        self.elements.get(selector).cloned().unwrap_or_default()
    }
}

/// Build a profile page exposing the default post-list region with one
/// anchor per entry; `None` entries produce anchors without an href.
pub fn profile_page<S: AsRef<str>>(hrefs: &[Option<S>]) -> ScriptedPage {
    let selectors = SelectorConfig::default();

    let anchors = hrefs
        .iter()
        .map(|href| match href {
            Some(href) => ElementSnapshot::new("post").with_attribute("href", href.as_ref()),
            None => ElementSnapshot::new("post"),
        })
        .collect();

    ScriptedPage::new()
        .with_element(&selectors.post_list, ElementSnapshot::new("post list"))
        .with_elements(&selectors.post_link, anchors)
}

/// Build a post page exposing the default metric counters.
pub fn post_page(likes: &str, comments: &str, shares: &str) -> ScriptedPage {
    let selectors = SelectorConfig::default();

    ScriptedPage::new()
        .with_element(&selectors.likes, ElementSnapshot::new(likes))
        .with_element(&selectors.comments, ElementSnapshot::new(comments))
        .with_element(&selectors.shares, ElementSnapshot::new(shares))
}

/// Scripted `PageDriver` fake.
///
/// Serves pre-registered pages by URL, records every navigation, and
/// counts `wait_for` attempts per selector so tests can assert retry
/// budgets precisely.
#[derive(Debug, Default)]
pub struct ScriptedPageDriver {
    pages: HashMap<String, ScriptedPage>,
    failing_urls: HashSet<String>,
    current: Mutex<Option<String>>,
    navigations: Mutex<Vec<String>>,
    wait_attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedPageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: ScriptedPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Make navigation to `url` fail, simulating a broken post.
    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .expect("navigation log poisoned")
            .clone()
    }

    /// How many `wait_for` attempts ran against `selector`.
    pub fn wait_attempts(&self, selector: &str) -> u32 {
        self.wait_attempts
            .lock()
            .expect("wait log poisoned")
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    fn current_page(&self) -> Result<ScriptedPage, DriverError> {
        let current = self.current.lock().expect("current page poisoned");
        let url = current.as_ref().ok_or(DriverError::NoDocument)?;
        self.pages
            .get(url)
            .cloned()
            .ok_or(DriverError::NoDocument)
    }
}

#[async_trait]
impl PageDriver for ScriptedPageDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigations
            .lock()
            .expect("navigation log poisoned")
            .push(url.to_string());

        if self.failing_urls.contains(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "scripted navigation failure".to_string(),
            });
        }
        if !self.pages.contains_key(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "no page scripted for URL".to_string(),
            });
        }

        *self.current.lock().expect("current page poisoned") = Some(url.to_string());
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        Ok(self.current_page()?.select(selector))
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementSnapshot, DriverError> {
        *self
            .wait_attempts
            .lock()
            .expect("wait log poisoned")
            .entry(selector.to_string())
            .or_insert(0) += 1;

        self.current_page()?
            .select(selector)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::WaitTimeout {
                selector: selector.to_string(),
                waited: timeout,
            })
    }
}

/// Session provider handing out one pre-built scripted driver.
pub struct ScriptedSessionProvider {
    driver: Mutex<Option<ScriptedPageDriver>>,
}

impl ScriptedSessionProvider {
    pub fn new(driver: ScriptedPageDriver) -> Self {
        Self {
            driver: Mutex::new(Some(driver)),
        }
    }
}

#[async_trait]
impl SessionProvider for ScriptedSessionProvider {
    async fn acquire(&self) -> anyhow::Result<SessionHandle> {
        let driver = self
            .driver
            .lock()
            .expect("scripted driver poisoned")
            .take()
            .ok_or_else(|| anyhow!("scripted session already acquired"))?;
        Ok(SessionHandle::new(Box::new(driver)))
    }

    async fn release(&self, _handle: SessionHandle) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Session provider whose acquisition always fails.
pub struct FailingSessionProvider;

#[async_trait]
impl SessionProvider for FailingSessionProvider {
    async fn acquire(&self) -> anyhow::Result<SessionHandle> {
        Err(anyhow!("session bootstrap unavailable"))
    }

    async fn release(&self, _handle: SessionHandle) -> anyhow::Result<()> {
        Ok(())
    }
}
