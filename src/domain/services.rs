//! Capability traits the crawling core is written against
//!
//! The collector depends on these seams only: a page-navigation capability
//! (`PageDriver`), a session lifecycle (`SessionProvider`), and a record
//! sink (`PostSink`). Production implementations live in `infrastructure`;
//! tests substitute scripted fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::post::Post;

/// Errors surfaced by a `PageDriver` implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("timed out after {waited:?} waiting for '{selector}'")]
    WaitTimeout { selector: String, waited: Duration },

    #[error("no page has been loaded yet")]
    NoDocument,
}

/// Fatal errors for a collection run.
///
/// Everything else in the pipeline fails soft: missing metrics resolve to
/// defaults and broken posts are skipped. Only the structural failures
/// below abort the batch.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("profile post list did not appear after {attempts} attempts")]
    PageLoad {
        attempts: u32,
        #[source]
        source: DriverError,
    },

    #[error("profile navigation failed")]
    ProfileNavigation(#[source] DriverError),

    #[error("post link discovery failed")]
    LinkDiscovery(#[source] DriverError),

    #[error("failed to acquire a crawling session")]
    Session(#[source] anyhow::Error),
}

/// Text and attributes of a matched element, captured eagerly so no page
/// borrow outlives the lookup that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSnapshot {
    text: String,
    attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Visible text content of the element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute value, or `None` when the element does not carry it.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Page-navigation capability.
///
/// The core never talks to a concrete navigation engine; it drives this
/// surface and nothing else. `navigate` takes `&mut self` because loading a
/// page replaces the driver's current document, and a collection run owns
/// the driver exclusively for its whole duration.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and make it the current document.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// All elements currently matching `selector`, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError>;

    /// Wait (bounded by `timeout`) for an element matching `selector` to
    /// appear, returning the first match.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementSnapshot, DriverError>;
}

/// An exclusively-owned crawling session.
///
/// Ownership of the boxed driver is the exclusivity guarantee: while a
/// collect call borrows the handle mutably, no other component can navigate
/// the same session.
pub struct SessionHandle {
    id: Uuid,
    started_at: DateTime<Utc>,
    driver: Box<dyn PageDriver>,
}

impl SessionHandle {
    pub fn new(driver: Box<dyn PageDriver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            driver,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut dyn PageDriver {
        self.driver.as_mut()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Session lifecycle capability.
///
/// Owns how a navigation session comes into existence (user agent, cookie
/// reuse, rate limits) so the collector does not have to know. The
/// original host-specific bootstrap glue belongs behind this seam.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<SessionHandle>;

    async fn release(&self, handle: SessionHandle) -> anyhow::Result<()>;
}

/// Presentation adapter seam: receives each post record as soon as it is
/// constructed so rows can render incrementally.
#[async_trait]
pub trait PostSink: Send + Sync {
    async fn publish(&self, post: Post) -> anyhow::Result<()>;
}

/// A sink that buffers records in memory; used by the `Vec`-returning
/// convenience API and by tests.
#[derive(Default)]
pub struct BufferedSink {
    posts: std::sync::Mutex<Vec<Post>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the buffered records in emission order.
    pub fn take(&self) -> Vec<Post> {
        std::mem::take(&mut *self.posts.lock().expect("sink lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.posts.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PostSink for BufferedSink {
    async fn publish(&self, post: Post) -> anyhow::Result<()> {
        self.posts.lock().expect("sink lock poisoned").push(post);
        Ok(())
    }
}
