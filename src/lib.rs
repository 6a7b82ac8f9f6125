//! Profile Pulse - Social Profile Engagement Crawling and Analysis
//!
//! This crate provides the crawling core for a profile engagement analyzer:
//! it visits a social profile, walks its most recent posts, extracts
//! like/comment/share counts, derives an estimated view count and an
//! engagement rate, and streams normalized post records to a presentation
//! sink. The desktop frontend consumes the records through the `PostSink`
//! and `CollectionEvent` surfaces; it is not part of this crate.

// Module declarations
pub mod domain;
pub mod infrastructure;
pub mod test_utils;

// Re-export the public surface for easier access
pub use domain::engagement::{EngagementEstimate, estimate_engagement};
pub use domain::events::CollectionEvent;
pub use domain::metrics::parse_display_count;
pub use domain::post::{CollectionSummary, Post};
pub use domain::services::{
    BufferedSink, CollectError, DriverError, ElementSnapshot, PageDriver, PostSink,
    SessionHandle, SessionProvider,
};
pub use infrastructure::config::{AppConfig, ConfigManager};
pub use infrastructure::post_collector::ProfilePostCollector;
pub use infrastructure::session::HttpSessionProvider;
