//! Infrastructure layer for navigation, retries, configuration, and logging
//!
//! This module provides the production page driver, session management, the
//! bounded-retry field fetcher, the post collection engine, and the
//! configuration/logging plumbing behind the domain capability traits.

pub mod config;  // Three-tier application configuration
pub mod field_fetcher;  // Bounded-retry metric text retrieval
pub mod http_driver;  // reqwest + scraper PageDriver implementation
pub mod logging;  // Logging infrastructure
pub mod post_collector;  // Profile collection engine
pub mod retry;  // Shared retry policy primitive
pub mod session;  // Session provider implementations

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use field_fetcher::{FieldFetcher, MetricField, MetricQuery};
pub use http_driver::{HttpDriverConfig, HttpPageDriver};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use post_collector::ProfilePostCollector;
pub use retry::{Exhausted, RetryPolicy};
pub use session::HttpSessionProvider;
