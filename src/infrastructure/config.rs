//! Configuration infrastructure
//!
//! Contains configuration loading and management for profile engagement
//! crawling.
//!
//! Configuration is organized into three tiers:
//! 1. User-configurable settings (exposed in UI)
//! 2. Hidden/Advanced settings (in config file only)
//! 3. Application-managed settings (auto-updated by app)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-configurable settings (exposed in UI)
    pub user: UserConfig,

    /// Hidden/Advanced settings (config file only)
    pub advanced: AdvancedConfig,

    /// Application-managed settings (auto-updated)
    pub app_managed: AppManagedConfig,
}

/// User-configurable settings that can be changed from the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Number of recent posts to analyze per run
    pub max_posts: u32,

    /// Engagement-rate threshold used by the presentation layer to flag
    /// rows; the collection math does not read it
    pub desired_engagement_rate: f64,

    /// Enable verbose logging
    pub verbose_logging: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Prefix for rotated log file names
    pub file_name_prefix: String,
}

/// CSS selectors for the page elements the pipeline reads.
///
/// Selector drift is the most common breakage for this kind of crawler, so
/// the selectors live in config instead of code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Post-list region on the profile page
    pub post_list: String,

    /// Anchor elements of individual posts inside the post list
    pub post_link: String,

    /// Like counter on a post page
    pub likes: String,

    /// Comment counter on a post page
    pub comments: String,

    /// Share counter on a post page
    pub shares: String,

    /// Post caption (best effort, may be absent)
    pub caption: String,

    /// Top-level comment texts on a post page
    pub comment_text: String,
}

/// Hidden/Advanced settings that are in config file but not exposed in UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// CSS selectors for page elements
    pub selectors: SelectorConfig,

    /// Profile URL template; `{username}` is replaced with the handle
    pub profile_url_template: String,

    /// Retry attempts per metric field
    pub field_retry_count: u32,

    /// Per-attempt element wait timeout for metric fields, seconds
    pub field_wait_timeout_seconds: u64,

    /// Delay between metric field retries, seconds
    pub field_retry_delay_seconds: u64,

    /// Retry attempts for the initial post-list wait
    pub post_list_retry_count: u32,

    /// Per-attempt wait timeout for the post-list region, seconds
    pub post_list_wait_timeout_seconds: u64,

    /// Delay between post-list wait retries, seconds
    pub post_list_retry_delay_seconds: u64,

    /// Settle pause after navigating to a post page, milliseconds
    pub post_settle_ms: u64,

    /// Courtesy jitter between post visits, milliseconds (min, max)
    pub iteration_jitter_ms: (u64, u64),

    /// Settle jitter before the first profile navigation, milliseconds
    /// (min, max)
    pub profile_settle_jitter_ms: (u64, u64),

    /// User agent sent with every request
    pub user_agent: String,

    /// Timeout for HTTP requests in seconds
    pub request_timeout_seconds: u64,

    /// Request budget per second for respectful crawling
    pub max_requests_per_second: u32,
}

/// Application-managed settings that are automatically updated by the app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppManagedConfig {
    /// Timestamp of the last completed run
    pub last_run_at: Option<DateTime<Utc>>,

    /// Profile analyzed by the last run
    pub last_profile: Option<String>,

    /// Configuration version for migration purposes
    pub config_version: u32,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            max_posts: defaults::MAX_POSTS,
            desired_engagement_rate: defaults::DESIRED_ENGAGEMENT_RATE,
            verbose_logging: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: false,
            file_name_prefix: defaults::LOG_FILE_PREFIX.to_string(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            post_list: r#"[data-e2e="user-post-item"]"#.to_string(),
            post_link: r#"[data-e2e="user-post-item"] a"#.to_string(),
            likes: r#"[data-e2e="like-count"]"#.to_string(),
            comments: r#"[data-e2e="comment-count"]"#.to_string(),
            shares: r#"[data-e2e="share-count"]"#.to_string(),
            caption: r#"[data-e2e="browse-video-desc"]"#.to_string(),
            comment_text: r#"[data-e2e="comment-level-1"]"#.to_string(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            profile_url_template: defaults::PROFILE_URL_TEMPLATE.to_string(),
            field_retry_count: defaults::FIELD_RETRY_COUNT,
            field_wait_timeout_seconds: defaults::FIELD_WAIT_TIMEOUT_SECONDS,
            field_retry_delay_seconds: defaults::FIELD_RETRY_DELAY_SECONDS,
            post_list_retry_count: defaults::POST_LIST_RETRY_COUNT,
            post_list_wait_timeout_seconds: defaults::POST_LIST_WAIT_TIMEOUT_SECONDS,
            post_list_retry_delay_seconds: defaults::POST_LIST_RETRY_DELAY_SECONDS,
            post_settle_ms: defaults::POST_SETTLE_MS,
            iteration_jitter_ms: defaults::ITERATION_JITTER_MS,
            profile_settle_jitter_ms: defaults::PROFILE_SETTLE_JITTER_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

/// Manages loading and saving the configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager over the platform default config location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self {
            config_path: config_dir.join("config.json"),
        })
    }

    /// Create a manager over an explicit config file path
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Get the platform configuration directory for the application
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("profile-pulse");

        Ok(config_dir)
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// First-run aware startup: create the default configuration when no
    /// file exists yet, otherwise load what is there.
    pub async fn initialize(&self) -> Result<AppConfig> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
                info!("✅ Created configuration directory: {:?}", parent);
            }
        }

        if !self.config_path.exists() {
            info!("🎉 First run detected - initializing default configuration");
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        self.load_config().await
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Configuration file not found, creating default: {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid configuration file: {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write configuration: {:?}", self.config_path))?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }
}

/// Default values for the configuration tiers
pub mod defaults {
    /// Posts analyzed per run unless the user asks otherwise
    pub const MAX_POSTS: u32 = 5;

    /// Display threshold for flagging well-performing posts, percent
    pub const DESIRED_ENGAGEMENT_RATE: f64 = 13.0;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_PREFIX: &str = "profile-pulse";

    pub const PROFILE_URL_TEMPLATE: &str = "https://www.tiktok.com/@{username}";

    pub const FIELD_RETRY_COUNT: u32 = 3;
    pub const FIELD_WAIT_TIMEOUT_SECONDS: u64 = 5;
    pub const FIELD_RETRY_DELAY_SECONDS: u64 = 1;

    pub const POST_LIST_RETRY_COUNT: u32 = 3;
    pub const POST_LIST_WAIT_TIMEOUT_SECONDS: u64 = 10;
    pub const POST_LIST_RETRY_DELAY_SECONDS: u64 = 2;

    /// Fixed pause after landing on a post page
    pub const POST_SETTLE_MS: u64 = 2_000;

    /// Courtesy jitter between post visits
    pub const ITERATION_JITTER_MS: (u64, u64) = (1_000, 2_000);

    /// Settle jitter before the first profile navigation
    pub const PROFILE_SETTLE_JITTER_MS: (u64, u64) = (2_000, 4_000);

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Request budget per second for respectful crawling
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
}
