//! Post record types
//!
//! The unit of output for a collection run. One `Post` is produced per
//! successfully visited post page and handed to the presentation sink
//! immediately, so a frontend can render rows incrementally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::engagement::estimate_engagement;

/// Normalized engagement record for a single post.
///
/// Immutable after construction except `comments_data`, which is filled
/// lazily when a caller requests comment detail for the post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub url: String,
    /// Post caption; empty when the page does not expose one.
    pub caption: String,
    /// Estimated view count (floor(likes × 1.5)); not a measured value.
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// Always 0: the source page does not expose save counts publicly.
    pub saves: u64,
    pub shares: u64,
    /// (likes + comments + shares) / views × 100, or 0 when views is 0.
    #[serde(rename = "engagementRate")]
    pub engagement_rate: f64,
    /// Comment texts, empty until populated by a comment-detail pass.
    #[serde(rename = "commentsData")]
    pub comments_data: Vec<String>,
    #[serde(rename = "collectedAt")]
    pub collected_at: DateTime<Utc>,
}

impl Post {
    /// Build a record from the raw counts extracted off a post page.
    ///
    /// Derives views and the engagement rate so the invariants between the
    /// fields hold by construction.
    pub fn from_raw_counts(
        url: impl Into<String>,
        caption: impl Into<String>,
        likes: u64,
        comments: u64,
        shares: u64,
    ) -> Self {
        let estimate = estimate_engagement(likes, comments, shares);

        Self {
            url: url.into(),
            caption: caption.into(),
            views: estimate.estimated_views,
            likes,
            comments,
            saves: 0,
            shares,
            engagement_rate: estimate.rate_percent,
            comments_data: Vec::new(),
            collected_at: Utc::now(),
        }
    }

    /// Attach comment texts fetched by a later comment-detail pass.
    pub fn attach_comments(&mut self, comments: Vec<String>) {
        self.comments_data = comments;
    }

    /// Sum of the directly observed interaction counts.
    pub fn total_interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }

    /// Whether the post clears the display threshold the user configured.
    pub fn meets_rate(&self, threshold_percent: f64) -> bool {
        self.engagement_rate >= threshold_percent
    }
}

/// Outcome report for one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Post count the caller asked for.
    pub requested: u32,
    /// Records actually emitted to the sink.
    pub collected: u32,
    /// Posts dropped by per-post isolation.
    pub skipped: u32,
    /// True when the run stopped early on a cancellation request.
    pub cancelled: bool,
    pub elapsed: Duration,
}
