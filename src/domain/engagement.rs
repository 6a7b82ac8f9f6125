//! Engagement estimation
//!
//! The source page does not expose a view count, so views are estimated
//! from likes with a fixed multiplier. This is a documented estimation
//! policy, not a measured value; downstream consumers should treat the
//! figure accordingly.

use serde::{Deserialize, Serialize};

/// Estimated views per like. No ground truth is available from the source
/// page, so this stays a policy constant rather than a tunable.
pub const VIEW_ESTIMATE_MULTIPLIER: f64 = 1.5;

/// Result of the engagement calculation for one post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementEstimate {
    /// Estimated view count, floor(likes × multiplier).
    pub estimated_views: u64,
    /// Engagement rate as a percentage; 0 when the view estimate is 0.
    pub rate_percent: f64,
}

/// Derive the estimated view count and engagement-rate percentage from raw
/// interaction counts.
///
/// Total for all inputs: the rate is finite and non-negative for every
/// combination of non-negative counts, and the zero-views case yields a
/// rate of 0 rather than a division error.
pub fn estimate_engagement(likes: u64, comments: u64, shares: u64) -> EngagementEstimate {
    let estimated_views = (likes as f64 * VIEW_ESTIMATE_MULTIPLIER).floor() as u64;

    let rate_percent = if estimated_views > 0 {
        (likes + comments + shares) as f64 / estimated_views as f64 * 100.0
    } else {
        0.0
    };

    EngagementEstimate {
        estimated_views,
        rate_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn estimates_views_and_rate() {
        let estimate = estimate_engagement(100, 10, 5);
        assert_eq!(estimate.estimated_views, 150);
        assert!((estimate.rate_percent - 76.666_666_666_666_67).abs() < 1e-6);
    }

    #[test]
    fn zero_inputs_produce_zero_rate() {
        let estimate = estimate_engagement(0, 0, 0);
        assert_eq!(estimate.estimated_views, 0);
        assert_eq!(estimate.rate_percent, 0.0);
    }

    #[test]
    fn odd_like_counts_floor_the_view_estimate() {
        assert_eq!(estimate_engagement(3, 0, 0).estimated_views, 4);
        assert_eq!(estimate_engagement(1, 0, 0).estimated_views, 1);
    }

    proptest! {
        #[test]
        fn rate_is_finite_and_non_negative(
            likes in 0u64..1_000_000_000,
            comments in 0u64..1_000_000_000,
            shares in 0u64..1_000_000_000,
        ) {
            let estimate = estimate_engagement(likes, comments, shares);
            prop_assert!(estimate.rate_percent.is_finite());
            prop_assert!(estimate.rate_percent >= 0.0);
        }
    }
}
