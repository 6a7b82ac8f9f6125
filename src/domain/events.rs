//! Event types for real-time communication with the presentation layer
//!
//! This module defines the progress events emitted while a collection run
//! is in flight, so a frontend can update incrementally instead of waiting
//! for the whole batch.

use serde::{Deserialize, Serialize};

/// Progress event for one collection run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CollectionEvent {
    /// The post-list region loaded and links were harvested.
    #[serde(rename_all = "camelCase")]
    Started {
        profile_url: String,
        requested: u32,
        links_found: u32,
    },
    /// One post record was emitted to the sink.
    #[serde(rename_all = "camelCase")]
    PostCollected {
        index: u32,
        url: String,
        engagement_rate: f64,
    },
    /// One post was dropped by per-post isolation; the batch continues.
    #[serde(rename_all = "camelCase")]
    PostSkipped {
        index: u32,
        url: String,
        reason: String,
    },
    /// The run finished (normally or via cancellation).
    #[serde(rename_all = "camelCase")]
    Finished {
        collected: u32,
        skipped: u32,
        cancelled: bool,
    },
}

/// Callback a presentation layer registers to observe collection progress.
pub type EventObserver = dyn Fn(CollectionEvent) + Send + Sync;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tagged_camel_case() {
        let event = CollectionEvent::PostCollected {
            index: 1,
            url: "https://example.com/p/1".into(),
            engagement_rate: 12.5,
        };
        let json = serde_json::to_value(&event).expect("event serializes");

        assert_eq!(json["type"], "postCollected");
        assert_eq!(json["engagementRate"], 12.5);
    }
}
