//! Profile collection engine
//!
//! Drives one collection run end to end: open the profile, wait for the
//! post list, harvest post links in page order, then visit each post
//! sequentially, extract its counters, and emit a normalized record
//! immediately so the presentation layer can render incrementally.
//!
//! Failure policy follows three tiers: a missing post list is fatal, a
//! broken post is skipped, and a missing counter resolves to 0. Posts are
//! visited strictly one at a time with courtesy jitter between visits;
//! parallel tabs would multiply detection risk and break session-cookie
//! consistency.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::events::{CollectionEvent, EventObserver};
use crate::domain::metrics::parse_display_count_whole;
use crate::domain::post::{CollectionSummary, Post};
use crate::domain::services::{
    BufferedSink, CollectError, DriverError, PageDriver, PostSink, SessionHandle,
    SessionProvider,
};
use crate::infrastructure::config::AdvancedConfig;
use crate::infrastructure::field_fetcher::{FieldFetcher, MetricField, MetricQuery};
use crate::infrastructure::retry::RetryPolicy;

/// Sequential post collection over an exclusively-owned session.
pub struct ProfilePostCollector {
    advanced: AdvancedConfig,
    fetcher: FieldFetcher,
    observer: Option<Box<EventObserver>>,
    cancel: CancellationToken,
}

impl ProfilePostCollector {
    pub fn new(advanced: AdvancedConfig) -> Self {
        let fetcher = FieldFetcher::from_config(&advanced);
        Self {
            advanced,
            fetcher,
            observer: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Register a progress observer for incremental UI updates.
    pub fn with_observer(
        mut self,
        observer: impl Fn(CollectionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Token a caller can clone to request a cooperative stop. The stop
    /// takes effect between posts; a post in flight always completes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Build the profile URL for a handle. Full URLs pass through, bare
    /// handles go through the configured template (with or without `@`).
    pub fn profile_url(&self, profile: &str) -> String {
        if profile.starts_with("http://") || profile.starts_with("https://") {
            profile.to_string()
        } else {
            self.advanced
                .profile_url_template
                .replace("{username}", profile.trim().trim_start_matches('@'))
        }
    }

    /// Collect up to `limit` posts, buffering them into a `Vec`.
    pub async fn collect_to_vec(
        &self,
        session: &mut SessionHandle,
        profile: &str,
        limit: u32,
    ) -> Result<(Vec<Post>, CollectionSummary), CollectError> {
        let sink = BufferedSink::new();
        let summary = self.collect_into(session, profile, limit, &sink).await?;
        Ok((sink.take(), summary))
    }

    /// Collect up to `limit` posts, emitting each record to `sink` the
    /// moment it is constructed.
    pub async fn collect_into(
        &self,
        session: &mut SessionHandle,
        profile: &str,
        limit: u32,
        sink: &dyn PostSink,
    ) -> Result<CollectionSummary, CollectError> {
        let started = Instant::now();
        let profile_url = self.profile_url(profile);
        info!(
            "🚀 Starting collection for {} (up to {} posts)",
            profile_url, limit
        );

        // Courtesy settle before the first navigation.
        self.pause_range(self.advanced.profile_settle_jitter_ms).await;

        session
            .driver_mut()
            .navigate(&profile_url)
            .await
            .map_err(CollectError::ProfileNavigation)?;

        self.wait_for_post_list(session.driver()).await?;

        let links = self
            .harvest_links(session.driver(), &profile_url, limit)
            .await?;
        info!("📋 Found {} post links (requested {})", links.len(), limit);
        self.emit(CollectionEvent::Started {
            profile_url: profile_url.clone(),
            requested: limit,
            links_found: links.len() as u32,
        });

        let mut collected = 0u32;
        let mut skipped = 0u32;
        let mut cancelled = false;

        for (index, link) in links.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("🛑 Cancellation requested, stopping after {} posts", collected);
                cancelled = true;
                break;
            }

            if index > 0 {
                // Anti-bot courtesy pause, not a correctness wait.
                self.pause_range(self.advanced.iteration_jitter_ms).await;
            }

            let position = index as u32 + 1;
            match self.collect_single(session, link).await {
                Ok(post) => {
                    let engagement_rate = post.engagement_rate;
                    if let Err(e) = sink.publish(post).await {
                        warn!("Sink rejected post {} ({}): {:#}", position, link, e);
                        skipped += 1;
                        self.emit(CollectionEvent::PostSkipped {
                            index: position,
                            url: link.clone(),
                            reason: format!("sink error: {e:#}"),
                        });
                        continue;
                    }

                    collected += 1;
                    self.emit(CollectionEvent::PostCollected {
                        index: position,
                        url: link.clone(),
                        engagement_rate,
                    });
                }
                Err(e) => {
                    // Per-post isolation: log, report, move on.
                    warn!("Error analyzing post {} ({}): {}", position, link, e);
                    skipped += 1;
                    self.emit(CollectionEvent::PostSkipped {
                        index: position,
                        url: link.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let summary = CollectionSummary {
            requested: limit,
            collected,
            skipped,
            cancelled,
            elapsed: started.elapsed(),
        };
        info!(
            "✅ Collection finished: {} collected, {} skipped in {:?}",
            collected, skipped, summary.elapsed
        );
        self.emit(CollectionEvent::Finished {
            collected,
            skipped,
            cancelled,
        });

        Ok(summary)
    }

    /// Full run over a provider-managed session: acquire, collect, release.
    ///
    /// The session is released even when collection fails; a release
    /// failure is logged rather than masking the collection outcome.
    pub async fn collect_with_provider(
        &self,
        provider: &dyn SessionProvider,
        profile: &str,
        limit: u32,
        sink: &dyn PostSink,
    ) -> Result<CollectionSummary, CollectError> {
        let mut session = provider.acquire().await.map_err(CollectError::Session)?;

        let result = self.collect_into(&mut session, profile, limit, sink).await;

        if let Err(e) = provider.release(session).await {
            warn!("Session release failed: {:#}", e);
        }
        result
    }

    /// Fetch comment texts for a post, best effort. Failures resolve to an
    /// empty list; comment detail is never worth aborting for.
    pub async fn fetch_comments(
        &self,
        session: &mut SessionHandle,
        post_url: &str,
        limit: usize,
    ) -> Vec<String> {
        if let Err(e) = session.driver_mut().navigate(post_url).await {
            warn!("Comment fetch navigation failed for {}: {}", post_url, e);
            return Vec::new();
        }
        self.settle_on_post().await;

        match session
            .driver()
            .find_elements(&self.advanced.selectors.comment_text)
            .await
        {
            Ok(elements) => elements
                .into_iter()
                .take(limit)
                .map(|e| e.text().to_string())
                .filter(|text| !text.is_empty())
                .collect(),
            Err(e) => {
                warn!("Comment lookup failed for {}: {}", post_url, e);
                Vec::new()
            }
        }
    }

    /// The one wait that is allowed to kill the run: without the post list
    /// nothing downstream can proceed.
    async fn wait_for_post_list(&self, driver: &dyn PageDriver) -> Result<(), CollectError> {
        let policy = RetryPolicy::new(
            self.advanced.post_list_retry_count,
            Duration::from_secs(self.advanced.post_list_retry_delay_seconds),
        );
        let wait_timeout = Duration::from_secs(self.advanced.post_list_wait_timeout_seconds);
        let selector = self.advanced.selectors.post_list.as_str();

        policy
            .run(|attempt| {
                let driver = driver;
                async move {
                    debug!("Waiting for post list (attempt {})", attempt);
                    driver.wait_for(selector, wait_timeout).await
                }
            })
            .await
            .map(|_| ())
            .map_err(|e| CollectError::PageLoad {
                attempts: e.attempts,
                source: e.last_error,
            })
    }

    /// Harvest up to `limit` post links in page order, skipping anchors
    /// whose href cannot be read or resolved.
    async fn harvest_links(
        &self,
        driver: &dyn PageDriver,
        base_url: &str,
        limit: u32,
    ) -> Result<Vec<String>, CollectError> {
        let elements = driver
            .find_elements(&self.advanced.selectors.post_link)
            .await
            .map_err(CollectError::LinkDiscovery)?;

        let base = Url::parse(base_url).ok();
        let mut links: Vec<String> = Vec::new();

        for element in elements {
            if links.len() as u32 >= limit {
                break;
            }

            let Some(href) = element.attribute("href") else {
                debug!("Skipping post link without href attribute");
                continue;
            };

            let resolved = match base.as_ref() {
                Some(base) => base.join(href).map(|u| u.to_string()).ok(),
                None => Url::parse(href).map(|u| u.to_string()).ok(),
            };

            match resolved {
                Some(url) => links.push(url),
                None => warn!("Skipping unresolvable post link '{}'", href),
            }
        }

        Ok(links)
    }

    async fn collect_single(
        &self,
        session: &mut SessionHandle,
        url: &str,
    ) -> Result<Post, DriverError> {
        session.driver_mut().navigate(url).await?;
        self.settle_on_post().await;

        let driver = session.driver();
        let selectors = &self.advanced.selectors;

        let likes_raw = self
            .fetcher
            .fetch_metric(driver, &MetricQuery::for_field(MetricField::Likes, selectors))
            .await;
        let comments_raw = self
            .fetcher
            .fetch_metric(
                driver,
                &MetricQuery::for_field(MetricField::Comments, selectors),
            )
            .await;
        let shares_raw = self
            .fetcher
            .fetch_metric(
                driver,
                &MetricQuery::for_field(MetricField::Shares, selectors),
            )
            .await;

        let likes = parse_display_count_whole(&likes_raw);
        let comments = parse_display_count_whole(&comments_raw);
        let shares = parse_display_count_whole(&shares_raw);

        let caption = self.read_caption(driver).await;

        Ok(Post::from_raw_counts(url, caption, likes, comments, shares))
    }

    /// Caption is best effort: pages without one produce an empty string.
    async fn read_caption(&self, driver: &dyn PageDriver) -> String {
        match driver
            .find_elements(&self.advanced.selectors.caption)
            .await
        {
            Ok(elements) => elements
                .first()
                .map(|e| e.text().to_string())
                .unwrap_or_default(),
            Err(e) => {
                debug!("Caption lookup failed: {}", e);
                String::new()
            }
        }
    }

    /// Let async page content settle after landing on a post.
    async fn settle_on_post(&self) {
        let settle = self.advanced.post_settle_ms;
        if settle > 0 {
            tokio::time::sleep(Duration::from_millis(settle)).await;
        }
    }

    async fn pause_range(&self, (min_ms, max_ms): (u64, u64)) {
        let ms = if max_ms > min_ms {
            fastrand::u64(min_ms..=max_ms)
        } else {
            min_ms
        };
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn emit(&self, event: CollectionEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fast_test_config;

    #[test]
    fn profile_url_template_handles_bare_and_prefixed_handles() {
        let collector = ProfilePostCollector::new(fast_test_config());

        assert_eq!(
            collector.profile_url("somecreator"),
            "https://www.tiktok.com/@somecreator"
        );
        assert_eq!(
            collector.profile_url("@somecreator"),
            "https://www.tiktok.com/@somecreator"
        );
        assert_eq!(
            collector.profile_url("https://www.tiktok.com/@other"),
            "https://www.tiktok.com/@other"
        );
    }
}
