//! Console runner for profile engagement collection
//!
//! Streams each collected post as a table row the moment it is extracted,
//! then prints a run summary. Rows meeting the configured engagement-rate
//! threshold are flagged.
//!
//! Usage: profile_scan <username> [post_count] [engagement_rate_threshold]

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};

use profile_pulse::domain::events::CollectionEvent;
use profile_pulse::domain::post::Post;
use profile_pulse::domain::services::PostSink;
use profile_pulse::infrastructure::config::ConfigManager;
use profile_pulse::infrastructure::logging::init_logging_with_config;
use profile_pulse::infrastructure::post_collector::ProfilePostCollector;
use profile_pulse::infrastructure::session::HttpSessionProvider;

/// Renders each post as a fixed-width console row as soon as it arrives.
struct ConsoleTableSink {
    threshold: f64,
    row: AtomicU32,
}

impl ConsoleTableSink {
    fn new(threshold: f64) -> Self {
        Self {
            threshold,
            row: AtomicU32::new(0),
        }
    }

    fn print_header() {
        println!(
            "{:>3}  {:<33}  {:>10}  {:>10}  {:>10}  {:>7}  {:>8}  {:>9}",
            "#", "Caption", "Views", "Likes", "Comments", "Saves", "Shares", "ER Rate"
        );
        println!("{}", "-".repeat(104));
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[async_trait]
impl PostSink for ConsoleTableSink {
    async fn publish(&self, post: Post) -> Result<()> {
        let row = self.row.fetch_add(1, Ordering::SeqCst) + 1;
        let flag = if post.meets_rate(self.threshold) {
            " ✅"
        } else {
            ""
        };

        println!(
            "{:>3}  {:<33}  {:>10}  {:>10}  {:>10}  {:>7}  {:>8}  {:>8.2}%{}",
            row,
            truncate(&post.caption, 30),
            post.views,
            post.likes,
            post.comments,
            post.saves,
            post.shares,
            post.engagement_rate,
            flag
        );
        println!("     {}", post.url);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(username) = args.first().cloned() else {
        bail!("Usage: profile_scan <username> [post_count] [engagement_rate_threshold]");
    };
    if username.trim().is_empty() {
        bail!("Please enter a username");
    }

    let manager = ConfigManager::new()?;
    let mut config = manager.initialize().await?;
    init_logging_with_config(config.user.logging.clone())?;

    let post_count = match args.get(1) {
        Some(raw) => raw
            .parse::<u32>()
            .context("Post count must be a positive integer")?,
        None => config.user.max_posts,
    };
    if post_count == 0 {
        bail!("Post count must be a positive integer");
    }

    let threshold = match args.get(2) {
        Some(raw) => raw
            .parse::<f64>()
            .context("Engagement rate threshold must be a number")?,
        None => config.user.desired_engagement_rate,
    };

    let provider = HttpSessionProvider::from_app_config(&config);
    let collector = ProfilePostCollector::new(config.advanced.clone()).with_observer(|event| {
        if let CollectionEvent::PostSkipped { index, url, reason } = event {
            eprintln!("⚠️  Skipped post {index} ({url}): {reason}");
        }
    });

    let sink = ConsoleTableSink::new(threshold);
    ConsoleTableSink::print_header();

    let summary = collector
        .collect_with_provider(&provider, &username, post_count, &sink)
        .await?;

    println!();
    println!(
        "✅ Collected {} posts ({} skipped) in {:.1}s",
        summary.collected,
        summary.skipped,
        summary.elapsed.as_secs_f64()
    );

    config.app_managed.last_run_at = Some(Utc::now());
    config.app_managed.last_profile = Some(username);
    manager.save_config(&config).await?;

    Ok(())
}
