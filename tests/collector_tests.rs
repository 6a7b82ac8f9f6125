//! End-to-end tests for the profile collection pipeline over scripted fakes
use std::sync::{Arc, Mutex};

use profile_pulse::domain::events::CollectionEvent;
use profile_pulse::domain::services::{BufferedSink, CollectError, SessionHandle};
use profile_pulse::infrastructure::post_collector::ProfilePostCollector;
use profile_pulse::test_utils::{
    FailingSessionProvider, ScriptedPageDriver, ScriptedSessionProvider, fast_test_config,
    post_page, profile_page,
};

const PROFILE_URL: &str = "https://www.tiktok.com/@somecreator";

fn post_url(id: u32) -> String {
    format!("https://www.tiktok.com/@somecreator/video/{id}")
}

fn collector() -> ProfilePostCollector {
    ProfilePostCollector::new(fast_test_config())
}

/// Profile with three posts carrying distinct counter styles.
fn three_post_driver() -> ScriptedPageDriver {
    ScriptedPageDriver::new()
        .with_page(
            PROFILE_URL,
            profile_page(&[
                Some(&post_url(1)),
                Some(&post_url(2)),
                Some(&post_url(3)),
            ]),
        )
        .with_page(post_url(1), post_page("12.3K", "45", "8"))
        .with_page(post_url(2), post_page("1.2M", "2.1K", "300"))
        .with_page(post_url(3), post_page("842", "", "bogus"))
}

#[tokio::test]
async fn collects_all_posts_in_page_order() {
    let mut session = SessionHandle::new(Box::new(three_post_driver()));

    let (posts, summary) = collector()
        .collect_to_vec(&mut session, "somecreator", 5)
        .await
        .expect("collection succeeds");

    assert_eq!(summary.collected, 3);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.cancelled);

    let urls: Vec<_> = posts.iter().map(|p| p.url.clone()).collect();
    assert_eq!(urls, vec![post_url(1), post_url(2), post_url(3)]);
    assert!(posts.iter().all(|p| p.saves == 0));

    // Counter styles: suffixed, suffixed with decimals, plain/empty/garbled.
    assert_eq!(posts[0].likes, 12_300);
    assert_eq!(posts[0].views, 18_450);
    assert_eq!(posts[1].likes, 1_200_000);
    assert_eq!(posts[1].comments, 2_100);
    assert_eq!(posts[2].likes, 842);
    assert_eq!(posts[2].comments, 0);
    assert_eq!(posts[2].shares, 0);

    for post in &posts {
        if post.views > 0 {
            let expected = post.total_interactions() as f64 / post.views as f64 * 100.0;
            assert!((post.engagement_rate - expected).abs() < 1e-9);
        } else {
            assert_eq!(post.engagement_rate, 0.0);
        }
    }
}

#[tokio::test]
async fn one_broken_post_is_skipped_and_order_preserved() {
    let driver = three_post_driver().with_failing_url(post_url(2));
    let mut session = SessionHandle::new(Box::new(driver));

    let events: Arc<Mutex<Vec<CollectionEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&events);
    let collector = ProfilePostCollector::new(fast_test_config())
        .with_observer(move |event| observed.lock().unwrap().push(event));

    let (posts, summary) = collector
        .collect_to_vec(&mut session, "somecreator", 5)
        .await
        .expect("batch survives a broken post");

    assert_eq!(summary.collected, 2);
    assert_eq!(summary.skipped, 1);

    let urls: Vec<_> = posts.iter().map(|p| p.url.clone()).collect();
    assert_eq!(urls, vec![post_url(1), post_url(3)]);

    let skips: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, CollectionEvent::PostSkipped { .. }))
        .cloned()
        .collect();
    assert_eq!(
        skips,
        vec![CollectionEvent::PostSkipped {
            index: 2,
            url: post_url(2),
            reason: format!("navigation to {} failed: scripted navigation failure", post_url(2)),
        }]
    );
}

#[tokio::test]
async fn missing_post_list_is_fatal_after_three_attempts() {
    // Profile page exists but never shows the post-list region.
    let driver = ScriptedPageDriver::new().with_page(
        PROFILE_URL,
        profile_pulse::test_utils::ScriptedPage::new(),
    );
    let mut session = SessionHandle::new(Box::new(driver));

    let sink = BufferedSink::new();
    let result = collector()
        .collect_into(&mut session, "somecreator", 5, &sink)
        .await;

    match result {
        Err(CollectError::PageLoad { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected PageLoad error, got {other:?}"),
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn links_without_href_are_skipped_during_harvest() {
    let driver = ScriptedPageDriver::new()
        .with_page(
            PROFILE_URL,
            profile_page(&[Some(&post_url(1)), None, Some(&post_url(3))]),
        )
        .with_page(post_url(1), post_page("10", "1", "0"))
        .with_page(post_url(3), post_page("20", "2", "0"));
    let mut session = SessionHandle::new(Box::new(driver));

    let (posts, summary) = collector()
        .collect_to_vec(&mut session, "somecreator", 5)
        .await
        .expect("harvest skips unreadable links");

    assert_eq!(summary.collected, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(posts[0].url, post_url(1));
    assert_eq!(posts[1].url, post_url(3));
}

#[tokio::test]
async fn relative_post_links_resolve_against_the_profile_url() {
    let driver = ScriptedPageDriver::new()
        .with_page(
            PROFILE_URL,
            profile_page(&[Some("/@somecreator/video/1")]),
        )
        .with_page(post_url(1), post_page("5", "0", "0"));
    let mut session = SessionHandle::new(Box::new(driver));

    let (posts, _) = collector()
        .collect_to_vec(&mut session, "somecreator", 5)
        .await
        .expect("relative links resolve");

    assert_eq!(posts[0].url, post_url(1));
}

#[tokio::test]
async fn limit_bounds_both_harvest_and_navigation() {
    let driver = ScriptedPageDriver::new()
        .with_page(
            PROFILE_URL,
            profile_page(&[
                Some(&post_url(1)),
                Some(&post_url(2)),
                Some(&post_url(3)),
                Some(&post_url(4)),
                Some(&post_url(5)),
            ]),
        )
        .with_page(post_url(1), post_page("1", "0", "0"))
        .with_page(post_url(2), post_page("2", "0", "0"));
    let mut session = SessionHandle::new(Box::new(driver));

    let (posts, summary) = collector()
        .collect_to_vec(&mut session, "somecreator", 2)
        .await
        .expect("bounded collection succeeds");

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.collected, 2);

    let urls: Vec<_> = posts.iter().map(|p| p.url.clone()).collect();
    assert_eq!(urls, vec![post_url(1), post_url(2)]);
}

#[tokio::test]
async fn cancellation_between_posts_stops_the_batch_cleanly() {
    let mut session = SessionHandle::new(Box::new(three_post_driver()));

    let collector = ProfilePostCollector::new(fast_test_config());
    let token = collector.cancellation_token();
    let collector = collector.with_observer(move |event| {
        if matches!(event, CollectionEvent::PostCollected { .. }) {
            token.cancel();
        }
    });

    let (posts, summary) = collector
        .collect_to_vec(&mut session, "somecreator", 5)
        .await
        .expect("cancelled run still reports its partial result");

    assert_eq!(posts.len(), 1);
    assert_eq!(summary.collected, 1);
    assert!(summary.cancelled);
}

#[tokio::test]
async fn provider_failure_surfaces_as_session_error() {
    let sink = BufferedSink::new();
    let result = collector()
        .collect_with_provider(&FailingSessionProvider, "somecreator", 5, &sink)
        .await;

    assert!(matches!(result, Err(CollectError::Session(_))));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn provider_managed_run_collects_and_releases() {
    let provider = ScriptedSessionProvider::new(three_post_driver());
    let sink = BufferedSink::new();

    let summary = collector()
        .collect_with_provider(&provider, "somecreator", 5, &sink)
        .await
        .expect("provider-managed run succeeds");

    assert_eq!(summary.collected, 3);
    assert_eq!(sink.len(), 3);
}

#[tokio::test]
async fn comment_detail_pass_is_best_effort() {
    let selectors = profile_pulse::infrastructure::config::SelectorConfig::default();
    let comment_page = profile_pulse::test_utils::ScriptedPage::new().with_elements(
        &selectors.comment_text,
        vec![
            profile_pulse::domain::services::ElementSnapshot::new("great video"),
            profile_pulse::domain::services::ElementSnapshot::new("love this"),
            profile_pulse::domain::services::ElementSnapshot::new("third comment"),
        ],
    );
    let driver = ScriptedPageDriver::new().with_page(post_url(1), comment_page);
    let mut session = SessionHandle::new(Box::new(driver));

    let comments = collector()
        .fetch_comments(&mut session, &post_url(1), 2)
        .await;
    assert_eq!(comments, vec!["great video", "love this"]);

    // A post that cannot be reached yields no comments, not an error.
    let comments = collector()
        .fetch_comments(&mut session, &post_url(9), 5)
        .await;
    assert!(comments.is_empty());
}
