mod common;

use std::sync::Arc;
use std::time::Duration;

use chaoscal_core::{
    CalendarHub, Category, ChaosCalError, DiscardReason, NewEvent, SubscriptionId, SyncConfig,
    SyncResult, SyncStatus,
};
use chrono::NaiveDate;
use common::{ScriptedFetcher, feed, init_tracing};

fn hub_with(fetcher: &Arc<ScriptedFetcher>) -> CalendarHub {
    init_tracing();
    CalendarHub::new(SyncConfig::default(), fetcher.clone())
}

fn titles_from(hub: &CalendarHub, source: &SubscriptionId) -> Vec<String> {
    hub.events()
        .into_iter()
        .filter(|e| e.is_from(source))
        .map(|e| e.title)
        .collect()
}

fn local_event(hub: &CalendarHub, title: &str) {
    hub.add_event(NewEvent {
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
        category: Category::Urgent,
        description: None,
    })
    .unwrap();
}

#[tokio::test]
async fn test_replace_by_source_keeps_other_feeds_and_local_events() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    local_event(&hub, "local");

    fetcher.respond(Ok(feed(&["s1-a", "s1-b"])));
    let s1 = hub.add_subscription("S1", "https://s1.example/cal.ics", false).await;
    fetcher.respond(Ok(feed(&["s2-a"])));
    let s2 = hub.add_subscription("S2", "https://s2.example/cal.ics", false).await;
    let s2_before: Vec<_> = hub.events().into_iter().filter(|e| e.is_from(&s2.id)).collect();

    fetcher.respond(Ok(feed(&["s1-c"])));
    let report = hub.sync(&s1.id).await.unwrap();

    assert!(matches!(
        report.result,
        SyncResult::Merged { summary, skipped: 0 } if summary.removed == 2 && summary.inserted == 1
    ));
    assert_eq!(titles_from(&hub, &s1.id), vec!["s1-c"]);
    let s2_after: Vec<_> = hub.events().into_iter().filter(|e| e.is_from(&s2.id)).collect();
    assert_eq!(s2_after, s2_before, "S2 events must be untouched");
    assert_eq!(hub.events().iter().filter(|e| e.is_local()).count(), 1);
}

#[tokio::test]
async fn test_failed_sync_keeps_events_and_sets_error() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);

    fetcher.respond(Ok(feed(&["kept"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;
    assert_eq!(sub.status, SyncStatus::Active);
    let before = hub.events();

    fetcher.respond(Err(ChaosCalError::FeedStatus(503)));
    let report = hub.sync(&sub.id).await.unwrap();

    assert_eq!(
        report.result,
        SyncResult::Failed {
            error: ChaosCalError::FeedStatus(503)
        }
    );
    assert_eq!(hub.events(), before);
    let after = hub.subscription(&sub.id).unwrap();
    assert_eq!(after.status, SyncStatus::Error);
    assert_eq!(after.last_synced, sub.last_synced, "Failure must not bump last_synced");
}

#[tokio::test]
async fn test_initial_sync_failure_leaves_feed_in_error() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);

    fetcher.respond(Err(ChaosCalError::FeedRequest("connection refused".into())));
    let sub = hub.add_subscription("Down", "https://down.example/cal.ics", false).await;

    assert_eq!(sub.status, SyncStatus::Error);
    assert_eq!(sub.last_synced, None);
    assert!(hub.events().is_empty());
}

#[tokio::test]
async fn test_status_is_loading_while_fetch_in_flight() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    let release = fetcher.respond_gated(Ok(feed(&["b"])));
    let pending = tokio::spawn({
        let hub = hub.clone();
        let id = sub.id.clone();
        async move { hub.sync(&id).await }
    });
    tokio::task::yield_now().await;

    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Loading);
    assert_eq!(titles_from(&hub, &sub.id), vec!["a"], "Old events stay visible");

    release.send(()).unwrap();
    pending.await.unwrap().unwrap();
    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Active);
    assert_eq!(titles_from(&hub, &sub.id), vec!["b"]);
}

#[tokio::test]
async fn test_overlapping_syncs_latest_start_wins() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["initial"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    let release_slow = fetcher.respond_gated(Ok(feed(&["stale"])));
    fetcher.respond(Ok(feed(&["fresh"])));

    let slow = tokio::spawn({
        let hub = hub.clone();
        let id = sub.id.clone();
        async move { hub.sync(&id).await }
    });
    tokio::task::yield_now().await;

    let fast = hub.sync(&sub.id).await.unwrap();
    assert!(matches!(fast.result, SyncResult::Merged { .. }));

    release_slow.send(()).unwrap();
    let slow = slow.await.unwrap().unwrap();

    assert_eq!(slow.result, SyncResult::Discarded(DiscardReason::Superseded));
    assert_eq!(titles_from(&hub, &sub.id), vec!["fresh"]);
    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Active);
}

#[tokio::test]
async fn test_cancelled_sync_restores_prior_status() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    let _release = fetcher.respond_gated(Ok(feed(&["never"])));
    let cancelled = tokio::time::timeout(Duration::from_millis(10), hub.sync(&sub.id)).await;

    assert!(cancelled.is_err());
    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Active);
    assert_eq!(titles_from(&hub, &sub.id), vec!["a"]);
}

#[tokio::test]
async fn test_cancelled_initial_sync_leaves_feed_in_error() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);

    let _release = fetcher.respond_gated(Ok(feed(&["never"])));
    let cancelled = tokio::time::timeout(
        Duration::from_millis(10),
        hub.add_subscription("Slow", "https://slow.example/cal.ics", false),
    )
    .await;

    assert!(cancelled.is_err());
    let subs = hub.subscriptions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].status, SyncStatus::Error);
    assert!(hub.events().is_empty());
}

#[tokio::test]
async fn test_cancelled_stale_sync_leaves_newer_sync_in_charge() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    let _release_old = fetcher.respond_gated(Ok(feed(&["old"])));
    let release_new = fetcher.respond_gated(Ok(feed(&["new"])));
    let spawn_sync = || {
        let hub = hub.clone();
        let id = sub.id.clone();
        tokio::spawn(async move { hub.sync(&id).await })
    };
    let old = spawn_sync();
    tokio::task::yield_now().await;
    let new = spawn_sync();
    tokio::task::yield_now().await;

    old.abort();
    assert!(old.await.unwrap_err().is_cancelled());
    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Loading);

    release_new.send(()).unwrap();
    new.await.unwrap().unwrap();
    assert_eq!(hub.subscription(&sub.id).unwrap().status, SyncStatus::Active);
    assert_eq!(titles_from(&hub, &sub.id), vec!["new"]);
}

#[tokio::test]
async fn test_fetch_completing_after_removal_is_dropped() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    let release = fetcher.respond_gated(Ok(feed(&["late"])));
    let pending = tokio::spawn({
        let hub = hub.clone();
        let id = sub.id.clone();
        async move { hub.sync(&id).await }
    });
    tokio::task::yield_now().await;

    assert!(hub.remove_subscription(&sub.id));
    release.send(()).unwrap();
    let report = pending.await.unwrap().unwrap();

    assert_eq!(report.result, SyncResult::Discarded(DiscardReason::Removed));
    assert!(hub.events().is_empty(), "No orphaned events may remain");
    assert!(hub.subscription(&sub.id).is_none());
}

#[tokio::test]
async fn test_remove_subscription_purges_only_its_events() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    local_event(&hub, "local");
    fetcher.respond(Ok(feed(&["one", "two"])));
    let s1 = hub.add_subscription("S1", "https://s1.example/cal.ics", false).await;
    fetcher.respond(Ok(feed(&["three"])));
    let s2 = hub.add_subscription("S2", "https://s2.example/cal.ics", false).await;

    assert!(hub.remove_subscription(&s1.id));

    assert!(titles_from(&hub, &s1.id).is_empty());
    assert_eq!(titles_from(&hub, &s2.id), vec!["three"]);
    assert_eq!(hub.events().len(), 2);
    assert_eq!(
        hub.subscriptions().into_iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![s2.id]
    );
}

#[tokio::test]
async fn test_remove_unknown_subscription_is_noop() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    local_event(&hub, "local");
    fetcher.respond(Ok(feed(&["remote"])));
    hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;
    let before_events = hub.events();
    let before_subs = hub.subscriptions();

    assert!(!hub.remove_subscription(&SubscriptionId::from("does-not-exist")));

    assert_eq!(hub.events(), before_events);
    assert_eq!(hub.subscriptions(), before_subs);
}

#[tokio::test]
async fn test_removal_does_not_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;

    hub.remove_subscription(&sub.id);

    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_sync_all_reports_every_feed() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["a"])));
    let a = hub.add_subscription("A", "https://a.example/cal.ics", false).await;
    fetcher.respond(Ok(feed(&["b"])));
    let b = hub.add_subscription("B", "https://b.example/cal.ics", false).await;

    fetcher.respond(Ok(feed(&["x"])));
    fetcher.respond(Err(ChaosCalError::FeedStatus(500)));
    let reports = hub.sync_all().await;

    let ids: Vec<_> = reports.iter().map(|r| r.subscription_id.clone()).collect();
    assert_eq!(ids, vec![a.id, b.id], "Reports follow registry order");
    assert_eq!(
        reports
            .iter()
            .filter(|r| matches!(r.result, SyncResult::Failed { .. }))
            .count(),
        1
    );
    assert_eq!(
        hub.subscriptions()
            .iter()
            .filter(|s| s.status == SyncStatus::Error)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_resync_mints_new_ids() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    fetcher.respond(Ok(feed(&["same"])));
    let sub = hub.add_subscription("Feed", "https://feed.example/cal.ics", false).await;
    let first = hub.events();

    fetcher.respond(Ok(feed(&["same"])));
    hub.sync(&sub.id).await.unwrap();
    let second = hub.events();

    assert_eq!(first[0].title, second[0].title);
    assert_eq!(first[0].date, second[0].date);
    assert_ne!(first[0].id, second[0].id);
}

#[tokio::test]
async fn test_export_then_import_round_trip() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let source = hub_with(&fetcher);
    local_event(&source, "MEETING_ALPHA");
    fetcher.respond(Ok(feed(&["from-feed"])));
    source
        .add_subscription("Feed", "https://feed.example/cal.ics", false)
        .await;

    let ics = source.export_ics();
    let target = hub_with(&fetcher);
    let report = target.import_ics(&ics);

    assert_eq!(report.imported, 2);
    assert!(report.skipped.is_empty());
    let imported = target.events();
    assert_eq!(imported[0].title, "MEETING_ALPHA");
    assert_eq!(imported[0].date, source.events()[0].date);
    assert!(imported.iter().all(|e| e.is_local()), "Imports have no source");
}

#[tokio::test]
async fn test_events_on_day() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let hub = hub_with(&fetcher);
    local_event(&hub, "early");
    fetcher.respond(Ok(feed(&["ten"])));
    hub.add_subscription("Feed", "https://feed.example/cal.ics", false)
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let titles: Vec<String> = hub.events_on(day).into_iter().map(|e| e.title).collect();

    assert_eq!(titles, vec!["early", "ten"]);
    assert!(hub.events_on(day.succ_opt().unwrap()).is_empty());
}
