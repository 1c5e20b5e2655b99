use super::*;
use chrono::{Local, TimeZone};
use inventory_watcher::core::{ChangeKind, CycleOutcome};
use inventory_watcher::models::PollState;
use tempfile::TempDir;

fn at(minute: u32) -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 3, 12, minute, 0).unwrap()
}

#[tokio::test]
async fn test_scenario_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = http_poller(&server, &dir.path().join("ids.txt"), notifier.clone()).await;

    serve_inventory(&server, inventory_body(0, &[])).await;
    let (state, outcome) = poller.run_cycle(PollState::new(), at(0)).await;
    assert_eq!(outcome, CycleOutcome::Unchanged { total: 0 });
    assert!(notifier.take().is_empty());

    serve_inventory(&server, inventory_body(3, &["A", "B", "C"])).await;
    let (state, _) = poller.run_cycle(state, at(1)).await;
    let sent = notifier.take();
    assert_eq!(sent.len(), 4);
    assert!(sent[0].body.contains("3 listings found"));
    assert_eq!(detail_ids(&sent), vec!["A", "B", "C"]);

    serve_inventory(&server, inventory_body(4, &["A", "B", "C", "D"])).await;
    let (state, outcome) = poller.run_cycle(state, at(2)).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Changed {
            change: ChangeKind::Delta { delta: 1, .. },
            new_items: 1
        }
    ));
    assert_eq!(state.last_total_count, 4);
    let sent = notifier.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].body.contains("1 new listing found"));
    assert!(sent[0].body.contains("Total: 4 listings"));
    assert_eq!(detail_ids(&sent), vec!["D"]);
    Ok(())
}

#[tokio::test]
async fn test_restart_reloads_persisted_identifiers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let store_path = dir.path().join("ids.txt");

    serve_inventory(&server, inventory_body(2, &["A", "B"])).await;
    let first_run = Arc::new(RecordingNotifier::default());
    let mut poller = http_poller(&server, &store_path, first_run.clone()).await;
    poller.run_cycle(PollState::new(), at(0)).await;
    drop(poller);
    assert_eq!(detail_ids(&first_run.all()), vec!["A", "B"]);

    // Same listings plus one more after the restart.
    serve_inventory(&server, inventory_body(3, &["B", "A", "C"])).await;
    let second_run = Arc::new(RecordingNotifier::default());
    let mut poller = http_poller(&server, &store_path, second_run.clone()).await;
    let (_, outcome) = poller.run_cycle(PollState::new(), at(5)).await;

    assert!(matches!(
        outcome,
        CycleOutcome::Changed {
            change: ChangeKind::Initial { total: 3 },
            new_items: 1
        }
    ));
    assert_eq!(detail_ids(&second_run.all()), vec!["C"]);
    Ok(())
}

#[tokio::test]
async fn test_upstream_outage_alerts_once() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = http_poller(&server, &dir.path().join("ids.txt"), notifier.clone()).await;

    serve_status(&server, 503).await;
    let (state, first) = poller.run_cycle(PollState::new(), at(0)).await;
    let (state, second) = poller.run_cycle(state, at(1)).await;
    assert_eq!(first, CycleOutcome::Failed { alerted: true });
    assert_eq!(second, CycleOutcome::Failed { alerted: false });

    let sent = notifier.take();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_error());
    assert!(sent[0].body.contains("503"));

    // Recovery is silent by default.
    serve_inventory(&server, inventory_body(0, &[])).await;
    let (state, _) = poller.run_cycle(state, at(2)).await;
    assert!(!state.in_error_state);
    assert!(notifier.take().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_blocked_response_is_a_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = http_poller(&server, &dir.path().join("ids.txt"), notifier.clone()).await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(INVENTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access Denied</html>"))
        .mount(&server)
        .await;

    let (state, outcome) = poller.run_cycle(PollState::new(), at(0)).await;
    assert_eq!(outcome, CycleOutcome::Failed { alerted: true });
    assert!(state.in_error_state);
    assert_eq!(state.last_total_count, 0);
    Ok(())
}
