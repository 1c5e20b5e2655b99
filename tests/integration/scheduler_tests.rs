use super::*;
use inventory_watcher::scheduler::InventoryScheduler;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_lifecycle() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let store_path = dir.path().join("ids.txt");
    serve_inventory(&server, inventory_body(1, &["VIN9"])).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let poller = http_poller(&server, &store_path, notifier.clone()).await;
    let mut scheduler = InventoryScheduler::new(
        poller,
        notifier.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(5),
    )
    .await?;

    scheduler.start().await?;
    scheduler.shutdown().await;

    let titles: Vec<String> = notifier.all().into_iter().map(|n| n.title).collect();
    assert_eq!(titles.first().map(String::as_str), Some("Inventory Watcher Started"));
    assert_eq!(titles.last().map(String::as_str), Some("Inventory Watcher Stopped"));
    assert_eq!(detail_ids(&notifier.all()), vec!["VIN9"]);

    let persisted = tokio::fs::read_to_string(&store_path).await?;
    assert_eq!(persisted.trim(), "VIN9");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_manual_runs_share_poll_state() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    serve_inventory(&server, inventory_body(0, &[])).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let poller = http_poller(&server, &dir.path().join("ids.txt"), notifier.clone()).await;
    let scheduler = InventoryScheduler::new(
        poller,
        notifier,
        Duration::from_secs(3600),
        Duration::from_secs(5),
    )
    .await?;

    let first = scheduler.run_now().await;
    let second = scheduler.run_now().await;
    assert_eq!(first, second);
    assert_eq!(scheduler.worker().lock().await.state().last_total_count, 0);
    Ok(())
}
