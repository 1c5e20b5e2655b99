use inventory_watcher::AppConfig;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_overrides_defaults() {
    let file = config_file(
        r#"
[poller]
interval_secs = 45
error_notification_interval_mins = 15
notify_on_recovery = true

[inventory]
market = "US"
language = "en"
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.poller.interval_secs, 45);
    assert!(config.poller.notify_on_recovery);
    assert_eq!(
        config.poller.error_notification_interval(),
        chrono::Duration::minutes(15)
    );
    assert_eq!(config.inventory.language, "en");
    assert_eq!(config.store.path, "sent_ids.txt");
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = config_file(
        r#"
[poller]
interval_secs = 0
"#,
    );

    assert!(AppConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_wrapping_active_hours_are_accepted() {
    let file = config_file(
        r#"
[poller]
active_start = "22:00"
active_end = "06:00:00"
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();
    let window = config.poller.active_hours().unwrap().unwrap();
    assert_eq!(window.to_string(), "22:00 - 06:00");
}
