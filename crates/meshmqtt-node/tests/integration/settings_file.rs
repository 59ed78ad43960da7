//! Settings file loading

use std::io::Write;
use std::time::Duration;

use meshmqtt_node::{Overrides, Settings, SettingsError};

fn options_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_explicit_file_with_overrides() {
    let file = options_file(
        r#"{
            "debug": true,
            "broker": {"address": "tcp://mqtt.local:1883", "clientid": "hass", "topic": "msh/US/2/e/#"},
            "healthcheck": {"port": 9000}
        }"#,
    );

    let settings = Settings::load(&Overrides {
        config: Some(file.path().to_path_buf()),
        topic: Some("msh/ANZ/2/e/LongFast/#".into()),
        keepalive: Some(Duration::from_secs(15)),
        ..Default::default()
    })
    .unwrap();

    assert!(settings.debug);
    assert_eq!(settings.broker.address, "tcp://mqtt.local:1883");
    assert_eq!(settings.broker.clientid, "hass");
    assert_eq!(settings.broker.topic, "msh/ANZ/2/e/LongFast/#");
    assert_eq!(settings.broker.keepalive, Duration::from_secs(15));
    assert_eq!(settings.healthcheck.port, 9000);
    assert_eq!(settings.fanout.topic, "msh/ANZ/fanout/");
}

#[test]
fn test_malformed_file_is_fatal() {
    let file = options_file("{\"broker\": ");
    let err = Settings::load(&Overrides {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn test_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::from_file(&dir.path().join("options.json")).unwrap_err();
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn test_discover_first_existing() {
    let dir = tempfile::tempdir().unwrap();
    let second = dir.path().join("b.json");
    std::fs::write(&second, "{}").unwrap();
    let third = dir.path().join("c.json");
    std::fs::write(&third, "{}").unwrap();

    let candidates = vec![dir.path().join("a.json"), second.clone(), third];
    assert_eq!(meshmqtt_node::settings::discover(&candidates), Some(second));
    assert_eq!(meshmqtt_node::settings::discover(&[dir.path().join("x.json")]), None);
}

#[test]
fn test_invalid_keepalive_string() {
    let file = options_file(r#"{"broker": {"keepalive": "soon"}}"#);
    assert!(Settings::from_file(file.path()).is_err());
}
