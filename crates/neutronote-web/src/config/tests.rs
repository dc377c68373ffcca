use std::collections::HashMap;
use std::path::PathBuf;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
    assert_eq!(config.storage.data_root, PathBuf::from("/SNS/SNAP"));
    assert_eq!(config.kernel.timeout_secs, 60);
    assert_eq!(config.bind_addr(), "127.0.0.1:5000");
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = Config::from_toml_str(
        r#"
        [server]
        port = 8080

        [kernel]
        python = "/opt/mantid/bin/python"
        "#,
    )
    .unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.kernel.python, "/opt/mantid/bin/python");
    assert_eq!(config.storage.instance_dir, PathBuf::from("instance"));
}

#[test]
fn test_missing_file_is_default() {
    let config = Config::from_file(std::path::Path::new("/nonexistent/neutronote.toml")).unwrap();
    assert_eq!(config.server.port, 5000);
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config
        .apply_env(env(&[
            ("NEUTRONOTE_IPTS", "33219"),
            ("NEUTRONOTE_DATA_ROOT", "/tmp/snap"),
            ("NEUTRONOTE_PORT", "5050"),
        ]))
        .unwrap();
    assert_eq!(config.storage.ipts.as_deref(), Some("33219"));
    assert_eq!(config.storage.data_root, PathBuf::from("/tmp/snap"));
    assert_eq!(config.server.port, 5050);

    assert!(config.apply_env(env(&[("NEUTRONOTE_PORT", "http")])).is_err());
}

#[test]
fn test_storage_resolution() {
    let mut storage = StorageConfig {
        data_root: PathBuf::from("/data"),
        instance_dir: PathBuf::from("/work/instance"),
        ipts: None,
    };
    let local = storage.resolve().unwrap();
    assert_eq!(local.db_path, PathBuf::from("/work/instance/neutronote.db"));
    assert_eq!(local.upload_dir, PathBuf::from("/work/instance/uploads"));
    assert!(local.ipts.is_none());

    storage.ipts = Some("33219".into());
    let shared = storage.resolve().unwrap();
    assert_eq!(shared.root, PathBuf::from("/data/IPTS-33219/shared/neutronote"));
    assert_eq!(shared.ipts.map(|i| i.to_string()).as_deref(), Some("IPTS-33219"));

    storage.ipts = Some("abc".into());
    assert!(storage.resolve().is_err());
}
