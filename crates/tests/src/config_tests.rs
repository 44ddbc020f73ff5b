//! Layered configuration loading: file, then `CHAINSCAN__*` environment overrides.

use chainscan_core::{
    config::AppConfig,
    types::{ModeFilter, NetworkMode},
    upstream::SelectionAlgorithm,
};
use serial_test::serial;
use std::io::Write;

const ENV_KEYS: &[&str] = &[
    "CHAINSCAN_CONFIG",
    "CHAINSCAN__SELECTION__ALGORITHM",
    "CHAINSCAN__TIMEOUTS__TARGET_TIMEOUT_MS",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_file_values_loaded() {
    clear_env();
    let file = write_config(
        r#"
[selection]
algorithm = "round-robin"

[scan]
mode = "both"

[[rpcs]]
chain = "base"
mode = "testnet"
urls = ["https://sepolia.base.example"]
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();

    assert_eq!(config.selection.algorithm, SelectionAlgorithm::RoundRobin);
    assert_eq!(config.scan.mode, ModeFilter::Both);
    assert_eq!(config.rpcs[0].mode, NetworkMode::Testnet);
    assert_eq!(config.timeouts.target_timeout_ms, 8000);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config("[selection]\nalgorithm = \"fastest\"\n");
    std::env::set_var("CHAINSCAN__SELECTION__ALGORITHM", "failover");
    std::env::set_var("CHAINSCAN__TIMEOUTS__TARGET_TIMEOUT_MS", "3000");

    let config = AppConfig::from_file(file.path());
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.selection.algorithm, SelectionAlgorithm::Failover);
    assert_eq!(config.timeouts.target_timeout_ms, 3000);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();

    let config = AppConfig::from_file("/nonexistent/chainscan.toml").unwrap();

    assert_eq!(config.selection.algorithm, SelectionAlgorithm::Fastest);
    assert_eq!(config.scan.mode, ModeFilter::Mainnet);
    assert!(config.rpcs.is_empty());
}

#[test]
#[serial]
fn test_load_honours_config_path_env() {
    clear_env();
    let file = write_config("[scan]\nmode = \"testnet\"\n");
    std::env::set_var("CHAINSCAN_CONFIG", file.path());

    let config = AppConfig::load();
    clear_env();

    assert_eq!(config.unwrap().scan.mode, ModeFilter::Testnet);
}

#[test]
#[serial]
fn test_custom_rpcs_for_unknown_chain_rejected() {
    clear_env();
    let file = write_config(
        r#"
[[rpcs]]
chain = "atlantis"
urls = ["https://rpc.atlantis.example"]
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();

    assert!(config.validate().is_err());
    assert!(config.build_registry().is_err());
}
