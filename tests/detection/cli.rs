//! Drives the `hidewatch` binary end to end against temporary trees.

use crate::common::{hidewatch_bin, make_pts_nodes, AreaBuilder};
use std::process::Command;
use tempfile::TempDir;

#[test]
fn detect_prints_json_report() {
    let props = TempDir::new().unwrap();
    let pts = TempDir::new().unwrap();
    make_pts_nodes(pts.path(), 2);
    AreaBuilder::new()
        .prop("ro.boot.verifiedbootstate", "orange")
        .prop("ro.boot.verifiedbootstate", "green")
        .write_to(props.path(), "bootloader_prop");

    let config = serde_json::json!({
        "props": { "store_root": props.path() },
        "pts": { "root": pts.path() },
        "probe": { "delay_ms": 0, "touch_path": "/proc/self/status" }
    });
    let config_path = props.path().join("config.json");
    std::fs::write(&config_path, config.to_string()).unwrap();

    let output = Command::new(hidewatch_bin())
        .arg("--json")
        .arg("--config")
        .arg(&config_path)
        .arg("detect")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["bootloader"], "unlocked");
    assert_eq!(report["resetprop"], true);
    assert_eq!(report["riru"], false);
    assert_eq!(report["tracer"], false);
    assert_eq!(report["magisk_pts"], false);
    assert_eq!(report["bits"], 2 | 16);
}

#[test]
fn bad_config_fails() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, "{").unwrap();

    let output = Command::new(hidewatch_bin())
        .arg("--config")
        .arg(&config_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading config"));
}

#[test]
fn probe_rejects_bad_fd() {
    let output = Command::new(hidewatch_bin())
        .args(["probe", "--write-fd", "-1", "--delay-ms", "0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
