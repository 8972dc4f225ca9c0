use crate::common::AreaBuilder;
use hidewatch::config::PropsConfig;
use hidewatch::props::area::VALUE_NO_TERMINATOR;
use hidewatch::props::checker::{check_bootloader_state, check_native_bridge};
use hidewatch::props::{AreaError, PropArea, PropertyChecker};
use hidewatch::DetectionResult;
use tempfile::TempDir;

const VBS: &str = "ro.boot.verifiedbootstate";
const DEVICE_STATE: &str = "ro.boot.vbmeta.device_state";

fn open(builder: &AreaBuilder) -> PropArea {
    PropArea::from_bytes(&builder.build()).unwrap()
}

#[test]
fn finds_values_between_trie_noise() {
    let area = open(
        &AreaBuilder::new()
            .filler(b"ro\0\0boot\0\0\0\0verifiedbootstate\0\0\0")
            .prop(VBS, "green")
            .prop("ro.build.type", "user")
            .long_prop("ro.build.fingerprint")
            .prop(VBS, "orange"),
    );
    assert_eq!(area.find_values(VBS), vec!["green", "orange"]);
    assert_eq!(area.find_values("ro.build.type"), vec!["user"]);
    assert!(area.find_values("ro.build.fingerprint").is_empty());
}

#[test]
fn oversized_value_yields_sentinel_not_error() {
    let area = open(&AreaBuilder::new().record(0, &[b'a'; 92], "ro.weird"));
    assert_eq!(area.find_values("ro.weird"), vec![VALUE_NO_TERMINATOR]);
}

#[test]
fn wrong_magic_and_version_are_rejected_on_disk() {
    let dir = TempDir::new().unwrap();
    AreaBuilder::new().magic(0).prop(VBS, "orange").write_to(dir.path(), "bootloader_prop");
    AreaBuilder::new().version(0).prop(VBS, "orange").write_to(dir.path(), "default_prop");

    assert!(matches!(
        PropArea::open(dir.path(), "bootloader_prop"),
        Err(AreaError::BadMagic { found: 0 })
    ));
    assert!(matches!(
        PropArea::open(dir.path(), "default_prop"),
        Err(AreaError::BadVersion { found: 0 })
    ));
}

#[test]
fn orange_and_yellow_is_unlocked_and_tampered() {
    let area = open(&AreaBuilder::new().prop(VBS, "orange").prop(VBS, "yellow"));
    let result = check_bootloader_state(&area);
    assert_eq!(
        result,
        DetectionResult::BOOTLOADER_UNLOCKED | DetectionResult::RESETPROP
    );
}

#[test]
fn unlocked_device_state_clears_self_signed() {
    let area = open(
        &AreaBuilder::new()
            .prop(VBS, "yellow")
            .prop(DEVICE_STATE, "unlocked"),
    );
    assert_eq!(
        check_bootloader_state(&area),
        DetectionResult::BOOTLOADER_UNLOCKED
    );
}

#[test]
fn resetprop_on_native_bridge() {
    let area = open(
        &AreaBuilder::new()
            .prop("ro.dalvik.vm.native.bridge", "0")
            .prop("ro.dalvik.vm.native.bridge", "libriruloader.so"),
    );
    assert_eq!(
        check_native_bridge(&area),
        DetectionResult::RIRU | DetectionResult::RESETPROP
    );
}

#[test]
fn checker_reads_both_groups_from_disk() {
    let dir = TempDir::new().unwrap();
    AreaBuilder::new()
        .prop(VBS, "yellow")
        .write_to(dir.path(), "exported2_default_prop");
    AreaBuilder::new()
        .prop("ro.dalvik.vm.native.bridge", "libriruloader.so")
        .write_to(dir.path(), "exported_dalvik_prop");

    let config = PropsConfig {
        store_root: dir.path().to_path_buf(),
        ..PropsConfig::default()
    };
    assert_eq!(
        PropertyChecker::new(&config).check_all(),
        DetectionResult::BOOTLOADER_SELF_SIGNED | DetectionResult::RIRU
    );
}
