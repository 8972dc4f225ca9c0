//! Property-based checks layered over [`PropArea`].
//!
//! `ro.*` properties are written once at boot. Finding several different
//! values for one of them means the area was rewritten in place, which is
//! what `resetprop` does.

use crate::config::PropsConfig;
use crate::props::area::PropArea;
use crate::result::DetectionResult;
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub const VERIFIED_BOOT_STATE: &str = "ro.boot.verifiedbootstate";
pub const VBMETA_DEVICE_STATE: &str = "ro.boot.vbmeta.device_state";
pub const NATIVE_BRIDGE: &str = "ro.dalvik.vm.native.bridge";

/// Native bridge library installed by Riru.
pub const RIRU_LOADER: &str = "libriruloader.so";

/// Runs the property checks against the areas described by a [`PropsConfig`].
#[derive(Debug, Clone)]
pub struct PropertyChecker<'a> {
    config: &'a PropsConfig,
}

impl<'a> PropertyChecker<'a> {
    pub fn new(config: &'a PropsConfig) -> Self {
        Self { config }
    }

    /// Runs every property group. Never fails: a group whose area cannot be
    /// opened contributes no flags.
    pub fn check_all(&self) -> DetectionResult {
        let mut result = DetectionResult::empty();
        if let Some(area) = self.open_any("bootloader", &self.config.bootloader_areas) {
            result |= check_bootloader_state(&area);
        }
        if let Some(area) = self.open_any("dalvik", &self.config.dalvik_areas) {
            result |= check_native_bridge(&area);
        }
        result
    }

    /// Opens the first alias that exists. Absence moves on to the next alias;
    /// any other error gives up on the group.
    pub fn open_any(&self, group: &str, names: &[String]) -> Option<PropArea> {
        for name in names {
            match PropArea::open(&self.config.store_root, name) {
                Ok(area) => {
                    debug!(group, area = %name, "Opened property area");
                    return Some(area);
                }
                Err(e) if e.is_not_found() => {
                    debug!(group, area = %name, "Property area absent, trying next alias");
                }
                Err(e) => {
                    warn!(group, area = %name, error = %e, "Failed to open property area");
                    return None;
                }
            }
        }
        warn!(group, candidates = ?names, "No property area could be opened");
        None
    }
}

fn distinct_count(values: &[String]) -> usize {
    values.iter().collect::<BTreeSet<_>>().len()
}

fn tamper_flag(key: &str, values: &[String]) -> DetectionResult {
    if distinct_count(values) > 1 {
        warn!(key, values = ?values, "Read-only property has multiple values");
        DetectionResult::RESETPROP
    } else {
        DetectionResult::empty()
    }
}

/// Folds the verified boot state and vbmeta device state into flags.
pub fn check_bootloader_state(area: &PropArea) -> DetectionResult {
    let values = area.find_values(VERIFIED_BOOT_STATE);
    let mut result = tamper_flag(VERIFIED_BOOT_STATE, &values);
    for value in &values {
        match value.as_str() {
            "orange" => result.mark_unlocked(),
            "yellow" if !result.contains(DetectionResult::BOOTLOADER_UNLOCKED) => {
                result.insert(DetectionResult::BOOTLOADER_SELF_SIGNED)
            }
            _ => {}
        }
    }

    let values = area.find_values(VBMETA_DEVICE_STATE);
    result |= tamper_flag(VBMETA_DEVICE_STATE, &values);
    if values.iter().any(|v| v == "unlocked") {
        result.mark_unlocked();
    }
    result
}

/// Flags Riru when it is registered as the native bridge.
pub fn check_native_bridge(area: &PropArea) -> DetectionResult {
    let values = area.find_values(NATIVE_BRIDGE);
    let mut result = tamper_flag(NATIVE_BRIDGE, &values);
    if values.iter().any(|v| v == RIRU_LOADER) {
        result.insert(DetectionResult::RIRU);
    }
    result
}
