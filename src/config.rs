//! Configuration for a detection run.
//!
//! Every default matches the paths and names used on a stock Android device;
//! overrides exist mainly so tests can point the scanners at temporary trees.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root of the property area files.
pub const DEFAULT_STORE_ROOT: &str = "/dev/__properties__";
/// Root of the pseudo-terminal device nodes.
pub const DEFAULT_PTS_ROOT: &str = "/dev/pts";
/// Upper bound of pts indices probed.
pub const DEFAULT_MAX_PTS: u32 = 1024;
/// Label carried by pts nodes opened by `magisk su`.
pub const MAGISK_PTS_LABEL: &str = "u:object_r:magisk_file:s0";
/// Process name MagiskHide attaches to.
pub const DEFAULT_NICE_NAME: &str = "zygote";
/// Touched by the probe to trigger MagiskHide's inotify watch.
pub const DEFAULT_TOUCH_PATH: &str = "/system/bin/app_process";
/// Time given to the hiding framework to attach.
pub const DEFAULT_PROBE_DELAY_MS: u64 = 2000;

/// Master configuration for [`Detector`](crate::detector::Detector).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    pub props: PropsConfig,
    pub pts: PtsConfig,
    pub probe: ProbeConfig,
}

impl DetectConfig {
    /// Loads a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> crate::error::Result<Self> {
        serde_json::from_str(text).map_err(|e| crate::error::DetectError::Config(e.to_string()))
    }
}

/// Property area locations and aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsConfig {
    pub store_root: PathBuf,
    /// Tried in order; the first that exists is used.
    pub bootloader_areas: Vec<String>,
    pub dalvik_areas: Vec<String>,
}

impl Default for PropsConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(DEFAULT_STORE_ROOT),
            bootloader_areas: vec![
                "bootloader_prop".into(),
                "exported2_default_prop".into(),
                "default_prop".into(),
            ],
            dalvik_areas: vec![
                "dalvik_config_prop".into(),
                "exported_dalvik_prop".into(),
                "dalvik_prop".into(),
            ],
        }
    }
}

/// How pts security labels are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    /// Probe `getxattr` support once and pick accordingly.
    #[default]
    Auto,
    Xattr,
    Ls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtsConfig {
    pub root: PathBuf,
    pub max_nodes: u32,
    pub signature: String,
    pub label_source: LabelSource,
}

impl Default for PtsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_PTS_ROOT),
            max_nodes: DEFAULT_MAX_PTS,
            signature: MAGISK_PTS_LABEL.to_string(),
            label_source: LabelSource::Auto,
        }
    }
}

/// Tracer probe process settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Executable re-run in `probe` mode. `None` means the current executable.
    pub executable: Option<PathBuf>,
    pub nice_name: String,
    pub touch_path: PathBuf,
    pub delay_ms: u64,
}

impl ProbeConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            nice_name: DEFAULT_NICE_NAME.to_string(),
            touch_path: PathBuf::from(DEFAULT_TOUCH_PATH),
            delay_ms: DEFAULT_PROBE_DELAY_MS,
        }
    }
}
