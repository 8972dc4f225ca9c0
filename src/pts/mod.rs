//! Scan of `/dev/pts` for sessions opened by `magisk su`.
//!
//! The SELinux policy forbids listing `/dev/pts`, but nodes are allocated
//! contiguously from 0, so the scanner probes `0, 1, 2, …` until the first
//! missing index. A node labelled `u:object_r:magisk_file:s0` belongs to a
//! live root shell.

pub mod label;

use crate::config::PtsConfig;
use crate::result::DetectionResult;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

pub use label::{decode_label, select_label_reader, LabelReader, LsLabelReader, XattrLabelReader};

pub struct PtsScanner {
    root: PathBuf,
    max_nodes: u32,
    signature: String,
    reader: Box<dyn LabelReader>,
}

impl std::fmt::Debug for PtsScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtsScanner")
            .field("root", &self.root)
            .field("max_nodes", &self.max_nodes)
            .field("reader", &self.reader.name())
            .finish()
    }
}

impl PtsScanner {
    pub fn new(config: &PtsConfig, reader: Box<dyn LabelReader>) -> Self {
        Self {
            root: config.root.clone(),
            max_nodes: config.max_nodes,
            signature: config.signature.clone(),
            reader,
        }
    }

    /// Picks the label reader for this platform once, up front.
    pub fn from_config(config: &PtsConfig) -> Self {
        let reader = select_label_reader(config.label_source, &config.root);
        Self::new(config, reader)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reader_name(&self) -> &'static str {
        self.reader.name()
    }

    /// Returns [`DetectionResult::MAGISK_PTS`] as soon as one node carries the
    /// signature label. Unreadable nodes are skipped.
    pub fn scan(&self) -> DetectionResult {
        for index in 0..self.max_nodes {
            let node = self.root.join(index.to_string());
            match node.try_exists() {
                Ok(true) => {}
                Ok(false) => {
                    debug!(root = %self.root.display(), count = index, "End of pts range");
                    break;
                }
                Err(e) => {
                    warn!(node = %node.display(), error = %e, "Cannot stat pts node");
                    break;
                }
            }

            let raw = match self.reader.read_label(&node) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(node = %node.display(), reader = self.reader.name(), error = %e, "Failed to read pts label");
                    continue;
                }
            };
            match decode_label(&raw) {
                Ok(label) if label == self.signature => {
                    warn!(node = %node.display(), label, "Found magisk pts");
                    return DetectionResult::MAGISK_PTS;
                }
                Ok(label) => trace!(node = %node.display(), label, "pts label"),
                Err(e) => warn!(node = %node.display(), error = %e, "pts label is not UTF-8"),
            }
        }
        DetectionResult::empty()
    }
}
