//! Common test utilities and helpers.
//!
//! Synthetic property areas and pts trees shared by the integration tests.

#![allow(dead_code)]

use hidewatch::props::area::{area_path, HEADER_SIZE, LONG_PROP_FLAG, PROP_AREA_MAGIC, PROP_AREA_VERSION, PROP_VALUE_MAX};
use std::path::Path;

/// Builds the bytes of a property area record by record.
#[derive(Debug, Clone)]
pub struct AreaBuilder {
    magic: u32,
    version: u32,
    records: Vec<u8>,
}

impl Default for AreaBuilder {
    fn default() -> Self {
        Self {
            magic: PROP_AREA_MAGIC,
            version: PROP_AREA_VERSION,
            records: Vec::new(),
        }
    }
}

impl AreaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Appends an inline-value record.
    pub fn prop(self, name: &str, value: &str) -> Self {
        self.record(0, value.as_bytes(), name)
    }

    /// Appends a record whose value lives out of line.
    pub fn long_prop(self, name: &str) -> Self {
        self.record(LONG_PROP_FLAG, b"Must use __system_property_read_callback()", name)
    }

    /// Appends raw filler, e.g. trie nodes.
    pub fn filler(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn record(mut self, serial: u32, value: &[u8], name: &str) -> Self {
        self.records.extend_from_slice(&serial.to_ne_bytes());
        let mut slot = [0u8; PROP_VALUE_MAX];
        let n = value.len().min(PROP_VALUE_MAX);
        slot[..n].copy_from_slice(&value[..n]);
        self.records.extend_from_slice(&slot);
        self.records.extend_from_slice(name.as_bytes());
        self.records.push(0);
        // prop_info records are 4-byte aligned.
        while self.records.len() % 4 != 0 {
            self.records.push(0);
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.records.len());
        out.extend_from_slice(&(self.records.len() as u32).to_ne_bytes());
        out.extend_from_slice(&1u32.to_ne_bytes());
        out.extend_from_slice(&self.magic.to_ne_bytes());
        out.extend_from_slice(&self.version.to_ne_bytes());
        out.extend_from_slice(&[0u8; 28]);
        out.extend_from_slice(&self.records);
        out
    }

    /// Writes the area as `<root>/u:object_r:<name>:s0`.
    pub fn write_to(&self, root: &Path, name: &str) {
        std::fs::write(area_path(root, name), self.build()).unwrap();
    }
}

/// Creates `count` contiguous pts nodes under `root`.
pub fn make_pts_nodes(root: &Path, count: u32) {
    for i in 0..count {
        std::fs::write(root.join(i.to_string()), b"").unwrap();
    }
}

/// Path of the built CLI binary.
pub fn hidewatch_bin() -> &'static str {
    env!("CARGO_BIN_EXE_hidewatch")
}
