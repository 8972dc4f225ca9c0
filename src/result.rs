//! Detection flags and their presentation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Outcome of one detection run. Bit values are stable; callers branch on
    /// them directly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DetectionResult: u32 {
        /// Something is tracing the probe process (usually MagiskHide).
        const TRACER = 1 << 0;
        /// Verified boot reports an unlocked bootloader.
        const BOOTLOADER_UNLOCKED = 1 << 1;
        /// Verified boot reports a self-signed image.
        const BOOTLOADER_SELF_SIGNED = 1 << 2;
        /// Riru is registered as the native bridge.
        const RIRU = 1 << 3;
        /// A read-only property was rewritten (resetprop).
        const RESETPROP = 1 << 4;
        /// A live `magisk su` pseudo-terminal exists.
        const MAGISK_PTS = 1 << 5;
    }
}

impl DetectionResult {
    /// Sets unlocked and drops self-signed; unlocked always wins.
    pub fn mark_unlocked(&mut self) {
        self.insert(Self::BOOTLOADER_UNLOCKED);
        self.remove(Self::BOOTLOADER_SELF_SIGNED);
    }

    pub fn bootloader(&self) -> BootloaderState {
        if self.contains(Self::BOOTLOADER_UNLOCKED) {
            BootloaderState::Unlocked
        } else if self.contains(Self::BOOTLOADER_SELF_SIGNED) {
            BootloaderState::SelfSigned
        } else {
            BootloaderState::Locked
        }
    }

    pub fn report(&self) -> DetectionReport {
        DetectionReport {
            bits: self.bits(),
            tracer: self.contains(Self::TRACER),
            bootloader: self.bootloader(),
            riru: self.contains(Self::RIRU),
            resetprop: self.contains(Self::RESETPROP),
            magisk_pts: self.contains(Self::MAGISK_PTS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootloaderState {
    Locked,
    SelfSigned,
    Unlocked,
}

impl BootloaderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootloaderState::Locked => "locked",
            BootloaderState::SelfSigned => "self-signed",
            BootloaderState::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for BootloaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened, serializable view of a [`DetectionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub bits: u32,
    pub tracer: bool,
    pub bootloader: BootloaderState,
    pub riru: bool,
    pub resetprop: bool,
    pub magisk_pts: bool,
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let found = |b: bool| if b { "found" } else { "not found" };
        writeln!(f, "Tracer: {}", found(self.tracer))?;
        writeln!(f, "Resetprop: {}", found(self.resetprop))?;
        writeln!(f, "Riru: {}", found(self.riru))?;
        writeln!(f, "Bootloader: {}", self.bootloader)?;
        write!(f, "Magisk pts: {}", found(self.magisk_pts))
    }
}
