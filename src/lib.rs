//! Runtime detection of root-hiding and tamper frameworks.
//!
//! A detection run combines three independent signals into one
//! [`DetectionResult`] bitmask:
//!
//! - property areas under `/dev/__properties__`, searched byte by byte for
//!   read-only properties with more than one value or revealing values
//!   ([`props`]);
//! - a decoy probe process disguised as zygote that reports whoever attaches
//!   to it ([`tracer`]);
//! - the SELinux labels of `/dev/pts` nodes ([`pts`]).
//!
//! [`detect`] runs everything with the default configuration. Use
//! [`Detector`] to customize paths or reuse the one-time setup.

pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod props;
pub mod pts;
pub mod result;
pub mod tracer;

pub use config::DetectConfig;
pub use detector::{detect, Detector};
pub use error::{DetectError, Result};
pub use result::{BootloaderState, DetectionReport, DetectionResult};
