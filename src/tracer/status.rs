//! `TracerPid` lookup in `/proc/<pid>/status`.

use std::io;
use std::path::Path;

pub const SELF_STATUS: &str = "/proc/self/status";

/// Extracts the `TracerPid:` value. A status without that line reports 0.
pub fn parse_tracer_pid(status: &str) -> io::Result<i32> {
    match status.lines().find_map(|line| line.strip_prefix("TracerPid:")) {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("TracerPid {v:?}: {e}"))
        }),
    }
}

/// Reads the tracer of the process described by `path`.
pub fn read_tracer_pid<P: AsRef<Path>>(path: P) -> io::Result<i32> {
    parse_tracer_pid(&std::fs::read_to_string(path)?)
}
