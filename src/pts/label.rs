//! Reading SELinux labels of filesystem nodes.
//!
//! Two strategies exist. Newer platforms expose the label through
//! `getxattr("security.selinux")`; older ones only through the privileged
//! file-context lookup that `ls -Z` performs. The strategy is chosen once by
//! [`select_label_reader`].

use crate::config::LabelSource;
use std::ffi::{CStr, CString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::Utf8Error;
use tracing::{debug, info};

pub const SELINUX_XATTR: &CStr = c"security.selinux";

/// Labels are short; anything beyond this is treated as an error.
const MAX_LABEL_LEN: usize = 4096;

/// Reads the raw security label of a path.
pub trait LabelReader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw label bytes. May include a trailing NUL.
    fn read_label(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Trims `raw` at its first NUL and decodes it as UTF-8.
pub fn decode_label(raw: &[u8]) -> Result<&str, Utf8Error> {
    let end = memchr::memchr(0, raw).unwrap_or(raw.len());
    std::str::from_utf8(&raw[..end])
}

/// `getxattr(path, "security.selinux")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrLabelReader;

impl LabelReader for XattrLabelReader {
    fn name(&self) -> &'static str {
        "xattr"
    }

    fn read_label(&self, path: &Path) -> io::Result<Vec<u8>> {
        let cpath = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut buf = vec![0u8; 256];
        loop {
            // Safety: both strings are NUL-terminated and buf is writable for its length.
            let n = unsafe {
                libc::getxattr(
                    cpath.as_ptr(),
                    SELINUX_XATTR.as_ptr(),
                    buf.as_mut_ptr().cast(),
                    buf.len(),
                )
            };
            if n >= 0 {
                buf.truncate(n as usize);
                return Ok(buf);
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ERANGE) && buf.len() < MAX_LABEL_LEN {
                buf.resize(buf.len() * 4, 0);
                continue;
            }
            return Err(err);
        }
    }
}

/// File-context lookup through `ls -Zd`.
#[derive(Debug, Clone)]
pub struct LsLabelReader {
    program: PathBuf,
}

impl Default for LsLabelReader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ls"),
        }
    }
}

impl LsLabelReader {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Picks the SELinux context out of one line of `ls -Z` output. Both toolbox
/// (`crw------- shell tty u:object_r:devpts:s0 0`) and toybox
/// (`u:object_r:devpts:s0 /dev/pts/0`) layouts are accepted.
pub fn parse_ls_context(output: &str) -> Option<&str> {
    output
        .split_whitespace()
        .find(|token| token.matches(':').count() >= 3)
}

impl LabelReader for LsLabelReader {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn read_label(&self, path: &Path) -> io::Result<Vec<u8>> {
        let output = Command::new(&self.program).arg("-Zd").arg(path).output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ls_context(&stdout)
            .map(|label| label.as_bytes().to_vec())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("no security context in {:?}", stdout.trim()),
                )
            })
    }
}

/// Chooses the label reader for this platform.
///
/// `Auto` tries `getxattr` once on `probe_path`; only "not supported" answers
/// fall back to `ls`. Any other outcome, including a missing attribute, means
/// the xattr interface itself works.
pub fn select_label_reader(source: LabelSource, probe_path: &Path) -> Box<dyn LabelReader> {
    let reader: Box<dyn LabelReader> = match source {
        LabelSource::Xattr => Box::new(XattrLabelReader),
        LabelSource::Ls => Box::new(LsLabelReader::default()),
        LabelSource::Auto => match XattrLabelReader.read_label(probe_path) {
            Err(e) if matches!(e.raw_os_error(), Some(libc::ENOTSUP) | Some(libc::ENOSYS)) => {
                info!(error = %e, "getxattr unsupported, falling back to ls -Z");
                Box::new(LsLabelReader::default())
            }
            _ => Box::new(XattrLabelReader),
        },
    };
    debug!(?source, reader = reader.name(), "Selected label reader");
    reader
}
