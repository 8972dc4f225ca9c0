//! Body of the probe process, entered through `hidewatch probe`.
//!
//! By the time this runs the process is an orphan named after the nice name.
//! It pokes the filesystem watch MagiskHide relies on, gives it time to
//! attach, then reports whoever is tracing it.

use crate::tracer::error::{ProbeError, Result};
use crate::tracer::{status, wire};
use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{FromRawFd, OwnedFd, RawFd};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Everything the probe needs, as handed over on its command line.
#[derive(Debug, Clone)]
pub struct ProbeArgs {
    pub write_fd: RawFd,
    pub nice_name: String,
    pub touch_path: PathBuf,
    pub delay: Duration,
    pub status_path: PathBuf,
}

/// Runs the probe and writes its single reply. Returns the tracer pid sent.
///
/// On error nothing is written and the channel closes when the process
/// exits, which the parent reports as a protocol failure.
pub fn run(args: &ProbeArgs) -> Result<i32> {
    let mut channel = adopt_write_fd(args.write_fd)?;

    set_process_name(&args.nice_name);
    touch(&args.touch_path);

    std::thread::sleep(args.delay);

    let tracer = status::read_tracer_pid(&args.status_path).map_err(|e| {
        error!(path = %args.status_path.display(), error = %e, "Failed to read tracer");
        ProbeError::Io(e)
    })?;
    info!(tracer, "Probe observed tracer");
    wire::write_reply(&mut channel, tracer)?;
    Ok(tracer)
}

fn adopt_write_fd(fd: RawFd) -> Result<File> {
    // Safety: F_GETFD only inspects the descriptor table.
    if fd < 0 || unsafe { libc::fcntl(fd, libc::F_GETFD) } == -1 {
        return Err(ProbeError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("bad write fd {fd}"),
        )));
    }
    // Safety: the descriptor was handed to this process for exclusive use.
    Ok(File::from(unsafe { OwnedFd::from_raw_fd(fd) }))
}

/// Sets the kernel thread name (`/proc/self/comm`) to `name`.
pub fn set_process_name(name: &str) {
    let Ok(cname) = CString::new(name) else {
        warn!(name, "Process name contains NUL");
        return;
    };
    // Safety: PR_SET_NAME copies at most 16 bytes from a valid C string.
    let rc = unsafe { libc::prctl(libc::PR_SET_NAME, cname.as_ptr() as libc::c_ulong, 0, 0, 0) };
    if rc != 0 {
        warn!(name, error = %io::Error::last_os_error(), "Failed to set process name");
    }
}

/// Reads one byte so the file shows up as accessed to inotify watchers.
fn touch(path: &std::path::Path) {
    let mut byte = [0u8; 1];
    if let Err(e) = File::open(path).and_then(|mut f| f.read(&mut byte)) {
        warn!(path = %path.display(), error = %e, "Failed to touch trigger file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pipe() -> (File, RawFd) {
        let mut fds = [0 as RawFd; 2];
        assert_eq!(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) }, 0);
        let reader = unsafe { File::from_raw_fd(fds[0]) };
        (reader, fds[1])
    }

    fn status_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    fn args(write_fd: RawFd, status: &tempfile::NamedTempFile) -> ProbeArgs {
        ProbeArgs {
            write_fd,
            // Renaming the test thread is harmless.
            nice_name: "hidewatch-test".into(),
            touch_path: status.path().to_path_buf(),
            delay: Duration::ZERO,
            status_path: status.path().to_path_buf(),
        }
    }

    #[test]
    fn reports_tracer_from_status() {
        let status = status_file("Name:\tzygote\nTracerPid:\t1234\n");
        let (mut reader, write_fd) = pipe();
        assert_eq!(run(&args(write_fd, &status)).unwrap(), 1234);
        assert_eq!(wire::read_reply(&mut reader).unwrap(), 1234);
    }

    #[test]
    fn unreadable_status_closes_without_reply() {
        let status = status_file("");
        let (mut reader, write_fd) = pipe();
        let mut a = args(write_fd, &status);
        a.status_path = PathBuf::from("/nonexistent/status");
        assert!(run(&a).is_err());
        assert!(matches!(
            wire::read_reply(&mut reader),
            Err(ProbeError::Closed)
        ));
    }

    #[test]
    fn invalid_fd_is_rejected() {
        let status = status_file("TracerPid:\t0\n");
        assert!(run(&args(-1, &status)).is_err());
    }
}
