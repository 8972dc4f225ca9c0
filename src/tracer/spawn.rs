//! Spawning the probe as an orphaned process.
//!
//! MagiskHide only attaches to processes that look like a freshly started
//! zygote: parent pid 1 and the right name. The probe is therefore started
//! with a double fork so its parent exits immediately, then re-executes the
//! current binary in `probe` mode with `argv[0]` set to the nice name.

use crate::config::ProbeConfig;
use std::ffi::{CString, OsStr};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Upper bound on 1ms naps the grandchild takes while waiting to be reparented.
const ORPHAN_WAIT_SPINS: u32 = 500;

/// Both ends of the probe channel, borrowed from their owner for the
/// duration of the spawn.
#[derive(Debug, Clone, Copy)]
pub struct PipeEnds<'a> {
    pub read: BorrowedFd<'a>,
    pub write: BorrowedFd<'a>,
}

/// Starts the process that will answer on the probe channel.
///
/// Implementations must leave the spawned process holding its own copy of
/// `ends.write`; the caller closes its copy as soon as this returns.
pub trait DetachedSpawner: Send + Sync {
    /// Returns the pid of the process that was forked directly. With a double
    /// fork this is the short-lived intermediate, not the answering process.
    fn spawn_detached(&self, ends: PipeEnds<'_>) -> io::Result<u32>;
}

/// Double-fork + `execv` of a probe executable.
#[derive(Debug, Clone)]
pub struct ForkExecSpawner {
    executable: PathBuf,
    nice_name: String,
    touch_path: PathBuf,
    delay: Duration,
}

impl ForkExecSpawner {
    pub fn new(executable: impl Into<PathBuf>, config: &ProbeConfig) -> Self {
        Self {
            executable: executable.into(),
            nice_name: config.nice_name.clone(),
            touch_path: config.touch_path.clone(),
            delay: config.delay(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command line of the probe; `argv[0]` is the disguise name.
    pub fn argv(&self, write_fd: RawFd) -> Vec<String> {
        vec![
            self.nice_name.clone(),
            "probe".into(),
            "--write-fd".into(),
            write_fd.to_string(),
            "--delay-ms".into(),
            self.delay.as_millis().to_string(),
            "--touch".into(),
            self.touch_path.display().to_string(),
            "--nice-name".into(),
            self.nice_name.clone(),
        ]
    }
}

fn to_cstring(s: &OsStr) -> io::Result<CString> {
    CString::new(s.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

impl DetachedSpawner for ForkExecSpawner {
    fn spawn_detached(&self, ends: PipeEnds<'_>) -> io::Result<u32> {
        // Everything the children touch is allocated before fork.
        let exe = to_cstring(self.executable.as_os_str())?;
        let args = self
            .argv(ends.write.as_raw_fd())
            .iter()
            .map(|a| to_cstring(OsStr::new(a)))
            .collect::<io::Result<Vec<_>>>()?;
        let argv: Vec<*const libc::c_char> = args
            .iter()
            .map(|a| a.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();
        let read_fd = ends.read.as_raw_fd();
        let write_fd = ends.write.as_raw_fd();

        debug!(executable = %self.executable.display(), args = ?self.argv(write_fd), "Forking tracer probe");

        // Safety: the child only runs async-signal-safe calls on pre-allocated data.
        match unsafe { libc::fork() } {
            -1 => Err(io::Error::last_os_error()),
            0 => unsafe { detach_and_exec(read_fd, write_fd, &exe, &argv) },
            child => {
                reap(child)?;
                Ok(child as u32)
            }
        }
    }
}

/// Runs in the first child. Forks the probe, exits, and in the probe waits to
/// be reparented before exec'ing.
unsafe fn detach_and_exec(
    read_fd: RawFd,
    write_fd: RawFd,
    exe: &CString,
    argv: &[*const libc::c_char],
) -> ! {
    libc::close(read_fd);
    let intermediate = libc::getpid();
    match libc::fork() {
        -1 => {
            // Closing our copy lets the parent see end-of-stream.
            libc::close(write_fd);
            libc::_exit(1)
        }
        0 => {}
        _ => libc::_exit(0),
    }

    libc::setsid();
    let nap = libc::timespec {
        tv_sec: 0,
        tv_nsec: 1_000_000,
    };
    let mut spins = 0;
    while libc::getppid() == intermediate && spins < ORPHAN_WAIT_SPINS {
        libc::nanosleep(&nap, std::ptr::null_mut());
        spins += 1;
    }

    // The channel is close-on-exec everywhere except in the probe itself.
    let flags = libc::fcntl(write_fd, libc::F_GETFD);
    if flags != -1 {
        libc::fcntl(write_fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC);
    }
    libc::execv(exe.as_ptr(), argv.as_ptr());
    libc::_exit(127)
}

/// Collects the intermediate child so it does not linger as a zombie.
///
/// A host that ignores `SIGCHLD` has the kernel reap it instead, which
/// `waitpid` reports as `ECHILD`.
fn reap(pid: libc::pid_t) -> io::Result<()> {
    let mut status = 0;
    loop {
        // Safety: plain syscall on a pid we forked.
        if unsafe { libc::waitpid(pid, &mut status, 0) } == pid {
            break;
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::ECHILD) => {
                debug!(pid, "Intermediate probe process already reaped");
                return Ok(());
            }
            _ => return Err(err),
        }
    }
    if libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0 {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "intermediate probe process exited abnormally (status {status:#x})"
        )))
    }
}
