//! Tracer detection through a decoy probe process.
//!
//! [`launch_probe`] starts an orphaned child disguised as zygote and returns
//! immediately with a [`ProbeHandle`]. The child waits for a hiding framework
//! to attach to it and sends back its `TracerPid`. [`ProbeHandle::wait`]
//! blocks for that one reply.
//!
//! Unlike the property and pts checks, every failure here is fatal: a
//! missing reply cannot be read as "not traced".

pub mod child;
pub mod error;
pub mod spawn;
pub mod status;
pub mod wire;

use crate::tracer::error::{ProbeError, Result};
use crate::tracer::spawn::{DetachedSpawner, PipeEnds};
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, FromRawFd, OwnedFd, RawFd};
use tracing::{debug, info};

/// Parent side of a running probe. Consumed by [`ProbeHandle::wait`].
#[derive(Debug)]
pub struct ProbeHandle {
    reader: File,
    spawned_pid: u32,
}

impl ProbeHandle {
    /// Pid returned by the spawner. For [`spawn::ForkExecSpawner`] this is
    /// the intermediate process of the double fork, already reaped by the
    /// time the handle exists; the answering process has a different pid.
    pub fn spawned_pid(&self) -> u32 {
        self.spawned_pid
    }

    /// Blocks until the probe replies and returns the tracer pid (0 when
    /// untraced). A channel closed without a reply is [`ProbeError::Closed`].
    pub fn wait(mut self) -> Result<i32> {
        debug!(spawned_pid = self.spawned_pid, "Waiting for tracer probe");
        let tracer = wire::read_reply(&mut self.reader)?;
        debug!(spawned_pid = self.spawned_pid, tracer, "Tracer probe replied");
        Ok(tracer)
    }
}

/// Creates the probe channel, spawns the probe and drops the parent's copy
/// of the write end. Does not block on the probe.
pub fn launch_probe(spawner: &dyn DetachedSpawner) -> Result<ProbeHandle> {
    let (read, write) = channel().map_err(ProbeError::Pipe)?;
    let spawned_pid = spawner
        .spawn_detached(PipeEnds {
            read: read.as_fd(),
            write: write.as_fd(),
        })
        .map_err(ProbeError::Spawn)?;
    drop(write);
    info!(spawned_pid, "Tracer probe launched");
    Ok(ProbeHandle {
        reader: File::from(read),
        spawned_pid,
    })
}

/// A close-on-exec pipe as (read, write).
fn channel() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as RawFd; 2];
    // Safety: pipe2 writes two descriptors into the array on success.
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // Safety: both descriptors were just created and are owned by nobody else.
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}
