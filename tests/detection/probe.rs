//! Runs the real fork/exec probe through the built binary.

use crate::common::hidewatch_bin;
use hidewatch::config::ProbeConfig;
use hidewatch::tracer::error::ProbeError;
use hidewatch::tracer::launch_probe;
use hidewatch::tracer::spawn::ForkExecSpawner;

fn quick_probe() -> ProbeConfig {
    ProbeConfig {
        delay_ms: 0,
        touch_path: "/proc/self/status".into(),
        ..ProbeConfig::default()
    }
}

#[test]
fn real_probe_reports_untraced() {
    let spawner = ForkExecSpawner::new(hidewatch_bin(), &quick_probe());
    let handle = launch_probe(&spawner).unwrap();
    assert!(handle.spawned_pid() > 0);
    // Nothing attaches to the probe under test.
    assert_eq!(handle.wait().unwrap(), 0);
}

#[test]
fn missing_executable_closes_the_channel() {
    let spawner = ForkExecSpawner::new("/nonexistent/hidewatch", &quick_probe());
    let handle = launch_probe(&spawner).unwrap();
    assert!(matches!(handle.wait(), Err(ProbeError::Closed)));
}
