//! Orchestration of a full detection run.

use crate::config::DetectConfig;
use crate::error::{DetectError, Result};
use crate::props::checker::PropertyChecker;
use crate::pts::PtsScanner;
use crate::result::DetectionResult;
use crate::tracer::launch_probe;
use crate::tracer::spawn::{DetachedSpawner, ForkExecSpawner};
use tracing::{error, info, info_span};

/// Holds everything that is set up once: the selected label reader and the
/// probe spawner. Each [`Detector::detect`] call is an independent run.
pub struct Detector {
    config: DetectConfig,
    pts: PtsScanner,
    spawner: Box<dyn DetachedSpawner>,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .field("pts", &self.pts)
            .finish_non_exhaustive()
    }
}

impl Detector {
    /// Resolves the probe executable and picks the label reader.
    pub fn new(config: DetectConfig) -> Result<Self> {
        let executable = match &config.probe.executable {
            Some(path) => path.clone(),
            None => std::env::current_exe()?,
        };
        let spawner = ForkExecSpawner::new(executable, &config.probe);
        let pts = PtsScanner::from_config(&config.pts);
        info!(
            probe = %spawner.executable().display(),
            label_reader = pts.reader_name(),
            "Detector initialized"
        );
        Ok(Self::with_parts(config, pts, Box::new(spawner)))
    }

    /// Assembles a detector from explicit parts.
    pub fn with_parts(config: DetectConfig, pts: PtsScanner, spawner: Box<dyn DetachedSpawner>) -> Self {
        Self {
            config,
            pts,
            spawner,
        }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Runs every check and merges the flags.
    ///
    /// The probe is launched first so its delay overlaps the synchronous
    /// checks. Property and pts failures only clear their own flags; a probe
    /// that cannot be launched or does not answer fails the whole run.
    pub fn detect(&self) -> Result<DetectionResult> {
        let span = info_span!("detect");
        let _guard = span.enter();

        let probe = launch_probe(self.spawner.as_ref()).map_err(DetectError::LaunchTracer)?;

        let mut result = PropertyChecker::new(&self.config.props).check_all();
        result |= self.pts.scan();

        let tracer = probe.wait().map_err(DetectError::WaitTracer)?;
        if tracer != 0 {
            error!(tracer, "Found magiskd");
            result |= DetectionResult::TRACER;
        }

        info!(bits = result.bits(), flags = ?result, "Detection finished");
        Ok(result)
    }
}

/// Runs one detection with the default configuration and returns the stable
/// bitmask.
pub fn detect() -> Result<u32> {
    Detector::new(DetectConfig::default())?
        .detect()
        .map(|r| r.bits())
}
