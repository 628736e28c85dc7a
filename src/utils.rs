use std::{
    env,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::Local;

use crate::error::{EpubBuilderError, EpubError};

/// Returns the current time with custom format
pub fn local_time() -> String {
    Local::now().format("%Y-%m-%dT%H-%M-%S.%fU%z").to_string()
}

/// Default staging root, unique for every call
pub fn default_staging_root() -> PathBuf {
    env::temp_dir().join(format!("epub-staging-{}", local_time()))
}

/// Shared cancellation flag
///
/// Clones share the same flag, so a build can be cancelled from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Deadline and cancellation checks between build steps
#[derive(Debug)]
pub(crate) struct Watchdog {
    started: Instant,
    timeout: Option<Duration>,
    cancel: CancelFlag,
}

impl Watchdog {
    pub(crate) fn start(timeout: Option<Duration>, cancel: CancelFlag) -> Self {
        Self {
            started: Instant::now(),
            timeout,
            cancel,
        }
    }

    /// Fails when the build was cancelled or ran past its timeout
    ///
    /// `stage` names the step that just finished.
    pub(crate) fn check(&self, stage: &str) -> Result<(), EpubError> {
        if self.cancel.is_cancelled() {
            return Err(EpubBuilderError::Cancelled {
                stage: stage.to_string(),
            }
            .into());
        }

        if let Some(timeout) = self.timeout {
            if self.started.elapsed() > timeout {
                return Err(EpubBuilderError::Timeout {
                    stage: stage.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
