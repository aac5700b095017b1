use std::{path::PathBuf, time::Duration};

/// Default deadline for a whole DKG round.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);
/// Initial backoff delay for message redelivery.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
/// Maximum backoff delay for message redelivery.
pub const MAX_BACKOFF: Duration = Duration::from_millis(5000);

/// Configuration for running a party's DKG ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkgConfig {
    /// Deadline for the full round, from `dkg_init` to key derivation.
    pub deadline: Duration,
    /// First redelivery delay.
    pub initial_backoff: Duration,
    /// Upper bound on the redelivery delay.
    pub max_backoff: Duration,
    /// Directory to persist the output into, if any.
    pub data_dir: Option<PathBuf>,
}

impl Default for DkgConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            data_dir: None,
        }
    }
}

impl DkgConfig {
    /// Set the round deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the backoff bounds.
    #[must_use]
    pub const fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Persist outputs under `data_dir`.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }
}
