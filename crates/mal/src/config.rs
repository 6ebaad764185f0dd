//! Allocator configuration

/// What an allocator does when an operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Return the error to the caller
    Propagate,
    /// Log the error and abort the process (fail-fast debugging builds)
    Abort,
}

impl Default for FailureMode {
    /// `Abort` when built with the `abort-on-failure` feature, `Propagate` otherwise
    fn default() -> Self {
        if cfg!(feature = "abort-on-failure") {
            Self::Abort
        } else {
            Self::Propagate
        }
    }
}

/// Configuration shared by every region-backed allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// How failures are surfaced
    pub failure_mode: FailureMode,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for released memory (for debugging)
    ///
    /// Applied on `free` and `reset` before the allocator writes its own
    /// bookkeeping, so it never clobbers a pool link word.
    pub dealloc_pattern: Option<u8>,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            track_stats: cfg!(debug_assertions),
            dealloc_pattern: None,
        }
    }
}

impl AllocatorConfig {
    /// Production configuration - no tracking, no fills
    #[must_use]
    pub fn production() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            track_stats: false,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - stats on, released memory poisoned with `0xDD`
    #[must_use]
    pub fn debug() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            track_stats: true,
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Debug configuration that aborts on the first failure
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            failure_mode: FailureMode::Abort,
            ..Self::debug()
        }
    }

    /// Same configuration with a different failure mode
    #[must_use]
    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_where_expected() {
        assert!(!AllocatorConfig::production().track_stats);
        assert_eq!(AllocatorConfig::debug().dealloc_pattern, Some(0xDD));
        assert_eq!(AllocatorConfig::fail_fast().failure_mode, FailureMode::Abort);
    }

    #[cfg(not(feature = "abort-on-failure"))]
    #[test]
    fn test_default_mode_propagates() {
        assert_eq!(FailureMode::default(), FailureMode::Propagate);
        assert_eq!(
            AllocatorConfig::default().failure_mode,
            FailureMode::Propagate
        );
    }

    #[test]
    fn test_with_failure_mode_overrides_only_mode() {
        let config = AllocatorConfig::debug().with_failure_mode(FailureMode::Propagate);
        assert_eq!(config.failure_mode, FailureMode::Propagate);
        assert!(config.track_stats);
    }
}
