//! Integration tests for the failure mode switch
//!
//! `FailureMode::Abort` kills the process, so the aborting half runs in a
//! child copy of this test binary selected through an environment variable.

use std::process::{Command, Stdio};

use mal::prelude::*;

const CHILD_ENV: &str = "MAL_FAILURE_MODE_CHILD";

fn exhaust_arena(config: AllocatorConfig) -> MemoryResult<Block> {
    let mut arena = Arena::with_source(4096, SimulatedPages::new(), config)?;
    arena.alloc(4096)?;
    arena.alloc(1)
}

/// Re-run `test_name` from this binary with the child marker set
fn run_child(test_name: &str) -> std::process::ExitStatus {
    let exe = std::env::current_exe().expect("Failed to locate test binary");
    Command::new(exe)
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("Failed to spawn child test process")
}

#[test]
fn test_fail_fast_aborts_on_exhaustion() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let _ = exhaust_arena(AllocatorConfig::fail_fast());
        // only reached if the failure did not abort
        std::process::exit(0);
    }

    let status = run_child("test_fail_fast_aborts_on_exhaustion");
    assert!(!status.success(), "fail-fast child exited cleanly: {status:?}");

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(libc::SIGABRT));
    }
}

#[test]
fn test_fail_fast_aborts_on_invalid_config() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let _ = Pool::with_source(4096, 48, SimulatedPages::new(), AllocatorConfig::fail_fast());
        std::process::exit(0);
    }

    let status = run_child("test_fail_fast_aborts_on_invalid_config");
    assert!(!status.success(), "fail-fast child exited cleanly: {status:?}");
}

#[test]
fn test_propagate_returns_the_same_failure() {
    let config = AllocatorConfig::fail_fast().with_failure_mode(FailureMode::Propagate);
    let err = exhaust_arena(config).unwrap_err();
    assert_eq!(
        err,
        MemoryError::AllocationExhausted {
            allocator: "arena",
            requested: 1,
            available: 0,
            capacity: 4096,
        }
    );
    assert!(err.is_retryable());
}
