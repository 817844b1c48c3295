//! Tracing/logging setup shared by the binary and tests.

/// Install the process-wide subscriber.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

pub mod tracing;
