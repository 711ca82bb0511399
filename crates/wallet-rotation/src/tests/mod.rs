//! Scenario tests for the rotation coordinator.
//!
//! Covered here, across one shared fake harness:
//! - Outcome classification for every new-key/old-key validity combination
//! - Crash resumability: `Resume` is equivalent to the tail of `Start`
//! - Finalize idempotence under retried runs
//! - Pending-attempt observation until resolution
//! - Per-account serialization of concurrent runs
