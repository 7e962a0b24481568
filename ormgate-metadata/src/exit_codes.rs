// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `ormgate` failures.
///
/// `ormgate` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum OrmgateExitCode {}

impl OrmgateExitCode {
    /// No errors occurred and the run was accepted against its baseline.
    pub const OK: i32 = 0;

    /// The run was rejected: an unexpected failure or unexpected skip was observed, or the
    /// configured policy rejected an unexpected pass or a not-run expected failure.
    pub const RUN_REJECTED: i32 = 100;

    /// A user issue happened while setting up an ormgate invocation: for example, the
    /// configuration failed to parse or the target version was malformed.
    pub const SETUP_ERROR: i32 = 96;

    /// No baseline covers the requested target version.
    pub const NO_BASELINE_FOR_VERSION: i32 = 97;

    /// The raw test-runner output could not be read.
    pub const INPUT_READ_ERROR: i32 = 98;

    /// Writing data to stdout, stderr or a report file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
