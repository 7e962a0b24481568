// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use ormgate_metadata::OrmgateExitCode;
use ormgate_runner::{errors::*, reporter::RejectReason};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which colorizes them.

/// An error that ormgate expects to happen in normal operation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("family select error")]
    FamilySelectError {
        #[from]
        err: FamilySelectError,
    },
    #[error("target version parse error")]
    TargetVersionParseError {
        #[from]
        err: TargetVersionParseError,
    },
    #[error("no baseline for version")]
    NoBaselineForVersion {
        #[from]
        err: NoBaselineForVersion,
    },
    #[error("error reading test results")]
    InputReadError {
        /// The path read from, or `None` for standard input.
        path: Option<Utf8PathBuf>,
        #[source]
        err: std::io::Error,
    },
    #[error("error writing report")]
    WriteReportError {
        #[from]
        err: WriteReportError,
    },
    #[error("run rejected")]
    RunRejected { reasons: Vec<RejectReason> },
}

impl ExpectedError {
    pub(crate) fn input_read_error(path: Option<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::InputReadError { path, err }
    }

    pub(crate) fn run_rejected(reasons: Vec<RejectReason>) -> Self {
        Self::RunRejected { reasons }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::FamilySelectError { .. }
            | Self::TargetVersionParseError { .. } => OrmgateExitCode::SETUP_ERROR,
            Self::NoBaselineForVersion { .. } => OrmgateExitCode::NO_BASELINE_FOR_VERSION,
            Self::InputReadError { .. } => OrmgateExitCode::INPUT_READ_ERROR,
            Self::WriteReportError { .. } => OrmgateExitCode::WRITE_OUTPUT_ERROR,
            Self::RunRejected { .. } => OrmgateExitCode::RUN_REJECTED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse ormgate config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::FamilySelectError { err } => {
                error!("{err}");
                err.source()
            }
            Self::TargetVersionParseError { err } => {
                error!("{err}");
                err.source()
            }
            Self::NoBaselineForVersion { err } => {
                error!("{err}");
                err.source()
            }
            Self::InputReadError { path, err } => {
                match path {
                    Some(path) => {
                        error!("failed to read test results from `{}`", path.style(styles.bold))
                    }
                    None => error!("failed to read test results from standard input"),
                }
                Some(err as &dyn Error)
            }
            Self::WriteReportError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RunRejected { reasons } => {
                let reasons = reasons
                    .iter()
                    .map(|reason| reason.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                error!(
                    "run {}: {}",
                    "rejected".style(styles.warning_text),
                    reasons
                );
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
