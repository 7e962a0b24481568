// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [ormgate](https://crates.io/crates/ormgate).
//!
//! `ormgate reconcile --message-format json` prints a [`ReconcileSummary`] to standard output.
//! CI tooling can deserialize it with this crate to inspect the verdict, the per-category counts
//! and the drift against the baseline without scraping the human-readable report.
//!
//! Process exit codes are documented in [`OrmgateExitCode`].

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
