// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [ormgate](https://crates.io/crates/ormgate).
//!
//! ormgate reconciles the output of an ORM driver's compliance test suite against a
//! version-pinned baseline of known failures. The flow is strictly one way:
//!
//! 1. A [`TargetVersion`](version::TargetVersion) is resolved to a
//!    [`Baseline`](baseline::Baseline) through a [`BaselineRegistry`](baseline::BaselineRegistry).
//! 2. The raw test-runner output is turned into [`TestOutcome`](parser::TestOutcome)s by an
//!    [`OutcomeParser`](parser::OutcomeParser).
//! 3. Each outcome is [classified](classify::classify) against the baseline.
//! 4. Classified results are folded into a [`ResultSet`](aggregator::ResultSet).
//! 5. The [`ReportSummarizer`](reporter::ReportSummarizer) applies the acceptance policy and
//!    produces a [`ReconcileReport`](reporter::ReconcileReport).

pub mod aggregator;
pub mod baseline;
pub mod classify;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod parser;
pub mod reporter;
pub mod version;
pub mod write_str;
