// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deciding the verdict for a run and reporting it in human and machine-readable formats.
//!
//! The main type here is [`ReportSummarizer`], which turns a
//! [`ResultSet`](crate::aggregator::ResultSet) into a [`ReconcileReport`]. The report can then be
//! rendered with a [`ReportDisplayer`], written out as JUnit XML, or converted into a serializable
//! [`ReconcileSummary`](ormgate_metadata::ReconcileSummary).

mod displayer;
mod helpers;
mod junit;
mod summarize;

pub use displayer::*;
pub use summarize::*;
