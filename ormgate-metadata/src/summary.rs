// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A serializable summary of one reconciliation run.
///
/// This is the output of `ormgate reconcile --message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReconcileSummary {
    /// The baseline family that was used, e.g. `sqlalchemy`.
    pub family: String,

    /// The name of the baseline that the target version resolved to.
    pub baseline: String,

    /// The target-system version, as `major.minor.point`.
    pub target_version: String,

    /// The version of the compliance suite that was run, if provided.
    #[serde(default)]
    pub suite_version: Option<String>,

    /// The overall verdict.
    pub verdict: VerdictSummary,

    /// Per-category counts.
    pub counts: CategoryCountsSummary,

    /// Every classified test, keyed by test identifier.
    pub tests: BTreeMap<String, TestResultSummary>,

    /// Tests whose observed outcome disagrees with the baseline, sorted by test identifier.
    pub drift: Vec<DriftEntrySummary>,

    /// Expected failures that did not appear in the run, mapped to their issue reference.
    #[serde(default)]
    pub not_run: BTreeMap<String, String>,

    /// An updated expected-failure table, present if the baseline has drifted.
    #[serde(default)]
    pub suggested_expected_failures: Option<BTreeMap<String, String>>,
}

impl ReconcileSummary {
    /// Parses JSON output from `ormgate reconcile --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Returns true if the run was accepted.
    pub fn is_accepted(&self) -> bool {
        self.verdict == VerdictSummary::Accepted
    }
}

/// The overall accept/reject verdict for a run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictSummary {
    /// The run matched the baseline closely enough to pass the gate.
    Accepted,

    /// The run was rejected.
    Rejected,
}

/// The classification category of a single test outcome.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategorySummary {
    /// The test is in the ignored table.
    Ignored,

    /// The test was skipped but is an expected failure.
    UnexpectedSkip,

    /// The test was skipped and is not an expected failure.
    ExpectedSkip,

    /// The test passed and is not an expected failure.
    ExpectedPass,

    /// The test passed but is an expected failure.
    UnexpectedPass,

    /// The test failed and is an expected failure.
    ExpectedFailure,

    /// The test failed and is not an expected failure.
    UnexpectedFailure,
}

impl CategorySummary {
    /// Returns the kebab-case string for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::UnexpectedSkip => "unexpected-skip",
            Self::ExpectedSkip => "expected-skip",
            Self::ExpectedPass => "expected-pass",
            Self::UnexpectedPass => "unexpected-pass",
            Self::ExpectedFailure => "expected-failure",
            Self::UnexpectedFailure => "unexpected-failure",
        }
    }
}

impl fmt::Display for CategorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts for each category, plus the derived totals.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryCountsSummary {
    /// The number of distinct tests seen in the run.
    pub total: usize,

    /// The number of ignored tests.
    pub ignored: usize,

    /// The number of expected failures that were skipped.
    pub unexpected_skip: usize,

    /// The number of tests that were skipped as expected.
    pub expected_skip: usize,

    /// The number of tests that passed as expected.
    pub expected_pass: usize,

    /// The number of expected failures that passed.
    pub unexpected_pass: usize,

    /// The number of tests that failed as expected.
    pub expected_failure: usize,

    /// The number of tests that failed unexpectedly.
    pub unexpected_failure: usize,

    /// The number of expected failures that did not appear in the run.
    pub not_run: usize,
}

/// The classification of a single test.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResultSummary {
    /// The category the test was classified into.
    pub category: CategorySummary,

    /// The raw status string reported by the test runner.
    pub status: String,

    /// The rendered verdict line.
    pub verdict: String,
}

/// A test whose outcome disagrees with the baseline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DriftEntrySummary {
    /// The test identifier.
    pub test_id: String,

    /// The category the test was classified into: either `unexpected-pass` or
    /// `unexpected-failure`.
    pub category: CategorySummary,

    /// The issue reference from the baseline, if any.
    #[serde(default)]
    pub issue: Option<String>,
}
