// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifying test outcomes against a baseline.

use crate::{baseline::Baseline, parser::TestOutcome};
use ormgate_metadata::CategorySummary;
use std::fmt;

/// The category a test outcome falls into once compared with the baseline.
///
/// Variants are listed in precedence order: see [`Category::from_flags`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// The test is in the ignored table. Its outcome doesn't matter.
    Ignored,

    /// The test was skipped, but the baseline expects it to fail.
    UnexpectedSkip,

    /// The test was skipped and the baseline has no expectation for it.
    ExpectedSkip,

    /// The test passed and the baseline has no expectation for it.
    ExpectedPass,

    /// The test passed, but the baseline expects it to fail.
    UnexpectedPass,

    /// The test failed and the baseline expects it to.
    ExpectedFailure,

    /// The test failed and the baseline doesn't expect it to.
    UnexpectedFailure,
}

impl Category {
    /// All categories, in precedence order.
    pub const ALL: [Self; 7] = [
        Self::Ignored,
        Self::UnexpectedSkip,
        Self::ExpectedSkip,
        Self::ExpectedPass,
        Self::UnexpectedPass,
        Self::ExpectedFailure,
        Self::UnexpectedFailure,
    ];

    /// Computes the category from an outcome's flags. The first matching rule wins:
    ///
    /// 1. ignored → `Ignored`
    /// 2. skipped and expected to fail → `UnexpectedSkip`
    /// 3. skipped → `ExpectedSkip`
    /// 4. passed and not expected to fail → `ExpectedPass`
    /// 5. passed → `UnexpectedPass`
    /// 6. failed and expected to fail → `ExpectedFailure`
    /// 7. failed → `UnexpectedFailure`
    pub fn from_flags(pass: bool, skipped: bool, ignored: bool, expected_failure: bool) -> Self {
        match (ignored, skipped, pass, expected_failure) {
            (true, _, _, _) => Self::Ignored,
            (false, true, _, true) => Self::UnexpectedSkip,
            (false, true, _, false) => Self::ExpectedSkip,
            (false, false, true, false) => Self::ExpectedPass,
            (false, false, true, true) => Self::UnexpectedPass,
            (false, false, false, true) => Self::ExpectedFailure,
            (false, false, false, false) => Self::UnexpectedFailure,
        }
    }

    /// Returns true if this category means the baseline has drifted from reality: the test now
    /// passes when it was expected to fail, or fails when it wasn't.
    pub fn is_drift(self) -> bool {
        matches!(self, Self::UnexpectedPass | Self::UnexpectedFailure)
    }

    /// Returns true if the test is currently failing.
    pub fn is_current_failure(self) -> bool {
        matches!(self, Self::ExpectedFailure | Self::UnexpectedFailure)
    }

    /// Returns true if this category rejects a run under the default acceptance policy.
    pub fn is_rejecting(self) -> bool {
        matches!(self, Self::UnexpectedSkip | Self::UnexpectedFailure)
    }

    /// Converts this category to its serializable form.
    pub fn to_summary(self) -> CategorySummary {
        match self {
            Self::Ignored => CategorySummary::Ignored,
            Self::UnexpectedSkip => CategorySummary::UnexpectedSkip,
            Self::ExpectedSkip => CategorySummary::ExpectedSkip,
            Self::ExpectedPass => CategorySummary::ExpectedPass,
            Self::UnexpectedPass => CategorySummary::UnexpectedPass,
            Self::ExpectedFailure => CategorySummary::ExpectedFailure,
            Self::UnexpectedFailure => CategorySummary::UnexpectedFailure,
        }
    }

    /// A short human-readable description, used in count lines.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::UnexpectedSkip => "expected failed but skipped",
            Self::ExpectedSkip => "skipped",
            Self::ExpectedPass => "passed",
            Self::UnexpectedPass => "passed unexpectedly",
            Self::ExpectedFailure => "failed",
            Self::UnexpectedFailure => "failed unexpectedly",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_summary().as_str())
    }
}

/// A test outcome together with its category and rendered verdict line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedResult {
    /// The test identifier.
    pub test_id: String,

    /// The raw status reported by the test runner.
    pub status: String,

    /// The category.
    pub category: Category,

    /// The baseline's issue reference for this test, if it has one.
    pub issue: Option<String>,

    /// The rendered verdict line, e.g. `--- PASS: <id> (expected)`.
    pub verdict: String,
}

/// Classifies a single outcome against `baseline`.
///
/// This is a pure function of its inputs.
pub fn classify(outcome: &TestOutcome, baseline: &Baseline) -> ClassifiedResult {
    let id = outcome.test_id.as_str();
    let ignored = baseline.ignored(id);
    let expected_failure = baseline.expected_failure(id);

    let category = Category::from_flags(
        outcome.kind.is_pass(),
        outcome.kind.is_skip(),
        ignored.is_some(),
        expected_failure.is_some(),
    );

    let issue = match category {
        Category::Ignored => ignored,
        _ => expected_failure,
    };

    // Only Ignored, UnexpectedPass and ExpectedFailure render an issue, and those categories
    // are only produced when the matching table has an entry.
    let rendered_issue = issue
        .map(|issue| baseline.render_issue(issue))
        .unwrap_or_default();
    let verdict = match category {
        Category::Ignored => format!("--- SKIP: {id} due to {rendered_issue} (expected, ignored)"),
        Category::UnexpectedSkip => format!("--- SKIP: {id} (unexpected)"),
        Category::ExpectedSkip => format!("--- SKIP: {id} (expected)"),
        Category::ExpectedPass => format!("--- PASS: {id} (expected)"),
        Category::UnexpectedPass => format!("--- PASS: {id} - {rendered_issue} (unexpected)"),
        Category::ExpectedFailure => format!("--- FAIL: {id} - {rendered_issue} (expected)"),
        Category::UnexpectedFailure => format!("--- FAIL: {id} (unexpected)"),
    };

    ClassifiedResult {
        test_id: outcome.test_id.clone(),
        status: outcome.status.clone(),
        category,
        issue: issue.map(str::to_owned),
        verdict,
    }
}
