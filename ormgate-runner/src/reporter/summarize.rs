// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    aggregator::ResultSet,
    baseline::Baseline,
    classify::Category,
    errors::WriteReportError,
    helpers::plural,
    version::TargetVersion,
};
use ormgate_metadata::{
    CategoryCountsSummary, DriftEntrySummary, ReconcileSummary, TestResultSummary, VerdictSummary,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The issue reference recorded for current failures that have none in the baseline.
pub const UNKNOWN_ISSUE: &str = "unknown";

/// Which outcomes reject a run.
///
/// Unexpected skips and unexpected failures always reject a run. This policy can make the gate
/// stricter, and is read from the `[policy]` section of the config.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AcceptancePolicy {
    /// Reject the run if an expected failure passed.
    pub fail_on_unexpected_pass: bool,

    /// Reject the run if an expected failure did not appear in the output at all.
    pub fail_on_not_run: bool,
}

/// Information about a run that isn't derived from its results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportHeader {
    /// The baseline family, e.g. `sqlalchemy`.
    pub family: String,

    /// The target-system version.
    pub target_version: TargetVersion,

    /// The version of the compliance suite that was run, e.g. `rel_1_3_17`.
    pub suite_version: Option<String>,
}

/// A reason a run was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Expected failures were skipped.
    UnexpectedSkip(usize),

    /// Tests failed that the baseline doesn't expect to fail.
    UnexpectedFailure(usize),

    /// Expected failures passed, and the policy rejects that.
    UnexpectedPass(usize),

    /// Expected failures did not run, and the policy rejects that.
    NotRun(usize),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UnexpectedSkip(n) => write!(
                f,
                "{n} expected {} skipped",
                if n == 1 { "failure was" } else { "failures were" }
            ),
            Self::UnexpectedFailure(n) => {
                write!(f, "{n} {} failed unexpectedly", plural::tests_str(n))
            }
            Self::UnexpectedPass(n) => {
                write!(f, "{n} {} passed unexpectedly", plural::tests_str(n))
            }
            Self::NotRun(n) => write!(
                f,
                "{n} expected {} not run",
                if n == 1 { "failure was" } else { "failures were" }
            ),
        }
    }
}

/// The verdict for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The run is accepted.
    Accepted,

    /// The run is rejected for one or more reasons.
    Rejected {
        /// The reasons, in a fixed order.
        reasons: Vec<RejectReason>,
    },
}

impl Verdict {
    /// Returns true if the run is accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Converts this verdict to its serializable form.
    pub fn to_summary(&self) -> VerdictSummary {
        match self {
            Self::Accepted => VerdictSummary::Accepted,
            Self::Rejected { .. } => VerdictSummary::Rejected,
        }
    }
}

/// Applies an [`AcceptancePolicy`] to a [`ResultSet`].
#[derive(Clone, Debug, Default)]
pub struct ReportSummarizer {
    policy: AcceptancePolicy,
}

impl ReportSummarizer {
    /// Creates a new summarizer with the given policy.
    pub fn new(policy: AcceptancePolicy) -> Self {
        Self { policy }
    }

    /// Summarizes `results`, which were classified against `baseline`.
    pub fn summarize<'a>(
        &self,
        results: &'a ResultSet,
        baseline: &'a Baseline,
    ) -> ReconcileReport<'a> {
        // An expected failure that is also ignored is ignored, so it can't be "not run".
        let not_run: BTreeMap<&'a str, &'a str> = baseline
            .expected_failures()
            .iter()
            .filter(|(id, _)| results.get(id).is_none() && baseline.ignored(id).is_none())
            .map(|(id, issue)| (id.as_str(), issue.as_str()))
            .collect();

        let counts = results.counts();
        let mut reasons = Vec::new();
        let unexpected_skip = counts.get(Category::UnexpectedSkip);
        if unexpected_skip > 0 {
            reasons.push(RejectReason::UnexpectedSkip(unexpected_skip));
        }
        let unexpected_failure = counts.get(Category::UnexpectedFailure);
        if unexpected_failure > 0 {
            reasons.push(RejectReason::UnexpectedFailure(unexpected_failure));
        }
        let unexpected_pass = counts.get(Category::UnexpectedPass);
        if self.policy.fail_on_unexpected_pass && unexpected_pass > 0 {
            reasons.push(RejectReason::UnexpectedPass(unexpected_pass));
        }
        if self.policy.fail_on_not_run && !not_run.is_empty() {
            reasons.push(RejectReason::NotRun(not_run.len()));
        }

        let verdict = if reasons.is_empty() {
            Verdict::Accepted
        } else {
            Verdict::Rejected { reasons }
        };

        let suggested_expected_failures =
            if results.has_drift() || unexpected_skip > 0 || !not_run.is_empty() {
                Some(suggest_expected_failures(results, baseline))
            } else {
                None
            };

        ReconcileReport {
            results,
            baseline,
            not_run,
            verdict,
            suggested_expected_failures,
        }
    }
}

/// The expected-failure table the baseline would need for this run to match it exactly: every
/// current failure, plus skipped expected failures since a skip says nothing about whether the
/// underlying issue is fixed.
fn suggest_expected_failures(
    results: &ResultSet,
    baseline: &Baseline,
) -> BTreeMap<String, String> {
    results
        .results()
        .filter(|result| {
            result.category.is_current_failure() || result.category == Category::UnexpectedSkip
        })
        .map(|result| {
            let issue = baseline
                .expected_failure(&result.test_id)
                .unwrap_or(UNKNOWN_ISSUE);
            (result.test_id.clone(), issue.to_owned())
        })
        .collect()
}

/// The outcome of reconciling a run against a baseline.
#[derive(Clone, Debug)]
pub struct ReconcileReport<'a> {
    results: &'a ResultSet,
    baseline: &'a Baseline,
    not_run: BTreeMap<&'a str, &'a str>,
    verdict: Verdict,
    suggested_expected_failures: Option<BTreeMap<String, String>>,
}

impl<'a> ReconcileReport<'a> {
    /// The aggregated results.
    pub fn results(&self) -> &'a ResultSet {
        self.results
    }

    /// The baseline the results were classified against.
    pub fn baseline(&self) -> &'a Baseline {
        self.baseline
    }

    /// Expected failures that did not appear in the run, mapped to their issue reference.
    pub fn not_run(&self) -> &BTreeMap<&'a str, &'a str> {
        &self.not_run
    }

    /// The verdict.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    /// Returns true if the run is accepted.
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// The verdict line for an expected failure that did not run.
    pub fn not_run_verdict(&self, test_id: &str, issue: &str) -> String {
        format!(
            "--- FAIL: {test_id} - {} (not run)",
            self.baseline.render_issue(issue)
        )
    }

    /// An updated expected-failure table, present if the results disagree with the baseline.
    pub fn suggested_expected_failures(&self) -> Option<&BTreeMap<String, String>> {
        self.suggested_expected_failures.as_ref()
    }

    /// Renders the suggested expected-failure table as a TOML snippet that can be pasted into
    /// the config.
    pub fn suggested_baseline_toml(&self) -> Result<Option<String>, WriteReportError> {
        #[derive(Serialize)]
        #[serde(rename_all = "kebab-case")]
        struct SuggestedBaseline<'b> {
            expected_failures: &'b BTreeMap<String, String>,
        }

        self.suggested_expected_failures
            .as_ref()
            .map(|expected_failures| {
                toml::to_string(&SuggestedBaseline { expected_failures })
                    .map_err(WriteReportError::SuggestedBaseline)
            })
            .transpose()
    }

    /// Converts this report into its serializable form.
    pub fn to_summary(&self, header: &ReportHeader) -> ReconcileSummary {
        let counts = self.results.counts();
        let tests = self
            .results
            .results()
            .map(|result| {
                (
                    result.test_id.clone(),
                    TestResultSummary {
                        category: result.category.to_summary(),
                        status: result.status.clone(),
                        verdict: result.verdict.clone(),
                    },
                )
            })
            .collect();
        let drift = self
            .results
            .drift()
            .map(|result| DriftEntrySummary {
                test_id: result.test_id.clone(),
                category: result.category.to_summary(),
                issue: result.issue.clone(),
            })
            .collect();

        ReconcileSummary {
            family: header.family.clone(),
            baseline: self.baseline.name().to_owned(),
            target_version: header.target_version.to_string(),
            suite_version: header.suite_version.clone(),
            verdict: self.verdict.to_summary(),
            counts: CategoryCountsSummary {
                total: self.results.total(),
                ignored: counts.get(Category::Ignored),
                unexpected_skip: counts.get(Category::UnexpectedSkip),
                expected_skip: counts.get(Category::ExpectedSkip),
                expected_pass: counts.get(Category::ExpectedPass),
                unexpected_pass: counts.get(Category::UnexpectedPass),
                expected_failure: counts.get(Category::ExpectedFailure),
                unexpected_failure: counts.get(Category::UnexpectedFailure),
                not_run: self.not_run.len(),
            },
            tests,
            drift,
            not_run: self
                .not_run
                .iter()
                .map(|(id, issue)| ((*id).to_owned(), (*issue).to_owned()))
                .collect(),
            suggested_expected_failures: self.suggested_expected_failures.clone(),
        }
    }
}
