// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from reconciled results.

use super::{ReconcileReport, ReportHeader};
use crate::{classify::Category, errors::WriteReportError};
use camino::Utf8Path;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::fs::File;

static REPORT_NAME: &str = "ormgate";

impl ReconcileReport<'_> {
    /// Builds a JUnit report with one test suite for the baseline and one test case per test.
    ///
    /// Unexpected failures and unexpected skips are reported as failures. Expected failures,
    /// skips, ignored tests and expected failures that did not run are reported as skipped.
    pub fn to_junit(&self, header: &ReportHeader) -> Report {
        let mut test_suite = TestSuite::new(format!(
            "{}@{} ({})",
            header.family,
            header.target_version,
            self.baseline().name()
        ));

        for result in self.results().results() {
            let status = match result.category {
                Category::ExpectedPass | Category::UnexpectedPass => TestCaseStatus::success(),
                Category::UnexpectedFailure | Category::UnexpectedSkip => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status
                        .set_message(result.verdict.as_str())
                        .set_type(result.status.as_str());
                    status
                }
                Category::ExpectedFailure | Category::ExpectedSkip | Category::Ignored => {
                    let mut status = TestCaseStatus::skipped();
                    status.set_message(result.verdict.as_str());
                    status
                }
            };
            test_suite.add_test_case(new_test_case(&result.test_id, status));
        }

        for (test_id, issue) in self.not_run() {
            let mut status = TestCaseStatus::skipped();
            status.set_message(self.not_run_verdict(test_id, issue));
            test_suite.add_test_case(new_test_case(test_id, status));
        }

        let mut report = Report::new(REPORT_NAME);
        report.add_test_suite(test_suite);
        report
    }

    /// Writes a JUnit report to `path`, creating parent directories as needed.
    pub fn write_junit(
        &self,
        header: &ReportHeader,
        path: &Utf8Path,
    ) -> Result<(), WriteReportError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
                file: dir.to_path_buf(),
                error,
            })?;
        }

        let f = File::create(path).map_err(|error| WriteReportError::Fs {
            file: path.to_path_buf(),
            error,
        })?;
        self.to_junit(header)
            .serialize(f)
            .map_err(|error| WriteReportError::Junit {
                file: path.to_path_buf(),
                error: Box::new(error),
            })
    }
}

/// Creates a test case, using everything up to the last `::` separator as the class name.
fn new_test_case(test_id: &str, status: TestCaseStatus) -> TestCase {
    let mut test_case = TestCase::new(test_id, status);
    if let Some((classname, _)) = test_id.rsplit_once("::") {
        test_case.set_classname(classname);
    }
    test_case
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregator::ResultSet,
        baseline::Baseline,
        classify::classify,
        parser::OutcomeParser,
        reporter::ReportSummarizer,
        version::TargetVersion,
    };
    use camino_tempfile::Utf8TempDir;

    fn header() -> ReportHeader {
        ReportHeader {
            family: "sqlalchemy".to_owned(),
            target_version: TargetVersion::new(21, 1, 3),
            suite_version: None,
        }
    }

    fn results(baseline: &Baseline) -> ResultSet {
        OutcomeParser::default()
            .parse(
                b"test.a::B::ok PASSED\n\
                  test.a::B::broken FAILED\n\
                  test.a::B::new_bug FAILED\n\
                  test.a::B::skipped SKIPPED\n",
            )
            .map(|outcome| classify(&outcome, baseline))
            .collect()
    }

    #[test]
    fn junit_statuses() {
        let baseline = Baseline::new("v21.1")
            .with_expected_failures([("test.a::B::broken", "#1"), ("test.a::B::missing", "#2")]);
        let results = results(&baseline);
        let report = ReportSummarizer::default().summarize(&results, &baseline);

        let junit = report.to_junit(&header());
        assert_eq!(junit.name.as_str(), "ormgate");
        let [suite] = junit.test_suites.as_slice() else {
            panic!("expected exactly one test suite");
        };
        assert_eq!(suite.name.as_str(), "sqlalchemy@21.1.3 (v21.1)");
        assert_eq!(suite.tests, 5);
        assert_eq!(suite.failures, 1);

        let status_of = |name: &str| {
            &suite
                .test_cases
                .iter()
                .find(|case| case.name.as_str() == name)
                .unwrap_or_else(|| panic!("test case {name} not found"))
                .status
        };
        assert!(matches!(
            status_of("test.a::B::ok"),
            TestCaseStatus::Success { .. }
        ));
        assert!(matches!(
            status_of("test.a::B::new_bug"),
            TestCaseStatus::NonSuccess {
                kind: NonSuccessKind::Failure,
                ..
            }
        ));
        for skipped in ["test.a::B::broken", "test.a::B::skipped", "test.a::B::missing"] {
            assert!(
                matches!(status_of(skipped), TestCaseStatus::Skipped { .. }),
                "{skipped} is skipped"
            );
        }

        let new_bug = suite
            .test_cases
            .iter()
            .find(|case| case.name.as_str() == "test.a::B::new_bug")
            .unwrap();
        assert_eq!(
            new_bug.classname.as_ref().map(|c| c.as_str()),
            Some("test.a::B")
        );

        let xml = junit.to_string().unwrap();
        assert!(
            xml.contains("--- FAIL: test.a::B::missing - #2 (not run)"),
            "{xml}"
        );
    }

    #[test]
    fn write_junit_creates_parent_dirs() {
        let baseline = Baseline::new("v21.1");
        let results = results(&baseline);
        let report = ReportSummarizer::default().summarize(&results, &baseline);

        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("reports/junit.xml");
        report.write_junit(&header(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<?xml"), "{contents}");
        assert!(contents.contains(r#"<testsuites name="ormgate""#), "{contents}");
    }
}
