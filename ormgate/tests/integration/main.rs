// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests that run the `ormgate` binary end to end.

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use ormgate_cli::OrmgateCli;
use ormgate_metadata::{OrmgateExitCode, VerdictSummary};
use pretty_assertions::assert_eq;

mod ormgate_cli;

const CONFIG: &str = indoc! {r##"
    [policy]
    fail-on-unexpected-pass = false

    [family.sqlalchemy]
    issue-url = "https://github.com/cockroachdb/cockroach/issues/{}"

    [[family.sqlalchemy.baseline]]
    name = "v20.2"
    versions = "20.2.0 ..= 20.2.99"

    [family.sqlalchemy.baseline.expected-failures]
    "test.dialect::Suite::old_bug" = "#1"

    [[family.sqlalchemy.baseline]]
    name = "v21.1"
    versions = { min = "21.1.0" }

    [family.sqlalchemy.baseline.expected-failures]
    "test.dialect::Suite::unsupported_feature" = "#999"

    [family.sqlalchemy.baseline.ignored]
    "test.orm::Flaky::sometimes" = "flaky under load"
"##};

const ACCEPTED_RESULTS: &str = indoc! {"
    ============================= test session starts ==============================
    test.dialect::Suite::unsupported_feature FAILED
    test.dialect::Suite::supported PASSED
    test.dialect::Suite::not_applicable SKIPPED
    test.orm::Flaky::sometimes FAILED
    test.dialect::Suite::xfail_marked failed as expected
    ======================== 2 failed, 1 passed, 1 skipped =========================
"};

struct TempProject {
    dir: Utf8TempDir,
}

impl TempProject {
    fn new() -> Self {
        let dir = Utf8TempDir::new().expect("created temp dir");
        std::fs::create_dir_all(dir.path().join(".config")).expect("created .config");
        std::fs::write(dir.path().join(".config/ormgate.toml"), CONFIG).expect("wrote config");
        Self { dir }
    }

    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("wrote file");
        path
    }

    fn cli(&self) -> OrmgateCli {
        let mut cli = OrmgateCli::new();
        cli.current_dir(self.dir.path());
        cli
    }
}

#[test]
fn reconcile_accepted() {
    let project = TempProject::new();
    let results = project.write("results.txt", ACCEPTED_RESULTS);

    let output = project
        .cli()
        .args(["reconcile", "--target-version", "v21.1.3", "--results"])
        .arg(results.as_str())
        .args(["--suite-version", "rel_1_3_17"])
        .output();

    assert_eq!(output.exit_code(), Some(OrmgateExitCode::OK), "{output}");
    let stdout = output.stdout_as_str();
    assert!(
        stdout.starts_with(
            "target version 21.1.3: using sqlalchemy baseline v21.1 (suite version rel_1_3_17)\n"
        ),
        "{output}"
    );
    assert!(
        stdout.contains("--- FAIL: test.dialect::Suite::unsupported_feature - \
                         https://github.com/cockroachdb/cockroach/issues/999 (expected)"),
        "{output}"
    );
    assert!(
        stdout.contains("--- SKIP: test.orm::Flaky::sometimes due to flaky under load \
                         (expected, ignored)"),
        "{output}"
    );
    assert!(stdout.ends_with("ACCEPTED\n"), "{output}");

    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains("info: using sqlalchemy baseline `v21.1`"),
        "{output}"
    );
}

#[test]
fn reconcile_rejected_from_stdin() {
    let project = TempProject::new();

    let output = project
        .cli()
        .args(["reconcile", "--target-version", "21.1.0"])
        .stdin(
            "test.dialect::Suite::unsupported_feature FAILED\n\
             test.dialect::Suite::regression FAILED\n",
        )
        .unchecked(true)
        .output();

    assert_eq!(
        output.exit_code(),
        Some(OrmgateExitCode::RUN_REJECTED),
        "{output}"
    );
    let stdout = output.stdout_as_str();
    assert!(
        stdout.contains("--- FAIL: test.dialect::Suite::regression (unexpected)"),
        "{output}"
    );
    assert!(
        stdout.contains("suggested expected failures for baseline v21.1:"),
        "{output}"
    );
    assert!(
        stdout.contains(r#""test.dialect::Suite::regression" = "unknown""#),
        "{output}"
    );
    assert!(
        output
            .stderr_as_str()
            .contains("error: run rejected: 1 test failed unexpectedly"),
        "{output}"
    );
}

#[test]
fn reconcile_json_and_junit() {
    let project = TempProject::new();
    let results = project.write("results.txt", ACCEPTED_RESULTS);
    let junit = project.dir.path().join("target/ormgate/junit.xml");

    let output = project
        .cli()
        .args(["reconcile", "--target-version", "rel_21_1_3", "--results"])
        .arg(results.as_str())
        .args(["--message-format", "json", "--junit"])
        .arg(junit.as_str())
        .output();

    let summary = output.decode_summary_json();
    assert_eq!(summary.verdict, VerdictSummary::Accepted);
    assert_eq!(summary.family, "sqlalchemy");
    assert_eq!(summary.baseline, "v21.1");
    assert_eq!(summary.target_version, "21.1.3");
    assert_eq!(summary.counts.total, 5);
    assert_eq!(summary.counts.expected_failure, 1);
    assert_eq!(summary.counts.expected_pass, 2);
    assert_eq!(summary.counts.expected_skip, 1);
    assert_eq!(summary.counts.ignored, 1);
    assert_eq!(summary.counts.unexpected_pass, 0);
    assert!(summary.drift.is_empty());
    assert_eq!(summary.suggested_expected_failures, None);

    let xml = std::fs::read_to_string(&junit).expect("JUnit report was written");
    assert!(
        xml.contains(r#"<testsuite name="sqlalchemy@21.1.3 (v21.1)""#),
        "{xml}"
    );
}

#[test]
fn no_baseline_for_version() {
    let project = TempProject::new();
    let results = project.write("results.txt", ACCEPTED_RESULTS);

    let output = project
        .cli()
        .args(["reconcile", "--target-version", "v19.2.0", "--results"])
        .arg(results.as_str())
        .unchecked(true)
        .output();

    assert_eq!(
        output.exit_code(),
        Some(OrmgateExitCode::NO_BASELINE_FOR_VERSION),
        "{output}"
    );
    assert!(
        output.stderr_as_str().contains(
            "error: no sqlalchemy baseline defined for target version 19.2.0 \
             (known ranges: >= 21.1.0, 20.2.0 ..= 20.2.99)"
        ),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "", "nothing classified");
}

#[test]
fn invalid_config() {
    let project = TempProject::new();
    let config = project.write(
        "bad.toml",
        indoc! {r#"
            [[family.sqlalchemy.baseline]]
            name = "v21.1"
            versions = "21.2.0 ..= 21.1.0"
        "#},
    );

    let output = project
        .cli()
        .arg("--config-file")
        .arg(config.as_str())
        .args(["reconcile", "--target-version", "21.1.0"])
        .stdin("")
        .unchecked(true)
        .output();

    assert_eq!(
        output.exit_code(),
        Some(OrmgateExitCode::SETUP_ERROR),
        "{output}"
    );
    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains("error: failed to parse ormgate config at"),
        "{output}"
    );
    assert!(stderr.contains("Caused by:"), "{output}");
}

#[test]
fn missing_results_file() {
    let project = TempProject::new();

    let output = project
        .cli()
        .args([
            "reconcile",
            "--target-version",
            "21.1.0",
            "--results",
            "does-not-exist.txt",
        ])
        .unchecked(true)
        .output();

    assert_eq!(
        output.exit_code(),
        Some(OrmgateExitCode::INPUT_READ_ERROR),
        "{output}"
    );
    assert!(
        output
            .stderr_as_str()
            .contains("error: failed to read test results from `does-not-exist.txt`"),
        "{output}"
    );
}

#[test]
fn show_baseline() {
    let project = TempProject::new();

    let output = project
        .cli()
        .args(["show-baseline", "--target-version", "20.2.7"])
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            sqlalchemy baseline v20.2 (versions 20.2.0 ..= 20.2.99)
              1 expected failure:
                test.dialect::Suite::old_bug - https://github.com/cockroachdb/cockroach/issues/1
              0 ignored tests:
        "}
    );
}

#[test]
fn invalid_log_filter_warns() {
    let project = TempProject::new();

    let output = project
        .cli()
        .env("ORMGATE_LOG", "=not a filter=")
        .args(["show-baseline", "--target-version", "21.1.0"])
        .output();

    assert!(
        output
            .stderr_as_str()
            .contains("warning: ignoring invalid ORMGATE_LOG value"),
        "{output}"
    );
    assert!(
        output.stdout_as_str().starts_with("sqlalchemy baseline v21.1"),
        "{output}"
    );
}
