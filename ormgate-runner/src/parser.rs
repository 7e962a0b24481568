// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing raw test-runner output into [`TestOutcome`]s.
//!
//! Each line of interest has the form:
//!
//! ```text
//! <test id> <status>
//! ```
//!
//! where the test id starts with a configurable prefix (`test` by default) and contains at least
//! two `::` separators, for example
//! `test/dialect/test_suite.py::ComponentReflectionTest::test_get_indexes PASSED`. Every other line
//! is runner chatter and is skipped.

use bstr::ByteSlice;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Configuration for [`OutcomeParser`], read from the `[parser]` section of the config.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserConfig {
    /// The prefix every test identifier starts with.
    pub test_prefix: String,

    /// Status substrings that count as a pass, such as pytest's `failed as expected` for tests the
    /// suite itself marks as expected to fail.
    pub pass_markers: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            test_prefix: "test".to_owned(),
            pass_markers: vec!["failed as expected".to_owned()],
        }
    }
}

/// The interpreted form of a raw status string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The test passed.
    Pass,

    /// The test was skipped.
    Skip,

    /// The test failed, or reported a status that isn't recognized.
    Fail,
}

impl StatusKind {
    /// Returns true if this is [`StatusKind::Pass`].
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }

    /// Returns true if this is [`StatusKind::Skip`].
    pub fn is_skip(self) -> bool {
        self == Self::Skip
    }
}

/// A single test outcome, as reported by the test runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    /// The test identifier.
    pub test_id: String,

    /// The raw status, verbatim apart from surrounding whitespace.
    pub status: String,

    /// The interpretation of `status`.
    pub kind: StatusKind,
}

impl TestOutcome {
    /// Creates a new outcome.
    pub fn new(test_id: impl Into<String>, status: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            test_id: test_id.into(),
            status: status.into(),
            kind,
        }
    }
}

/// Parses raw test-runner output.
#[derive(Clone, Debug)]
pub struct OutcomeParser {
    config: ParserConfig,
}

impl OutcomeParser {
    const PASSED: &'static str = "PASSED";
    const SKIPPED: &'static str = "SKIPPED";
    const SEPARATOR: &'static str = "::";

    /// Creates a new parser.
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Returns a lazy iterator over the outcomes found in `input`.
    ///
    /// Invalid UTF-8 is replaced lossily. Lines that don't look like outcomes are skipped, and the
    /// number of matched and skipped lines is logged once the iterator is exhausted.
    pub fn parse<'a>(&'a self, input: &'a [u8]) -> Outcomes<'a> {
        Outcomes {
            parser: self,
            lines: input.lines(),
            matched: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Parses a single line, returning `None` if it isn't an outcome.
    ///
    /// The status is everything after the first space, kept verbatim apart from a trailing `\r`.
    pub fn parse_line(&self, line: &str) -> Option<TestOutcome> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (test_id, status) = line.split_once(' ')?;
        if status.is_empty() || !self.is_test_id(test_id) {
            return None;
        }

        Some(TestOutcome::new(test_id, status, self.status_kind(status)))
    }

    /// Interprets a raw status string.
    pub fn status_kind(&self, status: &str) -> StatusKind {
        if status == Self::PASSED {
            StatusKind::Pass
        } else if status == Self::SKIPPED {
            StatusKind::Skip
        } else if self
            .config
            .pass_markers
            .iter()
            .any(|marker| status.contains(marker.as_str()))
        {
            StatusKind::Pass
        } else {
            StatusKind::Fail
        }
    }

    fn is_test_id(&self, test_id: &str) -> bool {
        // Segments may be empty: `test.a::::c` is still an id.
        test_id.starts_with(&self.config.test_prefix)
            && test_id.matches(Self::SEPARATOR).count() >= 2
    }
}

impl Default for OutcomeParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

/// An iterator over the outcomes in raw test-runner output.
///
/// Returned by [`OutcomeParser::parse`].
pub struct Outcomes<'a> {
    parser: &'a OutcomeParser,
    lines: bstr::Lines<'a>,
    matched: usize,
    skipped: usize,
    done: bool,
}

impl Outcomes<'_> {
    /// The number of lines matched so far.
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// The number of lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Outcomes<'_> {
    type Item = TestOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match self.parser.parse_line(&line.to_str_lossy()) {
                Some(outcome) => {
                    self.matched += 1;
                    return Some(outcome);
                }
                None => self.skipped += 1,
            }
        }

        if !self.done {
            self.done = true;
            debug!(
                "parsed {} test outcomes ({} other lines skipped)",
                self.matched, self.skipped
            );
        }
        None
    }
}

impl fmt::Debug for Outcomes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcomes")
            .field("matched", &self.matched)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parse_pytest_output() {
        let input = indoc! {b"
            ============================= test session starts ==============================
            platform linux -- Python 3.8.10, pytest-6.2.5
            collected 3 items

            test/dialect/test_suite.py::ComponentReflectionTest::test_get_indexes PASSED
            test/dialect/test_suite.py::ComponentReflectionTest::test_get_temp_table_names SKIPPED
            test/dialect/test_suite.py::ExceptionTest::test_integrity_error FAILED\r
            test/orm/test_query.py::QueryTest::test_outer_join XFAIL failed as expected
            =========================== 3 passed in 1.23s ===========================
        "};

        let parser = OutcomeParser::default();
        let mut outcomes = parser.parse(input);
        let parsed: Vec<_> = outcomes.by_ref().collect();
        assert_eq!(
            parsed,
            vec![
                TestOutcome::new(
                    "test/dialect/test_suite.py::ComponentReflectionTest::test_get_indexes",
                    "PASSED",
                    StatusKind::Pass,
                ),
                TestOutcome::new(
                    "test/dialect/test_suite.py::ComponentReflectionTest::test_get_temp_table_names",
                    "SKIPPED",
                    StatusKind::Skip,
                ),
                TestOutcome::new(
                    "test/dialect/test_suite.py::ExceptionTest::test_integrity_error",
                    "FAILED",
                    StatusKind::Fail,
                ),
                TestOutcome::new(
                    "test/orm/test_query.py::QueryTest::test_outer_join",
                    "XFAIL failed as expected",
                    StatusKind::Pass,
                ),
            ]
        );
        assert_eq!(outcomes.matched(), 4);
        assert_eq!(outcomes.skipped(), 5);
    }

    #[test_case("test.a::B::c PASSED", Some(("test.a::B::c", StatusKind::Pass)) ; "pass")]
    #[test_case("test.a::B::c SKIPPED", Some(("test.a::B::c", StatusKind::Skip)) ; "skip")]
    #[test_case("test.a::B::c ERROR", Some(("test.a::B::c", StatusKind::Fail)) ; "unknown status fails")]
    #[test_case("test.a::B::c passed", Some(("test.a::B::c", StatusKind::Fail)) ; "status is case sensitive")]
    #[test_case("test.a::B::c PASSED   ", Some(("test.a::B::c", StatusKind::Fail)) ; "status is verbatim")]
    #[test_case("test.a::B::c  PASSED", Some(("test.a::B::c", StatusKind::Fail)) ; "double space")]
    #[test_case("test.a::B::c PASSED\r", Some(("test.a::B::c", StatusKind::Pass)) ; "carriage return")]
    #[test_case("test.a::B::c::d[x-1] FAILED", Some(("test.a::B::c::d[x-1]", StatusKind::Fail)) ; "extra segments")]
    #[test_case("test.a::B:: PASSED", Some(("test.a::B::", StatusKind::Pass)) ; "empty last segment")]
    #[test_case("test.a::B::c", None ; "no status")]
    #[test_case("test.a::B::c ", None ; "empty status")]
    #[test_case("test.a::B::c    ", Some(("test.a::B::c", StatusKind::Fail)) ; "blank status")]
    #[test_case("test.a::B PASSED", None ; "two segments")]
    #[test_case("test.a::::c PASSED", Some(("test.a::::c", StatusKind::Pass)) ; "empty middle segment")]
    #[test_case("test:::: FAILED", Some(("test::::", StatusKind::Fail)) ; "all segments empty")]
    #[test_case("unit.a::B::c PASSED", None ; "wrong prefix")]
    #[test_case(" test.a::B::c PASSED", None ; "leading space")]
    #[test_case("", None ; "empty line")]
    fn parse_line(line: &str, expected: Option<(&str, StatusKind)>) {
        let parser = OutcomeParser::default();
        let actual = parser
            .parse_line(line)
            .map(|outcome| (outcome.test_id, outcome.kind));
        assert_eq!(
            actual,
            expected.map(|(id, kind)| (id.to_owned(), kind)),
            "line {line:?}"
        );
    }

    #[test]
    fn custom_config() {
        let parser = OutcomeParser::new(&ParserConfig {
            test_prefix: "tests/".to_owned(),
            pass_markers: vec!["XFAIL".to_owned(), "xfail".to_owned()],
        });
        assert_eq!(
            parser.parse_line("tests/backends::Base::test_x xfail (known)"),
            Some(TestOutcome::new(
                "tests/backends::Base::test_x",
                "xfail (known)",
                StatusKind::Pass
            ))
        );
        assert_eq!(parser.parse_line("test.a::B::c PASSED"), None);
        assert_eq!(
            parser.status_kind("FAILED failed as expected"),
            StatusKind::Fail
        );
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let input = b"test.a::B::caf\xe9 FAILED\n\xff\xfe garbage\n";
        let parser = OutcomeParser::default();
        let parsed: Vec<_> = parser.parse(input).collect();
        assert_eq!(
            parsed,
            vec![TestOutcome::new(
                "test.a::B::caf\u{FFFD}",
                "FAILED",
                StatusKind::Fail
            )]
        );
    }

    #[test]
    fn parser_config_from_toml() {
        let config: ParserConfig = toml::from_str(r#"pass-markers = ["XFAIL"]"#).unwrap();
        assert_eq!(
            config,
            ParserConfig {
                test_prefix: "test".to_owned(),
                pass_markers: vec!["XFAIL".to_owned()],
            }
        );
    }
}
