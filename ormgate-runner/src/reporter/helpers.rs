// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::classify::Category;
use owo_colors::Style;

#[derive(Debug, Default, Clone)]
pub(super) struct Styles {
    pub(super) is_colorized: bool,
    pub(super) count: Style,
    pub(super) pass: Style,
    pub(super) fail: Style,
    pub(super) skip: Style,
    pub(super) baseline: Style,
}

impl Styles {
    pub(super) fn colorize(&mut self) {
        self.is_colorized = true;
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.baseline = Style::new().blue().bold();
    }

    /// The style used for the tag of a verdict line in `category`.
    pub(super) fn for_category(&self, category: Category) -> Style {
        match category {
            Category::ExpectedPass | Category::UnexpectedPass => self.pass,
            Category::ExpectedFailure | Category::UnexpectedFailure => self.fail,
            Category::Ignored | Category::ExpectedSkip | Category::UnexpectedSkip => self.skip,
        }
    }
}

/// Splits a verdict line such as `--- PASS: <id> (expected)` into its tag (`--- PASS`) and the
/// rest.
pub(super) fn split_verdict(verdict: &str) -> (&str, &str) {
    verdict.split_once(": ").unwrap_or(("", verdict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_verdict() {
        let tests: &[(&str, (&str, &str))] = &[
            (
                "--- PASS: test.a::B::c (expected)",
                ("--- PASS", "test.a::B::c (expected)"),
            ),
            (
                "--- FAIL: test.a::B::c - #1: flaky (expected)",
                ("--- FAIL", "test.a::B::c - #1: flaky (expected)"),
            ),
            ("no tag", ("", "no tag")),
        ];

        for (input, output) in tests {
            assert_eq!(split_verdict(input), *output, "for input {input:?}");
        }
    }
}
