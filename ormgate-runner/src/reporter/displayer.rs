// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    ReconcileReport, ReportHeader, Verdict,
    helpers::{Styles, split_verdict},
};
use crate::{
    baseline::{Baseline, BaselineRegistry},
    classify::Category,
    errors::WriteReportError,
    helpers::plural,
    version::VersionRange,
    write_str::WriteStr,
};
use owo_colors::{OwoColorize, Style};

/// The order count lines are printed in.
const COUNT_ORDER: [Category; 7] = [
    Category::ExpectedPass,
    Category::ExpectedFailure,
    Category::ExpectedSkip,
    Category::Ignored,
    Category::UnexpectedPass,
    Category::UnexpectedFailure,
    Category::UnexpectedSkip,
];

/// Writes human-readable reports.
#[derive(Debug, Default)]
pub struct ReportDisplayer {
    styles: Styles,
}

impl ReportDisplayer {
    /// Creates a new displayer, colorizing output if `colorize` is true.
    pub fn new(colorize: bool) -> Self {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }
        Self { styles }
    }

    /// Writes the full report for a run.
    pub fn write_report(
        &self,
        header: &ReportHeader,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        self.write_header(header, report, writer)?;
        self.write_verdict_lines(report, writer)?;
        self.write_counts(report, writer)?;
        self.write_unexpected(report, writer)?;
        self.write_suggested_baseline(report, writer)?;
        self.write_final_verdict(report, writer)?;
        writer.write_str_flush()?;
        Ok(())
    }

    fn write_header(
        &self,
        header: &ReportHeader,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        write!(
            writer,
            "target version {}: using {} baseline {}",
            header.target_version.style(self.styles.count),
            header.family,
            report.baseline().name().style(self.styles.baseline),
        )?;
        if let Some(suite_version) = &header.suite_version {
            write!(writer, " (suite version {suite_version})")?;
        }
        writeln!(writer)?;

        let total = report.results().total();
        writeln!(
            writer,
            "{} {} run",
            total.style(self.styles.count),
            plural::tests_str(total),
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_verdict_lines(
        &self,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        // Both sources are sorted by test id; merge them so the combined list stays sorted.
        let mut results = report.results().results().peekable();
        let mut not_run = report.not_run().iter().peekable();
        loop {
            let take_result = match (results.peek(), not_run.peek()) {
                (Some(result), Some((id, _))) => result.test_id.as_str() < **id,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_result {
                if let Some(result) = results.next() {
                    let style = self.styles.for_category(result.category);
                    self.write_verdict(&result.verdict, style, writer)?;
                }
            } else if let Some((id, issue)) = not_run.next() {
                let verdict = report.not_run_verdict(id, issue);
                self.write_verdict(&verdict, self.styles.fail, writer)?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_verdict(
        &self,
        verdict: &str,
        style: Style,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        let (tag, rest) = split_verdict(verdict);
        if tag.is_empty() {
            writeln!(writer, "{rest}")?;
        } else {
            writeln!(writer, "{}: {rest}", tag.style(style))?;
        }
        Ok(())
    }

    fn write_counts(
        &self,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        let counts = report.results().counts();
        for category in COUNT_ORDER {
            let count = counts.get(category);
            writeln!(
                writer,
                "{} {} {}",
                count.style(self.styles.count),
                plural::tests_str(count),
                category.description(),
            )?;
        }
        let not_run = report.not_run().len();
        writeln!(
            writer,
            "{} {} expected failed but not run",
            not_run.style(self.styles.count),
            plural::tests_str(not_run),
        )?;
        Ok(())
    }

    fn write_unexpected(
        &self,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        let unexpected: Vec<_> = report
            .results()
            .results()
            .filter(|result| {
                result.category.is_drift() || result.category == Category::UnexpectedSkip
            })
            .collect();
        if unexpected.is_empty() && report.not_run().is_empty() {
            return Ok(());
        }

        writeln!(
            writer,
            "\nresults that differ from baseline {}:",
            report.baseline().name().style(self.styles.baseline),
        )?;
        for result in unexpected {
            write!(writer, "  ")?;
            let style = self.styles.for_category(result.category);
            self.write_verdict(&result.verdict, style, writer)?;
        }
        for (id, issue) in report.not_run() {
            write!(writer, "  ")?;
            let verdict = report.not_run_verdict(id, issue);
            self.write_verdict(&verdict, self.styles.fail, writer)?;
        }
        Ok(())
    }

    fn write_suggested_baseline(
        &self,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        if let Some(toml) = report.suggested_baseline_toml()? {
            writeln!(
                writer,
                "\nsuggested expected failures for baseline {}:\n",
                report.baseline().name().style(self.styles.baseline),
            )?;
            writer.write_str(&toml)?;
        }
        Ok(())
    }

    fn write_final_verdict(
        &self,
        report: &ReconcileReport<'_>,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        writeln!(writer)?;
        match report.verdict() {
            Verdict::Accepted => {
                writeln!(writer, "{}", "ACCEPTED".style(self.styles.pass))?;
            }
            Verdict::Rejected { reasons } => {
                write!(writer, "{}: ", "REJECTED".style(self.styles.fail))?;
                for (i, reason) in reasons.iter().enumerate() {
                    if i > 0 {
                        write!(writer, ", ")?;
                    }
                    write!(writer, "{reason}")?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    /// Writes the baseline that `range` resolved to, along with its tables.
    pub fn write_baseline(
        &self,
        family: &str,
        range: &VersionRange,
        baseline: &Baseline,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        writeln!(
            writer,
            "{family} baseline {} (versions {range})",
            baseline.name().style(self.styles.baseline),
        )?;

        let expected = baseline.expected_failures();
        writeln!(
            writer,
            "  {} expected {}:",
            expected.len().style(self.styles.count),
            if expected.len() == 1 { "failure" } else { "failures" },
        )?;
        for (id, issue) in expected {
            writeln!(writer, "    {id} - {}", baseline.render_issue(issue))?;
        }

        let ignored = baseline.ignored_tests();
        writeln!(
            writer,
            "  {} ignored {}:",
            ignored.len().style(self.styles.count),
            plural::tests_str(ignored.len()),
        )?;
        for (id, reason) in ignored {
            writeln!(writer, "    {id} - {}", baseline.render_issue(reason))?;
        }

        writer.write_str_flush()?;
        Ok(())
    }

    /// Writes every baseline in `registry`, in resolution order.
    pub fn write_registry(
        &self,
        registry: &BaselineRegistry,
        writer: &mut dyn WriteStr,
    ) -> Result<(), WriteReportError> {
        let count = registry.entries().len();
        writeln!(
            writer,
            "{}: {} {}",
            registry.family(),
            count.style(self.styles.count),
            plural::baselines_str(count),
        )?;
        for (range, baseline) in registry.entries() {
            self.write_baseline(registry.family(), range, baseline, writer)?;
        }
        Ok(())
    }
}
