// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ormgate_runner::{
    aggregator::ResultSet,
    classify::classify,
    config::OrmgateConfig,
    errors::WriteReportError,
    parser::OutcomeParser,
    reporter::{ReportDisplayer, ReportHeader, ReportSummarizer, Verdict},
    version::TargetVersion,
    write_str::WriteStr,
};
use ormgate_metadata::OrmgateExitCode;
use std::io::Read;
use tracing::{debug, info};

/// Reconcile ORM compliance suite results against version-pinned baselines.
///
/// ormgate reads the output of a compliance suite run, classifies every test against the
/// baseline of known failures for the target version, and exits non-zero if the results drift
/// from the baseline in a way that should fail CI.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct OrmgateApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(subcommand)]
    command: Command,
}

impl OrmgateApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        match self.command {
            Command::Reconcile(opts) => opts.exec(&config, output, output_writer),
            Command::ShowBaseline {
                family,
                target_version,
            } => exec_show_baseline(
                &config,
                family.as_deref(),
                target_version.as_deref(),
                output,
                output_writer,
            ),
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: .config/ormgate.toml]
    #[arg(long, global = true, value_name = "PATH", env = "ORMGATE_CONFIG")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<OrmgateConfig> {
        Ok(OrmgateConfig::from_sources(
            Utf8Path::new("."),
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile suite results against a baseline
    ///
    /// Reads `<test-id> <status>` lines produced by the compliance suite, classifies each test
    /// against the baseline for the target version, and prints a report. Exits with code 100 if
    /// the run is rejected.
    Reconcile(ReconcileOpts),

    /// Show baselines for a family
    ///
    /// With --target-version, shows the baseline that version resolves to. Otherwise, shows
    /// every baseline in resolution order.
    ShowBaseline {
        /// Baseline family [default: the only configured family]
        #[arg(long, value_name = "NAME")]
        family: Option<String>,

        /// Target-system version, e.g. v21.1.3
        #[arg(long, value_name = "VERSION")]
        target_version: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ReconcileOpts {
    /// Target-system version, e.g. v21.1.3
    #[arg(long, value_name = "VERSION")]
    target_version: String,

    /// File containing suite results, or - for standard input
    #[arg(long, value_name = "PATH", default_value = "-")]
    results: Utf8PathBuf,

    /// Baseline family [default: the only configured family]
    #[arg(long, value_name = "NAME")]
    family: Option<String>,

    /// Version of the compliance suite that was run, e.g. rel_1_3_17
    #[arg(long, value_name = "TAG")]
    suite_version: Option<String>,

    /// Also write a JUnit XML report to this path
    #[arg(long, value_name = "PATH")]
    junit: Option<Utf8PathBuf>,

    /// Output format
    #[arg(
        short = 'T',
        long,
        value_enum,
        default_value_t,
        value_name = "FMT"
    )]
    message_format: MessageFormat,
}

impl ReconcileOpts {
    fn exec(
        self,
        config: &OrmgateConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let registry = config.family(self.family.as_deref())?;
        let target_version: TargetVersion = self.target_version.parse()?;
        let baseline = registry.resolve(target_version)?;

        let input = self.read_results()?;
        let parser = OutcomeParser::new(config.parser());
        let results: ResultSet = parser
            .parse(&input)
            .map(|outcome| classify(&outcome, baseline))
            .collect();

        let report = ReportSummarizer::new(config.policy()).summarize(&results, baseline);
        let header = ReportHeader {
            family: registry.family().to_owned(),
            target_version,
            suite_version: self.suite_version,
        };

        if let Some(junit) = &self.junit {
            report.write_junit(&header, junit)?;
            info!("wrote JUnit report to {junit}");
        }

        let mut writer = output_writer.stdout_writer();
        match self.message_format {
            MessageFormat::Human => {
                ReportDisplayer::new(output.stdout_colorized())
                    .write_report(&header, &report, &mut writer)?;
            }
            MessageFormat::Json => {
                let json = serde_json::to_string_pretty(&report.to_summary(&header))
                    .map_err(WriteReportError::Json)?;
                writeln!(writer, "{json}").map_err(WriteReportError::Io)?;
                writer.write_str_flush().map_err(WriteReportError::Io)?;
            }
        }

        match report.verdict() {
            Verdict::Accepted => Ok(OrmgateExitCode::OK),
            Verdict::Rejected { reasons } => Err(ExpectedError::run_rejected(reasons.clone())),
        }
    }

    fn read_results(&self) -> Result<Vec<u8>> {
        if self.results.as_str() == "-" {
            debug!("reading suite results from standard input");
            let mut input = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut input)
                .map_err(|err| ExpectedError::input_read_error(None, err))?;
            Ok(input)
        } else {
            debug!("reading suite results from {}", self.results);
            std::fs::read(&self.results)
                .map_err(|err| ExpectedError::input_read_error(Some(self.results.clone()), err))
        }
    }
}

fn exec_show_baseline(
    config: &OrmgateConfig,
    family: Option<&str>,
    target_version: Option<&str>,
    output: OutputContext,
    output_writer: &mut OutputWriter,
) -> Result<i32> {
    let registry = config.family(family)?;
    let displayer = ReportDisplayer::new(output.stdout_colorized());
    let mut writer = output_writer.stdout_writer();

    match target_version {
        Some(target_version) => {
            let target_version: TargetVersion = target_version.parse()?;
            let (range, baseline) = registry.resolve_entry(target_version)?;
            displayer.write_baseline(registry.family(), range, baseline, &mut writer)?;
        }
        None => displayer.write_registry(registry, &mut writer)?,
    }

    Ok(OrmgateExitCode::OK)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// Human-readable report
    #[default]
    Human,
    /// JSON summary, see `ormgate_metadata::ReconcileSummary`
    Json,
}
