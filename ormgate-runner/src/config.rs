// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading ormgate configuration.
//!
//! The config is a TOML file, by default at `.config/ormgate.toml` relative to the working
//! directory:
//!
//! ```toml
//! [parser]
//! test-prefix = "test"
//! pass-markers = ["failed as expected"]
//!
//! [policy]
//! fail-on-unexpected-pass = false
//!
//! [family.sqlalchemy]
//! issue-url = "https://github.com/cockroachdb/cockroach/issues/{}"
//!
//! [[family.sqlalchemy.baseline]]
//! name = "v21.1"
//! versions = { min = "21.1.0" }
//!
//! [family.sqlalchemy.baseline.expected-failures]
//! "test/dialect/test_suite.py::ExceptionTest::test_integrity_error" = "#5489"
//! ```
//!
//! Test identifiers are table keys and are kept verbatim.

use crate::{
    baseline::{Baseline, BaselineRegistry, IssueUrlTemplate},
    errors::{ConfigParseError, ConfigParseErrorKind, FamilySelectError},
    parser::ParserConfig,
    reporter::AcceptancePolicy,
    version::VersionRange,
};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
};
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// Overall configuration for ormgate.
#[derive(Clone, Debug, Default)]
pub struct OrmgateConfig {
    parser: ParserConfig,
    policy: AcceptancePolicy,
    families: IndexMap<String, BaselineRegistry>,
}

impl OrmgateConfig {
    /// The default location of the config, relative to the working directory.
    pub const CONFIG_PATH: &'static str = ".config/ormgate.toml";

    /// Reads the config from `config_file` if specified, and otherwise from [`Self::CONFIG_PATH`]
    /// under `root`.
    ///
    /// A missing default config file yields an empty config. A missing explicitly specified file
    /// is an error.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(root, config_file, &mut DefaultConfigWarnings)
    }

    /// Parses a config from a TOML string. `config_file` is used for error messages.
    pub fn from_toml_str(
        config_file: &Utf8Path,
        contents: &str,
    ) -> Result<Self, ConfigParseError> {
        Self::from_toml_str_with_warnings(config_file, contents, &mut DefaultConfigWarnings)
    }

    fn from_sources_with_warnings(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (path, explicit) = match config_file {
            Some(path) => (path.to_owned(), true),
            None => (root.join(Self::CONFIG_PATH), false),
        };

        debug!("config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if !explicit && error.kind() == io::ErrorKind::NotFound => {
                debug!("config: file does not exist at {path}, using defaults");
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(ConfigParseError::new(
                    path,
                    ConfigParseErrorKind::ReadError(error),
                ));
            }
        };

        Self::from_toml_str_with_warnings(&path, &contents, warnings)
    }

    fn from_toml_str_with_warnings(
        config_file: &Utf8Path,
        contents: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config, unknown) = OrmgateConfigDeserialize::deserialize_toml(contents)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file, &unknown);
        }

        let config = config
            .compile()
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;
        debug!(
            "config: loaded {} baseline families from {config_file}",
            config.families.len()
        );
        Ok(config)
    }

    /// Configuration for the outcome parser.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// The acceptance policy.
    pub fn policy(&self) -> AcceptancePolicy {
        self.policy
    }

    /// All configured families, in declaration order.
    pub fn families(&self) -> impl ExactSizeIterator<Item = &BaselineRegistry> + '_ {
        self.families.values()
    }

    /// Selects a family by name.
    ///
    /// If `name` is `None`, exactly one family must be configured.
    pub fn family(&self, name: Option<&str>) -> Result<&BaselineRegistry, FamilySelectError> {
        let known = || self.families.keys().cloned().collect::<Vec<_>>();
        match name {
            Some(name) => self
                .families
                .get(name)
                .ok_or_else(|| FamilySelectError::NotFound {
                    family: name.to_owned(),
                    known: known(),
                }),
            None => match self.families.len() {
                0 => Err(FamilySelectError::NoneConfigured),
                1 => Ok(&self.families[0]),
                _ => Err(FamilySelectError::Ambiguous { known: known() }),
            },
        }
    }
}

trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings using the tracing crate.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                swrite!(unknown_str, "\n  - {ignored_key}");
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct OrmgateConfigDeserialize {
    #[serde(default)]
    parser: ParserConfig,
    #[serde(default)]
    policy: AcceptancePolicy,
    #[serde(default)]
    family: IndexMap<String, FamilyDeserialize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FamilyDeserialize {
    #[serde(default)]
    issue_url: Option<IssueUrlTemplate>,
    #[serde(default)]
    baseline: Vec<BaselineDeserialize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BaselineDeserialize {
    name: String,
    versions: VersionRange,
    #[serde(default)]
    expected_failures: BTreeMap<String, String>,
    #[serde(default)]
    ignored: BTreeMap<String, String>,
}

impl OrmgateConfigDeserialize {
    /// Deserializes TOML content and returns the config along with any unknown keys.
    fn deserialize_toml(
        contents: &str,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let deserializer = toml::Deserializer::parse(contents)
            .map_err(|error| ConfigParseErrorKind::TomlParseError(Box::new(error)))?;

        let mut unknown = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            unknown.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(deserializer, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| ConfigParseErrorKind::DeserializeError(Box::new(error)))?;

        Ok((config, unknown))
    }

    fn compile(self) -> Result<OrmgateConfig, ConfigParseErrorKind> {
        let families = self
            .family
            .into_iter()
            .map(|(name, family)| {
                let entries = family
                    .baseline
                    .into_iter()
                    .map(|baseline| {
                        let compiled = Baseline::new(baseline.name)
                            .with_expected_failures(baseline.expected_failures)
                            .with_ignored(baseline.ignored)
                            .with_issue_url(family.issue_url.clone());
                        (baseline.versions, compiled)
                    })
                    .collect();
                let registry = BaselineRegistry::new(name.clone(), entries)?;
                Ok((name, registry))
            })
            .collect::<Result<IndexMap<_, _>, ConfigParseErrorKind>>()?;

        Ok(OrmgateConfig {
            parser: self.parser,
            policy: self.policy,
            families,
        })
    }
}
