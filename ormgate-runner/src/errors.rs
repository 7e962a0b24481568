// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by ormgate.

use crate::version::TargetVersion;
use camino::Utf8PathBuf;
use itertools::Itertools;
use std::{error::Error, fmt};
use thiserror::Error;

/// An error that occurred while parsing a [`TargetVersion`] from a string.
#[derive(Clone, Debug, Error)]
#[error("invalid target version `{input}`: {reason}")]
pub struct TargetVersionParseError {
    input: String,
    reason: &'static str,
}

impl TargetVersionParseError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurred while parsing a [`VersionRange`](crate::version::VersionRange).
#[derive(Clone, Debug, Error)]
pub enum VersionRangeParseError {
    /// The range did not match any known form.
    #[error(
        "invalid version range `{input}` \
         (expected `>= X`, `X ..= Y` or a table {{ min = \"X\", max = \"Y\" }})"
    )]
    InvalidFormat {
        /// The input provided.
        input: String,
    },

    /// One of the bounds failed to parse.
    #[error("invalid bound in version range")]
    InvalidBound(#[from] TargetVersionParseError),

    /// The lower bound of a closed range is greater than the upper bound.
    #[error("version range lower bound {min} is greater than upper bound {max}")]
    Inverted {
        /// The lower bound.
        min: TargetVersion,

        /// The upper bound.
        max: TargetVersion,
    },
}

/// No baseline in a registry covers the requested target version.
///
/// This is fatal: running without a baseline would silently accept every failure as expected.
#[derive(Clone, Debug, Error)]
#[error(
    "no {family} baseline defined for target version {version} (known ranges: {})",
    display_known_ranges(.known_ranges)
)]
pub struct NoBaselineForVersion {
    family: String,
    version: TargetVersion,
    known_ranges: Vec<String>,
}

impl NoBaselineForVersion {
    pub(crate) fn new(
        family: impl Into<String>,
        version: TargetVersion,
        known_ranges: Vec<String>,
    ) -> Self {
        Self {
            family: family.into(),
            version,
            known_ranges,
        }
    }

    /// The family that was searched.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The requested version.
    pub fn version(&self) -> TargetVersion {
        self.version
    }
}

fn display_known_ranges(ranges: &[String]) -> String {
    if ranges.is_empty() {
        "(none)".to_owned()
    } else {
        ranges.iter().join(", ")
    }
}

/// An error that occurred while constructing a
/// [`BaselineRegistry`](crate::baseline::BaselineRegistry).
#[derive(Clone, Debug, Error)]
pub enum BaselineRegistryError {
    /// Two baselines in the same family share a name.
    #[error("baseline `{name}` is defined more than once in family `{family}`")]
    DuplicateName {
        /// The family.
        family: String,

        /// The duplicated baseline name.
        name: String,
    },
}

/// An error that occurred while parsing an issue URL template.
#[derive(Clone, Debug, Error)]
#[error("issue URL template `{input}` must contain a `{{}}` placeholder")]
pub struct IssueUrlTemplateParseError {
    input: String,
}

impl IssueUrlTemplateParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while reading or parsing the ormgate config.
#[derive(Debug, Error)]
#[error("failed to parse ormgate config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while reading the config file.
    #[error("error reading config file")]
    ReadError(#[source] std::io::Error),

    /// The config file is not valid TOML.
    #[error("error parsing TOML")]
    TomlParseError(#[source] Box<toml::de::Error>),

    /// The config file could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<toml::de::Error>>),

    /// The baselines of a family are inconsistent.
    #[error("invalid baselines")]
    RegistryError(#[from] BaselineRegistryError),
}

/// An error that occurred while selecting a baseline family from the config.
#[derive(Clone, Debug, Error)]
pub enum FamilySelectError {
    /// No families are configured.
    #[error("no baseline families are configured")]
    NoneConfigured,

    /// More than one family is configured and none was requested.
    #[error(
        "multiple baseline families are configured, one must be selected (known families: {})",
        .known.join(", ")
    )]
    Ambiguous {
        /// All known families.
        known: Vec<String>,
    },

    /// The requested family is not configured.
    #[error("baseline family `{family}` not found (known families: {})", .known.join(", "))]
    NotFound {
        /// The requested family.
        family: String,

        /// All known families.
        known: Vec<String>,
    },
}

/// An error that occurred while writing a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while writing to the output.
    #[error("error writing report")]
    Io(#[from] std::io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: Box<dyn Error + Send + Sync>,
    },

    /// An error occurred while serializing the suggested baseline.
    #[error("error serializing suggested baseline")]
    SuggestedBaseline(#[source] toml::ser::Error),

    /// An error occurred while serializing the JSON summary.
    #[error("error serializing JSON summary")]
    Json(#[source] serde_json::Error),
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut cause = self.error.source();
        while let Some(err) = cause {
            write!(f, "\n  caused by: {err}")?;
            cause = err.source();
        }

        Ok(())
    }
}
