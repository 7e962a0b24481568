// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version-scoped baselines of known failures.
//!
//! A [`BaselineRegistry`] holds every baseline declared for one family of compliance suites
//! (for example `sqlalchemy`). [`BaselineRegistry::resolve`] picks the baseline that applies to a
//! concrete [`TargetVersion`].

use crate::{
    errors::{BaselineRegistryError, IssueUrlTemplateParseError, NoBaselineForVersion},
    version::{TargetVersion, VersionRange},
};
use serde::{Deserialize, Deserializer};
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    str::FromStr,
};
use tracing::{info, warn};

/// A named, version-scoped record of known failing and ignored tests.
///
/// Both tables map a test identifier to an issue reference. They are not required to be
/// disjoint: an identifier present in both is treated as ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Baseline {
    name: String,
    expected_failures: BTreeMap<String, String>,
    ignored: BTreeMap<String, String>,
    issue_url: Option<IssueUrlTemplate>,
}

impl Baseline {
    /// Creates a new, empty baseline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected_failures: BTreeMap::new(),
            ignored: BTreeMap::new(),
            issue_url: None,
        }
    }

    /// Adds expected failures to this baseline.
    pub fn with_expected_failures<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.expected_failures
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds ignored tests to this baseline.
    pub fn with_ignored<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ignored
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the template used to turn issue numbers into links.
    pub fn with_issue_url(mut self, issue_url: Option<IssueUrlTemplate>) -> Self {
        self.issue_url = issue_url;
        self
    }

    /// The name of this baseline.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the issue reference for `test_id` if it is an expected failure.
    pub fn expected_failure(&self, test_id: &str) -> Option<&str> {
        self.expected_failures.get(test_id).map(String::as_str)
    }

    /// Returns the issue reference for `test_id` if it is ignored.
    pub fn ignored(&self, test_id: &str) -> Option<&str> {
        self.ignored.get(test_id).map(String::as_str)
    }

    /// All expected failures, sorted by test identifier.
    pub fn expected_failures(&self) -> &BTreeMap<String, String> {
        &self.expected_failures
    }

    /// All ignored tests, sorted by test identifier.
    pub fn ignored_tests(&self) -> &BTreeMap<String, String> {
        &self.ignored
    }

    /// Test identifiers that are both expected failures and ignored.
    pub fn overlapping(&self) -> impl Iterator<Item = &str> + '_ {
        self.expected_failures
            .keys()
            .filter(|id| self.ignored.contains_key(*id))
            .map(String::as_str)
    }

    /// Renders an issue reference, turning it into a link if it is an issue number and a template
    /// is configured.
    pub fn render_issue(&self, issue: &str) -> String {
        match &self.issue_url {
            Some(template) => template.render(issue),
            None => issue.to_owned(),
        }
    }
}

/// A URL template for issue references, containing a `{}` placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueUrlTemplate {
    template: String,
}

impl IssueUrlTemplate {
    const PLACEHOLDER: &'static str = "{}";

    /// Renders `issue` through this template if it is a bare number or `#<number>`, and returns it
    /// verbatim otherwise.
    pub fn render(&self, issue: &str) -> String {
        let number = issue.strip_prefix('#').unwrap_or(issue);
        if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
            self.template.replacen(Self::PLACEHOLDER, number, 1)
        } else {
            issue.to_owned()
        }
    }
}

impl FromStr for IssueUrlTemplate {
    type Err = IssueUrlTemplateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(Self::PLACEHOLDER) {
            Ok(Self {
                template: s.to_owned(),
            })
        } else {
            Err(IssueUrlTemplateParseError::new(s))
        }
    }
}

impl fmt::Display for IssueUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl<'de> Deserialize<'de> for IssueUrlTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The set of baselines for one family, ordered by resolution priority.
#[derive(Clone, Debug)]
pub struct BaselineRegistry {
    family: String,
    entries: Vec<(VersionRange, Baseline)>,
}

impl BaselineRegistry {
    /// Creates a new registry from entries in declaration order.
    ///
    /// Entries are sorted so that higher lower bounds are consulted first. See
    /// [`VersionRange::priority_cmp`] for the exact order; ties keep declaration order.
    pub fn new(
        family: impl Into<String>,
        mut entries: Vec<(VersionRange, Baseline)>,
    ) -> Result<Self, BaselineRegistryError> {
        let family = family.into();

        let mut names = HashSet::new();
        for (_, baseline) in &entries {
            if !names.insert(baseline.name()) {
                return Err(BaselineRegistryError::DuplicateName {
                    family,
                    name: baseline.name().to_owned(),
                });
            }
        }

        for (_, baseline) in &entries {
            for test_id in baseline.overlapping() {
                warn!(
                    "in {family} baseline `{}`, `{test_id}` is both an expected failure and \
                     ignored: treating it as ignored",
                    baseline.name(),
                );
            }
        }

        // sort_by is stable, so equal ranges keep declaration order.
        entries.sort_by(|(a, _), (b, _)| a.priority_cmp(b));

        Ok(Self { family, entries })
    }

    /// The name of this family.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Entries in resolution order.
    pub fn entries(&self) -> &[(VersionRange, Baseline)] {
        &self.entries
    }

    /// Returns the baseline that applies to `version`.
    ///
    /// Entries are scanned in priority order and the first one whose range contains `version`
    /// wins.
    pub fn resolve(&self, version: TargetVersion) -> Result<&Baseline, NoBaselineForVersion> {
        self.resolve_entry(version).map(|(_, baseline)| baseline)
    }

    /// Like [`Self::resolve`], but also returns the range that matched.
    pub fn resolve_entry(
        &self,
        version: TargetVersion,
    ) -> Result<(&VersionRange, &Baseline), NoBaselineForVersion> {
        match self
            .entries
            .iter()
            .find(|(range, _)| range.contains(version))
        {
            Some((range, baseline)) => {
                info!(
                    "using {} baseline `{}` (versions {range}) for target version {version}",
                    self.family,
                    baseline.name(),
                );
                Ok((range, baseline))
            }
            None => Err(NoBaselineForVersion::new(
                self.family.clone(),
                version,
                self.entries
                    .iter()
                    .map(|(range, _)| range.to_string())
                    .collect(),
            )),
        }
    }
}
