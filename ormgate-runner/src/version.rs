// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Target-system versions and version ranges.
//!
//! Baselines are selected by comparing a [`TargetVersion`] against the [`VersionRange`] each
//! baseline is declared for.

use crate::errors::{TargetVersionParseError, VersionRangeParseError};
use serde::{Deserialize, Deserializer};
use std::{cmp::Ordering, fmt, str::FromStr};

/// The version of the system under test, as a `(major, minor, point)` triple.
///
/// Parsed from release tags such as `rel_1_3_17`, or from dotted forms such as `v21.1.3`,
/// `21.1.3` and `v21.1` (in which case the point component is 0). Pre-release and build suffixes
/// (`v21.1.0-beta.2`, `21.1.0+build`) are dropped: versions are only used for range membership.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetVersion {
    major: u64,
    minor: u64,
    point: u64,
}

impl TargetVersion {
    const RELEASE_TAG_PREFIX: &'static str = "rel_";

    /// Creates a new `TargetVersion`.
    pub const fn new(major: u64, minor: u64, point: u64) -> Self {
        Self {
            major,
            minor,
            point,
        }
    }

    /// The major component.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// The minor component.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The point component.
    pub fn point(&self) -> u64 {
        self.point
    }

    fn parse_release_tag(input: &str, rest: &str) -> Result<Self, TargetVersionParseError> {
        let components: Vec<_> = rest.split('_').collect();
        if components.len() != 3 {
            return Err(TargetVersionParseError::new(
                input,
                "release tags must have the form rel_<major>_<minor>_<point>",
            ));
        }
        Self::from_components(input, &components)
    }

    fn parse_dotted(input: &str, s: &str) -> Result<Self, TargetVersionParseError> {
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let s = match s.find(['-', '+']) {
            Some(idx) => &s[..idx],
            None => s,
        };
        let components: Vec<_> = s.split('.').collect();
        match components.len() {
            2 | 3 => Self::from_components(input, &components),
            _ => Err(TargetVersionParseError::new(
                input,
                "expected two or three dot-separated components",
            )),
        }
    }

    fn from_components(input: &str, components: &[&str]) -> Result<Self, TargetVersionParseError> {
        let mut parsed = [0u64; 3];
        for (slot, component) in parsed.iter_mut().zip(components) {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TargetVersionParseError::new(
                    input,
                    "expected numeric components",
                ));
            }
            *slot = component
                .parse()
                .map_err(|_| TargetVersionParseError::new(input, "component out of range"))?;
        }
        let [major, minor, point] = parsed;
        Ok(Self::new(major, minor, point))
    }
}

impl FromStr for TargetVersion {
    type Err = TargetVersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TargetVersionParseError::new(input, "version is empty"));
        }

        match s.strip_prefix(Self::RELEASE_TAG_PREFIX) {
            Some(rest) => Self::parse_release_tag(input, rest),
            None => Self::parse_dotted(input, s),
        }
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.point)
    }
}

impl<'de> Deserialize<'de> for TargetVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The range of target versions a baseline applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VersionRange {
    /// Every version greater than or equal to the bound.
    AtLeast(TargetVersion),

    /// Every version between `min` and `max`, inclusive on both ends.
    Between {
        /// The lower bound.
        min: TargetVersion,

        /// The upper bound.
        max: TargetVersion,
    },
}

impl VersionRange {
    /// Creates a closed range, checking that `min <= max`.
    pub fn between(min: TargetVersion, max: TargetVersion) -> Result<Self, VersionRangeParseError> {
        if min > max {
            return Err(VersionRangeParseError::Inverted { min, max });
        }
        Ok(Self::Between { min, max })
    }

    /// Returns true if `version` falls within this range.
    pub fn contains(&self, version: TargetVersion) -> bool {
        match self {
            Self::AtLeast(min) => version >= *min,
            Self::Between { min, max } => *min <= version && version <= *max,
        }
    }

    /// The lower bound of this range.
    pub fn min(&self) -> TargetVersion {
        match self {
            Self::AtLeast(min) | Self::Between { min, .. } => *min,
        }
    }

    /// The upper bound of this range, if it is closed.
    pub fn max(&self) -> Option<TargetVersion> {
        match self {
            Self::AtLeast(_) => None,
            Self::Between { max, .. } => Some(*max),
        }
    }

    /// Compares two ranges by resolution priority. Ranges that compare as [`Ordering::Less`] are
    /// consulted first.
    ///
    /// Higher lower bounds come first. On equal lower bounds, closed ranges come before open
    /// ones, and narrower closed ranges before wider ones.
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        other
            .min()
            .cmp(&self.min())
            .then_with(|| match (self.max(), other.max()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl FromStr for VersionRange {
    type Err = VersionRangeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if let Some(min) = s.strip_prefix(">=") {
            return Ok(Self::AtLeast(min.parse()?));
        }
        if let Some((min, max)) = s.split_once("..=") {
            return Self::between(min.parse()?, max.parse()?);
        }
        Err(VersionRangeParseError::InvalidFormat {
            input: input.to_owned(),
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(min) => write!(f, ">= {min}"),
            Self::Between { min, max } => write!(f, "{min} ..= {max}"),
        }
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;

        impl<'de2> serde::de::Visitor<'de2> for V {
            type Value = VersionRange;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a table ({ min = \"21.1.0\", max = \"21.2.0\" }) or a string (\">= 21.1.0\")",
                )
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                s.parse().map_err(E::custom)
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de2>,
            {
                #[derive(Deserialize)]
                #[serde(deny_unknown_fields)]
                struct VersionRangeMap {
                    min: TargetVersion,
                    #[serde(default)]
                    max: Option<TargetVersion>,
                }

                let VersionRangeMap { min, max } = VersionRangeMap::deserialize(
                    serde::de::value::MapAccessDeserializer::new(map),
                )?;

                match max {
                    Some(max) => VersionRange::between(min, max).map_err(serde::de::Error::custom),
                    None => Ok(VersionRange::AtLeast(min)),
                }
            }
        }

        deserializer.deserialize_any(V)
    }
}
