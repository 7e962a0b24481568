// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding classified results into a [`ResultSet`].

use crate::classify::{Category, ClassifiedResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Per-category counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: [usize; Category::ALL.len()],
}

impl CategoryCounts {
    /// Returns the count for `category`.
    pub fn get(&self, category: Category) -> usize {
        self.counts[category as usize]
    }

    /// The sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn increment(&mut self, category: Category) {
        self.counts[category as usize] += 1;
    }

    fn decrement(&mut self, category: Category) {
        self.counts[category as usize] -= 1;
    }
}

/// The aggregated results of a run.
///
/// Each test identifier contributes exactly one classification: if an identifier appears more
/// than once in the input, the last occurrence wins and every field reflects only that
/// occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    counts: CategoryCounts,
    results: BTreeMap<String, ClassifiedResult>,
    current_failures: BTreeSet<String>,
    drift: BTreeSet<String>,
}

impl ResultSet {
    /// The number of distinct tests seen.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Per-category counters.
    pub fn counts(&self) -> &CategoryCounts {
        &self.counts
    }

    /// Returns the classified result for `test_id`, if the test was seen.
    pub fn get(&self, test_id: &str) -> Option<&ClassifiedResult> {
        self.results.get(test_id)
    }

    /// Every classified result, sorted by test identifier.
    pub fn results(&self) -> impl ExactSizeIterator<Item = &ClassifiedResult> + '_ {
        self.results.values()
    }

    /// Every test identifier seen, sorted.
    pub fn all_tests(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.keys().map(String::as_str)
    }

    /// Tests that failed in this run, whether expected or not, sorted by identifier.
    pub fn current_failures(&self) -> impl Iterator<Item = &ClassifiedResult> + '_ {
        self.current_failures.iter().filter_map(|id| self.get(id))
    }

    /// Tests whose outcome disagrees with the baseline, sorted by identifier.
    pub fn drift(&self) -> impl Iterator<Item = &ClassifiedResult> + '_ {
        self.drift.iter().filter_map(|id| self.get(id))
    }

    /// Returns true if any test has drifted.
    pub fn has_drift(&self) -> bool {
        !self.drift.is_empty()
    }
}

/// Builds a [`ResultSet`] in a single sequential pass.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    set: ResultSet,
    duplicates: usize,
}

impl ResultAggregator {
    /// Creates a new, empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a classified result, replacing any earlier result for the same test.
    pub fn add(&mut self, result: ClassifiedResult) {
        let set = &mut self.set;
        let category = result.category;

        if category.is_drift() {
            set.drift.insert(result.test_id.clone());
        }
        if category.is_current_failure() {
            set.current_failures.insert(result.test_id.clone());
        }
        set.counts.increment(category);

        if let Some(previous) = set.results.insert(result.test_id.clone(), result) {
            debug!(
                "test `{}` reported more than once, replacing `{}` with the later outcome",
                previous.test_id, previous.status,
            );
            self.duplicates += 1;
            self.retract(&previous, category);
        }
    }

    /// Removes the contribution of `previous`, which has been replaced by a result with category
    /// `replacement`.
    fn retract(&mut self, previous: &ClassifiedResult, replacement: Category) {
        let set = &mut self.set;
        set.counts.decrement(previous.category);
        if previous.category.is_drift() && !replacement.is_drift() {
            set.drift.remove(&previous.test_id);
        }
        if previous.category.is_current_failure() && !replacement.is_current_failure() {
            set.current_failures.remove(&previous.test_id);
        }
    }

    /// Finishes aggregation, returning the result set.
    pub fn finish(self) -> ResultSet {
        if self.duplicates > 0 {
            debug!(
                "{} duplicate test outcomes replaced by later ones",
                self.duplicates
            );
        }
        self.set
    }
}

impl FromIterator<ClassifiedResult> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ClassifiedResult>>(iter: T) -> Self {
        let mut aggregator = ResultAggregator::new();
        for result in iter {
            aggregator.add(result);
        }
        aggregator.finish()
    }
}
