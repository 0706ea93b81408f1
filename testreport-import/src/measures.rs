// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::DuplicateMeasureError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, map::Entry};
use std::fmt;
use testreport_xml::UnitTestResults;

/// What a measure is recorded against.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MeasureKey {
    /// The whole project, identified by its key.
    Project(String),

    /// A single source file.
    File(Utf8PathBuf),
}

impl MeasureKey {
    /// Returns the file path, if this is a file key.
    pub fn as_file(&self) -> Option<&Utf8Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Project(_) => None,
        }
    }
}

impl fmt::Display for MeasureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(key) => write!(f, "project `{key}`"),
            Self::File(path) => write!(f, "file `{path}`"),
        }
    }
}

/// A test metric.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Metric {
    /// Number of tests.
    Tests,

    /// Number of skipped tests.
    SkippedTests,

    /// Number of failed tests.
    TestFailures,

    /// Number of tests that errored.
    TestErrors,

    /// Cumulative execution time in milliseconds.
    TestExecutionTime,
}

impl Metric {
    /// All metrics, in publication order.
    pub const ALL: [Metric; 5] = [
        Metric::Tests,
        Metric::SkippedTests,
        Metric::TestFailures,
        Metric::TestErrors,
        Metric::TestExecutionTime,
    ];

    /// The stable string key of this metric.
    pub fn key(self) -> &'static str {
        match self {
            Self::Tests => "tests",
            Self::SkippedTests => "skipped_tests",
            Self::TestFailures => "test_failures",
            Self::TestErrors => "test_errors",
            Self::TestExecutionTime => "test_execution_time",
        }
    }

    /// Reads this metric off accumulated results. Returns `None` for the
    /// execution time if no report carried one.
    pub fn value(self, results: &UnitTestResults) -> Option<u64> {
        match self {
            Self::Tests => Some(results.tests()),
            Self::SkippedTests => Some(results.skipped()),
            Self::TestFailures => Some(results.failures()),
            Self::TestErrors => Some(results.errors()),
            Self::TestExecutionTime => results.execution_time_ms(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Receives published measures.
pub trait MeasureSink {
    /// Records `value` for `metric` on `key`.
    ///
    /// Implementations reject a second value for the same `(key, metric)`
    /// pair, leaving the first in place.
    fn save(
        &mut self,
        key: &MeasureKey,
        metric: Metric,
        value: u64,
    ) -> Result<(), DuplicateMeasureError>;
}

impl<T: MeasureSink + ?Sized> MeasureSink for &mut T {
    fn save(
        &mut self,
        key: &MeasureKey,
        metric: Metric,
        value: u64,
    ) -> Result<(), DuplicateMeasureError> {
        (**self).save(key, metric, value)
    }
}

/// A [`MeasureSink`] that keeps measures in memory, in the order they were saved.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMeasureStore {
    measures: IndexMap<(MeasureKey, Metric), u64>,
}

impl InMemoryMeasureStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value saved for `metric` on `key`.
    pub fn get(&self, key: &MeasureKey, metric: Metric) -> Option<u64> {
        self.measures.get(&(key.clone(), metric)).copied()
    }

    /// Returns all measures saved for `key`, in the order they were saved.
    pub fn measures_for<'a>(
        &'a self,
        key: &'a MeasureKey,
    ) -> impl Iterator<Item = (Metric, u64)> + 'a {
        self.measures
            .iter()
            .filter(move |((k, _), _)| k == key)
            .map(|((_, metric), value)| (*metric, *value))
    }

    /// Iterates over every saved measure.
    pub fn iter(&self) -> impl Iterator<Item = (&MeasureKey, Metric, u64)> + '_ {
        self.measures
            .iter()
            .map(|((key, metric), value)| (key, *metric, *value))
    }

    /// The number of saved measures.
    pub fn len(&self) -> usize {
        self.measures.len()
    }

    /// Returns true if nothing was saved.
    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}

impl MeasureSink for InMemoryMeasureStore {
    fn save(
        &mut self,
        key: &MeasureKey,
        metric: Metric,
        value: u64,
    ) -> Result<(), DuplicateMeasureError> {
        match self.measures.entry((key.clone(), metric)) {
            Entry::Occupied(_) => Err(DuplicateMeasureError::new(key.clone(), metric)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }
}
