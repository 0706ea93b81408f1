// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap, btree_map},
    fmt,
    iter::Sum,
};

/// The outcome of a single test, normalized across dialects.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TestOutcome {
    /// The test passed.
    Passed,

    /// The test failed an assertion.
    Failed,

    /// The test could not complete, for example because it threw or timed out.
    Error,

    /// The test was not run.
    Skipped,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// A single test observation read from a report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TestResultRecord {
    outcome: TestOutcome,
    duration_ms: Option<u64>,
}

impl TestResultRecord {
    /// Creates a new record.
    pub fn new(outcome: TestOutcome, duration_ms: Option<u64>) -> Self {
        Self {
            outcome,
            duration_ms,
        }
    }

    /// Returns the outcome of the test.
    pub fn outcome(&self) -> TestOutcome {
        self.outcome
    }

    /// Returns the execution time of the test in milliseconds, if reported.
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }
}

/// Accumulated test counts.
///
/// The execution time is absent until at least one merged input carries one.
/// Inputs without a time count as zero once any time is present, so `add` is
/// associative and commutative on every field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct UnitTestResults {
    tests: u64,
    skipped: u64,
    failures: u64,
    errors: u64,
    execution_time_ms: Option<u64>,
}

impl UnitTestResults {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator from raw counts.
    pub fn from_counts(
        tests: u64,
        skipped: u64,
        failures: u64,
        errors: u64,
        execution_time_ms: Option<u64>,
    ) -> Self {
        Self {
            tests,
            skipped,
            failures,
            errors,
            execution_time_ms,
        }
    }

    /// The total number of tests.
    pub fn tests(&self) -> u64 {
        self.tests
    }

    /// The number of skipped tests.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// The number of failed tests.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// The number of tests that errored.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// The cumulative execution time in milliseconds, if any input reported one.
    pub fn execution_time_ms(&self) -> Option<u64> {
        self.execution_time_ms
    }

    /// Returns true if no tests were accumulated.
    pub fn is_empty(&self) -> bool {
        self.tests == 0
    }

    /// Merges `other` into `self`.
    pub fn add(&mut self, other: &UnitTestResults) -> &mut Self {
        self.tests = self.tests.saturating_add(other.tests);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.execution_time_ms = match (self.execution_time_ms, other.execution_time_ms) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
        };
        self
    }

    /// Merges a single observation into `self`.
    pub fn add_record(&mut self, record: &TestResultRecord) -> &mut Self {
        self.add(&UnitTestResults::from(record))
    }
}

impl From<&TestResultRecord> for UnitTestResults {
    fn from(record: &TestResultRecord) -> Self {
        let mut results = Self {
            tests: 1,
            execution_time_ms: record.duration_ms,
            ..Self::default()
        };
        match record.outcome {
            TestOutcome::Passed => {}
            TestOutcome::Failed => results.failures = 1,
            TestOutcome::Error => results.errors = 1,
            TestOutcome::Skipped => results.skipped = 1,
        }
        results
    }
}

impl<'a> Sum<&'a UnitTestResults> for UnitTestResults {
    fn sum<I: Iterator<Item = &'a UnitTestResults>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, results| {
            acc.add(results);
            acc
        })
    }
}

/// The bucket a test result is charged against.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ResultKey {
    /// A source file the test was attributed to.
    File(Utf8PathBuf),

    /// Tests that could not be attributed to a source file. These only count
    /// towards the project totals.
    Unattributed,
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{path}"),
            Self::Unattributed => write!(f, "(unattributed)"),
        }
    }
}

/// Accumulated results per [`ResultKey`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultsByKey {
    inner: BTreeMap<ResultKey, UnitTestResults>,
}

impl ResultsByKey {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a single observation into the accumulator for `key`, creating
    /// it on first use.
    pub fn add_record(&mut self, key: ResultKey, record: &TestResultRecord) {
        self.inner.entry(key).or_default().add_record(record);
    }

    /// Merges every accumulator in `other` into `self`.
    pub fn merge(&mut self, other: ResultsByKey) {
        for (key, results) in other.inner {
            match self.inner.entry(key) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(results);
                }
                btree_map::Entry::Occupied(mut entry) => {
                    entry.get_mut().add(&results);
                }
            }
        }
    }

    /// Returns the accumulator for `key`, if any result was charged to it.
    pub fn get(&self, key: &ResultKey) -> Option<&UnitTestResults> {
        self.inner.get(key)
    }

    /// Returns the accumulator for the given source file.
    pub fn file(&self, path: &Utf8Path) -> Option<&UnitTestResults> {
        self.inner.get(&ResultKey::File(path.to_owned()))
    }

    /// Iterates over the attributed source files and their results, in path order.
    pub fn files(&self) -> impl Iterator<Item = (&Utf8Path, &UnitTestResults)> + '_ {
        self.inner.iter().filter_map(|(key, results)| match key {
            ResultKey::File(path) => Some((path.as_path(), results)),
            ResultKey::Unattributed => None,
        })
    }

    /// Returns the results that could not be attributed to a file.
    pub fn unattributed(&self) -> Option<&UnitTestResults> {
        self.inner.get(&ResultKey::Unattributed)
    }

    /// Returns the sum over every key, attributed or not.
    pub fn total(&self) -> UnitTestResults {
        self.inner.values().sum()
    }

    /// Iterates over all keys and their results.
    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &UnitTestResults)> + '_ {
        self.inner.iter()
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Maps fully-qualified test method names to the source file that defines them.
///
/// Deserializes from a flat JSON or TOML map of name to path.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct MethodFileMap {
    inner: HashMap<String, Utf8PathBuf>,
}

impl MethodFileMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a fully-qualified method name with a source file.
    pub fn insert(&mut self, method: impl Into<String>, file: impl Into<Utf8PathBuf>) {
        self.inner.insert(method.into(), file.into());
    }

    /// Looks up the source file for a fully-qualified method name.
    pub fn get(&self, method: &str) -> Option<&Utf8Path> {
        self.inner.get(method).map(|path| path.as_path())
    }

    /// The number of known methods.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>, V: Into<Utf8PathBuf>> FromIterator<(K, V)> for MethodFileMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(method, file)| (method.into(), file.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prop_assert_eq;
    use test_case::test_case;
    use test_strategy::proptest;

    fn merged(a: UnitTestResults, b: UnitTestResults) -> UnitTestResults {
        let mut out = a;
        out.add(&b);
        out
    }

    #[proptest]
    fn add_is_commutative(a: UnitTestResults, b: UnitTestResults) {
        prop_assert_eq!(merged(a, b), merged(b, a));
    }

    // Saturation keeps this true even at the u64 boundary.
    #[proptest]
    fn add_is_associative(a: UnitTestResults, b: UnitTestResults, c: UnitTestResults) {
        prop_assert_eq!(merged(merged(a, b), c), merged(a, merged(b, c)));
    }

    #[proptest]
    fn empty_is_identity(a: UnitTestResults) {
        prop_assert_eq!(merged(a, UnitTestResults::new()), a);
    }

    #[test_case(None, None, None ; "neither timed")]
    #[test_case(Some(5), None, Some(5) ; "left timed")]
    #[test_case(None, Some(7), Some(7) ; "right timed")]
    #[test_case(Some(5), Some(7), Some(12) ; "both timed")]
    fn execution_time_merge(left: Option<u64>, right: Option<u64>, expected: Option<u64>) {
        let a = UnitTestResults::from_counts(1, 0, 0, 0, left);
        let b = UnitTestResults::from_counts(1, 0, 0, 0, right);
        assert_eq!(merged(a, b).execution_time_ms(), expected);
    }

    #[test_case(TestOutcome::Passed, (1, 0, 0, 0) ; "passed")]
    #[test_case(TestOutcome::Failed, (1, 0, 1, 0) ; "failed")]
    #[test_case(TestOutcome::Error, (1, 0, 0, 1) ; "error")]
    #[test_case(TestOutcome::Skipped, (1, 1, 0, 0) ; "skipped")]
    fn record_counts(outcome: TestOutcome, expected: (u64, u64, u64, u64)) {
        let mut results = UnitTestResults::new();
        results.add_record(&TestResultRecord::new(outcome, None));
        assert_eq!(
            (
                results.tests(),
                results.skipped(),
                results.failures(),
                results.errors()
            ),
            expected,
        );
        assert_eq!(results.execution_time_ms(), None);
    }

    #[test]
    fn counters_saturate() {
        let mut results = UnitTestResults::from_counts(u64::MAX, 0, 0, 0, Some(u64::MAX));
        results.add_record(&TestResultRecord::new(TestOutcome::Passed, Some(1)));
        assert_eq!(results.tests(), u64::MAX);
        assert_eq!(results.execution_time_ms(), Some(u64::MAX));
    }

    #[test]
    fn results_by_key_views() {
        let mut results = ResultsByKey::new();
        let passed = TestResultRecord::new(TestOutcome::Passed, Some(10));
        let failed = TestResultRecord::new(TestOutcome::Failed, None);
        results.add_record(ResultKey::File("b.cs".into()), &passed);
        results.add_record(ResultKey::File("a.cs".into()), &failed);
        results.add_record(ResultKey::Unattributed, &passed);

        let files: Vec<_> = results.files().map(|(path, _)| path.as_str()).collect();
        assert_eq!(files, ["a.cs", "b.cs"]);
        assert_eq!(
            results.unattributed(),
            Some(&UnitTestResults::from_counts(1, 0, 0, 0, Some(10)))
        );
        assert_eq!(
            results.total(),
            UnitTestResults::from_counts(3, 0, 1, 0, Some(20))
        );
    }

    #[test]
    fn results_by_key_merge() {
        let record = TestResultRecord::new(TestOutcome::Skipped, Some(3));

        let mut left = ResultsByKey::new();
        left.add_record(ResultKey::File("a.cs".into()), &record);
        let mut right = ResultsByKey::new();
        right.add_record(ResultKey::File("a.cs".into()), &record);
        right.add_record(ResultKey::File("c.cs".into()), &record);

        left.merge(right);
        assert_eq!(left.len(), 2);
        assert_eq!(
            left.file(Utf8Path::new("a.cs")),
            Some(&UnitTestResults::from_counts(2, 2, 0, 0, Some(6)))
        );
    }

    #[test]
    fn method_file_map_from_json() {
        let map: MethodFileMap = serde_json::from_str(
            r#"{ "My.Tests.Ns.FooTests.Bar": "tests/FooTests.cs" }"#,
        )
        .expect("valid method map");
        assert_eq!(
            map.get("My.Tests.Ns.FooTests.Bar"),
            Some(Utf8Path::new("tests/FooTests.cs"))
        );
        assert_eq!(map.get("My.Tests.Ns.FooTests.Baz"), None);
    }
}
