// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{config::LanguageReports, errors::AggregateError};
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use std::collections::BTreeSet;
use testreport_xml::{Dialect, MethodFileMap, ResultsByKey, UnitTestResults};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Gathers the test results for one import.
pub trait ResultsAggregator {
    /// Returns true if at least one report path is configured.
    ///
    /// If this returns false, there is nothing to import.
    fn has_applicable_reports(&self) -> bool;

    /// Parses every configured report and merges their results.
    fn aggregate(&self) -> Result<AggregatedResults, AggregateError>;
}

impl<T: ResultsAggregator + ?Sized> ResultsAggregator for &T {
    fn has_applicable_reports(&self) -> bool {
        (**self).has_applicable_reports()
    }

    fn aggregate(&self) -> Result<AggregatedResults, AggregateError> {
        (**self).aggregate()
    }
}

/// Merged results across every report of an import.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AggregatedResults {
    results: ResultsByKey,
}

impl AggregatedResults {
    /// Wraps per-key results.
    pub fn new(results: ResultsByKey) -> Self {
        Self { results }
    }

    /// The project roll-up: every result, attributed or not.
    pub fn project(&self) -> UnitTestResults {
        self.results.total()
    }

    /// Results per attributed source file, in path order.
    pub fn files(&self) -> impl Iterator<Item = (&Utf8Path, &UnitTestResults)> + '_ {
        self.results.files()
    }

    /// Results that could not be attributed to a source file.
    pub fn unattributed(&self) -> Option<&UnitTestResults> {
        self.results.unattributed()
    }

    /// The underlying per-key table.
    pub fn results(&self) -> &ResultsByKey {
        &self.results
    }
}

/// A [`ResultsAggregator`] that reads report files from disk.
#[derive(Clone, Debug)]
pub struct ReportAggregator<'a> {
    reports: &'a LanguageReports,
    base_dir: &'a Utf8Path,
    method_file_map: &'a MethodFileMap,
}

impl<'a> ReportAggregator<'a> {
    /// Creates a new aggregator. Report path patterns are resolved relative
    /// to `base_dir`.
    pub fn new(
        reports: &'a LanguageReports,
        base_dir: &'a Utf8Path,
        method_file_map: &'a MethodFileMap,
    ) -> Self {
        Self {
            reports,
            base_dir,
            method_file_map,
        }
    }
}

impl ResultsAggregator for ReportAggregator<'_> {
    fn has_applicable_reports(&self) -> bool {
        !self.reports.is_empty()
    }

    fn aggregate(&self) -> Result<AggregatedResults, AggregateError> {
        let mut seen = BTreeSet::new();
        let mut results = ResultsByKey::new();

        for (dialect, pattern) in self.reports.iter() {
            let paths = resolve_pattern(self.base_dir, pattern)?;
            if paths.is_empty() {
                info!("No {dialect} test report found for '{pattern}'");
                continue;
            }

            for path in paths {
                if !seen.insert((dialect, path.clone())) {
                    debug!("{dialect} test report '{path}' already imported, skipping");
                    continue;
                }
                // Parse into a fresh table so a failing file contributes
                // nothing.
                let mut file_results = ResultsByKey::new();
                dialect.parse(&path, &mut file_results, self.method_file_map)?;
                results.merge(file_results);
            }
        }

        Ok(AggregatedResults::new(results))
    }
}

/// Resolves a report path pattern to the files it matches, sorted.
///
/// Leading components without glob metacharacters form the directory the
/// search starts from, so `TestResults/**/*.trx` only walks `TestResults`.
/// A pattern without any metacharacter names a single file.
fn resolve_pattern(
    base_dir: &Utf8Path,
    pattern: &str,
) -> Result<Vec<Utf8PathBuf>, AggregateError> {
    let pattern_path = Utf8Path::new(pattern);
    if !pattern.contains(['*', '?', '[', '{']) {
        let path = base_dir.join(pattern_path);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }

    let mut root = base_dir.to_owned();
    let mut glob_components = Vec::new();
    for component in pattern_path.components() {
        let component = component.as_str();
        if glob_components.is_empty() && !component.contains(['*', '?', '[', '{']) {
            root.push(component);
        } else {
            glob_components.push(component);
        }
    }
    let glob = glob_components.join("/");

    let matcher = GlobBuilder::new(&glob)
        .literal_separator(true)
        .build()
        .map_err(|err| AggregateError::InvalidPattern {
            pattern: pattern.to_owned(),
            err,
        })?
        .compile_matcher();

    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|err| AggregateError::Walk {
            pattern: pattern.to_owned(),
            root: root.clone(),
            err,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            debug!("skipping non-UTF-8 path {}", entry.path().display());
            continue;
        };
        let Ok(relative) = path.strip_prefix(&root) else {
            continue;
        };
        if matcher.is_match(relative) {
            paths.push(path.to_owned());
        }
    }
    paths.sort();
    Ok(paths)
}
