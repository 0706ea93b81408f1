// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    aggregator::ResultsAggregator,
    config::Language,
    errors::{DisplayErrorChain, DuplicateMeasureError, ImportError},
    measures::{MeasureKey, MeasureSink, Metric},
    warnings::AnalysisWarnings,
};
use testreport_xml::UnitTestResults;
use tracing::{debug, info, warn};

/// The result of one [`UnitTestResultsImporter::execute`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImportOutcome {
    /// No reports are configured; nothing was published.
    Skipped,

    /// Measures were published.
    Imported {
        /// The number of source files measures were published for, not
        /// counting the project.
        files: usize,
    },

    /// The import failed. The failure was logged and added to the analysis
    /// warnings.
    Failed,
}

/// Imports the unit test results of one language.
#[derive(Debug)]
pub struct UnitTestResultsImporter<A, W> {
    aggregator: A,
    language: Language,
    warnings: W,
}

impl<A: ResultsAggregator, W: AnalysisWarnings> UnitTestResultsImporter<A, W> {
    /// Creates a new importer.
    pub fn new(aggregator: A, language: Language, warnings: W) -> Self {
        Self {
            aggregator,
            language,
            warnings,
        }
    }

    /// The language this importer runs for.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Publishes per-file and per-project measures to `sink`.
    ///
    /// This never fails: errors are logged, and reported once per language
    /// through the analysis warnings.
    pub fn execute(&mut self, sink: &mut dyn MeasureSink, project_key: &str) -> ImportOutcome {
        if !self.aggregator.has_applicable_reports() {
            debug!("No unit test results property. Skip import");
            return ImportOutcome::Skipped;
        }

        match self.import(sink, project_key) {
            Ok(files) => {
                info!(
                    "Imported unit test results for {} ({files} file(s))",
                    self.language
                );
                ImportOutcome::Imported { files }
            }
            Err(err) => {
                warn!(
                    "Could not import unit test report: '{}'",
                    DisplayErrorChain::new(&err)
                );
                self.warnings.add_unique(&format!(
                    "Could not import unit test report for '{}'. \
                     Please check the logs for more details.",
                    self.language.name()
                ));
                ImportOutcome::Failed
            }
        }
    }

    fn import(&self, sink: &mut dyn MeasureSink, project_key: &str) -> Result<usize, ImportError> {
        let aggregated = self.aggregator.aggregate()?;

        let mut files = 0;
        for (path, results) in aggregated.files() {
            save_results(sink, &MeasureKey::File(path.to_owned()), results)?;
            files += 1;
        }
        save_results(
            sink,
            &MeasureKey::Project(project_key.to_owned()),
            &aggregated.project(),
        )?;
        Ok(files)
    }

    /// Consumes the importer, returning the warnings collaborator.
    pub fn into_warnings(self) -> W {
        self.warnings
    }
}

fn save_results(
    sink: &mut dyn MeasureSink,
    key: &MeasureKey,
    results: &UnitTestResults,
) -> Result<(), DuplicateMeasureError> {
    for metric in Metric::ALL {
        // The execution time is only published if some report carried one.
        if let Some(value) = metric.value(results) {
            sink.save(key, metric, value)?;
        }
    }
    Ok(())
}
