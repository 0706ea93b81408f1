// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while importing test reports.

use crate::measures::{MeasureKey, Metric};
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{error::Error as StdError, fmt};
use testreport_xml::errors::ReportParseError;
use thiserror::Error;

/// An error that occurred while parsing the import config.
#[derive(Debug, Error)]
#[error("failed to parse testreport config at `{config_file}`")]
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

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of config parse error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The config file could not be read or is not valid TOML.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The config file has the wrong shape.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A language section has an empty key.
    #[error("language keys must not be empty")]
    EmptyLanguageKey,
}

/// An error that occurred while loading a method-file map.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MethodMapLoadError {
    /// The file could not be read.
    #[error("failed to read method map at `{path}`")]
    Read {
        /// The path to the method map.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The file is not a JSON object of method names to paths.
    #[error("failed to parse method map at `{path}`")]
    Parse {
        /// The path to the method map.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },
}

/// An error that occurred while gathering results for one language.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AggregateError {
    /// A configured report path is not a valid glob.
    #[error("invalid report path pattern `{pattern}`")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,

        /// The underlying error.
        #[source]
        err: globset::Error,
    },

    /// A directory could not be traversed while resolving a pattern.
    #[error("error walking `{root}` for report path pattern `{pattern}`")]
    Walk {
        /// The pattern being resolved.
        pattern: String,

        /// The directory the traversal started from.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// A report could not be parsed.
    #[error(transparent)]
    Parse(#[from] ReportParseError),
}

/// A measure was published twice for the same key.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("cannot add the same measure twice: `{metric}` for {key}")]
pub struct DuplicateMeasureError {
    key: MeasureKey,
    metric: Metric,
}

impl DuplicateMeasureError {
    pub(crate) fn new(key: MeasureKey, metric: Metric) -> Self {
        Self { key, metric }
    }

    /// Returns the key that already had this measure.
    pub fn key(&self) -> &MeasureKey {
        &self.key
    }

    /// Returns the metric that was published twice.
    pub fn metric(&self) -> Metric {
        self.metric
    }
}

/// An error that caused an import to fail.
///
/// [`UnitTestResultsImporter`](crate::UnitTestResultsImporter) logs these
/// rather than returning them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    /// Results could not be gathered.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Results could not be published.
    #[error(transparent)]
    Publish(#[from] DuplicateMeasureError),
}

/// Displays an error followed by its chain of sources on a single line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: StdError> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: StdError> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut source = self.error.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
