// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, Styles};
use owo_colors::OwoColorize;
use std::error::Error;
use testreport_import::errors::{ConfigParseError, MethodMapLoadError};
use thiserror::Error;
use tracing::error;

/// Documented exit codes for `testreport` failures.
///
/// A failed import of a single language is not an error: it is reported as a
/// warning and the run still exits with [`TestReportExitCode::OK`].
pub enum TestReportExitCode {}

impl TestReportExitCode {
    /// The import ran to completion.
    pub const OK: i32 = 0;

    /// The configuration or the method map could not be loaded.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing the import report failed.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

/// An error that stops `testreport` before or after the import runs.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("method map load error")]
    MethodMapLoadError {
        #[from]
        err: MethodMapLoadError,
    },
    #[error("error writing report")]
    WriteError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_error(err: std::io::Error) -> Self {
        Self::WriteError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::MethodMapLoadError { .. } => {
                TestReportExitCode::SETUP_ERROR
            }
            Self::WriteError { .. } => TestReportExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &Styles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::MethodMapLoadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteError { err } => {
                error!("failed to write import report");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn exit_codes() {
        let write = ExpectedError::write_error(io::Error::other("disk full"));
        assert_eq!(write.process_exit_code(), TestReportExitCode::WRITE_OUTPUT_ERROR);

        let load = ExpectedError::from(MethodMapLoadError::Read {
            path: "methods.json".into(),
            err: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(load.process_exit_code(), TestReportExitCode::SETUP_ERROR);
    }
}
