// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Turns configured test result reports into per-file and per-project
//! measures.
//!
//! The entry point is [`UnitTestResultsImporter`], run once per language. It
//! asks a [`ResultsAggregator`] (normally a [`ReportAggregator`] built from an
//! [`ImportConfig`]) for the merged results and publishes them to a
//! [`MeasureSink`]. A failing import is logged and recorded with the
//! [`AnalysisWarnings`] collaborator, and never propagated: one language's
//! broken report must not block another's.

mod aggregator;
mod config;
pub mod errors;
mod importer;
mod measures;
#[cfg(test)]
mod test_helpers;
mod warnings;

pub use aggregator::*;
pub use crate::config::*;
pub use importer::*;
pub use measures::*;
pub use warnings::*;
