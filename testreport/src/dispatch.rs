// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::TestReportExitCode,
    output::{OutputContext, OutputFormat, OutputOpts, clap_styles},
    report::ImportReport,
};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;
use testreport_import::{
    DefaultConfigWarnings, ImportConfig, InMemoryMeasureStore, ReportAggregator, UniqueWarnings,
    UnitTestResultsImporter, load_method_file_map,
};
use testreport_xml::MethodFileMap;
use tracing::debug;

/// Imports unit test reports and prints the resulting measures.
///
/// Report locations are configured per language in a TOML file. Each
/// language is imported independently: a broken report is logged and listed
/// as a warning, and does not stop other languages from being imported.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct TestReportApp {
    /// Config file
    #[arg(
        long,
        value_name = "PATH",
        default_value = ImportConfig::CONFIG_PATH,
        env = "TESTREPORT_CONFIG"
    )]
    config: Utf8PathBuf,

    /// JSON object mapping fully-qualified test methods to source files
    ///
    /// Without a map, every result is counted towards the project only.
    #[arg(long, value_name = "PATH")]
    method_map: Option<Utf8PathBuf>,

    /// Key of the project measures are published for
    #[arg(long, value_name = "KEY", default_value = "project")]
    project_key: String,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FMT")]
    format: OutputFormat,

    #[command(flatten)]
    output: OutputOpts,
}

impl TestReportApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing the import report to `writer`.
    pub fn exec(self, output: OutputContext, writer: &mut dyn Write) -> Result<i32, ExpectedError> {
        let config = ImportConfig::from_file(&self.config, &mut DefaultConfigWarnings)?;
        let method_file_map = match &self.method_map {
            Some(path) => load_method_file_map(path)?,
            None => MethodFileMap::new(),
        };
        debug!(
            "loaded {} method mapping(s), resolving reports against `{}`",
            method_file_map.len(),
            config.base_dir()
        );

        let mut store = InMemoryMeasureStore::new();
        let mut warnings = UniqueWarnings::new();
        let mut languages = Vec::new();
        for language in config.languages() {
            let aggregator =
                ReportAggregator::new(language.reports(), config.base_dir(), &method_file_map);
            let outcome = UnitTestResultsImporter::new(
                aggregator,
                language.language().clone(),
                &mut warnings,
            )
            .execute(&mut store, &self.project_key);
            languages.push((language.language().clone(), outcome));
        }

        let report = ImportReport::new(&self.project_key, languages, &store, &warnings);
        match self.format {
            OutputFormat::Human => report.write_human(&output.stdout_styles(), &mut *writer),
            OutputFormat::Json => report.write_json(&mut *writer),
        }
        .and_then(|()| writer.flush())
        .map_err(ExpectedError::write_error)?;

        Ok(TestReportExitCode::OK)
    }
}
