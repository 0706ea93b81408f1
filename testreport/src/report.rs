// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::Styles;
use owo_colors::OwoColorize;
use serde_json::{Value, json};
use std::io::{self, Write};
use testreport_import::{
    ImportOutcome, InMemoryMeasureStore, Language, MeasureKey, Metric, UniqueWarnings,
};

/// The result of a `testreport` run: one outcome per language, plus every
/// measure and warning produced.
#[derive(Clone, Debug)]
pub(crate) struct ImportReport<'a> {
    project_key: &'a str,
    languages: Vec<(Language, ImportOutcome)>,
    store: &'a InMemoryMeasureStore,
    warnings: &'a UniqueWarnings,
}

impl<'a> ImportReport<'a> {
    pub(crate) fn new(
        project_key: &'a str,
        languages: Vec<(Language, ImportOutcome)>,
        store: &'a InMemoryMeasureStore,
        warnings: &'a UniqueWarnings,
    ) -> Self {
        Self {
            project_key,
            languages,
            store,
            warnings,
        }
    }

    pub(crate) fn write_human(&self, styles: &Styles, mut writer: impl Write) -> io::Result<()> {
        for (language, outcome) in &self.languages {
            write!(writer, "{:>10} ", language.name().style(styles.bold))?;
            match outcome {
                ImportOutcome::Skipped => writeln!(writer, "{}", "skipped".style(styles.skipped))?,
                ImportOutcome::Imported { files } => writeln!(
                    writer,
                    "{} ({files} {})",
                    "imported".style(styles.success),
                    if *files == 1 { "file" } else { "files" },
                )?,
                ImportOutcome::Failed => writeln!(writer, "{}", "failed".style(styles.failure))?,
            }
        }

        let mut current_key = None;
        for (key, metric, value) in self.store.iter() {
            if current_key != Some(key) {
                writeln!(writer, "\n{}:", key.style(styles.bold))?;
                current_key = Some(key);
            }
            writeln!(writer, "    {:<22}{value}", format!("{metric}:"))?;
        }

        if !self.warnings.is_empty() {
            writeln!(writer)?;
            for warning in self.warnings.iter() {
                writeln!(
                    writer,
                    "{}: {}",
                    "warning".style(styles.warning_text),
                    warning
                )?;
            }
        }
        Ok(())
    }

    pub(crate) fn to_json(&self) -> Value {
        let languages: Vec<_> = self
            .languages
            .iter()
            .map(|(language, outcome)| {
                let mut value = json!({
                    "key": language.key(),
                    "name": language.name(),
                    "outcome": outcome_str(outcome),
                });
                if let ImportOutcome::Imported { files } = outcome {
                    value["files"] = json!(files);
                }
                value
            })
            .collect();
        let measures: Vec<_> = self
            .store
            .iter()
            .map(|(key, metric, value)| measure_json(key, metric, value))
            .collect();
        let warnings: Vec<_> = self.warnings.iter().collect();

        json!({
            "project-key": self.project_key,
            "languages": languages,
            "measures": measures,
            "warnings": warnings,
        })
    }

    pub(crate) fn write_json(&self, mut writer: impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.to_json()).map_err(io::Error::from)?;
        writeln!(writer)
    }
}

fn outcome_str(outcome: &ImportOutcome) -> &'static str {
    match outcome {
        ImportOutcome::Skipped => "skipped",
        ImportOutcome::Imported { .. } => "imported",
        ImportOutcome::Failed => "failed",
    }
}

fn measure_json(key: &MeasureKey, metric: Metric, value: u64) -> Value {
    let (scope, component) = match key {
        MeasureKey::Project(project) => ("project", project.as_str()),
        MeasureKey::File(path) => ("file", path.as_str()),
    };
    json!({
        "scope": scope,
        "component": component,
        "metric": metric.key(),
        "value": value,
    })
}
