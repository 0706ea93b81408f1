// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NUnit 2 (`<test-results>`) and NUnit 3 (`<test-run>`) reports.
//!
//! The two formats share the `test-suite`/`test-case` structure but name a few
//! attributes differently: NUnit 3 carries the qualified test name in
//! `fullname` and the time in `duration`, NUnit 2 uses `name` and `time`.

use super::{assembly_qualifier, qualified_name, seconds_attribute_as_millis};
use crate::{
    errors::{AttributeError, ReportParseError},
    parser::{Attribution, ReportParser, TagHandler},
    reader::AttributeReader,
    results::{MethodFileMap, ResultsByKey, TestOutcome, TestResultRecord},
};
use tracing::{debug, info};

static ROOT_TAGS: &[&str] = &["test-results", "test-run"];

const TAG_HANDLERS: &[(&str, TagHandler<NUnitState>)] = &[
    ("test-suite", handle_test_suite_tag),
    ("test-case", handle_test_case_tag),
];

#[derive(Debug, Default)]
struct NUnitState {
    qualifier: Option<String>,
}

pub(super) fn parse(
    reader: AttributeReader,
    results: &mut ResultsByKey,
    method_file_map: &MethodFileMap,
) -> Result<(), ReportParseError> {
    info!("Parsing the NUnit test results file '{}'", reader.path());
    ReportParser::new(results, method_file_map, ROOT_TAGS).parse(
        reader,
        &mut NUnitState::default(),
        TAG_HANDLERS,
    )
}

fn handle_test_suite_tag(
    state: &mut NUnitState,
    _attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    if reader.optional_attribute("type")?.as_deref() != Some("Assembly") {
        return Ok(());
    }
    let assembly_name = reader.required_attribute("name")?;
    let qualifier = assembly_qualifier(&assembly_name).to_owned();
    debug!(
        "NUnit assembly found, assembly name: {assembly_name}, \
         extracted qualifier: {qualifier}"
    );
    state.qualifier = Some(qualifier);
    Ok(())
}

fn handle_test_case_tag(
    state: &mut NUnitState,
    attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    let name = match reader.optional_attribute("fullname")? {
        Some(full_name) => full_name,
        None => reader.required_attribute("name")?,
    };
    let result = reader.required_attribute("result")?;
    let label = reader.optional_attribute("label")?;
    let executed = reader.bool_attribute("executed")?;
    let duration_ms = match seconds_attribute_as_millis(reader, "duration")? {
        Some(duration_ms) => Some(duration_ms),
        None => seconds_attribute_as_millis(reader, "time")?,
    };

    let outcome = if executed == Some(false) {
        TestOutcome::Skipped
    } else {
        match (result.as_str(), label.as_deref()) {
            ("Failed" | "Failure", Some("Error" | "Invalid")) => TestOutcome::Error,
            ("Failed" | "Failure", _) => TestOutcome::Failed,
            ("Passed" | "Success", _) => TestOutcome::Passed,
            ("Error" | "NotRunnable" | "Cancelled", _) => TestOutcome::Error,
            ("Skipped" | "Ignored" | "Inconclusive" | "Warning", _) => TestOutcome::Skipped,
            _ => {
                return Err(reader.malformed(
                    "result",
                    &result,
                    "not a recognized NUnit test result",
                ));
            }
        }
    };

    let record = TestResultRecord::new(outcome, duration_ms);
    let full_name = qualified_name(state.qualifier.as_deref(), &name);
    attribution.add_test_result_to_file(&full_name, &record);
    Ok(())
}
