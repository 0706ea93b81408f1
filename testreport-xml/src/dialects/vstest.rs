// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Visual Studio test results (`.trx`).
//!
//! A TRX file lists results (`<UnitTestResult testId=...>`) before the test
//! definitions they refer to (`<UnitTest id=...><TestMethod .../></UnitTest>`),
//! so results are buffered and charged to files once the whole document has
//! been read.

use super::{assembly_qualifier, qualified_name};
use crate::{
    errors::{AttributeError, ReportParseError, ReportParseErrorKind},
    parser::{Attribution, ReportParser, TagHandler},
    reader::AttributeReader,
    results::{MethodFileMap, ResultsByKey, TestOutcome, TestResultRecord},
};
use std::collections::HashMap;
use tracing::{debug, info};

static ROOT_TAGS: &[&str] = &["TestRun"];

const TAG_HANDLERS: &[(&str, TagHandler<VsTestState>)] = &[
    ("UnitTestResult", handle_unit_test_result_tag),
    ("UnitTest", handle_unit_test_tag),
    ("TestMethod", handle_test_method_tag),
];

#[derive(Debug, Default)]
struct VsTestState {
    pending: Vec<(String, TestResultRecord)>,
    // Test id -> qualified method name.
    definitions: HashMap<String, String>,
    // Id of the enclosing <UnitTest>, consumed by its <TestMethod>.
    current_test_id: Option<String>,
}

pub(super) fn parse(
    reader: AttributeReader,
    results: &mut ResultsByKey,
    method_file_map: &MethodFileMap,
) -> Result<(), ReportParseError> {
    info!("Parsing the VSTest test results file '{}'", reader.path());
    let path = reader.path().to_owned();
    let mut state = VsTestState::default();
    let mut parser = ReportParser::new(results, method_file_map, ROOT_TAGS);
    parser.parse(reader, &mut state, TAG_HANDLERS)?;

    // Resolve everything before touching the results, so a dangling id leaves
    // them unchanged.
    let resolved = state
        .pending
        .iter()
        .map(|(test_id, record)| match state.definitions.get(test_id) {
            Some(name) => Ok((name.as_str(), record)),
            None => Err(ReportParseError::new(
                &path,
                ReportParseErrorKind::UnknownTestId {
                    test_id: test_id.clone(),
                },
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let attribution = parser.attribution();
    for (name, record) in resolved {
        attribution.add_test_result_to_file(name, record);
    }
    Ok(())
}

fn handle_unit_test_result_tag(
    state: &mut VsTestState,
    _attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    let test_id = reader.required_attribute("testId")?;
    let outcome = reader.required_attribute("outcome")?;
    let outcome = match outcome.as_str() {
        "Passed" => TestOutcome::Passed,
        "Failed" => TestOutcome::Failed,
        "Error" | "Timeout" | "Aborted" => TestOutcome::Error,
        "NotExecuted" | "Inconclusive" | "Pending" | "NotRunnable" | "Warning" => {
            TestOutcome::Skipped
        }
        _ => {
            return Err(reader.malformed(
                "outcome",
                &outcome,
                "not a recognized VSTest outcome",
            ));
        }
    };
    let duration_ms = match reader.optional_attribute("duration")? {
        Some(duration) => match parse_duration_ms(&duration) {
            Some(duration_ms) => Some(duration_ms),
            None => {
                return Err(reader.malformed("duration", &duration, "expected hh:mm:ss.fffffff"));
            }
        },
        None => None,
    };

    state
        .pending
        .push((test_id, TestResultRecord::new(outcome, duration_ms)));
    Ok(())
}

fn handle_unit_test_tag(
    state: &mut VsTestState,
    _attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    state.current_test_id = Some(reader.required_attribute("id")?);
    Ok(())
}

fn handle_test_method_tag(
    state: &mut VsTestState,
    _attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    let Some(test_id) = state.current_test_id.take() else {
        return Ok(());
    };
    let class_name = reader.required_attribute("className")?;
    let method_name = reader.required_attribute("name")?;

    // Older TRX files use an assembly-qualified type name:
    // "Ns.Class, My.Tests, Version=1.0.0.0, ...".
    let mut class_parts = class_name.split(',').map(str::trim);
    let type_name = class_parts.next().unwrap_or_default();
    let qualifier = match reader.optional_attribute("codeBase")? {
        Some(code_base) => Some(assembly_qualifier(&code_base).to_owned()),
        None => class_parts.next().map(str::to_owned),
    };

    let full_name = qualified_name(
        qualifier.as_deref(),
        &format!("{type_name}.{method_name}"),
    );
    debug!("VSTest test definition found, id: {test_id}, qualified name: {full_name}");
    state.definitions.insert(test_id, full_name);
    Ok(())
}

/// Parses a TRX duration (`hh:mm:ss` with an optional fraction of a second)
/// into whole milliseconds, truncating.
fn parse_duration_ms(input: &str) -> Option<u64> {
    let mut parts = input.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: u64 = whole.parse().ok()?;
    if whole >= 60 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |acc, digit| acc * 10 + u64::from(digit - b'0'));

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + whole)?
        .checked_mul(1000)?
        .checked_add(millis)
}
