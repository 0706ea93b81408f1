// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! xUnit.net v2 reports.
//!
//! ```xml
//! <assemblies>
//!   <assembly name="C:\src\bin\My.Tests.dll">
//!     <collection>
//!       <test name="Ns.Class.Method" result="Pass" time="0.0123" />
//!     </collection>
//!   </assembly>
//! </assemblies>
//! ```

use super::{assembly_qualifier, qualified_name, seconds_attribute_as_millis};
use crate::{
    errors::{AttributeError, ReportParseError},
    parser::{Attribution, ReportParser, TagHandler},
    reader::AttributeReader,
    results::{MethodFileMap, ResultsByKey, TestOutcome, TestResultRecord},
};
use tracing::{debug, info};

static ROOT_TAGS: &[&str] = &["assembly", "assemblies"];

const TAG_HANDLERS: &[(&str, TagHandler<XUnitState>)] =
    &[("assembly", handle_assembly_tag), ("test", handle_test_tag)];

#[derive(Debug, Default)]
struct XUnitState {
    // Qualifier of the assembly currently being read.
    qualifier: Option<String>,
}

pub(super) fn parse(
    reader: AttributeReader,
    results: &mut ResultsByKey,
    method_file_map: &MethodFileMap,
) -> Result<(), ReportParseError> {
    info!("Parsing the XUnit test results file '{}'", reader.path());
    ReportParser::new(results, method_file_map, ROOT_TAGS).parse(
        reader,
        &mut XUnitState::default(),
        TAG_HANDLERS,
    )
}

fn handle_assembly_tag(
    state: &mut XUnitState,
    _attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    let assembly_name = reader.required_attribute("name")?;
    let qualifier = assembly_qualifier(&assembly_name).to_owned();
    debug!(
        "XUnit assembly found, assembly name: {assembly_name}, \
         extracted qualifier: {qualifier}"
    );
    state.qualifier = Some(qualifier);
    Ok(())
}

fn handle_test_tag(
    state: &mut XUnitState,
    attribution: &mut Attribution<'_>,
    reader: &AttributeReader,
) -> Result<(), AttributeError> {
    let result = reader.required_attribute("result")?;
    let duration_ms = seconds_attribute_as_millis(reader, "time")?;
    let name = reader.required_attribute("name")?;
    let outcome = match result.as_str() {
        "Pass" => TestOutcome::Passed,
        "Fail" => TestOutcome::Failed,
        "Skip" | "NotRun" => TestOutcome::Skipped,
        _ => {
            return Err(reader.malformed(
                "result",
                &result,
                "expected one of: Pass, Fail, Skip, NotRun",
            ));
        }
    };

    let record = TestResultRecord::new(outcome, duration_ms);
    let full_name = qualified_name(state.qualifier.as_deref(), &name);
    attribution.add_test_result_to_file(&full_name, &record);
    Ok(())
}
