// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-format report parsers.

mod nunit;
mod vstest;
mod xunit;

use crate::{
    errors::{AttributeError, ReportParseError},
    reader::AttributeReader,
    results::{MethodFileMap, ResultsByKey},
};
use camino::Utf8Path;
use std::fmt;

/// A supported test report format.
///
/// The dialect of a report is chosen by whoever configured the report path;
/// it is never sniffed from the file contents.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Dialect {
    /// xUnit.net v2 XML.
    XUnit,

    /// NUnit 2 and NUnit 3 XML.
    NUnit,

    /// Visual Studio test results (`.trx`).
    VsTest,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 3] = [Dialect::XUnit, Dialect::NUnit, Dialect::VsTest];

    /// Parses the report at `path`, merging its results into `results`.
    pub fn parse(
        self,
        path: &Utf8Path,
        results: &mut ResultsByKey,
        method_file_map: &MethodFileMap,
    ) -> Result<(), ReportParseError> {
        let reader = AttributeReader::open(path)?;
        self.parse_reader(reader, results, method_file_map)
    }

    /// Parses an already-opened report.
    pub fn parse_reader(
        self,
        reader: AttributeReader,
        results: &mut ResultsByKey,
        method_file_map: &MethodFileMap,
    ) -> Result<(), ReportParseError> {
        match self {
            Self::XUnit => xunit::parse(reader, results, method_file_map),
            Self::NUnit => nunit::parse(reader, results, method_file_map),
            Self::VsTest => vstest::parse(reader, results, method_file_map),
        }
    }

    /// The human-readable name of the format.
    pub fn name(self) -> &'static str {
        match self {
            Self::XUnit => "XUnit",
            Self::NUnit => "NUnit",
            Self::VsTest => "VSTest",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returns the short module qualifier for an assembly path: the last path
/// component without its extension.
///
/// Both `/` and `\` are treated as separators since reports are often produced
/// on another platform.
pub(crate) fn assembly_qualifier(assembly_path: &str) -> &str {
    let file_name = assembly_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(assembly_path);
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// Builds the name used to look a test up in the method-file map.
///
/// Parameterized test names have their argument list removed.
pub(crate) fn qualified_name(qualifier: Option<&str>, test_name: &str) -> String {
    let test_name = match test_name.find('(') {
        Some(idx) => test_name[..idx].trim_end(),
        None => test_name,
    };
    match qualifier {
        Some(qualifier) if !qualifier.is_empty() => format!("{qualifier}.{test_name}"),
        _ => test_name.to_owned(),
    }
}

/// Reads a duration given in (possibly fractional) seconds, truncated to whole
/// milliseconds.
pub(crate) fn seconds_attribute_as_millis(
    reader: &AttributeReader,
    name: &'static str,
) -> Result<Option<u64>, AttributeError> {
    let Some(seconds) = reader.double_attribute(name)? else {
        return Ok(None);
    };
    if seconds < 0.0 {
        return Err(reader.malformed(name, &seconds.to_string(), "duration is negative"));
    }
    Ok(Some((seconds * 1000.0).trunc() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("CSharp/Foo.dll", "Foo" ; "unix path")]
    #[test_case(r"C:\build\bin\My.Tests.dll", "My.Tests" ; "windows path")]
    #[test_case("Tests/My.Tests.dll", "My.Tests" ; "dotted name")]
    #[test_case("NoExtension", "NoExtension" ; "no extension")]
    #[test_case(".hidden", ".hidden" ; "leading dot")]
    fn assembly_qualifier_cases(input: &str, expected: &str) {
        assert_eq!(assembly_qualifier(input), expected);
    }

    #[test_case(Some("Foo"), "Ns.Class.Method", "Foo.Ns.Class.Method" ; "qualified")]
    #[test_case(Some("Foo"), "Ns.Class.Theory(x: 1, y: \"a\")", "Foo.Ns.Class.Theory" ; "parameters stripped")]
    #[test_case(None, "Ns.Class.Method", "Ns.Class.Method" ; "no qualifier")]
    #[test_case(Some(""), "Ns.Class.Method", "Ns.Class.Method" ; "empty qualifier")]
    fn qualified_name_cases(qualifier: Option<&str>, name: &str, expected: &str) {
        assert_eq!(qualified_name(qualifier, name), expected);
    }

    #[test_case(r#"<test time="1.234" />"#, Some(1234) ; "milliseconds")]
    #[test_case(r#"<test time="0.0019" />"#, Some(1) ; "truncated")]
    #[test_case(r#"<test time="0" />"#, Some(0) ; "zero")]
    #[test_case(r#"<test />"#, None ; "absent")]
    fn seconds_to_millis(xml: &'static str, expected: Option<u64>) {
        let mut reader = AttributeReader::from_reader("test.xml", xml.as_bytes());
        assert!(reader.next_start_tag().expect("valid XML"));
        assert_eq!(seconds_attribute_as_millis(&reader, "time"), Ok(expected));
    }

    #[test]
    fn negative_duration_is_malformed() {
        let mut reader =
            AttributeReader::from_reader("test.xml", r#"<test time="-1" />"#.as_bytes());
        assert!(reader.next_start_tag().expect("valid XML"));
        assert!(seconds_attribute_as_millis(&reader, "time").is_err());
    }
}
