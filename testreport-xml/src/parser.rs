// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{AttributeError, ReportParseError, ReportParseErrorKind},
    reader::AttributeReader,
    results::{MethodFileMap, ResultKey, ResultsByKey, TestResultRecord},
};
use tracing::debug;

/// A function invoked for every occurrence of a tag it is registered for.
///
/// `S` is the dialect's own per-file state, threaded through every call.
pub type TagHandler<S> =
    fn(&mut S, &mut Attribution<'_>, &AttributeReader) -> Result<(), AttributeError>;

/// Charges test results to source files.
#[derive(Debug)]
pub struct Attribution<'a> {
    results: &'a mut ResultsByKey,
    method_file_map: &'a MethodFileMap,
}

impl<'a> Attribution<'a> {
    /// Creates a new `Attribution` writing into `results`.
    pub fn new(results: &'a mut ResultsByKey, method_file_map: &'a MethodFileMap) -> Self {
        Self {
            results,
            method_file_map,
        }
    }

    /// Merges `record` into the accumulator of the file that defines
    /// `qualified_name`.
    ///
    /// Names missing from the method-file map are charged to
    /// [`ResultKey::Unattributed`].
    pub fn add_test_result_to_file(&mut self, qualified_name: &str, record: &TestResultRecord) {
        let key = match self.method_file_map.get(qualified_name) {
            Some(file) => ResultKey::File(file.to_owned()),
            None => {
                debug!(
                    "test method {qualified_name} cannot be mapped to a source file, \
                     counting it towards the project only"
                );
                ResultKey::Unattributed
            }
        };
        self.results.add_record(key, record);
    }
}

/// Drives an [`AttributeReader`] through a report, dispatching tags to handlers.
#[derive(Debug)]
pub struct ReportParser<'a> {
    attribution: Attribution<'a>,
    root_tags: &'static [&'static str],
}

impl<'a> ReportParser<'a> {
    /// Creates a new parser.
    ///
    /// `root_tags` lists the tags allowed at the top level of the document.
    pub fn new(
        results: &'a mut ResultsByKey,
        method_file_map: &'a MethodFileMap,
        root_tags: &'static [&'static str],
    ) -> Self {
        Self {
            attribution: Attribution::new(results, method_file_map),
            root_tags,
        }
    }

    /// Streams the whole document, calling the matching handler for every start
    /// tag. Tags without a handler are skipped.
    ///
    /// The first error aborts the parse.
    pub fn parse<S>(
        &mut self,
        mut reader: AttributeReader,
        state: &mut S,
        handlers: &[(&str, TagHandler<S>)],
    ) -> Result<(), ReportParseError> {
        let mut saw_root = false;
        while reader.next_start_tag()? {
            let tag = reader.tag_name();
            if reader.depth() == 0 {
                if !self.root_tags.iter().any(|root| *root == tag) {
                    return Err(reader.error(ReportParseErrorKind::UnexpectedRootTag {
                        found: tag.to_owned(),
                        expected: self.root_tags,
                    }));
                }
                saw_root = true;
            }

            if let Some((_, handler)) = handlers.iter().find(|(name, _)| *name == tag) {
                handler(state, &mut self.attribution, &reader).map_err(|err| {
                    reader.error(ReportParseErrorKind::Attribute {
                        position: reader.position(),
                        err,
                    })
                })?;
            }
        }

        if !saw_root {
            return Err(reader.error(ReportParseErrorKind::MissingRootTag {
                expected: self.root_tags,
            }));
        }
        Ok(())
    }

    /// Returns the attribution helper, for dialects that charge results after
    /// the document has been read.
    pub fn attribution(&mut self) -> &mut Attribution<'a> {
        &mut self.attribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{TestOutcome, UnitTestResults};
    use camino::Utf8Path;
    use indoc::indoc;
    use maplit::hashmap;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Seen {
        tags: Vec<String>,
    }

    fn record_tag(
        state: &mut Seen,
        attribution: &mut Attribution<'_>,
        reader: &AttributeReader,
    ) -> Result<(), AttributeError> {
        let name = reader.required_attribute("name")?;
        state.tags.push(format!("{}:{name}", reader.tag_name()));
        attribution
            .add_test_result_to_file(&name, &TestResultRecord::new(TestOutcome::Passed, None));
        Ok(())
    }

    const HANDLERS: &[(&str, TagHandler<Seen>)] = &[("suite", record_tag), ("case", record_tag)];

    fn parse(
        xml: &'static str,
        map: &MethodFileMap,
    ) -> (Result<(), ReportParseError>, Seen, ResultsByKey) {
        let mut results = ResultsByKey::new();
        let mut seen = Seen::default();
        let res = ReportParser::new(&mut results, map, &["root"]).parse(
            AttributeReader::from_reader("report.xml", xml.as_bytes()),
            &mut seen,
            HANDLERS,
        );
        (res, seen, results)
    }

    #[test]
    fn dispatches_known_tags_and_skips_others() {
        let map: MethodFileMap = hashmap! { "a" => "A.cs" }.into_iter().collect();
        let (res, seen, results) = parse(
            indoc! {r#"
                <root>
                  <suite name="a">
                    <unknown name="ignored" />
                    <case name="b" />
                  </suite>
                </root>
            "#},
            &map,
        );
        res.expect("parse succeeds");
        assert_eq!(seen.tags, ["suite:a", "case:b"]);
        assert_eq!(
            results.file(Utf8Path::new("A.cs")),
            Some(&UnitTestResults::from_counts(1, 0, 0, 0, None))
        );
        assert_eq!(
            results.unattributed(),
            Some(&UnitTestResults::from_counts(1, 0, 0, 0, None))
        );
    }

    #[test]
    fn rejects_unexpected_root() {
        let (res, seen, _) = parse(r#"<other><case name="a" /></other>"#, &MethodFileMap::new());
        let err = res.expect_err("unexpected root is rejected");
        assert!(
            matches!(
                err.kind(),
                ReportParseErrorKind::UnexpectedRootTag { found, .. } if found == "other"
            ),
            "unexpected error: {err:?}"
        );
        assert!(seen.tags.is_empty());
    }

    #[test]
    fn rejects_empty_document() {
        let (res, _, _) = parse(r#"<?xml version="1.0"?>"#, &MethodFileMap::new());
        let err = res.expect_err("empty document is rejected");
        assert!(matches!(
            err.kind(),
            ReportParseErrorKind::MissingRootTag { .. }
        ));
    }

    #[test]
    fn handler_error_stops_parsing() {
        let (res, seen, results) = parse(
            indoc! {r#"
                <root>
                  <case name="first" />
                  <case />
                  <case name="never" />
                </root>
            "#},
            &MethodFileMap::new(),
        );
        let err = res.expect_err("missing attribute fails the parse");
        assert_eq!(err.path().as_str(), "report.xml");
        match err.kind() {
            ReportParseErrorKind::Attribute { err, .. } => {
                assert_eq!(
                    err,
                    &AttributeError::Missing {
                        tag: "case".to_owned(),
                        attribute: "name",
                    }
                );
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
        assert_eq!(seen.tags, ["case:first"]);
        assert_eq!(results.total().tests(), 1);
    }
}
