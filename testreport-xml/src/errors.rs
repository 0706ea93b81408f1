// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while reading test result reports.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// An error that occurred while reading an attribute off the current tag.
///
/// Handlers return this; [`ReportParser`](crate::ReportParser) wraps it into a
/// [`ReportParseError`] carrying the file path and position.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AttributeError {
    /// A required attribute was absent.
    #[error("missing required attribute `{attribute}` on <{tag}>")]
    Missing {
        /// The tag being read.
        tag: String,

        /// The attribute that was expected.
        attribute: &'static str,
    },

    /// An attribute was present but could not be coerced to the expected type.
    #[error("attribute `{attribute}` on <{tag}> has invalid value \"{value}\": {reason}")]
    Malformed {
        /// The tag being read.
        tag: String,

        /// The attribute that was read.
        attribute: &'static str,

        /// The raw value of the attribute.
        value: String,

        /// Why the value was rejected.
        reason: String,
    },
}

impl AttributeError {
    /// Returns the name of the attribute this error is about.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Missing { attribute, .. } | Self::Malformed { attribute, .. } => attribute,
        }
    }

    /// Returns the name of the tag this error is about.
    pub fn tag(&self) -> &str {
        match self {
            Self::Missing { tag, .. } | Self::Malformed { tag, .. } => tag,
        }
    }
}

/// An error that occurred while parsing a single report file.
///
/// Parsing stops at the first such error: no results from the failing element
/// are recorded.
#[derive(Debug, Error)]
#[error("failed to parse test report `{path}`")]
pub struct ReportParseError {
    path: Utf8PathBuf,
    #[source]
    kind: ReportParseErrorKind,
}

impl ReportParseError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, kind: ReportParseErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns the path to the report that failed to parse.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ReportParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportParseErrorKind {
    /// The report could not be opened.
    #[error("error opening report")]
    Open(#[source] std::io::Error),

    /// The document is not well-formed XML.
    #[error("invalid XML at byte {position}")]
    Xml {
        /// The byte offset at which the error was detected.
        position: u64,

        /// The underlying error.
        #[source]
        err: quick_xml::Error,
    },

    /// A tag handler rejected one of the tag's attributes.
    #[error("invalid tag at byte {position}")]
    Attribute {
        /// The byte offset of the tag.
        position: u64,

        /// The underlying error.
        #[source]
        err: AttributeError,
    },

    /// The document has no elements at all.
    #[error("no root tag found (expected one of: {})", .expected.join(", "))]
    MissingRootTag {
        /// The root tags accepted by the dialect.
        expected: &'static [&'static str],
    },

    /// A top-level element is not one the dialect accepts.
    #[error("unexpected root tag <{found}> (expected one of: {})", .expected.join(", "))]
    UnexpectedRootTag {
        /// The tag that was found.
        found: String,

        /// The root tags accepted by the dialect.
        expected: &'static [&'static str],
    },

    /// The document ended while elements were still open.
    #[error("unexpected end of document with {open_tags} unclosed tag(s)")]
    UnexpectedEof {
        /// The number of tags left open.
        open_tags: usize,
    },

    /// A result refers to a test that the report never defines.
    #[error("test result refers to undefined test id `{test_id}`")]
    UnknownTestId {
        /// The dangling test id.
        test_id: String,
    },
}
