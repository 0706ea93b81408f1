// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AttributeError, ReportParseError, ReportParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
};

/// A streaming cursor over one XML report, with typed access to the attributes
/// of the tag it is positioned at.
///
/// The underlying file is closed when the reader is dropped.
pub struct AttributeReader {
    path: Utf8PathBuf,
    reader: Reader<Box<dyn BufRead>>,
    buf: Vec<u8>,
    current: Option<CurrentTag>,
    // Number of elements opened but not yet closed.
    open_tags: usize,
}

struct CurrentTag {
    start: BytesStart<'static>,
    name: String,
    position: u64,
    depth: usize,
}

impl AttributeReader {
    /// Opens the report at `path`.
    pub fn open(path: &Utf8Path) -> Result<Self, ReportParseError> {
        let file = File::open(path)
            .map_err(|err| ReportParseError::new(path, ReportParseErrorKind::Open(err)))?;
        Ok(Self::from_reader(path, BufReader::new(file)))
    }

    /// Creates a reader over arbitrary input. `path` is only used in error
    /// messages.
    pub fn from_reader(path: impl Into<Utf8PathBuf>, input: impl BufRead + 'static) -> Self {
        let input: Box<dyn BufRead> = Box::new(input);
        Self {
            path: path.into(),
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            current: None,
            open_tags: 0,
        }
    }

    /// Returns the path this reader was created for.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Advances to the next start or empty-element tag.
    ///
    /// Returns `false` once the end of the document is reached.
    pub fn next_start_tag(&mut self) -> Result<bool, ReportParseError> {
        loop {
            let position = self.reader.buffer_position() as u64;
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    return Err(ReportParseError::new(
                        &self.path,
                        ReportParseErrorKind::Xml {
                            position: self.reader.error_position() as u64,
                            err,
                        },
                    ));
                }
            };

            match event {
                Event::Start(start) => {
                    let start = start.into_owned();
                    self.set_current(start, position);
                    self.open_tags += 1;
                    return Ok(true);
                }
                Event::Empty(start) => {
                    let start = start.into_owned();
                    self.set_current(start, position);
                    return Ok(true);
                }
                Event::End(_) => {
                    // quick-xml rejects mismatched end tags on its own.
                    self.open_tags = self.open_tags.saturating_sub(1);
                }
                Event::Eof => {
                    self.current = None;
                    if self.open_tags > 0 {
                        return Err(self.error(ReportParseErrorKind::UnexpectedEof {
                            open_tags: self.open_tags,
                        }));
                    }
                    return Ok(false);
                }
                _ => {}
            }
        }
    }

    fn set_current(&mut self, start: BytesStart<'static>, position: u64) {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        self.current = Some(CurrentTag {
            start,
            name,
            position,
            depth: self.open_tags,
        });
    }

    /// Returns the name of the current tag, or an empty string before the first
    /// call to [`Self::next_start_tag`].
    pub fn tag_name(&self) -> &str {
        self.current.as_ref().map_or("", |tag| tag.name.as_str())
    }

    /// Returns the nesting depth of the current tag. Top-level tags have depth 0.
    pub fn depth(&self) -> usize {
        self.current.as_ref().map_or(0, |tag| tag.depth)
    }

    /// Returns the byte offset of the current tag.
    pub fn position(&self) -> u64 {
        self.current.as_ref().map_or(0, |tag| tag.position)
    }

    /// Reads an attribute that must be present.
    pub fn required_attribute(&self, name: &'static str) -> Result<String, AttributeError> {
        self.optional_attribute(name)?
            .ok_or_else(|| AttributeError::Missing {
                tag: self.tag_name().to_owned(),
                attribute: name,
            })
    }

    /// Reads an attribute that may be absent.
    pub fn optional_attribute(&self, name: &'static str) -> Result<Option<String>, AttributeError> {
        let Some(current) = &self.current else {
            return Ok(None);
        };
        let attribute = current
            .start
            .try_get_attribute(name)
            .map_err(|err| self.malformed(name, "", err))?;
        let Some(attribute) = attribute else {
            return Ok(None);
        };
        match attribute.unescape_value() {
            Ok(value) => Ok(Some(value.into_owned())),
            Err(err) => Err(self.malformed(name, &String::from_utf8_lossy(&attribute.value), err)),
        }
    }

    /// Reads a floating-point attribute.
    ///
    /// Both `.` and `,` are accepted as the decimal separator, since some
    /// tools format numbers with the current locale.
    pub fn double_attribute(&self, name: &'static str) -> Result<Option<f64>, AttributeError> {
        let Some(value) = self.optional_attribute(name)? else {
            return Ok(None);
        };
        match value.trim().replace(',', ".").parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
            Ok(_) => Err(self.malformed(name, &value, "not a finite number")),
            Err(err) => Err(self.malformed(name, &value, err)),
        }
    }

    /// Reads a boolean attribute, accepting `true` and `false` in any case.
    pub fn bool_attribute(&self, name: &'static str) -> Result<Option<bool>, AttributeError> {
        let Some(value) = self.optional_attribute(name)? else {
            return Ok(None);
        };
        if value.trim().eq_ignore_ascii_case("true") {
            Ok(Some(true))
        } else if value.trim().eq_ignore_ascii_case("false") {
            Ok(Some(false))
        } else {
            Err(self.malformed(name, &value, "expected `true` or `false`"))
        }
    }

    /// Builds an [`AttributeError::Malformed`] for the current tag.
    pub fn malformed(
        &self,
        attribute: &'static str,
        value: &str,
        reason: impl fmt::Display,
    ) -> AttributeError {
        AttributeError::Malformed {
            tag: self.tag_name().to_owned(),
            attribute,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn error(&self, kind: ReportParseErrorKind) -> ReportParseError {
        ReportParseError::new(&self.path, kind)
    }
}

impl fmt::Debug for AttributeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeReader")
            .field("path", &self.path)
            .field("tag_name", &self.tag_name())
            .field("position", &self.position())
            .field("open_tags", &self.open_tags)
            .finish()
    }
}
