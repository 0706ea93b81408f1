// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Streaming parsers for machine-generated test result reports.
//!
//! Each supported report format is a [`Dialect`]. Dialects only describe the
//! tags they care about; XML traversal, attribute coercion and error reporting
//! are shared through [`ReportParser`] and [`AttributeReader`].
//!
//! Parsed results are attributed to source files through a [`MethodFileMap`]
//! and accumulated into [`UnitTestResults`] keyed by [`ResultKey`].

mod dialects;
pub mod errors;
mod parser;
mod reader;
mod results;

pub use dialects::*;
pub use parser::*;
pub use reader::*;
pub use results::*;
