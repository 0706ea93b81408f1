// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Command-line driver for importing unit test reports.
//!
//! For the library that does the work, see [`testreport_import`].

mod dispatch;
mod errors;
mod output;
mod report;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{LOG_ENV, OutputContext, OutputFormat, Styles};
