// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexSet;

/// Collects human-readable warnings to show at the end of an analysis.
pub trait AnalysisWarnings {
    /// Adds `text`, unless an identical warning was already added.
    fn add_unique(&mut self, text: &str);
}

impl<T: AnalysisWarnings + ?Sized> AnalysisWarnings for &mut T {
    fn add_unique(&mut self, text: &str) {
        (**self).add_unique(text)
    }
}

/// An [`AnalysisWarnings`] that de-duplicates warnings and keeps them in the
/// order they were first added.
#[derive(Clone, Debug, Default)]
pub struct UniqueWarnings {
    warnings: IndexSet<String>,
}

impl UniqueWarnings {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the collected warnings.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.warnings.iter().map(String::as_str)
    }

    /// The number of distinct warnings.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Returns true if no warning was added.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl AnalysisWarnings for UniqueWarnings {
    fn add_unique(&mut self, text: &str) {
        if !self.warnings.contains(text) {
            self.warnings.insert(text.to_owned());
        }
    }
}
