// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display output identification and selection.
//!
//! [`OutputGlobal`] is the numeric name the compositor's registry assigned to
//! an output. It is stable for the lifetime of the output and is how removal
//! events refer back to it. [`OutputFilter`] decides which outputs get a
//! session when the user asked for a specific monitor.

use core::fmt;

/// The compositor-assigned numeric name of an output global.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputGlobal(pub u32);

impl fmt::Debug for OutputGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputGlobal({})", self.0)
    }
}

/// Optional output-name selector.
///
/// An empty name is the same as no filter at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputFilter {
    name: Option<String>,
}

impl OutputFilter {
    /// Creates a filter that accepts every output.
    #[must_use]
    pub const fn any() -> Self {
        Self { name: None }
    }

    /// Creates a filter for exactly one output name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
        }
    }

    /// Returns the requested output name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns whether a name must be matched before activation.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.name.is_some()
    }

    /// Returns whether an output called `name` passes this filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name.as_deref().is_none_or(|wanted| wanted == name)
    }
}

#[cfg(test)]
mod tests {
    use super::OutputFilter;

    #[test]
    fn empty_name_means_no_filter() {
        let filter = OutputFilter::named("");
        assert!(!filter.is_set(), "empty string must not filter");
        assert!(filter.matches("DP-1"), "unfiltered accepts everything");
    }

    #[test]
    fn named_filter_is_exact() {
        let filter = OutputFilter::named("Monitor-2");
        assert!(filter.matches("Monitor-2"));
        assert!(!filter.matches("Monitor-1"), "different output");
        assert!(!filter.matches("Monitor-22"), "no prefix matching");
        assert_eq!(filter.name(), Some("Monitor-2"));
    }
}
