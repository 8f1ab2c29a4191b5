// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical key/value resource database.
//!
//! Settings are stored as resource entries in the classic
//! `program.resource: value` shape. An entry names its resource and may pin a
//! program (by name or class) and a resource class; an entry without a
//! program is a wildcard that applies to every program.
//!
//! [`ResourceDb::lookup`] resolves a query in three tiers:
//!
//! 1. program (name or class) + resource + resource class,
//! 2. program (name or class) + resource, any class,
//! 3. resource only (wildcard program).
//!
//! Within a tier the program name beats the program class. Inserting an
//! entry with an existing key replaces its value, which is how command-line
//! flags override defaults.
//!
//! Typed accessors ([`boolean`](ResourceDb::boolean),
//! [`integer`](ResourceDb::integer), [`float`](ResourceDb::float)) parse the
//! string form and log a warning, returning a zero value, when it does not
//! parse.

use std::collections::HashMap;

use tracing::warn;

/// A malformed default resource line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceLineError {
    /// The line has no `:` separating key from value.
    #[error("resource line `{0}` has no `:` separator")]
    MissingSeparator(String),
    /// The key does not start with `*`, `.`, or a program name.
    #[error("resource line `{0}` has no `*` or `.` before the resource name")]
    MissingBinding(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Key {
    program: Option<String>,
    resource: String,
    class: Option<String>,
}

/// The resource database for one program.
#[derive(Clone, Debug)]
pub struct ResourceDb {
    progname: String,
    progclass: String,
    entries: HashMap<Key, String>,
}

impl ResourceDb {
    /// Creates an empty database for the given program name and class.
    #[must_use]
    pub fn new(progname: impl Into<String>, progclass: impl Into<String>) -> Self {
        Self {
            progname: progname.into(),
            progclass: progclass.into(),
            entries: HashMap::new(),
        }
    }

    /// The program name used by the convenience accessors.
    #[must_use]
    pub fn progname(&self) -> &str {
        &self.progname
    }

    /// The program class used by the convenience accessors.
    #[must_use]
    pub fn progclass(&self) -> &str {
        &self.progclass
    }

    /// Inserts or replaces one entry.
    ///
    /// `program == None` makes the entry apply to every program;
    /// `class == None` makes it apply to every resource class.
    pub fn insert(
        &mut self,
        program: Option<&str>,
        resource: &str,
        class: Option<&str>,
        value: impl Into<String>,
    ) {
        let key = Key {
            program: program.map(str::to_owned),
            resource: resource.to_owned(),
            class: class.map(str::to_owned),
        };
        self.entries.insert(key, value.into());
    }

    /// Sets a resource for this program, as a command-line flag does.
    pub fn set(&mut self, resource: &str, value: impl Into<String>) {
        let program = self.progname.clone();
        self.insert(Some(&program), resource, None, value);
    }

    /// Parses and inserts one resource line.
    ///
    /// Accepted forms are `*name: value` (wildcard), `.name: value` (this
    /// program) and `prog.name: value` (an explicit program name or class).
    pub fn insert_line(&mut self, line: &str) -> Result<(), ResourceLineError> {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ResourceLineError::MissingSeparator(line.to_owned()))?;
        let key = key.trim();
        let value = value.trim();

        if let Some(resource) = key.strip_prefix('*') {
            self.insert(None, resource, None, value);
        } else if let Some(resource) = key.strip_prefix('.') {
            self.set(resource, value);
        } else if let Some((program, resource)) = key.split_once(['.', '*']) {
            self.insert(Some(program), resource, None, value);
        } else {
            return Err(ResourceLineError::MissingBinding(line.to_owned()));
        }
        Ok(())
    }

    /// Inserts every line, logging and skipping malformed ones.
    pub fn load_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            if let Err(err) = self.insert_line(line) {
                warn!(progname = %self.progname, "{err}");
            }
        }
    }

    /// Resolves a resource by the three-tier priority described in the module
    /// documentation.
    #[must_use]
    pub fn lookup(
        &self,
        program_name: &str,
        resource_name: &str,
        program_class: &str,
        resource_class: &str,
    ) -> Option<&str> {
        let programs = [program_name, program_class];
        let pinned = programs.iter().flat_map(|program| {
            [
                (Some(*program), Some(resource_class)),
                (Some(*program), None),
            ]
        });
        // Exact class matches for both program spellings come before any
        // class-wildcard entry.
        let exact = pinned.clone().filter(|(_, class)| class.is_some());
        let any_class = pinned.filter(|(_, class)| class.is_none());

        exact
            .chain(any_class)
            .chain(core::iter::once((None, None)))
            .find_map(|(program, class)| self.get(program, resource_name, class))
    }

    fn get(&self, program: Option<&str>, resource: &str, class: Option<&str>) -> Option<&str> {
        let key = Key {
            program: program.map(str::to_owned),
            resource: resource.to_owned(),
            class: class.map(str::to_owned),
        };
        self.entries.get(&key).map(String::as_str)
    }

    /// Looks up a resource for this program, deriving its class from the
    /// name.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.lookup(&self.progname, name, &self.progclass, &resource_class(name))
    }

    /// Looks up a boolean resource; absent or malformed values are `false`.
    #[must_use]
    pub fn boolean(&self, name: &str) -> bool {
        let Some(value) = self.string(name) else {
            return false;
        };
        match value.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => true,
            "off" | "false" | "no" | "0" => false,
            _ => {
                warn!(progname = %self.progname, "{name} must be boolean, not `{value}`");
                false
            }
        }
    }

    /// Looks up an integer resource; absent or malformed values are `0`.
    #[must_use]
    pub fn integer(&self, name: &str) -> i64 {
        let Some(value) = self.string(name) else {
            return 0;
        };
        value.parse().unwrap_or_else(|_| {
            warn!(progname = %self.progname, "{name} must be an integer, not `{value}`");
            0
        })
    }

    /// Looks up a floating-point resource; absent or malformed values are
    /// `0.0`.
    #[must_use]
    pub fn float(&self, name: &str) -> f64 {
        let Some(value) = self.string(name) else {
            return 0.0;
        };
        value.parse().unwrap_or_else(|_| {
            warn!(progname = %self.progname, "{name} must be a float, not `{value}`");
            0.0
        })
    }
}

/// Derives a resource class from a resource name by capitalizing it, e.g.
/// `doFPS` → `DoFPS`.
#[must_use]
pub fn resource_class(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ResourceDb, ResourceLineError, resource_class};

    #[test]
    fn exact_match_beats_wildcard() {
        let mut db = ResourceDb::new("A", "A");
        db.insert(Some("A"), "X", Some("C"), "1");
        db.insert(None, "X", None, "2");

        assert_eq!(db.lookup("A", "X", "A", "C"), Some("1"));
        assert_eq!(db.lookup("B", "X", "B", "C"), Some("2"), "falls to wildcard");
    }

    #[test]
    fn program_without_class_beats_wildcard() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.insert(None, "delay", None, "20000");
        db.insert(Some("pulse"), "delay", None, "5000");
        assert_eq!(db.lookup("pulse", "delay", "Pulse", "Delay"), Some("5000"));
    }

    #[test]
    fn program_class_matches_too() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.insert(Some("Pulse"), "speed", None, "3");
        assert_eq!(db.string("speed"), Some("3"));
    }

    #[test]
    fn exact_class_on_program_class_beats_name_without_class() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.insert(Some("pulse"), "bars", None, "1");
        db.insert(Some("Pulse"), "bars", Some("Bars"), "2");
        assert_eq!(db.string("bars"), Some("2"), "tier 1 before tier 2");
    }

    #[test]
    fn later_insert_overrides_same_key() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.insert_line(".doFPS: false").unwrap();
        db.set("doFPS", "true");
        assert!(db.boolean("doFPS"), "command line overrides default");
    }

    #[test]
    fn parses_resource_lines() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.load_lines(["*delay: 20000", ".mono:  on ", "Pulse.speed: 1.5"]);

        assert_eq!(db.integer("delay"), 20_000);
        assert!(db.boolean("mono"), "value is trimmed");
        assert!((db.float("speed") - 1.5).abs() < f64::EPSILON, "class line");
    }

    #[test]
    fn rejects_malformed_lines() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        assert_eq!(
            db.insert_line("delay 20"),
            Err(ResourceLineError::MissingSeparator("delay 20".into()))
        );
        assert_eq!(
            db.insert_line("delay: 20"),
            Err(ResourceLineError::MissingBinding("delay: 20".into()))
        );
    }

    #[test]
    fn typed_accessors_fall_back_on_garbage() {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.set("mono", "maybe");
        db.set("count", "12abc");
        db.set("speed", "fast");

        assert!(!db.boolean("mono"), "bad boolean is false");
        assert_eq!(db.integer("count"), 0, "bad integer is zero");
        assert!(db.float("speed").abs() < f64::EPSILON, "bad float is zero");
    }

    #[test]
    fn absent_resources_are_zero_values() {
        let db = ResourceDb::new("pulse", "Pulse");
        assert_eq!(db.string("output"), None);
        assert!(!db.boolean("doFPS"));
        assert_eq!(db.integer("exitAfter"), 0);
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let mut db = ResourceDb::new("p", "P");
        for (value, expected) in [("Yes", true), ("1", true), ("OFF", false), ("no", false)] {
            db.set("flag", value);
            assert_eq!(db.boolean("flag"), expected, "spelling `{value}`");
        }
    }

    #[test]
    fn class_is_capitalized_name() {
        assert_eq!(resource_class("doFPS"), "DoFPS");
        assert_eq!(resource_class(""), "");
    }
}
