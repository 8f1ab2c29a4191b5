// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line flag table and the settings derived from it.
//!
//! Every flag maps onto one resource of the running program. A flag either
//! sets its resource to a fixed value or consumes the following argument as
//! the value. The built-in table in [`BUILTIN_OPTIONS`] is merged with the
//! hack's own flags; the hack's flags win when both define the same switch.

use std::ffi::OsStr;
use std::fmt::Write as _;

use crate::output::OutputFilter;
use crate::resources::ResourceDb;
use crate::time::Duration;

/// How a flag produces its resource value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionArg {
    /// The flag alone sets the resource to this value.
    Fixed(&'static str),
    /// The flag consumes the next argument as the value.
    Value(&'static str),
}

/// One command-line flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    /// The switch, including its leading `-`.
    pub flag: &'static str,
    /// The resource the switch sets.
    pub resource: &'static str,
    /// Whether the switch takes an argument.
    pub arg: OptionArg,
}

impl OptionSpec {
    /// A switch that sets `resource` to `value`.
    #[must_use]
    pub const fn fixed(flag: &'static str, resource: &'static str, value: &'static str) -> Self {
        Self {
            flag,
            resource,
            arg: OptionArg::Fixed(value),
        }
    }

    /// A switch that takes one argument, described by `placeholder` in usage
    /// output.
    #[must_use]
    pub const fn value(
        flag: &'static str,
        resource: &'static str,
        placeholder: &'static str,
    ) -> Self {
        Self {
            flag,
            resource,
            arg: OptionArg::Value(placeholder),
        }
    }
}

/// Flags every program understands.
pub const BUILTIN_OPTIONS: &[OptionSpec] = &[
    OptionSpec::value("-output", "output", "name"),
    OptionSpec::fixed("-mono", "mono", "true"),
    OptionSpec::fixed("-fps", "doFPS", "true"),
    OptionSpec::fixed("-no-fps", "doFPS", "false"),
    OptionSpec::fixed("-one-surface", "oneSurface", "true"),
    OptionSpec::fixed("-every-output", "oneSurface", "false"),
    OptionSpec::value("-record-animation", "recordAnim", "frames"),
    OptionSpec::value("-exit-after", "exitAfter", "seconds"),
];

/// Defaults for the built-in resources, applied after the hack's defaults.
pub const BUILTIN_DEFAULTS: &[&str] = &[
    "*output:",
    "*mono: false",
    "*doFPS: false",
    "*oneSurface: false",
    "*recordAnim: 0",
    "*exitAfter: 0",
];

/// A command line that cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// The switch is not in the merged table.
    #[error("unrecognized option `{0}`")]
    Unrecognized(String),
    /// The switch needs an argument but was last on the line.
    #[error("option `{0}` requires an argument")]
    MissingArgument(String),
    /// An argument is not valid UTF-8; holds its lossy rendering.
    #[error("argument `{0}` is not valid UTF-8")]
    NotUnicode(String),
}

/// What the caller should do after parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Run the program with the populated database.
    Run,
    /// Print usage and exit successfully.
    Help,
}

/// Merges the hack's flags over the built-in ones.
#[must_use]
pub fn merged_options(hack_options: &[OptionSpec]) -> Vec<OptionSpec> {
    let mut merged: Vec<OptionSpec> = hack_options.to_vec();
    for builtin in BUILTIN_OPTIONS {
        if !merged.iter().any(|spec| spec.flag == builtin.flag) {
            merged.push(*builtin);
        }
    }
    merged
}

/// Applies command-line arguments (without the program name) to `db`.
///
/// `--flag` is accepted as a spelling of `-flag`. `-help` and `--help` stop
/// parsing and return [`ParseOutcome::Help`].
pub fn parse_args<I, S>(
    args: I,
    options: &[OptionSpec],
    db: &mut ResourceDb,
) -> Result<ParseOutcome, UsageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = unicode(arg.as_ref())?;
        let flag = if arg.starts_with("--") { &arg[1..] } else { arg };
        if flag == "-help" || flag == "-h" {
            return Ok(ParseOutcome::Help);
        }
        let spec = options
            .iter()
            .find(|spec| spec.flag == flag)
            .ok_or_else(|| UsageError::Unrecognized(arg.to_owned()))?;
        match spec.arg {
            OptionArg::Fixed(value) => db.set(spec.resource, value),
            OptionArg::Value(_) => {
                let value = args
                    .next()
                    .ok_or_else(|| UsageError::MissingArgument(arg.to_owned()))?;
                db.set(spec.resource, unicode(value.as_ref())?);
            }
        }
    }
    Ok(ParseOutcome::Run)
}

fn unicode(arg: &OsStr) -> Result<&str, UsageError> {
    arg.to_str()
        .ok_or_else(|| UsageError::NotUnicode(arg.to_string_lossy().into_owned()))
}

/// Formats usage text for the merged flag table.
#[must_use]
pub fn usage(progname: &str, options: &[OptionSpec]) -> String {
    let mut out = format!("usage: {progname} [options]\n\nOptions:\n");
    let _ = writeln!(out, "  {:<28}print this help and exit", "-help");
    for spec in options {
        let left = match spec.arg {
            OptionArg::Fixed(_) => spec.flag.to_owned(),
            OptionArg::Value(placeholder) => format!("{} <{placeholder}>", spec.flag),
        };
        let _ = writeln!(out, "  {left:<28}sets {}", spec.resource);
    }
    out
}

/// Typed view of the built-in resources.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Which output to render on; unset means every output.
    pub output: OutputFilter,
    /// Monochrome rendering.
    pub mono: bool,
    /// Log the measured frame rate.
    pub do_fps: bool,
    /// Use one shared surface on the compositor's default output instead of
    /// one surface per output.
    pub one_surface: bool,
    /// Frames of animation to record, `0` for none.
    pub record_anim: u64,
    /// Shut down cleanly after this long.
    pub exit_after: Option<Duration>,
}

impl Settings {
    /// Reads the built-in resources from `db`.
    #[must_use]
    pub fn from_resources(db: &ResourceDb) -> Self {
        let output = db
            .string("output")
            .map_or_else(OutputFilter::any, OutputFilter::named);
        let exit_after = u64::try_from(db.integer("exitAfter"))
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self {
            output,
            mono: db.boolean("mono"),
            do_fps: db.boolean("doFPS"),
            one_surface: db.boolean("oneSurface"),
            record_anim: u64::try_from(db.integer("recordAnim")).unwrap_or(0),
            exit_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BUILTIN_DEFAULTS, OptionSpec, ParseOutcome, Settings, UsageError, merged_options,
        parse_args, usage,
    };
    use crate::resources::ResourceDb;
    use crate::time::Duration;

    const HACK_OPTIONS: &[OptionSpec] = &[
        OptionSpec::value("-speed", "speed", "float"),
        OptionSpec::fixed("-mono", "mono", "yes"),
    ];

    fn db() -> ResourceDb {
        let mut db = ResourceDb::new("pulse", "Pulse");
        db.load_lines(BUILTIN_DEFAULTS.iter().copied());
        db
    }

    #[test]
    fn defaults_produce_plain_settings() {
        let settings = Settings::from_resources(&db());
        assert!(!settings.output.is_set(), "empty output means no filter");
        assert!(!settings.do_fps);
        assert!(!settings.one_surface);
        assert_eq!(settings.exit_after, None);
        assert_eq!(settings.record_anim, 0);
    }

    #[test]
    fn flags_set_resources() {
        let mut db = db();
        let options = merged_options(HACK_OPTIONS);
        let outcome = parse_args(
            ["-output", "Monitor-2", "--fps", "-exit-after", "30", "-speed", "2.5"],
            &options,
            &mut db,
        );
        assert_eq!(outcome, Ok(ParseOutcome::Run));

        let settings = Settings::from_resources(&db);
        assert_eq!(settings.output.name(), Some("Monitor-2"));
        assert!(settings.do_fps, "double-dash spelling accepted");
        assert_eq!(settings.exit_after, Some(Duration::from_secs(30)));
        assert!((db.float("speed") - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn hack_flag_overrides_builtin() {
        let options = merged_options(HACK_OPTIONS);
        let count = options.iter().filter(|spec| spec.flag == "-mono").count();
        assert_eq!(count, 1, "duplicate switch is merged");

        let mut db = db();
        parse_args(["-mono"], &options, &mut db).unwrap();
        assert_eq!(db.string("mono"), Some("yes"), "hack's value wins");
    }

    #[test]
    fn later_flag_wins() {
        let mut db = db();
        let options = merged_options(&[]);
        parse_args(["-fps", "-no-fps"], &options, &mut db).unwrap();
        assert!(!Settings::from_resources(&db).do_fps, "last switch wins");
    }

    #[test]
    fn help_stops_parsing() {
        let mut db = db();
        let options = merged_options(&[]);
        assert_eq!(
            parse_args(["-help", "-bogus"], &options, &mut db),
            Ok(ParseOutcome::Help)
        );
        assert_eq!(
            parse_args(["--help"], &options, &mut db),
            Ok(ParseOutcome::Help)
        );
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let mut db = db();
        let options = merged_options(&[]);
        assert_eq!(
            parse_args(["-bogus"], &options, &mut db),
            Err(UsageError::Unrecognized("-bogus".into()))
        );
    }

    #[test]
    fn missing_argument_is_rejected() {
        let mut db = db();
        let options = merged_options(&[]);
        assert_eq!(
            parse_args(["-output"], &options, &mut db),
            Err(UsageError::MissingArgument("-output".into()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_argument_is_a_usage_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;

        let mut db = db();
        let options = merged_options(&[]);
        let name = OsStr::from_bytes(b"DP-\xff");
        assert_eq!(
            parse_args([OsStr::new("-output"), name], &options, &mut db),
            Err(UsageError::NotUnicode("DP-\u{fffd}".into())),
            "value of a flag"
        );
        assert_eq!(
            parse_args([name], &options, &mut db),
            Err(UsageError::NotUnicode("DP-\u{fffd}".into())),
            "the flag itself"
        );
        assert!(!Settings::from_resources(&db).output.is_set(), "nothing applied");
    }

    #[test]
    fn negative_exit_after_is_ignored() {
        let mut db = db();
        db.set("exitAfter", "-5");
        assert_eq!(Settings::from_resources(&db).exit_after, None);
    }

    #[test]
    fn usage_lists_every_flag() {
        let options = merged_options(HACK_OPTIONS);
        let text = usage("pulse", &options);
        assert!(text.starts_with("usage: pulse"));
        for spec in &options {
            assert!(text.contains(spec.flag), "usage is missing {}", spec.flag);
        }
        assert!(text.contains("-output <name>"), "placeholders are shown");
    }
}
