// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renders a screen hack as the background layer of Wayland outputs.
//!
//! ```text
//! layerhack [-output <name>] [-one-surface] [-fps] [-delay <usecs>] ...
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod pulse;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use layerhack_core::hack::HackFactory;
use layerhack_core::options::{
    BUILTIN_DEFAULTS, ParseOutcome, Settings, merged_options, parse_args, usage,
};
use layerhack_core::resources::ResourceDb;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::pulse::PulseFactory;

const DEFAULT_FILTER: &str = "layerhack=info,warn";

fn main() -> ExitCode {
    init_logging();

    let mut args = std::env::args_os();
    let progname = args
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name()?.to_str().map(str::to_owned))
        .unwrap_or_else(|| "layerhack".to_owned());

    let factory = PulseFactory;
    let options = merged_options(factory.options());
    let mut resources = ResourceDb::new(progname.as_str(), factory.progclass());
    resources.load_lines(factory.defaults().iter().copied());
    resources.load_lines(BUILTIN_DEFAULTS.iter().copied());

    match parse_args(args, &options, &mut resources) {
        Ok(ParseOutcome::Run) => {}
        Ok(ParseOutcome::Help) => {
            print!("{}", usage(&progname, &options));
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{progname}: {err}");
            eprint!("{}", usage(&progname, &options));
            return ExitCode::from(2);
        }
    }

    match run(Box::new(factory), resources) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(factory: Box<dyn HackFactory>, resources: ResourceDb) -> Result<()> {
    let settings = Settings::from_resources(&resources);
    info!(progname = resources.progname(), ?settings, "starting");

    let target = settings
        .output
        .name()
        .map_or_else(|| "all outputs".to_owned(), |name| format!("output `{name}`"));
    layerhack_backend_wayland::run(factory, resources, &settings)
        .with_context(|| format!("rendering on {target} failed"))
}
