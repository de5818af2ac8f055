// #![forbid(unsafe_code)]
// #![deny(non_upper_case_globals)]
// #![deny(non_camel_case_types)]
// #![deny(non_snake_case)]
// #![deny(unused_mut)]
// #![deny(unused_variables)]
// #![deny(dead_code)]
// #![deny(unused_imports)]
//#![deny(missing_docs)]
//#![deny(warnings)]

extern crate chrono;
extern crate derivative;
extern crate serde_derive;

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

mod configuration;
mod engine;
mod error;
mod reporter;
mod time;

use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT};
use std::{path::PathBuf, process::exit, thread};
use structopt::StructOpt;

use self::configuration::constants::common::DEFAULT_THREADS;
use self::engine::plan::PlanEngine;
use self::reporter::ExecutionReporter;
use self::{
    configuration::command_line::Opt,
    configuration::manifest::Manifest,
};

fn main() {
    let mut options = Opt::from_args();

    if let Err(e) = init_logging(options.take_log_level(), &options.log_output_file) {
        eprintln!("Failed to initialize logging: {}", e);
        exit(2);
    }

    match Signals::new(&[SIGINT]) {
        Ok(signals) => {
            thread::spawn(move || {
                for sig in signals.forever() {
                    info!("Received signal {:?}, stopping", sig);
                    exit(130);
                }
            });
        }
        Err(e) => warn!("Cannot listen for SIGINT: {}", e),
    }

    if let Err(e) = run(options) {
        error!("{}", e);
        exit(1);
    }
}

fn run(options: Opt) -> error::Result<()> {
    // Scope is validated before the manifest is touched.
    let reporter = ExecutionReporter::new(options.source, options.scope.as_deref())?;
    let manifest = Manifest::from(options.file)?;
    debug!("Initiated configuration {:#?}", manifest);
    let engine = PlanEngine::new(manifest, options.threads.unwrap_or(DEFAULT_THREADS));
    reporter.run(&engine)
}

/// Logs go to stderr; stdout is reserved for protocol lines.
fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?)
    }
    dispatcher.apply()?;
    info!("Logging level {} enabled", level);
    Ok(())
}
