#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]
mod app;
mod exporters;

use std::process::exit;

pub use exporters::{exporter::Exporter, json::JSON, txt::TXT};

use app::{
    options::{from_command_line, Options},
    runtime::{init_logging, Config},
};

fn main() {
    // Get args from command line
    let args = from_command_line();
    // Create application options
    let options = match Options::from_args(&args) {
        Ok(options) => options,
        Err(why) => {
            eprintln!("{why}");
            exit(2);
        }
    };

    init_logging(options.verbose);

    // Create app state and start
    match Config::new(options) {
        Ok(app) => {
            if let Err(why) = app.start() {
                eprintln!("Unable to finish: {why}");
                exit(1);
            }
        }
        Err(why) => {
            eprintln!("Unable to launch: {why}");
            exit(1);
        }
    }
}
