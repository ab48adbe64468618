use std::process;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use trellis_cli::{Args, ErrorAdapter};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = args.log_filter().unwrap_or_else(|| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Trellis");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = trellis_cli::run(&args) {
        let reporter = miette::GraphicalReportHandler::new();
        let mut report = String::new();
        match reporter.render_report(&mut report, &ErrorAdapter(&err)) {
            Ok(()) => error!("Failed\n{report}"),
            Err(_) => error!(error = err.to_string(); "Failed"),
        }
        process::exit(1);
    }

    info!("Completed successfully");
}
