//! Archviz CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use archviz_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Archviz");
    debug!(args:?; "Parsed arguments");

    match archviz_cli::run(&args) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            info!("Completed successfully");
        }
        Err(err) => {
            let reporter = miette::GraphicalReportHandler::new();

            // Render each diagnostic independently
            for reportable in to_reportables(&err) {
                let mut writer = String::new();
                if reporter.render_report(&mut writer, &reportable).is_err() {
                    writer = reportable.to_string();
                }
                error!("{writer}");
            }

            process::exit(1);
        }
    }
}
