//! Methods specific to the amaize logger
//!

use camino::Utf8Path;

use crate::artifact_paths::ensure_dir;
use crate::globals::PROGRAM_NAME;

/// If debug is true set the default logger to the more verbose debug level
///
fn setup_logger(logs_dir: &Utf8Path, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let log_filename = logs_dir.join(PROGRAM_NAME.to_string() + ".log");
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_filename)?)
        .apply()?;
    Ok(())
}

/// Create the logs directory if needed, then setup logger to write there
///
/// The run log is appended to, so that the logs of repeated runs sharing one logs directory are
/// kept together.
///
/// #Arguments
/// * `debug` - If true use debug log level, and info level otherwise
///
pub fn setup_logs_dir_and_logger(logs_dir: &Utf8Path, debug: bool) {
    // No logger is setup yet, so errors follow the pre-logging pattern of the command-line
    // settings checks
    if let Err(err) = ensure_dir(logs_dir) {
        eprintln!("Can't create logs directory: {err}");
        std::process::exit(exitcode::CANTCREAT);
    }
    if let Err(err) = setup_logger(logs_dir, debug) {
        eprintln!("Can't setup logger in directory '{logs_dir}': {err}");
        std::process::exit(exitcode::CANTCREAT);
    }
}
