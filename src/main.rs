mod artifact_paths;
mod cli;
mod dependency_chain;
mod errors;
mod globals;
mod logger;
mod pipelines;
mod read_topology;
mod scheduler;
mod stage;
mod submission_ledger;
mod submitter;

use std::process;

use hhmmss::Hhmmss;
use log::{error, info};

use crate::errors::PipelineResult;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_logs_dir_and_logger;
use crate::pipelines::run_pipeline;
use crate::scheduler::SlurmScheduler;
use crate::submitter::StageSubmitter;

fn run(settings: &cli::Settings) -> PipelineResult<()> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    let scheduler = SlurmScheduler::new(&settings.shared.sbatch, &settings.shared.squeue);
    let mut submitter = StageSubmitter::new(scheduler);
    run_pipeline(settings, &mut submitter)?;

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the logs directory for the log file:
    setup_logs_dir_and_logger(&settings.shared.logs_dir, settings.shared.debug);

    if let Err(err) = run(&settings) {
        error!("{err}");
        process::exit(err.exit_code());
    }
}
