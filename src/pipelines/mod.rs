//! Pipeline drivers, one per subcommand
//!

pub mod customize_genome;
pub mod index_genome;
pub mod qc_reads;

use log::{info, warn};

use self::customize_genome::run_customize_genome;
use self::index_genome::run_index_genome;
use self::qc_reads::run_qc_reads;
use crate::cli::{Commands, Settings};
use crate::errors::PipelineResult;
use crate::scheduler::BatchScheduler;
use crate::submission_ledger::write_submission_ledger;
use crate::submitter::StageSubmitter;

fn run_command<S: BatchScheduler>(
    settings: &Settings,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<()> {
    let shared = &settings.shared;
    match &settings.command {
        Commands::CustomizeGenome(x) => {
            run_customize_genome(shared, x, submitter)?;
        }
        Commands::QcReads(x) => {
            let sample_count = run_qc_reads(shared, x, submitter)?;
            info!("Processed {sample_count} read samples");
        }
        Commands::IndexGenome(x) => {
            run_index_genome(shared, x, submitter)?;
        }
    }
    Ok(())
}

/// Log the scheduler queue after all submissions
///
/// This is informational only, so failures are logged as warnings.
///
fn report_queue<S: BatchScheduler>(settings: &Settings, submitter: &mut StageSubmitter<S>) {
    let user = settings.shared.queue_user.as_deref();
    match submitter.scheduler_mut().queue_status(user) {
        Ok(response) if response.success => {
            info!("Scheduler queue:\n{}", response.output.trim_end());
        }
        Ok(response) => {
            warn!("Scheduler queue report failed: {}", response.output.trim());
        }
        Err(e) => {
            warn!("Unable to run scheduler queue report: {e}");
        }
    }
}

/// Submit all stages of the selected pipeline
///
/// The submission ledger is written whether or not every submission succeeded, so that jobs left
/// queued by a failed run can be found.
///
pub fn run_pipeline<S: BatchScheduler>(
    settings: &Settings,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<()> {
    let result = run_command(settings, submitter);

    info!("Submitted {} jobs", submitter.ledger().records().len());
    let ledger_result = write_submission_ledger(&settings.shared.logs_dir, submitter.ledger());
    result?;
    ledger_result?;

    report_queue(settings, submitter);
    Ok(())
}
