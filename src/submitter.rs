//! Render and submit single stages to the batch scheduler
//!

use itertools::Itertools;
use log::info;

use crate::artifact_paths::{LogStream, log_path};
use crate::errors::{PipelineError, PipelineResult};
use crate::scheduler::{BatchScheduler, JOB_ID_RULE_VERSION, JobId, parse_job_id};
use crate::stage::Stage;
use crate::submission_ledger::{SubmissionLedger, SubmissionRecord};

/// Dependency type requested from the scheduler
///
/// A dependent job may start once any listed job reaches a terminal state, whether or not it
/// succeeded.
///
const DEPENDENCY_TYPE: &str = "afterany";

/// Build the scheduler dependency option for a set of upstream jobs
///
/// Returns None when there are no upstream jobs.
///
pub fn dependency_clause(dependencies: &[JobId]) -> Option<String> {
    if dependencies.is_empty() {
        None
    } else {
        Some(format!(
            "--dependency={DEPENDENCY_TYPE}:{}",
            dependencies.iter().join(":")
        ))
    }
}

/// Render the full scheduler argument vector for one stage
///
/// Argument order: log redirection, job name, optional dependency clause, extra flags, script,
/// then the script's positional arguments.
///
pub fn render_submission_args(stage: &Stage, dependencies: &[JobId]) -> Vec<String> {
    let stdout_path = match &stage.stdout_capture {
        Some(path) => path.clone(),
        None => log_path(&stage.log_dir, &stage.sample_id, &stage.name, LogStream::Out),
    };
    let stderr_path = log_path(&stage.log_dir, &stage.sample_id, &stage.name, LogStream::Err);

    let mut args = vec![
        format!("--output={stdout_path}"),
        format!("--error={stderr_path}"),
        format!("--job-name={}", stage.job_name()),
    ];
    args.extend(dependency_clause(dependencies));
    args.extend(stage.extra_flags.iter().cloned());
    args.push(stage.script.to_string());
    args.extend(stage.positional_args.iter().cloned());
    args
}

/// Submits stages to a scheduler and keeps a ledger of every accepted submission
pub struct StageSubmitter<S: BatchScheduler> {
    scheduler: S,
    ledger: SubmissionLedger,
}

impl<S: BatchScheduler> StageSubmitter<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            ledger: SubmissionLedger::default(),
        }
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn ledger(&self) -> &SubmissionLedger {
        &self.ledger
    }

    /// Submit one stage, depending on all jobs in `dependencies`
    ///
    /// The rendered command is logged before submission and the raw scheduler response after it.
    ///
    pub fn submit(&mut self, stage: &Stage, dependencies: &[JobId]) -> PipelineResult<JobId> {
        let args = render_submission_args(stage, dependencies);
        let command = std::iter::once(self.scheduler.submit_program())
            .chain(args.iter().map(|x| x.as_str()))
            .join(" ");

        info!("Creating job with command:\n\n{command}\n");

        let submission_error = |reason: String| PipelineError::Submission {
            stage: stage.job_name(),
            command: command.clone(),
            reason,
        };

        let response = self
            .scheduler
            .submit(&args)
            .map_err(|e| submission_error(format!("unable to run scheduler: {e}")))?;

        info!("{}", response.output.trim_end());

        if !response.success {
            return Err(submission_error(
                "scheduler exited with a failure status".to_string(),
            ));
        }

        let job_id = parse_job_id(&response.output).ok_or_else(|| {
            submission_error(format!(
                "no job id matching rule v{JOB_ID_RULE_VERSION} found in scheduler response: '{}'",
                response.output.trim()
            ))
        })?;

        self.ledger.push(SubmissionRecord {
            stage: stage.name.clone(),
            sample_id: stage.sample_id.clone(),
            job_id: job_id.clone(),
            dependencies: dependencies.to_vec(),
            command,
        });

        Ok(job_id)
    }
}
