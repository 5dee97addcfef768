//! Interface to the external batch scheduler
//!
//! The orchestrator only ever asks the scheduler to accept a job and, once at the end of a run,
//! to report its queue. Job state is never polled.
//!

#[cfg(test)]
pub mod recording;
mod slurm;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use self::slurm::SlurmScheduler;

/// Opaque identifier of a job accepted by the scheduler
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

#[cfg(test)]
impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handles of the most recently submitted enabled stage(s)
///
/// Empty when nothing upstream has been submitted. Holds more than one handle only after a fork
/// re-joins.
///
pub type Frontier = Vec<JobId>;

/// Raw result of one scheduler invocation
#[derive(Clone, Debug)]
pub struct SchedulerResponse {
    /// True if the scheduler command exited successfully
    pub success: bool,

    /// Combined stdout and stderr text
    pub output: String,
}

/// A batch scheduler accepting job submissions
///
/// Submission arguments are a structured argument vector excluding the submission program name
/// itself.
///
pub trait BatchScheduler {
    /// Name of the submission program, used to render commands for the log
    fn submit_program(&self) -> &str;

    fn submit(&mut self, args: &[String]) -> std::io::Result<SchedulerResponse>;

    /// Report the scheduler queue, restricted to `user` if given
    fn queue_status(&mut self, user: Option<&str>) -> std::io::Result<SchedulerResponse>;
}

/// Version of the rule used to find the job id in scheduler submission output
pub const JOB_ID_RULE_VERSION: u32 = 1;

/// Job id rule v1: a numeric id with optional array-task suffix and optional cluster name
static JOB_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(_[0-9]+)?(;[A-Za-z0-9_.-]+)?$").unwrap());

/// Extract the job id from scheduler submission output
///
/// The id is the final whitespace-delimited token of the output, e.g. `Submitted batch job 123`
/// gives `123`. Returns None if there is no final token or it doesn't look like a job id.
///
pub fn parse_job_id(output: &str) -> Option<JobId> {
    let token = output.split_whitespace().last()?;
    if JOB_ID_REGEX.is_match(token) {
        Some(JobId(token.to_string()))
    } else {
        None
    }
}
