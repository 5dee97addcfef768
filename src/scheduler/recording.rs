//! In-memory scheduler double that records every submission
//!

use super::{BatchScheduler, SchedulerResponse};

pub struct RecordingScheduler {
    next_job_id: u64,

    /// Argument vectors of all submissions, accepted or not
    pub submissions: Vec<Vec<String>>,

    /// 1-based index of the submission to reject with a non-zero exit
    pub fail_on_submission: Option<usize>,

    /// 1-based index of the submission to accept without reporting a job id
    pub no_job_id_on_submission: Option<usize>,

    pub queue_queries: Vec<Option<String>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self {
            next_job_id: 100,
            submissions: Vec::new(),
            fail_on_submission: None,
            no_job_id_on_submission: None,
            queue_queries: Vec::new(),
        }
    }

    pub fn failing_on(submission_index: usize) -> Self {
        Self {
            fail_on_submission: Some(submission_index),
            ..Self::new()
        }
    }

    pub fn without_job_id_on(submission_index: usize) -> Self {
        Self {
            no_job_id_on_submission: Some(submission_index),
            ..Self::new()
        }
    }

    /// Find the recorded submission for the given job name
    pub fn submission_for_job_name(&self, job_name: &str) -> Option<&Vec<String>> {
        let label = format!("--job-name={job_name}");
        self.submissions.iter().find(|x| x.contains(&label))
    }
}

impl Default for RecordingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Dependency clause of a recorded submission, if any
pub fn dependency_clause(args: &[String]) -> Option<&str> {
    args.iter().find_map(|x| x.strip_prefix("--dependency="))
}

impl BatchScheduler for RecordingScheduler {
    fn submit_program(&self) -> &str {
        "sbatch"
    }

    fn submit(&mut self, args: &[String]) -> std::io::Result<SchedulerResponse> {
        self.submissions.push(args.to_vec());
        if self.fail_on_submission == Some(self.submissions.len()) {
            return Ok(SchedulerResponse {
                success: false,
                output: "sbatch: error: Batch job submission failed: Invalid partition".to_string(),
            });
        }
        if self.no_job_id_on_submission == Some(self.submissions.len()) {
            return Ok(SchedulerResponse {
                success: true,
                output: "sbatch: warning: job accepted".to_string(),
            });
        }
        let id = self.next_job_id;
        self.next_job_id += 1;
        Ok(SchedulerResponse {
            success: true,
            output: format!("Submitted batch job {id}\n"),
        })
    }

    fn queue_status(&mut self, user: Option<&str>) -> std::io::Result<SchedulerResponse> {
        self.queue_queries.push(user.map(|x| x.to_string()));
        Ok(SchedulerResponse {
            success: true,
            output: "JOBID PARTITION NAME USER ST TIME NODES NODELIST(REASON)".to_string(),
        })
    }
}
