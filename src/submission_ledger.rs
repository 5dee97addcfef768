//! Track every job submitted during one run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::errors::{PipelineError, PipelineResult};
use crate::scheduler::JobId;

pub const SUBMISSIONS_FILENAME: &str = "amaize.submissions.json";

#[derive(Clone, Debug, Serialize)]
pub struct SubmissionRecord {
    pub stage: String,
    pub sample_id: String,
    pub job_id: JobId,

    /// Jobs this submission was made dependent on
    pub dependencies: Vec<JobId>,

    /// Fully rendered scheduler command
    pub command: String,
}

#[derive(Default, Serialize)]
pub struct SubmissionLedger {
    records: Vec<SubmissionRecord>,
}

impl SubmissionLedger {
    pub fn push(&mut self, record: SubmissionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }
}

/// Write the submission ledger out in json format
pub fn write_submission_ledger(logs_dir: &Utf8Path, ledger: &SubmissionLedger) -> PipelineResult<()> {
    let filename = logs_dir.join(SUBMISSIONS_FILENAME);

    info!(
        "Writing {} job submission records to file: '{filename}'",
        ledger.records().len()
    );

    let f = File::create(&filename).map_err(|e| PipelineError::filesystem(&filename, e))?;
    serde_json::to_writer_pretty(&f, ledger)
        .map_err(|e| PipelineError::filesystem(&filename, e.into()))
}
