//! Quality assessment and trimming of raw reads
//!
//! Every sample gets its own independent chain: fastqc on the raw reads, paired and single-end
//! trimming as two parallel branches, then fastqc on all trimmed reads once both branches finish.
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use strum::AsRefStr;

use crate::artifact_paths::{derived_path, ensure_dir, sample_dir};
use crate::cli::{QcReadsSettings, SharedSettings};
use crate::dependency_chain::{ChainStep, DependencyChain, enabled_stage_count};
use crate::errors::{PipelineError, PipelineResult};
use crate::read_topology::{
    FASTQ_GZ_EXTENSION, ReadSample, ReadSamples, ReadTopology, resolve_read_samples,
};
use crate::scheduler::BatchScheduler;
use crate::stage::{Stage, stage_script};
use crate::submitter::StageSubmitter;

#[derive(AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum QcStage {
    FastqcRaw,
    TrimPe,
    TrimSe,
    FastqcTrimmed,
}

impl QcStage {
    /// Name of the batch script run by this stage
    fn script_name(&self) -> &'static str {
        match self {
            Self::FastqcRaw | Self::FastqcTrimmed => "fastqc",
            Self::TrimPe => "trim_pe",
            Self::TrimSe => "trim_se",
        }
    }
}

/// Output locations for the reads of one sample
struct SampleLayout {
    log_dir: Utf8PathBuf,
    fastqc_raw_dir: Utf8PathBuf,
    fastqc_trimmed_dir: Utf8PathBuf,
    trim_dir: Utf8PathBuf,
}

impl SampleLayout {
    fn new(shared: &SharedSettings, settings: &QcReadsSettings, sample_id: &str) -> Self {
        let kind_dir = |base: &Utf8Path| sample_dir(&base.join(&settings.kind), sample_id);
        let fastqc_dir = kind_dir(settings.fastqc_out.as_path());
        Self {
            log_dir: kind_dir(shared.logs_dir.as_path()),
            fastqc_raw_dir: fastqc_dir.join("raw"),
            fastqc_trimmed_dir: fastqc_dir.join("trimmed"),
            trim_dir: kind_dir(settings.trim_out.as_path()),
        }
    }

    /// Create the directories needed by the enabled stages
    fn create_dirs(&self, settings: &QcReadsSettings) -> PipelineResult<()> {
        ensure_dir(&self.log_dir)?;
        if settings.fastqc_raw {
            ensure_dir(&self.fastqc_raw_dir)?;
        }
        if settings.trim {
            ensure_dir(&self.trim_dir)?;
        }
        if settings.fastqc_trimmed {
            ensure_dir(&self.fastqc_trimmed_dir)?;
        }
        Ok(())
    }
}

fn trimmed_path(trim_dir: &Utf8Path, read_file: &Utf8Path, tag: &str) -> Utf8PathBuf {
    derived_path(trim_dir, read_file, tag, FASTQ_GZ_EXTENSION)
}

/// Build the chain for one sample, including disabled stages
///
/// Trimmed reads are always named from the raw read names, so that quality assessment of trimmed
/// reads finds the output of an earlier run when trimming is skipped.
///
pub fn qc_sample_steps(
    shared: &SharedSettings,
    settings: &QcReadsSettings,
    topology: ReadTopology,
    sample: &ReadSample,
) -> Vec<ChainStep> {
    let layout = SampleLayout::new(shared, settings, &sample.sample_id);
    let new_stage = |qc_stage: QcStage| {
        Stage::new(
            qc_stage.as_ref(),
            &sample.sample_id,
            stage_script(&shared.script_dir, qc_stage.script_name()),
            &layout.log_dir,
        )
    };
    let trim_cpus_flag = format!("--cpus-per-task={}", settings.trim_cpu_count);

    let fastqc_raw = new_stage(QcStage::FastqcRaw)
        .enabled(settings.fastqc_raw)
        .arg(layout.fastqc_raw_dir.as_str())
        .args(sample.files.iter().map(|x| x.as_str()));

    let mut trimmed_files = Vec::new();
    let mut trim_branches = Vec::new();

    if let Some((forward, reverse)) = sample.paired_files(topology) {
        let outputs = [
            trimmed_path(&layout.trim_dir, forward, "paired_trimmed"),
            trimmed_path(&layout.trim_dir, forward, "unpaired_trimmed"),
            trimmed_path(&layout.trim_dir, reverse, "paired_trimmed"),
            trimmed_path(&layout.trim_dir, reverse, "unpaired_trimmed"),
        ];
        let trim_pe = new_stage(QcStage::TrimPe)
            .enabled(settings.trim)
            .extra_flag(trim_cpus_flag.clone())
            .args([forward, reverse])
            .args(&outputs);
        trim_branches.push(vec![ChainStep::Linear(trim_pe)]);
        trimmed_files.extend(outputs);
    }

    if let Some(unpaired) = sample.unpaired_file(topology) {
        let output = trimmed_path(&layout.trim_dir, unpaired, "trimmed");
        let trim_se = new_stage(QcStage::TrimSe)
            .enabled(settings.trim)
            .extra_flag(trim_cpus_flag)
            .args([unpaired, output.as_path()]);
        trim_branches.push(vec![ChainStep::Linear(trim_se)]);
        trimmed_files.push(output);
    }

    let fastqc_trimmed = new_stage(QcStage::FastqcTrimmed)
        .enabled(settings.fastqc_trimmed)
        .arg(layout.fastqc_trimmed_dir.as_str())
        .args(&trimmed_files);

    vec![
        ChainStep::Linear(fastqc_raw),
        ChainStep::Fork(trim_branches),
        ChainStep::Linear(fastqc_trimmed),
    ]
}

/// Find the read files of every sample described by the settings
pub fn resolve_qc_samples(settings: &QcReadsSettings) -> PipelineResult<ReadSamples> {
    let source = settings.read_source();
    let topology = settings.topology().ok_or_else(|| {
        PipelineError::config("Read topology must be given for a directory of read files")
    })?;
    resolve_read_samples(&source, topology, settings.separator)
}

/// Submit quality assessment and trimming stages for every sample
///
/// Returns the number of samples processed.
///
pub fn run_qc_reads<S: BatchScheduler>(
    shared: &SharedSettings,
    settings: &QcReadsSettings,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<usize> {
    let samples = resolve_qc_samples(settings)?;
    let topology = samples.topology();
    info!(
        "Found {} '{}' read samples with topology {topology:?}",
        samples.len(),
        settings.kind
    );

    for sample in &samples {
        SampleLayout::new(shared, settings, &sample.sample_id).create_dirs(settings)?;

        let steps = qc_sample_steps(shared, settings, topology, sample);
        info!(
            "Submitting {} read QC stages for sample '{}'",
            enabled_stage_count(&steps),
            sample.sample_id
        );
        DependencyChain::new(steps).run(submitter)?;
    }

    Ok(samples.len())
}
