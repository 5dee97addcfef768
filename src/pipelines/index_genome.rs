//! Index a reference genome for alignment and variant calling
//!
//! The indexing stages share no inputs or outputs, so each one runs as its own fork branch with
//! no dependencies.
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::artifact_paths::{ensure_dir, sample_dir};
use crate::cli::{IndexGenomeSettings, SharedSettings};
use crate::dependency_chain::{ChainStep, DependencyChain, enabled_stage_count};
use crate::errors::PipelineResult;
use crate::scheduler::{BatchScheduler, Frontier};
use crate::stage::{Stage, stage_script};
use crate::submitter::StageSubmitter;

#[derive(AsRefStr, Clone, Copy, Debug, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum IndexStage {
    BwaIndex,
    PicardIndex,
    Faidx,
    SortVcf,
}

/// Label for a genome used in job names: the file name up to its first '.'
pub fn genome_label(genome: &Utf8Path) -> String {
    let name = genome.file_name().unwrap_or(genome.as_str());
    name.split('.').next().unwrap_or(name).to_string()
}

/// Sorted VCF output paths, next to the input: `<stem>_sorted.<ext>` and
/// `<stem>_sorted_updated.<ext>`
fn sorted_vcf_paths(vcf: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
    let name = vcf.file_name().unwrap_or(vcf.as_str());
    let (stem, ext) = match name.split_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    let dir = vcf.parent().unwrap_or(Utf8Path::new(""));
    (
        dir.join(format!("{stem}_sorted{ext}")),
        dir.join(format!("{stem}_sorted_updated{ext}")),
    )
}

fn is_enabled(settings: &IndexGenomeSettings, index_stage: IndexStage) -> bool {
    match index_stage {
        IndexStage::BwaIndex => settings.bwa_index,
        IndexStage::PicardIndex => settings.picard,
        IndexStage::Faidx => settings.faidx,
        IndexStage::SortVcf => settings.sort_vcf,
    }
}

pub fn index_genome_log_dir(shared: &SharedSettings, settings: &IndexGenomeSettings) -> Utf8PathBuf {
    sample_dir(&shared.logs_dir, &genome_label(&settings.genome))
}

/// Build the indexing fork, including disabled stages
pub fn index_genome_steps(
    shared: &SharedSettings,
    settings: &IndexGenomeSettings,
) -> Vec<ChainStep> {
    let label = genome_label(&settings.genome);
    let log_dir = index_genome_log_dir(shared, settings);
    let genome = settings.genome.as_str();

    let branches = IndexStage::iter()
        .map(|index_stage| {
            let name = index_stage.as_ref();
            let stage = Stage::new(name, &label, stage_script(&shared.script_dir, name), &log_dir)
                .enabled(is_enabled(settings, index_stage));

            let stage = match (index_stage, &settings.vcf) {
                (IndexStage::SortVcf, Some(vcf)) => {
                    let (sorted, updated) = sorted_vcf_paths(vcf);
                    stage.args([vcf.as_str(), sorted.as_str(), genome, updated.as_str()])
                }
                (IndexStage::SortVcf, None) => stage.enabled(false),
                _ => stage.arg(genome),
            };
            vec![ChainStep::Linear(stage)]
        })
        .collect();

    vec![ChainStep::Fork(branches)]
}

/// Submit all enabled indexing stages for the genome
pub fn run_index_genome<S: BatchScheduler>(
    shared: &SharedSettings,
    settings: &IndexGenomeSettings,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<Frontier> {
    ensure_dir(&index_genome_log_dir(shared, settings))?;

    let steps = index_genome_steps(shared, settings);
    info!(
        "Submitting {} indexing stages for genome '{}'",
        enabled_stage_count(&steps),
        settings.genome
    );

    DependencyChain::new(steps).run(submitter)
}
