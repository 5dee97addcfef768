//! Align one sample's reads to a reference, call its variants and build a customized genome
//!
//! All stages form a single linear chain. Each stage reads the deterministic outputs of the stage
//! before it, so a re-run can skip stages that already completed.
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::artifact_paths::{artifact_path, ensure_dir, sample_dir, sample_prefix, stage_file};
use crate::cli::{CustomizeGenomeSettings, SharedSettings};
use crate::dependency_chain::{ChainStep, DependencyChain, enabled_stage_count};
use crate::errors::PipelineResult;
use crate::scheduler::{BatchScheduler, Frontier};
use crate::stage::{Stage, stage_script};
use crate::submitter::StageSubmitter;

/// Genome customization stages in submission order
#[derive(AsRefStr, Clone, Copy, Debug, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum GenomeStage {
    Align,
    SortBam,
    Flagstat,
    MarkDuplicates,
    BaseRecalibrator,
    HaplotypeCaller,
    SelectSnps,
    SelectIndels,
    FilterSnps,
    MakeAlternateRef,
}

impl GenomeStage {
    /// True if the stage script takes the reference genome as an argument
    pub fn uses_reference_genome(&self) -> bool {
        !matches!(self, Self::SortBam | Self::Flagstat | Self::MarkDuplicates)
    }
}

/// Output locations for one genome customization run
struct GenomeLayout {
    intermediate_dir: Utf8PathBuf,

    /// Prefix of the intermediate alignment files: `{intermediate}/{prefix}/{prefix}`
    intermediate_prefix: Utf8PathBuf,

    /// Aligner output captured from stdout
    alignment_sam: Utf8PathBuf,

    stats_dir: Utf8PathBuf,

    /// Alignment statistics captured from stdout
    alignment_metrics: Utf8PathBuf,

    variants_dir: Utf8PathBuf,

    /// Prefix of all variant files: `{results}/{prefix}/variants/{prefix}`
    variants_prefix: Utf8PathBuf,

    new_genome: Utf8PathBuf,
}

impl GenomeLayout {
    fn new(settings: &CustomizeGenomeSettings) -> Self {
        let prefix = settings.prefix.as_str();
        let intermediate_dir = sample_dir(&settings.intermediate_dir, prefix);
        let results_dir = sample_dir(&settings.results_dir, prefix);
        let stats_dir = results_dir.join("stats");
        let variants_dir = results_dir.join("variants");
        Self {
            intermediate_prefix: sample_prefix(&intermediate_dir, prefix),
            intermediate_dir,
            alignment_sam: artifact_path(&settings.intermediate_dir, prefix, "bwa", ".sam"),
            alignment_metrics: stage_file(&stats_dir, prefix, "alignment_metrics", ".txt"),
            stats_dir,
            variants_prefix: sample_prefix(&variants_dir, prefix),
            variants_dir,
            new_genome: results_dir.join(&settings.new_genome_name),
        }
    }

    /// Directories that must exist before any stage is submitted
    fn dirs<'a>(&'a self, logs_dir: &'a Utf8Path) -> Vec<&'a Utf8Path> {
        vec![
            logs_dir,
            self.intermediate_dir.as_path(),
            self.stats_dir.as_path(),
            self.variants_dir.as_path(),
        ]
    }
}

/// Build the genome customization chain, including disabled stages
pub fn customize_genome_steps(
    shared: &SharedSettings,
    settings: &CustomizeGenomeSettings,
) -> Vec<ChainStep> {
    let layout = GenomeLayout::new(settings);
    let genome = settings.genome.as_str();
    let intermediate = layout.intermediate_prefix.as_str();
    let variants = layout.variants_prefix.as_str();

    GenomeStage::iter()
        .map(|genome_stage| {
            let name = genome_stage.as_ref();
            let stage = Stage::new(
                name,
                &settings.prefix,
                stage_script(&shared.script_dir, name),
                &shared.logs_dir,
            )
            .enabled(settings.is_enabled(genome_stage));

            let stage = match genome_stage {
                GenomeStage::Align => stage
                    .args([genome, settings.reads1.as_str(), settings.reads2.as_str()])
                    .capture_stdout(layout.alignment_sam.clone()),
                GenomeStage::SortBam | GenomeStage::MarkDuplicates => stage.arg(intermediate),
                GenomeStage::Flagstat => stage
                    .arg(intermediate)
                    .capture_stdout(layout.alignment_metrics.clone()),
                GenomeStage::BaseRecalibrator => {
                    stage.args([intermediate, genome, settings.vcf.as_str()])
                }
                GenomeStage::HaplotypeCaller => stage.args([intermediate, variants, genome]),
                GenomeStage::SelectSnps | GenomeStage::SelectIndels | GenomeStage::FilterSnps => {
                    stage.args([variants, genome])
                }
                GenomeStage::MakeAlternateRef => {
                    stage.args([genome, variants, layout.new_genome.as_str()])
                }
            };
            ChainStep::Linear(stage)
        })
        .collect()
}

/// Create the output directories and submit all enabled genome customization stages
pub fn run_customize_genome<S: BatchScheduler>(
    shared: &SharedSettings,
    settings: &CustomizeGenomeSettings,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<Frontier> {
    let layout = GenomeLayout::new(settings);
    for dir in layout.dirs(&shared.logs_dir) {
        ensure_dir(dir)?;
    }

    let steps = customize_genome_steps(shared, settings);
    info!(
        "Submitting {} of {} genome customization stages for '{}'",
        enabled_stage_count(&steps),
        steps.len(),
        settings.prefix
    );

    DependencyChain::new(steps).run(submitter)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::PipelineError;
    use crate::scheduler::JobId;
    use crate::scheduler::recording::{RecordingScheduler, dependency_clause};

    fn get_test_settings(root: &Utf8Path) -> (SharedSettings, CustomizeGenomeSettings) {
        let shared = SharedSettings::for_test(&root.join("logs"));
        let settings = CustomizeGenomeSettings {
            genome: "ref/B73.fa".into(),
            vcf: "ref/B73.vcf".into(),
            prefix: "s1".to_string(),
            new_genome_name: "s1_custom.fa".to_string(),
            reads1: "reads/s1_1.fq.gz".into(),
            reads2: "reads/s1_2.fq.gz".into(),
            intermediate_dir: root.join("inter"),
            results_dir: root.join("results"),
            ..Default::default()
        };
        (shared, settings)
    }

    fn clause_for<'a>(scheduler: &'a RecordingScheduler, stage: GenomeStage) -> Option<&'a str> {
        let args = scheduler
            .submission_for_job_name(&format!("s1_{}", stage.as_ref()))
            .unwrap_or_else(|| panic!("stage {stage:?} was not submitted"));
        dependency_clause(args)
    }

    #[test]
    fn test_stage_names() {
        let names = GenomeStage::iter().map(|x| x.as_ref().to_string()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "align",
                "sort_bam",
                "flagstat",
                "mark_duplicates",
                "base_recalibrator",
                "haplotype_caller",
                "select_snps",
                "select_indels",
                "filter_snps",
                "make_alternate_ref",
            ]
        );
    }

    #[test]
    fn test_all_stages_form_linear_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let (shared, settings) = get_test_settings(root);

        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        let frontier = run_customize_genome(&shared, &settings, &mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(scheduler.submissions.len(), 10);
        assert_eq!(dependency_clause(&scheduler.submissions[0]), None);
        for (k, args) in scheduler.submissions.iter().enumerate().skip(1) {
            let expected = format!("afterany:{}", 100 + k - 1);
            assert_eq!(dependency_clause(args), Some(expected.as_str()));
        }
        assert_eq!(frontier, vec![JobId::from("109")]);

        assert!(root.join("inter/s1").is_dir());
        assert!(root.join("results/s1/stats").is_dir());
        assert!(root.join("results/s1/variants").is_dir());
        assert!(root.join("logs").is_dir());
    }

    #[test]
    fn test_skipped_sort_bam() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let (shared, mut settings) = get_test_settings(root);
        settings.set_enabled(GenomeStage::SortBam, false);

        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        run_customize_genome(&shared, &settings, &mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(scheduler.submissions.len(), 9);
        assert!(scheduler.submission_for_job_name("s1_sort_bam").is_none());
        assert_eq!(clause_for(scheduler, GenomeStage::Flagstat), Some("afterany:100"));
        assert_eq!(
            clause_for(scheduler, GenomeStage::MarkDuplicates),
            Some("afterany:101")
        );
    }

    #[test]
    fn test_resume_from_variant_calling() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let (shared, mut settings) = get_test_settings(root);
        for stage in GenomeStage::iter().take(5) {
            settings.set_enabled(stage, false);
        }

        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        run_customize_genome(&shared, &settings, &mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(scheduler.submissions.len(), 5);
        assert_eq!(clause_for(scheduler, GenomeStage::HaplotypeCaller), None);

        // The first submitted stage still reads the intermediate files of the skipped stages
        let args = scheduler.submission_for_job_name("s1_haplotype_caller").unwrap();
        let intermediate_prefix = root.join("inter/s1/s1");
        assert!(args.contains(&intermediate_prefix.to_string()));
    }

    #[test]
    fn test_stage_arguments() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let (shared, settings) = get_test_settings(root);

        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        run_customize_genome(&shared, &settings, &mut submitter).unwrap();
        let scheduler = submitter.scheduler();

        let align = scheduler.submission_for_job_name("s1_align").unwrap();
        assert_eq!(
            align,
            &vec![
                format!("--output={root}/inter/s1/s1_bwa.sam"),
                format!("--error={root}/logs/s1_align_err.log"),
                "--job-name=s1_align".to_string(),
                "scripts/align.sbatch".to_string(),
                "ref/B73.fa".to_string(),
                "reads/s1_1.fq.gz".to_string(),
                "reads/s1_2.fq.gz".to_string(),
            ]
        );

        let flagstat = scheduler.submission_for_job_name("s1_flagstat").unwrap();
        assert_eq!(
            flagstat[0],
            format!("--output={root}/results/s1/stats/s1_alignment_metrics.txt")
        );

        let haplotype_caller = scheduler
            .submission_for_job_name("s1_haplotype_caller")
            .unwrap();
        assert_eq!(
            haplotype_caller[haplotype_caller.len() - 3..].to_vec(),
            vec![
                format!("{root}/inter/s1/s1"),
                format!("{root}/results/s1/variants/s1"),
                "ref/B73.fa".to_string(),
            ]
        );

        let alternate_ref = scheduler
            .submission_for_job_name("s1_make_alternate_ref")
            .unwrap();
        assert_eq!(
            alternate_ref.last().unwrap(),
            &format!("{root}/results/s1/s1_custom.fa")
        );
    }

    #[test]
    fn test_failed_submission_stops_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let (shared, settings) = get_test_settings(root);

        let mut submitter = StageSubmitter::new(RecordingScheduler::failing_on(3));
        let result = run_customize_genome(&shared, &settings, &mut submitter);

        match result {
            Err(PipelineError::Submission { stage, .. }) => assert_eq!(stage, "s1_flagstat"),
            _ => panic!("expected submission error"),
        }
        assert_eq!(submitter.scheduler().submissions.len(), 3);
        assert_eq!(submitter.ledger().records().len(), 2);
    }
}
