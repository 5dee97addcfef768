use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::{check_name_component, check_required_filename};
use crate::pipelines::customize_genome::GenomeStage;

#[derive(Args, Clone, Debug, Default)]
pub struct CustomizeGenomeSettings {
    /// Reference genome in FASTA format
    #[arg(value_name = "GENOME")]
    pub genome: Utf8PathBuf,

    /// Known variants for the reference genome, in VCF format
    #[arg(value_name = "VCF")]
    pub vcf: Utf8PathBuf,

    /// Base name given to intermediate files. Also used as the sample name in job names and logs.
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    /// Name given to the new customized genome
    #[arg(value_name = "NEW")]
    pub new_genome_name: String,

    /// Forward reads of the sample
    #[arg(value_name = "READS1")]
    pub reads1: Utf8PathBuf,

    /// Reverse reads of the sample
    #[arg(value_name = "READS2")]
    pub reads2: Utf8PathBuf,

    /// Output directory for intermediate alignment files
    #[arg(long, value_name = "DIR", default_value = "intermediate")]
    pub intermediate_dir: Utf8PathBuf,

    /// Output directory for variants, alignment statistics and the customized genome
    #[arg(long, value_name = "DIR", default_value = "results")]
    pub results_dir: Utf8PathBuf,

    /// Don't perform BWA alignment
    #[arg(short = 'b', long)]
    pub skip_align: bool,

    /// Don't sort the output alignment by genomic position and convert it to BAM
    #[arg(short = 's', long)]
    pub skip_sort_bam: bool,

    /// Don't calculate the alignment statistics
    #[arg(short = 'f', long)]
    pub skip_flagstat: bool,

    /// Don't mark duplicate reads in the sorted BAM file
    #[arg(short = 'm', long)]
    pub skip_mark_duplicates: bool,

    /// Don't recalibrate the base scores of the aligned reads
    #[arg(short = 'r', long)]
    pub skip_base_recalibrator: bool,

    /// Don't use the haplotype caller to call variants
    #[arg(short = 'c', long)]
    pub skip_haplotype_caller: bool,

    /// Don't select SNPs from the haplotype caller VCF
    #[arg(short = 'd', long)]
    pub skip_select_snps: bool,

    /// Don't select indels from the haplotype caller VCF
    #[arg(short = 'i', long)]
    pub skip_select_indels: bool,

    /// Don't filter out SNPs near indels
    #[arg(short = 'v', long)]
    pub skip_filter_snps: bool,

    /// Don't modify the reference with the filtered SNPs
    #[arg(short = 'a', long)]
    pub skip_make_alternate_ref: bool,
}

impl CustomizeGenomeSettings {
    pub fn is_enabled(&self, stage: GenomeStage) -> bool {
        let skip = match stage {
            GenomeStage::Align => self.skip_align,
            GenomeStage::SortBam => self.skip_sort_bam,
            GenomeStage::Flagstat => self.skip_flagstat,
            GenomeStage::MarkDuplicates => self.skip_mark_duplicates,
            GenomeStage::BaseRecalibrator => self.skip_base_recalibrator,
            GenomeStage::HaplotypeCaller => self.skip_haplotype_caller,
            GenomeStage::SelectSnps => self.skip_select_snps,
            GenomeStage::SelectIndels => self.skip_select_indels,
            GenomeStage::FilterSnps => self.skip_filter_snps,
            GenomeStage::MakeAlternateRef => self.skip_make_alternate_ref,
        };
        !skip
    }

    pub fn set_enabled(&mut self, stage: GenomeStage, enabled: bool) {
        let skip = match stage {
            GenomeStage::Align => &mut self.skip_align,
            GenomeStage::SortBam => &mut self.skip_sort_bam,
            GenomeStage::Flagstat => &mut self.skip_flagstat,
            GenomeStage::MarkDuplicates => &mut self.skip_mark_duplicates,
            GenomeStage::BaseRecalibrator => &mut self.skip_base_recalibrator,
            GenomeStage::HaplotypeCaller => &mut self.skip_haplotype_caller,
            GenomeStage::SelectSnps => &mut self.skip_select_snps,
            GenomeStage::SelectIndels => &mut self.skip_select_indels,
            GenomeStage::FilterSnps => &mut self.skip_filter_snps,
            GenomeStage::MakeAlternateRef => &mut self.skip_make_alternate_ref,
        };
        *skip = !enabled;
    }
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Input files are only required by the stages that read them, so that completed stages can be
/// skipped on a re-run.
///
pub fn validate_and_fix_customize_genome_settings(
    settings: CustomizeGenomeSettings,
) -> SimpleResult<CustomizeGenomeSettings> {
    use strum::IntoEnumIterator;

    if !GenomeStage::iter().any(|x| settings.is_enabled(x)) {
        bail!("All genome customization stages are skipped, nothing to submit");
    }

    check_name_component(&settings.prefix, "prefix")?;
    check_name_component(&settings.new_genome_name, "new genome name")?;

    let uses_genome = GenomeStage::iter()
        .filter(|x| x.uses_reference_genome())
        .any(|x| settings.is_enabled(x));
    if uses_genome {
        check_required_filename(&settings.genome, "reference genome")?;
    }

    if settings.is_enabled(GenomeStage::BaseRecalibrator) {
        check_required_filename(&settings.vcf, "known variants")?;
    }

    if settings.is_enabled(GenomeStage::Align) {
        check_required_filename(&settings.reads1, "forward reads")?;
        check_required_filename(&settings.reads2, "reverse reads")?;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;

    use super::*;

    fn get_test_settings(dir: &Utf8Path) -> CustomizeGenomeSettings {
        for name in ["ref.fa", "v.vcf", "r1.fq.gz", "r2.fq.gz"] {
            std::fs::write(dir.join(name), "").unwrap();
        }
        CustomizeGenomeSettings {
            genome: dir.join("ref.fa"),
            vcf: dir.join("v.vcf"),
            prefix: "s1".to_string(),
            new_genome_name: "s1_custom.fa".to_string(),
            reads1: dir.join("r1.fq.gz"),
            reads2: dir.join("r2.fq.gz"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        assert!(validate_and_fix_customize_genome_settings(get_test_settings(dir)).is_ok());
    }

    #[test]
    fn test_all_skipped() {
        use strum::IntoEnumIterator;

        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let mut settings = get_test_settings(dir);
        for stage in GenomeStage::iter() {
            settings.set_enabled(stage, false);
        }
        assert!(validate_and_fix_customize_genome_settings(settings).is_err());
    }

    #[test]
    fn test_reads_only_needed_for_alignment() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let mut settings = get_test_settings(dir);
        settings.reads1 = dir.join("missing.fq.gz");
        assert!(validate_and_fix_customize_genome_settings(settings.clone()).is_err());

        settings.set_enabled(GenomeStage::Align, false);
        assert!(validate_and_fix_customize_genome_settings(settings).is_ok());
    }

    #[test]
    fn test_prefix_is_a_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let mut settings = get_test_settings(dir);
        settings.prefix = "a/b".to_string();
        assert!(validate_and_fix_customize_genome_settings(settings).is_err());
    }
}
