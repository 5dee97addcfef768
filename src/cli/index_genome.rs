use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::{check_optional_filename, check_required_filename};

#[derive(Args, Clone, Debug, Default)]
pub struct IndexGenomeSettings {
    /// Reference genome in FASTA format
    #[arg(value_name = "GENOME")]
    pub genome: Utf8PathBuf,

    /// Known variants for the reference genome, in VCF format. Required to sort the VCF.
    #[arg(long, value_name = "FILE")]
    pub vcf: Option<Utf8PathBuf>,

    /// Build the BWA index of the genome
    #[arg(short = 'b', long)]
    pub bwa_index: bool,

    /// Build the Picard sequence dictionary of the genome
    #[arg(short = 'p', long)]
    pub picard: bool,

    /// Build the samtools faidx index of the genome
    #[arg(short = 'f', long)]
    pub faidx: bool,

    /// Sort the VCF into the genome's contig order
    #[arg(short = 's', long, requires = "vcf")]
    pub sort_vcf: bool,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_index_genome_settings(
    settings: IndexGenomeSettings,
) -> SimpleResult<IndexGenomeSettings> {
    if !(settings.bwa_index || settings.picard || settings.faidx || settings.sort_vcf) {
        bail!("At least one of --bwa-index, --picard, --faidx or --sort-vcf is required");
    }

    check_required_filename(&settings.genome, "reference genome")?;
    check_optional_filename(settings.vcf.as_deref(), "known variants")?;

    if settings.sort_vcf && settings.vcf.is_none() {
        bail!("--vcf is required to sort the VCF");
    }

    Ok(settings)
}
