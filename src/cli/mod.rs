mod customize_genome;
mod index_genome;
mod qc_reads;
mod shared;
mod utils;

use clap::{Parser, Subcommand};
use simple_error::SimpleResult;

use self::customize_genome::validate_and_fix_customize_genome_settings;
pub use self::customize_genome::CustomizeGenomeSettings;
use self::index_genome::validate_and_fix_index_genome_settings;
pub use self::index_genome::IndexGenomeSettings;
use self::qc_reads::validate_and_fix_qc_reads_settings;
pub use self::qc_reads::QcReadsSettings;
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Align one sample to a reference, call its variants and build a customized genome
    CustomizeGenome(CustomizeGenomeSettings),

    /// Quality assess and trim the reads of one or more samples
    QcReads(QcReadsSettings),

    /// Build the indexes and sorted VCF needed to use a reference genome
    IndexGenome(IndexGenomeSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes the logger is not setup yet
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::CustomizeGenome(x) => {
            let x = validate_and_fix_customize_genome_settings(x)?;
            Commands::CustomizeGenome(x)
        }
        Commands::QcReads(x) => {
            let x = validate_and_fix_qc_reads_settings(x)?;
            Commands::QcReads(x)
        }
        Commands::IndexGenome(x) => {
            let x = validate_and_fix_index_genome_settings(x)?;
            Commands::IndexGenome(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
