use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::{check_name_component, check_required_dirname, check_required_filename};
use crate::read_topology::{ReadSource, ReadTopology};

/// Cpus requested for each trimming job unless set on the command line
pub const DEFAULT_TRIM_CPU_COUNT: usize = 16;

#[derive(Args, Clone, Debug, Default)]
pub struct QcReadsSettings {
    /// The kind of reads, e.g. WGS, bisulfite or untreated. Used as a directory level in all output
    /// paths.
    #[arg(value_name = "KIND")]
    pub kind: String,

    /// Directory of compressed FASTQ files to process. Only files ending in '.fq.gz' are used.
    #[arg(long, value_name = "DIR", conflicts_with_all = ["forward", "reverse", "unpaired"])]
    pub dir: Option<Utf8PathBuf>,

    /// Which reads are present for every sample in --dir
    #[arg(short = 'e', long, value_enum, requires = "dir")]
    pub ends: Option<ReadTopology>,

    /// Forward reads. Can be specified multiple times, in the same sample order as --reverse and
    /// --unpaired
    #[arg(short = 'f', long, value_name = "FILE")]
    pub forward: Vec<Utf8PathBuf>,

    /// Reverse reads. Can be specified multiple times, in the same sample order as --forward and
    /// --unpaired
    #[arg(short = 'r', long, value_name = "FILE")]
    pub reverse: Vec<Utf8PathBuf>,

    /// Unpaired reads. Can be specified multiple times. Without --forward and --reverse reads are
    /// processed as single end.
    #[arg(short = 'u', long, value_name = "FILE")]
    pub unpaired: Vec<Utf8PathBuf>,

    /// The symbol separating the sample name from the rest of each read file name
    #[arg(short = 's', long, default_value_t = '_')]
    pub separator: char,

    /// Run fastqc on the raw reads
    #[arg(short = 'q', long)]
    pub fastqc_raw: bool,

    /// Trim reads with trimmomatic
    #[arg(short = 't', long)]
    pub trim: bool,

    /// Run fastqc on the trimmed reads
    #[arg(short = 'w', long)]
    pub fastqc_trimmed: bool,

    /// Output directory for fastqc reports. Required if reads are quality assessed. Reports are
    /// placed under '<KIND>/<sample>/raw' or '<KIND>/<sample>/trimmed'.
    #[arg(long = "fastqc-out", value_name = "DIR")]
    fastqc_out_option: Option<Utf8PathBuf>,

    /// This value will be filled in by fastqc_out_option
    #[arg(skip)]
    pub fastqc_out: Utf8PathBuf,

    /// Output directory for trimmed reads. Required if reads are trimmed or trimmed reads are
    /// quality assessed. Files are placed under '<KIND>/<sample>'.
    #[arg(long = "trim-out", value_name = "DIR")]
    trim_out_option: Option<Utf8PathBuf>,

    /// This value will be filled in by trim_out_option
    #[arg(skip)]
    pub trim_out: Utf8PathBuf,

    /// Cpus requested for each trimming job
    #[arg(long = "trim-cpus", value_name = "CPU_COUNT")]
    trim_cpu_count_option: Option<usize>,

    /// This value will be filled in by trim_cpu_count_option
    #[arg(skip)]
    pub trim_cpu_count: usize,
}

impl QcReadsSettings {
    pub fn read_source(&self) -> ReadSource {
        match &self.dir {
            Some(dir) => ReadSource::Directory(dir.clone()),
            None => ReadSource::Files {
                forward: self.forward.clone(),
                reverse: self.reverse.clone(),
                unpaired: self.unpaired.clone(),
            },
        }
    }

    /// Declared topology for directory input, or the one implied by the given read lists
    pub fn topology(&self) -> Option<ReadTopology> {
        match self.read_source().implied_topology() {
            Ok(Some(x)) => Some(x),
            _ => self.ends,
        }
    }
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_qc_reads_settings(
    mut settings: QcReadsSettings,
) -> SimpleResult<QcReadsSettings> {
    if !(settings.fastqc_raw || settings.trim || settings.fastqc_trimmed) {
        bail!("At least one of --fastqc-raw, --trim or --fastqc-trimmed is required");
    }

    check_name_component(&settings.kind, "read kind")?;

    match &settings.dir {
        Some(dir) => {
            check_required_dirname(dir, "read")?;
            if settings.ends.is_none() {
                bail!("--ends is required with --dir");
            }
        }
        None => {
            if let Err(e) = settings.read_source().implied_topology() {
                bail!("{e}");
            }
            for filename in settings
                .forward
                .iter()
                .chain(&settings.reverse)
                .chain(&settings.unpaired)
            {
                check_required_filename(filename, "read")?;
            }
        }
    }

    let needs_fastqc_out = settings.fastqc_raw || settings.fastqc_trimmed;
    settings.fastqc_out = match settings.fastqc_out_option.take() {
        Some(x) => x,
        None if needs_fastqc_out => bail!("--fastqc-out is required to quality assess reads"),
        None => Utf8PathBuf::new(),
    };

    let needs_trim_out = settings.trim || settings.fastqc_trimmed;
    settings.trim_out = match settings.trim_out_option.take() {
        Some(x) => x,
        None if needs_trim_out => {
            bail!("--trim-out is required to trim reads or quality assess trimmed reads")
        }
        None => Utf8PathBuf::new(),
    };

    settings.trim_cpu_count = match settings.trim_cpu_count_option {
        Some(count) => {
            if count == 0 {
                bail!("--trim-cpus argument must be greater than 0");
            }
            count
        }
        None => DEFAULT_TRIM_CPU_COUNT,
    };

    Ok(settings)
}

#[cfg(test)]
impl QcReadsSettings {
    pub fn for_test(kind: &str, source: ReadSource, topology: Option<ReadTopology>) -> Self {
        let mut settings = Self {
            kind: kind.to_string(),
            ends: topology,
            separator: '_',
            fastqc_raw: true,
            trim: true,
            fastqc_trimmed: true,
            fastqc_out: "fastqc".into(),
            trim_out: "trimmed".into(),
            trim_cpu_count: DEFAULT_TRIM_CPU_COUNT,
            ..Default::default()
        };
        match source {
            ReadSource::Directory(dir) => settings.dir = Some(dir),
            ReadSource::Files {
                forward,
                reverse,
                unpaired,
            } => {
                settings.forward = forward;
                settings.reverse = reverse;
                settings.unpaired = unpaired;
            }
        }
        settings
    }
}
