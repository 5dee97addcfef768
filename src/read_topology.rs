//! Group read files into per-sample tuples
//!
//! Read files are supplied either as a directory of compressed FASTQ files or as explicit
//! forward/reverse/unpaired lists. Either way they are flattened into one ordered file list and
//! cut into consecutive fixed-size groups, one group per sample.
//!

use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use itertools::izip;
use regex::Regex;

use crate::errors::{PipelineError, PipelineResult};

/// Extension expected for compressed FASTQ read files
pub const FASTQ_GZ_EXTENSION: &str = ".fq.gz";

static FASTQ_GZ_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.+\.fq\.gz$").unwrap());

/// Which read files are present for every sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReadTopology {
    /// Forward, reverse and unpaired reads
    PairedPlusUnpaired,

    /// Forward and reverse reads only
    Paired,

    /// Unpaired (single-end) reads only
    Unpaired,
}

impl ReadTopology {
    /// Number of files making up one sample
    pub fn group_size(&self) -> usize {
        match self {
            Self::PairedPlusUnpaired => 3,
            Self::Paired => 2,
            Self::Unpaired => 1,
        }
    }

    pub fn has_pairs(&self) -> bool {
        !matches!(self, Self::Unpaired)
    }

    pub fn has_unpaired(&self) -> bool {
        !matches!(self, Self::Paired)
    }
}

/// Where read files come from
#[derive(Clone, Debug)]
pub enum ReadSource {
    /// All compressed FASTQ files found in a directory
    Directory(Utf8PathBuf),

    /// Explicit read lists matched up by position
    Files {
        forward: Vec<Utf8PathBuf>,
        reverse: Vec<Utf8PathBuf>,
        unpaired: Vec<Utf8PathBuf>,
    },
}

impl ReadSource {
    /// Topology implied by which explicit read lists are given
    ///
    /// Returns None for a directory source, which needs the topology declared.
    ///
    pub fn implied_topology(&self) -> PipelineResult<Option<ReadTopology>> {
        match self {
            Self::Directory(_) => Ok(None),
            Self::Files {
                forward,
                reverse,
                unpaired,
            } => {
                let topology = match (forward.is_empty(), reverse.is_empty(), unpaired.is_empty()) {
                    (false, false, false) => ReadTopology::PairedPlusUnpaired,
                    (false, false, true) => ReadTopology::Paired,
                    (true, true, false) => ReadTopology::Unpaired,
                    (true, true, true) => {
                        return Err(PipelineError::config("No read files were specified"));
                    }
                    _ => {
                        return Err(PipelineError::config(
                            "Forward and reverse reads must be specified together",
                        ));
                    }
                };
                Ok(Some(topology))
            }
        }
    }
}

/// Read files of one sample in `(forward, reverse, unpaired)` order, restricted to the files
/// present in the topology
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadSample {
    pub sample_id: String,
    pub files: Vec<Utf8PathBuf>,
}

impl ReadSample {
    /// Forward and reverse reads, if the sample has them
    pub fn paired_files(&self, topology: ReadTopology) -> Option<(&Utf8Path, &Utf8Path)> {
        if topology.has_pairs() {
            Some((self.files[0].as_path(), self.files[1].as_path()))
        } else {
            None
        }
    }

    pub fn unpaired_file(&self, topology: ReadTopology) -> Option<&Utf8Path> {
        if topology.has_unpaired() {
            self.files.last().map(|x| x.as_path())
        } else {
            None
        }
    }
}

/// Sample id from a read file name: the part of the name before the first `separator`
pub fn sample_id_from_filename(path: &Utf8Path, separator: char) -> PipelineResult<String> {
    let name = path.file_name().unwrap_or(path.as_str());
    let sample_id = name.split(separator).next().unwrap_or_default();
    if sample_id.is_empty() {
        return Err(PipelineError::config(format!(
            "Can't find a sample name before separator '{separator}' in read file name: '{path}'"
        )));
    }
    Ok(sample_id.to_string())
}

/// Resolved read files, iterable any number of times as per-sample groups
#[derive(Debug)]
pub struct ReadSamples {
    topology: ReadTopology,
    samples: Vec<ReadSample>,
}

impl ReadSamples {
    pub fn topology(&self) -> ReadTopology {
        self.topology
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReadSample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a ReadSamples {
    type Item = &'a ReadSample;
    type IntoIter = std::slice::Iter<'a, ReadSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Compressed FASTQ files in `dir`, ordered by file name
fn list_fastq_dir(dir: &Utf8Path) -> PipelineResult<Vec<Utf8PathBuf>> {
    let entries = dir
        .read_dir_utf8()
        .map_err(|e| PipelineError::filesystem(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::filesystem(dir, e))?;
        if FASTQ_GZ_REGEX.is_match(entry.file_name()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Interleave explicit read lists into one `(forward, reverse, unpaired)` ordered file list
fn interleave_read_lists(
    forward: &[Utf8PathBuf],
    reverse: &[Utf8PathBuf],
    unpaired: &[Utf8PathBuf],
    topology: ReadTopology,
) -> PipelineResult<Vec<Utf8PathBuf>> {
    let check_len = |label: &str, len: usize, expected: usize| -> PipelineResult<()> {
        if len != expected {
            return Err(PipelineError::config(format!(
                "Expected {expected} {label} read files to match the forward reads, but found {len}"
            )));
        }
        Ok(())
    };

    let files = match topology {
        ReadTopology::PairedPlusUnpaired => {
            check_len("reverse", reverse.len(), forward.len())?;
            check_len("unpaired", unpaired.len(), forward.len())?;
            izip!(forward, reverse, unpaired)
                .flat_map(|(f, r, u)| [f, r, u])
                .cloned()
                .collect()
        }
        ReadTopology::Paired => {
            check_len("reverse", reverse.len(), forward.len())?;
            izip!(forward, reverse)
                .flat_map(|(f, r)| [f, r])
                .cloned()
                .collect()
        }
        ReadTopology::Unpaired => unpaired.to_vec(),
    };
    Ok(files)
}

/// Group read files into per-sample tuples for the given topology
///
/// The sample id of each group is taken from the name of its first file. A file count that
/// isn't a multiple of the topology's group size is a configuration error.
///
pub fn resolve_read_samples(
    source: &ReadSource,
    topology: ReadTopology,
    separator: char,
) -> PipelineResult<ReadSamples> {
    let files = match source {
        ReadSource::Directory(dir) => list_fastq_dir(dir)?,
        ReadSource::Files {
            forward,
            reverse,
            unpaired,
        } => interleave_read_lists(forward, reverse, unpaired, topology)?,
    };

    if files.is_empty() {
        return Err(PipelineError::config(match source {
            ReadSource::Directory(dir) => {
                format!("No '*{FASTQ_GZ_EXTENSION}' read files found in directory '{dir}'")
            }
            ReadSource::Files { .. } => "No read files were specified".to_string(),
        }));
    }

    let group_size = topology.group_size();
    if files.len() % group_size != 0 {
        return Err(PipelineError::config(format!(
            "Found {} read files, which can't be split into groups of {group_size} for topology {topology:?}",
            files.len()
        )));
    }

    let samples = files
        .chunks(group_size)
        .map(|group| {
            let sample_id = sample_id_from_filename(&group[0], separator)?;
            for file in &group[1..] {
                let file_sample_id = sample_id_from_filename(file, separator)?;
                if file_sample_id != sample_id {
                    return Err(PipelineError::config(format!(
                        "Read file '{file}' has sample name '{file_sample_id}' but is grouped with sample '{sample_id}'. Check that every sample has all {group_size} read files"
                    )));
                }
            }
            Ok(ReadSample {
                sample_id,
                files: group.to_vec(),
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(ReadSamples { topology, samples })
}
