//! Deterministic naming of stage artifacts and scheduler log files
//!
//! Naming is kept pure so that later stages can refer to the outputs of earlier stages without
//! any record of what was actually produced. Directory creation is a separate explicit step.
//!

use camino::{Utf8Path, Utf8PathBuf};
use strum::AsRefStr;

use crate::errors::{PipelineError, PipelineResult};

/// Which scheduler log stream a log path is for
#[derive(AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum LogStream {
    Out,
    Err,
}

/// Directory holding all artifacts of one sample below `base_dir`
pub fn sample_dir(base_dir: &Utf8Path, sample_id: &str) -> Utf8PathBuf {
    base_dir.join(sample_id)
}

/// Path of a stage file for a sample inside `dir`: `{dir}/{sample_id}_{stage_name}{suffix}`
pub fn stage_file(dir: &Utf8Path, sample_id: &str, stage_name: &str, suffix: &str) -> Utf8PathBuf {
    dir.join(format!("{sample_id}_{stage_name}{suffix}"))
}

/// Path of one stage artifact for a sample
///
/// Produces `{base_dir}/{sample_id}/{sample_id}_{stage_name}{suffix}`, where `suffix` normally
/// carries the file extension, e.g. `.sam`.
///
pub fn artifact_path(
    base_dir: &Utf8Path,
    sample_id: &str,
    stage_name: &str,
    suffix: &str,
) -> Utf8PathBuf {
    stage_file(&sample_dir(base_dir, sample_id), sample_id, stage_name, suffix)
}

/// Output prefix handed to tools that derive their own file names: `{dir}/{sample_id}`
pub fn sample_prefix(dir: &Utf8Path, sample_id: &str) -> Utf8PathBuf {
    dir.join(sample_id)
}

/// Path of the scheduler stdout or stderr log for one stage of a sample
///
/// Produces `{logs_dir}/{sample_id}_{stage_name}_{out|err}.log`
///
pub fn log_path(
    logs_dir: &Utf8Path,
    sample_id: &str,
    stage_name: &str,
    stream: LogStream,
) -> Utf8PathBuf {
    stage_file(
        logs_dir,
        sample_id,
        stage_name,
        &format!("_{}.log", stream.as_ref()),
    )
}

/// Strip a compound file extension such as `.fq.gz` from a file name
///
/// The name is returned unchanged if it doesn't end with `extension`.
///
pub fn file_stem_before(path: &Utf8Path, extension: &str) -> String {
    let name = path.file_name().unwrap_or(path.as_str());
    name.strip_suffix(extension).unwrap_or(name).to_string()
}

/// Path in `dir` for a file derived from an input file: `{dir}/{input stem}_{tag}{extension}`
pub fn derived_path(dir: &Utf8Path, input: &Utf8Path, tag: &str, extension: &str) -> Utf8PathBuf {
    dir.join(format!("{}_{tag}{extension}", file_stem_before(input, extension)))
}

/// Create a directory path, including all missing parents, if it does not exist already
///
/// Repeated calls with the same path are no-ops after the first. The input path is returned to
/// allow use inline with path construction.
///
pub fn ensure_dir(dir: &Utf8Path) -> PipelineResult<&Utf8Path> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::filesystem(dir, e))?;
    }
    Ok(dir)
}
