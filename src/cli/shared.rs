use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::{SimpleResult, bail};

use super::utils::check_required_dirname;

#[derive(Args, Clone, Debug)]
pub struct SharedSettings {
    /// Base directory for scheduler job logs and the amaize run log
    #[arg(long, global = true, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_logs"))]
    pub logs_dir: Utf8PathBuf,

    /// Directory holding the stage batch scripts, each named '<stage>.sbatch'
    #[arg(long, global = true, value_name = "DIR", default_value = "sbatch")]
    pub script_dir: Utf8PathBuf,

    /// Restrict the final queue report to this user. Defaults to the submitting user.
    #[arg(long, global = true, value_name = "USER")]
    pub queue_user: Option<String>,

    /// Scheduler job submission command
    #[arg(hide = true, long, global = true, default_value = "sbatch")]
    pub sbatch: String,

    /// Scheduler queue report command
    #[arg(hide = true, long, global = true, default_value = "squeue")]
    pub squeue: String,

    /// Turn on extra debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[cfg(test)]
impl SharedSettings {
    pub fn for_test(logs_dir: &camino::Utf8Path) -> Self {
        Self {
            logs_dir: logs_dir.to_path_buf(),
            script_dir: "scripts".into(),
            queue_user: None,
            sbatch: "sbatch".to_string(),
            squeue: "squeue".to_string(),
            debug: false,
        }
    }
}

pub fn validate_and_fix_shared_settings(settings: SharedSettings) -> SimpleResult<SharedSettings> {
    check_required_dirname(&settings.script_dir, "stage script")?;

    if let Some(user) = &settings.queue_user {
        if user.trim().is_empty() {
            bail!("--queue-user argument must not be empty");
        }
    }

    Ok(settings)
}
