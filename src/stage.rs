use camino::{Utf8Path, Utf8PathBuf};

/// One unit of externally executed pipeline work
///
/// A stage is built once from the run settings and consumed by a single chain run.
///
#[derive(Clone, Debug)]
pub struct Stage {
    /// Stage label used in job names and log file names
    pub name: String,

    pub sample_id: String,

    /// A disabled stage is never submitted and is transparent to dependency chaining
    pub enabled: bool,

    /// Path to the stage's batch script
    pub script: Utf8PathBuf,

    /// Arguments handed to the script, in the script's documented order
    pub positional_args: Vec<String>,

    /// Additional scheduler options, e.g. a cpu count override
    pub extra_flags: Vec<String>,

    /// Directory for the scheduler's stdout/stderr logs of this stage
    pub log_dir: Utf8PathBuf,

    /// If set, job stdout is written to this artifact path instead of the stdout log
    pub stdout_capture: Option<Utf8PathBuf>,
}

impl Stage {
    pub fn new(name: &str, sample_id: &str, script: Utf8PathBuf, log_dir: &Utf8Path) -> Self {
        Self {
            name: name.to_string(),
            sample_id: sample_id.to_string(),
            enabled: true,
            script,
            positional_args: Vec::new(),
            extra_flags: Vec::new(),
            log_dir: log_dir.to_path_buf(),
            stdout_capture: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.positional_args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.positional_args
            .extend(args.into_iter().map(|x| x.as_ref().to_string()));
        self
    }

    pub fn extra_flag(mut self, flag: impl Into<String>) -> Self {
        self.extra_flags.push(flag.into());
        self
    }

    pub fn capture_stdout(mut self, path: Utf8PathBuf) -> Self {
        self.stdout_capture = Some(path);
        self
    }

    /// Scheduler job name for this stage
    pub fn job_name(&self) -> String {
        format!("{}_{}", self.sample_id, self.name)
    }
}

/// Location of the batch script for a named stage: `{script_dir}/{stage_name}.sbatch`
pub fn stage_script(script_dir: &Utf8Path, stage_name: &str) -> Utf8PathBuf {
    script_dir.join(format!("{stage_name}.sbatch"))
}
