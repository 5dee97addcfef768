use std::process::Command;

use super::{BatchScheduler, SchedulerResponse};

/// SLURM scheduler driven through its command-line clients
pub struct SlurmScheduler {
    sbatch: String,
    squeue: String,
}

impl SlurmScheduler {
    pub fn new(sbatch: &str, squeue: &str) -> Self {
        Self {
            sbatch: sbatch.to_string(),
            squeue: squeue.to_string(),
        }
    }
}

fn run_command(command: &mut Command) -> std::io::Result<SchedulerResponse> {
    let output = command.output()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(SchedulerResponse {
        success: output.status.success(),
        output: text,
    })
}

impl BatchScheduler for SlurmScheduler {
    fn submit_program(&self) -> &str {
        &self.sbatch
    }

    fn submit(&mut self, args: &[String]) -> std::io::Result<SchedulerResponse> {
        run_command(Command::new(&self.sbatch).args(args))
    }

    fn queue_status(&mut self, user: Option<&str>) -> std::io::Result<SchedulerResponse> {
        let mut command = Command::new(&self.squeue);
        match user {
            Some(user) => command.args(["-u", user]),
            None => command.arg("--me"),
        };
        run_command(&mut command)
    }
}
