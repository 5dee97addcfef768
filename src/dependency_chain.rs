//! Conditional dependency chaining of optionally skipped stages
//!
//! The chain walks its steps in declaration order carrying a frontier, the job handle(s) of the
//! most recently submitted enabled stage(s). An enabled stage is submitted dependent on the whole
//! frontier and replaces it with its own handle. A disabled stage is skipped entirely and leaves
//! the frontier as it was, so the next enabled stage depends on the nearest enabled predecessor.
//!
//! A fork runs each of its branches from the same frontier and re-joins them on exit: the
//! following stage depends on the final handles of every branch that submitted anything.
//!

use log::debug;

use crate::errors::PipelineResult;
use crate::scheduler::{BatchScheduler, Frontier};
use crate::stage::Stage;
use crate::submitter::StageSubmitter;

#[derive(Clone, Debug)]
pub enum ChainStep {
    Linear(Stage),

    /// Independent branches sharing the incoming frontier, re-joined when the fork ends
    Fork(Vec<Vec<ChainStep>>),
}

/// Number of enabled stages in a step list
pub fn enabled_stage_count(steps: &[ChainStep]) -> usize {
    steps
        .iter()
        .map(|step| match step {
            ChainStep::Linear(stage) => usize::from(stage.enabled),
            ChainStep::Fork(branches) => branches.iter().map(|b| enabled_stage_count(b)).sum(),
        })
        .sum()
}

pub struct DependencyChain {
    steps: Vec<ChainStep>,
}

impl DependencyChain {
    pub fn new(steps: Vec<ChainStep>) -> Self {
        Self { steps }
    }

    /// Submit all enabled stages in order and return the final frontier
    ///
    /// The first failed submission ends the run. Jobs submitted before the failure remain with
    /// the scheduler.
    ///
    pub fn run<S: BatchScheduler>(
        &self,
        submitter: &mut StageSubmitter<S>,
    ) -> PipelineResult<Frontier> {
        run_steps(&self.steps, Frontier::new(), submitter)
    }
}

fn run_steps<S: BatchScheduler>(
    steps: &[ChainStep],
    mut frontier: Frontier,
    submitter: &mut StageSubmitter<S>,
) -> PipelineResult<Frontier> {
    for step in steps {
        frontier = match step {
            ChainStep::Linear(stage) => {
                if stage.enabled {
                    vec![submitter.submit(stage, &frontier)?]
                } else {
                    debug!("Skipping disabled stage {}", stage.job_name());
                    frontier
                }
            }
            ChainStep::Fork(branches) => {
                let mut joined = Frontier::new();
                for branch in branches {
                    if enabled_stage_count(branch) == 0 {
                        continue;
                    }
                    joined.extend(run_steps(branch, frontier.clone(), submitter)?);
                }
                if joined.is_empty() { frontier } else { joined }
            }
        };
    }
    Ok(frontier)
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::PipelineError;
    use crate::scheduler::JobId;
    use crate::scheduler::recording::{RecordingScheduler, dependency_clause};

    fn stage(name: &str, enabled: bool) -> ChainStep {
        ChainStep::Linear(
            Stage::new(
                name,
                "s1",
                format!("scripts/{name}.sbatch").into(),
                Utf8Path::new("logs"),
            )
            .enabled(enabled),
        )
    }

    fn clause_for<'a>(scheduler: &'a RecordingScheduler, name: &str) -> Option<&'a str> {
        let args = scheduler
            .submission_for_job_name(&format!("s1_{name}"))
            .unwrap_or_else(|| panic!("stage {name} was not submitted"));
        dependency_clause(args)
    }

    #[test]
    fn test_linear_chain() {
        let chain = DependencyChain::new(vec![stage("a", true), stage("b", true), stage("c", true)]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        let frontier = chain.run(&mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(scheduler.submissions.len(), 3);
        assert_eq!(clause_for(scheduler, "a"), None);
        assert_eq!(clause_for(scheduler, "b"), Some("afterany:100"));
        assert_eq!(clause_for(scheduler, "c"), Some("afterany:101"));
        assert_eq!(frontier, vec![JobId::from("102")]);
    }

    #[test]
    fn test_disabled_stage_is_transparent() {
        let chain = DependencyChain::new(vec![
            stage("a", true),
            stage("b", false),
            stage("c", false),
            stage("d", true),
        ]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        let frontier = chain.run(&mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(scheduler.submissions.len(), 2);
        assert!(scheduler.submission_for_job_name("s1_b").is_none());
        assert!(scheduler.submission_for_job_name("s1_c").is_none());
        assert_eq!(clause_for(scheduler, "d"), Some("afterany:100"));
        assert_eq!(frontier, vec![JobId::from("101")]);
    }

    #[test]
    fn test_leading_disabled_stage_gives_no_dependency() {
        let chain = DependencyChain::new(vec![stage("a", false), stage("b", true)]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        chain.run(&mut submitter).unwrap();
        assert_eq!(clause_for(submitter.scheduler(), "b"), None);
    }

    #[test]
    fn test_all_disabled() {
        let chain = DependencyChain::new(vec![stage("a", false), stage("b", false)]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        let frontier = chain.run(&mut submitter).unwrap();
        assert!(frontier.is_empty());
        assert!(submitter.scheduler().submissions.is_empty());
    }

    #[test]
    fn test_fork_rejoins_both_branches() {
        let chain = DependencyChain::new(vec![
            stage("root", true),
            ChainStep::Fork(vec![vec![stage("left", true)], vec![stage("right", true)]]),
            stage("join", true),
        ]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        chain.run(&mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(clause_for(scheduler, "left"), Some("afterany:100"));
        assert_eq!(clause_for(scheduler, "right"), Some("afterany:100"));
        assert_eq!(clause_for(scheduler, "join"), Some("afterany:101:102"));
    }

    #[test]
    fn test_fork_rejoins_single_enabled_branch() {
        let chain = DependencyChain::new(vec![
            stage("root", true),
            ChainStep::Fork(vec![vec![stage("left", false)], vec![stage("right", true)]]),
            stage("join", true),
        ]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        chain.run(&mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(clause_for(scheduler, "right"), Some("afterany:100"));
        assert_eq!(clause_for(scheduler, "join"), Some("afterany:101"));
    }

    #[test]
    fn test_fork_with_no_enabled_branch_passes_frontier() {
        let chain = DependencyChain::new(vec![
            stage("root", true),
            ChainStep::Fork(vec![vec![stage("left", false)], vec![stage("right", false)]]),
            stage("join", true),
        ]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        chain.run(&mut submitter).unwrap();
        assert_eq!(clause_for(submitter.scheduler(), "join"), Some("afterany:100"));
    }

    #[test]
    fn test_fork_of_independent_roots() {
        let chain = DependencyChain::new(vec![ChainStep::Fork(vec![
            vec![stage("x", true)],
            vec![stage("y", true)],
        ])]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::new());
        let frontier = chain.run(&mut submitter).unwrap();

        let scheduler = submitter.scheduler();
        assert_eq!(clause_for(scheduler, "x"), None);
        assert_eq!(clause_for(scheduler, "y"), None);
        assert_eq!(frontier, vec![JobId::from("100"), JobId::from("101")]);
    }

    #[test]
    fn test_failed_submission_stops_chain() {
        let chain = DependencyChain::new(vec![stage("a", true), stage("b", true), stage("c", true)]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::failing_on(2));
        let result = chain.run(&mut submitter);

        assert!(matches!(result, Err(PipelineError::Submission { ref stage, .. }) if stage == "s1_b"));
        // Nothing is submitted after the failure
        assert_eq!(submitter.scheduler().submissions.len(), 2);
        assert_eq!(submitter.ledger().records().len(), 1);
    }

    #[test]
    fn test_response_without_job_id_stops_chain() {
        let chain = DependencyChain::new(vec![stage("a", true), stage("b", true), stage("c", true)]);
        let mut submitter = StageSubmitter::new(RecordingScheduler::without_job_id_on(2));
        let result = chain.run(&mut submitter);

        assert!(matches!(result, Err(PipelineError::Submission { ref stage, .. }) if stage == "s1_b"));
        assert_eq!(submitter.scheduler().submissions.len(), 2);
        assert!(submitter.scheduler().submission_for_job_name("s1_c").is_none());
        let records = submitter.ledger().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, "a");
    }

    #[test]
    fn test_enabled_stage_count() {
        let steps = vec![
            stage("a", true),
            ChainStep::Fork(vec![vec![stage("b", false)], vec![stage("c", true)]]),
        ];
        assert_eq!(enabled_stage_count(&steps), 2);
    }
}
