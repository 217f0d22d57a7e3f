//! Concurrent agent dispatch.
//!
//! One [`AnalysisRun`] per call: every selected agent becomes an
//! [`AgentTask`], all tasks run concurrently in a `JoinSet`, and each is
//! bounded by a timeout that covers all of its attempts. Failed tasks are
//! recorded on the run, never propagated, unless nothing succeeded.

use crate::agent::{Agent, RunContext};
use crate::config::OrchestratorConfig;
use crate::error::{AgentError, RunError};
use crate::models::{
    AgentFailure, AgentKind, AgentTask, AnalysisRun, Document, FailureKind, Finding, TaskStatus,
};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Timeout and retry policy applied uniformly to every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPolicy {
    /// Budget for one task, retries and backoff included.
    pub timeout: Duration,
    /// Extra attempts after a provider error.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub backoff: Duration,
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for TaskPolicy {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            timeout: config.task_timeout(),
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }
}

impl TaskPolicy {
    fn backoff_for(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// How a task's last attempt ended, before timeout handling.
enum AttemptOutcome {
    Finished(Result<Finding, AgentError>),
    Panicked(String),
}

/// Drives agents over a document set.
pub struct Orchestrator {
    agents: HashMap<AgentKind, Arc<dyn Agent>>,
    policy: TaskPolicy,
}

impl Orchestrator {
    pub fn new(policy: TaskPolicy) -> Self {
        Self {
            agents: HashMap::new(),
            policy,
        }
    }

    pub fn with_agents(agents: Vec<Arc<dyn Agent>>, policy: TaskPolicy) -> Self {
        let mut orchestrator = Self::new(policy);
        for agent in agents {
            orchestrator.register(agent);
        }
        orchestrator
    }

    /// Register an agent, replacing any previous agent of the same kind.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.kind(), agent);
    }

    pub fn policy(&self) -> &TaskPolicy {
        &self.policy
    }

    /// Run the selected agents over the documents.
    ///
    /// Tasks in the returned run follow `selection` order. Returns
    /// [`RunError::RunFailed`] when no task succeeded and
    /// [`RunError::Cancelled`] when `cancel` fires first.
    pub async fn run(
        &self,
        documents: Vec<Document>,
        selection: &[AgentKind],
        cancel: &CancellationToken,
    ) -> Result<AnalysisRun, RunError> {
        let mut kinds: Vec<AgentKind> = Vec::with_capacity(selection.len());
        for kind in selection {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        if kinds.is_empty() {
            return Err(RunError::EmptySelection);
        }
        self.ensure_registered(&kinds)?;

        let run_id = Uuid::new_v4();
        info!(
            "Run {}: {} agent(s) over {} document(s)",
            run_id,
            kinds.len(),
            documents.len()
        );

        let tasks = kinds
            .iter()
            .map(|kind| {
                let routed = documents
                    .iter()
                    .filter(|d| d.is_usable() && kind.accepts(d.role))
                    .map(|d| d.id.clone())
                    .collect();
                AgentTask::new(*kind, routed)
            })
            .collect();

        let mut run = AnalysisRun {
            run_id,
            documents,
            tasks,
            created_at: Utc::now(),
        };

        let all: Vec<usize> = (0..run.tasks.len()).collect();
        self.dispatch(&mut run, &all, cancel).await?;

        if run.succeeded_count() == 0 {
            warn!("Run {}: every task failed", run_id);
            return Err(RunError::RunFailed {
                run_id,
                failures: run.failures(),
            });
        }

        info!(
            "Run {}: {}/{} task(s) succeeded",
            run_id,
            run.succeeded_count(),
            run.tasks.len()
        );
        Ok(run)
    }

    /// Re-dispatch the failed and timed-out tasks of a run, in place.
    ///
    /// Returns how many of them succeeded this time.
    pub async fn retry_failed(
        &self,
        run: &mut AnalysisRun,
        cancel: &CancellationToken,
    ) -> Result<usize, RunError> {
        let indices: Vec<usize> = run
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t.status, TaskStatus::Failed | TaskStatus::TimedOut))
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return Ok(0);
        }

        let kinds: Vec<AgentKind> = indices.iter().map(|&i| run.tasks[i].agent_kind).collect();
        self.ensure_registered(&kinds)?;

        info!("Run {}: retrying {} task(s)", run.run_id, indices.len());
        self.dispatch(run, &indices, cancel).await?;

        let recovered = indices
            .iter()
            .filter(|&&i| run.tasks[i].status == TaskStatus::Succeeded)
            .count();

        if run.succeeded_count() == 0 {
            return Err(RunError::RunFailed {
                run_id: run.run_id,
                failures: run.failures(),
            });
        }
        Ok(recovered)
    }

    fn ensure_registered(&self, kinds: &[AgentKind]) -> Result<(), RunError> {
        match kinds.iter().find(|k| !self.agents.contains_key(*k)) {
            Some(kind) => Err(RunError::AgentNotRegistered(*kind)),
            None => Ok(()),
        }
    }

    /// Run the tasks at `indices` concurrently and record their outcomes.
    async fn dispatch(
        &self,
        run: &mut AnalysisRun,
        indices: &[usize],
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        let context = Arc::new(RunContext::from_documents(run.run_id, &run.documents));
        let mut join_set = JoinSet::new();

        for &idx in indices {
            let task = &mut run.tasks[idx];
            let agent = Arc::clone(&self.agents[&task.agent_kind]);
            let documents: Vec<Document> = run
                .documents
                .iter()
                .filter(|d| task.input_documents.contains(&d.id))
                .cloned()
                .collect();

            task.status = TaskStatus::Running;
            task.started_at = Some(Utc::now());
            task.finished_at = None;
            task.finding = None;
            task.error = None;
            debug!(
                "Dispatching {} agent with {} document(s)",
                task.agent_kind,
                documents.len()
            );

            let context = Arc::clone(&context);
            let policy = self.policy;
            join_set.spawn(async move {
                let attempts = AtomicU32::new(0);
                let outcome = tokio::time::timeout(
                    policy.timeout,
                    attempt_with_retries(agent.as_ref(), &documents, &context, policy, &attempts),
                )
                .await;
                (idx, outcome.ok(), attempts.load(Ordering::SeqCst))
            });
        }

        let mut cancelled = false;
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    warn!("Run {} cancelled", run.run_id);
                    cancelled = true;
                    break;
                }
                next = join_set.join_next() => next,
            };

            match joined {
                Some(Ok((idx, outcome, attempts))) => {
                    record_outcome(&mut run.tasks[idx], outcome, attempts, self.policy.timeout);
                }
                Some(Err(e)) => warn!("Task join error: {}", e),
                None => break,
            }
        }

        // Tasks still running here were aborted; leave none of them non-terminal.
        let (kind, message) = if cancelled {
            (FailureKind::Cancelled, "run cancelled")
        } else {
            (FailureKind::Crashed, "task aborted")
        };
        for &idx in indices {
            let task = &mut run.tasks[idx];
            if !task.status.is_terminal() {
                task.status = TaskStatus::Failed;
                task.finished_at = Some(Utc::now());
                task.error = Some(AgentFailure {
                    agent_kind: task.agent_kind,
                    kind,
                    message: message.to_string(),
                    attempts: task.attempts,
                });
            }
        }

        if cancelled {
            return Err(RunError::Cancelled);
        }
        Ok(())
    }
}

/// Call the agent, retrying provider errors with exponential backoff.
async fn attempt_with_retries(
    agent: &dyn Agent,
    documents: &[Document],
    context: &RunContext,
    policy: TaskPolicy,
    attempts: &AtomicU32,
) -> AttemptOutcome {
    let mut retries = 0;
    loop {
        attempts.fetch_add(1, Ordering::SeqCst);

        let result = match AssertUnwindSafe(agent.analyze(documents, context))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => return AttemptOutcome::Panicked(panic_message(panic.as_ref())),
        };

        match result {
            Err(e) if e.is_retryable() && retries < policy.max_retries => {
                retries += 1;
                let delay = policy.backoff_for(retries);
                warn!(
                    "{} agent: {} (retry {}/{} in {:?})",
                    agent.kind(),
                    e,
                    retries,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            other => return AttemptOutcome::Finished(other),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("agent panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("agent panicked: {}", s)
    } else {
        "agent panicked".to_string()
    }
}

/// Move a task to its terminal state. `None` means the timeout fired.
fn record_outcome(
    task: &mut AgentTask,
    outcome: Option<AttemptOutcome>,
    attempts: u32,
    timeout: Duration,
) {
    task.attempts += attempts;
    task.finished_at = Some(Utc::now());

    let (status, kind, message) = match outcome {
        Some(AttemptOutcome::Finished(Ok(finding))) => {
            debug!("{} agent succeeded after {} attempt(s)", task.agent_kind, attempts);
            task.status = TaskStatus::Succeeded;
            task.finding = Some(finding);
            return;
        }
        Some(AttemptOutcome::Finished(Err(e))) => (TaskStatus::Failed, e.failure_kind(), e.to_string()),
        Some(AttemptOutcome::Panicked(message)) => (TaskStatus::Failed, FailureKind::Crashed, message),
        None => (
            TaskStatus::TimedOut,
            FailureKind::Timeout,
            format!("timed out after {}s", timeout.as_secs_f64()),
        ),
    };

    warn!("{} agent failed ({}): {}", task.agent_kind, kind, message);
    task.status = status;
    task.error = Some(AgentFailure {
        agent_kind: task.agent_kind,
        kind,
        message,
        attempts: task.attempts,
    });
}
