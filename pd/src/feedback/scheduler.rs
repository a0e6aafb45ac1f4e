//! Feedback Cycle Scheduler
//!
//! One cycle at a time: detect, materialize, convert, simulate commits,
//! score. A tick that arrives while a cycle is active is skipped.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::score::feedback_score;
use crate::converter::OpportunityConverter;
use crate::domain::{CycleStatus, FeedbackCycle, RepositoryActivity, short_hex};
use crate::driver::Tick;
use crate::error::CoordError;
use crate::events::{CoordEvent, EventBus};
use crate::repo::RepositoryHost;
use crate::retention::{BoundedLog, REPOSITORY_ACTIVITY_RETENTION};
use crate::store::Store;
use crate::strategy::{CandidateOpportunity, OpportunityDetector};

/// Metric kind written once per finished cycle
pub const CYCLE_METRIC_KIND: &str = "feedback_cycle";

/// Result of asking the scheduler to run a cycle
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Another cycle was active
    Skipped { active_sequence: Option<u64> },
    /// The cycle reached a terminal state
    Finished(FeedbackCycle),
}

impl CycleOutcome {
    pub fn cycle(&self) -> Option<&FeedbackCycle> {
        match self {
            CycleOutcome::Finished(cycle) => Some(cycle),
            CycleOutcome::Skipped { .. } => None,
        }
    }
}

/// Totals over every finished cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_cycles: usize,
    pub total_repositories_created: usize,
    pub total_commits: u64,
    pub average_feedback_score: f64,
    pub running: bool,
}

struct SchedulerState {
    current: Option<FeedbackCycle>,
    history: Vec<FeedbackCycle>,
    repo_activity: BoundedLog<RepositoryActivity>,
    next_sequence: u64,
    /// Repositories that exist on the host
    remote_repos: HashSet<String>,
}

/// Clears the busy flag when the cycle ends, even by panic
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct FeedbackScheduler {
    detector: Arc<dyn OpportunityDetector>,
    repo_host: Arc<dyn RepositoryHost>,
    converter: Arc<OpportunityConverter>,
    store: Arc<dyn Store>,
    events: Arc<EventBus>,
    state: Mutex<SchedulerState>,
    busy: AtomicBool,
    running: AtomicBool,
}

impl FeedbackScheduler {
    pub fn new(
        detector: Arc<dyn OpportunityDetector>,
        repo_host: Arc<dyn RepositoryHost>,
        store: Arc<dyn Store>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            detector,
            repo_host,
            converter: Arc::new(OpportunityConverter::new(store.clone())),
            store,
            events,
            state: Mutex::new(SchedulerState {
                current: None,
                history: Vec::new(),
                repo_activity: BoundedLog::new(REPOSITORY_ACTIVITY_RETENTION),
                next_sequence: 1,
                remote_repos: HashSet::new(),
            }),
            busy: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Lower the repository activity cap (never above the built-in maximum)
    pub fn with_activity_retention(self, capacity: usize) -> Self {
        self.lock().repo_activity = BoundedLog::new(capacity.min(REPOSITORY_ACTIVITY_RETENTION));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update_current(&self, f: impl FnOnce(&mut FeedbackCycle)) {
        if let Some(cycle) = self.lock().current.as_mut() {
            f(cycle);
        }
    }

    /// Run one cycle unless another is active
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let active_sequence = self.current_cycle().map(|c| c.sequence_number);
            debug!(?active_sequence, "FeedbackScheduler::run_cycle: cycle active, skipping");
            self.events.emit(CoordEvent::CycleSkipped { active_sequence });
            return CycleOutcome::Skipped { active_sequence };
        }
        let _busy = BusyGuard(&self.busy);

        let sequence = {
            let mut state = self.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.current = Some(FeedbackCycle::start(sequence));
            sequence
        };
        info!(cycle = sequence, "Feedback cycle started");
        self.events.emit(CoordEvent::CycleStarted { sequence });

        let result = AssertUnwindSafe(self.run_phases(sequence)).catch_unwind().await;
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(panic) => Some(CoordError::CycleFailure {
                sequence,
                reason: panic_message(panic.as_ref()),
            }),
        };

        let cycle = self.finish(sequence, failure);
        self.persist_metric(&cycle).await;
        CycleOutcome::Finished(cycle)
    }

    async fn run_phases(&self, sequence: u64) -> Result<(), CoordError> {
        // Detect
        let candidates = self.detector.detect();
        debug!(cycle = sequence, detected = candidates.len(), "Detect phase done");
        self.update_current(|c| c.opportunities_detected = candidates.len() as u32);

        // Materialize
        for candidate in &candidates {
            self.materialize(sequence, candidate).await;
        }

        // Convert
        let report = self
            .converter
            .convert_detected()
            .await
            .map_err(|e| CoordError::CycleFailure {
                sequence,
                reason: format!("opportunity listing failed: {}", e),
            })?;
        self.update_current(|c| c.services_created = report.services_created());

        // Simulate activity
        let commits = self.simulate_commits(sequence).await;
        self.update_current(|c| c.commits_generated = commits);

        Ok(())
    }

    async fn materialize(&self, sequence: u64, candidate: &CandidateOpportunity) {
        let repo_name = candidate.repo_name();
        let stack = candidate.tech_stack();
        let files = stack.files();
        let line_count = self.detector.line_count(candidate);

        match self
            .repo_host
            .create_repository(&repo_name, &candidate.description, &candidate.tags())
            .await
        {
            Ok(url) => {
                info!(cycle = sequence, repo = %repo_name, %url, "Repository created");
                {
                    let mut state = self.lock();
                    state.remote_repos.insert(repo_name.clone());
                    if let Some(cycle) = state.current.as_mut() {
                        cycle.repositories_created.push(url);
                    }
                }
                for path in &files {
                    let content = scaffold_file(candidate, path);
                    if let Err(e) = self.repo_host.upload_file(&repo_name, path, &content).await {
                        warn!(repo = %repo_name, %path, error = %e, "Failed to upload file");
                    }
                }
            }
            Err(e) => {
                warn!(
                    cycle = sequence,
                    repo = %repo_name,
                    host = self.repo_host.name(),
                    error = %e,
                    "Repository creation failed, recording locally"
                );
            }
        }

        let commit = format!("init-{}", short_hex(7));
        self.record_activity(RepositoryActivity::new(repo_name, commit, files, line_count));
    }

    async fn simulate_commits(&self, sequence: u64) -> u32 {
        let repos = self.known_repositories();
        if repos.is_empty() {
            debug!(cycle = sequence, "No repositories yet, skipping commit simulation");
            return 0;
        }

        let count = self.detector.commit_count();
        let mut recorded = 0;
        for _ in 0..count {
            let Some(target) = self.detector.pick_commit_target(&repos) else {
                break;
            };
            let commit = short_hex(7);
            let path = format!("updates/{}.md", commit);
            let content = format!(
                "# Update {}\n\nAutomated improvement recorded by feedback cycle {}.\n",
                commit, sequence
            );
            let line_count = content.lines().count() as u32;

            let remote = self.lock().remote_repos.contains(&target);
            if remote && let Err(e) = self.repo_host.upload_file(&target, &path, &content).await {
                warn!(repo = %target, %path, error = %e, "Failed to upload commit file");
            }

            self.record_activity(RepositoryActivity::new(target, commit, vec![path], line_count));
            recorded += 1;
        }
        debug!(cycle = sequence, commits = recorded, "Commit simulation done");
        recorded
    }

    fn record_activity(&self, activity: RepositoryActivity) {
        self.lock().repo_activity.push(activity);
    }

    /// Distinct repository names in the activity log, oldest first
    fn known_repositories(&self) -> Vec<String> {
        let state = self.lock();
        let mut seen = HashSet::new();
        state
            .repo_activity
            .iter()
            .filter(|a| seen.insert(a.repo_name.clone()))
            .map(|a| a.repo_name.clone())
            .collect()
    }

    fn finish(&self, sequence: u64, failure: Option<CoordError>) -> FeedbackCycle {
        let cycle = {
            let mut state = self.lock();
            let mut cycle = state.current.take().unwrap_or_else(|| FeedbackCycle::start(sequence));
            let completing = failure.is_none();
            cycle.feedback_score = feedback_score(
                cycle.repositories_created.len(),
                cycle.commits_generated,
                cycle.opportunities_detected,
                completing,
            );
            match &failure {
                None => cycle.complete(),
                Some(e) => cycle.fail(e.to_string()),
            }
            state.history.push(cycle.clone());
            cycle
        };

        match cycle.status {
            CycleStatus::Failed => {
                error!(cycle = sequence, error = ?cycle.error, "Feedback cycle failed");
                self.events.emit(CoordEvent::CycleFailed {
                    sequence,
                    error: cycle.error.clone().unwrap_or_default(),
                });
            }
            _ => {
                info!(
                    cycle = sequence,
                    score = cycle.feedback_score,
                    repos = cycle.repositories_created.len(),
                    commits = cycle.commits_generated,
                    services = cycle.services_created,
                    "Feedback cycle completed"
                );
                self.events.emit(CoordEvent::CycleCompleted {
                    sequence,
                    feedback_score: cycle.feedback_score,
                    duration_ms: cycle.duration_ms(),
                });
            }
        }
        cycle
    }

    async fn persist_metric(&self, cycle: &FeedbackCycle) {
        let metadata = json!({
            "sequence": cycle.sequence_number,
            "status": cycle.status,
            "repositories_created": cycle.repositories_created.len(),
            "commits_generated": cycle.commits_generated,
            "opportunities_detected": cycle.opportunities_detected,
            "services_created": cycle.services_created,
            "duration_ms": cycle.duration_ms(),
        });
        if let Err(e) = self
            .store
            .create_metric(CYCLE_METRIC_KIND, f64::from(cycle.feedback_score), metadata)
            .await
        {
            warn!(cycle = cycle.sequence_number, error = %e, "Failed to persist cycle metric");
        }
    }

    /// The active cycle, if any
    pub fn current_cycle(&self) -> Option<FeedbackCycle> {
        self.lock().current.clone()
    }

    /// Every finished cycle, oldest first
    pub fn cycle_history(&self) -> Vec<FeedbackCycle> {
        self.lock().history.clone()
    }

    /// The last `n` (at most 20) repository activity entries, most recent last
    pub fn recent_repository_activity(&self, n: usize) -> Vec<RepositoryActivity> {
        self.lock().repo_activity.recent(n.min(REPOSITORY_ACTIVITY_RETENTION))
    }

    pub fn aggregate_metrics(&self) -> AggregateMetrics {
        let state = self.lock();
        let total_cycles = state.history.len();
        let average_feedback_score = if total_cycles == 0 {
            0.0
        } else {
            state.history.iter().map(|c| f64::from(c.feedback_score)).sum::<f64>() / total_cycles as f64
        };
        AggregateMetrics {
            total_cycles,
            total_repositories_created: state.history.iter().map(|c| c.repositories_created.len()).sum(),
            total_commits: state.history.iter().map(|c| u64::from(c.commits_generated)).sum(),
            average_feedback_score,
            running: self.running.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl Tick for FeedbackScheduler {
    fn name(&self) -> &'static str {
        "feedback"
    }

    async fn tick(&self) {
        self.run_cycle().await;
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

fn scaffold_file(candidate: &CandidateOpportunity, path: &str) -> String {
    let name = candidate.repo_name();
    match path {
        "README.md" => format!("# {}\n\n{}\n", candidate.title, candidate.description),
        "Cargo.toml" => format!(
            "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2024\"\n\n[dependencies]\n",
            name
        ),
        "package.json" => format!("{{\n  \"name\": \"{}\",\n  \"version\": \"0.1.0\"\n}}\n", name),
        "requirements.txt" => String::new(),
        _ => format!("// {}\n", candidate.title),
    }
}
