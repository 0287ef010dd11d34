//! Registry of in-flight pipelines and their spawned processes.
//!
//! Every dispatched pipeline is registered exactly once. Foreground jobs are
//! waited on synchronously and removed; background jobs stay in the registry
//! until a non-blocking poll observes that every one of their processes has
//! terminated, so finished children are reaped without ever stalling the
//! prompt loop.

use std::collections::VecDeque;
use std::fmt;
use std::process::Child;

/// Identity of a registered pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Done,
}

#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    /// The rendered command line, for reports and diagnostics.
    pub command_line: String,
    pub background: bool,
    state: JobState,
    children: Vec<Child>,
}

impl Job {
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Non-blocking check: drop children that have terminated and mark the
    /// job done once none remain. A wait error counts as terminated — the
    /// handle is unusable either way.
    fn poll(&mut self) -> JobState {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(_) => false,
        });
        if self.children.is_empty() {
            self.state = JobState::Done;
        }
        self.state
    }
}

#[derive(Debug, Default)]
pub struct Jobs {
    entries: VecDeque<Job>,
    next_id: usize,
}

impl Jobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly dispatched pipeline. The executor calls this once
    /// per pipeline, right before its first command is dispatched.
    pub fn register(&mut self, command_line: String, background: bool) -> JobId {
        self.next_id += 1;
        let id = JobId(self.next_id);
        self.entries.push_back(Job {
            id,
            command_line,
            background,
            state: JobState::Running,
            children: Vec::new(),
        });
        id
    }

    /// Hand a spawned process over to its job.
    pub fn attach(&mut self, id: JobId, child: Child) {
        if let Some(job) = self.entries.iter_mut().find(|job| job.id == id) {
            job.children.push(child);
        }
    }

    /// Block until every process of the job has terminated, then remove the
    /// entry. Used for foreground pipelines only.
    pub fn wait_foreground(&mut self, id: JobId) {
        let Some(pos) = self.entries.iter().position(|job| job.id == id) else {
            return;
        };
        let Some(mut job) = self.entries.remove(pos) else {
            return;
        };
        for child in &mut job.children {
            if let Err(err) = child.wait() {
                eprintln!("wait: {err}");
            }
        }
    }

    /// Poll every background entry without blocking; entries whose processes
    /// have all terminated are removed and returned so the caller can report
    /// them.
    pub fn reap_finished(&mut self) -> Vec<Job> {
        let mut done = Vec::new();
        let mut still_running = VecDeque::with_capacity(self.entries.len());
        for mut job in self.entries.drain(..) {
            if job.poll() == JobState::Done {
                done.push(job);
            } else {
                still_running.push_back(job);
            }
        }
        self.entries = still_running;
        done
    }

    /// Still-registered jobs, oldest first.
    pub fn running(&self) -> impl Iterator<Item = &Job> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
