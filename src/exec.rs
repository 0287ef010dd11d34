//! Realizes runtime pipelines as operating-system processes.
//!
//! Each pipeline stage is spawned left-to-right with `std::process`: stage
//! *i* gets `Stdio::piped()` stdout and the resulting [`ChildStdout`] read
//! end becomes stage *i+1*'s stdin, so a stage is always fully spawned (pipe
//! ends connected) before the next one starts. Handing the read end to the
//! next spawn moves it out of the shell, which closes the shell's copy and
//! lets EOF propagate when a writer exits.

use crate::builtin;
use crate::env::Environment;
use crate::history::HistoryStore;
use crate::jobs::{JobId, Jobs};
use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::process::{ChildStdout, Command as OsCommand, Stdio};

/// Resolved argv plus the builtin/external decision made at lowering time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    pub argv: Vec<String>,
    pub builtin: bool,
}

/// One executable pipeline: its commands, the foreground flag and the
/// redirect targets carried over from the AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPipeline {
    pub commands: Vec<RunCommand>,
    pub foreground: bool,
    pub input: Option<String>,
    pub output: Option<String>,
}

impl RunPipeline {
    /// Rendered command line, used as the job label.
    pub fn command_line(&self) -> String {
        self.commands
            .iter()
            .map(|command| command.argv.join(" "))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Pipelines awaiting execution, consumed left-to-right.
#[derive(Debug)]
pub struct RunSequence {
    pub pipelines: Vec<RunPipeline>,
}

/// Execute every pipeline of the sequence in order. Dispatch stops early
/// once the eof flag is set, so `exit ; whatever` never runs `whatever`.
pub fn exec_sequence(
    sequence: RunSequence,
    stdout: &mut dyn Write,
    env: &mut Environment,
    jobs: &mut Jobs,
    history: &mut dyn HistoryStore,
) -> Result<()> {
    for pipeline in sequence.pipelines {
        if env.should_exit {
            break;
        }
        exec_pipeline(pipeline, stdout, env, jobs, history)?;
    }
    Ok(())
}

fn exec_pipeline(
    pipeline: RunPipeline,
    stdout: &mut dyn Write,
    env: &mut Environment,
    jobs: &mut Jobs,
    history: &mut dyn HistoryStore,
) -> Result<()> {
    // Resolve redirect files up front: a pipeline whose redirect target
    // cannot be opened is aborted before anything is spawned.
    let mut input_file = match &pipeline.input {
        Some(path) => match File::open(path) {
            Ok(file) => Some(file),
            Err(err) => {
                eprintln!("{path}: {err}");
                return Ok(());
            }
        },
        None => None,
    };
    let mut output_file = match &pipeline.output {
        Some(path) => match File::create(path) {
            Ok(file) => Some(file),
            Err(err) => {
                eprintln!("{path}: {err}");
                return Ok(());
            }
        },
        None => None,
    };

    let label = pipeline.command_line();
    let mut job: Option<JobId> = None;
    let mut prev: Option<ChildStdout> = None;
    let last = pipeline.commands.len().saturating_sub(1);

    for (i, command) in pipeline.commands.iter().enumerate() {
        if env.should_exit {
            break;
        }
        if command.argv.is_empty() {
            // can only arise from hand-built trees
            continue;
        }

        if job.is_none() {
            job = Some(jobs.register(label.clone(), !pipeline.foreground));
        }

        if pipeline.foreground && command.builtin {
            // In-process; a builtin stage does not feed the pipe chain, so
            // an upstream writer sees its reader close.
            prev = None;
            // a builtin closing the pipeline honors the `>` target the same
            // way an external last stage would
            let redirect = if i == last { output_file.take() } else { None };
            match redirect {
                Some(mut file) => {
                    let _ = builtin::dispatch(&command.argv, &mut file, env, history);
                }
                None => {
                    let _ = builtin::dispatch(&command.argv, stdout, env, history);
                }
            }
            continue;
        }

        let stdin = match prev.take() {
            Some(upstream) => Stdio::from(upstream),
            None if i == 0 => match input_file.take() {
                Some(file) => Stdio::from(file),
                None => Stdio::inherit(),
            },
            // upstream stage was a builtin or failed to spawn
            None => Stdio::null(),
        };
        let stage_stdout = if i < last {
            Stdio::piped()
        } else {
            match output_file.take() {
                Some(file) => Stdio::from(file),
                None => Stdio::inherit(),
            }
        };

        let mut os_command = OsCommand::new(&command.argv[0]);
        os_command
            .args(&command.argv[1..])
            .stdin(stdin)
            .stdout(stage_stdout);

        match os_command.spawn() {
            Ok(mut child) => {
                prev = child.stdout.take();
                if let Some(id) = job {
                    jobs.attach(id, child);
                }
            }
            Err(err) => {
                // only this stage dies; the shell and later stages go on
                eprintln!("{}: {err}", command.argv[0]);
            }
        }
    }

    // A leftover read end (failed or builtin tail stage) must close before
    // waiting, or a blocked writer would never exit.
    drop(prev);

    if pipeline.foreground {
        if let Some(id) = job {
            jobs.wait_foreground(id);
        }
    }
    Ok(())
}
