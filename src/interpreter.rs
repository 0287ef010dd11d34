//! Translates parsed trees into runtime pipelines and drives execution.
//!
//! The [`Interpreter`] owns the shell-global state (working directories, eof
//! flag, job registry) and walks each [`Tree`] once: every AST pipeline
//! becomes a [`RunPipeline`] tagged foreground or background from its
//! trailing operator, and the resulting sequence is executed immediately,
//! strictly left-to-right. Backgrounding only skips the wait, never the
//! dispatch order.

use crate::builtin;
use crate::env::Environment;
use crate::exec::{self, RunCommand, RunPipeline, RunSequence};
use crate::history::HistoryStore;
use crate::jobs::Jobs;
use crate::parser::{self, SequenceOp, Tree};
use anyhow::Result;
use std::io::Write;

pub struct Interpreter {
    env: Environment,
    jobs: Jobs,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            jobs: Jobs::new(),
        }
    }

    /// Parse and execute one input line. Parse errors are reported to the
    /// error stream and recovered: the shell moves on to the next prompt.
    pub fn run_line(&mut self, line: &str, history: &mut dyn HistoryStore) -> Result<()> {
        self.run_line_with_output(line, history, &mut std::io::stdout())
    }

    /// Like [`run_line`](Self::run_line) with builtin output captured into
    /// `stdout`; external processes still inherit the shell's streams.
    pub fn run_line_with_output(
        &mut self,
        line: &str,
        history: &mut dyn HistoryStore,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        match parser::parse_line(line) {
            Ok(Some(tree)) => self.interpret_with_output(&tree, history, stdout),
            Ok(None) => Ok(()),
            Err(err) => {
                eprintln!("{err}");
                Ok(())
            }
        }
    }

    /// Execute an already-parsed tree.
    pub fn interpret(&mut self, tree: &Tree, history: &mut dyn HistoryStore) -> Result<()> {
        self.interpret_with_output(tree, history, &mut std::io::stdout())
    }

    pub fn interpret_with_output(
        &mut self,
        tree: &Tree,
        history: &mut dyn HistoryStore,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        let sequence = lower(tree);
        exec::exec_sequence(sequence, stdout, &mut self.env, &mut self.jobs, history)
    }

    /// True once the `exit` builtin has run; the read loop then terminates.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Poll background jobs without blocking and return a report line for
    /// each one that has fully terminated since the last call.
    pub fn reap_background(&mut self) -> Vec<String> {
        self.jobs
            .reap_finished()
            .into_iter()
            .map(|job| format!("[{}] done\t{}", job.id, job.command_line))
            .collect()
    }

    /// Labels of still-registered jobs, for diagnostics and tests.
    pub fn running_jobs(&self) -> Vec<String> {
        self.jobs
            .running()
            .map(|job| job.command_line.clone())
            .collect()
    }
}

fn lower(tree: &Tree) -> RunSequence {
    let mut pipelines = Vec::new();
    for (pipeline, op) in &tree.pipelines {
        let commands = pipeline
            .commands
            .iter()
            .filter(|command| !command.words.is_empty())
            .map(|command| RunCommand {
                argv: command.words.clone(),
                builtin: builtin::is_builtin(&command.words[0]),
            })
            .collect();
        // corrected operator semantics: `;` stays in the foreground, only
        // `&` releases the shell before the pipeline finishes
        let foreground = !matches!(op, Some(SequenceOp::Background));
        pipelines.push(RunPipeline {
            commands,
            foreground,
            input: pipeline.input.clone(),
            output: pipeline.output.clone(),
        });
    }
    RunSequence { pipelines }
}
