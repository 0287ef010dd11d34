//! Built-in commands known to the shell at compile time.
//!
//! Builtins are parsed with [`argh`] (`FromArgs`) so each one carries its own
//! argument-arity contract, and they execute directly in-process: no child is
//! spawned and their effects (directory changes, the eof flag, history
//! edits) land on the shell's own state. Argument errors are reported as
//! warnings and abort only the builtin invocation, never the shell.

use crate::env::Environment;
use crate::history::HistoryStore;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::Path;

/// Conventional process exit code: 0 for success, non-zero for failure.
pub type ExitCode = i32;

pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd"; keys the dispatch table.
    fn name() -> &'static str;

    /// Executes the command against the shell's own state.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        history: &mut dyn HistoryStore,
    ) -> Result<ExitCode>;
}

/// Whether `name` is handled in-process instead of resolved via PATH.
pub fn is_builtin(name: &str) -> bool {
    name == Exit::name() || name == Pwd::name() || name == Cd::name() || name == History::name()
}

/// Dispatch a builtin invocation. Returns `None` when `argv[0]` is not a
/// builtin name.
pub fn dispatch(
    argv: &[String],
    stdout: &mut dyn Write,
    env: &mut Environment,
    history: &mut dyn HistoryStore,
) -> Option<ExitCode> {
    let (name, rest) = argv.split_first()?;
    let name = name.as_str();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let code = if name == Exit::name() {
        run::<Exit>(&args, stdout, env, history)
    } else if name == Pwd::name() {
        run::<Pwd>(&args, stdout, env, history)
    } else if name == Cd::name() {
        // argh would read the bare dash as a flag, so route it around the
        // parser; the arity contract (exactly one argument) still holds
        if args == ["-"] {
            finish(
                Cd {
                    target: "-".to_string(),
                },
                stdout,
                env,
                history,
            )
        } else {
            run::<Cd>(&args, stdout, env, history)
        }
    } else if name == History::name() {
        run::<History>(&args, stdout, env, history)
    } else {
        return None;
    };
    Some(code)
}

fn run<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    env: &mut Environment,
    history: &mut dyn HistoryStore,
) -> ExitCode {
    match T::from_args(&[T::name()], args) {
        Ok(command) => finish(command, stdout, env, history),
        Err(EarlyExit { output, status }) => {
            if status.is_ok() {
                // --help and friends
                let _ = stdout.write_all(output.as_bytes());
                0
            } else {
                eprintln!("{}: {}", T::name(), output.trim_end());
                1
            }
        }
    }
}

fn finish<T: BuiltinCommand>(
    command: T,
    stdout: &mut dyn Write,
    env: &mut Environment,
    history: &mut dyn HistoryStore,
) -> ExitCode {
    match command.execute(stdout, env, history) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    }
}

#[derive(FromArgs)]
/// Terminate the shell after the current sequence.
struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &mut dyn HistoryStore,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &mut dyn HistoryStore,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir()?.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
struct Cd {
    #[argh(positional)]
    /// target directory, or `-` to switch back to the previous one
    target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &mut dyn HistoryStore,
    ) -> Result<ExitCode> {
        if self.target == "-" {
            env.swap_dirs()?;
        } else {
            env.change_dir(Path::new(&self.target))?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the recorded input lines.
struct History {
    #[argh(switch, short = 'c')]
    /// clear the recorded history instead of listing it
    clear: bool,
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        history: &mut dyn HistoryStore,
    ) -> Result<ExitCode> {
        if self.clear {
            history.clear()?;
            return Ok(0);
        }
        for (i, line) in history.entries().iter().enumerate() {
            writeln!(stdout, "{}: {}", i + 1, line)?;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemHistory;
    use crate::testutil::{lock_current_dir, make_unique_temp_dir};

    fn strings(argv: &[&str]) -> Vec<String> {
        argv.iter().map(|s| s.to_string()).collect()
    }

    fn run_builtin(
        argv: &[&str],
        env: &mut Environment,
        history: &mut dyn HistoryStore,
    ) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code =
            dispatch(&strings(argv), &mut out, env, history).expect("expected a builtin name");
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn builtin_table_is_fixed() {
        for name in ["exit", "pwd", "cd", "history"] {
            assert!(is_builtin(name), "{name} should be a builtin");
        }
        assert!(!is_builtin("ls"));
        assert!(!is_builtin("echo"));
    }

    #[test]
    fn help_output_is_titled_with_the_builtin_name() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, out) = run_builtin(&["cd", "--help"], &mut env, &mut history);
        assert_eq!(code, 0);
        assert!(out.contains("cd"), "help text: {out:?}");
    }

    #[test]
    fn unknown_name_is_not_dispatched() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let mut out = Vec::new();
        assert!(dispatch(&strings(&["ls"]), &mut out, &mut env, &mut history).is_none());
    }

    #[test]
    fn exit_sets_the_eof_flag() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, _) = run_builtin(&["exit"], &mut env, &mut history);
        assert_eq!(code, 0);
        assert!(env.should_exit);
    }

    #[test]
    fn exit_with_arguments_is_rejected_and_flag_stays_clear() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, _) = run_builtin(&["exit", "now"], &mut env, &mut history);
        assert_eq!(code, 1);
        assert!(!env.should_exit);
    }

    #[test]
    fn pwd_prints_the_cached_directory() {
        let _lock = lock_current_dir();
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, out) = run_builtin(&["pwd"], &mut env, &mut history);
        assert_eq!(code, 0);
        let expected = format!("{}\n", std::env::current_dir().unwrap().display());
        assert_eq!(out, expected);
    }

    #[test]
    fn pwd_rejects_arguments() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, _) = run_builtin(&["pwd", "x"], &mut env, &mut history);
        assert_eq!(code, 1);
    }

    #[test]
    fn cd_dash_swaps_the_two_most_recent_directories() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let first = make_unique_temp_dir("cd_first").unwrap();
        let second = make_unique_temp_dir("cd_second").unwrap();

        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let first_arg = first.to_string_lossy().to_string();
        let second_arg = second.to_string_lossy().to_string();

        let (code, _) = run_builtin(&["cd", &first_arg], &mut env, &mut history);
        assert_eq!(code, 0);
        let (code, _) = run_builtin(&["cd", &second_arg], &mut env, &mut history);
        assert_eq!(code, 0);

        let (code, _) = run_builtin(&["cd", "-"], &mut env, &mut history);
        assert_eq!(code, 0);
        let (_, out) = run_builtin(&["pwd"], &mut env, &mut history);
        assert_eq!(out, format!("{}\n", first.display()));

        std::env::set_current_dir(&orig).unwrap();
        let _ = std::fs::remove_dir_all(&first);
        let _ = std::fs::remove_dir_all(&second);
    }

    #[test]
    fn cd_wrong_arity_is_an_argument_error() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, _) = run_builtin(&["cd"], &mut env, &mut history);
        assert_eq!(code, 1);
        let (code, _) = run_builtin(&["cd", "a", "b"], &mut env, &mut history);
        assert_eq!(code, 1);
    }

    #[test]
    fn cd_to_missing_directory_fails_without_corrupting_state() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let missing = format!("missing_{}", std::process::id());
        let (code, _) = run_builtin(&["cd", &missing], &mut env, &mut history);
        assert_eq!(code, 1);
        assert_eq!(std::env::current_dir().unwrap(), orig);
        let (_, out) = run_builtin(&["pwd"], &mut env, &mut history);
        assert_eq!(out, format!("{}\n", orig.display()));
    }

    #[test]
    fn history_lists_numbered_entries() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        history.record("pwd").unwrap();
        history.record("history").unwrap();
        let (code, out) = run_builtin(&["history"], &mut env, &mut history);
        assert_eq!(code, 0);
        assert_eq!(out, "1: pwd\n2: history\n");
    }

    #[test]
    fn history_clear_then_list_shows_only_the_new_invocation() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        history.record("pwd").unwrap();
        history.record("history -c").unwrap();
        let (code, out) = run_builtin(&["history", "-c"], &mut env, &mut history);
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert!(history.entries().is_empty());

        // the read loop records the next line before it runs
        history.record("history").unwrap();
        let (_, out) = run_builtin(&["history"], &mut env, &mut history);
        assert_eq!(out, "1: history\n");
    }

    #[test]
    fn history_rejects_stray_arguments() {
        let mut env = Environment::new();
        let mut history = MemHistory::new();
        let (code, _) = run_builtin(&["history", "5"], &mut env, &mut history);
        assert_eq!(code, 1);
    }
}
