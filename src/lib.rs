//! The execution core of an interactive command shell.
//!
//! A line of input is lexed and parsed into a tree of sequences, pipelines
//! and commands, then realized as operating-system processes with their
//! standard streams wired together. The grammar is a minimal subset of the
//! POSIX shell: words, `|` pipelines, `;` sequencing, `&` backgrounding and
//! `<`/`>` redirection — no quoting, expansion or substitution.
//!
//! The main entry point is [`Interpreter`], which owns the shell-global
//! state and executes parsed trees. Line editing and history persistence are
//! external collaborators: the binary drives a rustyline editor, which the
//! core only sees through the [`history::HistoryStore`] trait.

mod builtin;
pub mod env;
mod exec;
pub mod history;
mod interpreter;
mod jobs;
mod lexer;
pub mod parser;

pub use interpreter::Interpreter;
pub use parser::{ParseError, Tree, parse_line};
