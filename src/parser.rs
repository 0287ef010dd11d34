//! Recursive-descent parser producing the shell's abstract syntax tree.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! sequence  := pipeline ( ('&' | ';') sequence )?
//! pipeline  := command ( redirect )* ( '|' pipeline )?
//! redirect  := '>' word | '<' word
//! command   := word+
//! ```
//!
//! One method per rule; a rule returning `None` means "no more input at this
//! level", not an error. Anything left unconsumed after the top-level
//! sequence is a parse error carrying the offending byte offset.

use crate::lexer::{self, Token, Tokens};
use thiserror::Error;

/// Errors raised while building the AST. Each variant carries the byte
/// offset of the token that triggered it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar required a specific construct that is not there.
    #[error("expected {expected} (pos: {pos})")]
    Expected { expected: String, pos: usize },

    /// A `<` or `>` operator with no word after it.
    #[error("missing redirection target (pos: {pos})")]
    MissingRedirectTarget { pos: usize },

    /// Tokens remained after a complete sequence was parsed.
    #[error("extra characters at end of input (pos: {pos})")]
    TrailingInput { pos: usize },
}

/// One program invocation: the first word is the program or builtin name,
/// the rest are its arguments. The parser never produces an empty `words`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub words: Vec<String>,
}

/// One or more commands connected by `|`, plus optional redirections.
/// `input` feeds the first stage, `output` receives the last stage; when an
/// operator is repeated the last target wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// The operator trailing a pipeline inside a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOp {
    /// `&`: the shell does not wait for the pipeline.
    Background,
    /// `;`: the shell waits, then moves on to the next pipeline.
    Sequential,
}

/// An ordered list of pipelines, each tagged with the operator that followed
/// it (`None` at end of line, which behaves like `;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub pipelines: Vec<(Pipeline, Option<SequenceOp>)>,
}

/// The root of a parsed line.
pub type Tree = Sequence;

/// Parse one input line. Returns `Ok(None)` for blank input.
pub fn parse_line(line: &str) -> Result<Option<Tree>, ParseError> {
    let mut tokens = lexer::tokenize(line);
    let tree = Parser {
        tokens: &mut tokens,
    }
    .sequence()?;
    if tokens.current().is_some() {
        return Err(ParseError::TrailingInput {
            pos: tokens.offset(),
        });
    }
    Ok(tree)
}

struct Parser<'a> {
    tokens: &'a mut Tokens,
}

impl Parser<'_> {
    fn word(&mut self) -> Option<String> {
        match self.tokens.current() {
            Some(Token::Word(_)) => match self.tokens.advance() {
                Some(Token::Word(w)) => Some(w),
                _ => None,
            },
            _ => None,
        }
    }

    fn command(&mut self) -> Option<Command> {
        let mut words = Vec::new();
        while let Some(word) = self.word() {
            words.push(word);
        }
        if words.is_empty() {
            None
        } else {
            Some(Command { words })
        }
    }

    fn pipeline(&mut self) -> Result<Option<Pipeline>, ParseError> {
        let first = match self.command() {
            Some(command) => command,
            None => return Ok(None),
        };
        let mut pipeline = Pipeline {
            commands: vec![first],
            input: None,
            output: None,
        };

        loop {
            match self.tokens.current() {
                Some(Token::Pipe) => {
                    self.tokens.expect(&Token::Pipe)?;
                    let pos = self.tokens.offset();
                    match self.command() {
                        Some(command) => pipeline.commands.push(command),
                        None => {
                            return Err(ParseError::Expected {
                                expected: "a command after '|'".to_string(),
                                pos,
                            });
                        }
                    }
                }
                Some(Token::RedirectOut) => {
                    self.tokens.expect(&Token::RedirectOut)?;
                    let pos = self.tokens.offset();
                    pipeline.output =
                        Some(self.word().ok_or(ParseError::MissingRedirectTarget { pos })?);
                }
                Some(Token::RedirectIn) => {
                    self.tokens.expect(&Token::RedirectIn)?;
                    let pos = self.tokens.offset();
                    pipeline.input =
                        Some(self.word().ok_or(ParseError::MissingRedirectTarget { pos })?);
                }
                _ => break,
            }
        }
        Ok(Some(pipeline))
    }

    fn sequence(&mut self) -> Result<Option<Sequence>, ParseError> {
        let mut pipelines = Vec::new();
        while let Some(pipeline) = self.pipeline()? {
            let op = if self.tokens.eat(&Token::Background) {
                Some(SequenceOp::Background)
            } else if self.tokens.eat(&Token::Semi) {
                Some(SequenceOp::Sequential)
            } else {
                None
            };
            let done = op.is_none();
            pipelines.push((pipeline, op));
            if done {
                break;
            }
        }
        if pipelines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Sequence { pipelines }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Tree {
        parse_line(line)
            .expect("parse failed")
            .expect("expected a tree")
    }

    fn words(command: &Command) -> Vec<&str> {
        command.words.iter().map(String::as_str).collect()
    }

    #[test]
    fn blank_input_produces_no_tree() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \t  ").unwrap(), None);
    }

    #[test]
    fn words_round_trip_in_order() {
        let line = "prog one two three four";
        let tree = parse(line);
        let (pipeline, op) = &tree.pipelines[0];
        assert_eq!(op, &None);
        let rejoined = pipeline.commands[0].words.join(" ");
        assert_eq!(rejoined, line);
    }

    #[test]
    fn three_stage_pipeline_keeps_order() {
        let tree = parse("cmd1 a | cmd2 | cmd3 b c");
        assert_eq!(tree.pipelines.len(), 1);
        let (pipeline, _) = &tree.pipelines[0];
        assert_eq!(pipeline.commands.len(), 3);
        assert_eq!(words(&pipeline.commands[0]), ["cmd1", "a"]);
        assert_eq!(words(&pipeline.commands[1]), ["cmd2"]);
        assert_eq!(words(&pipeline.commands[2]), ["cmd3", "b", "c"]);
    }

    #[test]
    fn semicolons_make_three_singleton_pipelines() {
        let tree = parse("a ; b ; c");
        assert_eq!(tree.pipelines.len(), 3);
        for (pipeline, _) in &tree.pipelines {
            assert_eq!(pipeline.commands.len(), 1);
        }
        assert_eq!(tree.pipelines[0].1, Some(SequenceOp::Sequential));
        assert_eq!(tree.pipelines[1].1, Some(SequenceOp::Sequential));
        assert_eq!(tree.pipelines[2].1, None);
    }

    #[test]
    fn ampersand_tags_background() {
        let tree = parse("sleep 5 & pwd");
        assert_eq!(tree.pipelines.len(), 2);
        assert_eq!(tree.pipelines[0].1, Some(SequenceOp::Background));
        assert_eq!(tree.pipelines[1].1, None);
    }

    #[test]
    fn trailing_operator_is_allowed() {
        let tree = parse("work &");
        assert_eq!(tree.pipelines.len(), 1);
        assert_eq!(tree.pipelines[0].1, Some(SequenceOp::Background));
    }

    #[test]
    fn redirects_attach_to_the_pipeline() {
        let tree = parse("sort < in.txt | uniq > out.txt");
        let (pipeline, _) = &tree.pipelines[0];
        assert_eq!(pipeline.commands.len(), 2);
        assert_eq!(pipeline.input.as_deref(), Some("in.txt"));
        assert_eq!(pipeline.output.as_deref(), Some("out.txt"));
    }

    #[test]
    fn repeated_redirect_last_one_wins() {
        let tree = parse("cmd > a > b");
        let (pipeline, _) = &tree.pipelines[0];
        assert_eq!(pipeline.output.as_deref(), Some("b"));
    }

    #[test]
    fn dangling_pipe_is_an_error() {
        let err = parse_line("cmd |").unwrap_err();
        assert_eq!(
            err,
            ParseError::Expected {
                expected: "a command after '|'".to_string(),
                pos: 5,
            }
        );
    }

    #[test]
    fn missing_redirect_target_is_an_error() {
        let err = parse_line("cmd >").unwrap_err();
        assert_eq!(err, ParseError::MissingRedirectTarget { pos: 5 });
    }

    #[test]
    fn leading_operator_reports_its_offset() {
        let err = parse_line("| cmd").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput { pos: 0 });
    }

    #[test]
    fn stray_tokens_after_sequence_report_their_offset() {
        // after "a ;" the second pipeline is empty, so the '|' at byte 4
        // is left over
        let err = parse_line("a ; | b").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput { pos: 4 });
    }

    #[test]
    fn parse_errors_render_with_position() {
        let err = parse_line("| x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "extra characters at end of input (pos: 0)"
        );
    }
}
