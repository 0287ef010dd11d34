//! Lexical analysis for shell input lines.
//!
//! A line is split into [`Token`]s: words (maximal runs of non-blank,
//! non-operator characters) and the five single-character operators
//! `|` `&` `;` `<` `>`. An operator character always terminates the word
//! being scanned, so `a|b` lexes as three tokens. Every token remembers the
//! byte offset it started at, which the parser reports in diagnostics.

use crate::parser::ParseError;
use std::fmt;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word: command name, argument or redirection target.
    Word(String),
    /// The pipe operator, `|`.
    Pipe,
    /// The backgrounding operator, `&`.
    Background,
    /// The sequencing operator, `;`.
    Semi,
    /// Input redirection, `<`.
    RedirectIn,
    /// Output redirection, `>`.
    RedirectOut,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::Pipe => write!(f, "|"),
            Token::Background => write!(f, "&"),
            Token::Semi => write!(f, ";"),
            Token::RedirectIn => write!(f, "<"),
            Token::RedirectOut => write!(f, ">"),
        }
    }
}

fn operator(ch: char) -> Option<Token> {
    match ch {
        '|' => Some(Token::Pipe),
        '&' => Some(Token::Background),
        ';' => Some(Token::Semi),
        '<' => Some(Token::RedirectIn),
        '>' => Some(Token::RedirectOut),
        _ => None,
    }
}

/// Cursor over the tokens of one input line.
///
/// `offset` reports the byte position of the token under the cursor (or the
/// end of the line once all tokens are consumed), used for error messages.
#[derive(Debug)]
pub struct Tokens {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl Tokens {
    /// Peek at the current token without consuming it.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it equals `token`.
    pub fn eat(&mut self, token: &Token) -> bool {
        if self.current() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the current token, failing when it is not `token`.
    pub fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected: format!("'{token}'"),
                pos: self.offset(),
            })
        }
    }

    /// Byte offset of the current token, or of the end of input.
    pub fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, offset)| *offset)
            .unwrap_or(self.end)
    }
}

/// Split an input line into tokens. Tokenization itself cannot fail: the
/// grammar has no quoting or escaping, so any character sequence lexes.
pub fn tokenize(line: &str) -> Tokens {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, ch) in line.char_indices() {
        let op = operator(ch);
        if ch.is_whitespace() || op.is_some() {
            if let Some(start) = word_start.take() {
                tokens.push((Token::Word(line[start..i].to_string()), start));
            }
            if let Some(op) = op {
                tokens.push((op, i));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        tokens.push((Token::Word(line[start..].to_string()), start));
    }

    Tokens {
        tokens,
        pos: 0,
        end: line.len(),
    }
}
