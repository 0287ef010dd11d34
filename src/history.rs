//! The line-history collaborator boundary.
//!
//! The core records every non-empty submitted line and the `history` builtin
//! enumerates or clears the store, but how (and whether) the lines persist is
//! the collaborator's business. In the binary the collaborator is the
//! rustyline editor; tests and embedders can use [`MemHistory`].

use anyhow::Result;

pub trait HistoryStore {
    /// Record one submitted input line.
    fn record(&mut self, line: &str) -> Result<()>;

    /// All recorded lines, oldest first.
    fn entries(&self) -> Vec<String>;

    /// Forget everything recorded so far.
    fn clear(&mut self) -> Result<()>;
}

/// Volatile in-memory store.
#[derive(Debug, Default)]
pub struct MemHistory {
    lines: Vec<String>,
}

impl MemHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemHistory {
    fn record(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn entries(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }
}

/// Any rustyline editor doubles as the history collaborator, so the `history`
/// builtin sees exactly the entries the line editor navigates with the arrow
/// keys.
impl<H: rustyline::Helper, I: rustyline::history::History> HistoryStore
    for rustyline::Editor<H, I>
{
    fn record(&mut self, line: &str) -> Result<()> {
        self.add_history_entry(line)?;
        Ok(())
    }

    fn entries(&self) -> Vec<String> {
        use rustyline::history::SearchDirection;
        let history = self.history();
        (0..history.len())
            .filter_map(|i| history.get(i, SearchDirection::Forward).ok().flatten())
            .map(|found| found.entry.into_owned())
            .collect()
    }

    fn clear(&mut self) -> Result<()> {
        self.clear_history()?;
        Ok(())
    }
}
