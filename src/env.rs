//! Shell-global working-directory state.
//!
//! The original shell kept the current and previous directory in
//! process-wide globals mutated by `cd`; here they live in an explicit
//! [`Environment`] value owned by the interpreter, so the lifecycle is
//! visible and testable. Both directories start unset and the current one is
//! captured from the OS the first time `pwd` or `cd` needs it.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct Environment {
    current_dir: Option<PathBuf>,
    previous_dir: Option<PathBuf>,
    /// Set by the `exit` builtin; the read loop terminates once it is true.
    pub should_exit: bool,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached current working directory, captured from the process on
    /// first use.
    pub fn current_dir(&mut self) -> Result<&Path> {
        if self.current_dir.is_none() {
            let dir = std::env::current_dir().context("cannot determine working directory")?;
            self.current_dir = Some(dir);
        }
        // populated just above
        Ok(self.current_dir.as_deref().unwrap_or(Path::new(".")))
    }

    /// Change to `target`, updating the process cwd so spawned children
    /// inherit it. On failure neither directory is touched.
    pub fn change_dir(&mut self, target: &Path) -> Result<()> {
        let from = self.current_dir()?.to_path_buf();
        let resolved = if target.is_absolute() {
            target.to_path_buf()
        } else {
            from.join(target)
        };
        let canonical = std::fs::canonicalize(&resolved)
            .with_context(|| format!("cd: {}", resolved.display()))?;
        std::env::set_current_dir(&canonical)
            .with_context(|| format!("cd: {}", canonical.display()))?;
        self.previous_dir = Some(from);
        self.current_dir = Some(canonical);
        Ok(())
    }

    /// `cd -`: swap the current and previous directories.
    pub fn swap_dirs(&mut self) -> Result<()> {
        let previous = self
            .previous_dir
            .clone()
            .ok_or_else(|| anyhow!("cd: no previous directory"))?;
        let current = self.current_dir()?.to_path_buf();
        std::env::set_current_dir(&previous)
            .with_context(|| format!("cd: {}", previous.display()))?;
        self.current_dir = Some(previous);
        self.previous_dir = Some(current);
        Ok(())
    }
}
