use anyhow::Result;
use minish::Interpreter;
use minish::history::HistoryStore;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::IsTerminal;

const HISTORY_FILE: &str = ".minish_history";

fn main() -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let mut editor = DefaultEditor::new()?;
    if interactive {
        // first run has no history file yet
        let _ = editor.load_history(HISTORY_FILE);
    }
    let prompt = if interactive { "$ " } else { "" };

    let mut interpreter = Interpreter::new();
    while !interpreter.should_exit() {
        for report in interpreter.reap_background() {
            println!("{report}");
        }
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.record(&line)?;
                }
                interpreter.run_line(&line, &mut editor)?;
            }
            Err(ReadlineError::Interrupted) => continue,
            // end of the input stream behaves like `exit`
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline: {err}");
                break;
            }
        }
    }

    if interactive {
        let _ = editor.save_history(HISTORY_FILE);
    }
    Ok(())
}
