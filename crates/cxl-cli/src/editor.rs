//! Line editing for interactive sessions.

use std::io;

use cxl_core::LineFeed;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "> ";
/// Shown while a unit is still open, e.g. inside a block.
const CONTINUATION_PROMPT: &str = ". ";

/// Reads lines from the terminal with history and editing.
pub struct EditorFeed {
    editor: DefaultEditor,
}

impl EditorFeed {
    pub fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new().map_err(into_io)?;
        Ok(Self { editor })
    }
}

impl LineFeed for EditorFeed {
    fn next_line(&mut self, continuation: bool) -> io::Result<Option<String>> {
        let prompt = if continuation {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        };
        match self.editor.readline(prompt) {
            Ok(mut line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).map_err(into_io)?;
                }
                line.push('\n');
                Ok(Some(line))
            }
            // Ctrl-C and Ctrl-D both end the session.
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(error) => Err(into_io(error)),
        }
    }
}

fn into_io(error: ReadlineError) -> io::Error {
    match error {
        ReadlineError::Io(error) => error,
        error => io::Error::new(io::ErrorKind::Other, error.to_string()),
    }
}
