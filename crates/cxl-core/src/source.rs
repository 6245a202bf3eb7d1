//! Character sources feeding the lexer.
//!
//! A [`Source`] hands out one character at a time with lazy advancing: asking
//! to advance only marks that the next read must fetch a new character. This
//! lets the lexer look at a character without committing to it, and lets an
//! interactive session block for input only when a token really needs it.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;

use crate::error::SourceError;
use crate::span::Position;

/// Character returned once the source is exhausted.
pub const END_OF_TEXT: char = '\0';

/// The character stream consumed by the lexer.
pub trait Source {
    /// Character under the cursor, reading a new one first if an advance is
    /// pending. Returns [`END_OF_TEXT`] forever once the input is exhausted.
    fn current_char(&mut self) -> char;

    /// Request an advance and read the next character.
    fn advance_and_read(&mut self) -> char {
        self.request_advance();
        self.current_char()
    }

    /// Mark the current character as consumed.
    fn request_advance(&mut self);

    /// Position of the current character within the unit.
    fn position(&self) -> Position;

    /// Forget the text of the finished unit and restart position counting.
    fn reset_unit_buffer(&mut self);

    /// Every character read since the last reset.
    fn raw_text(&self) -> &str;

    /// Take the I/O failure that ended the input early, if any.
    fn take_error(&mut self) -> Option<SourceError> {
        None
    }
}

/// Supplies input one line at a time.
pub trait LineFeed {
    /// Read the next line, including its line terminator if it has one.
    ///
    /// `continuation` is true when the unit being read already has text,
    /// which interactive feeds use to pick a prompt.
    fn next_line(&mut self, continuation: bool) -> io::Result<Option<String>>;
}

/// Line feed over any buffered reader (files, pipes, in-memory text).
#[derive(Debug)]
pub struct ReaderFeed<R> {
    reader: R,
}

impl<R: BufRead> ReaderFeed<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl ReaderFeed<BufReader<File>> {
    /// Open a program file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineFeed for ReaderFeed<R> {
    fn next_line(&mut self, _continuation: bool) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// A [`Source`] reading characters from a [`LineFeed`].
#[derive(Debug)]
pub struct CharSource<F> {
    feed: F,
    line: Vec<char>,
    cursor: usize,
    current: char,
    advance_pending: bool,
    exhausted: bool,
    position: Position,
    raw: String,
    error: Option<SourceError>,
}

impl<F: LineFeed> CharSource<F> {
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            line: Vec::new(),
            cursor: 0,
            current: END_OF_TEXT,
            advance_pending: true,
            exhausted: false,
            position: Position::default(),
            raw: String::new(),
            error: None,
        }
    }

    fn read_char(&mut self) -> char {
        loop {
            if let Some(&ch) = self.line.get(self.cursor) {
                self.cursor += 1;
                return ch;
            }
            if self.exhausted {
                return END_OF_TEXT;
            }
            match self.feed.next_line(!self.raw.is_empty()) {
                Ok(Some(line)) => {
                    self.line = normalize_line(line).chars().collect();
                    self.cursor = 0;
                }
                Ok(None) => self.exhausted = true,
                Err(error) => {
                    self.error = Some(SourceError::Read(error));
                    self.exhausted = true;
                }
            }
        }
    }
}

impl CharSource<ReaderFeed<Cursor<String>>> {
    /// Source over in-memory program text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(ReaderFeed::new(Cursor::new(text.into())))
    }
}

impl<F: LineFeed> Source for CharSource<F> {
    fn current_char(&mut self) -> char {
        if self.advance_pending {
            self.advance_pending = false;
            self.current = self.read_char();
            if self.current != END_OF_TEXT {
                self.position.advance(self.current);
                self.raw.push(self.current);
            }
        }
        self.current
    }

    fn request_advance(&mut self) {
        self.advance_pending = true;
    }

    fn position(&self) -> Position {
        self.position
    }

    fn reset_unit_buffer(&mut self) {
        self.raw.clear();
        self.position.reset();
    }

    fn raw_text(&self) -> &str {
        &self.raw
    }

    fn take_error(&mut self) -> Option<SourceError> {
        self.error.take()
    }
}

/// `\r\n` becomes `\n`, and a last line missing its terminator gets one.
fn normalize_line(mut line: String) -> String {
    if line.ends_with("\r\n") {
        line.truncate(line.len() - 2);
        line.push('\n');
    } else if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}
