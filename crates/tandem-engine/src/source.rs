//! Line sources for the command loop.
//!
//! The command thread pulls one line at a time and blocks between
//! lines, so a source is anything that can hand out the next line or
//! report the end of input: a buffered reader (stdin, a file), a
//! crossbeam channel fed by another thread, or a fixed list of lines
//! (init scripts) optionally followed by another source.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crossbeam_channel::Receiver;

/// Supplier of shell input, one line per call.
pub trait LineSource: Send {
    /// Next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl LineSource for Box<dyn LineSource> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }
}

/// Lines from any buffered reader.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead + Send> ReaderSource<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Lines sent over a channel. Input ends when every sender is dropped.
pub struct ChannelSource {
    rx: Receiver<String>,
}

impl ChannelSource {
    /// Create a source together with the sender that feeds it.
    pub fn unbounded() -> (crossbeam_channel::Sender<String>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self { rx })
    }

    /// Wrap an existing receiver.
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

impl LineSource for ChannelSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.rx.recv().ok())
    }
}

/// A fixed list of lines, then (optionally) another source.
///
/// Used to run init scripts through the same pause/evaluate/resume
/// cycle as interactive input before handing over to stdin.
pub struct ScriptedSource {
    pending: VecDeque<String>,
    tail: Option<Box<dyn LineSource>>,
}

impl ScriptedSource {
    /// A source that yields `lines` and then ends.
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            pending: lines.into_iter().map(Into::into).collect(),
            tail: None,
        }
    }

    /// Continue with `tail` once the scripted lines are exhausted.
    pub fn followed_by(mut self, tail: impl LineSource + 'static) -> Self {
        self.tail = Some(Box::new(tail));
        self
    }

    /// Number of scripted lines not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl LineSource for ScriptedSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }
        match self.tail.as_mut() {
            Some(tail) => tail.next_line(),
            None => Ok(None),
        }
    }
}
