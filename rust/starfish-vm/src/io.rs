//! Collaborators the VM talks to: console input and output, the wall clock,
//! and the pacer that performs requested pauses.
//!
//! The VM owns boxed trait objects for each of these and never hands them
//! a reference to its own state.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

/// Byte source for the `i` instruction. `Ok(None)` means end of stream.
pub trait InputSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Sink for `o` and `n`.
pub trait OutputSink {
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Local time of day, as pushed by `h`, `m`, and `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

pub trait Clock {
    fn now(&self) -> TimeOfDay;
}

/// Performs the pauses the VM asks for (`S` and the inter-tick delay).
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

// ─── Input ───

/// Reads one byte at a time from any reader, blocking until data arrives.
pub struct ReaderInput<R: Read> {
    reader: R,
}

impl<R: Read> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> InputSource for ReaderInput<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pre-loaded input, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}

impl ScriptedInput {
    pub fn new(text: &str) -> Self {
        Self {
            bytes: text.bytes().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}

// ─── Output ───

/// Writes through to any `io::Write`.
pub struct WriterOutput<W: Write> {
    writer: W,
}

impl<W: Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputSink for WriterOutput<W> {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Captures output in memory. Clones share the same buffer, so a test can
/// keep one handle and give the other to the VM.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    buffer: Rc<RefCell<String>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl OutputSink for SharedOutput {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.buffer.borrow_mut().push_str(text);
        Ok(())
    }
}

// ─── Clock ───

/// The system's local time, via chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> TimeOfDay {
        use chrono::Timelike;
        let now = chrono::Local::now();
        TimeOfDay {
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub TimeOfDay);

impl Clock for FixedClock {
    fn now(&self) -> TimeOfDay {
        self.0
    }
}

// ─── Pacing ───

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}
