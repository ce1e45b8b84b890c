//! Output sinks and the two-channel console that writes to them.
//!
//! The console owns the writers. A logger built with a single writer uses it
//! for both the normal and the alert channel.

use crate::{Channel, Payload};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

const GROUP_INDENT: usize = 2;

/// A writable destination for composed lines
pub type Writer = Box<dyn Write + Send>;

/// Where a logger writes its two channels
#[derive(Default)]
pub enum OutStream {
    /// stdout for the normal channel, stderr for the alert channel
    #[default]
    Stdio,
    /// One writer serving both channels
    Single(Writer),
    /// Separate writers: normal first, alert second
    Pair(Writer, Writer),
}

impl OutStream {
    pub fn single<W: Write + Send + 'static>(writer: W) -> Self {
        OutStream::Single(Box::new(writer))
    }

    pub fn pair<N, A>(normal: N, alert: A) -> Self
    where
        N: Write + Send + 'static,
        A: Write + Send + 'static,
    {
        OutStream::Pair(Box::new(normal), Box::new(alert))
    }
}

/// Console-style writer over a normal and an alert sink.
///
/// Provides the rendering the logger delegates to: plain lines, error lines
/// with raw values appended, trace lines with a stack trace, and grouping.
pub struct Console {
    normal: Writer,
    alert: Option<Writer>,
    group_indent: usize,
}

impl Console {
    pub fn new(out: OutStream) -> Self {
        let (normal, alert): (Writer, Option<Writer>) = match out {
            OutStream::Stdio => {
                let stdout: Writer = Box::new(io::stdout());
                let stderr: Writer = Box::new(io::stderr());
                (stdout, Some(stderr))
            }
            OutStream::Single(writer) => (writer, None),
            OutStream::Pair(normal, alert) => (normal, Some(alert)),
        };
        Self {
            normal,
            alert,
            group_indent: 0,
        }
    }

    /// Current grouping indentation in spaces
    pub fn group_indent(&self) -> usize {
        self.group_indent
    }

    fn writer(&mut self, channel: Channel) -> &mut Writer {
        match channel {
            Channel::Alert => self.alert.as_mut().unwrap_or(&mut self.normal),
            Channel::Normal => &mut self.normal,
        }
    }

    /// Write `text` as one record, prefixing every line with the group indent
    fn emit(&mut self, channel: Channel, text: &str) -> io::Result<()> {
        let pad = " ".repeat(self.group_indent);
        let mut record = String::with_capacity(text.len() + pad.len() + LINE_ENDING.len());
        for line in text.split('\n') {
            record.push_str(&pad);
            record.push_str(line);
            record.push_str(LINE_ENDING);
        }

        let writer = self.writer(channel);
        writer.write_all(record.as_bytes())?;
        writer.flush()
    }

    /// Write a line to the normal channel
    pub fn log(&mut self, line: &str) -> io::Result<()> {
        self.emit(Channel::Normal, line)
    }

    /// Write a line to the alert channel, followed by the native rendering
    /// of each raw payload
    pub fn error(&mut self, line: &str, raw: &[&Payload]) -> io::Result<()> {
        let text = append_raw(line.to_string(), raw);
        self.emit(Channel::Alert, &text)
    }

    /// Write `Trace: <line>` with raw payloads and a captured stack trace to
    /// the alert channel
    pub fn trace(&mut self, line: &str, raw: &[&Payload]) -> io::Result<()> {
        let mut text = append_raw(format!("Trace: {}", line), raw);

        let backtrace = Backtrace::force_capture();
        match backtrace.status() {
            BacktraceStatus::Captured => {
                for frame in backtrace.to_string().lines() {
                    text.push('\n');
                    text.push_str("    ");
                    text.push_str(frame);
                }
            }
            _ => text.push_str("\n    <stack trace unavailable>"),
        }

        self.emit(Channel::Alert, &text)
    }

    /// Print `label` (when non-empty) and indent subsequent output
    pub fn group(&mut self, label: &str) -> io::Result<()> {
        if !label.is_empty() {
            self.emit(Channel::Normal, label)?;
        }
        self.group_indent += GROUP_INDENT;
        Ok(())
    }

    pub fn group_end(&mut self) {
        self.group_indent = self.group_indent.saturating_sub(GROUP_INDENT);
    }
}

fn append_raw(mut text: String, raw: &[&Payload]) -> String {
    for payload in raw {
        text.push(' ');
        text.push_str(&payload.inspect());
    }
    text
}

/// In-memory sink; clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
