//! Console transport: line format written straight to stdout.

use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;

use super::Transport;
use crate::error::Result;
use crate::format::{DEFAULT_LABEL, Formatter};
use crate::record::LogRecord;

/// Line-formatted transport over any [`MakeWriter`].
///
/// Defaults to stdout; tests substitute an in-memory writer.
pub struct ConsoleTransport<W = fn() -> io::Stdout> {
    formatter: Formatter,
    make_writer: W,
}

impl ConsoleTransport {
    pub fn stdout(label: impl Into<String>) -> Self {
        Self::with_writer(label, io::stdout)
    }
}

impl<W> ConsoleTransport<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync,
{
    pub fn with_writer(label: impl Into<String>, make_writer: W) -> Self {
        Self { formatter: Formatter::line(label), make_writer }
    }
}

impl<W> Transport for ConsoleTransport<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync,
{
    fn name(&self) -> &str {
        "console"
    }

    fn handles_exceptions(&self) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.render(record);
        line.push('\n');
        self.make_writer.make_writer().write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Console transport with the default `Stoa` label.
pub fn build_console_transport() -> ConsoleTransport {
    ConsoleTransport::stdout(DEFAULT_LABEL)
}
