//! File transport: append-only line output with size-based rotation.
//!
//! The active file is `<dir>/<label>.log`. When a write would push it past
//! the size limit it is renamed to `<label>1.log`, older archives shift up
//! by one (`<label>1.log` → `<label>2.log`, ...) and the archive beyond the
//! retention count is deleted.
//!
//! Rendering happens on the caller's thread; disk I/O happens on the
//! `tracing-appender` worker thread, so a slow disk never stalls a log call.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;

use super::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES, Transport};
use crate::error::Result;
use crate::format::{DEFAULT_LABEL, Formatter};
use crate::record::LogRecord;

// ---------------------------------------------------------------------------
// RollingFile
// ---------------------------------------------------------------------------

/// Size-rotated, append-only file writer.
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    max_size: u64,
    max_files: usize,
    file: File,
    size: u64,
}

impl RollingFile {
    /// Open (or create) the active file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self { path, max_size, max_files: max_files.max(1), file, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th archive, e.g. `Stoa3.log`.
    pub fn archive_path(&self, index: usize) -> PathBuf {
        let stem = self.path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let name = match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}{index}.{ext}"),
            None => format!("{stem}{index}"),
        };
        self.path.with_file_name(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_files > 1 {
            remove_if_exists(&self.archive_path(self.max_files - 1))?;
            for index in (1..self.max_files - 1).rev() {
                let from = self.archive_path(index);
                if from.exists() {
                    fs::rename(&from, self.archive_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.archive_path(1))?;
            self.file = open_append(&self.path)?;
        } else {
            self.file = OpenOptions::new().write(true).truncate(true).create(true).open(&self.path)?;
        }

        self.size = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.size > 0 && self.size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// FileTransport
// ---------------------------------------------------------------------------

/// Line-formatted transport backed by a [`RollingFile`] on a worker thread.
///
/// Closing or dropping the transport flushes pending lines.
pub struct FileTransport {
    formatter: Formatter,
    writer: NonBlocking,
    guard: Mutex<Option<WorkerGuard>>,
}

impl FileTransport {
    pub fn new(file: RollingFile, label: impl Into<String>) -> Self {
        let (writer, guard) = tracing_appender::non_blocking(file);
        Self { formatter: Formatter::line(label), writer, guard: Mutex::new(Some(guard)) }
    }
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &str {
        "file"
    }

    fn handles_exceptions(&self) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.render(record);
        line.push('\n');
        // One write per line keeps rotation on line boundaries.
        self.writer.make_writer().write_all(line.as_bytes())?;
        Ok(())
    }

    async fn close(&self) {
        // Dropping the guard joins the worker after it drains the queue.
        let guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        drop(guard);
    }
}

/// File transport writing `<directory>/Stoa.log`, rotating at 10 MiB and
/// keeping at most 10 files.
pub fn build_file_transport(directory: impl AsRef<Path>) -> Result<FileTransport> {
    let path = directory.as_ref().join(format!("{DEFAULT_LABEL}.log"));
    let file = RollingFile::open(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)?;
    Ok(FileTransport::new(file, DEFAULT_LABEL))
}
