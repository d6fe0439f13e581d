//! Chunked upload, download and removal of files in a directory object

use std::io::{Read, Write};
use tracing::instrument;

use crate::error::{Error, NotFound, Result};
use crate::progress::{COMPLETED, ProgressSink};
use crate::session::{HandleName, RemoteFile, Session};

/// Default chunk size, both for the server-side write buffer and for reads
pub const DEFAULT_CHUNK_SIZE: usize = 32528;
/// Largest RAW value accepted by UTL_FILE.PUT_RAW and DBMS_LOB.SUBSTR
pub const MAX_CHUNK_SIZE: usize = 32767;

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::config(format!(
                "chunk size must be between 1 and {MAX_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Summary {
    pub bytes: u64,
    pub chunks: u64,
    pub duration: std::time::Duration,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes: self.bytes + other.bytes,
            chunks: self.chunks + other.chunks,
            duration: self.duration + other.duration,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.duration.as_secs_f64();
        let rate = if secs > 0.0 {
            (self.bytes as f64 / secs) as u64
        } else {
            0
        };
        write!(
            f,
            "bytes transferred: {}\n\
            chunks: {}\n\
            duration: {}\n\
            average: {}/s",
            bytesize::ByteSize(self.bytes),
            self.chunks,
            humantime::format_duration(std::time::Duration::from_millis(
                self.duration.as_millis() as u64
            )),
            bytesize::ByteSize(rate),
        )
    }
}

fn ensure_directory(session: &mut dyn Session, remote: &RemoteFile) -> Result<()> {
    if !session.directory_exists(remote.directory())? {
        return Err(Error::NotFound(NotFound::Directory(
            remote.directory().to_string(),
        )));
    }
    Ok(())
}

fn ensure_file(session: &mut dyn Session, remote: &RemoteFile) -> Result<()> {
    ensure_directory(session, remote)?;
    if !session.file_exists(remote)? {
        return Err(Error::NotFound(NotFound::File {
            directory: remote.directory().to_string(),
            file: remote.file().to_string(),
        }));
    }
    Ok(())
}

/// Removes `remote`, fails with [`NotFound`] without calling remove if it does not exist
#[instrument(skip(session))]
pub fn delete(session: &mut dyn Session, remote: &RemoteFile) -> Result<()> {
    ensure_file(session, remote)?;
    session.remove_file(remote)?;
    tracing::info!("removed {}", remote);
    Ok(())
}

/// Fills `buf` from `reader`, returns fewer bytes only at end of input
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}

fn write_chunks(
    session: &mut dyn Session,
    handle: &HandleName,
    local: &std::path::Path,
    settings: &Settings,
    progress: &mut dyn ProgressSink,
) -> Result<Summary> {
    let start = std::time::Instant::now();
    let mut reader = std::fs::File::open(local).map_err(|error| Error::io(local, error))?;
    let total = reader
        .metadata()
        .map_err(|error| Error::io(local, error))?
        .len();
    tracing::info!("uploading {} ({})", local.display(), bytesize::ByteSize(total));
    let mut buf = vec![0u8; settings.chunk_size];
    let mut summary = Summary::default();
    loop {
        let n = read_full(&mut reader, &mut buf).map_err(|error| Error::io(local, error))?;
        if n == 0 {
            break;
        }
        session.write_chunk(handle, &buf[..n])?;
        summary.bytes += n as u64;
        summary.chunks += 1;
        progress.update(summary.bytes, total, "Uploaded");
    }
    progress.finish(summary.bytes, total, COMPLETED);
    summary.duration = start.elapsed();
    Ok(summary)
}

fn release_handle(session: &mut dyn Session, handle: &HandleName) -> Result<()> {
    let closed = session.close_handle(handle);
    let dropped = session.drop_handle(handle);
    closed.and(dropped)
}

/// Uploads `local` into `remote`, replacing an existing file
///
/// The server-side handle is always closed and dropped. When the transfer fails the original
/// error is returned and a failed cleanup is only logged. Bytes already written stay on the
/// server.
#[instrument(skip(session, progress))]
pub fn put(
    session: &mut dyn Session,
    local: &std::path::Path,
    remote: &RemoteFile,
    settings: &Settings,
    progress: &mut dyn ProgressSink,
) -> Result<Summary> {
    settings.validate()?;
    if !local.is_file() {
        return Err(Error::io(
            local,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a regular file"),
        ));
    }
    ensure_directory(session, remote)?;
    if session.file_exists(remote)? {
        tracing::info!("{} already exists, removing it first", remote);
        session.remove_file(remote)?;
    }
    let handle = HandleName::now();
    tracing::debug!("using temporary handle {}", handle);
    session.create_handle(&handle)?;
    let result = match session.open_for_write(&handle, remote, settings.chunk_size) {
        Ok(()) => write_chunks(session, &handle, local, settings, progress),
        Err(error) => Err(error),
    };
    match result {
        Ok(summary) => {
            release_handle(session, &handle)?;
            Ok(summary)
        }
        Err(error) => {
            if let Err(cleanup_error) = release_handle(session, &handle) {
                tracing::warn!("failed releasing handle {}: {:#}", handle, cleanup_error);
            }
            Err(error)
        }
    }
}

fn read_chunks(
    session: &mut dyn Session,
    remote: &RemoteFile,
    total: u64,
    writer: &mut impl Write,
    local: &std::path::Path,
    settings: &Settings,
    progress: &mut dyn ProgressSink,
) -> Result<Summary> {
    let start = std::time::Instant::now();
    let mut summary = Summary::default();
    while summary.bytes < total {
        let amount = (total - summary.bytes).min(settings.chunk_size as u64) as usize;
        let chunk = session.read_chunk(remote, summary.bytes + 1, amount)?;
        if chunk.is_empty() {
            return Err(Error::Database(format!(
                "short read from {} at offset {} of {}",
                remote,
                summary.bytes + 1,
                total
            )));
        }
        writer
            .write_all(&chunk)
            .map_err(|error| Error::io(local, error))?;
        summary.bytes += chunk.len() as u64;
        summary.chunks += 1;
        progress.update(summary.bytes, total, "Downloaded");
    }
    progress.finish(summary.bytes, total, COMPLETED);
    summary.duration = start.elapsed();
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Compress the local file with gzip while writing it
    pub gzip: bool,
}

/// Downloads `remote` into `local`
///
/// A partially written local file is left in place when the transfer fails.
#[instrument(skip(session, progress))]
pub fn get(
    session: &mut dyn Session,
    remote: &RemoteFile,
    local: &std::path::Path,
    settings: &Settings,
    options: &GetOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Summary> {
    settings.validate()?;
    ensure_file(session, remote)?;
    let total = session.file_size(remote)?;
    tracing::info!("downloading {} ({})", remote, bytesize::ByteSize(total));
    let file = std::fs::File::create(local).map_err(|error| Error::io(local, error))?;
    let mut writer = std::io::BufWriter::new(file);
    let summary = if options.gzip {
        let mut encoder = flate2::write::GzEncoder::new(&mut writer, flate2::Compression::default());
        let summary = read_chunks(session, remote, total, &mut encoder, local, settings, progress)?;
        encoder.finish().map_err(|error| Error::io(local, error))?;
        summary
    } else {
        read_chunks(session, remote, total, &mut writer, local, settings, progress)?
    };
    writer.flush().map_err(|error| Error::io(local, error))?;
    Ok(summary)
}
