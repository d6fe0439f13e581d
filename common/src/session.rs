//! Database capabilities used by the transfer engine
//!
//! The engine never talks to the driver directly. It needs existence checks, ranged reads of a
//! server-side file, a writable server-side handle and removal. `OracleSession`
//! provides them through BFILE and UTL_FILE calls.

use crate::error::Result;

/// File inside a directory object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFile {
    directory: String,
    file: String,
}

impl RemoteFile {
    pub fn new(directory: &str, file: &str) -> Self {
        Self {
            directory: directory.to_string(),
            file: file.to_string(),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl std::fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.directory, self.file)
    }
}

/// Name of the server-side object holding an open write handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleName(String);

impl HandleName {
    const PREFIX: &'static str = "RDSPUMP_TMP";

    /// Unique per second, concurrent runs started within the same second may still collide
    pub fn at(time: chrono::DateTime<chrono::Utc>) -> Self {
        Self(format!("{}{}", Self::PREFIX, time.timestamp()))
    }

    pub fn now() -> Self {
        Self::at(chrono::Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait Session {
    fn directory_exists(&mut self, directory: &str) -> Result<bool>;

    fn file_exists(&mut self, remote: &RemoteFile) -> Result<bool>;

    fn file_size(&mut self, remote: &RemoteFile) -> Result<u64>;

    /// Reads up to `amount` bytes starting at 1-based `offset`
    fn read_chunk(&mut self, remote: &RemoteFile, offset: u64, amount: usize) -> Result<Vec<u8>>;

    fn remove_file(&mut self, remote: &RemoteFile) -> Result<()>;

    /// Creates the server-side object that will hold the write handle
    fn create_handle(&mut self, handle: &HandleName) -> Result<()>;

    /// Opens `remote` for binary writing through `handle`, truncating it
    fn open_for_write(
        &mut self,
        handle: &HandleName,
        remote: &RemoteFile,
        max_chunk: usize,
    ) -> Result<()>;

    /// Appends `chunk` to the open handle and flushes it
    fn write_chunk(&mut self, handle: &HandleName, chunk: &[u8]) -> Result<()>;

    /// Closes the handle if it is open
    fn close_handle(&mut self, handle: &HandleName) -> Result<()>;

    fn drop_handle(&mut self, handle: &HandleName) -> Result<()>;
}
