use crate::error::{Error, Result};
use crate::session::{HandleName, RemoteFile, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DirectoryExists(String),
    FileExists(RemoteFile),
    FileSize(RemoteFile),
    Read { offset: u64, amount: usize },
    Remove(RemoteFile),
    Create,
    Open(RemoteFile),
    Write(usize),
    Close,
    Drop,
}

/// In-memory directory objects with the same observable behaviour as the Oracle session
#[derive(Debug, Default)]
pub struct MemorySession {
    directories: std::collections::HashSet<String>,
    files: std::collections::HashMap<RemoteFile, Vec<u8>>,
    // handle name -> file open for writing, None when created but not opened
    handles: std::collections::HashMap<String, Option<RemoteFile>>,
    calls: Vec<Call>,
    fail_write_after: Option<usize>,
    fail_read_after: Option<usize>,
}

impl MemorySession {
    pub fn with_directory(directory: &str) -> Self {
        let mut session = Self::default();
        session.directories.insert(directory.to_string());
        session
    }

    pub fn insert_file(&mut self, remote: &RemoteFile, contents: &[u8]) {
        self.files.insert(remote.clone(), contents.to_vec());
    }

    pub fn file(&self, remote: &RemoteFile) -> Option<&[u8]> {
        self.files.get(remote).map(Vec::as_slice)
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    /// Writes after the first `n` fail with a database error
    pub fn fail_write_after(&mut self, n: usize) {
        self.fail_write_after = Some(n);
    }

    /// Reads after the first `n` fail with a database error
    pub fn fail_read_after(&mut self, n: usize) {
        self.fail_read_after = Some(n);
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn check_directory(&self, directory: &str) -> Result<()> {
        if !self.directories.contains(directory) {
            return Err(Error::Database(format!(
                "ORA-22285: non-existent directory or file for FILEEXISTS operation: {directory}"
            )));
        }
        Ok(())
    }
}

impl Session for MemorySession {
    fn directory_exists(&mut self, directory: &str) -> Result<bool> {
        self.calls.push(Call::DirectoryExists(directory.to_string()));
        Ok(self.directories.contains(directory))
    }

    fn file_exists(&mut self, remote: &RemoteFile) -> Result<bool> {
        self.calls.push(Call::FileExists(remote.clone()));
        self.check_directory(remote.directory())?;
        Ok(self.files.contains_key(remote))
    }

    fn file_size(&mut self, remote: &RemoteFile) -> Result<u64> {
        self.calls.push(Call::FileSize(remote.clone()));
        self.files
            .get(remote)
            .map(|contents| contents.len() as u64)
            .ok_or_else(|| Error::Database(format!("ORA-22288: file {remote} does not exist")))
    }

    fn read_chunk(&mut self, remote: &RemoteFile, offset: u64, amount: usize) -> Result<Vec<u8>> {
        self.calls.push(Call::Read { offset, amount });
        let reads = self.count(|c| matches!(c, Call::Read { .. }));
        if self.fail_read_after.is_some_and(|n| reads > n) {
            return Err(Error::Database("ORA-22288: injected read failure".to_string()));
        }
        assert!(offset >= 1, "offsets are 1-based");
        let contents = self
            .files
            .get(remote)
            .ok_or_else(|| Error::Database(format!("ORA-22288: file {remote} does not exist")))?;
        let start = ((offset - 1) as usize).min(contents.len());
        let end = (start + amount).min(contents.len());
        Ok(contents[start..end].to_vec())
    }

    fn remove_file(&mut self, remote: &RemoteFile) -> Result<()> {
        self.calls.push(Call::Remove(remote.clone()));
        self.files
            .remove(remote)
            .map(|_| ())
            .ok_or_else(|| Error::Database("ORA-29283: invalid file operation".to_string()))
    }

    fn create_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.calls.push(Call::Create);
        self.handles.insert(handle.to_string(), None);
        Ok(())
    }

    fn open_for_write(
        &mut self,
        handle: &HandleName,
        remote: &RemoteFile,
        max_chunk: usize,
    ) -> Result<()> {
        self.calls.push(Call::Open(remote.clone()));
        assert!(max_chunk > 0);
        self.check_directory(remote.directory())?;
        let slot = self
            .handles
            .get_mut(handle.as_str())
            .ok_or_else(|| Error::Database(format!("PLS-00201: {handle} must be declared")))?;
        *slot = Some(remote.clone());
        self.files.insert(remote.clone(), Vec::new());
        Ok(())
    }

    fn write_chunk(&mut self, handle: &HandleName, chunk: &[u8]) -> Result<()> {
        self.calls.push(Call::Write(chunk.len()));
        let writes = self.count(|c| matches!(c, Call::Write(_)));
        if self.fail_write_after.is_some_and(|n| writes > n) {
            return Err(Error::Database("ORA-29285: file write error".to_string()));
        }
        let remote = self
            .handles
            .get(handle.as_str())
            .cloned()
            .flatten()
            .ok_or_else(|| Error::Database("ORA-29282: invalid file ID".to_string()))?;
        self.files.entry(remote).or_default().extend_from_slice(chunk);
        Ok(())
    }

    fn close_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.calls.push(Call::Close);
        if let Some(slot) = self.handles.get_mut(handle.as_str()) {
            *slot = None;
        }
        Ok(())
    }

    fn drop_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.calls.push(Call::Drop);
        self.handles
            .remove(handle.as_str())
            .map(|_| ())
            .ok_or_else(|| Error::Database(format!("ORA-04043: object {handle} does not exist")))
    }
}
