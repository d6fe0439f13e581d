//! [`Session`] backed by an Oracle connection
//!
//! Reads go through `BFILENAME` and `DBMS_LOB`, writes and removal through `UTL_FILE`. A
//! `UTL_FILE.FILE_TYPE` cannot be bound from the client, so the write handle lives in a
//! temporary package created for the duration of one upload.

use crate::config::ConnectionParams;
use crate::error::{Error, Result};
use crate::session::{HandleName, RemoteFile, Session};
use crate::transfer::MAX_CHUNK_SIZE;

const DIRECTORY_EXISTS: &str = "SELECT COUNT(*) FROM dba_directories WHERE directory_name = :1";

const FILE_EXISTS: &str = "SELECT DBMS_LOB.FILEEXISTS(BFILENAME(:1, :2)) FROM dual";

const FILE_SIZE: &str = "SELECT DBMS_LOB.GETLENGTH(BFILENAME(:1, :2)) FROM dual";

const READ_CHUNK: &str = "\
DECLARE
  f BFILE := BFILENAME(:1, :2);
BEGIN
  DBMS_LOB.FILEOPEN(f, DBMS_LOB.FILE_READONLY);
  :3 := DBMS_LOB.SUBSTR(f, :4, :5);
  DBMS_LOB.FILECLOSE(f);
EXCEPTION
  WHEN OTHERS THEN
    IF DBMS_LOB.FILEISOPEN(f) = 1 THEN
      DBMS_LOB.FILECLOSE(f);
    END IF;
    RAISE;
END;";

const REMOVE_FILE: &str = "BEGIN UTL_FILE.FREMOVE(:1, :2); END;";

fn create_handle_sql(handle: &HandleName) -> String {
    format!("CREATE OR REPLACE PACKAGE {handle} AS fh UTL_FILE.FILE_TYPE; END;")
}

fn open_sql(handle: &HandleName) -> String {
    format!("BEGIN {handle}.fh := UTL_FILE.FOPEN(:1, :2, 'wb', :3); END;")
}

fn write_sql(handle: &HandleName) -> String {
    format!("BEGIN UTL_FILE.PUT_RAW({handle}.fh, :1, TRUE); END;")
}

fn close_sql(handle: &HandleName) -> String {
    format!("BEGIN IF UTL_FILE.IS_OPEN({handle}.fh) THEN UTL_FILE.FCLOSE({handle}.fh); END IF; END;")
}

fn drop_sql(handle: &HandleName) -> String {
    format!("DROP PACKAGE {handle}")
}

pub struct OracleSession {
    conn: oracle::Connection,
}

impl OracleSession {
    pub fn connect(params: &ConnectionParams) -> Result<Self> {
        let (user, password) = params.credentials()?;
        let connect_string = crate::dsn::connect_string(params)?;
        tracing::info!("connecting as {} to {}", user, connect_string);
        let conn = oracle::Connection::connect(user, password, &connect_string).map_err(|error| {
            Error::Database(format!("failed connecting to {connect_string}: {error}"))
        })?;
        tracing::debug!("connected");
        Ok(Self { conn })
    }
}

impl Session for OracleSession {
    fn directory_exists(&mut self, directory: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row_as(DIRECTORY_EXISTS, &[&directory])?;
        Ok(count == 1)
    }

    fn file_exists(&mut self, remote: &RemoteFile) -> Result<bool> {
        let exists: i64 = self
            .conn
            .query_row_as(FILE_EXISTS, &[&remote.directory(), &remote.file()])?;
        Ok(exists == 1)
    }

    fn file_size(&mut self, remote: &RemoteFile) -> Result<u64> {
        let size: u64 = self
            .conn
            .query_row_as(FILE_SIZE, &[&remote.directory(), &remote.file()])?;
        Ok(size)
    }

    fn read_chunk(&mut self, remote: &RemoteFile, offset: u64, amount: usize) -> Result<Vec<u8>> {
        let amount = amount.min(MAX_CHUNK_SIZE) as u64;
        let stmt = self.conn.execute(
            READ_CHUNK,
            &[
                &remote.directory(),
                &remote.file(),
                &oracle::sql_type::OracleType::Raw(MAX_CHUNK_SIZE as u32),
                &amount,
                &offset,
            ],
        )?;
        // NULL when reading past the end
        let chunk: Option<Vec<u8>> = stmt.bind_value(3)?;
        Ok(chunk.unwrap_or_default())
    }

    fn remove_file(&mut self, remote: &RemoteFile) -> Result<()> {
        self.conn
            .execute(REMOVE_FILE, &[&remote.directory(), &remote.file()])?;
        Ok(())
    }

    fn create_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.conn.execute(&create_handle_sql(handle), &[])?;
        Ok(())
    }

    fn open_for_write(
        &mut self,
        handle: &HandleName,
        remote: &RemoteFile,
        max_chunk: usize,
    ) -> Result<()> {
        self.conn.execute(
            &open_sql(handle),
            &[&remote.directory(), &remote.file(), &(max_chunk as u64)],
        )?;
        Ok(())
    }

    fn write_chunk(&mut self, handle: &HandleName, chunk: &[u8]) -> Result<()> {
        self.conn.execute(&write_sql(handle), &[&chunk])?;
        Ok(())
    }

    fn close_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.conn.execute(&close_sql(handle), &[])?;
        Ok(())
    }

    fn drop_handle(&mut self, handle: &HandleName) -> Result<()> {
        self.conn.execute(&drop_sql(handle), &[])?;
        Ok(())
    }
}
