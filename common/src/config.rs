//! Run settings: connection parameters, run parameters and the merge that builds them
//!
//! Settings are produced once per run by [`resolve`] from three layers, lowest priority first:
//! the DEFAULT section of the config file, the selected profile section and command-line
//! overrides. The result is immutable and passed by reference to the transfer engine.

use crate::error::{Error, Result};
use crate::profile::{ConfigFile, Section};

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

/// Oracle connection parameters
///
/// Either `dsn` is set, or `address` with `service` and/or `sid` are set and a descriptor can be
/// built from them (see [`crate::dsn`]).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub sid: Option<String>,
    pub service: Option<String>,
    pub address: Option<String>,
    pub dsn: Option<String>,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("service", &self.service)
            .field("address", &self.address)
            .field("dsn", &self.dsn)
            .finish()
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| Error::config(format!("invalid port {value:?}")))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

impl ConnectionParams {
    /// Uses `dsn` verbatim and drops the discrete address fields
    pub fn set_dsn(&mut self, dsn: impl Into<String>) {
        self.dsn = Some(dsn.into());
        self.port = None;
        self.sid = None;
        self.service = None;
        self.address = None;
    }

    pub fn has_dsn(&self) -> bool {
        self.dsn.is_some()
    }

    /// User and password, both are required for every connection
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| Error::config("user is not set"))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| Error::config("password is not set"))?;
        Ok((user, password))
    }

    /// Overwrites fields present in `section`, keeps the rest
    fn apply_section(&mut self, section: &Section) -> Result<()> {
        let set = |field: &mut Option<String>, key: &str| {
            if let Some(value) = section.get(key) {
                *field = Some(value.to_string());
            }
        };
        set(&mut self.user, "user");
        set(&mut self.password, "password");
        set(&mut self.sid, "sid");
        set(&mut self.service, "service");
        set(&mut self.address, "address");
        set(&mut self.dsn, "dsn");
        if let Some(port) = section.get("port") {
            self.port = Some(parse_port(port)?);
        }
        Ok(())
    }

    /// Overwrites fields set in `other`, keeps the rest
    fn apply_overrides(&mut self, other: &ConnectionParams) {
        let set = |field: &mut Option<String>, value: Option<&String>| {
            if let Some(value) = non_empty(value) {
                *field = Some(value);
            }
        };
        set(&mut self.user, other.user.as_ref());
        set(&mut self.password, other.password.as_ref());
        set(&mut self.sid, other.sid.as_ref());
        set(&mut self.service, other.service.as_ref());
        set(&mut self.address, other.address.as_ref());
        set(&mut self.dsn, other.dsn.as_ref());
        if other.port.is_some() {
            self.port = other.port;
        }
    }
}

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Get,
    Put,
    Del,
    #[default]
    None,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Get => "GET",
            Mode::Put => "PUT",
            Mode::Del => "DEL",
            Mode::None => "NONE",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    pub profile: Option<String>,
    /// Remote directory object name
    pub directory: Option<String>,
    pub file: Option<String>,
    pub mode: Mode,
}

/// Values given on the command line, they take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub directory: Option<String>,
    pub file: Option<String>,
    pub mode: Mode,
    pub connection: ConnectionParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub connection: ConnectionParams,
    pub run: RunParams,
}

impl Settings {
    /// Remote directory object and file name, both must be known by now
    pub fn remote(&self) -> Result<crate::session::RemoteFile> {
        let directory = self.run.directory.as_deref().ok_or_else(|| {
            Error::config("remote directory is neither configured nor given on the command line")
        })?;
        let file = self
            .run
            .file
            .as_deref()
            .ok_or_else(|| Error::config("file name is missing"))?;
        Ok(crate::session::RemoteFile::new(directory, file))
    }
}

/// Merges DEFAULT, the selected profile and command-line overrides into [`Settings`]
pub fn resolve(config: &ConfigFile, overrides: &Overrides) -> Result<Settings> {
    let mut connection = ConnectionParams::default();
    let mut run = RunParams::default();
    let defaults = config.defaults();
    connection.apply_section(defaults)?;
    run.directory = defaults.get("directory").map(str::to_string);
    run.profile = non_empty(overrides.profile.as_ref())
        .or_else(|| defaults.get("profile").map(str::to_string));
    if let Some(name) = run.profile.as_deref() {
        let section = config
            .profile(name)
            .ok_or_else(|| Error::config(format!("no such profile {name:?}")))?;
        tracing::debug!("applying profile {:?}", section.name());
        connection.apply_section(section)?;
        if let Some(directory) = section.get("directory") {
            run.directory = Some(directory.to_string());
        }
    }
    connection.apply_overrides(&overrides.connection);
    if let Some(directory) = non_empty(overrides.directory.as_ref()) {
        run.directory = Some(directory);
    }
    if let Some(dsn) = connection.dsn.take() {
        connection.set_dsn(dsn);
    }
    run.file = non_empty(overrides.file.as_ref());
    run.mode = overrides.mode;
    let settings = Settings { connection, run };
    tracing::debug!("resolved settings: {:?}", settings);
    Ok(settings)
}
