//! Error kinds shared by the configuration resolver, the session layer and the transfer engine

/// Remote object that could not be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// Directory object is not defined in the database
    Directory(String),
    /// File is absent from an existing directory object
    File { directory: String, file: String },
    /// Section is absent from the configuration file
    Profile(String),
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Directory(directory) => {
                write!(f, "directory object {directory:?} does not exist")
            }
            NotFound::File { directory, file } => {
                write!(f, "file {file:?} does not exist in directory {directory:?}")
            }
            NotFound::Profile(profile) => write!(f, "Not Found: {profile}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(NotFound),

    #[error("database error: {0}")]
    Database(String),

    #[error("failed accessing {path:?}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(feature = "oracle")]
impl From<oracle::Error> for Error {
    fn from(error: oracle::Error) -> Self {
        Error::Database(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
