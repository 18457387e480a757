//! Error types

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::mpsc;
use std::{fmt, io, result};

/// Type alias to use this library's `Error` type in a Result
pub type Result<T> = result::Result<T, Error>;

/// Error kinds
#[derive(Debug)]
pub enum ErrorKind {
    /// Generic error
    ///
    /// May be used in cases where a platform specific error is mapped to this
    /// type, or for opaque internal errors.
    Generic(String),

    /// I/O errors
    Io(io::Error),

    /// A watch was attempted on a path that does not exist
    PathNotFound,

    /// A watch removal was attempted on a watch that does not exist
    WatchNotFound,

    /// The per-user limit on the number of watches was reached
    MaxFilesWatch,
}

/// Notification engine error
#[derive(Debug)]
pub struct Error {
    /// Kind of the error
    pub kind: ErrorKind,

    /// Relevant paths, if any
    pub paths: Vec<PathBuf>,
}

impl Error {
    /// Create a new error of the given kind, with no paths attached.
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            paths: Vec::new(),
        }
    }

    /// Attach a path to the error.
    pub fn add_path(mut self, path: PathBuf) -> Self {
        self.paths.push(path);
        self
    }

    /// Create a generic error from a message.
    pub fn generic(msg: &str) -> Self {
        Error::new(ErrorKind::Generic(msg.into()))
    }

    /// Create an error from an I/O error.
    pub fn io(err: io::Error) -> Self {
        Error::new(ErrorKind::Io(err))
    }

    /// Create an error for a watch operation on a missing path.
    pub fn path_not_found() -> Self {
        Error::new(ErrorKind::PathNotFound)
    }

    /// Create an error for a removal of a watch that does not exist.
    pub fn watch_not_found() -> Self {
        Error::new(ErrorKind::WatchNotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error = match &self.kind {
            ErrorKind::PathNotFound => "No path was found.".into(),
            ErrorKind::WatchNotFound => "No watch was found.".into(),
            ErrorKind::MaxFilesWatch => "OS file watch limit reached.".into(),
            ErrorKind::Generic(err) => err.clone(),
            ErrorKind::Io(err) => err.to_string(),
        };

        if self.paths.is_empty() {
            write!(f, "{error}")
        } else {
            write!(f, "{error} about {:?}", self.paths)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err)
    }
}

impl<T> From<mpsc::SendError<T>> for Error {
    fn from(err: mpsc::SendError<T>) -> Self {
        Error::generic(&format!("internal channel disconnect: {err:?}"))
    }
}

impl From<mpsc::RecvError> for Error {
    fn from(err: mpsc::RecvError) -> Self {
        Error::generic(&format!("internal channel disconnect: {err:?}"))
    }
}

#[cfg(feature = "crossbeam-channel")]
impl<T> From<crossbeam_channel::SendError<T>> for Error {
    fn from(err: crossbeam_channel::SendError<T>) -> Self {
        Error::generic(&format!("internal channel disconnect: {err:?}"))
    }
}
