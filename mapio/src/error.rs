use std::path::{Path, PathBuf};
use std::{error, fmt, io};

/// Why a file couldn't be read or written. Callers care about one distinction: a missing file is
/// the user's mistake and gets its own message, while everything else is an unexpected failure.
/// Both end the run.
pub enum FileError {
    NotFound(PathBuf),
    Io(PathBuf, io::Error),
    /// The bytes were there, but not in the format expected.
    Format(PathBuf, anyhow::Error),
}

impl FileError {
    pub fn io(path: &Path, err: io::Error) -> FileError {
        if err.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path.to_path_buf())
        } else {
            FileError::Io(path.to_path_buf(), err)
        }
    }

    pub fn format<E: Into<anyhow::Error>>(path: &Path, err: E) -> FileError {
        FileError::Format(path.to_path_buf(), err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::NotFound(_))
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileError::NotFound(path) => write!(f, "{} could not be found", path.display()),
            FileError::Io(path, err) => {
                write!(f, "system-related error on {}: {}", path.display(), err)
            }
            FileError::Format(path, err) => {
                write!(f, "could not open {}: {:#}", path.display(), err)
            }
        }
    }
}

impl fmt::Debug for FileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Do the same thing as the Display trait
        write!(f, "{}", self)
    }
}

impl error::Error for FileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            FileError::NotFound(_) => None,
            FileError::Io(_, err) => Some(err),
            FileError::Format(_, err) => Some(&**err),
        }
    }
}
