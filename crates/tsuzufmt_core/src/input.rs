//! Formatting inputs and their identities.

use std::fmt;
use std::fs;
use std::io;
use std::path::{self, Component, Path, PathBuf};

use serde::{Serialize, Serializer};

/// Maximum size of a source file the loader will read.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Identity of an input: a path, or standard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileName {
    /// A real file path, or the label given to text input.
    Real(PathBuf),
    /// Unlabelled text read from standard input.
    Stdin,
}

impl FileName {
    /// Parses the file-lines spelling, where `stdin` names standard input.
    pub fn from_label(label: &str) -> Self {
        if label == "stdin" {
            FileName::Stdin
        } else {
            FileName::Real(PathBuf::from(label))
        }
    }

    /// Identity used to match line-range entries.
    ///
    /// Existing files resolve to their canonical path. Other paths are made
    /// absolute against the working directory with `.` components removed.
    pub fn normalized(&self) -> FileName {
        match self {
            FileName::Real(path) => FileName::Real(normalize_path(path)),
            FileName::Stdin => FileName::Stdin,
        }
    }

    /// Returns the path for real files.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            FileName::Real(path) => Some(path),
            FileName::Stdin => None,
        }
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileName::Real(path) => write!(f, "{}", path.display()),
            FileName::Stdin => f.write_str("<stdin>"),
        }
    }
}

impl From<PathBuf> for FileName {
    fn from(path: PathBuf) -> Self {
        FileName::Real(path)
    }
}

impl From<&str> for FileName {
    fn from(path: &str) -> Self {
        FileName::Real(PathBuf::from(path))
    }
}

impl Serialize for FileName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A file to be read through the session's `SourceLoader`.
    File(PathBuf),
    /// In-memory text, optionally labelled with a path.
    Text {
        content: String,
        label: Option<PathBuf>,
    },
}

impl Input {
    /// Creates an unlabelled text input.
    pub fn text(content: impl Into<String>) -> Self {
        Input::Text {
            content: content.into(),
            label: None,
        }
    }

    /// Creates a text input labelled with a path.
    pub fn labelled(content: impl Into<String>, label: impl Into<PathBuf>) -> Self {
        Input::Text {
            content: content.into(),
            label: Some(label.into()),
        }
    }

    /// Returns the identity used for report keying.
    pub fn file_name(&self) -> FileName {
        match self {
            Input::File(path) => FileName::Real(path.clone()),
            Input::Text {
                label: Some(label), ..
            } => FileName::Real(label.clone()),
            Input::Text { label: None, .. } => FileName::Stdin,
        }
    }
}

/// Reads source text for `Input::File` inputs.
pub trait SourceLoader: Send + Sync {
    /// Loads the full text of `path`.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loads sources from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        let metadata = fs::metadata(path)?;

        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        if metadata.len() > MAX_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "File size exceeds limit of {} bytes: {}",
                    MAX_FILE_SIZE,
                    path.display()
                ),
            ));
        }

        fs::read_to_string(path)
    }
}
