//! User file locations, readers and imports
//!
//! Phrase, pronunciation and soundbite sources live in the user-visible
//! documents directory; the audit log and message history live in the
//! private data directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{Error, Result};

/// Files (and the soundbite directory) the user may supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFile {
    Phrases,
    Pronunciations,
    Log,
    History,
    Soundbites,
}

impl UserFile {
    /// Every recognized user file
    pub const ALL: [Self; 5] = [
        Self::Phrases,
        Self::Pronunciations,
        Self::Log,
        Self::History,
        Self::Soundbites,
    ];

    /// On-disk name
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Phrases => "phrases.txt",
            Self::Pronunciations => "pronunciations.txt",
            Self::Log => "log.jsonl",
            Self::History => "history.json",
            Self::Soundbites => "soundbites",
        }
    }

    /// Whether the file is kept in the user-visible documents directory
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Phrases | Self::Pronunciations | Self::Soundbites)
    }

    /// Look up a recognized file by name
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.file_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolves user files against the documents and data directories
#[derive(Debug, Clone)]
pub struct FileLocations {
    documents_dir: PathBuf,
    data_dir: PathBuf,
}

impl FileLocations {
    #[must_use]
    pub const fn new(documents_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            documents_dir,
            data_dir,
        }
    }

    /// Full path of a user file
    #[must_use]
    pub fn path(&self, file: UserFile) -> PathBuf {
        let dir = if file.is_public() {
            &self.documents_dir
        } else {
            &self.data_dir
        };
        dir.join(file.file_name())
    }

    #[must_use]
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create both directories if needed
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.documents_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Copy a user-supplied file into place
    ///
    /// The source's file name must be one of the recognized names. A
    /// `soundbites` directory is imported by copying its files into the
    /// soundbite directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedFile`] for unknown names, or an IO
    /// error if copying fails
    pub fn import(&self, source: &Path) -> Result<UserFile> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some(file) = UserFile::from_file_name(&name) else {
            return Err(Error::UnrecognizedFile {
                name,
                expected: UserFile::expected_names(),
            });
        };

        let dest = self.path(file);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if file == UserFile::Soundbites {
            if !source.is_dir() {
                return Err(Error::Import(format!(
                    "{} must be a directory of audio files",
                    source.display()
                )));
            }
            std::fs::create_dir_all(&dest)?;
            let mut copied = 0usize;
            for entry in std::fs::read_dir(source)?.flatten() {
                let path = entry.path();
                if path.is_file() {
                    std::fs::copy(&path, dest.join(entry.file_name()))?;
                    copied += 1;
                }
            }
            tracing::info!(dest = %dest.display(), copied, "imported soundbites");
        } else {
            std::fs::copy(source, &dest)?;
            tracing::info!(dest = %dest.display(), "imported file");
        }

        Ok(file)
    }
}

/// Modification time of a file or directory, `None` if it does not exist
#[must_use]
pub fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Read a UTF-8 text file as its non-empty lines
///
/// # Errors
///
/// Returns error if the file cannot be read
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// List the entry names of a directory
///
/// # Errors
///
/// Returns error if the directory cannot be read
pub fn list_dir(path: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(path)?
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}
