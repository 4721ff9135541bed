//! Archive collaborator seam
//!
//! World files and their textures ship inside an outer archive. The codec
//! only needs "bytes by name"; decompression and directory formats belong to
//! whatever implements [`ArchiveSource`].

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::formats::wld::{Container, ReadOptions, parse_wld_bytes_with_options};
use crate::model::ResolvedModel;

/// Source of named entries. Names are matched case-insensitively.
pub trait ArchiveSource {
    /// Read the entry called `name`.
    ///
    /// # Errors
    /// `ArchiveEntryNotFound` when no entry matches.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Entry names as stored.
    fn entries(&self) -> Result<Vec<String>>;

    fn contains(&self, name: &str) -> bool {
        self.entries()
            .is_ok_and(|names| names.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }
}

/// Entries held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    // lowercased name -> (stored name, bytes)
    entries: BTreeMap<String, (String, Vec<u8>)>,
}

impl MemoryArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        self.entries.insert(name.to_ascii_lowercase(), (name, bytes));
    }

    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveSource for MemoryArchive {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::ArchiveEntryNotFound(name.to_string()))
    }

    fn entries(&self) -> Result<Vec<String>> {
        Ok(self.entries.values().map(|(name, _)| name.clone()).collect())
    }
}

/// Entries stored as files directly under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Open a directory as an archive.
    ///
    /// # Errors
    /// `ArchiveDirectoryMissing` when `root` is not a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::ArchiveDirectoryMissing { path: root });
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, name: &str) -> Result<Option<PathBuf>> {
        check_entry_name(name)?;
        // exact match first, then a scan for a case-insensitive one
        let exact = self.root.join(name);
        if exact.is_file() {
            return Ok(Some(exact));
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() && entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

/// Entries live directly under the root; anything that could leave it is rejected.
fn check_entry_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let plain = matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if !plain || name.contains(['/', '\\']) {
        return Err(Error::InvalidEntryName(name.to_string()));
    }
    Ok(())
}

impl ArchiveSource for DirectoryArchive {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self
            .find(name)?
            .ok_or_else(|| Error::ArchiveEntryNotFound(name.to_string()))?;
        tracing::debug!("Reading archive entry {}", path.display());
        Ok(std::fs::read(path)?)
    }

    fn entries(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Read and parse a world file from an archive.
///
/// # Errors
/// `ArchiveEntryNotFound` when the entry is missing, otherwise any reader error.
pub fn load_world<A: ArchiveSource + ?Sized>(archive: &A, name: &str, options: &ReadOptions) -> Result<Container> {
    let bytes = archive.read(name)?;
    tracing::debug!("Loaded {} ({} bytes) from archive", name, bytes.len());
    parse_wld_bytes_with_options(&bytes, options)
}

/// Fetch the bytes of every texture a model references, in first-use order.
///
/// # Errors
/// `ArchiveEntryNotFound` for the first missing texture.
pub fn load_textures<A: ArchiveSource + ?Sized>(archive: &A, model: &ResolvedModel) -> Result<Vec<(String, Vec<u8>)>> {
    model
        .texture_names()
        .into_iter()
        .map(|name| Ok((name.to_string(), archive.read(name)?)))
        .collect()
}
