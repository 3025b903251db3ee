//! Read-only virtual filesystems.
//!
//! Every layer speaks `/`-separated paths relative to its own root. A
//! [`LayeredFs`] stacks several layers so that the first layer holding a path
//! shadows the same path in every layer after it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// A filesystem shared between documents, resolvers and layers.
pub type SharedFs = Arc<dyn FileSystem + Send + Sync>;

/// Errors from a virtual filesystem.
///
/// `NotFound` is kept apart from every other failure so callers can treat an
/// absent directory as "no entries".
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    fn not_found(path: &str) -> Self {
        FsError::NotFound {
            path: path.to_string(),
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only access to a tree of files.
pub trait FileSystem: fmt::Debug {
    /// Read a whole file.
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// List a directory, sorted by name.
    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError>;

    /// Whether `path` names a directory.
    fn is_dir(&self, path: &str) -> bool;
}

/// Normalize a path: collapse `.`, `..` and repeated separators.
///
/// Returns `"."` for the root and `None` when the path climbs above it.
pub fn clean_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

/// Join `rel` onto `dir` and clean the result.
pub fn join_path(dir: &str, rel: &str) -> Option<String> {
    if dir.is_empty() || dir == "." {
        clean_path(rel)
    } else {
        clean_path(&format!("{}/{}", dir, rel))
    }
}

/// The directory part of a path (`"."` when there is none).
pub fn parent_dir(path: &str) -> String {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => ".".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// The last segment of a path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Whether a file name carries a YAML extension.
pub fn is_yaml_file(name: &str) -> bool {
    name.ends_with(".yaml") || name.ends_with(".yml")
}

/// Recursively list every file below `dir`, sorted.
///
/// # Errors
///
/// Returns `FsError::NotFound` if `dir` does not exist.
pub fn walk(fs: &dyn FileSystem, dir: &str) -> Result<Vec<String>, FsError> {
    let mut files = Vec::new();
    walk_inner(fs, dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_inner(fs: &dyn FileSystem, dir: &str, files: &mut Vec<String>) -> Result<(), FsError> {
    for entry in fs.read_dir(dir)? {
        let child = if dir == "." || dir.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", dir, entry.name)
        };
        if entry.is_dir {
            walk_inner(fs, &child, files)?;
        } else {
            files.push(child);
        }
    }
    Ok(())
}

// === In-memory layer ===

/// A filesystem held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFs::insert`].
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add or replace a file. Paths climbing above the root are ignored.
    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        if let Some(key) = clean_path(path) {
            self.files.insert(key, content.into());
        }
    }

    pub fn into_shared(self) -> SharedFs {
        Arc::new(self)
    }

    fn dir_prefix(dir: &str) -> Option<String> {
        let cleaned = clean_path(dir)?;
        if cleaned == "." {
            Some(String::new())
        } else {
            Some(format!("{}/", cleaned))
        }
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let key = clean_path(path).ok_or_else(|| FsError::not_found(path))?;
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| FsError::not_found(path))
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError> {
        let prefix = Self::dir_prefix(dir).ok_or_else(|| FsError::not_found(dir))?;
        let mut entries: BTreeMap<String, bool> = BTreeMap::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    entries.insert(sub.to_string(), true);
                }
                None => {
                    entries.entry(rest.to_string()).or_insert(false);
                }
            }
        }
        if entries.is_empty() && !prefix.is_empty() {
            return Err(FsError::not_found(dir));
        }
        Ok(entries
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn is_dir(&self, path: &str) -> bool {
        match Self::dir_prefix(path) {
            Some(prefix) if prefix.is_empty() => true,
            Some(prefix) => self.files.keys().any(|k| k.starts_with(&prefix)),
            None => false,
        }
    }
}

// === OS directory layer ===

/// A filesystem rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn into_shared(self) -> SharedFs {
        Arc::new(self)
    }

    fn full_path(&self, path: &str) -> Option<PathBuf> {
        let cleaned = clean_path(path)?;
        if cleaned == "." {
            Some(self.root.clone())
        } else {
            Some(self.root.join(cleaned))
        }
    }
}

fn io_error(path: &str, source: std::io::Error) -> FsError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FsError::not_found(path)
    } else {
        FsError::Io {
            path: path.to_string(),
            source,
        }
    }
}

impl FileSystem for DirFs {
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self.full_path(path).ok_or_else(|| FsError::not_found(path))?;
        if full.is_dir() {
            return Err(FsError::not_found(path));
        }
        std::fs::read(&full).map_err(|source| io_error(path, source))
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError> {
        let full = self.full_path(dir).ok_or_else(|| FsError::not_found(dir))?;
        let listing = std::fs::read_dir(&full).map_err(|source| io_error(dir, source))?;
        let mut entries = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|source| io_error(dir, source))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.full_path(path).map(|p| p.is_dir()).unwrap_or(false)
    }
}

// === Layered view ===

#[derive(Debug, Clone)]
struct Layer {
    name: String,
    fs: SharedFs,
}

/// An ordered stack of filesystems; earlier layers shadow later ones.
#[derive(Debug, Clone, Default)]
pub struct LayeredFs {
    layers: Vec<Layer>,
}

impl LayeredFs {
    /// Start a stack whose top layer is `top`.
    pub fn new(name: impl Into<String>, top: SharedFs) -> Self {
        Self {
            layers: vec![Layer {
                name: name.into(),
                fs: top,
            }],
        }
    }

    /// Add a layer underneath every existing layer.
    pub fn push_below(&mut self, name: impl Into<String>, fs: SharedFs) {
        self.layers.push(Layer {
            name: name.into(),
            fs,
        });
    }

    /// Layer names from highest to lowest priority.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Name of the layer that serves `path`, if any.
    pub fn layer_of(&self, path: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.fs.read(path).is_ok())
            .map(|l| l.name.as_str())
    }

    pub fn into_shared(self) -> SharedFs {
        Arc::new(self)
    }
}

impl FileSystem for LayeredFs {
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        for layer in &self.layers {
            match layer.fs.read(path) {
                Ok(data) => return Ok(data),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(FsError::not_found(path))
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError> {
        let mut merged: BTreeMap<String, bool> = BTreeMap::new();
        let mut found = false;
        for layer in &self.layers {
            match layer.fs.read_dir(dir) {
                Ok(entries) => {
                    found = true;
                    for entry in entries {
                        merged.entry(entry.name).or_insert(entry.is_dir);
                    }
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        if !found {
            return Err(FsError::not_found(dir));
        }
        Ok(merged
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn is_dir(&self, path: &str) -> bool {
        self.layers.iter().any(|l| l.fs.is_dir(path))
    }
}
