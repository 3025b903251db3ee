//! File resolution and the typed resolver cache.
//!
//! [`FileResolver`] turns a `$ref` string into file bytes, either relative to
//! a fixed base directory or relative to the file that holds the reference.
//! [`Resolver`] puts a [`Loader`] and a cache in front of it so each distinct
//! file is parsed at most once.
//!
//! The cache is a plain map. A resolver must not be shared between threads
//! without outside synchronization.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::SpecError;
use crate::schema::Schema;
use crate::vfs::{base_name, clean_path, join_path, parent_dir, SharedFs};

/// Reads files relative to a base directory of a virtual filesystem.
#[derive(Debug, Clone)]
pub struct FileResolver {
    fs: SharedFs,
    base_dir: String,
}

impl FileResolver {
    /// A resolver rooted at `base_dir` (`""` means the filesystem root).
    pub fn new(fs: SharedFs, base_dir: impl Into<String>) -> Self {
        let base_dir = base_dir.into();
        let base_dir = clean_path(&base_dir).unwrap_or_else(|| ".".to_string());
        Self { fs, base_dir }
    }

    pub fn fs(&self) -> &SharedFs {
        &self.fs
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Canonical filesystem key for `path` relative to the base directory.
    ///
    /// # Errors
    ///
    /// `EmptyPath` for an empty path, `NotFound` if it climbs above the root.
    pub fn key(&self, path: &str) -> Result<String, SpecError> {
        if path.is_empty() {
            return Err(SpecError::EmptyPath);
        }
        join_path(&self.base_dir, path).ok_or_else(|| SpecError::NotFound {
            path: path.to_string(),
        })
    }

    /// Canonical key for `path` relative to `anchor`.
    ///
    /// `anchor` is itself relative to the base directory. When it names a
    /// directory the path is taken relative to it, otherwise relative to the
    /// directory that contains it.
    ///
    /// # Errors
    ///
    /// Same as [`FileResolver::key`].
    pub fn key_from(&self, anchor: &str, path: &str) -> Result<String, SpecError> {
        if path.is_empty() {
            return Err(SpecError::EmptyPath);
        }
        if anchor.is_empty() {
            return self.key(path);
        }
        let anchor_key = self.key(anchor)?;
        let dir = if self.fs.is_dir(&anchor_key) {
            anchor_key
        } else {
            parent_dir(&anchor_key)
        };
        join_path(&dir, path).ok_or_else(|| SpecError::NotFound {
            path: path.to_string(),
        })
    }

    /// Read `path` relative to the base directory.
    ///
    /// # Errors
    ///
    /// `EmptyPath`, `NotFound` (carrying `path` as written) or `Io`.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, SpecError> {
        let key = self.key(path)?;
        self.read_key(&key, path)
    }

    /// Read `path` relative to `anchor`.
    ///
    /// # Errors
    ///
    /// Same as [`FileResolver::read`].
    pub fn read_from(&self, anchor: &str, path: &str) -> Result<Vec<u8>, SpecError> {
        let key = self.key_from(anchor, path)?;
        self.read_key(&key, path)
    }

    /// Read an already canonical key.
    ///
    /// # Errors
    ///
    /// `NotFound` carrying `original`, or `Io`.
    pub fn read_key(&self, key: &str, original: &str) -> Result<Vec<u8>, SpecError> {
        trace!(key, "reading file");
        self.fs.read(key).map_err(|err| {
            if err.is_not_found() {
                SpecError::NotFound {
                    path: original.to_string(),
                }
            } else {
                err.into()
            }
        })
    }

    /// Express a canonical key relative to the base directory again.
    pub fn relative(&self, key: &str) -> String {
        if self.base_dir == "." {
            return key.to_string();
        }
        match key.strip_prefix(&self.base_dir) {
            Some(rest) => rest.trim_start_matches('/').to_string(),
            None => key.to_string(),
        }
    }
}

/// Turns file bytes into a value of type `T`.
pub trait Loader<T> {
    /// `default_name` is the file's base name without extension.
    fn load(&self, data: &[u8], default_name: &str) -> Result<T, serde_yaml::Error>;
}

/// Deserializes any YAML document with serde.
#[derive(Debug)]
pub struct YamlLoader<T>(PhantomData<fn() -> T>);

impl<T> Default for YamlLoader<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: DeserializeOwned> Loader<T> for YamlLoader<T> {
    fn load(&self, data: &[u8], _default_name: &str) -> Result<T, serde_yaml::Error> {
        serde_yaml::from_slice(data)
    }
}

/// Loads a schema draft, taking the file name as the title when none is set.
#[derive(Debug, Default)]
pub struct SchemaLoader;

impl Loader<Schema> for SchemaLoader {
    fn load(&self, data: &[u8], default_name: &str) -> Result<Schema, serde_yaml::Error> {
        let mut schema: Schema = serde_yaml::from_slice(data)?;
        if schema.title.is_empty() {
            schema.title = default_name.to_string();
        }
        Ok(schema)
    }
}

/// A [`FileResolver`] with a typed loader and a per-file cache.
#[derive(Debug)]
pub struct Resolver<T, L = YamlLoader<T>> {
    files: FileResolver,
    loader: L,
    cache: HashMap<String, Rc<T>>,
}

impl<T: DeserializeOwned> Resolver<T> {
    /// A resolver that deserializes files straight into `T`.
    pub fn yaml(files: FileResolver) -> Self {
        Self::new(files, YamlLoader::default())
    }
}

impl<T, L: Loader<T>> Resolver<T, L> {
    pub fn new(files: FileResolver, loader: L) -> Self {
        Self {
            files,
            loader,
            cache: HashMap::new(),
        }
    }

    pub fn files(&self) -> &FileResolver {
        &self.files
    }

    /// Load `path` relative to the base directory.
    ///
    /// # Errors
    ///
    /// File errors from [`FileResolver`]; `Parse` when the loader rejects
    /// the bytes.
    pub fn resolve(&mut self, path: &str) -> Result<Rc<T>, SpecError> {
        let key = self.files.key(path)?;
        self.load_key(key, path)
    }

    /// Load `path` relative to `anchor`.
    ///
    /// # Errors
    ///
    /// Same as [`Resolver::resolve`].
    pub fn resolve_from(&mut self, anchor: &str, path: &str) -> Result<Rc<T>, SpecError> {
        let key = self.files.key_from(anchor, path)?;
        self.load_key(key, path)
    }

    /// The cached value for a canonical key, if loaded.
    pub fn cached(&self, key: &str) -> Option<Rc<T>> {
        self.cache.get(key).cloned()
    }

    /// Number of distinct files parsed so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn load_key(&mut self, key: String, original: &str) -> Result<Rc<T>, SpecError> {
        if let Some(hit) = self.cache.get(&key) {
            trace!(%key, "resolver cache hit");
            return Ok(Rc::clone(hit));
        }
        let data = self.files.read_key(&key, original)?;
        let default_name = file_stem(&key);
        let value = self
            .loader
            .load(&data, default_name)
            .map_err(|source| SpecError::Parse {
                path: key.clone(),
                source,
            })?;
        debug!(%key, "loaded file");
        let value = Rc::new(value);
        self.cache.insert(key, Rc::clone(&value));
        Ok(value)
    }
}

/// Base name without a YAML extension.
pub fn file_stem(path: &str) -> &str {
    let base = base_name(path);
    base.strip_suffix(".yaml")
        .or_else(|| base.strip_suffix(".yml"))
        .unwrap_or(base)
}
