//! Include packages and composition of the layered project filesystem.
//!
//! An include package is a named filesystem of schemas, paths and tags that a
//! project can pull in beneath its own files. The `server` package ships with
//! the crate.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::SpecError;
use crate::vfs::{LayeredFs, MemoryFs, SharedFs};

/// Name of the layer holding the project's own files.
pub const PROJECT_LAYER: &str = "project";

/// Name of the built-in server include.
pub const SERVER_INCLUDE: &str = "server";

const SERVER_FILES: &[(&str, &str)] = &[
    (
        "components/schemas/Base.yaml",
        include_str!("../includes/server/components/schemas/Base.yaml"),
    ),
    (
        "components/schemas/FilterNode.yaml",
        include_str!("../includes/server/components/schemas/FilterNode.yaml"),
    ),
    (
        "components/schemas/Health.yaml",
        include_str!("../includes/server/components/schemas/Health.yaml"),
    ),
    (
        "components/schemas/Page.yaml",
        include_str!("../includes/server/components/schemas/Page.yaml"),
    ),
    (
        "components/schemas/PaginationMeta.yaml",
        include_str!("../includes/server/components/schemas/PaginationMeta.yaml"),
    ),
    (
        "components/schemas/Problem.yaml",
        include_str!("../includes/server/components/schemas/Problem.yaml"),
    ),
    (
        "components/schemas/UUID.yaml",
        include_str!("../includes/server/components/schemas/UUID.yaml"),
    ),
    (
        "paths/health.yaml",
        include_str!("../includes/server/paths/health.yaml"),
    ),
    (
        "tags/server.yaml",
        include_str!("../includes/server/tags/server.yaml"),
    ),
];

/// Named include packages available to a project.
#[derive(Debug, Clone, Default)]
pub struct IncludeRegistry {
    packages: BTreeMap<String, SharedFs>,
}

impl IncludeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the packages that ship with the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SERVER_INCLUDE, server_include());
        registry
    }

    /// Register (or replace) a package.
    pub fn register(&mut self, name: impl Into<String>, fs: SharedFs) {
        self.packages.insert(name.into(), fs);
    }

    pub fn get(&self, name: &str) -> Option<&SharedFs> {
        self.packages.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

/// The built-in `server` package.
pub fn server_include() -> SharedFs {
    let mut fs = MemoryFs::new();
    for (path, content) in SERVER_FILES {
        fs.insert(path, *content);
    }
    fs.into_shared()
}

/// Compose the project filesystem with the named includes.
///
/// The project layer always wins. Among includes, an earlier name shadows a
/// later one.
///
/// # Errors
///
/// Returns `SpecError::UnknownInclude` for a name missing from `registry`.
pub fn build_include_fs(
    project: SharedFs,
    includes: &[String],
    registry: &IncludeRegistry,
) -> Result<LayeredFs, SpecError> {
    let mut layered = LayeredFs::new(PROJECT_LAYER, project);
    for name in includes {
        let Some(fs) = registry.get(name) else {
            return Err(SpecError::UnknownInclude { name: name.clone() });
        };
        debug!(include = %name, "layering include package");
        layered.push_below(name.clone(), fs.clone());
    }
    Ok(layered)
}
