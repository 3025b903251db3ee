//! Convention-based discovery of component, path and tag files.
//!
//! A project (and every include layer under it) may hold:
//!
//! ```text
//! components/schemas/*.yaml
//! components/responses/*.yaml
//! components/parameters/*.yaml
//! components/headers/*.yaml
//! components/securitySchemes/*.yaml
//! paths/*.yaml
//! tags/*.yaml
//! ```
//!
//! A missing directory is not an error; it simply contributes nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SpecError;
use crate::resolver::file_stem;
use crate::types::ComponentKind;
use crate::vfs::{is_yaml_file, join_path, walk, FileSystem, FsError};

pub const PATHS_DIR: &str = "paths";
pub const TAGS_DIR: &str = "tags";

/// Directory that holds components of `kind`, relative to the document root.
pub fn component_dir(kind: ComponentKind) -> String {
    format!("components/{}", kind.as_str())
}

/// YAML files below `dir`, or nothing if `dir` does not exist.
///
/// # Errors
///
/// Propagates I/O failures other than not-found.
pub fn yaml_files(fs: &dyn FileSystem, dir: &str) -> Result<Vec<String>, SpecError> {
    match walk(fs, dir) {
        Ok(files) => Ok(files.into_iter().filter(|f| is_yaml_file(f)).collect()),
        Err(FsError::NotFound { .. }) => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

/// Component files of `kind` under `root`, keyed by file stem.
///
/// Paths in the result are relative to `root`. When two files share a stem
/// the first in sorted order is kept.
///
/// # Errors
///
/// Propagates I/O failures other than not-found.
pub fn discover_components(
    fs: &dyn FileSystem,
    root: &str,
    kind: ComponentKind,
) -> Result<BTreeMap<String, String>, SpecError> {
    let dir = component_dir(kind);
    let Some(full) = join_path(root, &dir) else {
        return Ok(BTreeMap::new());
    };
    let mut found = BTreeMap::new();
    for file in yaml_files(fs, &full)? {
        let relative = relative_to(root, &file);
        let name = file_stem(&relative).to_string();
        if let Some(existing) = found.get(&name) {
            warn!(%name, kept = %existing, skipped = %relative, "duplicate component file name");
            continue;
        }
        found.insert(name, relative);
    }
    debug!(kind = kind.as_str(), count = found.len(), "discovered components");
    Ok(found)
}

/// Path item files under `root`, relative to it, sorted.
///
/// # Errors
///
/// Propagates I/O failures other than not-found.
pub fn discover_paths(fs: &dyn FileSystem, root: &str) -> Result<Vec<String>, SpecError> {
    let Some(full) = join_path(root, PATHS_DIR) else {
        return Ok(Vec::new());
    };
    Ok(yaml_files(fs, &full)?
        .iter()
        .map(|f| relative_to(root, f))
        .collect())
}

/// A tag entry from the root document or a `tags/*.yaml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Tags from every `tags/*.yaml` file under `root`, in file order.
///
/// Each file holds a YAML list of tags. Unreadable or malformed files are
/// skipped with a warning.
///
/// # Errors
///
/// Propagates I/O failures from listing the directory.
pub fn discover_tags(fs: &dyn FileSystem, root: &str) -> Result<Vec<Tag>, SpecError> {
    let Some(full) = join_path(root, TAGS_DIR) else {
        return Ok(Vec::new());
    };
    let mut tags = Vec::new();
    for file in yaml_files(fs, &full)? {
        let data = match fs.read(&file) {
            Ok(data) => data,
            Err(err) => {
                warn!(file = %file, error = %err, "skipping unreadable tag file");
                continue;
            }
        };
        match serde_yaml::from_slice::<Vec<Tag>>(&data) {
            Ok(file_tags) => tags.extend(file_tags),
            Err(err) => warn!(file = %file, error = %err, "skipping malformed tag file"),
        }
    }
    Ok(tags)
}

fn relative_to(root: &str, path: &str) -> String {
    if root.is_empty() || root == "." {
        return path.to_string();
    }
    path.strip_prefix(root)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    fn fixture() -> MemoryFs {
        MemoryFs::new()
            .with_file("api/openapi.yaml", "openapi: 3.1.0\n")
            .with_file("api/components/schemas/User.yaml", "title: User\n")
            .with_file("api/components/schemas/auth/Session.yaml", "title: Session\n")
            .with_file("api/components/schemas/notes.txt", "ignored")
            .with_file("api/components/responses/NotFound.yaml", "description: nf\n")
            .with_file("api/paths/users.yaml", "x-path: /users\n")
            .with_file("api/paths/users_id.yml", "x-path: /users/{id}\n")
            .with_file(
                "api/tags/core.yaml",
                "- name: Users\n  description: People\n- name: Auth\n",
            )
            .with_file("api/tags/broken.yaml", "name: [\n")
    }

    #[test]
    fn components_keyed_by_stem() {
        let fs = fixture();
        let schemas = discover_components(&fs, "api", ComponentKind::Schemas).unwrap();
        assert_eq!(
            schemas.into_iter().collect::<Vec<_>>(),
            vec![
                (
                    "Session".to_string(),
                    "components/schemas/auth/Session.yaml".to_string()
                ),
                ("User".to_string(), "components/schemas/User.yaml".to_string()),
            ]
        );
    }

    #[test]
    fn missing_component_dir_is_empty() {
        let fs = fixture();
        let headers = discover_components(&fs, "api", ComponentKind::Headers).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn paths_are_relative_and_sorted() {
        let fs = fixture();
        assert_eq!(
            discover_paths(&fs, "api").unwrap(),
            vec!["paths/users.yaml", "paths/users_id.yml"]
        );
        assert!(discover_paths(&MemoryFs::new(), ".").unwrap().is_empty());
    }

    #[test]
    fn tags_skip_malformed_files() {
        let fs = fixture();
        let tags = discover_tags(&fs, "api").unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Users", "Auth"]);
        assert_eq!(tags[0].description, "People");
    }
}
