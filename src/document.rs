//! The root OpenAPI document and its raw wire types.
//!
//! Raw types mirror the YAML closely and carry no computed state. The parser
//! turns them into the resolved [`Spec`](crate::spec::Spec); the bundler works
//! on the untyped tree instead.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::discovery::Tag;
use crate::error::SpecError;
use crate::includes::{build_include_fs, IncludeRegistry};
use crate::reference::Ref;
use crate::resolver::FileResolver;
use crate::schema::Schema;
use crate::types::{CrudKind, HttpMethod, ParamLocation};
use crate::vfs::{base_name, parent_dir, DirFs, SharedFs};

/// One security requirement: scheme name to scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// `info` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawInfo {
    pub title: String,
    pub description: String,
    pub version: String,
}

/// Root document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub openapi: String,
    pub info: RawInfo,
    #[serde(rename = "x-project-name")]
    pub x_project_name: String,
    pub paths: IndexMap<String, Ref<RawPathItem>>,
    pub components: RawComponents,
    pub security: Option<Vec<SecurityRequirement>>,
    pub tags: Vec<Tag>,
}

/// `components` block of the root document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawComponents {
    pub schemas: IndexMap<String, Ref<Schema>>,
    pub responses: IndexMap<String, Ref<RawResponse>>,
    pub parameters: IndexMap<String, Ref<RawParameter>>,
    pub headers: IndexMap<String, Value>,
    pub security_schemes: IndexMap<String, Ref<SecurityScheme>>,
}

/// A security scheme definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A path item, from the root `paths` map or a `paths/*.yaml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPathItem {
    /// Required on discovered path files.
    #[serde(rename = "x-path")]
    pub x_path: Option<String>,
    pub summary: String,
    pub description: String,
    pub get: Option<RawOperation>,
    pub put: Option<RawOperation>,
    pub post: Option<RawOperation>,
    pub delete: Option<RawOperation>,
    pub patch: Option<RawOperation>,
    pub parameters: Vec<Ref<RawParameter>>,
}

impl RawPathItem {
    /// Declared operations in [`HttpMethod::ALL`] order.
    pub fn operations(&self) -> Vec<(HttpMethod, &RawOperation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| self.operation(method).map(|op| (method, op)))
            .collect()
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&RawOperation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }
}

/// One operation of a path item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawOperation {
    pub operation_id: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    /// `None` inherits the root schemes; `Some([{}])` marks a public endpoint.
    pub security: Option<Vec<SecurityRequirement>>,
    pub parameters: Vec<Ref<RawParameter>>,
    pub request_body: Option<Ref<RawRequestBody>>,
    pub responses: IndexMap<String, Ref<RawResponse>>,
    #[serde(rename = "x-internal")]
    pub x_internal: Option<String>,
    #[serde(rename = "x-codegen-custom-handler")]
    pub x_codegen_custom_handler: bool,
    #[serde(rename = "x-public-endpoint")]
    pub x_public_endpoint: bool,
    #[serde(rename = "x-codegen-crud")]
    pub x_codegen_crud: Option<CrudKind>,
}

/// A parameter, inline or from `components/parameters`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Option<ParamLocation>,
    pub description: String,
    pub required: bool,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub schema: Option<Ref<Schema>>,
}

/// A request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRequestBody {
    pub description: String,
    pub required: bool,
    pub content: IndexMap<String, RawMediaType>,
}

/// A media type entry under `content`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMediaType {
    pub schema: Option<Ref<Schema>>,
    pub example: Option<Value>,
}

/// A response, inline or from `components/responses`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawResponse {
    pub description: String,
    pub content: IndexMap<String, RawMediaType>,
    pub headers: IndexMap<String, Value>,
}

/// A loaded root document together with the filesystem it lives on.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    fs: SharedFs,
    root_path: String,
    root_dir: String,
    raw: RawDocument,
    tree: serde_yaml::Value,
}

impl OpenApiDocument {
    /// Read and parse the root document at `root_path` on `fs`.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Io` if the file cannot be read, `Parse` for malformed YAML,
    /// `InvalidDocument` if the root is not a mapping.
    pub fn from_fs(fs: SharedFs, root_path: &str) -> Result<Self, SpecError> {
        let files = FileResolver::new(fs.clone(), "");
        let data = files.read(root_path)?;
        let tree: serde_yaml::Value =
            serde_yaml::from_slice(&data).map_err(|source| SpecError::Parse {
                path: root_path.to_string(),
                source,
            })?;
        if !tree.is_mapping() {
            return Err(SpecError::InvalidDocument {
                path: root_path.to_string(),
                message: "root must be a mapping".to_string(),
            });
        }
        let raw: RawDocument =
            serde_yaml::from_slice(&data).map_err(|source| SpecError::Parse {
                path: root_path.to_string(),
                source,
            })?;
        debug!(path = root_path, paths = raw.paths.len(), "loaded root document");
        Ok(Self {
            fs,
            root_path: root_path.to_string(),
            root_dir: parent_dir(root_path),
            raw,
            tree,
        })
    }

    /// Open a document on disk with the named includes layered beneath it.
    ///
    /// The directory holding `path` becomes the project layer.
    ///
    /// # Errors
    ///
    /// `UnknownInclude` for an unregistered include, otherwise as
    /// [`OpenApiDocument::from_fs`].
    pub fn open(
        path: &Path,
        includes: &[String],
        registry: &IncludeRegistry,
    ) -> Result<Self, SpecError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| SpecError::NotFound {
                path: path.display().to_string(),
            })?;
        let project = DirFs::new(dir).into_shared();
        let layered = build_include_fs(project, includes, registry)?;
        Self::from_fs(layered.into_shared(), &file)
    }

    pub fn fs(&self) -> &SharedFs {
        &self.fs
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Directory of the root document; discovery and refs start here.
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    pub fn file_name(&self) -> &str {
        base_name(&self.root_path)
    }

    pub fn raw(&self) -> &RawDocument {
        &self.raw
    }

    /// The untyped YAML tree of the root document.
    pub fn tree(&self) -> &serde_yaml::Value {
        &self.tree
    }

    /// A file resolver based at the root document's directory.
    pub fn file_resolver(&self) -> FileResolver {
        FileResolver::new(self.fs.clone(), self.root_dir.clone())
    }

    /// `x-project-name`, falling back to `info.title`.
    pub fn project_name(&self) -> &str {
        if self.raw.x_project_name.is_empty() {
            &self.raw.info.title
        } else {
            &self.raw.x_project_name
        }
    }
}
