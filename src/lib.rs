//! specweave
//!
//! Resolution, inflation and bundling of multi-file OpenAPI specifications.
//!
//! A project is a root document plus convention directories
//! (`components/<kind>/`, `paths/`, `tags/`) layered over any number of
//! include packages. Parsing resolves every `$ref` into one typed [`Spec`];
//! bundling collapses the files into one document whose references are all
//! internal.
//!
//! # Example
//!
//! ```
//! use specweave::{render, Bundler, MemoryFs, OpenApiDocument, ParseOptions, Parser};
//!
//! let fs = MemoryFs::new()
//!     .with_file("openapi.yaml", "openapi: 3.1.0\ninfo: {title: Demo, version: 1.0.0}\n")
//!     .with_file(
//!         "components/schemas/User.yaml",
//!         "title: User\nx-codegen-schema-type: entity\nproperties:\n  email: {type: string}\n",
//!     )
//!     .into_shared();
//! let doc = OpenApiDocument::from_fs(fs, "openapi.yaml").unwrap();
//!
//! let spec = Parser::new(&doc, &ParseOptions::default()).parse().unwrap();
//! let user = spec.schema("User").unwrap();
//! // entities gain identifier and timestamp fields
//! assert!(user.has_property("ID"));
//! assert!(user.has_property("CreatedAt"));
//!
//! let bundle = Bundler::new(&doc).bundle().unwrap();
//! let yaml = render(&bundle, "yaml").unwrap();
//! assert!(yaml.starts_with("openapi: 3.1.0\n"));
//! ```
//!
//! # Layering
//!
//! | Layer | Wins over |
//! |-------|-----------|
//! | project files | every include |
//! | first include named | later includes |
//!
//! Within one layer, explicit entries in the root document win over
//! discovered files with the same name.

mod bundler;
mod config;
mod discovery;
mod document;
mod error;
mod includes;
mod inflater;
mod keyorder;
mod linter;
mod loader;
mod naming;
mod parser;
mod reference;
mod resolver;
mod schema;
mod spec;
mod typemap;
mod types;
mod validator;
mod vfs;

pub use bundler::{bundle_file, compare_paths, render, Bundler, BUNDLE_OPENAPI_VERSION};
pub use config::{
    CodegenConfig, ParseOptions, ProjectConfig, CONFIG_FILE, DEFAULT_MAX_DEPTH, DEFAULT_SPEC,
};
pub use discovery::{discover_components, discover_paths, discover_tags, Tag};
pub use document::{OpenApiDocument, RawDocument, SecurityScheme};
pub use error::{SchemaError, SpecError, ValidateError};
pub use includes::{build_include_fs, server_include, IncludeRegistry, SERVER_INCLUDE};
pub use inflater::{InflateConfig, Inflated, Inflater};
pub use keyorder::{compare_keys, sort_value};
pub use linter::{
    lint, lint_path, Diagnostic, FileResult, FileStatus, LintResult, Severity,
};
pub use loader::{
    add_base_fields, NameCollision, PropertyProcessor, ResolutionContext, ResolutionReport,
    UnresolvedRef,
};
pub use naming::{camel_case, pascal_case, pluralize};
pub use parser::{parse_file, Parser};
pub use reference::{Ref, RefState};
pub use resolver::{FileResolver, Loader, Resolver, SchemaLoader, YamlLoader};
pub use schema::{PropertyType, Schema, SchemaKind, SerializedName, XCodegen};
pub use spec::{
    EntityOperations, FieldSummary, ListParams, Operation, Param, RequestBody, Response,
    SchemaSummary, Security, Spec, SpecSummary,
};
pub use typemap::{mapper_for, PostgresTypeMapper, RustTypeMapper, TypeMapper};
pub use types::{ComponentKind, CrudKind, HttpMethod, ParamLocation, PrimitiveKind, TargetType};
pub use validator::{validate_against_schema, validate_payload};
pub use vfs::{DirFs, FileSystem, FsError, LayeredFs, MemoryFs, SharedFs};
