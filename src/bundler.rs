//! Collapses a multi-file document into one self-contained document.
//!
//! Every file `$ref` in the output is rewritten to `#/components/<section>/<name>`.
//! Component files that are referenced but not discovered (nested schema
//! directories, `requestBodies/` fragments) are pulled into the matching
//! section, so no reference is left dangling.
//!
//! Output is deterministic: tags and component entries are sorted by name,
//! paths by [`compare_paths`], and every mapping by [`crate::keyorder`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::discovery::{discover_components, discover_paths, discover_tags};
use crate::document::OpenApiDocument;
use crate::error::SpecError;
use crate::includes::IncludeRegistry;
use crate::keyorder;
use crate::resolver::FileResolver;
use crate::schema::ref_name;
use crate::types::ComponentKind;

/// OpenAPI version written into every bundle.
pub const BUNDLE_OPENAPI_VERSION: &str = "3.1.0";

/// Health-check paths, always sorted after everything else.
pub const SPECIAL_PATHS: &[&str] = &["/health", "/healthz", "/livez", "/readyz"];

const REQUEST_BODIES: &str = "requestBodies";

/// Bundle the document at `path` with the named built-in includes.
///
/// # Errors
///
/// Any fatal [`SpecError`] from loading the root or a path file.
pub fn bundle_file(path: &Path, includes: &[String]) -> Result<Value, SpecError> {
    let doc = OpenApiDocument::open(path, includes, &IncludeRegistry::builtin())?;
    Bundler::new(&doc).bundle()
}

/// Render a bundle as `yaml` or `json`.
///
/// # Errors
///
/// `UnsupportedFormat` for any other format, `Render` if encoding fails.
pub fn render(bundle: &Value, format: &str) -> Result<String, SpecError> {
    match format {
        "yaml" | "yml" => serde_yaml::to_string(bundle).map_err(|e| SpecError::Render {
            message: e.to_string(),
        }),
        "json" => {
            let json = serde_json::to_value(bundle).map_err(|e| SpecError::Render {
                message: e.to_string(),
            })?;
            let mut out = serde_json::to_string_pretty(&json).map_err(|e| SpecError::Render {
                message: e.to_string(),
            })?;
            out.push('\n');
            Ok(out)
        }
        other => Err(SpecError::UnsupportedFormat {
            format: other.to_string(),
        }),
    }
}

/// Order path keys: special paths last, then by stem, the bare path before
/// its parameterized variants, then lexically.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    is_special(a)
        .cmp(&is_special(b))
        .then_with(|| path_stem(a).cmp(path_stem(b)))
        .then_with(|| a.contains('{').cmp(&b.contains('{')))
        .then_with(|| a.cmp(b))
}

fn is_special(path: &str) -> bool {
    SPECIAL_PATHS.contains(&path)
}

/// Path up to its first parameter segment.
fn path_stem(path: &str) -> &str {
    path.split("/{").next().unwrap_or(path)
}

/// Component section a file reference points into.
fn ref_section(file: &str) -> &'static str {
    if file.contains("requestBodies/") {
        return REQUEST_BODIES;
    }
    ComponentKind::from_path(file)
        .unwrap_or(ComponentKind::Schemas)
        .as_str()
}

#[derive(Debug)]
struct PendingComponent {
    section: &'static str,
    name: String,
    key: String,
}

/// Assembles a bundle from one document.
#[derive(Debug)]
pub struct Bundler<'a> {
    doc: &'a OpenApiDocument,
    files: FileResolver,
    /// File key -> component name, for files already named.
    names: HashMap<String, String>,
    components: BTreeMap<&'static str, BTreeMap<String, Value>>,
    pending: VecDeque<PendingComponent>,
}

impl<'a> Bundler<'a> {
    pub fn new(doc: &'a OpenApiDocument) -> Self {
        Self {
            doc,
            files: doc.file_resolver(),
            names: HashMap::new(),
            components: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Build the bundled document tree.
    ///
    /// # Errors
    ///
    /// Fatal when a root path `$ref`, a discovered path file or a discovered
    /// component file cannot be read or parsed, or a path file lacks `x-path`.
    pub fn bundle(mut self) -> Result<Value, SpecError> {
        let discovered = self.discover_component_files()?;
        let root_components = self.root_components()?;

        for (section, name, value) in discovered {
            self.components
                .entry(section)
                .or_default()
                .entry(name)
                .or_insert(value);
        }
        for (section, name, value) in root_components {
            self.components.entry(section).or_default().insert(name, value);
        }

        let paths = self.paths()?;
        self.load_pending();

        let mut out = Mapping::new();
        out.insert("openapi".into(), BUNDLE_OPENAPI_VERSION.into());
        out.insert("x-project-name".into(), self.doc.project_name().into());
        out.insert("info".into(), self.info());
        if let Some(servers) = self.doc.tree().get("servers") {
            out.insert("servers".into(), servers.clone());
        }
        let tags = self.tags()?;
        if !tags.is_empty() {
            out.insert("tags".into(), Value::Sequence(tags));
        }
        if let Some(security) = self.doc.tree().get("security") {
            out.insert("security".into(), security.clone());
        }
        out.insert("paths".into(), Value::Mapping(paths));
        out.insert("components".into(), self.components_value());

        let mut bundle = Value::Mapping(out);
        keyorder::sort_with(&mut bundle, &|key| key == "paths");
        debug!(
            sections = self.components.len(),
            "bundled {}",
            self.doc.root_path()
        );
        Ok(bundle)
    }

    fn info(&self) -> Value {
        let info = &self.doc.raw().info;
        let mut map = Mapping::new();
        map.insert("title".into(), info.title.clone().into());
        if !info.description.is_empty() {
            map.insert("description".into(), info.description.clone().into());
        }
        map.insert("version".into(), info.version.clone().into());
        Value::Mapping(map)
    }

    /// Discovered and root tags, root wins, sorted by name.
    fn tags(&self) -> Result<Vec<Value>, SpecError> {
        let mut tags: BTreeMap<String, Value> = BTreeMap::new();
        for tag in discover_tags(self.doc.fs().as_ref(), self.doc.root_dir())? {
            let value = serde_yaml::to_value(&tag).map_err(|e| SpecError::Render {
                message: e.to_string(),
            })?;
            tags.entry(tag.name).or_insert(value);
        }
        if let Some(Value::Sequence(root)) = self.doc.tree().get("tags") {
            for tag in root {
                if let Some(name) = tag.get("name").and_then(Value::as_str) {
                    tags.insert(name.to_string(), tag.clone());
                }
            }
        }
        Ok(tags.into_values().collect())
    }

    /// Read every discovered component file and name it.
    ///
    /// All files are named before any is rewritten, so references between
    /// them pick up titles.
    fn discover_component_files(
        &mut self,
    ) -> Result<Vec<(&'static str, String, Value)>, SpecError> {
        let fs = self.doc.fs().clone();
        let mut loaded = Vec::new();
        for kind in ComponentKind::ALL {
            for (stem, relative) in discover_components(fs.as_ref(), self.doc.root_dir(), kind)? {
                let key = self.files.key(&relative)?;
                let value = self.read_value(&key, &relative)?;
                let name = match kind {
                    ComponentKind::Schemas => title_of(&value).unwrap_or(stem),
                    _ => stem,
                };
                self.names.entry(key).or_insert_with(|| name.clone());
                loaded.push((kind.as_str(), name, value, relative));
            }
        }
        let mut out = Vec::with_capacity(loaded.len());
        for (section, name, mut value, relative) in loaded {
            self.rewrite_refs(&mut value, &relative);
            out.push((section, name, value));
        }
        Ok(out)
    }

    /// Entries declared under the root `components`, inline or by `$ref`.
    fn root_components(&mut self) -> Result<Vec<(&'static str, String, Value)>, SpecError> {
        let mut out = Vec::new();
        let Some(Value::Mapping(components)) = self.doc.tree().get("components") else {
            return Ok(out);
        };
        let components = components.clone();
        for kind in ComponentKind::ALL {
            let Some(Value::Mapping(entries)) = components.get(kind.as_str()) else {
                continue;
            };
            for (name, entry) in entries {
                let name = keyorder::key_text(name);
                let (mut value, anchor) = match file_ref(entry) {
                    Some(reference) => {
                        let file = reference.split('#').next().unwrap_or(reference);
                        let key = self.files.key(file)?;
                        self.names.insert(key.clone(), name.clone());
                        (self.read_value(&key, file)?, file.to_string())
                    }
                    None => (entry.clone(), String::new()),
                };
                self.rewrite_refs(&mut value, &anchor);
                out.push((kind.as_str(), name, value));
            }
        }
        Ok(out)
    }

    /// Root paths (inline or `$ref`) plus discovered path files; root wins.
    fn paths(&mut self) -> Result<Mapping, SpecError> {
        let mut paths: Vec<(String, Value)> = Vec::new();
        if let Some(Value::Mapping(root)) = self.doc.tree().get("paths") {
            let root = root.clone();
            for (path, item) in root {
                let path = keyorder::key_text(&path);
                let (mut value, anchor) = match file_ref(&item) {
                    Some(reference) => {
                        let key = self.files.key(reference)?;
                        (self.read_value(&key, reference)?, reference.to_string())
                    }
                    None => (item, String::new()),
                };
                self.rewrite_refs(&mut value, &anchor);
                paths.push((path, value));
            }
        }

        let fs = self.doc.fs().clone();
        for relative in discover_paths(fs.as_ref(), self.doc.root_dir())? {
            let key = self.files.key(&relative)?;
            let mut value = self.read_value(&key, &relative)?;
            let Some(x_path) = value.get("x-path").and_then(Value::as_str).map(String::from) else {
                return Err(SpecError::MissingXPath { path: relative });
            };
            if paths.iter().any(|(p, _)| *p == x_path) {
                debug!(path = %x_path, file = %relative, "explicit path wins over discovered file");
                continue;
            }
            self.rewrite_refs(&mut value, &relative);
            paths.push((x_path, value));
        }

        paths.sort_by(|(a, _), (b, _)| compare_paths(a, b));
        Ok(paths
            .into_iter()
            .map(|(path, item)| (Value::String(path), item))
            .collect())
    }

    /// Pull in referenced files that no section holds yet.
    fn load_pending(&mut self) {
        while let Some(next) = self.pending.pop_front() {
            if self
                .components
                .get(next.section)
                .is_some_and(|entries| entries.contains_key(&next.name))
            {
                continue;
            }
            let relative = self.files.relative(&next.key);
            let mut value = match self.read_value(&next.key, &relative) {
                Ok(value) => value,
                Err(err) => {
                    warn!(file = %relative, error = %err, "referenced component not embedded");
                    continue;
                }
            };
            // Claim the slot first so self-references terminate.
            self.components
                .entry(next.section)
                .or_default()
                .insert(next.name.clone(), Value::Null);
            self.rewrite_refs(&mut value, &relative);
            debug!(section = next.section, name = %next.name, "embedded referenced component");
            self.components
                .entry(next.section)
                .or_default()
                .insert(next.name, value);
        }
    }

    fn components_value(&self) -> Value {
        let mut map = Mapping::new();
        for (section, entries) in &self.components {
            if entries.is_empty() {
                continue;
            }
            let section_map: Mapping = entries
                .iter()
                .map(|(name, value)| (Value::String(name.clone()), value.clone()))
                .collect();
            map.insert(Value::String((*section).to_string()), Value::Mapping(section_map));
        }
        Value::Mapping(map)
    }

    fn read_value(&self, key: &str, original: &str) -> Result<Value, SpecError> {
        let data = self.files.read_key(key, original)?;
        serde_yaml::from_slice(&data).map_err(|source| SpecError::Parse {
            path: original.to_string(),
            source,
        })
    }

    /// Rewrite every file `$ref` below `value`; `anchor` is the file it came from.
    fn rewrite_refs(&mut self, value: &mut Value, anchor: &str) {
        match value {
            Value::Mapping(map) => {
                for (key, child) in map.iter_mut() {
                    if key.as_str() == Some("$ref") {
                        if let Value::String(reference) = child {
                            if is_file_ref(reference) {
                                *reference = self.internal_ref(anchor, reference);
                            }
                        }
                    } else {
                        self.rewrite_refs(child, anchor);
                    }
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    self.rewrite_refs(item, anchor);
                }
            }
            Value::Tagged(tagged) => self.rewrite_refs(&mut tagged.value, anchor),
            _ => {}
        }
    }

    fn internal_ref(&mut self, anchor: &str, reference: &str) -> String {
        let file = reference.split('#').next().unwrap_or(reference);
        let section = ref_section(file);
        let name = match self.files.key_from(anchor, file) {
            Ok(key) => {
                let name = self.component_name(section, &key, file);
                self.pending.push_back(PendingComponent {
                    section,
                    name: name.clone(),
                    key,
                });
                name
            }
            Err(err) => {
                warn!(reference, error = %err, "reference escapes the document root");
                ref_name(file).to_string()
            }
        };
        format!("#/components/{section}/{name}")
    }

    /// Name for the file at `key`: its title for schemas, else its stem.
    fn component_name(&mut self, section: &str, key: &str, file: &str) -> String {
        if let Some(name) = self.names.get(key) {
            return name.clone();
        }
        let stem = ref_name(file).to_string();
        let name = if section == ComponentKind::Schemas.as_str() {
            self.read_value(key, file)
                .ok()
                .and_then(|value| title_of(&value))
                .unwrap_or(stem)
        } else {
            stem
        };
        self.names.insert(key.to_string(), name.clone());
        name
    }
}

fn is_file_ref(reference: &str) -> bool {
    !reference.is_empty() && !reference.starts_with('#') && !reference.contains("://")
}

/// The `$ref` target of a pure reference entry.
fn file_ref(value: &Value) -> Option<&str> {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .filter(|r| is_file_ref(r))
}

fn title_of(value: &Value) -> Option<String> {
    value
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use pretty_assertions::assert_eq;

    const ROOT: &str = "openapi: 3.0.3\ninfo:\n  title: Demo\n  version: 1.0.0\nx-project-name: demo\n";

    fn bundle(files: &[(&str, &str)]) -> Value {
        try_bundle(files).unwrap()
    }

    fn try_bundle(files: &[(&str, &str)]) -> Result<Value, SpecError> {
        let mut fs = MemoryFs::new();
        for (path, content) in files {
            fs.insert(path, *content);
        }
        let doc = OpenApiDocument::from_fs(fs.into_shared(), "openapi.yaml")?;
        Bundler::new(&doc).bundle()
    }

    fn keys(value: &Value) -> Vec<String> {
        value
            .as_mapping()
            .map(|m| m.keys().map(keyorder::key_text).collect())
            .unwrap_or_default()
    }

    fn all_refs(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Mapping(map) => {
                for (k, v) in map {
                    if k.as_str() == Some("$ref") {
                        if let Some(r) = v.as_str() {
                            out.push(r.to_string());
                        }
                    } else {
                        all_refs(v, out);
                    }
                }
            }
            Value::Sequence(items) => items.iter().for_each(|i| all_refs(i, out)),
            _ => {}
        }
    }

    // === Path order ===

    mod path_order {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn bare_path_before_parameterized() {
            let mut paths = vec!["/users/{id}", "/health", "/orgs", "/users", "/users/{id}/posts"];
            paths.sort_by(|a, b| compare_paths(a, b));
            assert_eq!(
                paths,
                vec!["/orgs", "/users", "/users/{id}", "/users/{id}/posts", "/health"]
            );
        }

        #[test]
        fn special_paths_sort_last_among_themselves() {
            let mut paths = vec!["/readyz", "/health", "/zebra"];
            paths.sort_by(|a, b| compare_paths(a, b));
            assert_eq!(paths, vec!["/zebra", "/health", "/readyz"]);
        }
    }

    // === Assembly ===

    mod assembly {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn header_and_section_order() {
            let out = bundle(&[
                ("openapi.yaml", ROOT),
                ("tags/users.yaml", "- name: Users\n  description: People\n"),
                (
                    "paths/users.yaml",
                    "x-path: /users\nget:\n  operationId: ListUsers\n  responses:\n    '200': {description: ok}\n",
                ),
            ]);
            assert_eq!(
                keys(&out),
                vec!["openapi", "x-project-name", "info", "tags", "paths", "components"]
            );
            assert_eq!(out["openapi"], Value::from("3.1.0"));
            assert_eq!(out["x-project-name"], Value::from("demo"));
            assert_eq!(out["tags"][0]["name"], Value::from("Users"));
        }

        #[test]
        fn root_tag_wins_and_tags_sorted() {
            let root = format!("{ROOT}tags:\n  - name: Users\n    description: Root users\n");
            let out = bundle(&[
                ("openapi.yaml", &root),
                (
                    "tags/all.yaml",
                    "- name: Users\n  description: From file\n- name: Billing\n",
                ),
            ]);
            let tags = out["tags"].as_sequence().unwrap();
            assert_eq!(tags.len(), 2);
            assert_eq!(tags[0]["name"], Value::from("Billing"));
            assert_eq!(tags[1]["description"], Value::from("Root users"));
        }

        #[test]
        fn explicit_path_wins_over_discovered() {
            let root = format!(
                "{ROOT}paths:\n  /users:\n    get:\n      operationId: RootListUsers\n      responses:\n        '200': {{description: ok}}\n"
            );
            let out = bundle(&[
                ("openapi.yaml", &root),
                (
                    "paths/users.yaml",
                    "x-path: /users\nget:\n  operationId: FileListUsers\n  responses:\n    '200': {description: ok}\n",
                ),
            ]);
            assert_eq!(
                out["paths"]["/users"]["get"]["operationId"],
                Value::from("RootListUsers")
            );
        }

        #[test]
        fn paths_follow_path_order() {
            let out = bundle(&[
                ("openapi.yaml", ROOT),
                ("paths/health.yaml", "x-path: /health\nget: {operationId: GetHealth}\n"),
                ("paths/user.yaml", "x-path: /users/{id}\nget: {operationId: GetUser}\n"),
                ("paths/users.yaml", "x-path: /users\nget: {operationId: ListUsers}\n"),
                ("paths/orgs.yaml", "x-path: /orgs\nget: {operationId: ListOrgs}\n"),
            ]);
            assert_eq!(keys(&out["paths"]), vec!["/orgs", "/users", "/users/{id}", "/health"]);
        }

        #[test]
        fn discovered_path_without_x_path_is_fatal() {
            let err = try_bundle(&[
                ("openapi.yaml", ROOT),
                ("paths/users.yaml", "get: {operationId: ListUsers}\n"),
            ])
            .unwrap_err();
            assert!(matches!(err, SpecError::MissingXPath { .. }));
        }

        #[test]
        fn root_component_wins_over_discovered() {
            let root = format!(
                "{ROOT}components:\n  schemas:\n    User:\n      type: object\n      description: root\n"
            );
            let out = bundle(&[
                ("openapi.yaml", &root),
                ("components/schemas/User.yaml", "title: User\ntype: object\ndescription: file\n"),
            ]);
            assert_eq!(
                out["components"]["schemas"]["User"]["description"],
                Value::from("root")
            );
        }

        #[test]
        fn schema_keyed_by_title() {
            let out = bundle(&[
                ("openapi.yaml", ROOT),
                ("components/schemas/user.yaml", "title: User\ntype: object\n"),
                ("components/schemas/Zed.yaml", "type: object\n"),
            ]);
            assert_eq!(keys(&out["components"]["schemas"]), vec!["User", "Zed"]);
        }
    }

    // === References ===

    mod references {
        use super::*;
        use pretty_assertions::assert_eq;

        fn fixture() -> Value {
            bundle(&[
                ("openapi.yaml", ROOT),
                (
                    "paths/users.yaml",
                    concat!(
                        "x-path: /users\n",
                        "post:\n",
                        "  operationId: CreateUser\n",
                        "  requestBody:\n",
                        "    $ref: ../components/requestBodies/CreateUser.yaml\n",
                        "  parameters:\n",
                        "    - $ref: ../components/parameters/Limit.yaml\n",
                        "  responses:\n",
                        "    '201':\n",
                        "      $ref: ../components/responses/UserCreated.yaml\n",
                    ),
                ),
                (
                    "components/requestBodies/CreateUser.yaml",
                    "content:\n  application/json:\n    schema:\n      $ref: ../schemas/user.yaml\n",
                ),
                ("components/parameters/Limit.yaml", "name: limit\nin: query\nschema: {type: integer}\n"),
                (
                    "components/responses/UserCreated.yaml",
                    "description: created\ncontent:\n  application/json:\n    schema:\n      $ref: ../schemas/user.yaml#/properties\n",
                ),
                (
                    "components/schemas/user.yaml",
                    "title: User\ntype: object\nproperties:\n  address:\n    $ref: ./nested/Address.yaml\n",
                ),
                (
                    "components/schemas/nested/Address.yaml",
                    "title: PostalAddress\ntype: object\nproperties:\n  line: {type: string}\n  next:\n    $ref: ./Address.yaml\n",
                ),
            ])
        }

        #[test]
        fn no_file_refs_remain() {
            let out = fixture();
            let mut refs = Vec::new();
            all_refs(&out, &mut refs);
            assert!(!refs.is_empty());
            for r in &refs {
                assert!(r.starts_with("#/components/"), "dangling ref {r}");
                assert!(!r.starts_with("./") && !r.starts_with("../"));
            }
        }

        #[test]
        fn every_internal_ref_has_a_target() {
            let out = fixture();
            let mut refs = Vec::new();
            all_refs(&out, &mut refs);
            for r in refs {
                let parts: Vec<&str> = r.trim_start_matches("#/components/").split('/').collect();
                assert!(
                    !out["components"][parts[0]][parts[1]].is_null(),
                    "missing target for {r}"
                );
            }
        }

        #[test]
        fn sections_follow_directories() {
            let out = fixture();
            let op = &out["paths"]["/users"]["post"];
            assert_eq!(
                op["requestBody"]["$ref"],
                Value::from("#/components/requestBodies/CreateUser")
            );
            assert_eq!(
                op["parameters"][0]["$ref"],
                Value::from("#/components/parameters/Limit")
            );
            assert_eq!(
                op["responses"]["201"]["$ref"],
                Value::from("#/components/responses/UserCreated")
            );
        }

        #[test]
        fn schema_refs_use_titles_and_ignore_fragments() {
            let out = fixture();
            let body = &out["components"]["requestBodies"]["CreateUser"];
            assert_eq!(
                body["content"]["application/json"]["schema"]["$ref"],
                Value::from("#/components/schemas/User")
            );
            let created = &out["components"]["responses"]["UserCreated"];
            assert_eq!(
                created["content"]["application/json"]["schema"]["$ref"],
                Value::from("#/components/schemas/User")
            );
        }

        #[test]
        fn nested_schema_embedded_under_title() {
            let out = fixture();
            let address = &out["components"]["schemas"]["PostalAddress"];
            assert_eq!(address["type"], Value::from("object"));
            assert_eq!(
                address["properties"]["next"]["$ref"],
                Value::from("#/components/schemas/PostalAddress")
            );
        }

        #[test]
        fn internal_and_remote_refs_untouched() {
            let out = bundle(&[
                ("openapi.yaml", ROOT),
                (
                    "components/schemas/Pet.yaml",
                    "title: Pet\nproperties:\n  owner: {$ref: '#/components/schemas/User'}\n  ext: {$ref: 'https://example.com/x.yaml'}\n",
                ),
            ]);
            let pet = &out["components"]["schemas"]["Pet"];
            assert_eq!(
                pet["properties"]["owner"]["$ref"],
                Value::from("#/components/schemas/User")
            );
            assert_eq!(
                pet["properties"]["ext"]["$ref"],
                Value::from("https://example.com/x.yaml")
            );
        }
    }

    // === Rendering ===

    mod rendering {
        use super::*;
        use pretty_assertions::assert_eq;

        fn sample() -> Value {
            bundle(&[
                ("openapi.yaml", ROOT),
                (
                    "paths/users.yaml",
                    "x-path: /users\nget:\n  responses:\n    200: {description: ok}\n  operationId: ListUsers\n",
                ),
            ])
        }

        #[test]
        fn rendering_is_byte_stable() {
            let first = render(&sample(), "yaml").unwrap();
            let second = render(&sample(), "yaml").unwrap();
            assert_eq!(first, second);
            assert!(first.starts_with("openapi: 3.1.0\nx-project-name: demo\ninfo:\n"));
            let op = first.find("operationId").unwrap();
            let responses = first.find("responses").unwrap();
            assert!(op < responses);
        }

        #[test]
        fn json_output_and_unknown_format() {
            let json = render(&sample(), "json").unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed["openapi"], "3.1.0");
            assert!(parsed["paths"]["/users"]["get"]["responses"]["200"].is_object());

            let err = render(&sample(), "toml").unwrap_err();
            assert!(matches!(err, SpecError::UnsupportedFormat { .. }));
        }
    }
}
