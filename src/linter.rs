//! Static checks over every file of a project.
//!
//! Reports per-file diagnostics for:
//! - YAML syntax errors
//! - broken `$ref`s (file missing, internal target missing)
//! - path files without `x-path`, schema files without `title`
//! - `x-public-endpoint` markers, which do not opt an operation out of auth
//! - property refs left unresolved and schema name collisions after parsing

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use crate::config::ParseOptions;
use crate::discovery::{yaml_files, PATHS_DIR, TAGS_DIR};
use crate::document::OpenApiDocument;
use crate::error::SpecError;
use crate::includes::{build_include_fs, IncludeRegistry};
use crate::keyorder::key_text;
use crate::loader::ResolutionReport;
use crate::parser::Parser;
use crate::resolver::{file_stem, FileResolver};
use crate::types::ComponentKind;
use crate::vfs::{parent_dir, DirFs, SharedFs};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: String,
    /// JSON pointer into the file (e.g. "/get/responses/200/$ref")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a project.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: String,
    pub strict: bool,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// True when no file failed. In strict mode warnings fail a file.
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Lint the project whose root document is `path`, with the named includes
/// layered beneath it.
///
/// # Errors
///
/// `UnknownInclude` for an unregistered include. Problems inside the
/// project's files are diagnostics, not errors.
pub fn lint_path(path: &Path, includes: &[String], strict: bool) -> Result<LintResult, SpecError> {
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
    let layered = build_include_fs(project, includes, &IncludeRegistry::builtin())?;
    Ok(lint(layered.into_shared(), &file, strict))
}

/// Lint every document file reachable from `root_path` on `fs`.
///
/// That is the root document plus all YAML under `components/`, `paths/` and
/// `tags/`. If `strict` is true, warnings are treated as errors.
pub fn lint(fs: SharedFs, root_path: &str, strict: bool) -> LintResult {
    let files = FileResolver::new(fs.clone(), parent_dir(root_path));
    let keys = collect_files(&files, root_path);

    let parsed: BTreeMap<String, Result<Value, String>> = keys
        .iter()
        .map(|key| {
            let value = files
                .read_key(key, key)
                .map_err(|e| e.to_string())
                .and_then(|data| serde_yaml::from_slice(&data).map_err(|e| e.to_string()));
            (key.clone(), value)
        })
        .collect();

    let root_key = files.key(root_path).unwrap_or_else(|_| root_path.to_string());
    let index = ComponentIndex::build(&files, &parsed, &root_key);
    let mut results: Vec<FileResult> = parsed
        .iter()
        .map(|(key, value)| lint_file(&files, key, value, &index))
        .collect();

    if let Some(report) = resolution_report(fs, root_path) {
        attach_report(&mut results, &files, &index, &root_key, &report);
    }
    for result in &mut results {
        result.status = file_status(&result.diagnostics);
    }

    let errors = count(&results, Severity::Error);
    let warnings = count(&results, Severity::Warning);
    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: root_path.to_string(),
        strict,
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

fn count(results: &[FileResult], severity: Severity) -> usize {
    results
        .iter()
        .flat_map(|r| &r.diagnostics)
        .filter(|d| d.severity == severity)
        .count()
}

fn file_status(diagnostics: &[Diagnostic]) -> FileStatus {
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    }
}

/// The root document and every YAML file under the convention dirs.
fn collect_files(files: &FileResolver, root_path: &str) -> Vec<String> {
    let mut keys = vec![files.key(root_path).unwrap_or_else(|_| root_path.to_string())];
    let fs = files.fs().as_ref();
    for dir in ["components", PATHS_DIR, TAGS_DIR] {
        let Ok(full) = files.key(dir) else {
            continue;
        };
        match yaml_files(fs, &full) {
            Ok(found) => keys.extend(found),
            Err(err) => debug!(dir, error = %err, "skipping unreadable directory"),
        }
    }
    keys
}

/// Names each component section will hold once bundled.
#[derive(Debug, Default)]
struct ComponentIndex {
    root: Value,
    names: HashSet<(String, String)>,
    /// Schema title or stem -> file key.
    schema_files: BTreeMap<String, String>,
}

impl ComponentIndex {
    fn build(
        files: &FileResolver,
        parsed: &BTreeMap<String, Result<Value, String>>,
        root_key: &str,
    ) -> Self {
        let mut index = ComponentIndex {
            root: parsed
                .get(root_key)
                .and_then(|r| r.as_ref().ok())
                .cloned()
                .unwrap_or(Value::Null),
            ..Default::default()
        };
        for (key, value) in parsed {
            let relative = files.relative(key);
            let Some(section) = section_of(&relative) else {
                continue;
            };
            let stem = file_stem(&relative).to_string();
            index.names.insert((section.to_string(), stem.clone()));
            if section == ComponentKind::Schemas.as_str() {
                index.schema_files.insert(stem, key.clone());
                if let Some(title) = value.as_ref().ok().and_then(title_of) {
                    index.names.insert((section.to_string(), title.clone()));
                    index.schema_files.insert(title, key.clone());
                }
            }
        }
        index
    }

    fn contains(&self, section: &str, name: &str) -> bool {
        self.names.contains(&(section.to_string(), name.to_string()))
            || !self.root["components"][section][name].is_null()
    }
}

/// Component section of a file under `components/<section>/`.
fn section_of(relative: &str) -> Option<&str> {
    let rest = relative.strip_prefix("components/")?;
    let (section, _) = rest.split_once('/')?;
    Some(section)
}

fn title_of(value: &Value) -> Option<String> {
    value
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Lint one already-read file.
fn lint_file(
    files: &FileResolver,
    key: &str,
    value: &Result<Value, String>,
    index: &ComponentIndex,
) -> FileResult {
    let relative = files.relative(key);
    let mut diagnostics = Vec::new();
    let mut push = |severity, code: &str, path: String, message: String| {
        diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: relative.clone(),
            path,
            message,
        });
    };

    let value = match value {
        Ok(value) => value,
        Err(e) => {
            push(Severity::Error, "E001", "/".to_string(), format!("syntax error: {}", e));
            return FileResult {
                file: relative.clone(),
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    let mut refs = Vec::new();
    collect_refs(value, "", &mut refs);
    for (path, reference) in refs {
        if let Some((code, message)) = check_ref(files, &relative, value, &reference, index) {
            push(Severity::Error, code, path, message);
        }
    }

    if relative.starts_with("paths/") && value.get("x-path").and_then(Value::as_str).is_none() {
        push(
            Severity::Error,
            "E006",
            "/".to_string(),
            "path file is missing required x-path".to_string(),
        );
    }

    if section_of(&relative) == Some(ComponentKind::Schemas.as_str()) && title_of(value).is_none()
    {
        push(
            Severity::Warning,
            "W002",
            "/".to_string(),
            format!("schema has no title; using \"{}\"", file_stem(&relative)),
        );
    }

    let mut markers = Vec::new();
    find_key(value, "x-public-endpoint", "", &mut markers);
    for path in markers {
        push(
            Severity::Warning,
            "W003",
            path,
            "x-public-endpoint does not disable auth; use `security: [{}]`".to_string(),
        );
    }

    FileResult {
        file: relative.clone(),
        status: file_status(&diagnostics),
        diagnostics,
    }
}

/// Every `$ref` string below `value` with its JSON pointer.
fn collect_refs(value: &Value, path: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = key_text(key);
                let child_path = format!("{}/{}", path, escape_pointer(&key));
                if key == "$ref" {
                    if let Some(reference) = child.as_str() {
                        out.push((child_path, reference.to_string()));
                    }
                } else {
                    collect_refs(child, &child_path, out);
                }
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_refs(item, &format!("{}/{}", path, i), out);
            }
        }
        _ => {}
    }
}

fn find_key(value: &Value, wanted: &str, path: &str, out: &mut Vec<String>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = key_text(key);
                let child_path = format!("{}/{}", path, escape_pointer(&key));
                if key == wanted {
                    out.push(child_path.clone());
                }
                find_key(child, wanted, &child_path, out);
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                find_key(item, wanted, &format!("{}/{}", path, i), out);
            }
        }
        _ => {}
    }
}

/// Check one `$ref`; returns the error code and message if it is broken.
fn check_ref(
    files: &FileResolver,
    anchor: &str,
    doc: &Value,
    reference: &str,
    index: &ComponentIndex,
) -> Option<(&'static str, String)> {
    // External URLs can't be validated locally
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return None;
    }

    if let Some(pointer) = reference.strip_prefix('#') {
        if pointer.is_empty() {
            return None;
        }
        let found = match component_target(pointer) {
            Some((section, name)) => index.contains(section, name),
            None => navigate(doc, pointer).is_some(),
        };
        return (!found).then(|| ("E003", format!("reference target not found: {}", reference)));
    }

    let (file, fragment) = match reference.split_once('#') {
        Some((file, fragment)) => (file, Some(fragment)),
        None => (reference, None),
    };
    let key = match files.key_from(anchor, file) {
        Ok(key) => key,
        Err(_) => return Some(("E002", format!("file not found: {}", file))),
    };
    let data = match files.read_key(&key, file) {
        Ok(data) => data,
        Err(_) => return Some(("E002", format!("file not found: {}", file))),
    };
    let fragment = fragment.filter(|f| !f.is_empty())?;
    // A malformed target is reported on its own file as E001
    let target: Value = serde_yaml::from_slice(&data).ok()?;
    navigate(&target, fragment)
        .is_none()
        .then(|| ("E003", format!("anchor not found in {}: #{}", file, fragment)))
}

/// `(section, name)` of a `/components/<section>/<name>` pointer.
fn component_target(pointer: &str) -> Option<(&str, &str)> {
    let rest = pointer.strip_prefix("/components/")?;
    let (section, name) = rest.split_once('/')?;
    (!name.contains('/')).then_some((section, name))
}

/// Follow a JSON pointer through a YAML tree.
fn navigate<'v>(value: &'v Value, pointer: &str) -> Option<&'v Value> {
    let mut current = value;
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Mapping(map) => map
                .iter()
                .find(|(k, _)| key_text(k) == segment)
                .map(|(_, v)| v)?,
            Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Parse the document to find what only resolution can tell.
fn resolution_report(fs: SharedFs, root_path: &str) -> Option<ResolutionReport> {
    let doc = OpenApiDocument::from_fs(fs, root_path).ok()?;
    let options = ParseOptions::default();
    match Parser::new(&doc, &options).parse() {
        Ok(spec) => Some(spec.report),
        Err(err) => {
            debug!(error = %err, "skipping resolution checks");
            None
        }
    }
}

fn attach_report(
    results: &mut [FileResult],
    files: &FileResolver,
    index: &ComponentIndex,
    root_key: &str,
    report: &ResolutionReport,
) {
    let root = files.relative(root_key);
    // Findings without a linted file of their own land on the root document
    let mut attach = |diagnostic: Diagnostic| {
        let position = results
            .iter()
            .position(|r| r.file == diagnostic.file)
            .or_else(|| results.iter().position(|r| r.file == root));
        if let Some(i) = position {
            let file = results[i].file.clone();
            results[i].diagnostics.push(Diagnostic { file, ..diagnostic });
        }
    };

    for unresolved in &report.unresolved {
        let file = index
            .schema_files
            .get(&unresolved.schema)
            .map(|key| files.relative(key))
            .unwrap_or_else(|| root.clone());
        attach(Diagnostic {
            severity: Severity::Warning,
            code: "W001".to_string(),
            file,
            path: format!("/properties/{}", escape_pointer(&unresolved.property)),
            message: format!(
                "unresolved reference {} in {}.{}",
                unresolved.path, unresolved.schema, unresolved.property
            ),
        });
    }

    for collision in &report.collisions {
        attach(Diagnostic {
            severity: Severity::Warning,
            code: "W004".to_string(),
            file: files.relative(&collision.skipped),
            path: "/".to_string(),
            message: format!(
                "schema name {} already defined by {}; this definition is ignored",
                collision.name,
                files.relative(&collision.kept)
            ),
        });
    }
}
