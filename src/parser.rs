//! Turns a root document and everything it references into a [`Spec`].
//!
//! Order of work:
//!
//! 1. response content types from `components/responses`
//! 2. schemas: explicit `components.schemas`, then discovered files
//! 3. second pass over property references, target names remapped
//! 4. response envelopes for entities
//! 5. operations from explicit paths, then discovered path files
//! 6. list parameters for list operations
//!
//! Each parse gets a fresh [`ResolutionContext`]; nothing is shared between
//! parses.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::ParseOptions;
use crate::discovery::{component_dir, discover_components, discover_paths, discover_tags, Tag};
use crate::document::{
    OpenApiDocument, RawMediaType, RawOperation, RawParameter, RawPathItem, RawRequestBody,
    RawResponse, SecurityRequirement, SecurityScheme,
};
use crate::error::SpecError;
use crate::includes::IncludeRegistry;
use crate::inflater::{
    list_response_wrapper, no_content_schema, problem_schema, response_wrapper,
    standard_error_responses, InflateConfig, Inflater, NO_CONTENT_SCHEMA, PROBLEM_SCHEMA,
};
use crate::loader::{PropertyProcessor, ResolutionContext};
use crate::naming::pascal_case;
use crate::reference::Ref;
use crate::resolver::{FileResolver, Resolver};
use crate::schema::{ref_name, PropertyType, Schema, SerializedName};
use crate::spec::{Operation, Param, RequestBody, Response, Security, Spec};
use crate::types::{
    ComponentKind, HttpMethod, ParamLocation, TargetType, CONTENT_TYPE_JSON,
    CONTENT_TYPE_PROBLEM_JSON, FORMAT_UUID, TYPE_STRING,
};

/// Parse the document at `path` with the built-in include packages.
///
/// # Errors
///
/// Any fatal [`SpecError`] from loading or resolution.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Spec, SpecError> {
    let doc = OpenApiDocument::open(path, &options.includes, &IncludeRegistry::builtin())?;
    Parser::new(&doc, options).parse()
}

/// One parse of one document.
#[derive(Debug)]
pub struct Parser<'a> {
    doc: &'a OpenApiDocument,
    options: &'a ParseOptions,
    ctx: ResolutionContext,
    path_items: Resolver<RawPathItem>,
    responses: Resolver<RawResponse>,
    parameters: Resolver<RawParameter>,
    bodies: Resolver<RawRequestBody>,
    schemes: Resolver<SecurityScheme>,
    security_schemes: BTreeMap<String, SecurityScheme>,
    problem_used: bool,
    no_content_used: bool,
}

/// A path item together with the file its relative refs start from.
struct PathEntry {
    template: String,
    item: Rc<RawPathItem>,
    /// `""` for items inline in the root document.
    anchor: String,
}

impl<'a> Parser<'a> {
    pub fn new(doc: &'a OpenApiDocument, options: &'a ParseOptions) -> Self {
        let files = doc.file_resolver();
        Self {
            doc,
            options,
            ctx: ResolutionContext::new(files.clone()).with_max_depth(options.max_depth),
            path_items: Resolver::yaml(files.clone()),
            responses: Resolver::yaml(files.clone()),
            parameters: Resolver::yaml(files.clone()),
            bodies: Resolver::yaml(files.clone()),
            schemes: Resolver::yaml(files),
            security_schemes: BTreeMap::new(),
            problem_used: false,
            no_content_used: false,
        }
    }

    fn files(&self) -> &FileResolver {
        self.ctx.files()
    }

    /// Run the parse.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Io`/`Parse` for an explicitly referenced file that cannot
    /// be loaded, `MissingXPath` for a discovered path file without `x-path`.
    pub fn parse(mut self) -> Result<Spec, SpecError> {
        self.load_response_content_types()?;
        self.load_schemas()?;

        let inflater = Inflater::new(self.options.inflate);
        if self.options.inflate.response_wrappers {
            for (_, wrapper) in inflater.response_wrappers(self.ctx.schemas()) {
                self.ctx.insert(wrapper);
            }
        }

        self.load_security_schemes()?;
        let mut operations = self.load_paths()?;
        operations.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));

        if self.options.inflate.list_params {
            let list_only = Inflater::new(InflateConfig {
                response_wrappers: false,
                list_params: true,
            });
            let mut inflated = list_only.inflate(self.ctx.schemas(), &operations);
            for op in &mut operations {
                if let Some(params) = inflated.list_params.remove(&op.id) {
                    debug!(operation = %op.id, count = params.len(), "adding list parameters");
                    op.parameters.extend(params);
                }
            }
        }

        if self.problem_used && !self.ctx.contains(PROBLEM_SCHEMA) {
            self.ctx.insert(problem_schema());
        }
        if self.no_content_used && !self.ctx.contains(NO_CONTENT_SCHEMA) {
            self.ctx.insert(no_content_schema());
        }
        // Files loaded for request and response bodies may add references.
        self.ctx.resolve_pending();

        let tags = self.tags()?;
        let raw = self.doc.raw();
        let (schemas, report) = self.ctx.finish();
        info!(
            operations = operations.len(),
            schemas = schemas.len(),
            "parsed specification"
        );
        Ok(Spec {
            project_name: self.doc.project_name().to_string(),
            title: raw.info.title.clone(),
            description: raw.info.description.clone(),
            version: raw.info.version.clone(),
            operations,
            schemas,
            tags,
            security_schemes: self.security_schemes,
            includes: self.options.includes.clone(),
            codegen: self.options.codegen.clone(),
            report,
        })
    }

    // === Components ===

    fn discovered(&self, kind: ComponentKind) -> Result<BTreeMap<String, String>, SpecError> {
        discover_components(self.doc.fs().as_ref(), self.doc.root_dir(), kind)
    }

    fn load_response_content_types(&mut self) -> Result<(), SpecError> {
        for (name, path) in self.discovered(ComponentKind::Responses)? {
            let response = match self.responses.resolve(&path) {
                Ok(response) => response,
                Err(err) => {
                    warn!(file = %path, error = %err, "skipping unreadable response file");
                    continue;
                }
            };
            if let Some(content_type) = preferred_content_type(&response.content) {
                self.ctx.set_response_content_type(name, content_type);
            }
        }
        Ok(())
    }

    fn load_schemas(&mut self) -> Result<(), SpecError> {
        let doc = self.doc;
        for (key, entry) in &doc.raw().components.schemas {
            match entry {
                Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                    if path.starts_with('#') {
                        continue;
                    }
                    self.ctx.load_schema_file("", path)?;
                }
                Ref::Inline(draft) => {
                    self.ctx.load_inline_schema(key, draft);
                }
            }
        }
        for (name, path) in self.discovered(ComponentKind::Schemas)? {
            if self.ctx.resolve_name(&name).is_some() {
                continue;
            }
            self.ctx.load_schema_file("", &path)?;
        }
        self.ctx.resolve_pending();
        Ok(())
    }

    fn load_security_schemes(&mut self) -> Result<(), SpecError> {
        let doc = self.doc;
        for (name, entry) in &doc.raw().components.security_schemes {
            let scheme = match entry {
                Ref::Inline(scheme) => Some(scheme.clone()),
                Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                    match self.schemes.resolve(path) {
                        Ok(scheme) => Some(scheme.as_ref().clone()),
                        Err(err) => {
                            warn!(scheme = %name, error = %err, "skipping unreadable security scheme");
                            None
                        }
                    }
                }
            };
            if let Some(scheme) = scheme {
                self.security_schemes.insert(name.clone(), scheme);
            }
        }
        for (name, path) in self.discovered(ComponentKind::SecuritySchemes)? {
            if self.security_schemes.contains_key(&name) {
                continue;
            }
            match self.schemes.resolve(&path) {
                Ok(scheme) => {
                    self.security_schemes.insert(name, scheme.as_ref().clone());
                }
                Err(err) => warn!(file = %path, error = %err, "skipping unreadable security scheme"),
            }
        }
        Ok(())
    }

    fn tags(&self) -> Result<Vec<Tag>, SpecError> {
        let mut tags: BTreeMap<String, Tag> = BTreeMap::new();
        for tag in discover_tags(self.doc.fs().as_ref(), self.doc.root_dir())? {
            tags.entry(tag.name.clone()).or_insert(tag);
        }
        for tag in &self.doc.raw().tags {
            tags.insert(tag.name.clone(), tag.clone());
        }
        Ok(tags.into_values().collect())
    }

    // === Paths ===

    fn load_paths(&mut self) -> Result<Vec<Operation>, SpecError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let doc = self.doc;

        for (template, entry) in &doc.raw().paths {
            let (item, anchor) = match entry {
                Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                    (self.path_items.resolve(path)?, path.clone())
                }
                Ref::Inline(item) => (Rc::new(item.clone()), String::new()),
            };
            seen.insert(template.clone());
            entries.push(PathEntry {
                template: template.clone(),
                item,
                anchor,
            });
        }

        for file in discover_paths(doc.fs().as_ref(), doc.root_dir())? {
            let item = self.path_items.resolve(&file)?;
            let Some(template) = item.x_path.clone().filter(|p| !p.is_empty()) else {
                return Err(SpecError::MissingXPath { path: file });
            };
            if !seen.insert(template.clone()) {
                debug!(path = %template, file = %file, "path already defined; skipping file");
                continue;
            }
            entries.push(PathEntry {
                template,
                item,
                anchor: file,
            });
        }

        let mut operations = Vec::new();
        for entry in &entries {
            for (method, raw) in entry.item.operations() {
                operations.push(self.operation(entry, method, raw)?);
            }
        }
        Ok(operations)
    }

    // === Operations ===

    fn operation(
        &mut self,
        entry: &PathEntry,
        method: HttpMethod,
        raw: &RawOperation,
    ) -> Result<Operation, SpecError> {
        let path = entry.template.as_str();
        let id = if raw.operation_id.is_empty() {
            let generated = pascal_case(&format!(
                "{} {}",
                method.as_str().to_lowercase(),
                path.replace(['{', '}', '/'], " ")
            ));
            warn!(%path, method = %method, id = %generated, "operation without operationId");
            generated
        } else {
            raw.operation_id.clone()
        };

        let (security, public) = self.security(raw.security.as_deref());
        let mut parameters = self.operation_params(&id, &entry.item.parameters, &raw.parameters, &entry.anchor);
        add_path_params(path, &mut parameters);

        let request_body = match &raw.request_body {
            Some(body) => self.request_body(&id, method, body, &entry.anchor)?,
            None => None,
        };
        let responses = self.operation_responses(&id, path, &raw.responses, &entry.anchor)?;

        Ok(Operation {
            id,
            method,
            path: path.to_string(),
            summary: raw.summary.clone(),
            description: raw.description.clone(),
            tag: raw.tags.first().cloned().unwrap_or_default(),
            parameters,
            request_body,
            responses,
            security,
            public,
            public_endpoint_marker: raw.x_public_endpoint,
            custom_handler: raw.x_codegen_custom_handler,
            internal: raw.x_internal.clone().filter(|m| !m.is_empty()),
            crud: raw.x_codegen_crud,
        })
    }

    fn security(&self, declared: Option<&[SecurityRequirement]>) -> (Vec<Security>, bool) {
        match declared {
            None => {
                let inherited = self
                    .security_schemes
                    .keys()
                    .map(|name| self.security_entry(name, &[]))
                    .collect();
                (inherited, false)
            }
            Some([only]) if only.is_empty() => (Vec::new(), true),
            Some(requirements) => {
                let entries = requirements
                    .iter()
                    .flat_map(|req| req.iter())
                    .map(|(name, scopes)| self.security_entry(name, scopes))
                    .collect();
                (entries, false)
            }
        }
    }

    fn security_entry(&self, name: &str, scopes: &[String]) -> Security {
        let Some(scheme) = self.security_schemes.get(name) else {
            warn!(scheme = name, "operation uses an unknown security scheme");
            return Security {
                name: name.to_string(),
                scopes: scopes.to_vec(),
                kind: String::new(),
                scheme: String::new(),
            };
        };
        let scheme_name = if scheme.type_ == "apiKey" && scheme.location.as_deref() == Some("cookie")
        {
            "cookie".to_string()
        } else {
            scheme.scheme.clone().unwrap_or_default()
        };
        Security {
            name: name.to_string(),
            scopes: scopes.to_vec(),
            kind: scheme.type_.clone(),
            scheme: scheme_name,
        }
    }

    // === Parameters ===

    fn operation_params(
        &mut self,
        op_id: &str,
        shared: &[Ref<RawParameter>],
        own: &[Ref<RawParameter>],
        anchor: &str,
    ) -> Vec<Param> {
        let mut out: Vec<Param> = Vec::new();
        for entry in shared.iter().chain(own) {
            let Some(raw) = self.raw_parameter(entry, anchor) else {
                continue;
            };
            let param = self.param(op_id, &raw);
            match out
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => out.push(param),
            }
        }
        out
    }

    fn raw_parameter(&mut self, entry: &Ref<RawParameter>, anchor: &str) -> Option<RawParameter> {
        let path = match entry {
            Ref::Inline(raw) => return Some(raw.clone()),
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => path,
        };
        let loaded = if path.starts_with('#') {
            self.component_parameter(ref_name(path))
        } else {
            self.parameters.resolve_from(anchor, path).map(|p| p.as_ref().clone())
        };
        match loaded {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!(%path, error = %err, "skipping unreadable parameter");
                None
            }
        }
    }

    fn component_parameter(&mut self, name: &str) -> Result<RawParameter, SpecError> {
        let doc = self.doc;
        match doc.raw().components.parameters.get(name) {
            Some(Ref::Inline(raw)) => Ok(raw.clone()),
            Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => {
                Ok(self.parameters.resolve(path)?.as_ref().clone())
            }
            None => {
                let path = format!("{}/{}.yaml", component_dir(ComponentKind::Parameters), name);
                Ok(self.parameters.resolve(&path)?.as_ref().clone())
            }
        }
    }

    fn param(&self, op_id: &str, raw: &RawParameter) -> Param {
        let location = raw.location.unwrap_or(ParamLocation::Query);
        let required = raw.required || location == ParamLocation::Path;
        let field = pascal_case(&raw.name);

        let mut schema = match &raw.schema {
            None => Schema::primitive(TYPE_STRING, None),
            Some(Ref::Inline(inline)) => {
                let mut inline = inline.clone();
                if inline.type_.is_empty() && inline.one_of.is_empty() {
                    inline.type_ = PropertyType::single(TYPE_STRING);
                }
                PropertyProcessor::new(self.options.max_depth)
                    .process(&mut inline, &field, &raw.name, op_id);
                inline
            }
            Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => {
                let name = ref_name(path);
                match self.ctx.lookup(name) {
                    Some(target) => {
                        let mut s = Schema::primitive(target.primary_type(), target.format.as_deref());
                        s.type_ = target.type_.clone();
                        s.computed.target = Some(if target.is_object() {
                            target
                                .target()
                                .cloned()
                                .unwrap_or_else(|| TargetType::named(&target.title))
                        } else {
                            TargetType::from_type(target.primary_type(), target.format.as_deref())
                        });
                        s
                    }
                    None => {
                        warn!(%path, parameter = %raw.name, "parameter schema not found; using string");
                        Schema::primitive(TYPE_STRING, None)
                    }
                }
            }
        };
        schema.title = field;
        if schema.computed.target.is_none() {
            schema.computed.target = Some(TargetType::from_type(
                schema.primary_type(),
                schema.format.as_deref(),
            ));
        }
        schema.computed.serialized_name = Some(SerializedName::new(&raw.name, !required));

        Param {
            name: raw.name.clone(),
            location,
            schema,
            required,
            description: raw.description.clone(),
            style: raw.style.clone(),
            explode: raw.explode,
            generated: false,
        }
    }

    // === Request bodies ===

    fn request_body(
        &mut self,
        op_id: &str,
        method: HttpMethod,
        body: &Ref<RawRequestBody>,
        anchor: &str,
    ) -> Result<Option<RequestBody>, SpecError> {
        let (raw, anchor) = match body {
            Ref::Inline(raw) => (Rc::new(raw.clone()), anchor.to_string()),
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                match self.bodies.resolve_from(anchor, path) {
                    Ok(raw) => (raw, self.nested_anchor(anchor, path)?),
                    Err(err) => {
                        warn!(operation = op_id, %path, error = %err, "skipping unreadable request body");
                        return Ok(None);
                    }
                }
            }
        };
        let Some((content_type, media)) = pick_media(&raw.content, &[CONTENT_TYPE_JSON]) else {
            return Ok(None);
        };
        let is_update = method == HttpMethod::Patch;

        let title = match &media.schema {
            None => return Ok(None),
            Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => {
                self.schema_from_ref(path, &anchor)
            }
            Some(Ref::Inline(inline)) if inline.has_properties() => {
                let title = format!("{}Request", op_id);
                let required = if is_update {
                    Vec::new()
                } else {
                    inline.required.clone()
                };
                let mut schema = self.ctx.build_inline_object(&title, &inline.properties, &required);
                schema.description.clone_from(&inline.description);
                self.ctx.insert(schema);
                title
            }
            Some(Ref::Inline(_)) => {
                debug!(operation = op_id, "request body without properties ignored");
                return Ok(None);
            }
        };

        Ok(Some(RequestBody {
            schema: title,
            content_type: content_type.to_string(),
            required: !is_update,
        }))
    }

    /// Title for a schema `$ref`: arena first, then the referenced file, then
    /// an empty object stub.
    fn schema_from_ref(&mut self, path: &str, anchor: &str) -> String {
        let name = ref_name(path);
        if let Some(title) = self.ctx.resolve_name(name) {
            return title.to_string();
        }
        if !path.starts_with('#') {
            match self.ctx.load_schema_file(anchor, path) {
                Ok(title) => return title,
                Err(err) => warn!(%path, error = %err, "cannot load referenced schema; using a stub"),
            }
        }
        let mut stub = Schema::object(name);
        stub.computed.target = Some(TargetType::named(name));
        self.ctx.insert(stub);
        name.to_string()
    }

    fn nested_anchor(&self, anchor: &str, path: &str) -> Result<String, SpecError> {
        let key = self.files().key_from(anchor, path)?;
        Ok(self.files().relative(&key))
    }

    // === Responses ===

    fn operation_responses(
        &mut self,
        op_id: &str,
        path: &str,
        declared: &IndexMap<String, Ref<RawResponse>>,
        anchor: &str,
    ) -> Result<Vec<Response>, SpecError> {
        let mut out = Vec::new();
        for (status, entry) in declared {
            let response = match entry {
                Ref::Inline(raw) => self.response(op_id, status, raw, anchor)?,
                Ref::Unresolved(ref_path) | Ref::Resolved { path: ref_path, .. } => {
                    self.referenced_response(op_id, status, ref_path, anchor)?
                }
            };
            out.push(response);
        }

        for standard in standard_error_responses(path.contains('{')) {
            if out.iter().any(|r| r.status_code == standard.status_code) {
                continue;
            }
            self.problem_used = true;
            out.push(standard);
        }
        out.sort_by(|a, b| a.status_code.cmp(&b.status_code));
        Ok(out)
    }

    fn referenced_response(
        &mut self,
        op_id: &str,
        status: &str,
        ref_path: &str,
        anchor: &str,
    ) -> Result<Response, SpecError> {
        let name = ref_name(ref_path);
        if let Some(title) = self.ctx.resolve_name(name) {
            let content_type = self
                .ctx
                .response_content_type(name)
                .unwrap_or(CONTENT_TYPE_JSON)
                .to_string();
            return Ok(Response {
                status_code: status.to_string(),
                content_type: Some(content_type),
                schema: Some(title.to_string()),
            });
        }

        let loaded = if ref_path.starts_with('#') {
            self.component_response(name)
                .map(|raw| (raw, anchor.to_string()))
        } else {
            self.responses
                .resolve_from(anchor, ref_path)
                .and_then(|raw| Ok((raw, self.nested_anchor(anchor, ref_path)?)))
        };
        match loaded {
            Ok((raw, anchor)) => self.response(op_id, status, &raw, &anchor),
            Err(err) => {
                warn!(operation = op_id, path = ref_path, error = %err, "cannot read response; using an empty body");
                Ok(self.fallback_response(op_id, status))
            }
        }
    }

    fn component_response(&mut self, name: &str) -> Result<Rc<RawResponse>, SpecError> {
        let doc = self.doc;
        match doc.raw().components.responses.get(name) {
            Some(Ref::Inline(raw)) => Ok(Rc::new(raw.clone())),
            Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => self.responses.resolve(path),
            None => {
                let path = format!("{}/{}.yaml", component_dir(ComponentKind::Responses), name);
                self.responses.resolve(&path)
            }
        }
    }

    fn fallback_response(&mut self, op_id: &str, status: &str) -> Response {
        if status == "204" {
            self.no_content_used = true;
            return Response {
                status_code: status.to_string(),
                content_type: None,
                schema: Some(NO_CONTENT_SCHEMA.to_string()),
            };
        }
        let title = self.output_title(op_id, status);
        let mut schema = Schema::object(&title);
        schema.computed.target = Some(TargetType::named(&title));
        self.ctx.insert(schema);
        Response {
            status_code: status.to_string(),
            content_type: Some(CONTENT_TYPE_JSON.to_string()),
            schema: Some(title),
        }
    }

    fn response(
        &mut self,
        op_id: &str,
        status: &str,
        raw: &RawResponse,
        anchor: &str,
    ) -> Result<Response, SpecError> {
        let media = pick_media(&raw.content, &[CONTENT_TYPE_PROBLEM_JSON, CONTENT_TYPE_JSON]);
        let Some((content_type, media)) = media else {
            if status == "204" {
                self.no_content_used = true;
                return Ok(Response {
                    status_code: status.to_string(),
                    content_type: None,
                    schema: Some(NO_CONTENT_SCHEMA.to_string()),
                });
            }
            return Ok(Response {
                status_code: status.to_string(),
                content_type: None,
                schema: None,
            });
        };
        let content_type = Some(content_type.to_string());

        let schema = match &media.schema {
            None => None,
            Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => {
                Some(self.schema_from_ref(path, anchor))
            }
            Some(Ref::Inline(inline)) => Some(self.inline_response_schema(op_id, status, inline, anchor)),
        };
        Ok(Response {
            status_code: status.to_string(),
            content_type,
            schema,
        })
    }

    /// Rebind `{data: [$ref]}` and `{data: $ref}` envelopes to the generated
    /// wrappers; anything else becomes `<operationId>Output`.
    fn inline_response_schema(&mut self, op_id: &str, status: &str, inline: &Schema, anchor: &str) -> String {
        if let Some(data) = inline.properties.get("data") {
            let envelope = match data {
                Ref::Unresolved(path) | Ref::Resolved { path, .. } => Some((path.clone(), false)),
                Ref::Inline(value) if value.is_array() => match value.items.as_deref() {
                    Some(Ref::Unresolved(path) | Ref::Resolved { path, .. }) => Some((path.clone(), true)),
                    _ => None,
                },
                Ref::Inline(_) => None,
            };
            if let Some((path, is_list)) = envelope {
                let item = self.schema_from_ref(&path, anchor);
                return self.envelope(&item, is_list);
            }
        }

        let title = self.output_title(op_id, status);
        let schema = if inline.has_properties() {
            self.ctx
                .build_inline_object(&title, &inline.properties, &inline.required)
        } else {
            let mut schema = inline.clone();
            PropertyProcessor::new(self.options.max_depth).process(&mut schema, &title, "", op_id);
            schema.computed.serialized_name = None;
            if schema.type_.is_empty() {
                schema.type_ = PropertyType::single(crate::types::TYPE_OBJECT);
            }
            schema
        };
        self.ctx.insert(schema);
        title
    }

    fn envelope(&mut self, item: &str, is_list: bool) -> String {
        let suffix = if is_list { "ListResponse" } else { "Response" };
        let title = format!("{}{}", item, suffix);
        if !self.ctx.contains(&title) {
            let entity = self
                .ctx
                .schema(item)
                .cloned()
                .unwrap_or_else(|| Schema::object(item));
            let wrapper = if is_list {
                list_response_wrapper(&entity)
            } else {
                response_wrapper(&entity)
            };
            debug!(schema = %title, "synthesized response envelope");
            self.ctx.insert(wrapper);
        }
        title
    }

    fn output_title(&self, op_id: &str, status: &str) -> String {
        let title = format!("{}Output", op_id);
        if self.ctx.contains(&title) {
            format!("{}{}Output", op_id, status)
        } else {
            title
        }
    }
}

/// `application/problem+json` over `application/json`, else the first entry.
fn preferred_content_type(content: &IndexMap<String, RawMediaType>) -> Option<&str> {
    pick_media(content, &[CONTENT_TYPE_PROBLEM_JSON, CONTENT_TYPE_JSON]).map(|(ct, _)| ct)
}

fn pick_media<'m>(
    content: &'m IndexMap<String, RawMediaType>,
    preferred: &[&str],
) -> Option<(&'m str, &'m RawMediaType)> {
    for wanted in preferred {
        if let Some((key, media)) = content.get_key_value(*wanted) {
            return Some((key.as_str(), media));
        }
    }
    content.iter().next().map(|(k, m)| (k.as_str(), m))
}

/// Names inside `{...}` placeholders, in order.
pub fn path_param_names(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        if end > 0 {
            names.push(&after[..end]);
        }
        rest = &after[end + 1..];
    }
    names
}

/// Declare every `{name}` of `path` that has no explicit path parameter.
fn add_path_params(path: &str, params: &mut Vec<Param>) {
    for name in path_param_names(path) {
        if params
            .iter()
            .any(|p| p.location == ParamLocation::Path && p.name == name)
        {
            continue;
        }
        let mut schema = Schema::primitive(TYPE_STRING, Some(FORMAT_UUID));
        schema.title = pascal_case(name);
        schema.computed.target = Some(TargetType::from_type(TYPE_STRING, Some(FORMAT_UUID)));
        schema.computed.serialized_name = Some(SerializedName::new(name, false));
        params.push(Param {
            name: name.to_string(),
            location: ParamLocation::Path,
            schema,
            required: true,
            description: "Resource identifier".to_string(),
            style: None,
            explode: None,
            generated: false,
        });
    }
}
