//! Schema loading: turning raw drafts into computed schemas.
//!
//! All state for one parse lives in a [`ResolutionContext`]: the schema arena
//! keyed by title, the map from ref-derived names to titles, response content
//! types, and the bookkeeping for references that could not be resolved yet.
//! Cross-references between schemas are name handles into the arena, never
//! copies of the target.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::SpecError;
use crate::naming::{camel_case, pascal_case};
use crate::reference::Ref;
use crate::resolver::{FileResolver, Resolver, SchemaLoader};
use crate::schema::{ref_name, PropertyType, Schema, SerializedName};
use crate::types::{TargetType, FORMAT_DATE_TIME, FORMAT_UUID, TYPE_OBJECT, TYPE_STRING};

/// Two sources produced the same schema name; the first one was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub name: String,
    pub kept: String,
    pub skipped: String,
}

/// A property `$ref` still unresolved after every schema was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    pub schema: String,
    pub property: String,
    pub path: String,
}

/// Non-fatal findings of one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub collisions: Vec<NameCollision>,
    pub unresolved: Vec<UnresolvedRef>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.collisions.is_empty() && self.unresolved.is_empty()
    }
}

#[derive(Debug, Clone)]
struct PendingRef {
    schema: String,
    field: String,
    json: String,
    path: String,
}

/// Per-parse resolution state.
#[derive(Debug)]
pub struct ResolutionContext {
    drafts: Resolver<Schema, SchemaLoader>,
    schemas: BTreeMap<String, Schema>,
    ref_to_name: HashMap<String, String>,
    origins: HashMap<String, String>,
    response_content_types: HashMap<String, String>,
    pending: Vec<PendingRef>,
    report: ResolutionReport,
    max_depth: usize,
}

impl ResolutionContext {
    pub fn new(files: FileResolver) -> Self {
        Self {
            drafts: Resolver::new(files, SchemaLoader),
            schemas: BTreeMap::new(),
            ref_to_name: HashMap::new(),
            origins: HashMap::new(),
            response_content_types: HashMap::new(),
            pending: Vec::new(),
            report: ResolutionReport::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn files(&self) -> &FileResolver {
        self.drafts.files()
    }

    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn schema(&self, title: &str) -> Option<&Schema> {
        self.schemas.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.schemas.contains_key(title)
    }

    /// Title of the schema a ref-derived name stands for.
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        if let Some((title, _)) = self.schemas.get_key_value(name) {
            return Some(title);
        }
        let title = self.ref_to_name.get(name)?;
        self.schemas.get_key_value(title).map(|(t, _)| t.as_str())
    }

    /// The schema a ref-derived name stands for.
    pub fn lookup(&self, name: &str) -> Option<&Schema> {
        self.resolve_name(name).and_then(|title| self.schemas.get(title))
    }

    /// Add a schema unless one with the same title exists.
    ///
    /// Returns whether it was added.
    pub fn insert(&mut self, schema: Schema) -> bool {
        if self.schemas.contains_key(&schema.title) {
            return false;
        }
        debug!(schema = %schema.title, "adding schema");
        self.schemas.insert(schema.title.clone(), schema);
        true
    }

    pub fn response_content_type(&self, name: &str) -> Option<&str> {
        self.response_content_types.get(name).map(String::as_str)
    }

    pub fn set_response_content_type(&mut self, name: impl Into<String>, content_type: &str) {
        self.response_content_types
            .insert(name.into(), content_type.to_string());
    }

    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Hand over the arena and the findings.
    pub fn finish(self) -> (BTreeMap<String, Schema>, ResolutionReport) {
        (self.schemas, self.report)
    }

    /// Load the schema file at `path` (relative to `anchor`) into the arena.
    ///
    /// A file whose ref-derived name already resolves is not loaded again.
    /// Returns the schema's title.
    ///
    /// # Errors
    ///
    /// File and YAML errors from the resolver.
    pub fn load_schema_file(&mut self, anchor: &str, path: &str) -> Result<String, SpecError> {
        let stem = ref_name(path).to_string();
        if let Some(title) = self.resolve_name(&stem) {
            return Ok(title.to_string());
        }
        let origin = self.files().key_from(anchor, path)?;
        let draft = self.drafts.resolve_from(anchor, path)?;
        let title = self.add_draft(&draft, Some(&stem), &origin);
        Ok(title)
    }

    /// Load an inline `components.schemas` entry.
    pub fn load_inline_schema(&mut self, key: &str, draft: &Schema) -> String {
        let mut draft = draft.clone();
        if draft.title.is_empty() {
            draft.title = key.to_string();
        }
        self.add_draft(&draft, None, &format!("components.schemas.{}", key))
    }

    /// Compute a draft and register it under its title.
    ///
    /// When `ref_alias` is given it is mapped to the title as well. A title
    /// or alias that is already taken by another source is recorded as a
    /// collision and the earlier schema is kept.
    pub fn add_draft(&mut self, draft: &Schema, ref_alias: Option<&str>, origin: &str) -> String {
        let (schema, pending) = self.compute(draft);
        let title = schema.title.clone();

        if let Some(alias) = ref_alias {
            match self.ref_to_name.get(alias) {
                Some(existing) if *existing != title => {
                    self.record_collision(alias, existing.clone(), origin);
                }
                Some(_) => {}
                None => {
                    self.ref_to_name.insert(alias.to_string(), title.clone());
                }
            }
        }

        if self.schemas.contains_key(&title) {
            if self.origins.get(&title).map(String::as_str) != Some(origin) {
                self.record_collision(&title, title.clone(), origin);
            }
            return title;
        }
        debug!(schema = %title, origin, "loaded schema");
        self.origins.insert(title.clone(), origin.to_string());
        self.schemas.insert(title.clone(), schema);
        self.pending.extend(pending);
        title
    }

    fn record_collision(&mut self, name: &str, kept_title: String, skipped: &str) {
        let kept = self
            .origins
            .get(&kept_title)
            .cloned()
            .unwrap_or(kept_title);
        warn!(name, kept = %kept, skipped, "schema name collision; keeping the first");
        self.report.collisions.push(NameCollision {
            name: name.to_string(),
            kept,
            skipped: skipped.to_string(),
        });
    }

    /// Turn a raw draft into a computed schema without registering it.
    ///
    /// `allOf` branches that are references are skipped; inline branches
    /// contribute their properties and required names. Property references
    /// that resolve against the arena become stubs; the rest are returned as
    /// pending.
    fn compute(&self, draft: &Schema) -> (Schema, Vec<PendingRef>) {
        let name = draft.title.clone();
        let mut schema = draft.clone();
        schema.properties = IndexMap::new();
        schema.all_of = Vec::new();
        if schema.type_.is_empty() {
            schema.type_ = PropertyType::single(TYPE_OBJECT);
        }

        let mut processor = PropertyProcessor::new(self.max_depth);
        let mut pending = Vec::new();
        for branch in &draft.all_of {
            let Ref::Inline(item) = branch else {
                continue;
            };
            for (key, prop) in &item.properties {
                self.add_property(&mut schema, &mut processor, &mut pending, key, prop, &name);
            }
            for required in &item.required {
                schema.require(required);
            }
        }
        for (key, prop) in &draft.properties {
            self.add_property(&mut schema, &mut processor, &mut pending, key, prop, &name);
        }

        mark_optional(&mut schema);
        if schema.is_entity() {
            add_base_fields(&mut schema);
        }
        schema.computed.target = Some(TargetType::Named {
            name: name.clone(),
            module: schema.x_internal.clone().filter(|m| !m.is_empty()),
        });
        (schema, pending)
    }

    fn add_property(
        &self,
        schema: &mut Schema,
        processor: &mut PropertyProcessor,
        pending: &mut Vec<PendingRef>,
        key: &str,
        prop: &Ref<Schema>,
        parent: &str,
    ) {
        let field = pascal_case(key);
        match prop {
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                if let Some(target) = self.lookup(ref_name(path)) {
                    schema
                        .properties
                        .insert(field.clone(), Ref::inline(ref_stub(&field, key, target)));
                } else {
                    pending.push(PendingRef {
                        schema: parent.to_string(),
                        field: field.clone(),
                        json: key.to_string(),
                        path: path.clone(),
                    });
                    schema.properties.insert(field, Ref::new(path.clone()));
                }
            }
            Ref::Inline(value) => {
                let mut value = value.clone();
                processor.process(&mut value, &field, key, parent);
                schema.properties.insert(field, Ref::inline(value));
            }
        }
    }

    /// Compute an ad-hoc object schema named `title` from inline properties.
    ///
    /// Used for request and response bodies. Property references resolve
    /// against the arena immediately; unresolvable ones stay references.
    pub fn build_inline_object(
        &self,
        title: &str,
        properties: &IndexMap<String, Ref<Schema>>,
        required: &[String],
    ) -> Schema {
        let mut schema = Schema::object(title);
        schema.required = required.to_vec();
        let mut processor = PropertyProcessor::new(self.max_depth);
        let mut pending = Vec::new();
        for (key, prop) in properties {
            self.add_property(&mut schema, &mut processor, &mut pending, key, prop, title);
        }
        for unresolved in pending {
            debug!(schema = title, path = %unresolved.path, "inline property ref left unresolved");
        }
        mark_optional(&mut schema);
        schema.computed.target = Some(TargetType::named(title));
        schema
    }

    /// Second pass: bind property references that named schemas loaded
    /// later, then map ref-derived target names to titles.
    pub fn resolve_pending(&mut self) {
        for item in std::mem::take(&mut self.pending) {
            let stub = self
                .lookup(ref_name(&item.path))
                .map(|target| ref_stub(&item.field, &item.json, target));
            let Some(schema) = self.schemas.get_mut(&item.schema) else {
                continue;
            };
            match stub {
                Some(mut stub) => {
                    let required = schema.required.iter().any(|r| *r == item.json || *r == item.field);
                    stub.computed.serialized_name = Some(SerializedName::new(&item.json, !required));
                    schema.properties.insert(item.field, Ref::inline(stub));
                }
                None => {
                    warn!(
                        schema = %item.schema,
                        property = %item.field,
                        path = %item.path,
                        "property reference left unresolved"
                    );
                    self.report.unresolved.push(UnresolvedRef {
                        schema: item.schema,
                        property: item.field,
                        path: item.path,
                    });
                }
            }
        }

        let ref_to_name = &self.ref_to_name;
        for schema in self.schemas.values_mut() {
            for prop in schema.properties.values_mut() {
                if let Some(value) = prop.get_mut() {
                    remap_targets(value, ref_to_name);
                }
            }
        }
    }
}

/// A property standing in for a reference to a named schema.
fn ref_stub(field: &str, json: &str, target: &Schema) -> Schema {
    let mut stub = Schema {
        title: field.to_string(),
        type_: target.type_.clone(),
        ..Schema::default()
    };
    stub.computed.target = Some(
        target
            .computed
            .target
            .clone()
            .unwrap_or_else(|| TargetType::named(&target.title)),
    );
    stub.computed.serialized_name = Some(SerializedName::new(json, false));
    stub
}

/// Mark every property whose wire name is not required as omit-if-absent.
fn mark_optional(schema: &mut Schema) {
    let required = schema.required.clone();
    for (key, prop) in schema.properties.iter_mut() {
        let Some(value) = prop.get_mut() else {
            continue;
        };
        let json = value
            .computed
            .serialized_name
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| camel_case(key));
        let omit = !required.iter().any(|r| *r == json || r == key);
        value.computed.serialized_name = Some(SerializedName::new(json, omit));
    }
}

fn remap_targets(schema: &mut Schema, ref_to_name: &HashMap<String, String>) {
    if let Some(target) = schema.computed.target.as_mut() {
        remap_target(target, ref_to_name);
    }
    for prop in schema.properties.values_mut() {
        if let Some(value) = prop.get_mut() {
            remap_targets(value, ref_to_name);
        }
    }
    if let Some(items) = schema.items.as_deref_mut().and_then(Ref::get_mut) {
        remap_targets(items, ref_to_name);
    }
}

fn remap_target(target: &mut TargetType, ref_to_name: &HashMap<String, String>) {
    match target {
        TargetType::Named { name, .. } => {
            if let Some(title) = ref_to_name.get(name.as_str()) {
                name.clone_from(title);
            }
        }
        TargetType::Array { items } => remap_target(items, ref_to_name),
        _ => {}
    }
}

/// Field names of the injected entity base fields, with their wire names.
pub const BASE_FIELDS: [(&str, &str); 3] = [
    ("ID", "id"),
    ("CreatedAt", "createdAt"),
    ("UpdatedAt", "updatedAt"),
];

/// Add (or refresh) the identifier and timestamp fields of an entity.
///
/// Idempotent. A description already set on an existing field is kept.
pub fn add_base_fields(schema: &mut Schema) {
    let defaults = [
        (FORMAT_UUID, "Unique identifier for the resource"),
        (FORMAT_DATE_TIME, "Timestamp when the resource was created"),
        (FORMAT_DATE_TIME, "Timestamp when the resource was last updated"),
    ];
    for ((field, json), (format, description)) in BASE_FIELDS.into_iter().zip(defaults) {
        let existing = schema
            .property(field)
            .map(|p| p.description.clone())
            .filter(|d| !d.is_empty());
        let mut prop = Schema::primitive(TYPE_STRING, Some(format));
        prop.title = field.to_string();
        prop.description = existing.unwrap_or_else(|| description.to_string());
        prop.computed.target = Some(TargetType::from_type(TYPE_STRING, Some(format)));
        prop.computed.serialized_name = Some(SerializedName::new(json, false));
        schema.properties.insert(field.to_string(), Ref::inline(prop));
        schema.require(json);
    }
}

/// Computes names, wire names, nullability and target types of properties.
///
/// One processor is used per root schema so synthesized nested type names
/// stay unique within it.
#[derive(Debug)]
pub struct PropertyProcessor {
    max_depth: usize,
    names: HashSet<String>,
}

impl PropertyProcessor {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            names: HashSet::new(),
        }
    }

    /// Process one property of the schema named `parent`.
    pub fn process(&mut self, prop: &mut Schema, field: &str, json: &str, parent: &str) {
        self.process_at(prop, field, json, parent, 0);
    }

    fn process_at(&mut self, prop: &mut Schema, field: &str, json: &str, parent: &str, depth: usize) {
        prop.title = field.to_string();
        prop.computed.serialized_name = Some(SerializedName::new(json, false));
        prop.computed.nullable = prop.type_.nullable || prop.nullable.unwrap_or(false);
        collapse_nullable_union(prop);

        if depth >= self.max_depth {
            warn!(parent, field, depth, "nesting too deep; treating property as untyped");
            prop.computed.target = Some(TargetType::Any);
            return;
        }

        let primary = prop.primary_type().to_string();
        let target = match primary.as_str() {
            "array" => self.array_target(prop, field, json, parent, depth),
            "object" if prop.has_properties() => {
                let name = self.nested_name(format!("{}{}", parent, field));
                self.process_children(prop, &name, depth + 1);
                TargetType::named(name)
            }
            "object" => TargetType::Map,
            other => TargetType::from_type(other, prop.format.as_deref()),
        };
        prop.computed.target = Some(target);
    }

    fn array_target(
        &mut self,
        prop: &mut Schema,
        field: &str,
        json: &str,
        parent: &str,
        depth: usize,
    ) -> TargetType {
        let Some(items) = prop.items.as_deref_mut() else {
            return TargetType::array_of(TargetType::Any);
        };
        let item = match items {
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                return TargetType::array_of(TargetType::named(ref_name(path)));
            }
            Ref::Inline(item) => item,
        };
        if item.is_object() && item.has_properties() {
            let name = self.nested_name(format!("{}{}Item", parent, field));
            if item.title.is_empty() {
                item.title = name.clone();
            }
            item.computed.target = Some(TargetType::named(&name));
            self.process_children(item, &name, depth + 1);
            return TargetType::array_of(TargetType::named(name));
        }
        if item.is_array() {
            let keep_title = item.title.clone();
            self.process_at(item, &format!("{}Item", field), json, parent, depth + 1);
            item.title = keep_title;
            item.computed.serialized_name = None;
            let inner = item.computed.target.clone().unwrap_or(TargetType::Any);
            return TargetType::array_of(inner);
        }
        TargetType::array_of(TargetType::from_type(
            item.primary_type(),
            item.format.as_deref(),
        ))
    }

    fn process_children(&mut self, schema: &mut Schema, parent: &str, depth: usize) {
        let props = std::mem::take(&mut schema.properties);
        for (key, mut prop) in props {
            let field = pascal_case(&key);
            if let Some(child) = prop.get_mut() {
                self.process_at(child, &field, &key, parent, depth);
            }
            schema.properties.insert(field, prop);
        }
        mark_optional(schema);
    }

    fn nested_name(&mut self, base: String) -> String {
        if self.names.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.names.insert(candidate.clone()) {
                debug!(base = %base, name = %candidate, "disambiguated nested type name");
                return candidate;
            }
            n += 1;
        }
    }
}

/// Collapse `oneOf: [<schema>, {type: "null"}]` into a nullable `<schema>`.
fn collapse_nullable_union(prop: &mut Schema) {
    if prop.one_of.len() != 2 {
        return;
    }
    let mut has_null = false;
    let mut non_null: Option<Schema> = None;
    for branch in &prop.one_of {
        let Some(s) = branch.get() else {
            continue;
        };
        if s.type_.is_null() {
            has_null = true;
        } else if non_null.is_none() {
            non_null = Some(s.clone());
        }
    }
    let (true, Some(inner)) = (has_null, non_null) else {
        return;
    };
    prop.computed.nullable = true;
    prop.type_ = PropertyType {
        types: inner.type_.types,
        nullable: false,
    };
    prop.format = inner.format;
    prop.min_length = inner.min_length;
    prop.max_length = inner.max_length;
    prop.pattern = inner.pattern;
    prop.minimum = inner.minimum;
    prop.maximum = inner.maximum;
    prop.enum_values = inner.enum_values;
    if prop.properties.is_empty() {
        prop.properties = inner.properties;
        prop.required = inner.required;
    }
    if prop.items.is_none() {
        prop.items = inner.items;
    }
}
