//! The resolved specification handed to code generators.
//!
//! A [`Spec`] is produced once per parse and is not mutated afterwards.
//! Schemas live in one map keyed by title; operations, parameters and
//! responses refer to them by that title.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::CodegenConfig;
use crate::discovery::Tag;
use crate::document::SecurityScheme;
use crate::loader::ResolutionReport;
use crate::schema::Schema;
use crate::typemap::TypeMapper;
use crate::types::{CrudKind, HttpMethod, ParamLocation, TargetType};

/// One parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub location: ParamLocation,
    /// Computed schema; its title is the PascalCase field name.
    pub schema: Schema,
    pub required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    /// Added by the inflater rather than declared.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generated: bool,
}

/// Request body bound to a schema in [`Spec::schemas`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBody {
    pub schema: String,
    pub content_type: String,
    pub required: bool,
}

/// One response of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Title of the body schema; `None` for responses without content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// A security requirement applied to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Security {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Scheme `type` (`http`, `apiKey`, ...).
    pub kind: String,
    /// Scheme `scheme` (`bearer`, ...), or `cookie` for cookie API keys.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme: String,
}

/// One HTTP method on one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// First tag of the operation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    pub parameters: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Sorted by status code.
    pub responses: Vec<Response>,
    pub security: Vec<Security>,
    /// Declared `security: [{}]`.
    pub public: bool,
    /// Carries `x-public-endpoint`, which does not affect `security`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub public_endpoint_marker: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub custom_handler: bool,
    /// Include package that owns the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crud: Option<CrudKind>,
}

impl Operation {
    pub fn path_params(&self) -> impl Iterator<Item = &Param> {
        self.params_in(ParamLocation::Path)
    }

    pub fn query_params(&self) -> impl Iterator<Item = &Param> {
        self.params_in(ParamLocation::Query)
    }

    fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Param> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    pub fn param(&self, name: &str, location: ParamLocation) -> Option<&Param> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    pub fn response(&self, status: &str) -> Option<&Response> {
        self.responses.iter().find(|r| r.status_code == status)
    }

    /// First 2xx response.
    pub fn success_response(&self) -> Option<&Response> {
        self.responses.iter().find(|r| r.status_code.starts_with('2'))
    }

    pub fn requires_auth(&self) -> bool {
        !self.security.is_empty()
    }
}

/// Which of the list parameters an operation declares itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListParams {
    pub filter: bool,
    pub page: bool,
    pub sort: bool,
}

/// CRUD operations found for one entity.
#[derive(Debug, Clone, Default)]
pub struct EntityOperations<'a> {
    pub list: Option<&'a Operation>,
    pub get: Option<&'a Operation>,
    pub create: Option<&'a Operation>,
    pub update: Option<&'a Operation>,
    pub delete: Option<&'a Operation>,
    /// First path parameter of a nested create/update/delete.
    pub parent_param: Option<String>,
    pub list_params: ListParams,
}

impl EntityOperations<'_> {
    /// True when the list operation sits under a parent path parameter.
    pub fn is_nested(&self) -> bool {
        self.list
            .map(|op| op.path_params().next().is_some())
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_none()
            && self.get.is_none()
            && self.create.is_none()
            && self.update.is_none()
            && self.delete.is_none()
    }
}

/// The resolved specification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Spec {
    pub project_name: String,
    pub title: String,
    pub description: String,
    pub version: String,
    /// Sorted by path, then method.
    pub operations: Vec<Operation>,
    #[serde(skip)]
    pub schemas: BTreeMap<String, Schema>,
    pub tags: Vec<Tag>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    pub includes: Vec<String>,
    pub codegen: CodegenConfig,
    /// Collisions and unresolved references found while parsing.
    pub report: ResolutionReport,
}

impl Spec {
    pub fn schema(&self, title: &str) -> Option<&Schema> {
        self.schemas.get(title)
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Entity schemas, by title.
    pub fn entities(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values().filter(|s| s.is_entity())
    }

    pub fn operations_by_tag(&self) -> BTreeMap<&str, Vec<&Operation>> {
        let mut out: BTreeMap<&str, Vec<&Operation>> = BTreeMap::new();
        for op in &self.operations {
            out.entry(op.tag.as_str()).or_default().push(op);
        }
        out
    }

    /// Find the CRUD operations of `entity` by operation id.
    ///
    /// An `x-codegen-crud` annotation wins over the id convention
    /// (`list<entity>`, `get<entity>`, `create<entity>`, ...), but only on
    /// operations whose id mentions the entity. Later matches replace earlier
    /// ones.
    pub fn find_entity_operations(&self, entity: &str) -> EntityOperations<'_> {
        let entity = entity.to_lowercase();
        let mut found = EntityOperations::default();

        for op in &self.operations {
            let id = op.id.to_lowercase();
            let kind = match op.crud {
                Some(kind) if id.contains(&entity) => Some(kind),
                _ => crud_from_id(&id, &entity),
            };
            let Some(kind) = kind else {
                continue;
            };
            match kind {
                CrudKind::List => {
                    found.list = Some(op);
                    found.list_params = declared_list_params(op);
                }
                CrudKind::Get => found.get = Some(op),
                CrudKind::Create => {
                    found.create = Some(op);
                    if let Some(parent) = parent_param(op) {
                        found.parent_param = Some(parent);
                    }
                }
                CrudKind::Update => {
                    found.update = Some(op);
                    if found.parent_param.is_none() {
                        found.parent_param = parent_param(op);
                    }
                }
                CrudKind::Delete => {
                    found.delete = Some(op);
                    if found.parent_param.is_none() {
                        found.parent_param = parent_param(op);
                    }
                }
            }
        }
        found
    }
}

/// One property of a schema, typed for a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    /// Wire name.
    pub json: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
}

/// A schema as a backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    pub entity: bool,
    pub fields: Vec<FieldSummary>,
}

/// Operations plus every schema with its field types rendered by one backend.
#[derive(Debug, Clone, Serialize)]
pub struct SpecSummary<'a> {
    pub project_name: &'a str,
    pub title: &'a str,
    pub version: &'a str,
    pub types: &'static str,
    pub operations: &'a [Operation],
    pub schemas: Vec<SchemaSummary>,
    pub report: &'a ResolutionReport,
}

impl Spec {
    /// Summarize this spec with field types rendered by `mapper`.
    ///
    /// Nested object types synthesized for inline properties are listed
    /// after the schemas that own them.
    pub fn summary(&self, mapper: &dyn TypeMapper) -> SpecSummary<'_> {
        let mut schemas = Vec::new();
        let mut seen: HashSet<String> = self.schemas.keys().cloned().collect();
        for (name, schema) in &self.schemas {
            schemas.push(schema_summary(name, schema, mapper));
            for nested in schema.collect_nested_types() {
                let Some(TargetType::Named { name, .. }) = nested.target() else {
                    continue;
                };
                if seen.insert(name.clone()) {
                    schemas.push(schema_summary(name, nested, mapper));
                }
            }
        }
        SpecSummary {
            project_name: &self.project_name,
            title: &self.title,
            version: &self.version,
            types: mapper.name(),
            operations: &self.operations,
            schemas,
            report: &self.report,
        }
    }
}

fn schema_summary(name: &str, schema: &Schema, mapper: &dyn TypeMapper) -> SchemaSummary {
    let fields = schema
        .sorted_properties()
        .into_iter()
        .map(|(field, prop)| FieldSummary {
            name: field.to_string(),
            json: prop
                .serialized_name()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| field.to_string()),
            type_name: mapper.render(prop.target().unwrap_or(&TargetType::Any), prop.is_nullable()),
            required: schema.is_property_required(field),
        })
        .collect();
    SchemaSummary {
        name: name.to_string(),
        internal: schema.x_internal.clone().filter(|s| !s.is_empty()),
        entity: schema.is_entity(),
        fields,
    }
}

fn crud_from_id(id: &str, entity: &str) -> Option<CrudKind> {
    let has = |verb: &str| id.contains(&format!("{}{}", verb, entity));
    if has("list") || id.contains(&format!("get{}s", entity)) {
        Some(CrudKind::List)
    } else if id.starts_with(&format!("get{}", entity)) && !id.contains("list") {
        Some(CrudKind::Get)
    } else if has("create") || has("add") {
        Some(CrudKind::Create)
    } else if has("update") || has("edit") {
        Some(CrudKind::Update)
    } else if has("delete") || has("remove") {
        Some(CrudKind::Delete)
    } else {
        None
    }
}

fn declared_list_params(op: &Operation) -> ListParams {
    let mut out = ListParams::default();
    for param in op.query_params().filter(|p| !p.generated) {
        match param.name.to_lowercase().as_str() {
            "filter" => out.filter = true,
            "page" => out.page = true,
            "sort" => out.sort = true,
            _ => {}
        }
    }
    out
}

fn parent_param(op: &Operation) -> Option<String> {
    let params: Vec<&Param> = op.path_params().collect();
    if params.len() >= 2 {
        Some(params[0].name.clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, location: ParamLocation) -> Param {
        Param {
            name: name.into(),
            location,
            schema: Schema::primitive("string", None),
            required: location == ParamLocation::Path,
            description: String::new(),
            style: None,
            explode: None,
            generated: false,
        }
    }

    fn op(id: &str, method: HttpMethod, path: &str, params: &[(&str, ParamLocation)]) -> Operation {
        Operation {
            id: id.into(),
            method,
            path: path.into(),
            summary: String::new(),
            description: String::new(),
            tag: String::new(),
            parameters: params.iter().map(|(n, l)| param(n, *l)).collect(),
            request_body: None,
            responses: Vec::new(),
            security: Vec::new(),
            public: false,
            public_endpoint_marker: false,
            custom_handler: false,
            internal: None,
            crud: None,
        }
    }

    fn spec(operations: Vec<Operation>) -> Spec {
        Spec {
            operations,
            ..Spec::default()
        }
    }

    #[test]
    fn finds_crud_by_convention() {
        use ParamLocation::{Path, Query};
        let s = spec(vec![
            op("ListUsers", HttpMethod::Get, "/users", &[("filter", Query)]),
            op("GetUser", HttpMethod::Get, "/users/{id}", &[("id", Path)]),
            op("CreateUser", HttpMethod::Post, "/users", &[]),
            op("UpdateUser", HttpMethod::Patch, "/users/{id}", &[("id", Path)]),
            op("DeleteUser", HttpMethod::Delete, "/users/{id}", &[("id", Path)]),
            op("GetHealth", HttpMethod::Get, "/health", &[]),
        ]);
        let ops = s.find_entity_operations("User");
        assert_eq!(ops.list.map(|o| o.id.as_str()), Some("ListUsers"));
        assert_eq!(ops.get.map(|o| o.id.as_str()), Some("GetUser"));
        assert_eq!(ops.create.map(|o| o.id.as_str()), Some("CreateUser"));
        assert_eq!(ops.update.map(|o| o.id.as_str()), Some("UpdateUser"));
        assert_eq!(ops.delete.map(|o| o.id.as_str()), Some("DeleteUser"));
        assert!(ops.list_params.filter);
        assert!(!ops.list_params.page);
        assert!(!ops.is_nested());
        assert_eq!(ops.parent_param, None);
    }

    #[test]
    fn get_plural_is_list() {
        let s = spec(vec![op("getUsers", HttpMethod::Get, "/users", &[])]);
        let ops = s.find_entity_operations("User");
        assert!(ops.list.is_some());
        assert!(ops.get.is_none());
    }

    #[test]
    fn nested_resources_report_parent() {
        use ParamLocation::Path;
        let s = spec(vec![
            op("ListMembers", HttpMethod::Get, "/orgs/{orgId}/members", &[("orgId", Path)]),
            op(
                "AddMember",
                HttpMethod::Post,
                "/orgs/{orgId}/members/{id}",
                &[("orgId", Path), ("id", Path)],
            ),
        ]);
        let ops = s.find_entity_operations("Member");
        assert!(ops.is_nested());
        assert_eq!(ops.parent_param.as_deref(), Some("orgId"));
        assert!(ops.create.is_some());
    }

    #[test]
    fn explicit_annotation_wins() {
        let mut archive = op("ArchiveUser", HttpMethod::Post, "/users/{id}/archive", &[]);
        archive.crud = Some(CrudKind::Delete);
        let mut unrelated = op("Purge", HttpMethod::Delete, "/purge", &[]);
        unrelated.crud = Some(CrudKind::Delete);
        let s = spec(vec![archive, unrelated]);
        let ops = s.find_entity_operations("User");
        assert_eq!(ops.delete.map(|o| o.id.as_str()), Some("ArchiveUser"));
    }

    #[test]
    fn generated_params_are_not_declared() {
        let mut list = op("ListUsers", HttpMethod::Get, "/users", &[]);
        let mut page = param("page", ParamLocation::Query);
        page.generated = true;
        list.parameters.push(page);
        let s = spec(vec![list]);
        assert_eq!(s.find_entity_operations("User").list_params, ListParams::default());
    }

    #[test]
    fn operation_lookups() {
        let mut o = op("GetUser", HttpMethod::Get, "/users/{id}", &[("id", ParamLocation::Path)]);
        o.responses = vec![
            Response {
                status_code: "200".into(),
                content_type: Some("application/json".into()),
                schema: Some("UserResponse".into()),
            },
            Response {
                status_code: "404".into(),
                content_type: None,
                schema: None,
            },
        ];
        assert_eq!(o.success_response().and_then(|r| r.schema.as_deref()), Some("UserResponse"));
        assert!(o.response("404").is_some());
        assert!(o.param("id", ParamLocation::Path).is_some());
        assert!(o.param("id", ParamLocation::Query).is_none());
        assert!(!o.requires_auth());
    }
    #[test]
    fn summary_renders_field_types() {
        use crate::reference::Ref;
        use crate::schema::SerializedName;
        use crate::typemap::{PostgresTypeMapper, RustTypeMapper};
        use crate::types::PrimitiveKind;

        let mut email = Schema::primitive("string", None);
        email.computed.target = Some(TargetType::Primitive {
            primitive: PrimitiveKind::String,
            format: None,
        });
        email.computed.serialized_name = Some(SerializedName::new("email", false));
        let mut user = Schema::object("User");
        user.properties.insert("Email".into(), Ref::inline(email));
        user.required = vec!["email".into()];

        let mut s = spec(vec![op("GetUser", HttpMethod::Get, "/users/{id}", &[])]);
        s.schemas.insert("User".into(), user);

        let summary = s.summary(&RustTypeMapper);
        assert_eq!(summary.types, "rust");
        assert_eq!(summary.operations.len(), 1);
        assert_eq!(
            summary.schemas[0].fields,
            vec![FieldSummary {
                name: "Email".into(),
                json: "email".into(),
                type_name: "String".into(),
                required: true,
            }]
        );
        let postgres = s.summary(&PostgresTypeMapper);
        assert_eq!(postgres.schemas[0].fields[0].type_name, "TEXT NOT NULL");
    }
}
