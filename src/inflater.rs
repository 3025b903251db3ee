//! Derived schemas and parameters.
//!
//! The inflater never touches its inputs. It returns what should be added:
//! response envelopes for every entity, and `filter`/`sort`/`page` query
//! parameters for list operations that do not declare them.

use std::collections::BTreeMap;

use crate::naming::pluralize;
use crate::reference::Ref;
use crate::schema::{Schema, SerializedName};
use crate::spec::{Operation, Param, Response};
use crate::types::{
    ParamLocation, TargetType, CONTENT_TYPE_PROBLEM_JSON, TYPE_ARRAY, TYPE_INTEGER, TYPE_OBJECT,
    TYPE_STRING,
};

/// Include package that owns the pagination and filter types.
pub const SERVER_MODULE: &str = "server";

pub const PROBLEM_SCHEMA: &str = "Problem";
pub const NO_CONTENT_SCHEMA: &str = "NoContent";

/// What the inflater generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateConfig {
    /// `<Entity>Response` and `<Entity>ListResponse`.
    pub response_wrappers: bool,
    /// `filter`, `sort` and `page` on list operations.
    pub list_params: bool,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            response_wrappers: true,
            list_params: true,
        }
    }
}

/// Output of one inflation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inflated {
    /// Envelope schemas not already present, by title.
    pub response_schemas: BTreeMap<String, Schema>,
    /// Missing list parameters, by operation id.
    pub list_params: BTreeMap<String, Vec<Param>>,
}

impl Inflated {
    pub fn is_empty(&self) -> bool {
        self.response_schemas.is_empty() && self.list_params.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Inflater {
    config: InflateConfig,
}

impl Inflater {
    pub fn new(config: InflateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> InflateConfig {
        self.config
    }

    /// Compute what `schemas` and `operations` are missing.
    pub fn inflate(&self, schemas: &BTreeMap<String, Schema>, operations: &[Operation]) -> Inflated {
        let mut out = Inflated::default();
        if self.config.response_wrappers {
            out.response_schemas = self.response_wrappers(schemas);
        }
        if self.config.list_params {
            let lookup = |name: &str| schemas.get(name).or_else(|| out.response_schemas.get(name));
            let mut params = BTreeMap::new();
            for op in operations {
                let missing = list_params_for(op, &lookup);
                if !missing.is_empty() {
                    params.insert(op.id.clone(), missing);
                }
            }
            out.list_params = params;
        }
        out
    }

    /// Envelopes for every entity in `schemas` that does not have them yet.
    pub fn response_wrappers(&self, schemas: &BTreeMap<String, Schema>) -> BTreeMap<String, Schema> {
        let mut out = BTreeMap::new();
        for entity in schemas.values().filter(|s| s.is_entity()) {
            for wrapper in [response_wrapper(entity), list_response_wrapper(entity)] {
                if !schemas.contains_key(&wrapper.title) {
                    out.insert(wrapper.title.clone(), wrapper);
                }
            }
        }
        out
    }
}

fn list_params_for<'a>(op: &Operation, lookup: &impl Fn(&str) -> Option<&'a Schema>) -> Vec<Param> {
    let Some(entity) = list_entity(op, lookup) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if !has_param(op, "filter") {
        out.push(filter_param(entity));
    }
    if !has_param(op, "sort") {
        out.push(sort_param(entity));
    }
    if !has_param(op, "page") {
        out.push(page_param());
    }
    out
}

/// The item schema of an operation whose 200 response is a list envelope.
fn list_entity<'a>(op: &Operation, lookup: &impl Fn(&str) -> Option<&'a Schema>) -> Option<&'a Schema> {
    let title = op.response("200")?.schema.as_deref()?;
    if !title.ends_with("ListResponse") {
        return None;
    }
    let data = lookup(title)?.property("Data")?;
    if !data.is_array() {
        return None;
    }
    let item = data.target()?.innermost_name()?;
    lookup(item)
}

fn has_param(op: &Operation, name: &str) -> bool {
    op.parameters.iter().any(|p| {
        p.name == name
            || p.schema.title == name
            || p.schema.serialized_name().map(|s| s.name.as_str()) == Some(name)
    })
}

/// `<Name>Response { data }`.
pub fn response_wrapper(entity: &Schema) -> Schema {
    let mut wrapper = Schema::object(format!("{}Response", entity.title));
    wrapper.properties.insert(
        "Data".to_string(),
        Ref::inline(field(
            "Data",
            "data",
            TYPE_OBJECT,
            TargetType::named(&entity.title),
        )),
    );
    wrapper.required = vec!["data".to_string()];
    wrapper.computed.target = Some(TargetType::named(&wrapper.title));
    wrapper
}

/// `<Name>ListResponse { data: [<Name>], meta }`.
pub fn list_response_wrapper(entity: &Schema) -> Schema {
    let mut wrapper = Schema::object(format!("{}ListResponse", entity.title));
    let mut data = field(
        "Data",
        "data",
        TYPE_ARRAY,
        TargetType::array_of(TargetType::named(&entity.title)),
    );
    data.items = Some(Box::new(Ref::new(format!(
        "#/components/schemas/{}",
        entity.title
    ))));
    wrapper.properties.insert("Data".to_string(), Ref::inline(data));
    wrapper.properties.insert(
        "Meta".to_string(),
        Ref::inline(field("Meta", "meta", TYPE_OBJECT, server_type("PaginationMeta"))),
    );
    wrapper.required = vec!["data".to_string(), "meta".to_string()];
    wrapper.computed.target = Some(TargetType::named(&wrapper.title));
    wrapper
}

fn field(title: &str, json: &str, type_name: &str, target: TargetType) -> Schema {
    let mut schema = Schema::primitive(type_name, None);
    schema.title = title.to_string();
    schema.computed.target = Some(target);
    schema.computed.serialized_name = Some(SerializedName::new(json, false));
    schema
}

fn server_type(name: &str) -> TargetType {
    TargetType::Named {
        name: name.to_string(),
        module: Some(SERVER_MODULE.to_string()),
    }
}

fn query_param(name: &str, schema: Schema, style: &str, description: String) -> Param {
    Param {
        name: name.to_string(),
        location: ParamLocation::Query,
        schema,
        required: false,
        description,
        style: Some(style.to_string()),
        explode: None,
        generated: true,
    }
}

/// `filter`: a `FilterNode` tree in deep-object style.
pub fn filter_param(entity: &Schema) -> Param {
    let title = format!("{}Filter", pluralize(&entity.title));
    let mut schema = field(&title, "filter", TYPE_OBJECT, server_type("FilterNode"));
    schema.computed.serialized_name = Some(SerializedName::new("filter", true));
    query_param(
        "filter",
        schema,
        "deepObject",
        format!("Filter {}", pluralize(&entity.title)),
    )
}

/// `sort`: comma-separated field names, `-` prefix for descending.
pub fn sort_param(entity: &Schema) -> Param {
    let title = format!("{}Sort", pluralize(&entity.title));
    let mut schema = field(&title, "sort", TYPE_STRING, TargetType::from_type(TYPE_STRING, None));
    schema.computed.serialized_name = Some(SerializedName::new("sort", true));
    query_param(
        "sort",
        schema,
        "form",
        format!("Sort {}", pluralize(&entity.title)),
    )
}

/// `page`: the shared `Page` shape.
pub fn page_param() -> Param {
    let mut schema = field("Page", "page", TYPE_OBJECT, server_type("Page"));
    schema.computed.serialized_name = Some(SerializedName::new("page", true));
    query_param("page", schema, "deepObject", "Pagination".to_string())
}

/// RFC 7807 problem details.
pub fn problem_schema() -> Schema {
    let mut problem = Schema::object(PROBLEM_SCHEMA);
    for (title, json, type_name) in [
        ("Type", "type", TYPE_STRING),
        ("Title", "title", TYPE_STRING),
        ("Status", "status", TYPE_INTEGER),
        ("Detail", "detail", TYPE_STRING),
    ] {
        let target = TargetType::from_type(type_name, None);
        let mut prop = field(title, json, type_name, target);
        prop.computed.serialized_name = Some(SerializedName::new(json, true));
        problem.properties.insert(title.to_string(), Ref::inline(prop));
    }
    problem.computed.target = Some(TargetType::named(PROBLEM_SCHEMA));
    problem
}

/// Empty body for `204` responses.
pub fn no_content_schema() -> Schema {
    let mut schema = Schema::object(NO_CONTENT_SCHEMA);
    schema.computed.target = Some(TargetType::named(NO_CONTENT_SCHEMA));
    schema
}

/// 400, 401, (404), 422, 429 and 500 as problem responses.
///
/// 404 is included when the operation addresses a resource by id.
pub fn standard_error_responses(has_resource_id: bool) -> Vec<Response> {
    let mut codes = vec!["400", "401"];
    if has_resource_id {
        codes.push("404");
    }
    codes.extend(["422", "429", "500"]);
    codes
        .into_iter()
        .map(|code| Response {
            status_code: code.to_string(),
            content_type: Some(CONTENT_TYPE_PROBLEM_JSON.to_string()),
            schema: Some(PROBLEM_SCHEMA.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::add_base_fields;
    use crate::schema::SchemaKind;
    use crate::types::{HttpMethod, CONTENT_TYPE_JSON};
    use pretty_assertions::assert_eq;

    fn entity(name: &str) -> Schema {
        let mut s = Schema::object(name);
        s.x_codegen_schema_type = Some(SchemaKind::Entity);
        add_base_fields(&mut s);
        s.computed.target = Some(TargetType::named(name));
        s
    }

    fn list_op(id: &str, response: &str) -> Operation {
        Operation {
            id: id.into(),
            method: HttpMethod::Get,
            path: "/users".into(),
            summary: String::new(),
            description: String::new(),
            tag: String::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: vec![Response {
                status_code: "200".into(),
                content_type: Some(CONTENT_TYPE_JSON.into()),
                schema: Some(response.into()),
            }],
            security: Vec::new(),
            public: false,
            public_endpoint_marker: false,
            custom_handler: false,
            internal: None,
            crud: None,
        }
    }

    fn schemas(items: Vec<Schema>) -> BTreeMap<String, Schema> {
        items.into_iter().map(|s| (s.title.clone(), s)).collect()
    }

    #[test]
    fn wraps_entities_only() {
        let input = schemas(vec![entity("User"), Schema::object("Address")]);
        let out = Inflater::default().inflate(&input, &[]);
        let names: Vec<_> = out.response_schemas.keys().cloned().collect();
        assert_eq!(names, vec!["UserListResponse", "UserResponse"]);

        let list = &out.response_schemas["UserListResponse"];
        assert_eq!(list.required, vec!["data", "meta"]);
        assert_eq!(
            list.property("Data").unwrap().target(),
            Some(&TargetType::array_of(TargetType::named("User")))
        );
        assert_eq!(
            list.property("Meta").unwrap().target(),
            Some(&server_type("PaginationMeta"))
        );
        let single = &out.response_schemas["UserResponse"];
        assert_eq!(single.required, vec!["data"]);
    }

    #[test]
    fn list_operation_gains_params() {
        let input = schemas(vec![entity("User")]);
        let ops = vec![list_op("ListUsers", "UserListResponse"), list_op("GetUser", "UserResponse")];
        let out = Inflater::default().inflate(&input, &ops);
        let params = &out.list_params["ListUsers"];
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["filter", "sort", "page"]);
        assert_eq!(params[0].schema.title, "UsersFilter");
        assert_eq!(params[0].style.as_deref(), Some("deepObject"));
        assert!(params.iter().all(|p| p.generated && p.location == ParamLocation::Query));
        assert!(!out.list_params.contains_key("GetUser"));
    }

    #[test]
    fn inflation_is_idempotent() {
        let mut all = schemas(vec![entity("User")]);
        let mut ops = vec![list_op("ListUsers", "UserListResponse")];
        let inflater = Inflater::default();

        let first = inflater.inflate(&all, &ops);
        all.extend(first.response_schemas.clone());
        for op in &mut ops {
            if let Some(extra) = first.list_params.get(&op.id) {
                op.parameters.extend(extra.iter().cloned());
            }
        }

        let second = inflater.inflate(&all, &ops);
        assert!(second.is_empty(), "{:?}", second);
    }

    #[test]
    fn declared_params_are_kept() {
        let input = schemas(vec![entity("User")]);
        let mut op = list_op("ListUsers", "UserListResponse");
        op.parameters.push(page_param());
        op.parameters[0].generated = false;
        let out = Inflater::default().inflate(&input, &[op]);
        let names: Vec<_> = out.list_params["ListUsers"].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["filter", "sort"]);
    }

    #[test]
    fn config_switches() {
        let input = schemas(vec![entity("User")]);
        let ops = vec![list_op("ListUsers", "UserListResponse")];
        let out = Inflater::new(InflateConfig {
            response_wrappers: false,
            list_params: true,
        })
        .inflate(&input, &ops);
        assert!(out.is_empty());
    }

    #[test]
    fn standard_errors() {
        let codes = |id| {
            standard_error_responses(id)
                .into_iter()
                .map(|r| r.status_code)
                .collect::<Vec<_>>()
        };
        assert_eq!(codes(false), vec!["400", "401", "422", "429", "500"]);
        assert_eq!(codes(true), vec!["400", "401", "404", "422", "429", "500"]);
        assert!(standard_error_responses(true)
            .iter()
            .all(|r| r.schema.as_deref() == Some(PROBLEM_SCHEMA)));
    }

    #[test]
    fn problem_shape() {
        let problem = problem_schema();
        let keys: Vec<_> = problem.properties.keys().cloned().collect();
        assert_eq!(keys, vec!["Type", "Title", "Status", "Detail"]);
        assert_eq!(
            problem.property("Status").unwrap().target(),
            Some(&TargetType::from_type("integer", None))
        );
    }
}
