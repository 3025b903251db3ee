//! Core types shared by the loader, parser, inflater and bundler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// JSON-Schema type names.
pub const TYPE_STRING: &str = "string";
pub const TYPE_INTEGER: &str = "integer";
pub const TYPE_NUMBER: &str = "number";
pub const TYPE_BOOLEAN: &str = "boolean";
pub const TYPE_ARRAY: &str = "array";
pub const TYPE_OBJECT: &str = "object";
pub const TYPE_NULL: &str = "null";

/// Well-known `format` values.
pub const FORMAT_DATE_TIME: &str = "date-time";
pub const FORMAT_DATE: &str = "date";
pub const FORMAT_UUID: &str = "uuid";
pub const FORMAT_INT32: &str = "int32";
pub const FORMAT_FLOAT: &str = "float";

/// Media types.
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_PROBLEM_JSON: &str = "application/problem+json";

/// HTTP methods that produce operations.
///
/// Variant order is alphabetical so sorting by method matches sorting by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// CRUD role an operation plays for an entity (`x-codegen-crud`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudKind {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// Component sections discovered on disk and emitted by the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Schemas,
    Responses,
    Parameters,
    Headers,
    SecuritySchemes,
}

impl ComponentKind {
    /// Bundle emission order.
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Schemas,
        ComponentKind::Responses,
        ComponentKind::Parameters,
        ComponentKind::Headers,
        ComponentKind::SecuritySchemes,
    ];

    /// Key under `components` (and directory under `components/`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Responses => "responses",
            ComponentKind::Parameters => "parameters",
            ComponentKind::Headers => "headers",
            ComponentKind::SecuritySchemes => "securitySchemes",
        }
    }

    /// Infer the kind from a file path by its directory segments.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| {
            let segment = format!("{}/", kind.as_str().to_ascii_lowercase());
            lower.starts_with(&segment) || lower.contains(&format!("/{}", segment))
        })
    }
}

/// Scalar kinds a target type can bottom out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            TYPE_STRING => Some(PrimitiveKind::String),
            TYPE_INTEGER => Some(PrimitiveKind::Integer),
            TYPE_NUMBER => Some(PrimitiveKind::Number),
            TYPE_BOOLEAN => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }
}

/// Backend-agnostic category of the type a schema generates to.
///
/// Named types are handles into the schema map, never copies of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetType {
    Primitive {
        primitive: PrimitiveKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Array {
        items: Box<TargetType>,
    },
    /// Free-form object without declared properties.
    Map,
    Named {
        name: String,
        /// Include package that owns the type.
        #[serde(skip_serializing_if = "Option::is_none")]
        module: Option<String>,
    },
    Any,
}

impl TargetType {
    pub fn named(name: impl Into<String>) -> Self {
        TargetType::Named {
            name: name.into(),
            module: None,
        }
    }

    pub fn array_of(items: TargetType) -> Self {
        TargetType::Array {
            items: Box::new(items),
        }
    }

    /// Map a JSON-Schema type name plus format to a target type.
    pub fn from_type(type_name: &str, format: Option<&str>) -> Self {
        match PrimitiveKind::from_type_name(type_name) {
            Some(primitive) => TargetType::Primitive {
                primitive,
                format: format.map(str::to_string),
            },
            None if type_name == TYPE_OBJECT => TargetType::Map,
            None => TargetType::Any,
        }
    }

    /// The referenced schema name for `Named` types.
    pub fn name(&self) -> Option<&str> {
        match self {
            TargetType::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The innermost named type, looking through arrays.
    pub fn innermost_name(&self) -> Option<&str> {
        match self {
            TargetType::Named { name, .. } => Some(name),
            TargetType::Array { items } => items.innermost_name(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_orders_alphabetically() {
        let mut methods = HttpMethod::ALL.to_vec();
        methods.sort();
        let names: Vec<_> = methods.iter().map(HttpMethod::as_str).collect();
        assert_eq!(names, vec!["DELETE", "GET", "PATCH", "POST", "PUT"]);
    }

    #[test]
    fn component_kind_from_path() {
        assert_eq!(
            ComponentKind::from_path("../components/schemas/User.yaml"),
            Some(ComponentKind::Schemas)
        );
        assert_eq!(
            ComponentKind::from_path("responses/NotFound.yaml"),
            Some(ComponentKind::Responses)
        );
        assert_eq!(
            ComponentKind::from_path("./SecuritySchemes/Bearer.yaml"),
            Some(ComponentKind::SecuritySchemes)
        );
        assert_eq!(ComponentKind::from_path("./User.yaml"), None);
    }

    #[test]
    fn target_type_from_type_name() {
        assert_eq!(
            TargetType::from_type("string", Some("uuid")),
            TargetType::Primitive {
                primitive: PrimitiveKind::String,
                format: Some("uuid".into())
            }
        );
        assert_eq!(TargetType::from_type("object", None), TargetType::Map);
        assert_eq!(TargetType::from_type("", None), TargetType::Any);
    }

    #[test]
    fn innermost_name_looks_through_arrays() {
        let t = TargetType::array_of(TargetType::array_of(TargetType::named("User")));
        assert_eq!(t.innermost_name(), Some("User"));
        assert_eq!(t.name(), None);
    }
}
