//! Schema data model.
//!
//! [`Schema`] is a JSON-Schema node with the OpenAPI and code-generation
//! extensions this crate understands. Wire fields round-trip through serde;
//! [`Computed`] fields are filled in by the loader and never serialized.
//!
//! Property maps are keyed by PascalCase field name once a schema has been
//! loaded. The serialized (wire) name lives in [`Computed::serialized_name`].

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::naming::camel_case;
use crate::reference::Ref;
use crate::types::{TargetType, TYPE_ARRAY, TYPE_NULL, TYPE_OBJECT};

/// `x-codegen-schema-type` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemaKind {
    /// Persistent domain object; receives base fields and response envelopes.
    Entity,
    ValueObject,
    Other(String),
}

impl From<String> for SchemaKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "entity" => SchemaKind::Entity,
            "valueobject" => SchemaKind::ValueObject,
            _ => SchemaKind::Other(value),
        }
    }
}

impl From<SchemaKind> for String {
    fn from(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Entity => "entity".to_string(),
            SchemaKind::ValueObject => "valueobject".to_string(),
            SchemaKind::Other(other) => other,
        }
    }
}

/// A `type` keyword: one name, or a list that may include `"null"`.
///
/// `"null"` is split off into `nullable` so `types` only holds real types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyType {
    pub types: Vec<String>,
    pub nullable: bool,
}

impl PropertyType {
    pub fn single(type_name: impl Into<String>) -> Self {
        Self {
            types: vec![type_name.into()],
            nullable: false,
        }
    }

    /// The first non-null type, `"null"` for a pure null type, else `""`.
    pub fn primary(&self) -> &str {
        match self.types.first() {
            Some(t) => t,
            None if self.nullable => TYPE_NULL,
            None => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && !self.nullable
    }

    /// True for `type: "null"` (or `[null]`).
    pub fn is_null(&self) -> bool {
        self.types.is_empty() && self.nullable
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.types.len() == 1 && !self.nullable {
            return serializer.serialize_str(&self.types[0]);
        }
        let mut all: Vec<&str> = self.types.iter().map(String::as_str).collect();
        if self.nullable {
            all.push(TYPE_NULL);
        }
        if all.len() == 1 {
            return serializer.serialize_str(all[0]);
        }
        all.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        let names = match Raw::deserialize(deserializer)? {
            Raw::One(name) => vec![name],
            Raw::Many(names) => names,
        };
        let mut out = PropertyType::default();
        for name in names {
            if name == TYPE_NULL {
                out.nullable = true;
            } else if !out.types.contains(&name) {
                out.types.push(name);
            }
        }
        Ok(out)
    }
}

/// `additionalProperties`: a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Ref<Schema>>),
}

/// A relation declared under `x-codegen.repository.relations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Relation {
    pub field: String,
    pub references: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

/// Repository hints under `x-codegen.repository`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryHints {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The `x-codegen` extension object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XCodegen {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryHints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Wire name of a property plus whether it may be omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedName {
    pub name: String,
    pub omit_if_absent: bool,
}

impl SerializedName {
    pub fn new(name: impl Into<String>, omit_if_absent: bool) -> Self {
        Self {
            name: name.into(),
            omit_if_absent,
        }
    }
}

impl fmt::Display for SerializedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.omit_if_absent {
            write!(f, "{},omitempty", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Fields assigned during resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Computed {
    pub target: Option<TargetType>,
    pub serialized_name: Option<SerializedName>,
    pub nullable: bool,
}

/// A JSON-Schema / OpenAPI schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "$comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,

    #[serde(rename = "type", skip_serializing_if = "PropertyType::is_empty")]
    pub type_: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    /// OpenAPI 3.0 `nullable` keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Ref<Schema>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Ref<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Ref<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Ref<Schema>>>,

    #[serde(rename = "x-codegen-schema-type", skip_serializing_if = "Option::is_none")]
    pub x_codegen_schema_type: Option<SchemaKind>,
    #[serde(rename = "x-codegen", skip_serializing_if = "Option::is_none")]
    pub x_codegen: Option<XCodegen>,
    /// Include package that owns this schema.
    #[serde(rename = "x-internal", skip_serializing_if = "Option::is_none")]
    pub x_internal: Option<String>,

    /// Keywords this model does not name, kept verbatim.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,

    #[serde(skip)]
    pub computed: Computed,
}

impl Schema {
    /// An empty object schema with the given title.
    pub fn object(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            type_: PropertyType::single(TYPE_OBJECT),
            ..Self::default()
        }
    }

    /// A scalar schema of the given type and optional format.
    pub fn primitive(type_name: &str, format: Option<&str>) -> Self {
        Self {
            type_: PropertyType::single(type_name),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn primary_type(&self) -> &str {
        self.type_.primary()
    }

    pub fn is_object(&self) -> bool {
        self.primary_type() == TYPE_OBJECT
    }

    pub fn is_array(&self) -> bool {
        self.primary_type() == TYPE_ARRAY
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// Enum values that are strings.
    pub fn enum_strings(&self) -> Vec<&str> {
        self.enum_values.iter().filter_map(Value::as_str).collect()
    }

    /// Nullable through `type`, the `nullable` keyword or a collapsed union.
    pub fn is_nullable(&self) -> bool {
        self.computed.nullable || self.type_.nullable || self.nullable.unwrap_or(false)
    }

    pub fn is_entity(&self) -> bool {
        self.x_codegen_schema_type == Some(SchemaKind::Entity)
    }

    /// True if this schema should be imported from another package.
    ///
    /// With an empty `context` any owned schema is internal; otherwise only
    /// schemas owned by a package other than `context` are.
    pub fn is_internal(&self, context: &str) -> bool {
        match self.x_internal.as_deref() {
            None | Some("") => false,
            Some(_) if context.is_empty() => true,
            Some(owner) => owner != context,
        }
    }

    pub fn target(&self) -> Option<&TargetType> {
        self.computed.target.as_ref()
    }

    pub fn serialized_name(&self) -> Option<&SerializedName> {
        self.computed.serialized_name.as_ref()
    }

    /// True if the property has a serialized name marked omit-if-absent.
    pub fn is_optional(&self) -> bool {
        self.serialized_name()
            .map(|s| s.omit_if_absent)
            .unwrap_or(false)
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// A property's value, if it has one.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.get(name).and_then(Ref::get)
    }

    pub fn items_schema(&self) -> Option<&Schema> {
        self.items.as_deref().and_then(Ref::get)
    }

    /// True if `name` (a property key or wire name) is in `required`.
    ///
    /// The property's serialized name and the camelCase form of `name` are
    /// checked as well.
    pub fn is_property_required(&self, name: &str) -> bool {
        if self.required.iter().any(|r| r == name) {
            return true;
        }
        let camel = camel_case(name);
        if self.required.iter().any(|r| *r == camel) {
            return true;
        }
        self.property(name)
            .and_then(Schema::serialized_name)
            .map(|s| self.required.iter().any(|r| *r == s.name))
            .unwrap_or(false)
    }

    pub fn required_properties(&self) -> Vec<(&str, &Schema)> {
        self.sorted_properties()
            .into_iter()
            .filter(|(name, _)| self.is_property_required(name))
            .collect()
    }

    pub fn optional_properties(&self) -> Vec<(&str, &Schema)> {
        self.sorted_properties()
            .into_iter()
            .filter(|(name, _)| !self.is_property_required(name))
            .collect()
    }

    /// Properties with values, ordered `ID`, `CreatedAt`, `UpdatedAt`, then
    /// alphabetically.
    pub fn sorted_properties(&self) -> Vec<(&str, &Schema)> {
        let mut props: Vec<(&str, &Schema)> = self
            .properties
            .iter()
            .filter_map(|(name, prop)| prop.get().map(|schema| (name.as_str(), schema)))
            .collect();
        props.sort_by(|(a, _), (b, _)| {
            property_priority(a)
                .cmp(&property_priority(b))
                .then_with(|| a.cmp(b))
        });
        props
    }

    /// Every synthesized nested object type reachable from this schema,
    /// depth first, each once.
    pub fn collect_nested_types(&self) -> Vec<&Schema> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_nested_into(&mut out, &mut visited);
        out
    }

    fn collect_nested_into<'a>(&'a self, out: &mut Vec<&'a Schema>, visited: &mut HashSet<String>) {
        for (_, prop) in self.sorted_properties() {
            if let Some(name) = prop.local_nested_name() {
                if visited.insert(name.to_string()) {
                    out.push(prop);
                    prop.collect_nested_into(out, visited);
                }
            }
            if prop.is_array() {
                let Some(items) = prop.items_schema() else {
                    continue;
                };
                match items.local_nested_name() {
                    Some(name) => {
                        if visited.insert(name.to_string()) {
                            out.push(items);
                            items.collect_nested_into(out, visited);
                        }
                    }
                    None => items.collect_nested_into(out, visited),
                }
            }
        }
    }

    /// The generated name of an inline object with properties that belongs
    /// to this package.
    fn local_nested_name(&self) -> Option<&str> {
        if !self.is_object() || self.title.is_empty() || !self.has_properties() {
            return None;
        }
        match self.target()? {
            TargetType::Named { name, module: None } => Some(name),
            _ => None,
        }
    }

    pub fn repository_indices(&self) -> &[String] {
        self.x_codegen
            .as_ref()
            .and_then(|x| x.repository.as_ref())
            .map(|r| r.indices.as_slice())
            .unwrap_or(&[])
    }

    pub fn repository_relations(&self) -> &[Relation] {
        self.x_codegen
            .as_ref()
            .and_then(|x| x.repository.as_ref())
            .map(|r| r.relations.as_slice())
            .unwrap_or(&[])
    }

    /// Add `name` to `required` unless already present.
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }
}

fn property_priority(name: &str) -> u8 {
    match name.to_ascii_lowercase().as_str() {
        "id" => 0,
        "createdat" | "created_at" => 1,
        "updatedat" | "updated_at" => 2,
        _ => 3,
    }
}

/// Schema name a `$ref` points at.
///
/// `#/components/schemas/User` and `../schemas/User.yaml#/x` both give `User`.
pub fn ref_name(path: &str) -> &str {
    if let Some(pointer) = path.strip_prefix("#/") {
        return pointer.rsplit('/').next().unwrap_or(pointer);
    }
    let file = path.split('#').next().unwrap_or(path);
    let base = file.rsplit('/').next().unwrap_or(file);
    base.strip_suffix(".yaml")
        .or_else(|| base.strip_suffix(".yml"))
        .unwrap_or(base)
}

/// Target type of a property slot.
///
/// An unresolved `$ref` falls back to a named type derived from the ref.
pub fn property_target(prop: &Ref<Schema>) -> Option<TargetType> {
    match prop {
        Ref::Unresolved(path) => Some(TargetType::named(ref_name(path))),
        Ref::Resolved { value, .. } | Ref::Inline(value) => value.target().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(yaml: &str) -> Schema {
        serde_yaml::from_str(yaml).unwrap()
    }

    // === Wire format ===

    mod wire {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn type_list_with_null_is_nullable() {
            let s = parse("type: [string, 'null']\n");
            assert_eq!(s.primary_type(), "string");
            assert!(s.is_nullable());
            let json = serde_json::to_value(&s.type_).unwrap();
            assert_eq!(json, serde_json::json!(["string", "null"]));
        }

        #[test]
        fn pure_null_type() {
            let s = parse("type: 'null'\n");
            assert!(s.type_.is_null());
            assert_eq!(s.primary_type(), "null");
        }

        #[test]
        fn single_type_serializes_as_scalar() {
            let s = Schema::primitive("integer", Some("int64"));
            let json = serde_json::to_value(&s).unwrap();
            assert_eq!(json, serde_json::json!({"type": "integer", "format": "int64"}));
        }

        #[test]
        fn extensions_are_preserved() {
            let s = parse(
                "title: User\nx-codegen-schema-type: entity\nx-internal: server\nx-sort: 3\nexample: {a: 1}\n",
            );
            assert!(s.is_entity());
            assert_eq!(s.x_internal.as_deref(), Some("server"));
            assert_eq!(s.extensions.get("x-sort"), Some(&serde_json::json!(3)));
            assert!(s.extensions.contains_key("example"));
        }

        #[test]
        fn properties_hold_refs_and_inline() {
            let s = parse(
                "type: object\nproperties:\n  owner:\n    $ref: ./User.yaml\n  name:\n    type: string\n",
            );
            assert!(s.properties["owner"].is_ref());
            assert!(s.properties["name"].is_inline());
            let out = serde_yaml::to_string(&s).unwrap();
            assert!(out.contains("$ref: ./User.yaml"));
        }

        #[test]
        fn x_codegen_repository_hints() {
            let s = parse(
                "x-codegen:\n  repository:\n    indices: [email]\n    relations:\n      - field: orgId\n        references: Organization\n  cache:\n    ttl: 60\n  extra: true\n",
            );
            assert_eq!(s.repository_indices(), ["email".to_string()]);
            assert_eq!(s.repository_relations()[0].references, "Organization");
            let x = s.x_codegen.unwrap();
            assert!(x.cache.is_some());
            assert!(x.extra.contains_key("extra"));
        }

        #[test]
        fn additional_properties_forms() {
            let s = parse("additionalProperties: false\n");
            assert_eq!(s.additional_properties, Some(AdditionalProperties::Allowed(false)));
            let s = parse("additionalProperties:\n  type: string\n");
            assert!(matches!(
                s.additional_properties,
                Some(AdditionalProperties::Schema(_))
            ));
        }

        #[test]
        fn schema_kind_other_round_trips() {
            let s = parse("x-codegen-schema-type: aggregate\n");
            assert_eq!(
                s.x_codegen_schema_type,
                Some(SchemaKind::Other("aggregate".into()))
            );
            let out = serde_yaml::to_string(&s).unwrap();
            assert!(out.contains("x-codegen-schema-type: aggregate"));
        }

        #[test]
        fn computed_fields_are_not_serialized() {
            let mut s = Schema::object("User");
            s.computed.target = Some(TargetType::named("User"));
            s.computed.nullable = true;
            let out = serde_yaml::to_string(&s).unwrap();
            assert_eq!(out, "title: User\ntype: object\n");
        }
    }

    // === Helpers ===

    mod helpers {
        use super::*;
        use pretty_assertions::assert_eq;

        fn field(type_name: &str, json: &str, omit: bool) -> Ref<Schema> {
            let mut s = Schema::primitive(type_name, None);
            s.computed.serialized_name = Some(SerializedName::new(json, omit));
            Ref::inline(s)
        }

        fn sample() -> Schema {
            let mut s = Schema::object("User");
            s.properties.insert("Name".into(), field("string", "name", false));
            s.properties.insert("UpdatedAt".into(), field("string", "updatedAt", false));
            s.properties.insert("Age".into(), field("integer", "age", true));
            s.properties.insert("ID".into(), field("string", "id", false));
            s.properties.insert("CreatedAt".into(), field("string", "createdAt", false));
            s.properties.insert("Owner".into(), Ref::new("./Owner.yaml"));
            s.required = vec![
                "id".into(),
                "createdAt".into(),
                "updatedAt".into(),
                "name".into(),
            ];
            s
        }

        #[test]
        fn sorted_properties_put_base_fields_first() {
            let s = sample();
            let names: Vec<_> = s.sorted_properties().into_iter().map(|(n, _)| n).collect();
            assert_eq!(names, vec!["ID", "CreatedAt", "UpdatedAt", "Age", "Name"]);
        }

        #[test]
        fn required_and_optional_split() {
            let s = sample();
            let required: Vec<_> = s.required_properties().into_iter().map(|(n, _)| n).collect();
            let optional: Vec<_> = s.optional_properties().into_iter().map(|(n, _)| n).collect();
            assert_eq!(required, vec!["ID", "CreatedAt", "UpdatedAt", "Name"]);
            assert_eq!(optional, vec!["Age"]);
            assert!(s.is_property_required("name"));
            assert!(!s.is_property_required("Age"));
        }

        #[test]
        fn is_internal_by_context() {
            let mut s = Schema::object("Problem");
            assert!(!s.is_internal(""));
            s.x_internal = Some("server".into());
            assert!(s.is_internal(""));
            assert!(s.is_internal("billing"));
            assert!(!s.is_internal("server"));
        }

        #[test]
        fn require_is_idempotent() {
            let mut s = Schema::object("User");
            s.require("id");
            s.require("id");
            assert_eq!(s.required, vec!["id".to_string()]);
        }

        #[test]
        fn enum_helpers() {
            let s = parse("type: string\nenum: [admin, member]\n");
            assert!(s.is_enum());
            assert_eq!(s.enum_strings(), vec!["admin", "member"]);
        }

        #[test]
        fn ref_names() {
            assert_eq!(ref_name("#/components/schemas/User"), "User");
            assert_eq!(ref_name("../components/schemas/User.yaml"), "User");
            assert_eq!(ref_name("./Role.yml"), "Role");
            assert_eq!(ref_name("Page.yaml#/properties/size"), "Page");
            assert_eq!(ref_name("Plain"), "Plain");
        }

        #[test]
        fn property_target_for_unresolved_ref() {
            let r: Ref<Schema> = Ref::new("../schemas/Account.yaml");
            assert_eq!(property_target(&r), Some(TargetType::named("Account")));
        }
    }

    // === Nested types ===

    mod nested {
        use super::*;
        use pretty_assertions::assert_eq;

        fn nested(title: &str, target: &str) -> Schema {
            let mut s = Schema::object(title);
            s.computed.target = Some(TargetType::named(target));
            s
        }

        #[test]
        fn collects_objects_and_array_items_once() {
            let mut address = nested("Address", "UserAddress");
            address
                .properties
                .insert("Street".into(), Ref::inline(Schema::primitive("string", None)));
            let mut geo = nested("Geo", "UserAddressGeo");
            geo.properties
                .insert("Lat".into(), Ref::inline(Schema::primitive("number", None)));
            address.properties.insert("Geo".into(), Ref::inline(geo));

            let mut tag = nested("Tags", "UserTagsItem");
            tag.properties
                .insert("Label".into(), Ref::inline(Schema::primitive("string", None)));
            let mut tags = Schema::primitive("array", None);
            tags.items = Some(Box::new(Ref::inline(tag)));

            let mut user = Schema::object("User");
            user.properties.insert("Address".into(), Ref::inline(address.clone()));
            user.properties.insert("Billing".into(), Ref::inline(address));
            user.properties.insert("Tags".into(), Ref::inline(tags));

            let names: Vec<_> = user
                .collect_nested_types()
                .into_iter()
                .filter_map(|s| s.target().and_then(TargetType::name))
                .collect();
            assert_eq!(names, vec!["UserAddress", "UserAddressGeo", "UserTagsItem"]);
        }

        #[test]
        fn skips_named_types_from_other_modules() {
            let mut meta = Schema::object("Meta");
            meta.computed.target = Some(TargetType::Named {
                name: "PaginationMeta".into(),
                module: Some("server".into()),
            });
            meta.properties
                .insert("Total".into(), Ref::inline(Schema::primitive("integer", None)));
            let mut outer = Schema::object("Wrapper");
            outer.properties.insert("Meta".into(), Ref::inline(meta));
            assert!(outer.collect_nested_types().is_empty());
        }
    }
}
