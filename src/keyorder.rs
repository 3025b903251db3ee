//! Canonical key order for rendered OpenAPI documents.
//!
//! Known keys sort by a fixed priority. Unknown keys follow alphabetically,
//! then `x-` extensions alphabetically. Sorting is stable, so re-rendering an
//! unchanged document gives identical bytes.

use std::cmp::Ordering;

use serde_yaml::{Mapping, Value};

const PRIORITIES: &[(&str, i32)] = &[
    // JSON Schema meta keywords
    ("$ref", -100),
    ("$schema", -99),
    ("$id", -98),
    // Document and identity
    ("openapi", 0),
    ("x-project-name", 1),
    ("info", 2),
    ("operationId", 5),
    ("name", 6),
    ("title", 7),
    ("summary", 8),
    ("description", 9),
    ("version", 10),
    // Type
    ("type", 20),
    ("enum", 21),
    ("const", 22),
    ("default", 23),
    ("format", 24),
    ("nullable", 25),
    // Composition and structure
    ("allOf", 30),
    ("anyOf", 31),
    ("oneOf", 32),
    ("not", 33),
    ("items", 41),
    ("properties", 45),
    ("additionalProperties", 47),
    // Validation
    ("minLength", 55),
    ("maxLength", 56),
    ("pattern", 57),
    ("minimum", 60),
    ("maximum", 61),
    ("exclusiveMinimum", 62),
    ("exclusiveMaximum", 63),
    ("multipleOf", 64),
    ("minItems", 70),
    ("maxItems", 71),
    ("uniqueItems", 72),
    ("minProperties", 75),
    ("maxProperties", 76),
    ("required", 82),
    // Root sections
    ("servers", 100),
    ("security", 101),
    ("tags", 102),
    ("externalDocs", 103),
    ("paths", 104),
    ("webhooks", 105),
    ("components", 106),
    // Component sections
    ("schemas", 110),
    ("parameters", 111),
    ("requestBody", 111),
    ("responses", 111),
    ("examples", 112),
    ("requestBodies", 113),
    ("headers", 114),
    ("securitySchemes", 115),
    ("links", 116),
    ("callbacks", 117),
    ("pathItems", 118),
    ("deprecated", 130),
    // Operations
    ("get", 140),
    ("put", 141),
    ("post", 142),
    ("delete", 143),
    ("options", 144),
    ("head", 145),
    ("patch", 146),
    ("trace", 147),
    // Media
    ("content", 150),
    ("schema", 151),
    ("example", 160),
    ("readOnly", 161),
    ("writeOnly", 162),
    ("xml", 163),
    ("discriminator", 164),
    // Parameters
    ("in", 170),
    ("style", 171),
    ("explode", 172),
    ("allowReserved", 173),
    ("allowEmptyValue", 174),
    // Security schemes
    ("scheme", 180),
    ("bearerFormat", 181),
    ("flows", 182),
    ("openIdConnectUrl", 183),
];

/// Fixed priority of a known key.
pub fn priority(key: &str) -> Option<i32> {
    PRIORITIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, p)| *p)
}

/// Order two keys: known by priority, then plain keys, then `x-` keys.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (priority(a), priority(b)) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let ext_a = a.starts_with("x-");
            let ext_b = b.starts_with("x-");
            ext_a.cmp(&ext_b).then_with(|| a.cmp(b))
        }
    }
}

/// Key text used for ordering; non-string keys are stringified.
pub fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Sort every mapping in `value`, recursively.
pub fn sort_value(value: &mut Value) {
    sort_with(value, &|_| false);
}

/// Sort every mapping except those whose parent key matches `keep_order`.
///
/// The children of a kept mapping are still sorted.
pub fn sort_with(value: &mut Value, keep_order: &dyn Fn(&str) -> bool) {
    sort_inner(value, false, keep_order);
}

fn sort_inner(value: &mut Value, keep: bool, keep_order: &dyn Fn(&str) -> bool) {
    match value {
        Value::Mapping(map) => {
            let entries = std::mem::take(map);
            let mut pairs: Vec<(Value, Value)> = entries.into_iter().collect();
            if !keep {
                pairs.sort_by(|(a, _), (b, _)| compare_keys(&key_text(a), &key_text(b)));
            }
            let mut sorted = Mapping::with_capacity(pairs.len());
            for (k, mut v) in pairs {
                let keep_child = keep_order(&key_text(&k));
                sort_inner(&mut v, keep_child, keep_order);
                sorted.insert(k, v);
            }
            *map = sorted;
        }
        Value::Sequence(items) => {
            for item in items {
                sort_inner(item, false, keep_order);
            }
        }
        Value::Tagged(tagged) => sort_inner(&mut tagged.value, keep, keep_order),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(value: &Value) -> Vec<String> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(key_text)
            .collect()
    }

    #[test]
    fn root_sections_in_canonical_order() {
        let mut doc: Value = serde_yaml::from_str(
            "components: {}\npaths: {}\nx-internal-note: a\ninfo: {}\nopenapi: 3.1.0\ntags: []\nzeta: 1\nalpha: 2\nx-project-name: demo\n",
        )
        .unwrap();
        sort_value(&mut doc);
        assert_eq!(
            keys(&doc),
            vec![
                "openapi",
                "x-project-name",
                "info",
                "tags",
                "paths",
                "components",
                "alpha",
                "zeta",
                "x-internal-note"
            ]
        );
    }

    #[test]
    fn schema_keys_and_numeric_status_codes() {
        let mut doc: Value = serde_yaml::from_str(
            "required: [a]\nproperties: {b: {type: string}, a: {type: string}}\ntype: object\ntitle: T\n$ref: x\n",
        )
        .unwrap();
        sort_value(&mut doc);
        assert_eq!(keys(&doc), vec!["$ref", "title", "type", "properties", "required"]);
        assert_eq!(keys(&doc["properties"]), vec!["a", "b"]);

        let mut responses: Value = serde_yaml::from_str("500: {}\n200: {}\n'404': {}\n").unwrap();
        sort_value(&mut responses);
        assert_eq!(keys(&responses), vec!["200", "404", "500"]);
    }

    #[test]
    fn kept_mapping_is_not_reordered() {
        let mut doc: Value =
            serde_yaml::from_str("paths:\n  /users: {post: {}, get: {}}\n  /health: {}\n").unwrap();
        sort_with(&mut doc, &|key| key == "paths");
        assert_eq!(keys(&doc["paths"]), vec!["/users", "/health"]);
        assert_eq!(keys(&doc["paths"]["/users"]), vec!["get", "post"]);
    }

    #[test]
    fn sorting_is_stable_for_equal_priority() {
        assert_eq!(compare_keys("responses", "parameters"), Ordering::Equal);
        let mut doc: Value = serde_yaml::from_str("responses: 1\nparameters: 2\n").unwrap();
        sort_value(&mut doc);
        assert_eq!(keys(&doc), vec!["responses", "parameters"]);
    }
}
