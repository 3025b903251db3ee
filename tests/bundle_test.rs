//! Bundling the petstore fixture into one self-contained document.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_yaml::Value;
use specweave::{bundle_file, render, BUNDLE_OPENAPI_VERSION};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn petstore() -> Value {
    bundle_file(&fixture("petstore/openapi.yaml"), &["server".to_string()]).unwrap()
}

fn keys(value: &Value) -> Vec<String> {
    value
        .as_mapping()
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                if key.as_str() == Some("$ref") {
                    if let Some(target) = child.as_str() {
                        out.push(target.to_string());
                    }
                }
                collect_refs(child, out);
            }
        }
        Value::Sequence(items) => items.iter().for_each(|item| collect_refs(item, out)),
        Value::Tagged(tagged) => collect_refs(&tagged.value, out),
        _ => {}
    }
}

fn lookup<'v>(root: &'v Value, pointer: &str) -> Option<&'v Value> {
    pointer
        .trim_start_matches("#/")
        .split('/')
        .try_fold(root, |node, segment| {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            node.get(segment.as_str())
        })
}

// === Structure ===

#[test]
fn header_fields_come_first() {
    let bundle = petstore();
    let top = keys(&bundle);
    assert_eq!(
        top,
        vec![
            "openapi",
            "x-project-name",
            "info",
            "security",
            "tags",
            "paths",
            "components"
        ]
    );
    assert_eq!(bundle["openapi"].as_str(), Some(BUNDLE_OPENAPI_VERSION));
    assert_eq!(bundle["x-project-name"].as_str(), Some("petstore"));
    assert_eq!(bundle["info"]["version"].as_str(), Some("2.1.0"));
}

#[test]
fn paths_ordered_with_health_last() {
    let bundle = petstore();
    assert_eq!(
        keys(&bundle["paths"]),
        vec!["/pets", "/pets/{id}", "/health"]
    );
}

#[test]
fn tags_are_merged_and_sorted() {
    let bundle = petstore();
    let tags = bundle["tags"].as_sequence().unwrap();
    let names: Vec<&str> = tags.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, vec!["Owners", "Pets", "System"]);
    assert_eq!(
        tags[1]["description"].as_str(),
        Some("Adopt, list and retire pets")
    );
}

#[test]
fn component_sections_collected() {
    let bundle = petstore();
    let components = &bundle["components"];
    for schema in ["Pet", "Owner", "Health", "Problem", "Page", "FilterNode"] {
        assert!(
            components["schemas"].get(schema).is_some(),
            "missing schema {schema}"
        );
    }
    assert!(components["parameters"].get("Species").is_some());
    assert!(components["responses"].get("PetGone").is_some());
    assert!(components["securitySchemes"].get("bearerAuth").is_some());
}

// === Layering ===

#[test]
fn project_schema_overrides_include() {
    let bundle = petstore();
    let health = &bundle["components"]["schemas"]["Health"];
    assert!(health["properties"].get("uptimeSeconds").is_some());
    assert!(health["properties"].get("timestamp").is_none());
}

// === References ===

#[test]
fn no_file_references_remain() {
    let bundle = petstore();
    let mut refs = Vec::new();
    collect_refs(&bundle, &mut refs);
    assert!(!refs.is_empty());
    for target in &refs {
        assert!(target.starts_with("#/"), "file reference left: {target}");
    }
}

#[test]
fn every_reference_has_a_target() {
    let bundle = petstore();
    let mut refs = Vec::new();
    collect_refs(&bundle, &mut refs);
    for target in &refs {
        assert!(lookup(&bundle, target).is_some(), "dangling reference: {target}");
    }
}

#[test]
fn references_point_at_sections() {
    let bundle = petstore();
    let pets = &bundle["paths"]["/pets"];
    assert_eq!(
        pets["get"]["parameters"][0]["$ref"].as_str(),
        Some("#/components/parameters/Species")
    );
    assert_eq!(
        bundle["components"]["schemas"]["Pet"]["properties"]["owner"]["$ref"].as_str(),
        Some("#/components/schemas/Owner")
    );
    assert_eq!(
        bundle["paths"]["/pets/{id}"]["get"]["responses"]["410"]["$ref"].as_str(),
        Some("#/components/responses/PetGone")
    );
}

// === Rendering ===

#[test]
fn rebundling_is_byte_identical() {
    let first = render(&petstore(), "yaml").unwrap();
    let second = render(&petstore(), "yaml").unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("openapi: 3.1.0\n"));
}

#[test]
fn yaml_and_json_describe_the_same_document() {
    let bundle = petstore();
    let json = render(&bundle, "json").unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let expected = serde_json::to_value(&bundle).unwrap();
    assert_eq!(parsed, expected);
}

#[test]
fn bundle_without_includes_has_no_health() {
    let bundle = bundle_file(&fixture("petstore/openapi.yaml"), &[]).unwrap();
    assert_eq!(keys(&bundle["paths"]), vec!["/pets", "/pets/{id}"]);
    // the project override is still a component of its own
    assert!(bundle["components"]["schemas"].get("Health").is_some());
    assert!(bundle["components"]["schemas"].get("Problem").is_none());
}
