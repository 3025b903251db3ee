//! Rendering target types for a particular backend.
//!
//! The resolver only produces [`TargetType`] values; a [`TypeMapper`] turns
//! them into the spelling a backend needs.

use crate::types::{
    PrimitiveKind, TargetType, FORMAT_DATE, FORMAT_DATE_TIME, FORMAT_FLOAT, FORMAT_INT32,
    FORMAT_UUID,
};

/// Renders a target type as backend source text.
pub trait TypeMapper {
    /// Backend name, as accepted by [`mapper_for`].
    fn name(&self) -> &'static str;

    /// Render `target`, wrapped for nullability when `nullable` is set.
    fn render(&self, target: &TargetType, nullable: bool) -> String;
}

/// Rust types (`uuid` and `chrono` for well-known formats).
#[derive(Debug, Default, Clone, Copy)]
pub struct RustTypeMapper;

impl RustTypeMapper {
    fn base(&self, target: &TargetType) -> String {
        match target {
            TargetType::Primitive { primitive, format } => match (primitive, format.as_deref()) {
                (PrimitiveKind::String, Some(FORMAT_UUID)) => "uuid::Uuid".to_string(),
                (PrimitiveKind::String, Some(FORMAT_DATE_TIME)) => {
                    "chrono::DateTime<chrono::Utc>".to_string()
                }
                (PrimitiveKind::String, Some(FORMAT_DATE)) => "chrono::NaiveDate".to_string(),
                (PrimitiveKind::String, _) => "String".to_string(),
                (PrimitiveKind::Integer, Some(FORMAT_INT32)) => "i32".to_string(),
                (PrimitiveKind::Integer, _) => "i64".to_string(),
                (PrimitiveKind::Number, Some(FORMAT_FLOAT)) => "f32".to_string(),
                (PrimitiveKind::Number, _) => "f64".to_string(),
                (PrimitiveKind::Boolean, _) => "bool".to_string(),
            },
            TargetType::Array { items } => format!("Vec<{}>", self.base(items)),
            TargetType::Map => "HashMap<String, serde_json::Value>".to_string(),
            TargetType::Named { name, module: None } => name.clone(),
            TargetType::Named {
                name,
                module: Some(module),
            } => format!("{}::{}", module, name),
            TargetType::Any => "serde_json::Value".to_string(),
        }
    }
}

impl TypeMapper for RustTypeMapper {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn render(&self, target: &TargetType, nullable: bool) -> String {
        let base = self.base(target);
        if nullable {
            format!("Option<{}>", base)
        } else {
            base
        }
    }
}

/// PostgreSQL column types.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn render(&self, target: &TargetType, nullable: bool) -> String {
        let base = match target {
            TargetType::Primitive { primitive, format } => match (primitive, format.as_deref()) {
                (PrimitiveKind::String, Some(FORMAT_UUID)) => "UUID",
                (PrimitiveKind::String, Some(FORMAT_DATE_TIME)) => "TIMESTAMPTZ",
                (PrimitiveKind::String, Some(FORMAT_DATE)) => "DATE",
                (PrimitiveKind::String, _) => "TEXT",
                (PrimitiveKind::Integer, Some(FORMAT_INT32)) => "INTEGER",
                (PrimitiveKind::Integer, _) => "BIGINT",
                (PrimitiveKind::Number, Some(FORMAT_FLOAT)) => "REAL",
                (PrimitiveKind::Number, _) => "DOUBLE PRECISION",
                (PrimitiveKind::Boolean, _) => "BOOLEAN",
            }
            .to_string(),
            TargetType::Array { items } => match items.as_ref() {
                TargetType::Primitive { .. } => format!("{}[]", self.render(items, true)),
                _ => "JSONB".to_string(),
            },
            TargetType::Map | TargetType::Named { .. } | TargetType::Any => "JSONB".to_string(),
        };
        if nullable {
            base
        } else {
            format!("{} NOT NULL", base)
        }
    }
}

/// Look up a mapper by backend name.
pub fn mapper_for(name: &str) -> Option<Box<dyn TypeMapper>> {
    match name {
        "rust" => Some(Box::new(RustTypeMapper)),
        "postgres" => Some(Box::new(PostgresTypeMapper)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(primitive: PrimitiveKind, format: Option<&str>) -> TargetType {
        TargetType::Primitive {
            primitive,
            format: format.map(str::to_string),
        }
    }

    #[test]
    fn rust_primitives_and_formats() {
        let m = RustTypeMapper;
        assert_eq!(m.render(&prim(PrimitiveKind::String, None), false), "String");
        assert_eq!(
            m.render(&prim(PrimitiveKind::String, Some("uuid")), false),
            "uuid::Uuid"
        );
        assert_eq!(
            m.render(&prim(PrimitiveKind::String, Some("date-time")), true),
            "Option<chrono::DateTime<chrono::Utc>>"
        );
        assert_eq!(m.render(&prim(PrimitiveKind::Integer, None), false), "i64");
        assert_eq!(m.render(&prim(PrimitiveKind::Boolean, None), false), "bool");
    }

    #[test]
    fn rust_composites() {
        let m = RustTypeMapper;
        let list = TargetType::array_of(TargetType::named("User"));
        assert_eq!(m.render(&list, false), "Vec<User>");
        assert_eq!(
            m.render(&TargetType::Map, false),
            "HashMap<String, serde_json::Value>"
        );
        let internal = TargetType::Named {
            name: "Problem".into(),
            module: Some("server".into()),
        };
        assert_eq!(m.render(&internal, true), "Option<server::Problem>");
    }

    #[test]
    fn postgres_columns() {
        let m = PostgresTypeMapper;
        assert_eq!(
            m.render(&prim(PrimitiveKind::String, Some("uuid")), false),
            "UUID NOT NULL"
        );
        assert_eq!(
            m.render(&prim(PrimitiveKind::String, Some("date-time")), true),
            "TIMESTAMPTZ"
        );
        assert_eq!(
            m.render(&TargetType::array_of(prim(PrimitiveKind::String, None)), true),
            "TEXT[]"
        );
        assert_eq!(m.render(&TargetType::named("Address"), true), "JSONB");
    }

    #[test]
    fn mapper_lookup() {
        assert_eq!(mapper_for("rust").map(|m| m.name()), Some("rust"));
        assert_eq!(mapper_for("postgres").map(|m| m.name()), Some("postgres"));
        assert!(mapper_for("cobol").is_none());
    }
}
