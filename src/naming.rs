//! Naming conventions: case conversion and pluralization.
//!
//! Field names are PascalCase with common initialisms upper-cased (`userId`
//! becomes `UserID`); serialized names are camelCase.

use heck::ToSnakeCase;

const INITIALISMS: &[&str] = &[
    "api", "css", "dns", "html", "http", "https", "id", "ip", "json", "jwt", "sql", "ssh", "tls",
    "ttl", "ui", "uri", "url", "uuid", "xml",
];

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("mouse", "mice"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &["health", "config", "metadata", "information", "equipment"];

fn words(s: &str) -> Vec<String> {
    s.to_snake_case()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    if INITIALISMS.contains(&word) {
        return word.to_ascii_uppercase();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `created_at` / `createdAt` / `created-at` → `CreatedAt`; `id` → `ID`.
pub fn pascal_case(s: &str) -> String {
    words(s).iter().map(|w| capitalize(w)).collect()
}

/// `CreatedAt` → `createdAt`; `ID` → `id`; `UserID` → `userID`.
pub fn camel_case(s: &str) -> String {
    let words = words(s);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// English plural of a type name, keeping the leading capital.
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let lower = s.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return s.to_string();
    }
    if lower == "apikey" {
        return "APIKeys".to_string();
    }
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular {
            return match_case(s, plural);
        }
        // Compound names end in the irregular word: SalesPerson → SalesPeople.
        if lower.len() > singular.len() && lower.ends_with(singular) {
            let stem = &s[..s.len() - singular.len()];
            let tail = &s[s.len() - singular.len()..];
            if tail.starts_with(char::is_uppercase) {
                return format!("{}{}", stem, match_case(tail, plural));
            }
        }
    }

    let bytes = lower.as_bytes();
    let last = bytes[bytes.len() - 1];
    let before_last = if bytes.len() > 1 {
        Some(bytes[bytes.len() - 2])
    } else {
        None
    };
    let is_vowel = |c: u8| matches!(c, b'a' | b'e' | b'i' | b'o' | b'u');

    if last == b'y' && before_last.map(|c| !is_vowel(c)).unwrap_or(false) {
        return format!("{}ies", &s[..s.len() - 1]);
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", s);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &s[..s.len() - 2]);
    }
    if last == b'f' {
        return format!("{}ves", &s[..s.len() - 1]);
    }
    format!("{}s", s)
}

fn match_case(original: &str, replacement: &str) -> String {
    match original.chars().next() {
        Some(c) if c.is_uppercase() => capitalize_plain(replacement),
        _ => replacement.to_string(),
    }
}

fn capitalize_plain(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
