//! Documentation comment tags
//!
//! Extracts `@tag value` lines from `/** ... */` comments. Each occurrence
//! of a tag yields one value: the rest of its line, trimmed, with a trailing
//! `*/` removed.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t/*]*@([A-Za-z][A-Za-z0-9_-]*)(?:[ \t]+([^\r\n]*))?").expect("tag regex")
});

/// Tag name → values, in order of first occurrence.
pub type Tags = IndexMap<String, Vec<String>>;

pub fn tags(comment: &str) -> Tags {
    let mut tags = Tags::new();
    for captures in TAG.captures_iter(comment) {
        let name = captures[1].to_string();
        let value = captures
            .get(2)
            .map(|m| clean_value(m.as_str()))
            .unwrap_or_default();
        tags.entry(name).or_default().push(value);
    }
    tags
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_end_matches("*/").trim_end().to_string()
}

/// Comment body without the `/**`, `*/` and leading `*` markers.
pub fn text(comment: &str) -> String {
    let body = comment.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

/// Split a tag value into a type and the rest. Whitespace inside `<>`,
/// `()`, `{}` and `[]` belongs to the type, as does whitespace around `|`,
/// `&`, `,` and `:`.
pub fn split_type(value: &str) -> (&str, &str) {
    let value = value.trim_start();
    let bytes = value.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'{' | b'[' => depth += 1,
            b'>' | b')' | b'}' | b']' => depth -= 1,
            b' ' | b'\t' if depth <= 0 => {
                let next = value[i..].trim_start();
                let prev = value[..i].trim_end();
                let joins = next.starts_with(['|', '&', ':'])
                    || prev.ends_with(['|', '&', ',', ':']);
                if !joins {
                    return (&value[..i], value[i..].trim_start());
                }
            }
            _ => {}
        }
        i += 1;
    }
    (value, "")
}

fn first_type<'a>(tags: &'a Tags, tag: &str) -> Option<&'a str> {
    tags.get(tag)?
        .iter()
        .map(|value| split_type(value).0)
        .find(|ty| !ty.is_empty())
}

/// Type of the first `@var` tag.
pub fn var_type(comment: &str) -> Option<String> {
    first_type(&tags(comment), "var").map(str::to_string)
}

/// Type of the first `@return` tag.
pub fn return_type(comment: &str) -> Option<String> {
    first_type(&tags(comment), "return").map(str::to_string)
}

/// `@param T $name` tags: parameter name (without `$`) → type.
pub fn param_types(comment: &str) -> IndexMap<String, String> {
    let mut params = IndexMap::new();
    for value in tags(comment).get("param").into_iter().flatten() {
        let (ty, rest) = split_type(value);
        let name = rest.split_whitespace().next().unwrap_or("");
        let name = name.trim_start_matches("...").trim_start_matches('&');
        if let Some(name) = name.strip_prefix('$') {
            params.entry(name.to_string()).or_insert_with(|| ty.to_string());
        }
    }
    params
}

/// `@property`, `@property-read` or `@property-write` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTag {
    pub name: String,
    pub ty: Option<String>,
    pub readable: bool,
    pub writable: bool,
}

/// Property tags in order; repeated names merge their access.
pub fn property_tags(comment: &str) -> Vec<PropertyTag> {
    let mut found: IndexMap<String, PropertyTag> = IndexMap::new();
    for (tag, values) in tags(comment) {
        let (readable, writable) = match tag.as_str() {
            "property" => (true, true),
            "property-read" => (true, false),
            "property-write" => (false, true),
            _ => continue,
        };
        for value in values {
            let (ty, rest) = split_type(&value);
            let (ty, name) = match ty.strip_prefix('$') {
                Some(name) => (None, name),
                None => (Some(ty), rest.split_whitespace().next().and_then(|n| n.strip_prefix('$')).unwrap_or("")),
            };
            if name.is_empty() {
                continue;
            }
            let entry = found.entry(name.to_string()).or_insert_with(|| PropertyTag {
                name: name.to_string(),
                ty: None,
                readable: false,
                writable: false,
            });
            entry.readable |= readable;
            entry.writable |= writable;
            if entry.ty.is_none() {
                entry.ty = ty.filter(|t| !t.is_empty()).map(str::to_string);
            }
        }
    }
    found.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENT: &str = r#"/**
     * Finds users.
     *
     * Second paragraph.
     *
     * @param  array<string, int> $limits Limits per role
     * @param  string $name
     * @return ?User[] the users
     * @throws NotFound
     * @throws Timeout */"#;

    #[test]
    fn test_tags() {
        let tags = tags(COMMENT);
        let names: Vec<_> = tags.keys().map(String::as_str).collect();
        assert_eq!(names, ["param", "return", "throws"]);
        assert_eq!(tags["throws"], ["NotFound", "Timeout"]);
        assert_eq!(tags["return"], ["?User[] the users"]);
    }

    #[test]
    fn test_text() {
        assert_eq!(
            text(COMMENT).lines().take(3).collect::<Vec<_>>(),
            ["Finds users.", "", "Second paragraph."]
        );
        assert_eq!(text("/** Single line */"), "Single line");
        assert_eq!(text("/***/"), "");
    }

    #[test]
    fn test_split_type() {
        assert_eq!(split_type("array<string, int> $limits"), ("array<string, int>", "$limits"));
        assert_eq!(split_type("int | string $x"), ("int | string", "$x"));
        assert_eq!(split_type("callable(int): string $f"), ("callable(int): string", "$f"));
        assert_eq!(split_type("int"), ("int", ""));
    }

    #[test]
    fn test_typed_tags() {
        assert_eq!(return_type(COMMENT).as_deref(), Some("?User[]"));
        assert_eq!(var_type("/** @var int */").as_deref(), Some("int"));
        assert_eq!(var_type("/** no tags */"), None);

        let params = param_types(COMMENT);
        assert_eq!(params.get("limits").map(String::as_str), Some("array<string, int>"));
        assert_eq!(params.get("name").map(String::as_str), Some("string"));
    }

    #[test]
    fn test_ignores_inline_at_signs() {
        let tags = tags("/**\n * Mail admin@example.com for access\n * @deprecated\n */");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["deprecated"], [""]);
    }

    #[test]
    fn test_property_tags_merge_access() {
        let properties = property_tags(
            "/**\n * @property-read int $id\n * @property string $name\n * @property-write $id\n */",
        );
        assert_eq!(properties.len(), 2);
        assert_eq!(
            properties[0],
            PropertyTag {
                name: "id".to_string(),
                ty: Some("int".to_string()),
                readable: true,
                writable: true,
            }
        );
        assert_eq!(properties[1].name, "name");
    }
}
