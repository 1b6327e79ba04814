//! Header and label normalization.
//!
//! Raw header names become safe, unique, lowercase identifiers:
//! trim → replace non `[A-Za-z0-9_]` → fall back on empty/digit-leading →
//! lowercase → length cap → reserved-keyword suffix. Duplicates are then
//! disambiguated with `_1`, `_2`, … in encounter order.

use std::collections::HashMap;

/// Query keywords a column name must not collide with.
const RESERVED: &[&str] = &[
    "select", "insert", "update", "delete", "from", "into", "values", "set", "where", "join",
    "inner", "left", "right", "full", "on", "group", "by", "having", "order", "limit", "offset",
    "distinct", "and", "or", "not", "null", "in", "like", "between", "as", "is", "count", "sum",
    "avg", "min", "max", "table", "asc", "desc",
];

/// Normalize one raw header into a safe column name. `index` is the
/// 0-based column position, used for the `column_<n>` fallback.
pub fn normalize_header(raw: &str, index: usize, max_len: usize) -> String {
    let trimmed = raw.trim();
    let mut name: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name = format!("column_{}", index + 1);
    }

    name = name.to_lowercase();
    name.truncate(max_len);

    if RESERVED.contains(&name.as_str()) {
        name.push_str("_col");
    }
    name
}

/// Disambiguate duplicate normalized names by appending `_1`, `_2`, … in
/// encounter order. The first occurrence keeps the bare name.
pub fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let seen = counts.entry(name.clone()).or_insert(0);
            let out = if *seen == 0 {
                name.clone()
            } else {
                format!("{name}_{seen}")
            };
            *seen += 1;
            out
        })
        .collect()
}

/// Sanitize a human-chosen table label with the same character rules as a
/// header. An unusable label falls back to `table`; namespacing the result
/// is the row store's concern.
pub fn sanitize_label(raw: &str, max_len: usize) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let unusable = name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || name.chars().all(|c| c == '_');
    if unusable {
        return "table".to_string();
    }

    name = name.to_lowercase();
    name.truncate(max_len);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("name", "name" ; "plain")]
    #[test_case("  Name  ", "name" ; "trimmed and lowercased")]
    #[test_case("First Name", "first_name" ; "space replaced")]
    #[test_case("price ($)", "price____" ; "punctuation replaced")]
    #[test_case("", "column_3" ; "empty falls back")]
    #[test_case("2024", "column_3" ; "digit leading falls back")]
    #[test_case("select", "select_col" ; "keyword suffixed")]
    #[test_case("COUNT", "count_col" ; "keyword check after lowering")]
    fn test_normalize(raw: &str, expected: &str) {
        assert_eq!(normalize_header(raw, 2, 64), expected);
    }

    #[test]
    fn test_length_cap() {
        let long = "x".repeat(80);
        assert_eq!(normalize_header(&long, 0, 64).len(), 64);
    }

    #[test]
    fn test_dedupe_in_encounter_order() {
        let names = vec![
            "id".to_string(),
            "name".to_string(),
            "id".to_string(),
            "id".to_string(),
        ];
        assert_eq!(dedupe(names), vec!["id", "name", "id_1", "id_2"]);
    }

    #[test]
    fn test_label_fallback() {
        assert_eq!(sanitize_label("My Upload.csv", 64), "my_upload_csv");
        assert_eq!(sanitize_label("!!!", 64), "table");
        assert_eq!(sanitize_label("", 64), "table");
    }
}
