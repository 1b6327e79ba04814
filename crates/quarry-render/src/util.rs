//! Formatting helpers shared by the generators.

use quarry_core::literal::{is_numeric, split_list};

/// A JavaScript string literal, escaped through the JSON rules.
pub(crate) fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// A condition literal as a JavaScript value: fully numeric text stays
/// unquoted, everything else becomes a string literal.
pub(crate) fn js_value(literal: &str) -> String {
    let trimmed = literal.trim();
    if is_numeric(trimmed) {
        trimmed.to_string()
    } else {
        js_str(trimmed)
    }
}

/// An IN/NOT IN literal as a JavaScript array.
pub(crate) fn js_list(literal: &str) -> String {
    let items: Vec<String> = split_list(literal).iter().map(|s| js_value(s)).collect();
    format!("[{}]", items.join(", "))
}

/// An object key: bare when it is a valid identifier, quoted otherwise.
pub(crate) fn js_key(name: &str) -> String {
    let mut chars = name.chars();
    let ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if ident {
        name.to_string()
    } else {
        js_str(name)
    }
}

/// PascalCase model class name for a table: `order_items` becomes
/// `OrderItems`.
pub(crate) fn model_name(table: &str) -> String {
    table
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Strip a `table.` qualification off a column reference.
pub(crate) fn bare_column(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_value_quoting() {
        assert_eq!(js_value("25"), "25");
        assert_eq!(js_value("2.5"), "2.5");
        assert_eq!(js_value("active"), "\"active\"");
        assert_eq!(js_value("it \"works\""), "\"it \\\"works\\\"\"");
    }

    #[test]
    fn test_js_list() {
        assert_eq!(js_list("'active', pending, 3"), "[\"active\", \"pending\", 3]");
    }

    #[test]
    fn test_js_key() {
        assert_eq!(js_key("status"), "status");
        assert_eq!(js_key("_count"), "_count");
        assert_eq!(js_key("COUNT(*)"), "\"COUNT(*)\"");
    }

    #[test]
    fn test_model_name() {
        assert_eq!(model_name("users"), "Users");
        assert_eq!(model_name("order_items"), "OrderItems");
    }

    #[test]
    fn test_bare_column() {
        assert_eq!(bare_column("users.id"), "id");
        assert_eq!(bare_column("id"), "id");
    }
}
