//! Condition-literal parsing shared by the evaluator and the generators.
//!
//! Condition values arrive as raw text from the UI: a bare scalar, a
//! comma-separated list for `IN`, or `low AND high` for `BETWEEN`.

/// True when the whole literal parses as a number, which generators emit
/// unquoted.
pub fn is_numeric(literal: &str) -> bool {
    let trimmed = literal.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

/// Split a comma-separated `IN`/`NOT IN` literal, trimming and stripping
/// one layer of surrounding quotes per item.
pub fn split_list(literal: &str) -> Vec<String> {
    literal
        .split(',')
        .map(|part| strip_quotes(part.trim()).to_string())
        .collect()
}

/// Split a `BETWEEN` literal on its AND token (case-insensitive). Returns
/// `None` when the literal has no usable bounds.
pub fn split_bounds(literal: &str) -> Option<(String, String)> {
    let bytes = literal.as_bytes();
    let mut i = 0;
    while i + 5 <= bytes.len() {
        if bytes[i] == b' '
            && bytes[i + 1].eq_ignore_ascii_case(&b'a')
            && bytes[i + 2].eq_ignore_ascii_case(&b'n')
            && bytes[i + 3].eq_ignore_ascii_case(&b'd')
            && bytes[i + 4] == b' '
        {
            let low = literal[..i].trim();
            let high = literal[i + 5..].trim();
            if !low.is_empty() && !high.is_empty() {
                return Some((low.to_string(), high.to_string()));
            }
        }
        i += 1;
    }
    None
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
