//! Condition chain evaluation.
//!
//! WHERE and HAVING are left-associative chains: the first condition seeds
//! the running result and every later condition combines into it through
//! its own conjunction, strictly in declaration order. There is no operator
//! precedence and no short-circuiting — every condition is evaluated.

use once_cell::sync::Lazy;
use quarry_core::literal::{split_bounds, split_list};
use quarry_core::{Conjunction, Operator, Value};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Mutex;

/// Compiled LIKE patterns, keyed by their raw source.
static LIKE_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Fold a condition chain left-to-right. An empty chain passes everything.
pub fn eval_chain<T, F>(items: &[T], conjunction: fn(&T) -> Conjunction, mut eval: F) -> bool
where
    F: FnMut(&T) -> bool,
{
    let mut iter = items.iter();
    let Some(first) = iter.next() else {
        return true;
    };
    let mut running = eval(first);
    for item in iter {
        let outcome = eval(item);
        running = match conjunction(item) {
            Conjunction::And => running && outcome,
            Conjunction::Or => running || outcome,
        };
    }
    running
}

/// Evaluate one comparison. `lhs` is the row (or aggregate) value; `literal`
/// is the raw right-hand text from the IR. Malformed numeric operands make
/// the comparison `false` rather than failing the whole evaluation.
pub fn compare(lhs: Option<&Value>, operator: Operator, literal: &str) -> bool {
    let literal = literal.trim();
    match operator {
        Operator::IsNull => is_nullish(lhs),
        Operator::IsNotNull => !is_nullish(lhs),
        Operator::Eq => present(lhs).is_some_and(|v| eq_ci(&v.render(), literal)),
        Operator::NotEq => !present(lhs).is_some_and(|v| eq_ci(&v.render(), literal)),
        Operator::Gt => numeric(lhs, literal).is_some_and(|(l, r)| l > r),
        Operator::Lt => numeric(lhs, literal).is_some_and(|(l, r)| l < r),
        Operator::Gte => numeric(lhs, literal).is_some_and(|(l, r)| l >= r),
        Operator::Lte => numeric(lhs, literal).is_some_and(|(l, r)| l <= r),
        Operator::Like => present(lhs).is_some_and(|v| like_matches(&v.render(), literal)),
        Operator::In => present(lhs).is_some_and(|v| in_list(&v.render(), literal)),
        Operator::NotIn => !present(lhs).is_some_and(|v| in_list(&v.render(), literal)),
        Operator::Between => numeric_between(lhs, literal),
    }
}

fn is_nullish(lhs: Option<&Value>) -> bool {
    lhs.map_or(true, Value::is_null)
}

fn present(lhs: Option<&Value>) -> Option<&Value> {
    lhs.filter(|v| !v.is_null())
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn numeric(lhs: Option<&Value>, literal: &str) -> Option<(f64, f64)> {
    let left = present(lhs)?.as_f64()?;
    let right = literal.parse::<f64>().ok()?;
    Some((left, right))
}

fn numeric_between(lhs: Option<&Value>, literal: &str) -> bool {
    let Some(left) = present(lhs).and_then(Value::as_f64) else {
        return false;
    };
    let Some((low, high)) = split_bounds(literal) else {
        return false;
    };
    match (low.parse::<f64>(), high.parse::<f64>()) {
        (Ok(low), Ok(high)) => left >= low && left <= high,
        _ => false,
    }
}

/// SQL wildcards to a cached, case-insensitive, fully anchored regex:
/// `%` matches any run, `_` any single character.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let mut cache = LIKE_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let regex = cache
        .entry(pattern.to_string())
        .or_insert_with(|| compile_like(pattern));
    regex.is_match(text)
}

fn compile_like(pattern: &str) -> Regex {
    let mut source = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .expect("escaped LIKE pattern compiles")
}

fn in_list(needle: &str, literal: &str) -> bool {
    split_list(literal).iter().any(|item| eq_ci(item, needle))
}
