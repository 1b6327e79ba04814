//! The canonical query-text generator.
//!
//! Pure function from IR to SQL text: clause order is fixed, empty clauses
//! are omitted, and identical IR values produce byte-identical output —
//! history and sharing features key off exact text equality.

use quarry_core::literal::{is_numeric, split_bounds};
use quarry_core::{Aggregate, Condition, HavingCondition, Operator, QueryState, QueryType};

/// Render a query description as canonical SQL, terminated by `;`.
pub fn render_sql(ir: &QueryState) -> String {
    let lines = match ir.query_type {
        QueryType::Select => select_lines(ir),
        QueryType::Insert => insert_lines(ir),
        QueryType::Update => update_lines(ir),
        QueryType::Delete => delete_lines(ir),
    };
    format!("{};", lines.join("\n"))
}

fn select_lines(ir: &QueryState) -> Vec<String> {
    let mut lines = Vec::new();

    // Aggregates come first in the projection, then plain columns.
    let mut projection: Vec<String> = ir.aggregates.iter().map(render_aggregate).collect();
    projection.extend(ir.columns.iter().cloned());
    if projection.is_empty() {
        projection.push("*".to_string());
    }
    let distinct = if ir.distinct { "DISTINCT " } else { "" };
    lines.push(format!("SELECT {distinct}{}", projection.join(", ")));
    lines.push(format!("FROM {}", ir.table));

    for join in &ir.joins {
        lines.push(format!(
            "{} {} ON {} = {}",
            join.join_type.as_sql(),
            join.table,
            join.on_left,
            join.on_right
        ));
    }

    push_chain(
        &mut lines,
        "WHERE",
        ir.where_conditions
            .iter()
            .map(|c| (c.conjunction, render_condition(c))),
    );

    if !ir.group_by.is_empty() {
        lines.push(format!("GROUP BY {}", ir.group_by.join(", ")));
    }

    push_chain(
        &mut lines,
        "HAVING",
        ir.having.iter().map(|h| (h.conjunction, render_having(h))),
    );

    if !ir.order_by.is_empty() {
        let keys: Vec<String> = ir
            .order_by
            .iter()
            .map(|k| format!("{} {}", k.column, k.direction.as_sql()))
            .collect();
        lines.push(format!("ORDER BY {}", keys.join(", ")));
    }

    if let Some(limit) = ir.limit {
        lines.push(format!("LIMIT {limit}"));
    }
    if let Some(offset) = ir.offset {
        lines.push(format!("OFFSET {offset}"));
    }
    lines
}

fn insert_lines(ir: &QueryState) -> Vec<String> {
    if ir.insert_values.is_empty() {
        return vec![format!("INSERT INTO {} DEFAULT VALUES", ir.table)];
    }
    let columns: Vec<&str> = ir.insert_values.iter().map(|(c, _)| c.as_str()).collect();
    let values: Vec<String> = ir
        .insert_values
        .iter()
        .map(|(_, v)| sql_literal(v))
        .collect();
    vec![
        format!("INSERT INTO {} ({})", ir.table, columns.join(", ")),
        format!("VALUES ({})", values.join(", ")),
    ]
}

fn update_lines(ir: &QueryState) -> Vec<String> {
    let mut lines = vec![format!("UPDATE {}", ir.table)];
    if !ir.insert_values.is_empty() {
        let assignments: Vec<String> = ir
            .insert_values
            .iter()
            .map(|(c, v)| format!("{c} = {}", sql_literal(v)))
            .collect();
        lines.push(format!("SET {}", assignments.join(", ")));
    }
    push_chain(
        &mut lines,
        "WHERE",
        ir.where_conditions
            .iter()
            .map(|c| (c.conjunction, render_condition(c))),
    );
    lines
}

fn delete_lines(ir: &QueryState) -> Vec<String> {
    let mut lines = vec![format!("DELETE FROM {}", ir.table)];
    push_chain(
        &mut lines,
        "WHERE",
        ir.where_conditions
            .iter()
            .map(|c| (c.conjunction, render_condition(c))),
    );
    lines
}

/// First condition sits on the keyword line; the rest are indented under
/// it, each prefixed by its own conjunction.
fn push_chain(
    lines: &mut Vec<String>,
    keyword: &str,
    chain: impl Iterator<Item = (quarry_core::Conjunction, String)>,
) {
    for (i, (conjunction, text)) in chain.enumerate() {
        if i == 0 {
            lines.push(format!("{keyword} {text}"));
        } else {
            lines.push(format!("  {} {text}", conjunction.as_sql()));
        }
    }
}

fn render_aggregate(aggregate: &Aggregate) -> String {
    let call = format!("{}({})", aggregate.function, aggregate.column);
    match &aggregate.alias {
        Some(alias) => format!("{call} AS {alias}"),
        None => call,
    }
}

fn render_condition(c: &Condition) -> String {
    render_comparison(&c.column, c.operator, &c.value)
}

fn render_having(h: &HavingCondition) -> String {
    let operand = format!("{}({})", h.function, h.column);
    render_comparison(&operand, h.operator, &h.value)
}

/// One rendered comparison, also embedded raw by the fluent dialects.
pub(crate) fn render_comparison(operand: &str, operator: Operator, value: &str) -> String {
    match operator {
        Operator::IsNull | Operator::IsNotNull => {
            format!("{operand} {}", operator.as_sql())
        }
        Operator::In | Operator::NotIn => {
            format!("{operand} {} ({})", operator.as_sql(), value.trim())
        }
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => format!(
                "{operand} BETWEEN {} AND {}",
                sql_literal(&low),
                sql_literal(&high)
            ),
            None => format!("{operand} BETWEEN {}", value.trim()),
        },
        _ => format!("{operand} {} {}", operator.as_sql(), sql_literal(value)),
    }
}

/// Fully numeric values stay unquoted; everything else is single-quoted
/// with embedded quotes doubled.
fn sql_literal(value: &str) -> String {
    let trimmed = value.trim();
    if is_numeric(trimmed) {
        trimmed.to_string()
    } else {
        format!("'{}'", trimmed.replace('\'', "''"))
    }
}
