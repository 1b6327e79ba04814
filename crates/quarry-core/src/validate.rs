//! Advisory semantic lints over a [`QueryState`].
//!
//! Warnings never block anything here: callers decide whether to refuse
//! execution. The evaluator deliberately tolerates every condition these
//! lints flag, so previews keep rendering while the UI explains the problem.

use crate::ir::QueryState;
use crate::schema::Schema;
use serde::Serialize;
use std::fmt;

/// An advisory finding about a query description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SemanticWarning {
    /// HAVING present without GROUP BY.
    HavingWithoutGroupBy,
    /// A plain column is projected alongside aggregates but is not grouped.
    UngroupedColumn { column: String },
    /// ORDER BY references a column outside GROUP BY keys and aggregate
    /// result names while the query aggregates.
    OrderByOutsideGrouping { column: String },
    /// A referenced column does not exist in the resolved schema.
    UnknownColumn { column: String },
}

impl fmt::Display for SemanticWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticWarning::HavingWithoutGroupBy => {
                write!(f, "HAVING has no effect without GROUP BY")
            }
            SemanticWarning::UngroupedColumn { column } => {
                write!(f, "column '{column}' is selected but not grouped")
            }
            SemanticWarning::OrderByOutsideGrouping { column } => {
                write!(
                    f,
                    "ORDER BY '{column}' references neither a group key nor an aggregate"
                )
            }
            SemanticWarning::UnknownColumn { column } => {
                write!(f, "column '{column}' does not exist in the table")
            }
        }
    }
}

/// Lint a query description, optionally against the schema its table
/// resolves to. Returns findings in a stable order.
pub fn validate(ir: &QueryState, schema: Option<&Schema>) -> Vec<SemanticWarning> {
    let mut warnings = Vec::new();

    if !ir.having.is_empty() && ir.group_by.is_empty() {
        warnings.push(SemanticWarning::HavingWithoutGroupBy);
    }

    if !ir.aggregates.is_empty() {
        for column in &ir.columns {
            if !ir.group_by.iter().any(|g| g == column) {
                warnings.push(SemanticWarning::UngroupedColumn {
                    column: column.clone(),
                });
            }
        }
    }

    if ir.is_aggregating() {
        for key in &ir.order_by {
            let grouped = ir.group_by.iter().any(|g| g == &key.column);
            let aggregated = ir
                .aggregates
                .iter()
                .any(|a| a.result_name() == key.column || a.column == key.column);
            if !grouped && !aggregated {
                warnings.push(SemanticWarning::OrderByOutsideGrouping {
                    column: key.column.clone(),
                });
            }
        }
    }

    if let Some(schema) = schema {
        for column in referenced_columns(ir) {
            if column != "*" && !schema.contains(&column) {
                warnings.push(SemanticWarning::UnknownColumn { column });
            }
        }
    }

    warnings
}

/// Every column name the IR mentions against its own table, in declaration
/// order, deduplicated. Join-side references are skipped: they resolve
/// against other schemas.
fn referenced_columns(ir: &QueryState) -> Vec<String> {
    let mut seen = Vec::new();
    let mut push = |name: &str| {
        // Qualified references to joined tables are not ours to check.
        if let Some((table, _)) = name.split_once('.') {
            if table != ir.table {
                return;
            }
        }
        let bare = name.rsplit('.').next().unwrap_or(name).to_string();
        if !seen.contains(&bare) {
            seen.push(bare);
        }
    };

    // Joins suspend per-schema checking for projected columns entirely:
    // they may come from either side.
    if ir.joins.is_empty() {
        for c in &ir.columns {
            push(c);
        }
        for c in &ir.where_conditions {
            push(&c.column);
        }
        for g in &ir.group_by {
            push(g);
        }
        for k in &ir.order_by {
            push(&k.column);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Aggregate, AggregateFunction, HavingCondition, Operator, OrderKey};
    use crate::schema::{ColumnDef, ColumnType};

    fn users_schema() -> Schema {
        Schema::new(
            "users",
            vec![
                ColumnDef::new("id", ColumnType::Integer, false),
                ColumnDef::new("status", ColumnType::Varchar, false),
            ],
        )
    }

    #[test]
    fn test_clean_query_has_no_warnings() {
        let ir = QueryState::select("users").with_columns(["id", "status"]);
        assert!(validate(&ir, Some(&users_schema())).is_empty());
    }

    #[test]
    fn test_having_without_group_by() {
        let ir = QueryState::select("users").with_having(HavingCondition::new(
            AggregateFunction::Count,
            "*",
            Operator::Gt,
            "1",
        ));
        assert_eq!(
            validate(&ir, None),
            vec![SemanticWarning::HavingWithoutGroupBy]
        );
    }

    #[test]
    fn test_ungrouped_column_next_to_aggregate() {
        let ir = QueryState::select("users")
            .with_columns(["status", "id"])
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*"))
            .with_group_by(["status"]);
        assert_eq!(
            validate(&ir, None),
            vec![SemanticWarning::UngroupedColumn {
                column: "id".into()
            }]
        );
    }

    #[test]
    fn test_order_by_aggregate_alias_is_fine() {
        let ir = QueryState::select("users")
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*").with_alias("n"))
            .with_group_by(["status"])
            .with_order(OrderKey::desc("n"));
        assert!(validate(&ir, None).is_empty());

        let stray = QueryState::select("users")
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*"))
            .with_group_by(["status"])
            .with_order(OrderKey::asc("id"));
        assert_eq!(
            validate(&stray, None),
            vec![SemanticWarning::OrderByOutsideGrouping {
                column: "id".into()
            }]
        );
    }

    #[test]
    fn test_unknown_column_against_schema() {
        let ir = QueryState::select("users")
            .with_columns(["id"])
            .with_condition("tier", Operator::Eq, "gold");
        assert_eq!(
            validate(&ir, Some(&users_schema())),
            vec![SemanticWarning::UnknownColumn {
                column: "tier".into()
            }]
        );
    }
}
