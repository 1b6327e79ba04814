//! The staged SELECT interpreter.

use crate::aggregate;
use crate::operators::{compare, eval_chain};
use quarry_core::{
    lookup, Direction, Join, JoinType, QueryState, QueryType, Row, RowStore, Value,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Rows surviving each pipeline stage, for execution-flow diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub total: usize,
    pub after_join: usize,
    pub after_where: usize,
    pub after_group_by: usize,
    #[serde(rename = "final")]
    pub final_count: usize,
}

/// The outcome of evaluating one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    pub rows: Vec<Row>,
    pub counts: StageCounts,
}

/// Interprets SELECT queries against a row store.
pub struct Evaluator<'a> {
    store: &'a RowStore,
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a RowStore) -> Self {
        Self { store }
    }

    /// Run the fixed stage pipeline. Never fails: an unresolvable table or
    /// a non-SELECT query yields an empty result.
    pub fn evaluate(&self, ir: &QueryState) -> Evaluation {
        if ir.query_type != QueryType::Select {
            debug!(query_type = ?ir.query_type, "only SELECT evaluates; returning empty preview");
            return Evaluation::default();
        }

        // Stage 1: resolve.
        let source = match self.store.resolve(&ir.table) {
            Ok(table) => table,
            Err(err) => {
                warn!(%err, "returning empty preview");
                return Evaluation::default();
            }
        };
        let mut rows: Vec<Row> = source.rows.clone();
        let mut counts = StageCounts {
            total: rows.len(),
            ..StageCounts::default()
        };

        // Stage 2: joins, in declaration order.
        if !ir.joins.is_empty() {
            rows = rows.iter().map(|r| qualify(r, &ir.table)).collect();
            for join in &ir.joins {
                rows = self.apply_join(rows, join);
            }
        }
        counts.after_join = rows.len();

        // Stage 3: WHERE chain.
        rows.retain(|row| {
            eval_chain(&ir.where_conditions, |c| c.conjunction, |c| {
                compare(lookup(row, &c.column), c.operator, &c.value)
            })
        });
        counts.after_where = rows.len();

        // Stages 4-7: group, aggregate, having, project.
        let mut projected: Vec<Row> = if ir.is_aggregating() {
            let buckets = group_rows(&rows, &ir.group_by);
            counts.after_group_by = buckets.len();
            buckets
                .iter()
                .filter(|bucket| {
                    eval_chain(&ir.having, |h| h.conjunction, |h| {
                        let aggregated = aggregate::compute(h.function, &h.column, &bucket.rows);
                        compare(Some(&aggregated), h.operator, &h.value)
                    })
                })
                .map(|bucket| project_bucket(bucket, ir))
                .collect()
        } else {
            counts.after_group_by = rows.len();
            rows.iter().map(|row| project_row(row, ir)).collect()
        };

        if ir.distinct {
            let mut seen = HashSet::new();
            projected.retain(|row: &Row| {
                seen.insert(serde_json::to_string(row).unwrap_or_default())
            });
        }

        // Stage 8: stable multi-key sort.
        projected.sort_by(|a, b| compare_rows(a, b, ir));

        // Stage 9: paginate.
        let offset = ir.offset.unwrap_or(0) as usize;
        let rows: Vec<Row> = match ir.limit {
            Some(limit) => projected
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect(),
            None => projected.into_iter().skip(offset).collect(),
        };
        counts.final_count = rows.len();

        debug!(?counts, "evaluated query");
        Evaluation { rows, counts }
    }

    fn apply_join(&self, left: Vec<Row>, join: &Join) -> Vec<Row> {
        let (right, right_columns): (Vec<Row>, Vec<String>) = match self.store.resolve(&join.table)
        {
            Ok(table) => (
                table
                    .rows
                    .iter()
                    .map(|r| qualify(r, &join.table))
                    .collect(),
                table
                    .schema
                    .columns()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect(),
            ),
            Err(err) => {
                warn!(%err, "joining against an empty row set");
                (Vec::new(), Vec::new())
            }
        };

        let left_keys: Vec<String> = left
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let mut matched_right = vec![false; right.len()];
        let mut out = Vec::new();

        for left_row in &left {
            let left_value = lookup(left_row, &join.on_left).filter(|v| !v.is_null());
            let mut matched = false;
            for (i, right_row) in right.iter().enumerate() {
                let right_value = lookup(right_row, &join.on_right).filter(|v| !v.is_null());
                let hit = match (left_value, right_value) {
                    (Some(a), Some(b)) => join_eq(a, b),
                    _ => false,
                };
                if hit {
                    matched = true;
                    matched_right[i] = true;
                    out.push(merge(left_row, right_row));
                }
            }
            if !matched && matches!(join.join_type, JoinType::Left | JoinType::Full) {
                out.push(null_extend(left_row, &join.table, &right_columns));
            }
        }

        if matches!(join.join_type, JoinType::Right | JoinType::Full) {
            for (i, right_row) in right.iter().enumerate() {
                if !matched_right[i] {
                    let mut row = right_row.clone();
                    for key in &left_keys {
                        row.entry(key.clone()).or_insert(Value::Null);
                    }
                    out.push(row);
                }
            }
        }
        out
    }
}

/// Add `table.column` keys next to every bare key so joined rows are
/// addressable both ways.
fn qualify(row: &Row, table: &str) -> Row {
    let mut out = row.clone();
    for (key, value) in row {
        if !key.contains('.') {
            out.insert(format!("{table}.{key}"), value.clone());
        }
    }
    out
}

/// Merge a matching pair. Qualified keys always transfer; bare keys from
/// the right side never clobber an existing left column.
fn merge(left: &Row, right: &Row) -> Row {
    let mut out = left.clone();
    for (key, value) in right {
        if key.contains('.') {
            out.insert(key.clone(), value.clone());
        } else {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    out
}

/// Extend an unmatched outer row with the other side's columns as nulls.
fn null_extend(row: &Row, table: &str, columns: &[String]) -> Row {
    let mut out = row.clone();
    for column in columns {
        out.insert(format!("{table}.{column}"), Value::Null);
        out.entry(column.clone()).or_insert(Value::Null);
    }
    out
}

/// Join-key equality: the same loose, case-insensitive comparison `=` uses.
fn join_eq(a: &Value, b: &Value) -> bool {
    a.render().to_lowercase() == b.render().to_lowercase()
}

struct Bucket {
    key: Vec<Value>,
    rows: Vec<Row>,
}

/// Partition rows by the tuple of group-key values, preserving first-seen
/// bucket order. Without GROUP BY, everything lands in one bucket.
fn group_rows(rows: &[Row], group_by: &[String]) -> Vec<Bucket> {
    if group_by.is_empty() {
        return vec![Bucket {
            key: Vec::new(),
            rows: rows.to_vec(),
        }];
    }

    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    for row in rows {
        let key: Vec<Value> = group_by
            .iter()
            .map(|column| lookup(row, column).cloned().unwrap_or(Value::Null))
            .collect();
        match index.get(&key) {
            Some(&i) => buckets[i].rows.push(row.clone()),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    rows: vec![row.clone()],
                });
            }
        }
    }
    buckets
}

fn project_row(row: &Row, ir: &QueryState) -> Row {
    if ir.columns.is_empty() {
        return row.clone();
    }
    ir.columns
        .iter()
        .map(|column| {
            let value = lookup(row, column).cloned().unwrap_or(Value::Null);
            (column.clone(), value)
        })
        .collect()
}

/// A bucket projects its group-key values plus the computed aggregates. A
/// non-grouped projected column reads from the bucket's first row — the
/// leniency the semantic validator warns about.
fn project_bucket(bucket: &Bucket, ir: &QueryState) -> Row {
    let mut out = Row::new();
    let wanted = if ir.columns.is_empty() {
        &ir.group_by
    } else {
        &ir.columns
    };
    for column in wanted {
        let value = ir
            .group_by
            .iter()
            .position(|g| g == column)
            .map(|i| bucket.key[i].clone())
            .or_else(|| {
                bucket
                    .rows
                    .first()
                    .and_then(|row| lookup(row, column).cloned())
            })
            .unwrap_or(Value::Null);
        out.insert(column.clone(), value);
    }
    for agg in &ir.aggregates {
        out.insert(
            agg.result_name(),
            aggregate::compute(agg.function, &agg.column, &bucket.rows),
        );
    }
    out
}

/// Multi-key comparator: numeric when both sides coerce, else lexicographic.
/// Nulls sort last regardless of direction; ties fall through to the next
/// key, and the underlying sort is stable.
fn compare_rows(a: &Row, b: &Row, ir: &QueryState) -> Ordering {
    for key in &ir.order_by {
        let left = lookup(a, &key.column).filter(|v| !v.is_null());
        let right = lookup(b, &key.column).filter(|v| !v.is_null());
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let base = match (x.as_f64(), y.as_f64()) {
                    (Some(nx), Some(ny)) => nx.partial_cmp(&ny).unwrap_or(Ordering::Equal),
                    _ => x.render().cmp(&y.render()),
                };
                match key.direction {
                    Direction::Asc => base,
                    Direction::Desc => base.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{
        Aggregate, AggregateFunction, ColumnDef, ColumnType, HavingCondition, Operator, OrderKey,
        QueryState, Schema,
    };

    fn store() -> RowStore {
        RowStore::with_samples()
    }

    fn eval(store: &RowStore, ir: &QueryState) -> Evaluation {
        Evaluator::new(store).evaluate(ir)
    }

    fn ages(result: &Evaluation) -> Vec<i64> {
        result
            .rows
            .iter()
            .filter_map(|r| match lookup(r, "age") {
                Some(Value::Int(n)) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Three ages around the 18/35 boundaries.
    fn tiny_users() -> RowStore {
        let mut store = RowStore::empty();
        let schema = Schema::new(
            "users",
            vec![ColumnDef::new("age", ColumnType::Integer, false)],
        );
        let rows = [17, 25, 40]
            .iter()
            .map(|n| [("age".to_string(), Value::Int(*n))].into_iter().collect())
            .collect();
        store.insert(schema, rows);
        store
    }

    // =========================================================================
    // Resolve
    // =========================================================================

    #[test]
    fn test_unknown_table_yields_empty_preview() {
        let result = eval(&store(), &QueryState::select("ghosts"));
        assert!(result.rows.is_empty());
        assert_eq!(result.counts, StageCounts::default());
    }

    #[test]
    fn test_non_select_yields_empty_preview() {
        let ir = QueryState::insert("users").with_insert_value("name", "Zoe");
        assert!(eval(&store(), &ir).rows.is_empty());
    }

    #[test]
    fn test_select_star() {
        let result = eval(&store(), &QueryState::select("users"));
        assert_eq!(result.counts.total, 8);
        assert_eq!(result.counts.final_count, 8);
        assert_eq!(result.rows.len(), 8);
    }

    // =========================================================================
    // WHERE chains
    // =========================================================================

    #[test]
    fn test_single_condition() {
        let ir = QueryState::select("users").with_condition("age", Operator::Gt, "18");
        let result = eval(&tiny_users(), &ir);
        assert_eq!(ages(&result), vec![25, 40]);
    }

    #[test]
    fn test_and_chain_keeps_only_the_middle_row() {
        let ir = QueryState::select("users")
            .with_condition("age", Operator::Gt, "18")
            .with_condition("age", Operator::Lt, "35");
        let result = eval(&tiny_users(), &ir);
        assert_eq!(ages(&result), vec![25]);
        assert_eq!(result.counts.after_where, 1);
    }

    #[test]
    fn test_or_chain_keeps_both_extremes() {
        let ir = QueryState::select("users")
            .with_condition("age", Operator::Lt, "18")
            .with_condition_chain(
                quarry_core::Condition::new("age", Operator::Gt, "35").or(),
            );
        let result = eval(&tiny_users(), &ir);
        assert_eq!(ages(&result), vec![17, 40]);
    }

    #[test]
    fn test_like_against_sample_emails() {
        let ir = QueryState::select("users")
            .with_columns(["email"])
            .with_condition("email", Operator::Like, "%@gmail.com");
        let result = eval(&store(), &ir);
        // alice, dana and hiro; farah's @gmail.co must not slip in.
        assert_eq!(result.counts.final_count, 3);
    }

    #[test]
    fn test_is_null_matches_missing_emails() {
        let ir = QueryState::select("users").with_condition("email", Operator::IsNull, "");
        assert_eq!(eval(&store(), &ir).counts.final_count, 2);
    }

    // =========================================================================
    // Joins
    // =========================================================================

    fn users_orders(join_type: JoinType) -> QueryState {
        QueryState::select("users").with_join(Join::new(
            join_type,
            "orders",
            "users.id",
            "orders.user_id",
        ))
    }

    #[test]
    fn test_inner_join_excludes_unmatched_order() {
        let result = eval(&store(), &users_orders(JoinType::Inner));
        // 7 orders, one of them pointing at user 999.
        assert_eq!(result.counts.after_join, 6);
        assert!(result.rows.iter().all(|r| {
            lookup(r, "orders.user_id") != Some(&Value::Int(999))
        }));
    }

    #[test]
    fn test_left_join_keeps_users_without_orders() {
        let result = eval(&store(), &users_orders(JoinType::Left));
        // 6 matched pairs plus 4 order-less users.
        assert_eq!(result.counts.after_join, 10);
        let unmatched: Vec<&Row> = result
            .rows
            .iter()
            .filter(|r| lookup(r, "orders.id") == Some(&Value::Null))
            .collect();
        assert_eq!(unmatched.len(), 4);
        // Unmatched rows still carry the user columns.
        assert!(unmatched.iter().all(|r| lookup(r, "users.name").is_some()));
    }

    #[test]
    fn test_right_join_keeps_the_ghost_order() {
        let result = eval(&store(), &users_orders(JoinType::Right));
        assert_eq!(result.counts.after_join, 7);
        assert!(result.rows.iter().any(|r| {
            lookup(r, "orders.user_id") == Some(&Value::Int(999))
                && lookup(r, "users.id") == Some(&Value::Null)
        }));
    }

    #[test]
    fn test_full_join_unions_both_outer_sides() {
        let result = eval(&store(), &users_orders(JoinType::Full));
        // 6 matches + 4 unmatched users + 1 unmatched order.
        assert_eq!(result.counts.after_join, 11);
    }

    #[test]
    fn test_joined_columns_resolve_bare_and_qualified() {
        let ir = users_orders(JoinType::Inner)
            .with_columns(["users.name", "product"])
            .with_condition("total", Operator::Gte, "100");
        let result = eval(&store(), &ir);
        // Orders 103 (380) and 105 (120).
        assert_eq!(result.counts.final_count, 2);
        for row in &result.rows {
            assert!(row.contains_key("users.name"));
            assert!(row.contains_key("product"));
        }
    }

    // =========================================================================
    // Grouping, aggregates, having
    // =========================================================================

    #[test]
    fn test_group_by_with_count() {
        let ir = QueryState::select("users")
            .with_columns(["status"])
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*").with_alias("n"))
            .with_group_by(["status"]);
        let result = eval(&store(), &ir);
        assert_eq!(result.counts.after_group_by, 3);

        let by_status: HashMap<String, i64> = result
            .rows
            .iter()
            .map(|r| {
                let status = lookup(r, "status").map(Value::render).unwrap_or_default();
                let n = match lookup(r, "n") {
                    Some(Value::Int(n)) => *n,
                    _ => 0,
                };
                (status, n)
            })
            .collect();
        assert_eq!(by_status.get("active"), Some(&4));
        assert_eq!(by_status.get("pending"), Some(&2));
        assert_eq!(by_status.get("inactive"), Some(&2));
    }

    #[test]
    fn test_having_filters_buckets() {
        let ir = QueryState::select("users")
            .with_columns(["status"])
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*").with_alias("n"))
            .with_group_by(["status"])
            .with_having(HavingCondition::new(
                AggregateFunction::Count,
                "*",
                Operator::Gt,
                "2",
            ));
        let result = eval(&store(), &ir);
        assert_eq!(result.counts.after_group_by, 3);
        assert_eq!(result.counts.final_count, 1);
        assert_eq!(
            lookup(&result.rows[0], "status"),
            Some(&Value::Text("active".into()))
        );
    }

    #[test]
    fn test_having_aggregate_need_not_be_projected() {
        let ir = QueryState::select("orders")
            .with_columns(["user_id"])
            .with_group_by(["user_id"])
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "*").with_alias("n"))
            .with_having(HavingCondition::new(
                AggregateFunction::Sum,
                "total",
                Operator::Gt,
                "100",
            ));
        let result = eval(&store(), &ir);
        // user 2: 380 + 90; user 5: 120. Users 1 (72), 4 (45), 999 (60) drop.
        assert_eq!(result.counts.final_count, 2);
    }

    #[test]
    fn test_aggregate_without_group_by_is_one_bucket() {
        let ir = QueryState::select("orders")
            .with_aggregate(Aggregate::new(AggregateFunction::Sum, "total").with_alias("revenue"));
        let result = eval(&store(), &ir);
        assert_eq!(result.counts.after_group_by, 1);
        assert_eq!(
            lookup(&result.rows[0], "revenue"),
            Some(&Value::Int(767))
        );
    }

    #[test]
    fn test_default_aggregate_name_matches_sql_text() {
        let ir = QueryState::select("orders")
            .with_aggregate(Aggregate::new(AggregateFunction::Avg, "quantity"));
        let result = eval(&store(), &ir);
        assert!(result.rows[0].contains_key("AVG(quantity)"));
    }

    // =========================================================================
    // Projection, distinct, order, pagination
    // =========================================================================

    #[test]
    fn test_projection_keeps_declaration_order_values() {
        let ir = QueryState::select("users").with_columns(["name", "missing"]);
        let result = eval(&store(), &ir);
        assert_eq!(result.rows[0].len(), 2);
        assert_eq!(lookup(&result.rows[0], "missing"), Some(&Value::Null));
    }

    #[test]
    fn test_distinct_preserves_first_occurrence_order() {
        let ir = QueryState::select("users")
            .with_columns(["status"])
            .with_distinct();
        let result = eval(&store(), &ir);
        let statuses: Vec<String> = result
            .rows
            .iter()
            .filter_map(|r| lookup(r, "status").map(Value::render))
            .collect();
        assert_eq!(statuses, vec!["active", "pending", "inactive"]);
    }

    #[test]
    fn test_sort_is_stable_across_ties() {
        let ir = QueryState::select("users")
            .with_columns(["id", "age"])
            .with_order(OrderKey::asc("age"));
        let result = eval(&store(), &ir);
        // Alice (1) and Farah (6) both have age 25; source order survives.
        let ids: Vec<i64> = result
            .rows
            .iter()
            .filter_map(|r| match lookup(r, "id") {
                Some(Value::Int(n)) => Some(*n),
                _ => None,
            })
            .collect();
        let a = ids.iter().position(|&i| i == 1);
        let b = ids.iter().position(|&i| i == 6);
        assert!(a < b);
    }

    #[test]
    fn test_sort_numeric_before_lexicographic() {
        let ir = QueryState::select("users")
            .with_columns(["age"])
            .with_order(OrderKey::desc("age"));
        let result = eval(&store(), &ir);
        let sorted = ages(&result);
        let mut expected = sorted.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(sorted, expected);
        assert_eq!(sorted.first(), Some(&51));
    }

    #[test]
    fn test_nulls_sort_last_in_both_directions() {
        for direction in [OrderKey::asc("email"), OrderKey::desc("email")] {
            let ir = QueryState::select("users")
                .with_columns(["email"])
                .with_order(direction);
            let result = eval(&store(), &ir);
            assert!(lookup(&result.rows[6], "email").is_some_and(Value::is_null));
            assert!(lookup(&result.rows[7], "email").is_some_and(Value::is_null));
        }
    }

    #[test]
    fn test_limit_offset_slice() {
        let ir = QueryState::select("users")
            .with_columns(["id"])
            .with_order(OrderKey::asc("id"))
            .with_limit(3)
            .with_offset(2);
        let result = eval(&store(), &ir);
        let ids: Vec<String> = result
            .rows
            .iter()
            .filter_map(|r| lookup(r, "id").map(Value::render))
            .collect();
        assert_eq!(ids, vec!["3", "4", "5"]);
    }

    #[test]
    fn test_offset_past_the_end_is_empty() {
        let ir = QueryState::select("users").with_offset(100);
        assert_eq!(eval(&store(), &ir).counts.final_count, 0);
    }

    // =========================================================================
    // Stage count monotonicity
    // =========================================================================

    #[test]
    fn test_stage_counts_never_increase() {
        let queries = vec![
            QueryState::select("users").with_condition("age", Operator::Gt, "20"),
            QueryState::select("users")
                .with_group_by(["status"])
                .with_aggregate(Aggregate::new(AggregateFunction::Count, "*"))
                .with_having(HavingCondition::new(
                    AggregateFunction::Count,
                    "*",
                    Operator::Gt,
                    "2",
                )),
            users_orders(JoinType::Inner).with_condition("total", Operator::Gt, "50"),
        ];
        for ir in queries {
            let counts = eval(&store(), &ir).counts;
            assert!(counts.final_count <= counts.after_group_by);
            assert!(counts.after_group_by <= counts.after_where);
            assert!(counts.after_where <= counts.after_join);
        }
    }
}
