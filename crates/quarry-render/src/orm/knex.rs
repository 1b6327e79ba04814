//! Knex fluent query-builder generator.

use crate::orm::OrmGenerator;
use crate::sql::render_comparison;
use crate::util::{js_key, js_list, js_str, js_value};
use quarry_core::literal::split_bounds;
use quarry_core::{
    Aggregate, AggregateFunction, Condition, Conjunction, JoinType, Operator, QueryState,
    QueryType,
};

pub struct KnexGenerator;

impl OrmGenerator for KnexGenerator {
    fn name(&self) -> &'static str {
        "knex"
    }

    fn generate(&self, ir: &QueryState) -> String {
        let mut calls: Vec<String> = Vec::new();
        match ir.query_type {
            QueryType::Select => {
                if ir.distinct {
                    calls.push(".distinct()".to_string());
                }
                if !ir.columns.is_empty() {
                    let columns: Vec<String> = ir.columns.iter().map(|c| js_str(c)).collect();
                    calls.push(format!(".select({})", columns.join(", ")));
                }
                for aggregate in &ir.aggregates {
                    calls.push(aggregate_call(aggregate));
                }
                for join in &ir.joins {
                    calls.push(format!(
                        ".{}({}, {}, {})",
                        join_method(join.join_type),
                        js_str(&join.table),
                        js_str(&join.on_left),
                        js_str(&join.on_right)
                    ));
                }
                push_where(&mut calls, &ir.where_conditions);
                if !ir.group_by.is_empty() {
                    let keys: Vec<String> = ir.group_by.iter().map(|g| js_str(g)).collect();
                    calls.push(format!(".groupBy({})", keys.join(", ")));
                }
                for (i, having) in ir.having.iter().enumerate() {
                    let raw = render_comparison(
                        &format!("{}({})", having.function, having.column),
                        having.operator,
                        &having.value,
                    );
                    let method = if i > 0 && having.conjunction == Conjunction::Or {
                        "orHavingRaw"
                    } else {
                        "havingRaw"
                    };
                    calls.push(format!(".{method}({})", js_str(&raw)));
                }
                for key in &ir.order_by {
                    calls.push(format!(
                        ".orderBy({}, {})",
                        js_str(&key.column),
                        js_str(&key.direction.as_sql().to_lowercase())
                    ));
                }
                if let Some(limit) = ir.limit {
                    calls.push(format!(".limit({limit})"));
                }
                if let Some(offset) = ir.offset {
                    calls.push(format!(".offset({offset})"));
                }
            }
            QueryType::Insert => {
                calls.push(format!(".insert({})", values_object(ir)));
            }
            QueryType::Update => {
                push_where(&mut calls, &ir.where_conditions);
                calls.push(format!(".update({})", values_object(ir)));
            }
            QueryType::Delete => {
                push_where(&mut calls, &ir.where_conditions);
                calls.push(".del()".to_string());
            }
        }

        let mut out = format!("knex({})", js_str(&ir.table));
        for call in calls {
            out.push_str("\n  ");
            out.push_str(&call);
        }
        out.push(';');
        out
    }
}

fn push_where(calls: &mut Vec<String>, conditions: &[Condition]) {
    for (i, condition) in conditions.iter().enumerate() {
        calls.push(where_call(condition, i == 0));
    }
}

fn where_call(condition: &Condition, first: bool) -> String {
    let or = !first && condition.conjunction == Conjunction::Or;
    let column = js_str(&condition.column);
    match condition.operator {
        Operator::IsNull => {
            format!(".{}({column})", pick(or, "orWhereNull", "whereNull"))
        }
        Operator::IsNotNull => {
            format!(".{}({column})", pick(or, "orWhereNotNull", "whereNotNull"))
        }
        Operator::In => format!(
            ".{}({column}, {})",
            pick(or, "orWhereIn", "whereIn"),
            js_list(&condition.value)
        ),
        Operator::NotIn => format!(
            ".{}({column}, {})",
            pick(or, "orWhereNotIn", "whereNotIn"),
            js_list(&condition.value)
        ),
        Operator::Between => {
            let bounds = match split_bounds(&condition.value) {
                Some((low, high)) => format!("[{}, {}]", js_value(&low), js_value(&high)),
                None => format!("[{}]", js_value(&condition.value)),
            };
            format!(
                ".{}({column}, {bounds})",
                pick(or, "orWhereBetween", "whereBetween")
            )
        }
        op => {
            let method = if first {
                "where"
            } else {
                pick(or, "orWhere", "andWhere")
            };
            format!(
                ".{method}({column}, {}, {})",
                js_str(binary_operator(op)),
                js_value(&condition.value)
            )
        }
    }
}

fn pick(or: bool, when_or: &'static str, otherwise: &'static str) -> &'static str {
    if or {
        when_or
    } else {
        otherwise
    }
}

/// Knex's operator vocabulary for binary comparisons.
fn binary_operator(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "=",
        Operator::NotEq => "!=",
        Operator::Gt => ">",
        Operator::Lt => "<",
        Operator::Gte => ">=",
        Operator::Lte => "<=",
        Operator::Like => "like",
        _ => "=",
    }
}

fn aggregate_call(aggregate: &Aggregate) -> String {
    let method = match aggregate.function {
        AggregateFunction::Count => "count",
        AggregateFunction::Sum => "sum",
        AggregateFunction::Avg => "avg",
        AggregateFunction::Min => "min",
        AggregateFunction::Max => "max",
    };
    let argument = match &aggregate.alias {
        Some(alias) => format!("{} as {}", aggregate.column, alias),
        None => aggregate.column.clone(),
    };
    format!(".{method}({})", js_str(&argument))
}

fn values_object(ir: &QueryState) -> String {
    if ir.insert_values.is_empty() {
        return "{}".to_string();
    }
    let pairs: Vec<String> = ir
        .insert_values
        .iter()
        .map(|(column, value)| format!("{}: {}", js_key(column), js_value(value)))
        .collect();
    format!("{{ {} }}", pairs.join(", "))
}

fn join_method(join_type: JoinType) -> &'static str {
    match join_type {
        JoinType::Inner => "innerJoin",
        JoinType::Left => "leftJoin",
        JoinType::Right => "rightJoin",
        JoinType::Full => "fullOuterJoin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{HavingCondition, Join, OrderKey};

    fn generate(ir: &QueryState) -> String {
        KnexGenerator.generate(ir)
    }

    #[test]
    fn test_simple_select() {
        let ir = QueryState::select("users")
            .with_columns(["name"])
            .with_condition("age", Operator::Gt, "18")
            .with_condition("status", Operator::Eq, "active")
            .with_order(OrderKey::asc("name"))
            .with_limit(10);
        assert_eq!(
            generate(&ir),
            "knex(\"users\")\n  .select(\"name\")\n  .where(\"age\", \">\", 18)\n  .andWhere(\"status\", \"=\", \"active\")\n  .orderBy(\"name\", \"asc\")\n  .limit(10);"
        );
    }

    #[test]
    fn test_or_and_special_operators() {
        let ir = QueryState::select("users")
            .with_condition("email", Operator::IsNull, "")
            .with_condition_chain(Condition::new("status", Operator::In, "active, pending").or())
            .with_condition("age", Operator::Between, "18 AND 35");
        let code = generate(&ir);
        assert!(code.contains(".whereNull(\"email\")"));
        assert!(code.contains(".orWhereIn(\"status\", [\"active\", \"pending\"])"));
        assert!(code.contains(".whereBetween(\"age\", [18, 35])"));
    }

    #[test]
    fn test_aggregation_shape() {
        let ir = QueryState::select("orders")
            .with_columns(["user_id"])
            .with_aggregate(Aggregate::new(AggregateFunction::Sum, "total").with_alias("revenue"))
            .with_group_by(["user_id"])
            .with_having(HavingCondition::new(
                AggregateFunction::Sum,
                "total",
                Operator::Gt,
                "100",
            ));
        let code = generate(&ir);
        assert!(code.contains(".sum(\"total as revenue\")"));
        assert!(code.contains(".groupBy(\"user_id\")"));
        assert!(code.contains(".havingRaw(\"SUM(total) > 100\")"));
    }

    #[test]
    fn test_join_methods() {
        let ir = QueryState::select("users").with_join(Join::new(
            JoinType::Left,
            "orders",
            "users.id",
            "orders.user_id",
        ));
        assert!(generate(&ir)
            .contains(".leftJoin(\"orders\", \"users.id\", \"orders.user_id\")"));
    }

    #[test]
    fn test_insert() {
        let ir = QueryState::insert("users")
            .with_insert_value("name", "Zoe")
            .with_insert_value("age", "25");
        assert_eq!(
            generate(&ir),
            "knex(\"users\")\n  .insert({ name: \"Zoe\", age: 25 });"
        );
    }

    #[test]
    fn test_update_and_delete() {
        let mut update = QueryState::select("users")
            .with_insert_value("status", "inactive")
            .with_condition("id", Operator::Eq, "3");
        update.query_type = QueryType::Update;
        assert_eq!(
            generate(&update),
            "knex(\"users\")\n  .where(\"id\", \"=\", 3)\n  .update({ status: \"inactive\" });"
        );

        let mut delete = QueryState::select("users").with_condition("id", Operator::Eq, "3");
        delete.query_type = QueryType::Delete;
        assert!(generate(&delete).ends_with(".del();"));
    }
}
