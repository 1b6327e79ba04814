//! TypeORM generator.
//!
//! Plain SELECTs use repository find options; aggregation, grouping, joins,
//! DISTINCT and HAVING force the lower-level query builder with positional
//! parameters. Mutations always go through the query builder.

use crate::orm::{or_groups, OrmGenerator};
use crate::util::{js_key, js_list, js_str, js_value, model_name};
use quarry_core::literal::split_bounds;
use quarry_core::{Condition, Conjunction, JoinType, Operator, QueryState, QueryType};

pub struct TypeOrmGenerator;

impl OrmGenerator for TypeOrmGenerator {
    fn name(&self) -> &'static str {
        "typeorm"
    }

    fn generate(&self, ir: &QueryState) -> String {
        match ir.query_type {
            QueryType::Select => {
                if needs_builder(ir) {
                    builder_select(ir)
                } else {
                    find_select(ir)
                }
            }
            QueryType::Insert => {
                let mut calls = vec![
                    ".insert()".to_string(),
                    format!(".values({})", values_object(ir)),
                ];
                calls.push(".execute()".to_string());
                builder_chain(ir, calls, false)
            }
            QueryType::Update => {
                let mut calls = vec![
                    ".update()".to_string(),
                    format!(".set({})", values_object(ir)),
                ];
                push_builder_where(&mut calls, &ir.where_conditions, &mut 0);
                calls.push(".execute()".to_string());
                builder_chain(ir, calls, false)
            }
            QueryType::Delete => {
                let mut calls = vec![".delete()".to_string()];
                push_builder_where(&mut calls, &ir.where_conditions, &mut 0);
                calls.push(".execute()".to_string());
                builder_chain(ir, calls, false)
            }
        }
    }
}

fn needs_builder(ir: &QueryState) -> bool {
    ir.is_aggregating() || !ir.joins.is_empty() || !ir.having.is_empty() || ir.distinct
}

// =============================================================================
// Find-options shape
// =============================================================================

fn find_select(ir: &QueryState) -> String {
    let mut options: Vec<String> = Vec::new();

    if !ir.columns.is_empty() {
        let columns: Vec<String> = ir.columns.iter().map(|c| js_str(c)).collect();
        options.push(format!("select: [{}]", columns.join(", ")));
    }
    if !ir.where_conditions.is_empty() {
        options.push(format!("where: {}", find_where(&ir.where_conditions)));
    }
    if !ir.order_by.is_empty() {
        let keys: Vec<String> = ir
            .order_by
            .iter()
            .map(|k| format!("{}: {}", js_key(&k.column), js_str(k.direction.as_sql())))
            .collect();
        options.push(format!("order: {{ {} }}", keys.join(", ")));
    }
    if let Some(limit) = ir.limit {
        options.push(format!("take: {limit}"));
    }
    if let Some(offset) = ir.offset {
        options.push(format!("skip: {offset}"));
    }

    if options.is_empty() {
        return format!("dataSource.getRepository({}).find();", model_name(&ir.table));
    }
    let body: Vec<String> = options.iter().map(|o| format!("  {o},")).collect();
    format!(
        "dataSource.getRepository({}).find({{\n{}\n}});",
        model_name(&ir.table),
        body.join("\n")
    )
}

/// OR splits the chain into alternative where objects; AND-ed conditions
/// share one object.
fn find_where(conditions: &[Condition]) -> String {
    let groups = or_groups(conditions);
    let objects: Vec<String> = groups
        .iter()
        .map(|group| {
            let pairs: Vec<String> = group
                .iter()
                .map(|c| format!("{}: {}", js_key(&c.column), find_operand(c)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        })
        .collect();
    if objects.len() == 1 {
        objects.into_iter().next().unwrap_or_default()
    } else {
        format!("[{}]", objects.join(", "))
    }
}

/// TypeORM's find-operator vocabulary.
fn find_operand(condition: &Condition) -> String {
    let value = &condition.value;
    match condition.operator {
        Operator::Eq => js_value(value),
        Operator::NotEq => format!("Not({})", js_value(value)),
        Operator::Gt => format!("MoreThan({})", js_value(value)),
        Operator::Lt => format!("LessThan({})", js_value(value)),
        Operator::Gte => format!("MoreThanOrEqual({})", js_value(value)),
        Operator::Lte => format!("LessThanOrEqual({})", js_value(value)),
        Operator::Like => format!("Like({})", js_str(value.trim())),
        Operator::In => format!("In({})", js_list(value)),
        Operator::NotIn => format!("Not(In({}))", js_list(value)),
        Operator::IsNull => "IsNull()".to_string(),
        Operator::IsNotNull => "Not(IsNull())".to_string(),
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => format!("Between({}, {})", js_value(&low), js_value(&high)),
            None => format!("Between({})", js_value(value)),
        },
    }
}

// =============================================================================
// Query-builder shape
// =============================================================================

fn builder_select(ir: &QueryState) -> String {
    let mut calls: Vec<String> = Vec::new();
    if ir.distinct {
        calls.push(".distinct(true)".to_string());
    }

    let mut first_projection = true;
    for column in &ir.columns {
        let method = if first_projection { "select" } else { "addSelect" };
        first_projection = false;
        calls.push(format!(".{method}({})", js_str(column)));
    }
    for aggregate in &ir.aggregates {
        let expression = js_str(&format!("{}({})", aggregate.function, aggregate.column));
        let method = if first_projection { "select" } else { "addSelect" };
        first_projection = false;
        match &aggregate.alias {
            Some(alias) => calls.push(format!(".{method}({expression}, {})", js_str(alias))),
            None => calls.push(format!(".{method}({expression})")),
        }
    }

    for join in &ir.joins {
        calls.push(format!(
            ".{}({}, {}, {})",
            builder_join_method(join.join_type),
            js_str(&join.table),
            js_str(&join.table),
            js_str(&format!("{} = {}", join.on_left, join.on_right))
        ));
    }

    let mut params = 0usize;
    push_builder_where(&mut calls, &ir.where_conditions, &mut params);

    for (i, key) in ir.group_by.iter().enumerate() {
        let method = if i == 0 { "groupBy" } else { "addGroupBy" };
        calls.push(format!(".{method}({})", js_str(key)));
    }

    for (i, having) in ir.having.iter().enumerate() {
        let method = if i == 0 {
            "having"
        } else if having.conjunction == Conjunction::Or {
            "orHaving"
        } else {
            "andHaving"
        };
        let operand = format!("{}({})", having.function, having.column);
        calls.push(format!(
            ".{method}({})",
            builder_comparison(&operand, having.operator, &having.value, &mut params)
        ));
    }

    for (i, key) in ir.order_by.iter().enumerate() {
        let method = if i == 0 { "orderBy" } else { "addOrderBy" };
        calls.push(format!(
            ".{method}({}, {})",
            js_str(&key.column),
            js_str(key.direction.as_sql())
        ));
    }

    if let Some(offset) = ir.offset {
        calls.push(format!(".offset({offset})"));
    }
    if let Some(limit) = ir.limit {
        calls.push(format!(".limit({limit})"));
    }
    calls.push(if ir.is_aggregating() {
        ".getRawMany()".to_string()
    } else {
        ".getMany()".to_string()
    });

    builder_chain(ir, calls, true)
}

fn builder_chain(ir: &QueryState, calls: Vec<String>, with_alias: bool) -> String {
    let builder = if with_alias {
        format!(".createQueryBuilder({})", js_str(&ir.table))
    } else {
        ".createQueryBuilder()".to_string()
    };
    let mut out = format!(
        "dataSource\n  .getRepository({})\n  {builder}",
        model_name(&ir.table)
    );
    for call in calls {
        out.push_str("\n  ");
        out.push_str(&call);
    }
    out.push(';');
    out
}

fn push_builder_where(calls: &mut Vec<String>, conditions: &[Condition], params: &mut usize) {
    for (i, condition) in conditions.iter().enumerate() {
        let method = if i == 0 {
            "where"
        } else if condition.conjunction == Conjunction::Or {
            "orWhere"
        } else {
            "andWhere"
        };
        calls.push(format!(
            ".{method}({})",
            builder_comparison(&condition.column, condition.operator, &condition.value, params)
        ));
    }
}

/// A raw SQL fragment with positional parameters: the full argument list
/// for a `.where`/`.having` call.
fn builder_comparison(
    operand: &str,
    operator: Operator,
    value: &str,
    params: &mut usize,
) -> String {
    match operator {
        Operator::IsNull | Operator::IsNotNull => {
            js_str(&format!("{operand} {}", operator.as_sql()))
        }
        Operator::In | Operator::NotIn => {
            let p = next_param(params);
            format!(
                "{}, {{ {p}: {} }}",
                js_str(&format!("{operand} {} (:...{p})", operator.as_sql())),
                js_list(value)
            )
        }
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => {
                let p0 = next_param(params);
                let p1 = next_param(params);
                format!(
                    "{}, {{ {p0}: {}, {p1}: {} }}",
                    js_str(&format!("{operand} BETWEEN :{p0} AND :{p1}")),
                    js_value(&low),
                    js_value(&high)
                )
            }
            None => js_str(&format!("{operand} BETWEEN {}", value.trim())),
        },
        op => {
            let p = next_param(params);
            format!(
                "{}, {{ {p}: {} }}",
                js_str(&format!("{operand} {} :{p}", op.as_sql())),
                js_value(value)
            )
        }
    }
}

fn next_param(params: &mut usize) -> String {
    let p = format!("p{params}");
    *params += 1;
    p
}

fn builder_join_method(join_type: JoinType) -> &'static str {
    match join_type {
        JoinType::Inner => "innerJoin",
        // The query builder has no right/full outer joins; the left join is
        // the closest it can express.
        JoinType::Left | JoinType::Right | JoinType::Full => "leftJoin",
    }
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
