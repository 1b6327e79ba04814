//! Prisma client generator.
//!
//! Plain SELECTs render `findMany`; grouped or aggregated queries render
//! `groupBy`/`aggregate`. Joins have no options-object shape at all, so
//! they fall back to `$queryRaw` around the canonical SQL.

use crate::orm::{or_groups, OrmGenerator};
use crate::sql::render_sql;
use crate::util::{js_key, js_list, js_str, js_value};
use quarry_core::literal::split_bounds;
use quarry_core::{
    Aggregate, AggregateFunction, Condition, HavingCondition, Operator, QueryState, QueryType,
};

pub struct PrismaGenerator;

impl OrmGenerator for PrismaGenerator {
    fn name(&self) -> &'static str {
        "prisma"
    }

    fn generate(&self, ir: &QueryState) -> String {
        match ir.query_type {
            QueryType::Select => {
                if !ir.joins.is_empty() {
                    raw_fallback(ir)
                } else if !ir.group_by.is_empty() {
                    group_by_call(ir)
                } else if !ir.aggregates.is_empty() {
                    aggregate_call(ir)
                } else {
                    find_many(ir)
                }
            }
            QueryType::Insert => options_call(
                &format!("prisma.{}.create", ir.table),
                vec![format!("data: {}", data_object(ir))],
            ),
            QueryType::Update => {
                let mut options = Vec::new();
                if !ir.where_conditions.is_empty() {
                    options.push(format!("where: {}", where_object(&ir.where_conditions)));
                }
                options.push(format!("data: {}", data_object(ir)));
                options_call(&format!("prisma.{}.updateMany", ir.table), options)
            }
            QueryType::Delete => {
                let mut options = Vec::new();
                if !ir.where_conditions.is_empty() {
                    options.push(format!("where: {}", where_object(&ir.where_conditions)));
                }
                options_call(&format!("prisma.{}.deleteMany", ir.table), options)
            }
        }
    }
}

fn find_many(ir: &QueryState) -> String {
    let mut options: Vec<String> = Vec::new();
    if ir.distinct && !ir.columns.is_empty() {
        let columns: Vec<String> = ir.columns.iter().map(|c| js_str(c)).collect();
        options.push(format!("distinct: [{}]", columns.join(", ")));
    }
    if !ir.columns.is_empty() {
        let fields: Vec<String> = ir
            .columns
            .iter()
            .map(|c| format!("{}: true", js_key(c)))
            .collect();
        options.push(format!("select: {{ {} }}", fields.join(", ")));
    }
    if !ir.where_conditions.is_empty() {
        options.push(format!("where: {}", where_object(&ir.where_conditions)));
    }
    if !ir.order_by.is_empty() {
        options.push(format!("orderBy: {}", order_array(ir)));
    }
    push_paging(&mut options, ir);
    options_call(&format!("prisma.{}.findMany", ir.table), options)
}

fn group_by_call(ir: &QueryState) -> String {
    let mut options: Vec<String> = Vec::new();
    let keys: Vec<String> = ir.group_by.iter().map(|g| js_str(g)).collect();
    options.push(format!("by: [{}]", keys.join(", ")));
    if !ir.where_conditions.is_empty() {
        options.push(format!("where: {}", where_object(&ir.where_conditions)));
    }
    options.extend(aggregate_selections(&ir.aggregates));
    if !ir.having.is_empty() {
        options.push(format!("having: {}", having_object(&ir.having)));
    }
    if !ir.order_by.is_empty() {
        options.push(format!("orderBy: {}", order_array(ir)));
    }
    push_paging(&mut options, ir);
    options_call(&format!("prisma.{}.groupBy", ir.table), options)
}

fn aggregate_call(ir: &QueryState) -> String {
    let mut options: Vec<String> = Vec::new();
    if !ir.where_conditions.is_empty() {
        options.push(format!("where: {}", where_object(&ir.where_conditions)));
    }
    options.extend(aggregate_selections(&ir.aggregates));
    push_paging(&mut options, ir);
    options_call(&format!("prisma.{}.aggregate", ir.table), options)
}

fn raw_fallback(ir: &QueryState) -> String {
    let sql = render_sql(ir);
    let sql = sql.strip_suffix(';').unwrap_or(&sql);
    format!("prisma.$queryRaw`{sql}`;")
}

/// `_count`/`_sum`/… selection objects, merged per function in encounter
/// order. `COUNT(*)` selects `_all`.
fn aggregate_selections(aggregates: &[Aggregate]) -> Vec<String> {
    let mut fields: Vec<(&'static str, Vec<String>)> = Vec::new();
    for aggregate in aggregates {
        let key = prisma_aggregate_key(aggregate.function);
        let field = if aggregate.column == "*" {
            "_all".to_string()
        } else {
            aggregate.column.clone()
        };
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, list)) => {
                if !list.contains(&field) {
                    list.push(field);
                }
            }
            None => fields.push((key, vec![field])),
        }
    }
    fields
        .iter()
        .map(|(key, list)| {
            let entries: Vec<String> = list
                .iter()
                .map(|field| format!("{}: true", js_key(field)))
                .collect();
            format!("{key}: {{ {} }}", entries.join(", "))
        })
        .collect()
}

fn prisma_aggregate_key(function: AggregateFunction) -> &'static str {
    match function {
        AggregateFunction::Count => "_count",
        AggregateFunction::Sum => "_sum",
        AggregateFunction::Avg => "_avg",
        AggregateFunction::Min => "_min",
        AggregateFunction::Max => "_max",
    }
}

fn where_object(conditions: &[Condition]) -> String {
    let groups = or_groups(conditions);
    let objects: Vec<String> = groups
        .iter()
        .map(|group| {
            let pairs: Vec<String> = group
                .iter()
                .map(|c| format!("{}: {}", js_key(&c.column), operand(c)))
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        })
        .collect();
    if objects.len() == 1 {
        objects.into_iter().next().unwrap_or_default()
    } else {
        format!("{{ OR: [{}] }}", objects.join(", "))
    }
}

/// Prisma's nested filter vocabulary.
fn operand(condition: &Condition) -> String {
    let value = &condition.value;
    match condition.operator {
        Operator::Eq => js_value(value),
        Operator::NotEq => format!("{{ not: {} }}", js_value(value)),
        Operator::Gt => format!("{{ gt: {} }}", js_value(value)),
        Operator::Lt => format!("{{ lt: {} }}", js_value(value)),
        Operator::Gte => format!("{{ gte: {} }}", js_value(value)),
        Operator::Lte => format!("{{ lte: {} }}", js_value(value)),
        Operator::Like => like_operand(value),
        Operator::In => format!("{{ in: {} }}", js_list(value)),
        Operator::NotIn => format!("{{ notIn: {} }}", js_list(value)),
        Operator::IsNull => "null".to_string(),
        Operator::IsNotNull => "{ not: null }".to_string(),
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => {
                format!("{{ gte: {}, lte: {} }}", js_value(&low), js_value(&high))
            }
            None => format!("{{ gte: {} }}", js_value(value)),
        },
    }
}

/// LIKE maps onto `contains`/`startsWith`/`endsWith` by wildcard position.
fn like_operand(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let starts = trimmed.starts_with('%');
    let ends = trimmed.len() > 1 && trimmed.ends_with('%');
    let core = trimmed.trim_matches('%');
    match (starts, ends) {
        (true, true) => format!("{{ contains: {} }}", js_str(core)),
        (false, true) => format!("{{ startsWith: {} }}", js_str(core)),
        (true, false) => format!("{{ endsWith: {} }}", js_str(core)),
        (false, false) => js_str(trimmed),
    }
}

fn having_object(having: &[HavingCondition]) -> String {
    let mut groups: Vec<Vec<&HavingCondition>> = Vec::new();
    for (i, condition) in having.iter().enumerate() {
        if i == 0 || condition.conjunction == quarry_core::Conjunction::Or {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(condition);
        }
    }
    let objects: Vec<String> = groups
        .iter()
        .map(|group| {
            let entries: Vec<String> = group.iter().map(|h| having_entry(h)).collect();
            if entries.len() == 1 {
                entries.into_iter().next().unwrap_or_default()
            } else {
                format!("{{ AND: [{}] }}", entries.join(", "))
            }
        })
        .collect();
    if objects.len() == 1 {
        objects.into_iter().next().unwrap_or_default()
    } else {
        format!("{{ OR: [{}] }}", objects.join(", "))
    }
}

fn having_entry(having: &HavingCondition) -> String {
    let comparison = operand(&Condition::new(
        having.column.clone(),
        having.operator,
        having.value.clone(),
    ));
    let func = prisma_aggregate_key(having.function);
    if having.column == "*" {
        format!("{{ _count: {{ _all: {comparison} }} }}")
    } else {
        format!(
            "{{ {}: {{ {func}: {comparison} }} }}",
            js_key(&having.column)
        )
    }
}

fn order_array(ir: &QueryState) -> String {
    let keys: Vec<String> = ir
        .order_by
        .iter()
        .map(|k| {
            format!(
                "{{ {}: {} }}",
                js_key(&k.column),
                js_str(&k.direction.as_sql().to_lowercase())
            )
        })
        .collect();
    format!("[{}]", keys.join(", "))
}

fn push_paging(options: &mut Vec<String>, ir: &QueryState) {
    if let Some(limit) = ir.limit {
        options.push(format!("take: {limit}"));
    }
    if let Some(offset) = ir.offset {
        options.push(format!("skip: {offset}"));
    }
}

fn data_object(ir: &QueryState) -> String {
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

fn options_call(head: &str, options: Vec<String>) -> String {
    if options.is_empty() {
        return format!("{head}();");
    }
    let body: Vec<String> = options.iter().map(|o| format!("  {o},")).collect();
    format!("{head}({{\n{}\n}});", body.join("\n"))
}
