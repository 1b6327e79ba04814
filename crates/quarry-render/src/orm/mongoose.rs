//! Mongoose / MongoDB shell generator.
//!
//! Plain SELECTs render `find` with a filter and projection; aggregation,
//! grouping, joins and DISTINCT all force an `aggregate` pipeline with
//! `$lookup`, `$group` and `$match` stages.

use crate::orm::{or_groups, OrmGenerator};
use crate::util::{bare_column, js_key, js_list, js_str, js_value};
use quarry_core::literal::split_bounds;
use quarry_core::{
    Aggregate, AggregateFunction, Condition, Conjunction, Direction, HavingCondition, JoinType,
    Operator, QueryState, QueryType,
};

pub struct MongooseGenerator;

impl OrmGenerator for MongooseGenerator {
    fn name(&self) -> &'static str {
        "mongoose"
    }

    fn generate(&self, ir: &QueryState) -> String {
        let collection = format!("db.{}", ir.table);
        match ir.query_type {
            QueryType::Select => {
                if needs_pipeline(ir) {
                    pipeline(ir, &collection)
                } else {
                    find(ir, &collection)
                }
            }
            QueryType::Insert => format!("{collection}.insertOne({});", values_object(ir)),
            QueryType::Update => format!(
                "{collection}.updateMany({}, {{ $set: {} }});",
                filter_object(&ir.where_conditions),
                values_object(ir)
            ),
            QueryType::Delete => format!(
                "{collection}.deleteMany({});",
                filter_object(&ir.where_conditions)
            ),
        }
    }
}

fn needs_pipeline(ir: &QueryState) -> bool {
    ir.is_aggregating() || !ir.joins.is_empty() || ir.distinct
}

// =============================================================================
// Find shape
// =============================================================================

fn find(ir: &QueryState, collection: &str) -> String {
    let filter = filter_object(&ir.where_conditions);
    let mut out = if ir.columns.is_empty() {
        format!("{collection}.find({filter})")
    } else {
        let fields: Vec<String> = ir
            .columns
            .iter()
            .map(|c| format!("{}: 1", js_key(bare_column(c))))
            .collect();
        format!("{collection}.find({filter}, {{ {} }})", fields.join(", "))
    };

    if !ir.order_by.is_empty() {
        out.push_str(&format!(".sort({})", sort_object(ir)));
    }
    if let Some(offset) = ir.offset {
        out.push_str(&format!(".skip({offset})"));
    }
    if let Some(limit) = ir.limit {
        out.push_str(&format!(".limit({limit})"));
    }
    out.push(';');
    out
}

// =============================================================================
// Aggregation pipeline
// =============================================================================

fn pipeline(ir: &QueryState, collection: &str) -> String {
    let mut stages: Vec<String> = Vec::new();

    for join in &ir.joins {
        stages.push(format!(
            "{{ $lookup: {{ from: {}, localField: {}, foreignField: {}, as: {} }} }}",
            js_str(&join.table),
            js_str(bare_column(&join.on_left)),
            js_str(bare_column(&join.on_right)),
            js_str(&join.table)
        ));
        stages.push(match join.join_type {
            JoinType::Inner => format!("{{ $unwind: {} }}", js_str(&format!("${}", join.table))),
            _ => format!(
                "{{ $unwind: {{ path: {}, preserveNullAndEmptyArrays: true }} }}",
                js_str(&format!("${}", join.table))
            ),
        });
    }

    if !ir.where_conditions.is_empty() {
        stages.push(format!(
            "{{ $match: {} }}",
            filter_object(&ir.where_conditions)
        ));
    }

    // DISTINCT without explicit grouping dedups through a $group stage.
    let group_keys: Vec<String> = if !ir.group_by.is_empty() {
        ir.group_by.iter().map(|g| bare_column(g).to_string()).collect()
    } else if ir.distinct && ir.aggregates.is_empty() {
        ir.columns.iter().map(|c| bare_column(c).to_string()).collect()
    } else {
        Vec::new()
    };
    let grouped = !group_keys.is_empty() || !ir.aggregates.is_empty();

    if grouped {
        stages.push(group_stage(ir, &group_keys));
        if !ir.having.is_empty() {
            stages.push(format!("{{ $match: {} }}", having_filter(ir)));
        }
    }

    if let Some(projection) = project_stage(ir, &group_keys, grouped) {
        stages.push(projection);
    }
    if !ir.order_by.is_empty() {
        stages.push(format!("{{ $sort: {} }}", sort_object(ir)));
    }
    if let Some(offset) = ir.offset {
        stages.push(format!("{{ $skip: {offset} }}"));
    }
    if let Some(limit) = ir.limit {
        stages.push(format!("{{ $limit: {limit} }}"));
    }

    let body: Vec<String> = stages.iter().map(|s| format!("  {s},")).collect();
    format!("{collection}.aggregate([\n{}\n]);", body.join("\n"))
}

fn group_stage(ir: &QueryState, group_keys: &[String]) -> String {
    let id = if group_keys.is_empty() {
        "null".to_string()
    } else {
        let keys: Vec<String> = group_keys
            .iter()
            .map(|key| format!("{}: {}", js_key(key), js_str(&format!("${key}"))))
            .collect();
        format!("{{ {} }}", keys.join(", "))
    };

    let mut entries = vec![format!("_id: {id}")];
    let mut named: Vec<String> = Vec::new();
    for aggregate in &ir.aggregates {
        let name = aggregate.result_name();
        entries.push(format!(
            "{}: {}",
            js_key(&name),
            accumulator(aggregate.function, &aggregate.column)
        ));
        named.push(name);
    }
    // HAVING can reference an aggregate that is not projected; compute it
    // inside the group stage anyway.
    for having in &ir.having {
        let name = having_name(ir, having);
        if !named.contains(&name) {
            entries.push(format!(
                "{}: {}",
                js_key(&name),
                accumulator(having.function, &having.column)
            ));
            named.push(name);
        }
    }

    format!("{{ $group: {{ {} }} }}", entries.join(", "))
}

fn accumulator(function: AggregateFunction, column: &str) -> String {
    let field = js_str(&format!("${}", bare_column(column)));
    match function {
        AggregateFunction::Count => "{ $sum: 1 }".to_string(),
        AggregateFunction::Sum => format!("{{ $sum: {field} }}"),
        AggregateFunction::Avg => format!("{{ $avg: {field} }}"),
        AggregateFunction::Min => format!("{{ $min: {field} }}"),
        AggregateFunction::Max => format!("{{ $max: {field} }}"),
    }
}

/// The `$group` output field a HAVING condition tests: the matching
/// projected aggregate's name when one exists, else the default name.
fn having_name(ir: &QueryState, having: &HavingCondition) -> String {
    ir.aggregates
        .iter()
        .find(|a| a.function == having.function && a.column == having.column)
        .map(Aggregate::result_name)
        .unwrap_or_else(|| format!("{}({})", having.function, having.column))
}

fn having_filter(ir: &QueryState) -> String {
    let mut groups: Vec<Vec<&HavingCondition>> = Vec::new();
    for (i, condition) in ir.having.iter().enumerate() {
        if i == 0 || condition.conjunction == Conjunction::Or {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(condition);
        }
    }
    let objects: Vec<String> = groups
        .iter()
        .map(|group| {
            let pairs: Vec<String> = group
                .iter()
                .map(|h| {
                    format!(
                        "{}: {}",
                        js_key(&having_name(ir, h)),
                        operand(h.operator, &h.value)
                    )
                })
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        })
        .collect();
    if objects.len() == 1 {
        objects.into_iter().next().unwrap_or_default()
    } else {
        format!("{{ $or: [{}] }}", objects.join(", "))
    }
}

fn project_stage(ir: &QueryState, group_keys: &[String], grouped: bool) -> Option<String> {
    if ir.columns.is_empty() && ir.aggregates.is_empty() {
        return None;
    }
    let mut fields: Vec<String> = Vec::new();
    for column in &ir.columns {
        let bare = bare_column(column);
        if grouped && group_keys.iter().any(|k| k == bare) {
            fields.push(format!(
                "{}: {}",
                js_key(bare),
                js_str(&format!("$_id.{bare}"))
            ));
        } else {
            fields.push(format!("{}: 1", js_key(bare)));
        }
    }
    for aggregate in &ir.aggregates {
        fields.push(format!("{}: 1", js_key(&aggregate.result_name())));
    }
    if grouped {
        fields.push("_id: 0".to_string());
    }
    Some(format!("{{ $project: {{ {} }} }}", fields.join(", ")))
}

fn sort_object(ir: &QueryState) -> String {
    let keys: Vec<String> = ir
        .order_by
        .iter()
        .map(|k| {
            let direction = match k.direction {
                Direction::Asc => 1,
                Direction::Desc => -1,
            };
            format!("{}: {direction}", js_key(bare_column(&k.column)))
        })
        .collect();
    format!("{{ {} }}", keys.join(", "))
}

// =============================================================================
// Filters
// =============================================================================

fn filter_object(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return "{}".to_string();
    }
    let groups = or_groups(conditions);
    let objects: Vec<String> = groups
        .iter()
        .map(|group| {
            let pairs: Vec<String> = group
                .iter()
                .map(|c| {
                    format!(
                        "{}: {}",
                        js_key(bare_column(&c.column)),
                        operand(c.operator, &c.value)
                    )
                })
                .collect();
            format!("{{ {} }}", pairs.join(", "))
        })
        .collect();
    if objects.len() == 1 {
        objects.into_iter().next().unwrap_or_default()
    } else {
        format!("{{ $or: [{}] }}", objects.join(", "))
    }
}

/// MongoDB's `$`-operator vocabulary.
fn operand(operator: Operator, value: &str) -> String {
    match operator {
        Operator::Eq => js_value(value),
        Operator::NotEq => format!("{{ $ne: {} }}", js_value(value)),
        Operator::Gt => format!("{{ $gt: {} }}", js_value(value)),
        Operator::Lt => format!("{{ $lt: {} }}", js_value(value)),
        Operator::Gte => format!("{{ $gte: {} }}", js_value(value)),
        Operator::Lte => format!("{{ $lte: {} }}", js_value(value)),
        Operator::Like => format!(
            "{{ $regex: {}, $options: \"i\" }}",
            js_str(&like_regex(value.trim()))
        ),
        Operator::In => format!("{{ $in: {} }}", js_list(value)),
        Operator::NotIn => format!("{{ $nin: {} }}", js_list(value)),
        Operator::IsNull => "null".to_string(),
        Operator::IsNotNull => "{ $ne: null }".to_string(),
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => {
                format!("{{ $gte: {}, $lte: {} }}", js_value(&low), js_value(&high))
            }
            None => format!("{{ $gte: {} }}", js_value(value)),
        },
    }
}

/// SQL wildcards as an anchored regular expression source.
fn like_regex(pattern: &str) -> String {
    let mut source = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c if "\\.+*?()|[]{}^$".contains(c) => {
                source.push('\\');
                source.push(c);
            }
            c => source.push(c),
        }
    }
    source.push('$');
    source
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
