//! Sequelize generator.
//!
//! Everything renders through `findAll` options: aggregates become
//! `sequelize.fn` attributes, joins become `include` entries, and the
//! operator table lives in the `Op` symbol vocabulary.

use crate::orm::{or_groups, OrmGenerator};
use crate::util::{js_key, js_list, js_str, js_value, model_name};
use quarry_core::literal::split_bounds;
use quarry_core::{
    Aggregate, Condition, Conjunction, HavingCondition, JoinType, Operator, QueryState, QueryType,
};

pub struct SequelizeGenerator;

impl OrmGenerator for SequelizeGenerator {
    fn name(&self) -> &'static str {
        "sequelize"
    }

    fn generate(&self, ir: &QueryState) -> String {
        let model = model_name(&ir.table);
        match ir.query_type {
            QueryType::Select => find_all(ir, &model),
            QueryType::Insert => format!("{model}.create({});", values_object(ir)),
            QueryType::Update => {
                let mut options = Vec::new();
                if !ir.where_conditions.is_empty() {
                    options.push(format!("where: {}", where_object(&ir.where_conditions)));
                }
                format!(
                    "{model}.update({}, {});",
                    values_object(ir),
                    block(&options)
                )
            }
            QueryType::Delete => {
                let mut options = Vec::new();
                if !ir.where_conditions.is_empty() {
                    options.push(format!("where: {}", where_object(&ir.where_conditions)));
                }
                format!("{model}.destroy({});", block(&options))
            }
        }
    }
}

fn find_all(ir: &QueryState, model: &str) -> String {
    let mut options: Vec<String> = Vec::new();

    let mut attributes: Vec<String> = ir.columns.iter().map(|c| js_str(c)).collect();
    if ir.distinct {
        if let Some(first) = ir.columns.first() {
            attributes[0] = format!(
                "[sequelize.fn(\"DISTINCT\", sequelize.col({})), {}]",
                js_str(first),
                js_str(first)
            );
        }
    }
    attributes.extend(ir.aggregates.iter().map(aggregate_attribute));
    if !attributes.is_empty() {
        options.push(format!("attributes: [{}]", attributes.join(", ")));
    }

    if !ir.joins.is_empty() {
        let includes: Vec<String> = ir.joins.iter().map(include_entry).collect();
        options.push(format!("include: [{}]", includes.join(", ")));
    }
    if !ir.where_conditions.is_empty() {
        options.push(format!("where: {}", where_object(&ir.where_conditions)));
    }
    if !ir.group_by.is_empty() {
        let keys: Vec<String> = ir.group_by.iter().map(|g| js_str(g)).collect();
        options.push(format!("group: [{}]", keys.join(", ")));
    }
    if !ir.having.is_empty() {
        options.push(format!("having: {}", having_value(&ir.having)));
    }
    if !ir.order_by.is_empty() {
        let keys: Vec<String> = ir
            .order_by
            .iter()
            .map(|k| format!("[{}, {}]", js_str(&k.column), js_str(k.direction.as_sql())))
            .collect();
        options.push(format!("order: [{}]", keys.join(", ")));
    }
    if let Some(limit) = ir.limit {
        options.push(format!("limit: {limit}"));
    }
    if let Some(offset) = ir.offset {
        options.push(format!("offset: {offset}"));
    }

    format!("{model}.findAll({});", block(&options))
}

fn aggregate_attribute(aggregate: &Aggregate) -> String {
    format!(
        "[sequelize.fn({}, sequelize.col({})), {}]",
        js_str(aggregate.function.as_sql()),
        js_str(&aggregate.column),
        js_str(&aggregate.result_name())
    )
}

fn include_entry(join: &quarry_core::Join) -> String {
    let mut parts = vec![
        format!("model: {}", model_name(&join.table)),
        format!(
            "required: {}",
            matches!(join.join_type, JoinType::Inner)
        ),
    ];
    if matches!(join.join_type, JoinType::Right | JoinType::Full) {
        parts.push("right: true".to_string());
    }
    parts.push(format!(
        "on: sequelize.where(sequelize.col({}), \"=\", sequelize.col({}))",
        js_str(&join.on_left),
        js_str(&join.on_right)
    ));
    format!("{{ {} }}", parts.join(", "))
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
        format!("{{ [Op.or]: [{}] }}", objects.join(", "))
    }
}

/// Sequelize's `Op` symbol vocabulary.
fn operand(condition: &Condition) -> String {
    let value = &condition.value;
    match condition.operator {
        Operator::Eq => js_value(value),
        Operator::NotEq => format!("{{ [Op.ne]: {} }}", js_value(value)),
        Operator::Gt => format!("{{ [Op.gt]: {} }}", js_value(value)),
        Operator::Lt => format!("{{ [Op.lt]: {} }}", js_value(value)),
        Operator::Gte => format!("{{ [Op.gte]: {} }}", js_value(value)),
        Operator::Lte => format!("{{ [Op.lte]: {} }}", js_value(value)),
        Operator::Like => format!("{{ [Op.like]: {} }}", js_str(value.trim())),
        Operator::In => format!("{{ [Op.in]: {} }}", js_list(value)),
        Operator::NotIn => format!("{{ [Op.notIn]: {} }}", js_list(value)),
        Operator::IsNull => "{ [Op.is]: null }".to_string(),
        Operator::IsNotNull => "{ [Op.not]: null }".to_string(),
        Operator::Between => match split_bounds(value) {
            Some((low, high)) => format!(
                "{{ [Op.between]: [{}, {}] }}",
                js_value(&low),
                js_value(&high)
            ),
            None => format!("{{ [Op.between]: [{}] }}", js_value(value)),
        },
    }
}

fn having_value(having: &[HavingCondition]) -> String {
    let mut groups: Vec<Vec<&HavingCondition>> = Vec::new();
    for (i, condition) in having.iter().enumerate() {
        if i == 0 || condition.conjunction == Conjunction::Or {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(condition);
        }
    }
    let rendered: Vec<String> = groups
        .iter()
        .map(|group| {
            let entries: Vec<String> = group.iter().map(|h| having_entry(h)).collect();
            if entries.len() == 1 {
                entries.into_iter().next().unwrap_or_default()
            } else {
                format!("{{ [Op.and]: [{}] }}", entries.join(", "))
            }
        })
        .collect();
    if rendered.len() == 1 {
        rendered.into_iter().next().unwrap_or_default()
    } else {
        format!("{{ [Op.or]: [{}] }}", rendered.join(", "))
    }
}

fn having_entry(having: &HavingCondition) -> String {
    let value = match having.operator {
        Operator::IsNull | Operator::IsNotNull => "null".to_string(),
        Operator::In | Operator::NotIn => js_list(&having.value),
        _ => js_value(&having.value),
    };
    format!(
        "sequelize.where(sequelize.fn({}, sequelize.col({})), {}, {value})",
        js_str(having.function.as_sql()),
        js_str(&having.column),
        js_str(having.operator.as_sql())
    )
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

fn block(options: &[String]) -> String {
    if options.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = options.iter().map(|o| format!("  {o},")).collect();
    format!("{{\n{}\n}}", body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use quarry_core::{AggregateFunction, Join, OrderKey};

    fn generate(ir: &QueryState) -> String {
        SequelizeGenerator.generate(ir)
    }

    #[test]
    fn test_find_all() {
        let ir = QueryState::select("users")
            .with_columns(["name", "age"])
            .with_condition("age", Operator::Gte, "21")
            .with_order(OrderKey::desc("age"))
            .with_limit(10);
        let code = generate(&ir);
        assert!(code.starts_with("Users.findAll({"));
        assert!(code.contains("attributes: [\"name\", \"age\"],"));
        assert!(code.contains("where: { age: { [Op.gte]: 21 } },"));
        assert!(code.contains("order: [[\"age\", \"DESC\"]],"));
        assert!(code.contains("limit: 10,"));
    }

    #[test]
    fn test_or_chain_uses_op_or() {
        let ir = QueryState::select("users")
            .with_condition("status", Operator::Eq, "active")
            .with_condition_chain(Condition::new("status", Operator::Eq, "pending").or());
        assert!(generate(&ir).contains(
            "where: { [Op.or]: [{ status: \"active\" }, { status: \"pending\" }] },"
        ));
    }

    #[test]
    fn test_aggregates_and_having() {
        let ir = QueryState::select("users")
            .with_columns(["status"])
            .with_aggregate(Aggregate::new(AggregateFunction::Count, "id").with_alias("n"))
            .with_group_by(["status"])
            .with_having(HavingCondition::new(
                AggregateFunction::Count,
                "id",
                Operator::Gt,
                "2",
            ));
        let code = generate(&ir);
        assert!(code
            .contains("[sequelize.fn(\"COUNT\", sequelize.col(\"id\")), \"n\"]"));
        assert!(code.contains("group: [\"status\"],"));
        assert!(code.contains(
            "having: sequelize.where(sequelize.fn(\"COUNT\", sequelize.col(\"id\")), \">\", 2),"
        ));
    }

    #[test]
    fn test_join_includes() {
        let inner = QueryState::select("users").with_join(Join::new(
            JoinType::Inner,
            "orders",
            "users.id",
            "orders.user_id",
        ));
        let code = generate(&inner);
        assert!(code.contains("include: [{ model: Orders, required: true, on: sequelize.where(sequelize.col(\"users.id\"), \"=\", sequelize.col(\"orders.user_id\")) }],"));

        let right = QueryState::select("users").with_join(Join::new(
            JoinType::Right,
            "orders",
            "users.id",
            "orders.user_id",
        ));
        assert!(generate(&right).contains("required: false, right: true,"));
    }

    #[test]
    fn test_distinct_wraps_first_attribute() {
        let ir = QueryState::select("users")
            .with_columns(["status"])
            .with_distinct();
        assert!(generate(&ir).contains(
            "attributes: [[sequelize.fn(\"DISTINCT\", sequelize.col(\"status\")), \"status\"]],"
        ));
    }

    #[test]
    fn test_create_is_single_line() {
        let ir = QueryState::insert("users")
            .with_insert_value("name", "Zoe")
            .with_insert_value("age", "25");
        assert_snapshot!(generate(&ir), @r#"Users.create({ name: "Zoe", age: 25 });"#);
    }

    #[test]
    fn test_update_and_destroy() {
        let mut update = QueryState::select("users")
            .with_insert_value("status", "inactive")
            .with_condition("id", Operator::Eq, "3");
        update.query_type = QueryType::Update;
        let code = generate(&update);
        assert!(code.starts_with("Users.update({ status: \"inactive\" }, {"));
        assert!(code.contains("where: { id: 3 },"));

        let mut delete = QueryState::select("users").with_condition("id", Operator::Eq, "3");
        delete.query_type = QueryType::Delete;
        assert!(generate(&delete).starts_with("Users.destroy({"));
    }
}
