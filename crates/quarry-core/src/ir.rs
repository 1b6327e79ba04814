//! The query intermediate representation.
//!
//! [`QueryState`] is the single structure the UI assembles and every backend
//! consumes: the evaluator interprets it, the SQL generator renders it, and
//! the ORM generators translate it. Field names serialize in camelCase so
//! the value round-trips with the canvas and session collaborators.
//!
//! WHERE and HAVING are left-associative condition *chains*, not trees:
//! conjunctions apply strictly in declaration order with no parenthesized
//! grouping. That divergence from SQL precedence is intentional and the
//! evaluator and generators all honor it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind. SELECT is fully supported; INSERT is supported by the
/// generators; UPDATE and DELETE render as text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// Comparison operators usable in WHERE and HAVING chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
    #[serde(rename = "BETWEEN")]
    Between,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
        }
    }

    /// Operators whose condition carries no right-hand value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a condition combines with the running result of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// One link of a WHERE chain. The first condition's conjunction is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    /// Literal right-hand side, as entered in the UI. `IN` values are a
    /// comma-separated list; `BETWEEN` values are `low AND high`.
    pub value: String,
    pub conjunction: Conjunction,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            conjunction: Conjunction::And,
        }
    }

    pub fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// An aggregate expression in the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub function: AggregateFunction,
    /// Column name, or `*` for row counting.
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Aggregate {
    pub fn new(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            function,
            column: column.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name this aggregate takes in result rows: the alias when present,
    /// else the same `FUNC(column)` text the SQL generator shows.
    pub fn result_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}({})", self.function, self.column),
        }
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }
}

/// One join clause: equality between `on_left` and `on_right` column
/// references, which may be bare or table-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    #[serde(rename = "type")]
    pub join_type: JoinType,
    pub table: String,
    pub on_left: String,
    pub on_right: String,
}

impl Join {
    pub fn new(
        join_type: JoinType,
        table: impl Into<String>,
        on_left: impl Into<String>,
        on_right: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            on_left: on_left.into(),
            on_right: on_right.into(),
        }
    }
}

/// One link of a HAVING chain; operands are per-bucket aggregate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HavingCondition {
    pub function: AggregateFunction,
    pub column: String,
    pub operator: Operator,
    pub value: String,
    pub conjunction: Conjunction,
}

impl HavingCondition {
    pub fn new(
        function: AggregateFunction,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            function,
            column: column.into(),
            operator,
            value: value.into(),
            conjunction: Conjunction::And,
        }
    }

    pub fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub column: String,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// The complete query description assembled by the UI.
///
/// Replaced wholesale on every edit; the builder methods consume `self` so
/// each step yields a fresh value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryState {
    pub query_type: QueryType,
    /// Name of the row source this query reads or writes.
    pub table: String,
    /// Projected column names; table-qualified when `joins` is non-empty.
    pub columns: Vec<String>,
    pub aggregates: Vec<Aggregate>,
    pub distinct: bool,
    pub where_conditions: Vec<Condition>,
    pub joins: Vec<Join>,
    pub group_by: Vec<String>,
    pub having: Vec<HavingCondition>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Column to literal map for INSERT, in declaration order.
    pub insert_values: Vec<(String, String)>,
}

impl QueryState {
    pub fn select(table: impl Into<String>) -> Self {
        Self {
            query_type: QueryType::Select,
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self {
            query_type: QueryType::Insert,
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_condition(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        self.with_condition_chain(Condition::new(column, operator, value))
    }

    pub fn with_condition_chain(mut self, condition: Condition) -> Self {
        self.where_conditions.push(condition);
        self
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_having(mut self, having: HavingCondition) -> Self {
        self.having.push(having);
        self
    }

    pub fn with_order(mut self, key: OrderKey) -> Self {
        self.order_by.push(key);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_insert_value(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_values.push((column.into(), value.into()));
        self
    }

    /// True when the query projects something beyond plain columns, which
    /// pushes generators into their aggregation shape.
    pub fn is_aggregating(&self) -> bool {
        !self.aggregates.is_empty() || !self.group_by.is_empty()
    }
}
