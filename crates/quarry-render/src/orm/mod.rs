//! ORM code generators.
//!
//! Five dialects translate the same IR into target-specific call chains or
//! options objects. Each generator owns its own operator vocabulary and
//! switches between a simple find shape and the dialect's lower-level
//! aggregation shape when aggregates, grouping or joins are present.

mod knex;
mod mongoose;
mod prisma;
mod sequelize;
mod typeorm;

pub use knex::KnexGenerator;
pub use mongoose::MongooseGenerator;
pub use prisma::PrismaGenerator;
pub use sequelize::SequelizeGenerator;
pub use typeorm::TypeOrmGenerator;

use quarry_core::{Condition, Conjunction, QueryState};
use serde::{Deserialize, Serialize};

/// Trait for rendering a query description as ORM code.
pub trait OrmGenerator: Send + Sync {
    /// Unique name for this dialect
    fn name(&self) -> &'static str;

    /// Render the IR to dialect-idiomatic source code
    fn generate(&self, ir: &QueryState) -> String;
}

/// The closed set of supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Prisma,
    Sequelize,
    TypeOrm,
    Knex,
    Mongoose,
}

impl Dialect {
    /// Every dialect, in the order the UI lists them.
    pub const ALL: [Dialect; 5] = [
        Dialect::Prisma,
        Dialect::Sequelize,
        Dialect::TypeOrm,
        Dialect::Knex,
        Dialect::Mongoose,
    ];

    /// The generator implementing this dialect.
    pub fn generator(&self) -> &'static dyn OrmGenerator {
        match self {
            Dialect::Prisma => &PrismaGenerator,
            Dialect::Sequelize => &SequelizeGenerator,
            Dialect::TypeOrm => &TypeOrmGenerator,
            Dialect::Knex => &KnexGenerator,
            Dialect::Mongoose => &MongooseGenerator,
        }
    }

    /// Render `ir` in this dialect.
    pub fn generate(&self, ir: &QueryState) -> String {
        self.generator().generate(ir)
    }
}

/// Flatten the left-associative WHERE chain into OR-separated groups of
/// AND-ed conditions, the shape every declarative dialect expresses.
pub(crate) fn or_groups(conditions: &[Condition]) -> Vec<Vec<&Condition>> {
    let mut groups: Vec<Vec<&Condition>> = Vec::new();
    for (i, condition) in conditions.iter().enumerate() {
        if i == 0 || condition.conjunction == Conjunction::Or {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(condition);
        }
    }
    groups
}
