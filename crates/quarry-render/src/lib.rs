//! Code generation for Quarry.
//!
//! Two families of pure, deterministic generators over the same
//! [`quarry_core::QueryState`]:
//!
//! - [`sql::render_sql`] — the canonical query text shown next to the
//!   preview. Same IR, byte-identical output; downstream history and
//!   sharing features key off exact text equality.
//! - [`orm::Dialect`] — five ORM call-chain translations (Prisma,
//!   Sequelize, TypeORM, Knex, Mongoose) behind one [`orm::OrmGenerator`]
//!   trait, each owning its own operator vocabulary.
//!
//! Generators skip clauses the IR leaves empty and never silently drop a
//! clause the IR declares.
//!
//! # Example
//!
//! ```
//! use quarry_core::{Operator, QueryState};
//! use quarry_render::{orm::Dialect, sql::render_sql};
//!
//! let ir = QueryState::select("users")
//!     .with_columns(["name"])
//!     .with_condition("age", Operator::Gt, "18");
//!
//! assert_eq!(render_sql(&ir), "SELECT name\nFROM users\nWHERE age > 18;");
//! assert!(Dialect::Knex.generate(&ir).contains(".where(\"age\", \">\", 18)"));
//! ```

pub mod orm;
pub mod sql;

mod util;

// Re-exports for convenience
pub use orm::{Dialect, OrmGenerator};
pub use sql::render_sql;
