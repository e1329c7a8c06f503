//! # pgqb
//!
//! A fluent, Postgres-only SQL query builder.
//!
//! Builders assemble a structured statement model (SELECT / INSERT / UPDATE
//! / DELETE with JOINs, WHERE predicate trees, ORDER BY, LIMIT/OFFSET,
//! RETURNING, ON CONFLICT) and compile it deterministically into
//! parameterized PostgreSQL text plus an ordered bind-value array.
//!
//! ## Features
//!
//! - **Exact-text output**: one canonical rendering; callers can assert the
//!   compiled SQL verbatim
//! - **No string replacement**: `$n` placeholder indices are computed while
//!   rendering, in depth-first operand order
//! - **Alias exclusivity**: once `users as u` enters a query, `users` is no
//!   longer a valid qualifier anywhere in it
//! - **Pure compilation**: building and compiling do no I/O; execution is
//!   the caller's concern (`BuiltQuery::params_ref()` binds straight into
//!   tokio-postgres)
//!
//! ## Usage
//!
//! ```ignore
//! use pgqb::{select_from, insert_into, Expr, InsertRow};
//!
//! // SELECT
//! let built = select_from("users as u")
//!     .inner_join("posts as p", "u.id", "p.user_id")
//!     .select(&["u.name", "p.title"])
//!     .filter("u.active", "=", true)
//!     .order_by_desc("p.created_at")
//!     .limit(20)
//!     .build()?;
//! // built.sql, built.params
//!
//! // INSERT ... ON CONFLICT ... RETURNING
//! let built = insert_into("users")
//!     .values(InsertRow::new().set("username", "alice"))
//!     .on_conflict()
//!     .column("username")
//!     .do_nothing()
//!     .returning(&["id"])
//!     .build()?;
//! ```

pub mod alias;
pub mod delete;
pub mod error;
pub mod expr;
pub mod ident;
pub mod insert;
pub mod param;
pub mod schema;
pub mod select;
pub mod update;
pub mod value;

pub use alias::AliasRegistry;
pub use delete::DeleteQb;
pub use error::{QbError, QbResult};
pub use expr::{ArrayPredicate, Expr, JsonbPredicate, PatternOp};
pub use ident::{ColumnToken, TableRef};
pub use insert::{InsertQb, InsertRow, OnConflictQb, OnConflictUpdateQb};
pub use param::{BuiltQuery, ParamSink};
pub use schema::SchemaRegistry;
pub use select::{Direction, JoinKind, SelectQb};
pub use update::UpdateQb;
pub use value::Value;

/// Create a SELECT query builder for the given table.
///
/// The table may carry an alias: `select_from("users as u")`.
pub fn select_from(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert_into(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// By default a DELETE without WHERE conditions compiles to a no-op
/// (`WHERE 1=0`); use `allow_delete_all(true)` to delete all rows.
pub fn delete_from(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}
