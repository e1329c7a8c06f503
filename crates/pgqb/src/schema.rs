//! Optional runtime schema validation.
//!
//! Compilation alone can only check column *qualifiers* against the query's
//! table/alias bindings. With a [`SchemaRegistry`] describing each table's
//! column set, the `check_against` pass also resolves bare column names:
//! unknown columns are rejected, and a bare column whose only owner was
//! superseded by an alias violates alias exclusivity.
//!
//! The pass is opt-in and non-blocking: `build()` never requires a schema.

use std::collections::{BTreeSet, HashMap};

use crate::delete::DeleteQb;
use crate::error::{QbError, QbResult};
use crate::ident::{ColumnToken, TableRef};
use crate::insert::InsertQb;
use crate::select::SelectQb;
use crate::update::UpdateQb;

/// Table → column-set map used by the validation pass.
///
/// Tables the registry does not know about are skipped, so a partial
/// registry checks only what it covers.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, BTreeSet<String>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table and its columns.
    pub fn register(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    fn columns(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(table)
    }
}

fn check_token(
    tables: &[&TableRef],
    schema: &SchemaRegistry,
    token: &str,
) -> QbResult<()> {
    let token = ColumnToken::parse(token)?;

    if let Some(qualifier) = token.qualifier() {
        // Qualifier-level exclusivity is already enforced at build time;
        // here we only check column existence.
        for table in tables {
            let matches = table.alias.as_deref() == Some(qualifier)
                || (table.alias.is_none() && table.table == qualifier);
            if matches {
                if let Some(columns) = schema.columns(&table.table) {
                    if !columns.contains(token.name()) {
                        return Err(QbError::UnresolvableColumn(token.as_sql().to_string()));
                    }
                }
                return Ok(());
            }
        }
        return Ok(());
    }

    // Bare column: find owners among the tables in scope.
    let mut aliased_owner: Option<&TableRef> = None;
    let mut known_any = false;
    for table in tables {
        let Some(columns) = schema.columns(&table.table) else {
            // Unknown table; the bare column may belong to it.
            return Ok(());
        };
        known_any = true;
        if columns.contains(token.name()) {
            match &table.alias {
                None => return Ok(()),
                Some(_) => aliased_owner = Some(table),
            }
        }
    }

    if let Some(owner) = aliased_owner {
        return Err(QbError::AliasExclusivity {
            table: owner.table.clone(),
            alias: owner.alias.clone().unwrap_or_default(),
        });
    }
    if known_any {
        return Err(QbError::UnresolvableColumn(token.as_sql().to_string()));
    }
    Ok(())
}

fn check_columns(
    tables: &[&TableRef],
    columns: &[&str],
    schema: &SchemaRegistry,
) -> QbResult<()> {
    for column in columns {
        check_token(tables, schema, column)?;
    }
    Ok(())
}

impl SelectQb {
    /// Validate every referenced column against a schema.
    pub fn check_against(&self, schema: &SchemaRegistry) -> QbResult<()> {
        check_columns(&self.tables(), &self.referenced_columns(), schema)
    }
}

impl InsertQb {
    /// Validate every referenced column against a schema.
    pub fn check_against(&self, schema: &SchemaRegistry) -> QbResult<()> {
        check_columns(&[self.table_ref()], &self.referenced_columns(), schema)
    }
}

impl UpdateQb {
    /// Validate every referenced column against a schema.
    pub fn check_against(&self, schema: &SchemaRegistry) -> QbResult<()> {
        check_columns(&[self.table_ref()], &self.referenced_columns(), schema)
    }
}

impl DeleteQb {
    /// Validate every referenced column against a schema.
    pub fn check_against(&self, schema: &SchemaRegistry) -> QbResult<()> {
        check_columns(&[self.table_ref()], &self.referenced_columns(), schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::SelectQb;

    fn schema() -> SchemaRegistry {
        SchemaRegistry::new()
            .register("users", &["id", "name", "active"])
            .register("posts", &["id", "user_id", "title"])
    }

    #[test]
    fn known_columns_pass() {
        let qb = SelectQb::new("users")
            .select(&["id", "name"])
            .filter("active", "=", true);
        assert!(qb.check_against(&schema()).is_ok());
    }

    #[test]
    fn unknown_column_is_unresolvable() {
        let qb = SelectQb::new("users").select(&["id", "nickname"]);
        let err = qb.check_against(&schema()).unwrap_err();
        assert!(err.is_unresolvable_column());
    }

    #[test]
    fn unknown_qualified_column_is_unresolvable() {
        let qb = SelectQb::new("users").select(&["users.nickname"]);
        let err = qb.check_against(&schema()).unwrap_err();
        assert!(err.is_unresolvable_column());
    }

    #[test]
    fn bare_column_of_aliased_table_violates_exclusivity() {
        let qb = SelectQb::new("users as u").filter("active", "=", true);
        let err = qb.check_against(&schema()).unwrap_err();
        assert!(err.is_alias_exclusivity());
    }

    #[test]
    fn bare_column_with_unaliased_owner_passes() {
        let qb = SelectQb::new("users")
            .inner_join("posts as p", "users.id", "p.user_id")
            .filter("active", "=", true);
        assert!(qb.check_against(&schema()).is_ok());
    }

    #[test]
    fn unknown_table_skips_checking() {
        let qb = SelectQb::new("audit_log").select(&["anything"]);
        assert!(qb.check_against(&schema()).is_ok());
    }

    #[test]
    fn insert_columns_checked() {
        let qb = crate::insert::InsertQb::new("users")
            .values(crate::insert::InsertRow::new().set("nickname", "x"));
        assert!(qb.check_against(&schema()).unwrap_err().is_unresolvable_column());
    }
}
