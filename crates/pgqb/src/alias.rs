//! Alias registry: table/alias bindings and exclusivity enforcement.
//!
//! Aliasing a table is exclusive: once `users as u` enters a query, `users`
//! is no longer a valid qualifier anywhere in that query. The registry
//! validates qualifiers; it never rewrites the caller's chosen token.

use crate::error::{QbError, QbResult};
use crate::ident::{ColumnToken, TableRef};

/// The set of `(base table, alias?)` bindings in scope for one query.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    tables: Vec<TableRef>,
}

impl AliasRegistry {
    /// Build a registry from the FROM table and all joined tables.
    pub fn new(tables: &[&TableRef]) -> Self {
        Self {
            tables: tables.iter().map(|t| (*t).clone()).collect(),
        }
    }

    /// Validate one column token against the bindings in scope.
    ///
    /// Bare tokens pass: without a schema there is no way to tell which
    /// table they belong to (see the schema validation pass for the strict
    /// variant).
    pub fn resolve(&self, token: &ColumnToken) -> QbResult<()> {
        let Some(qualifier) = token.qualifier() else {
            return Ok(());
        };

        for table in &self.tables {
            if let Some(alias) = &table.alias {
                if alias == qualifier {
                    return Ok(());
                }
                if table.table == qualifier {
                    return Err(QbError::AliasExclusivity {
                        table: table.table.clone(),
                        alias: alias.clone(),
                    });
                }
            } else if table.table == qualifier {
                return Ok(());
            }
        }

        Err(QbError::UnresolvableColumn(token.as_sql().to_string()))
    }

    /// Parse and validate a column token in one step.
    pub fn resolve_str(&self, token: &str) -> QbResult<ColumnToken> {
        let parsed = ColumnToken::parse(token)?;
        self.resolve(&parsed)?;
        Ok(parsed)
    }

    /// Tables in scope, for the schema validation pass.
    pub fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(defs: &[&str]) -> AliasRegistry {
        let tables: Vec<TableRef> = defs.iter().map(|s| TableRef::parse(s).unwrap()).collect();
        AliasRegistry::new(&tables.iter().collect::<Vec<_>>())
    }

    #[test]
    fn unaliased_table_resolves_by_name() {
        let reg = registry(&["users"]);
        assert!(reg.resolve_str("users.id").is_ok());
        assert!(reg.resolve_str("id").is_ok());
    }

    #[test]
    fn alias_resolves() {
        let reg = registry(&["users as u"]);
        assert!(reg.resolve_str("u.id").is_ok());
    }

    #[test]
    fn aliased_base_name_is_rejected() {
        let reg = registry(&["users as u"]);
        let err = reg.resolve_str("users.id").unwrap_err();
        assert!(err.is_alias_exclusivity());
    }

    #[test]
    fn unknown_qualifier_is_unresolvable() {
        let reg = registry(&["users as u", "posts"]);
        let err = reg.resolve_str("comments.id").unwrap_err();
        assert!(err.is_unresolvable_column());
    }

    #[test]
    fn join_tables_participate() {
        let reg = registry(&["users as u", "posts as p"]);
        assert!(reg.resolve_str("p.title").is_ok());
        assert!(reg.resolve_str("posts.title").unwrap_err().is_alias_exclusivity());
    }
}
