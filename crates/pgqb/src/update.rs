//! UPDATE query builder and compiler.

use crate::alias::AliasRegistry;
use crate::error::{QbError, QbResult};
use crate::expr::Expr;
use crate::ident::TableRef;
use crate::param::{BuiltQuery, ParamSink};
use crate::value::Value;

/// UPDATE query builder. SET placeholders are numbered before WHERE
/// placeholders.
#[derive(Debug, Clone)]
pub struct UpdateQb {
    table: TableRef,
    set_fields: Vec<(String, Value)>,
    where_group: Vec<Expr>,
    returning: Option<Vec<String>>,
    build_error: Option<QbError>,
}

impl UpdateQb {
    /// Create a builder for `table`.
    pub fn new(table: &str) -> Self {
        let (table, build_error) = match TableRef::parse(table) {
            Ok(t) => (t, None),
            Err(e) => (
                TableRef {
                    table: String::new(),
                    alias: None,
                },
                Some(e),
            ),
        };
        Self {
            table,
            set_fields: Vec::new(),
            where_group: Vec::new(),
            returning: None,
            build_error,
        }
    }

    fn record_error(&mut self, err: QbError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_fields.push((column.to_string(), value.into()));
        self
    }

    /// Set an optional column value (None skips the column).
    pub fn set_opt(self, column: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    // ==================== WHERE ====================

    /// Add a condition from a column, operator string and value.
    pub fn filter(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        match Expr::cmp(column, op, value) {
            Ok(expr) => self.where_group.push(expr),
            Err(e) => self.record_error(e),
        }
        self
    }

    /// Add a pre-built expression to the WHERE chain.
    pub fn filter_expr(mut self, expr: Expr) -> Self {
        self.where_group.push(expr);
        self
    }

    /// Add WHERE: column = value
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::eq(column, value))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.filter_expr(Expr::in_list(column, values))
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.filter_expr(Expr::is_null(column))
    }

    // ==================== RETURNING ====================

    /// Set RETURNING columns.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = Some(columns.iter().map(|s| s.to_string()).collect());
        self
    }

    /// `RETURNING *`
    pub fn returning_all(mut self) -> Self {
        self.returning = Some(Vec::new());
        self
    }

    // ==================== Build ====================

    /// Compile to SQL text plus the ordered parameter array.
    pub fn build(&self) -> QbResult<BuiltQuery> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        if self.set_fields.is_empty() {
            return Err(QbError::validation("UPDATE requires at least one SET field"));
        }

        let registry = AliasRegistry::new(&[&self.table]);
        let mut sink = ParamSink::new();

        let mut sql = String::from("UPDATE ");
        sql.push_str(&self.table.to_sql());
        sql.push_str(" SET ");
        for (i, (column, value)) in self.set_fields.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let token = registry.resolve_str(column)?;
            sql.push_str(token.as_sql());
            sql.push_str(" = ");
            sql.push_str(&sink.placeholder(value.clone()));
        }

        if !self.where_group.is_empty() {
            let parts: Vec<String> = self
                .where_group
                .iter()
                .map(|e| e.render(&registry, &mut sink))
                .collect::<QbResult<_>>()?;
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if let Some(returning) = &self.returning {
            sql.push_str(" RETURNING ");
            if returning.is_empty() {
                sql.push('*');
            } else {
                for (i, column) in returning.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    let token = registry.resolve_str(column)?;
                    sql.push_str(token.as_sql());
                }
            }
        }

        let built = BuiltQuery::new(sql, sink.into_values());
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgqb::sql",
            sql = %built.sql,
            params = built.params.len(),
            "compiled UPDATE"
        );
        Ok(built)
    }

    /// Compile and return only the SQL string.
    pub fn to_sql(&self) -> QbResult<String> {
        Ok(self.build()?.sql)
    }

    pub(crate) fn table_ref(&self) -> &TableRef {
        &self.table
    }

    pub(crate) fn referenced_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.set_fields.iter().map(|(c, _)| c.as_str()).collect();
        for expr in &self.where_group {
            expr.visit_columns(&mut |c| out.push(c));
        }
        if let Some(returning) = &self.returning {
            out.extend(returning.iter().map(String::as_str));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_update() {
        let built = UpdateQb::new("users")
            .set("status", "inactive")
            .eq("id", 1i64)
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE users SET status = $1 WHERE id = $2");
        assert_eq!(
            built.params,
            vec![Value::Text("inactive".into()), Value::BigInt(1)]
        );
    }

    #[test]
    fn set_placeholders_precede_where() {
        let built = UpdateQb::new("users")
            .set("a", 1)
            .set("b", 2)
            .filter("c", "=", 3)
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE users SET a = $1, b = $2 WHERE c = $3");
        assert_eq!(
            built.params,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn update_without_set_errors() {
        let qb = UpdateQb::new("users").eq("id", 1);
        assert!(matches!(qb.build(), Err(QbError::Validation(_))));
    }

    #[test]
    fn set_opt_skips_none() {
        let sql = UpdateQb::new("users")
            .set("status", "active")
            .set_opt("name", Option::<&str>::None)
            .eq("id", 1)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET status = $1 WHERE id = $2");
    }

    #[test]
    fn update_with_returning() {
        let sql = UpdateQb::new("users")
            .set("status", "active")
            .eq("id", 1)
            .returning(&["id", "status"])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET status = $1 WHERE id = $2 RETURNING id, status"
        );
    }
}
