//! DELETE query builder and compiler.
//!
//! A DELETE with no WHERE conditions compiles to `WHERE 1=0` (a no-op)
//! unless `allow_delete_all(true)` was called.

use crate::alias::AliasRegistry;
use crate::error::{QbError, QbResult};
use crate::expr::Expr;
use crate::ident::TableRef;
use crate::param::{BuiltQuery, ParamSink};
use crate::value::Value;

/// DELETE query builder.
#[derive(Debug, Clone)]
pub struct DeleteQb {
    table: TableRef,
    where_group: Vec<Expr>,
    returning: Option<Vec<String>>,
    allow_delete_all: bool,
    build_error: Option<QbError>,
}

impl DeleteQb {
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
            where_group: Vec::new(),
            returning: None,
            allow_delete_all: false,
            build_error,
        }
    }

    fn record_error(&mut self, err: QbError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// Permit a DELETE without WHERE conditions to touch every row.
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }

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

    /// Compile to SQL text plus the ordered parameter array.
    pub fn build(&self) -> QbResult<BuiltQuery> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }

        let registry = AliasRegistry::new(&[&self.table]);
        let mut sink = ParamSink::new();

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&self.table.to_sql());

        if self.where_group.is_empty() {
            if !self.allow_delete_all {
                sql.push_str(" WHERE 1=0");
            }
        } else {
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
            "compiled DELETE"
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
        let mut out: Vec<&str> = Vec::new();
        for expr in &self.where_group {
            expr.visit_columns(&mut |c| out.push(c));
        }
        if let Some(returning) = &self.returning {
            out.extend(returning.iter().map(String::as_str));
        }
        out
    }
}
