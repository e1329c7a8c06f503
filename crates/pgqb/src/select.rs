//! SELECT query builder and compiler.

use crate::alias::AliasRegistry;
use crate::error::{QbError, QbResult};
use crate::expr::Expr;
use crate::ident::TableRef;
use crate::param::{BuiltQuery, ParamSink};
use crate::value::Value;

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One JOIN clause: kind, joined table, and the two column tokens of the
/// equality ON condition.
#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: TableRef,
    left: String,
    right: String,
}

/// SELECT query builder.
///
/// Each call consumes and returns the builder; `clone()` a prefix to branch
/// two independent chains. Errors hit along the way are deferred and
/// surfaced by [`build`](Self::build) before any SQL is emitted.
#[derive(Debug, Clone)]
pub struct SelectQb {
    from: TableRef,
    joins: Vec<Join>,
    /// Selected column tokens; empty means `*`.
    columns: Vec<String>,
    /// WHERE chain; compiled as an implicit top-level AND.
    where_group: Vec<Expr>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    build_error: Option<QbError>,
}

impl SelectQb {
    /// Create a builder for `table`, which may carry an alias
    /// (`"users as u"`).
    pub fn new(table: &str) -> Self {
        let (from, build_error) = match TableRef::parse(table) {
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
            from,
            joins: Vec::new(),
            columns: Vec::new(),
            where_group: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            build_error,
        }
    }

    fn record_error(&mut self, err: QbError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    // ==================== SELECT columns ====================

    /// Set the selected columns, replacing any previous selection. Tokens
    /// are emitted verbatim, duplicates included.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Select `*` (the default when no selection was made).
    pub fn select_all(mut self) -> Self {
        self.columns.clear();
        self
    }

    /// Append one column to the selection.
    pub fn add_select(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    // ==================== JOIN ====================

    /// Add `INNER JOIN table ON left = right`.
    pub fn inner_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Inner, table, left, right)
    }

    /// Add `LEFT JOIN table ON left = right`.
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Left, table, left, right)
    }

    /// Add `RIGHT JOIN table ON left = right`.
    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Right, table, left, right)
    }

    /// Add `FULL JOIN table ON left = right`.
    pub fn full_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Full, table, left, right)
    }

    fn join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        match TableRef::parse(table) {
            Ok(table) => self.joins.push(Join {
                kind,
                table,
                left: left.to_string(),
                right: right.to_string(),
            }),
            Err(e) => self.record_error(e),
        }
        self
    }

    // ==================== WHERE ====================

    /// Add a condition from a column, operator string and value. Chained
    /// calls are ANDed together.
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

    /// Add several expressions at once; they join the implicit AND chain.
    pub fn filter_all(mut self, exprs: Vec<Expr>) -> Self {
        self.where_group.extend(exprs);
        self
    }

    /// Add WHERE: column = value
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::eq(column, value))
    }

    /// Add WHERE: column != value
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::ne(column, value))
    }

    /// Add WHERE: column > value
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::gt(column, value))
    }

    /// Add WHERE: column >= value
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::gte(column, value))
    }

    /// Add WHERE: column < value
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::lt(column, value))
    }

    /// Add WHERE: column <= value
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_expr(Expr::lte(column, value))
    }

    /// Add WHERE: column LIKE pattern
    pub fn like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.filter_expr(Expr::like(column, pattern))
    }

    /// Add WHERE: column ILIKE pattern (case-insensitive)
    pub fn ilike(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.filter_expr(Expr::ilike(column, pattern))
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.filter_expr(Expr::is_null(column))
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.filter_expr(Expr::is_not_null(column))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.filter_expr(Expr::in_list(column, values))
    }

    /// Add WHERE: column NOT IN (values...)
    pub fn not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.filter_expr(Expr::not_in(column, values))
    }

    // ==================== ORDER / pagination ====================

    /// Add an ORDER BY entry.
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, Direction::Asc)
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Add several ORDER BY entries at once, in the given order.
    pub fn order_by_many(mut self, entries: &[(&str, Direction)]) -> Self {
        self.order_by
            .extend(entries.iter().map(|(c, d)| (c.to_string(), *d)));
        self
    }

    /// Set LIMIT; the last call wins.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET; the last call wins.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== Build ====================

    /// Compile to SQL text plus the ordered parameter array.
    pub fn build(&self) -> QbResult<BuiltQuery> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }

        let registry = AliasRegistry::new(&self.tables());

        let mut sink = ParamSink::new();
        let mut sql = String::from("SELECT ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let token = registry.resolve_str(column)?;
                sql.push_str(token.as_sql());
            }
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.from.to_sql());

        for join in &self.joins {
            let left = registry.resolve_str(&join.left)?;
            let right = registry.resolve_str(&join.right)?;
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&join.table.to_sql());
            sql.push_str(" ON ");
            sql.push_str(left.as_sql());
            sql.push_str(" = ");
            sql.push_str(right.as_sql());
        }

        if !self.where_group.is_empty() {
            // The implicit top-level AND chain is not parenthesized;
            // nested And/Or groups parenthesize themselves.
            let parts: Vec<String> = self
                .where_group
                .iter()
                .map(|e| e.render(&registry, &mut sink))
                .collect::<QbResult<_>>()?;
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (column, direction)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let token = registry.resolve_str(column)?;
                sql.push_str(token.as_sql());
                sql.push(' ');
                sql.push_str(direction.as_sql());
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let built = BuiltQuery::new(sql, sink.into_values());
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgqb::sql",
            sql = %built.sql,
            params = built.params.len(),
            "compiled SELECT"
        );
        Ok(built)
    }

    /// Compile and return only the SQL string.
    pub fn to_sql(&self) -> QbResult<String> {
        Ok(self.build()?.sql)
    }

    pub(crate) fn tables(&self) -> Vec<&TableRef> {
        let mut tables: Vec<&TableRef> = vec![&self.from];
        tables.extend(self.joins.iter().map(|j| &j.table));
        tables
    }

    pub(crate) fn referenced_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        out.extend(self.columns.iter().map(String::as_str));
        for join in &self.joins {
            out.push(&join.left);
            out.push(&join.right);
        }
        for expr in &self.where_group {
            expr.visit_columns(&mut |c| out.push(c));
        }
        out.extend(self.order_by.iter().map(|(c, _)| c.as_str()));
        out
    }
}
