//! INSERT query builder and compiler.
//!
//! Bulk inserts follow the first-row column template: the emitted column
//! list is exactly the first row's keys in insertion order, and every later
//! row binds positionally against that list, substituting a NULL parameter
//! for keys it lacks. Keys a later row has that the first row lacks are
//! ignored. Mixed-shape rows are not an error.

use crate::alias::AliasRegistry;
use crate::error::{QbError, QbResult};
use crate::ident::TableRef;
use crate::param::{BuiltQuery, ParamSink};
use crate::value::Value;

/// One row of column→value pairs, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InsertRow {
    entries: Vec<(String, Value)>,
}

impl InsertRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting the same column twice keeps the first
    /// position and overwrites the value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
        self
    }

    fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// ON CONFLICT target.
#[derive(Debug, Clone)]
enum ConflictTarget {
    Columns(Vec<String>),
    Constraint(String),
}

/// Value of one DO UPDATE assignment.
#[derive(Debug, Clone)]
enum Assignment {
    /// `col = $n`
    Param(Value),
    /// `col = EXCLUDED.col`, no placeholder
    Excluded,
}

/// ON CONFLICT action.
#[derive(Debug, Clone)]
enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<(String, Assignment)>),
}

#[derive(Debug, Clone)]
struct OnConflict {
    target: Option<ConflictTarget>,
    action: ConflictAction,
}

/// INSERT query builder.
#[derive(Debug, Clone)]
pub struct InsertQb {
    table: TableRef,
    rows: Vec<InsertRow>,
    on_conflict: Option<OnConflict>,
    /// `Some(empty)` means `RETURNING *`.
    returning: Option<Vec<String>>,
    build_error: Option<QbError>,
}

impl InsertQb {
    /// Create a builder for `table`, which may carry an alias.
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
            rows: Vec::new(),
            on_conflict: None,
            returning: None,
            build_error,
        }
    }

    /// Append one row of values.
    pub fn values(mut self, row: InsertRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Append several rows; the first row overall defines the column list.
    pub fn values_many(mut self, rows: Vec<InsertRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Start an ON CONFLICT clause; pick a target with `column`/`columns`/
    /// `constraint` before finishing with `do_nothing` or `do_update`.
    pub fn on_conflict(self) -> OnConflictQb {
        OnConflictQb {
            builder: self,
            target: None,
        }
    }

    /// Set RETURNING columns, emitted verbatim in caller order.
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
        let first = self
            .rows
            .first()
            .ok_or_else(|| QbError::validation("INSERT requires at least one row"))?;
        if first.is_empty() {
            return Err(QbError::validation("INSERT row has no columns"));
        }

        let registry = AliasRegistry::new(&[&self.table]);
        let mut sink = ParamSink::new();

        // Column template from the first row, in its insertion order.
        let columns: Vec<&str> = first.columns().collect();
        for column in &columns {
            registry.resolve_str(column)?;
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.table.to_sql());
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push_str(") VALUES ");

        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, column) in columns.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                let value = row.get(column).cloned().unwrap_or(Value::Null);
                sql.push_str(&sink.placeholder(value));
            }
            sql.push(')');
        }

        if let Some(conflict) = &self.on_conflict {
            sql.push_str(&Self::render_conflict(conflict, &registry, &mut sink)?);
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
            "compiled INSERT"
        );
        Ok(built)
    }

    fn render_conflict(
        conflict: &OnConflict,
        registry: &AliasRegistry,
        sink: &mut ParamSink,
    ) -> QbResult<String> {
        let mut sql = String::from(" ON CONFLICT ");
        match conflict
            .target
            .as_ref()
            .ok_or(QbError::ConflictTargetMissing)?
        {
            ConflictTarget::Columns(columns) => {
                if columns.is_empty() {
                    return Err(QbError::ConflictTargetMissing);
                }
                sql.push('(');
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    let token = registry.resolve_str(column)?;
                    sql.push_str(token.as_sql());
                }
                sql.push(')');
            }
            ConflictTarget::Constraint(name) => {
                crate::ident::validate_ident(name)?;
                sql.push_str("ON CONSTRAINT ");
                sql.push_str(name);
            }
        }

        match &conflict.action {
            ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
            ConflictAction::DoUpdate(assignments) => {
                if assignments.is_empty() {
                    return Err(QbError::validation(
                        "DO UPDATE requires at least one assignment",
                    ));
                }
                sql.push_str(" DO UPDATE SET ");
                for (i, (column, assignment)) in assignments.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    let token = registry.resolve_str(column)?;
                    sql.push_str(token.as_sql());
                    sql.push_str(" = ");
                    match assignment {
                        Assignment::Param(value) => {
                            sql.push_str(&sink.placeholder(value.clone()));
                        }
                        Assignment::Excluded => {
                            sql.push_str("EXCLUDED.");
                            sql.push_str(token.as_sql());
                        }
                    }
                }
            }
        }
        Ok(sql)
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
        if let Some(first) = self.rows.first() {
            out.extend(first.columns());
        }
        if let Some(returning) = &self.returning {
            out.extend(returning.iter().map(String::as_str));
        }
        out
    }
}

/// ON CONFLICT builder: choose a target, then an action.
pub struct OnConflictQb {
    builder: InsertQb,
    target: Option<ConflictTarget>,
}

impl OnConflictQb {
    /// Conflict target: a single column.
    pub fn column(self, column: &str) -> Self {
        self.columns(&[column])
    }

    /// Conflict target: a column list.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        let mut cols = match self.target.take() {
            Some(ConflictTarget::Columns(cols)) => cols,
            _ => Vec::new(),
        };
        cols.extend(columns.iter().map(|s| s.to_string()));
        self.target = Some(ConflictTarget::Columns(cols));
        self
    }

    /// Conflict target: a named constraint.
    pub fn constraint(mut self, name: &str) -> Self {
        self.target = Some(ConflictTarget::Constraint(name.to_string()));
        self
    }

    /// `DO NOTHING`.
    pub fn do_nothing(mut self) -> InsertQb {
        self.builder.on_conflict = Some(OnConflict {
            target: self.target,
            action: ConflictAction::DoNothing,
        });
        self.builder
    }

    /// `DO UPDATE`: configure SET assignments, then `finish()`.
    pub fn do_update(self) -> OnConflictUpdateQb {
        OnConflictUpdateQb {
            builder: self.builder,
            target: self.target,
            assignments: Vec::new(),
        }
    }
}

/// Builder for `ON CONFLICT ... DO UPDATE SET ...`.
pub struct OnConflictUpdateQb {
    builder: InsertQb,
    target: Option<ConflictTarget>,
    assignments: Vec<(String, Assignment)>,
}

impl OnConflictUpdateQb {
    /// `col = $n`; placeholders are numbered after all VALUES placeholders,
    /// in assignment order.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assignments
            .push((column.to_string(), Assignment::Param(value.into())));
        self
    }

    /// `col = EXCLUDED.col`.
    pub fn set_excluded(mut self, column: &str) -> Self {
        self.assignments
            .push((column.to_string(), Assignment::Excluded));
        self
    }

    /// Finish and return the INSERT builder.
    pub fn finish(mut self) -> InsertQb {
        self.builder.on_conflict = Some(OnConflict {
            target: self.target,
            action: ConflictAction::DoUpdate(self.assignments),
        });
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_insert() {
        let built = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice").set("email", "a@example.com"))
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (username, email) VALUES ($1, $2)"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Text("alice".into()),
                Value::Text("a@example.com".into())
            ]
        );
    }

    #[test]
    fn insert_with_returning() {
        let built = InsertQb::new("users")
            .values(InsertRow::new().set("name", "John Doe"))
            .returning(&["id", "name"])
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (name) VALUES ($1) RETURNING id, name"
        );
        assert_eq!(built.params, vec![Value::Text("John Doe".into())]);
    }

    #[test]
    fn insert_returning_all() {
        let sql = InsertQb::new("users")
            .values(InsertRow::new().set("name", "x"))
            .returning_all()
            .to_sql()
            .unwrap();
        assert_eq!(sql, "INSERT INTO users (name) VALUES ($1) RETURNING *");
    }

    #[test]
    fn bulk_insert_first_row_defines_columns() {
        let built = InsertQb::new("users")
            .values_many(vec![
                InsertRow::new().set("name", "A").set("active", true),
                InsertRow::new().set("name", "B"),
            ])
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (name, active) VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Text("A".into()),
                Value::Bool(true),
                Value::Text("B".into()),
                Value::Null
            ]
        );
    }

    #[test]
    fn bulk_insert_ignores_extra_keys_in_later_rows() {
        let built = InsertQb::new("users")
            .values_many(vec![
                InsertRow::new().set("name", "A"),
                InsertRow::new().set("name", "B").set("active", true),
            ])
            .build()
            .unwrap();
        assert_eq!(built.sql, "INSERT INTO users (name) VALUES ($1), ($2)");
        assert_eq!(
            built.params,
            vec![Value::Text("A".into()), Value::Text("B".into())]
        );
    }

    #[test]
    fn on_conflict_do_nothing() {
        let sql = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice"))
            .on_conflict()
            .column("username")
            .do_nothing()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING"
        );
    }

    #[test]
    fn on_conflict_constraint_target() {
        let sql = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice"))
            .on_conflict()
            .constraint("users_username_key")
            .do_nothing()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (username) VALUES ($1) ON CONFLICT ON CONSTRAINT users_username_key DO NOTHING"
        );
    }

    #[test]
    fn do_update_placeholders_follow_values() {
        let built = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice").set("email", "a@x.com"))
            .on_conflict()
            .column("username")
            .do_update()
            .set("email", "new@x.com")
            .set("updated", true)
            .finish()
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (username, email) VALUES ($1, $2) ON CONFLICT (username) DO UPDATE SET email = $3, updated = $4"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Text("alice".into()),
                Value::Text("a@x.com".into()),
                Value::Text("new@x.com".into()),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn do_update_excluded_binds_nothing() {
        let built = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice").set("email", "a@x.com"))
            .on_conflict()
            .columns(&["username"])
            .do_update()
            .set_excluded("email")
            .finish()
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (username, email) VALUES ($1, $2) ON CONFLICT (username) DO UPDATE SET email = EXCLUDED.email"
        );
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn conflict_without_target_errors() {
        let qb = InsertQb::new("users")
            .values(InsertRow::new().set("username", "alice"))
            .on_conflict()
            .do_nothing();
        assert!(matches!(qb.build(), Err(QbError::ConflictTargetMissing)));
    }

    #[test]
    fn insert_without_rows_errors() {
        let qb = InsertQb::new("users");
        assert!(matches!(qb.build(), Err(QbError::Validation(_))));
    }

    #[test]
    fn aliased_insert_table() {
        let sql = InsertQb::new("users as u")
            .values(InsertRow::new().set("name", "x"))
            .returning(&["u.id"])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users AS u (name) VALUES ($1) RETURNING u.id"
        );
    }
}
