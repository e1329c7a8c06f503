//! SQL identifier and reference-token handling.
//!
//! Every table or column string entering a builder is validated here before
//! any SQL is emitted. Unquoted identifier segments must match
//! `[A-Za-z_][A-Za-z0-9_$]*`; dotted qualification is allowed
//! (`schema.table`, `alias.column`).

use crate::error::{QbError, QbResult};

/// Validate one dot-separated identifier (`users`, `public.users`, `u.id`).
pub(crate) fn validate_ident(s: &str) -> QbResult<()> {
    if s.is_empty() {
        return Err(QbError::validation("identifier cannot be empty"));
    }
    for segment in s.split('.') {
        validate_segment(segment)?;
    }
    Ok(())
}

fn validate_segment(segment: &str) -> QbResult<()> {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(QbError::validation(format!(
                "invalid identifier start character: '{c}'"
            )));
        }
        None => return Err(QbError::validation("empty identifier segment")),
    }
    for c in chars {
        if c != '_' && c != '$' && !c.is_ascii_alphanumeric() {
            return Err(QbError::validation(format!(
                "invalid character in identifier: '{c}'"
            )));
        }
    }
    Ok(())
}

/// A table reference with an optional alias, parsed from `"users"`,
/// `"users as u"` or `"users u"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Base table name, possibly schema-qualified.
    pub table: String,
    /// Alias introduced by the caller, if any.
    pub alias: Option<String>,
}

impl TableRef {
    /// Parse a table reference string.
    pub fn parse(s: &str) -> QbResult<Self> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let (table, alias) = match tokens.as_slice() {
            [table] => (*table, None),
            [table, kw, alias] if kw.eq_ignore_ascii_case("as") => (*table, Some(*alias)),
            [table, alias] => (*table, Some(*alias)),
            _ => {
                return Err(QbError::validation(format!(
                    "malformed table reference: '{s}'"
                )));
            }
        };
        validate_ident(table)?;
        if let Some(a) = alias {
            validate_segment(a)?;
        }
        Ok(Self {
            table: table.to_string(),
            alias: alias.map(str::to_string),
        })
    }

    /// Render as `table` or `table AS alias`.
    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.table, alias),
            None => self.table.clone(),
        }
    }
}

/// A column token as written by the caller: `"id"`, `"u.id"` or
/// `"id as user_id"`.
///
/// The raw text is preserved and emitted verbatim; parsing only extracts
/// the qualifier for alias-registry validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToken {
    raw: String,
    qualifier: Option<String>,
    name: String,
}

impl ColumnToken {
    /// Parse a column token, optionally carrying an `as` output alias.
    pub fn parse(s: &str) -> QbResult<Self> {
        let raw = s.trim();
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let column = match tokens.as_slice() {
            [column] => *column,
            [column, kw, alias] if kw.eq_ignore_ascii_case("as") => {
                validate_segment(alias)?;
                *column
            }
            _ => {
                return Err(QbError::validation(format!(
                    "malformed column reference: '{s}'"
                )));
            }
        };
        validate_ident(column)?;
        let (qualifier, name) = match column.rsplit_once('.') {
            Some((qual, name)) => (Some(qual.to_string()), name.to_string()),
            None => (None, column.to_string()),
        };
        Ok(Self {
            raw: raw.to_string(),
            qualifier,
            name,
        })
    }

    /// The token exactly as the caller wrote it (trimmed).
    pub fn as_sql(&self) -> &str {
        &self.raw
    }

    /// The qualifier part (`u` in `u.id`), if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The bare column name (`id` in `u.id`).
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ref_plain() {
        let t = TableRef::parse("users").unwrap();
        assert_eq!(t.to_sql(), "users");
        assert_eq!(t.alias, None);
    }

    #[test]
    fn table_ref_with_as_alias() {
        let t = TableRef::parse("users as u").unwrap();
        assert_eq!(t.table, "users");
        assert_eq!(t.alias.as_deref(), Some("u"));
        assert_eq!(t.to_sql(), "users AS u");
    }

    #[test]
    fn table_ref_implicit_alias() {
        let t = TableRef::parse("users u").unwrap();
        assert_eq!(t.to_sql(), "users AS u");
    }

    #[test]
    fn table_ref_schema_qualified() {
        let t = TableRef::parse("public.users AS u").unwrap();
        assert_eq!(t.to_sql(), "public.users AS u");
    }

    #[test]
    fn table_ref_rejects_garbage() {
        assert!(TableRef::parse("").is_err());
        assert!(TableRef::parse("users; DROP TABLE x").is_err());
        assert!(TableRef::parse("1users").is_err());
    }

    #[test]
    fn column_token_bare() {
        let c = ColumnToken::parse("id").unwrap();
        assert_eq!(c.as_sql(), "id");
        assert_eq!(c.qualifier(), None);
        assert_eq!(c.name(), "id");
    }

    #[test]
    fn column_token_qualified() {
        let c = ColumnToken::parse("u.id").unwrap();
        assert_eq!(c.as_sql(), "u.id");
        assert_eq!(c.qualifier(), Some("u"));
        assert_eq!(c.name(), "id");
    }

    #[test]
    fn column_token_with_output_alias() {
        let c = ColumnToken::parse("name as full_name").unwrap();
        assert_eq!(c.as_sql(), "name as full_name");
        assert_eq!(c.name(), "name");
    }

    #[test]
    fn column_token_rejects_garbage() {
        assert!(ColumnToken::parse("a b").is_err());
        assert!(ColumnToken::parse("id = 1").is_err());
        assert!(ColumnToken::parse("").is_err());
    }
}
