//! Predicate expression tree for WHERE clauses.
//!
//! [`Expr`] is a tagged union: leaves are single conditions over a column,
//! `And`/`Or`/`Not` combine child nodes. Rendering walks the tree
//! depth-first, left-to-right, pushing every literal operand into the
//! [`ParamSink`] as it is encountered, so placeholder numbering always
//! matches the emitted parameter array.

use crate::alias::AliasRegistry;
use crate::error::{QbError, QbResult};
use crate::param::ParamSink;
use crate::value::Value;

/// Pattern-match operator keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOp {
    Like,
    ILike,
    NotLike,
    NotILike,
}

impl PatternOp {
    fn as_sql(self) -> &'static str {
        match self {
            PatternOp::Like => "LIKE",
            PatternOp::ILike => "ILIKE",
            PatternOp::NotLike => "NOT LIKE",
            PatternOp::NotILike => "NOT ILIKE",
        }
    }
}

/// Postgres array-column predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayPredicate {
    /// `col @> ARRAY[...]`
    Contains(Vec<Value>),
    /// `col <@ ARRAY[...]`
    ContainedBy(Vec<Value>),
    /// `col && ARRAY[...]`
    Overlaps(Vec<Value>),
    /// `$n = ANY(col)`
    HasAny(Value),
    /// `$n = ALL(col)`
    HasAll(Value),
    /// `array_length(col,1) OP $n`
    Length { op: &'static str, value: Value },
    /// `col[i] OP $n`
    ElementAt {
        index: i32,
        op: &'static str,
        value: Value,
    },
}

/// JSONB-column predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonbPredicate {
    /// `col @> $n::jsonb`
    Contains(Value),
    /// `col <@ $n::jsonb`
    ContainedBy(Value),
    /// `col ? $n`
    HasKey(Value),
    /// `col ?& array[...]`
    HasAllKeys(Vec<Value>),
    /// `col ?| array[...]`
    HasAnyKey(Vec<Value>),
    /// `col->'a'->>'b' OP $n`
    PathCmp {
        path: Vec<String>,
        op: &'static str,
        value: Value,
    },
}

/// One node of the WHERE predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// AND group; always parenthesized when rendered.
    And(Vec<Expr>),
    /// OR group; always parenthesized when rendered.
    Or(Vec<Expr>),
    /// Negation of the inner expression.
    Not(Box<Expr>),
    /// `column OP $n`
    Compare {
        column: String,
        op: &'static str,
        value: Value,
    },
    /// `column LIKE/ILIKE/... $n`
    Pattern {
        column: String,
        op: PatternOp,
        pattern: Value,
    },
    /// `column IS [NOT] NULL`
    NullCheck { column: String, negated: bool },
    /// `column [NOT] IN (...)`; an empty list renders `IN ()` with zero
    /// placeholders (always false), which is intentional boundary behavior.
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// Array-operator condition.
    ArrayOp { column: String, op: ArrayPredicate },
    /// JSONB-operator condition.
    JsonbOp { column: String, op: JsonbPredicate },
}

fn comparison_op(op: &str) -> Option<&'static str> {
    match op {
        "=" => Some("="),
        "!=" => Some("!="),
        "<>" => Some("<>"),
        ">" => Some(">"),
        ">=" => Some(">="),
        "<" => Some("<"),
        "<=" => Some("<="),
        _ => None,
    }
}

impl Expr {
    // ==================== Logical combinators ====================

    /// AND over a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// OR over a list of expressions.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Negate an expression.
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    // ==================== Comparison leaves ====================

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "=", value)
    }

    /// `column != value`
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "!=", value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">", value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">=", value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<", value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<=", value)
    }

    fn compare(column: impl Into<String>, op: &'static str, value: impl Into<Value>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a condition from a caller-supplied operator string.
    ///
    /// Accepts the comparison operators (`=`, `!=`, `<>`, `>`, `>=`, `<`,
    /// `<=`), the pattern operators (`like`, `ilike`, `not like`,
    /// `not ilike`), and `in` / `not in` (which require a
    /// [`Value::Array`] operand).
    pub fn cmp(column: impl Into<String>, op: &str, value: impl Into<Value>) -> QbResult<Self> {
        let column = column.into();
        let value = value.into();
        if let Some(op) = comparison_op(op) {
            return Ok(Expr::Compare { column, op, value });
        }
        let pattern_op = match op.to_ascii_lowercase().as_str() {
            "like" => Some(PatternOp::Like),
            "ilike" => Some(PatternOp::ILike),
            "not like" => Some(PatternOp::NotLike),
            "not ilike" => Some(PatternOp::NotILike),
            _ => None,
        };
        if let Some(op) = pattern_op {
            return Ok(Expr::Pattern {
                column,
                op,
                pattern: value,
            });
        }
        match op.to_ascii_lowercase().as_str() {
            "in" | "not in" => {
                let negated = op.eq_ignore_ascii_case("not in");
                match value {
                    Value::Array(values) => Ok(Expr::InList {
                        column,
                        values,
                        negated,
                    }),
                    _ => Err(QbError::MalformedInList(op.to_string())),
                }
            }
            _ => Err(QbError::validation(format!("unknown operator: '{op}'"))),
        }
    }

    // ==================== Pattern leaves ====================

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::pattern(column, PatternOp::Like, pattern)
    }

    /// `column ILIKE pattern` (case-insensitive)
    pub fn ilike(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::pattern(column, PatternOp::ILike, pattern)
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::pattern(column, PatternOp::NotLike, pattern)
    }

    /// `column NOT ILIKE pattern`
    pub fn not_ilike(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::pattern(column, PatternOp::NotILike, pattern)
    }

    fn pattern(column: impl Into<String>, op: PatternOp, pattern: impl Into<Value>) -> Self {
        Expr::Pattern {
            column: column.into(),
            op,
            pattern: pattern.into(),
        }
    }

    // ==================== NULL checks ====================

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            negated: false,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            negated: true,
        }
    }

    // ==================== Set membership ====================

    /// `column IN (values...)`
    pub fn in_list<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`
    pub fn not_in<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    // ==================== Array operators ====================

    /// `column @> ARRAY[values...]`
    pub fn array_contains<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Self::array_op(
            column,
            ArrayPredicate::Contains(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `column <@ ARRAY[values...]`
    pub fn array_contained_by<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Self::array_op(
            column,
            ArrayPredicate::ContainedBy(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `column && ARRAY[values...]`
    pub fn array_overlaps<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Self::array_op(
            column,
            ArrayPredicate::Overlaps(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `value = ANY(column)`
    pub fn array_has_any(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::array_op(column, ArrayPredicate::HasAny(value.into()))
    }

    /// `value = ALL(column)`
    pub fn array_has_all(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::array_op(column, ArrayPredicate::HasAll(value.into()))
    }

    /// `array_length(column,1) OP value`
    pub fn array_length(
        column: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> QbResult<Self> {
        let op = comparison_op(op)
            .ok_or_else(|| QbError::validation(format!("unknown operator: '{op}'")))?;
        Ok(Self::array_op(
            column,
            ArrayPredicate::Length {
                op,
                value: value.into(),
            },
        ))
    }

    /// `column[index] OP value`
    pub fn array_element_at(
        column: impl Into<String>,
        index: i32,
        op: &str,
        value: impl Into<Value>,
    ) -> QbResult<Self> {
        let op = comparison_op(op)
            .ok_or_else(|| QbError::validation(format!("unknown operator: '{op}'")))?;
        Ok(Self::array_op(
            column,
            ArrayPredicate::ElementAt {
                index,
                op,
                value: value.into(),
            },
        ))
    }

    fn array_op(column: impl Into<String>, op: ArrayPredicate) -> Self {
        Expr::ArrayOp {
            column: column.into(),
            op,
        }
    }

    // ==================== JSONB operators ====================

    /// `column @> value::jsonb`
    pub fn jsonb_contains(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::jsonb_op(column, JsonbPredicate::Contains(value.into()))
    }

    /// `column <@ value::jsonb`
    pub fn jsonb_contained_by(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::jsonb_op(column, JsonbPredicate::ContainedBy(value.into()))
    }

    /// `column ? key`
    pub fn jsonb_has_key(column: impl Into<String>, key: impl Into<Value>) -> Self {
        Self::jsonb_op(column, JsonbPredicate::HasKey(key.into()))
    }

    /// `column ?& array[keys...]`
    pub fn jsonb_has_all_keys<T: Into<Value>>(column: impl Into<String>, keys: Vec<T>) -> Self {
        Self::jsonb_op(
            column,
            JsonbPredicate::HasAllKeys(keys.into_iter().map(Into::into).collect()),
        )
    }

    /// `column ?| array[keys...]`
    pub fn jsonb_has_any_key<T: Into<Value>>(column: impl Into<String>, keys: Vec<T>) -> Self {
        Self::jsonb_op(
            column,
            JsonbPredicate::HasAnyKey(keys.into_iter().map(Into::into).collect()),
        )
    }

    /// Field-path comparison: `column->'a'->>'b' OP value`.
    ///
    /// All but the last path segment use `->`; the last uses `->>` (text
    /// extraction) for the terminal comparison.
    pub fn jsonb_path<S: Into<String>>(
        column: impl Into<String>,
        path: Vec<S>,
        op: &str,
        value: impl Into<Value>,
    ) -> QbResult<Self> {
        if path.is_empty() {
            return Err(QbError::validation("jsonb path requires at least one segment"));
        }
        let op = comparison_op(op)
            .ok_or_else(|| QbError::validation(format!("unknown operator: '{op}'")))?;
        Ok(Self::jsonb_op(
            column,
            JsonbPredicate::PathCmp {
                path: path.into_iter().map(Into::into).collect(),
                op,
                value: value.into(),
            },
        ))
    }

    fn jsonb_op(column: impl Into<String>, op: JsonbPredicate) -> Self {
        Expr::JsonbOp {
            column: column.into(),
            op,
        }
    }

    // ==================== Rendering ====================

    /// Render this node to SQL, validating columns against `registry` and
    /// pushing operands into `sink` in encounter order.
    pub fn render(&self, registry: &AliasRegistry, sink: &mut ParamSink) -> QbResult<String> {
        match self {
            Expr::And(children) => Self::render_group(children, " AND ", registry, sink),
            Expr::Or(children) => Self::render_group(children, " OR ", registry, sink),
            Expr::Not(child) => {
                // And/Or parenthesize themselves; leaves stay bare.
                Ok(format!("NOT {}", child.render(registry, sink)?))
            }
            Expr::Compare { column, op, value } => {
                let col = registry.resolve_str(column)?;
                Ok(format!(
                    "{} {} {}",
                    col.as_sql(),
                    op,
                    sink.placeholder(value.clone())
                ))
            }
            Expr::Pattern {
                column,
                op,
                pattern,
            } => {
                let col = registry.resolve_str(column)?;
                Ok(format!(
                    "{} {} {}",
                    col.as_sql(),
                    op.as_sql(),
                    sink.placeholder(pattern.clone())
                ))
            }
            Expr::NullCheck { column, negated } => {
                let col = registry.resolve_str(column)?;
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!("{} {}", col.as_sql(), keyword))
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let col = registry.resolve_str(column)?;
                let op = if *negated { "NOT IN" } else { "IN" };
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| sink.placeholder(v.clone()))
                    .collect();
                Ok(format!("{} {} ({})", col.as_sql(), op, placeholders.join(", ")))
            }
            Expr::ArrayOp { column, op } => Self::render_array_op(column, op, registry, sink),
            Expr::JsonbOp { column, op } => Self::render_jsonb_op(column, op, registry, sink),
        }
    }

    fn render_group(
        children: &[Expr],
        separator: &str,
        registry: &AliasRegistry,
        sink: &mut ParamSink,
    ) -> QbResult<String> {
        if children.is_empty() {
            return Err(QbError::EmptyLogicalGroup);
        }
        let parts: Vec<String> = children
            .iter()
            .map(|c| c.render(registry, sink))
            .collect::<QbResult<_>>()?;
        Ok(format!("({})", parts.join(separator)))
    }

    fn render_array_op(
        column: &str,
        op: &ArrayPredicate,
        registry: &AliasRegistry,
        sink: &mut ParamSink,
    ) -> QbResult<String> {
        let col = registry.resolve_str(column)?;
        let col = col.as_sql();
        let rendered = match op {
            ArrayPredicate::Contains(vals) => {
                format!("{} @> ARRAY[{}]", col, Self::placeholder_list(vals, sink))
            }
            ArrayPredicate::ContainedBy(vals) => {
                format!("{} <@ ARRAY[{}]", col, Self::placeholder_list(vals, sink))
            }
            ArrayPredicate::Overlaps(vals) => {
                format!("{} && ARRAY[{}]", col, Self::placeholder_list(vals, sink))
            }
            ArrayPredicate::HasAny(value) => {
                format!("{} = ANY({})", sink.placeholder(value.clone()), col)
            }
            ArrayPredicate::HasAll(value) => {
                format!("{} = ALL({})", sink.placeholder(value.clone()), col)
            }
            ArrayPredicate::Length { op, value } => {
                format!(
                    "array_length({},1) {} {}",
                    col,
                    op,
                    sink.placeholder(value.clone())
                )
            }
            ArrayPredicate::ElementAt { index, op, value } => {
                format!(
                    "{}[{}] {} {}",
                    col,
                    index,
                    op,
                    sink.placeholder(value.clone())
                )
            }
        };
        Ok(rendered)
    }

    fn render_jsonb_op(
        column: &str,
        op: &JsonbPredicate,
        registry: &AliasRegistry,
        sink: &mut ParamSink,
    ) -> QbResult<String> {
        let col = registry.resolve_str(column)?;
        let col = col.as_sql();
        let rendered = match op {
            JsonbPredicate::Contains(value) => {
                format!("{} @> {}::jsonb", col, sink.placeholder(value.clone()))
            }
            JsonbPredicate::ContainedBy(value) => {
                format!("{} <@ {}::jsonb", col, sink.placeholder(value.clone()))
            }
            JsonbPredicate::HasKey(key) => {
                format!("{} ? {}", col, sink.placeholder(key.clone()))
            }
            JsonbPredicate::HasAllKeys(keys) => {
                format!("{} ?& array[{}]", col, Self::placeholder_list(keys, sink))
            }
            JsonbPredicate::HasAnyKey(keys) => {
                format!("{} ?| array[{}]", col, Self::placeholder_list(keys, sink))
            }
            JsonbPredicate::PathCmp { path, op, value } => {
                let mut accessor = String::from(col);
                for (i, segment) in path.iter().enumerate() {
                    let arrow = if i + 1 == path.len() { "->>" } else { "->" };
                    accessor.push_str(arrow);
                    accessor.push('\'');
                    accessor.push_str(&segment.replace('\'', "''"));
                    accessor.push('\'');
                }
                format!("{} {} {}", accessor, op, sink.placeholder(value.clone()))
            }
        };
        Ok(rendered)
    }

    fn placeholder_list(values: &[Value], sink: &mut ParamSink) -> String {
        values
            .iter()
            .map(|v| sink.placeholder(v.clone()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Visit every column token referenced by this tree (for the schema
    /// validation pass).
    pub fn visit_columns<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    child.visit_columns(visit);
                }
            }
            Expr::Not(child) => child.visit_columns(visit),
            Expr::Compare { column, .. }
            | Expr::Pattern { column, .. }
            | Expr::NullCheck { column, .. }
            | Expr::InList { column, .. }
            | Expr::ArrayOp { column, .. }
            | Expr::JsonbOp { column, .. } => visit(column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::TableRef;

    fn registry() -> AliasRegistry {
        let users = TableRef::parse("users").unwrap();
        AliasRegistry::new(&[&users])
    }

    fn render(expr: &Expr) -> (String, Vec<Value>) {
        let mut sink = ParamSink::new();
        let sql = expr.render(&registry(), &mut sink).unwrap();
        (sql, sink.into_values())
    }

    #[test]
    fn simple_eq() {
        let (sql, params) = render(&Expr::eq("name", "alice"));
        assert_eq!(sql, "name = $1");
        assert_eq!(params, vec![Value::Text("alice".into())]);
    }

    #[test]
    fn cmp_accepts_both_inequality_spellings() {
        let (sql, _) = render(&Expr::cmp("a", "!=", 1).unwrap());
        assert_eq!(sql, "a != $1");
        let (sql, _) = render(&Expr::cmp("a", "<>", 1).unwrap());
        assert_eq!(sql, "a <> $1");
    }

    #[test]
    fn cmp_rejects_unknown_operator() {
        assert!(matches!(
            Expr::cmp("a", "~~", 1),
            Err(QbError::Validation(_))
        ));
    }

    #[test]
    fn cmp_in_requires_array() {
        let err = Expr::cmp("id", "in", 5).unwrap_err();
        assert!(matches!(err, QbError::MalformedInList(_)));
        assert!(Expr::cmp("id", "in", vec![1, 2]).is_ok());
    }

    #[test]
    fn and_group_parenthesizes() {
        let expr = Expr::and(vec![Expr::eq("status", "active"), Expr::gt("age", 18)]);
        let (sql, params) = render(&expr);
        assert_eq!(sql, "(status = $1 AND age > $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn nested_and_or() {
        let expr = Expr::and(vec![
            Expr::gt("id", 0),
            Expr::or(vec![
                Expr::eq("active", true),
                Expr::like("name", "Admin%"),
            ]),
        ]);
        let (sql, params) = render(&expr);
        assert_eq!(sql, "(id > $1 AND (active = $2 OR name LIKE $3))");
        assert_eq!(
            params,
            vec![
                Value::Int(0),
                Value::Bool(true),
                Value::Text("Admin%".into())
            ]
        );
    }

    #[test]
    fn empty_logical_group_errors() {
        let mut sink = ParamSink::new();
        assert!(matches!(
            Expr::and(vec![]).render(&registry(), &mut sink),
            Err(QbError::EmptyLogicalGroup)
        ));
        assert!(matches!(
            Expr::or(vec![]).render(&registry(), &mut sink),
            Err(QbError::EmptyLogicalGroup)
        ));
    }

    #[test]
    fn not_wraps_logical_but_not_leaves() {
        let (sql, _) = render(&Expr::not(Expr::eq("banned", true)));
        assert_eq!(sql, "NOT banned = $1");

        let (sql, _) = render(&Expr::not(Expr::and(vec![
            Expr::eq("a", 1),
            Expr::eq("b", 2),
        ])));
        assert_eq!(sql, "NOT (a = $1 AND b = $2)");
    }

    #[test]
    fn null_checks_bind_nothing() {
        let (sql, params) = render(&Expr::is_null("deleted_at"));
        assert_eq!(sql, "deleted_at IS NULL");
        assert!(params.is_empty());

        let (sql, _) = render(&Expr::is_not_null("deleted_at"));
        assert_eq!(sql, "deleted_at IS NOT NULL");
    }

    #[test]
    fn in_list_placeholders() {
        let (sql, params) = render(&Expr::in_list("id", vec![1, 2, 3]));
        assert_eq!(sql, "id IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_list_renders_empty_parens() {
        let (sql, params) = render(&Expr::in_list("id", Vec::<i32>::new()));
        assert_eq!(sql, "id IN ()");
        assert!(params.is_empty());

        let (sql, params) = render(&Expr::not_in("id", Vec::<i32>::new()));
        assert_eq!(sql, "id NOT IN ()");
        assert!(params.is_empty());
    }

    #[test]
    fn array_operators() {
        let (sql, params) = render(&Expr::array_contains("tags", vec!["a", "b"]));
        assert_eq!(sql, "tags @> ARRAY[$1, $2]");
        assert_eq!(params.len(), 2);

        let (sql, _) = render(&Expr::array_contained_by("tags", vec!["a"]));
        assert_eq!(sql, "tags <@ ARRAY[$1]");

        let (sql, _) = render(&Expr::array_overlaps("tags", vec!["a", "b"]));
        assert_eq!(sql, "tags && ARRAY[$1, $2]");

        let (sql, params) = render(&Expr::array_has_any("tags", "admin"));
        assert_eq!(sql, "$1 = ANY(tags)");
        assert_eq!(params, vec![Value::Text("admin".into())]);

        let (sql, _) = render(&Expr::array_has_all("scores", 10));
        assert_eq!(sql, "$1 = ALL(scores)");

        let (sql, _) = render(&Expr::array_length("tags", ">", 2).unwrap());
        assert_eq!(sql, "array_length(tags,1) > $1");

        let (sql, _) = render(&Expr::array_element_at("tags", 1, "=", "first").unwrap());
        assert_eq!(sql, "tags[1] = $1");
    }

    #[test]
    fn jsonb_operators() {
        let doc = serde_json::json!({"role": "admin"});
        let (sql, params) = render(&Expr::jsonb_contains("meta", doc.clone()));
        assert_eq!(sql, "meta @> $1::jsonb");
        assert_eq!(params, vec![Value::Json(doc)]);

        let (sql, _) = render(&Expr::jsonb_contained_by("meta", serde_json::json!({})));
        assert_eq!(sql, "meta <@ $1::jsonb");

        let (sql, _) = render(&Expr::jsonb_has_key("meta", "role"));
        assert_eq!(sql, "meta ? $1");

        let (sql, _) = render(&Expr::jsonb_has_all_keys("meta", vec!["a", "b"]));
        assert_eq!(sql, "meta ?& array[$1, $2]");

        let (sql, _) = render(&Expr::jsonb_has_any_key("meta", vec!["a", "b"]));
        assert_eq!(sql, "meta ?| array[$1, $2]");
    }

    #[test]
    fn jsonb_path_chain() {
        let expr = Expr::jsonb_path("meta", vec!["prefs", "theme"], "=", "dark").unwrap();
        let (sql, params) = render(&expr);
        assert_eq!(sql, "meta->'prefs'->>'theme' = $1");
        assert_eq!(params, vec![Value::Text("dark".into())]);

        let expr = Expr::jsonb_path("meta", vec!["theme"], "=", "dark").unwrap();
        let (sql, _) = render(&expr);
        assert_eq!(sql, "meta->>'theme' = $1");
    }

    #[test]
    fn jsonb_path_rejects_empty() {
        assert!(Expr::jsonb_path("meta", Vec::<&str>::new(), "=", 1).is_err());
    }

    #[test]
    fn depth_first_parameter_order() {
        let expr = Expr::or(vec![
            Expr::and(vec![Expr::eq("a", 1), Expr::eq("b", 2)]),
            Expr::eq("c", 3),
        ]);
        let (sql, params) = render(&expr);
        assert_eq!(sql, "((a = $1 AND b = $2) OR c = $3)");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn aliased_table_rejected_inside_expr() {
        let users = TableRef::parse("users as u").unwrap();
        let reg = AliasRegistry::new(&[&users]);
        let mut sink = ParamSink::new();
        let err = Expr::eq("users.id", 1).render(&reg, &mut sink).unwrap_err();
        assert!(err.is_alias_exclusivity());
        assert!(Expr::eq("u.id", 1).render(&reg, &mut sink).is_ok());
    }
}
