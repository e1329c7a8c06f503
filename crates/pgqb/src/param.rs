//! Parameter sink and compiled statement output.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Accumulates bind values in emission order and assigns each its 1-based
/// positional placeholder.
///
/// One sink lives for the duration of a single compilation; an index handed
/// out is never renumbered or removed.
#[derive(Debug, Default)]
pub struct ParamSink {
    values: Vec<Value>,
}

impl ParamSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value and return its 1-based placeholder index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Add a value and return its rendered placeholder token (`"$n"`).
    pub fn placeholder(&mut self, value: Value) -> String {
        format!("${}", self.push(value))
    }

    /// Number of values pushed so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the sink is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The accumulated values; index `i` corresponds to placeholder `$i+1`.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the sink, yielding the final ordered parameter array.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// The result of compiling a query: SQL text with `$1..$n` placeholders and
/// the matching ordered parameter array.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// Final SQL text.
    pub sql: String,
    /// Bind values; `params[k-1]` corresponds to `$k`.
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// Get parameters as references for tokio-postgres extended-query
    /// binding.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_placeholders() {
        let mut sink = ParamSink::new();
        assert_eq!(sink.placeholder(Value::Int(1)), "$1");
        assert_eq!(sink.placeholder(Value::Int(2)), "$2");
        assert_eq!(sink.placeholder(Value::Text("x".into())), "$3");
        assert_eq!(
            sink.into_values(),
            vec![Value::Int(1), Value::Int(2), Value::Text("x".into())]
        );
    }

    #[test]
    fn params_ref_matches_len() {
        let built = BuiltQuery::new("SELECT $1".into(), vec![Value::Bool(true)]);
        assert_eq!(built.params_ref().len(), 1);
    }
}
