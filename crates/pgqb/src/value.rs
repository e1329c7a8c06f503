//! Dynamic parameter values.
//!
//! Builder calls carry their operands as [`Value`]s; compilation moves them
//! into the final parameter array in placeholder order. `Value` is
//! comparable so tests can assert entire parameter arrays, and implements
//! [`ToSql`] so a [`BuiltQuery`](crate::BuiltQuery) binds directly to any
//! tokio-postgres client.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A dynamically-typed SQL bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL (also stands in for a missing key in a bulk-INSERT row)
    Null,
    /// BOOLEAN
    Bool(bool),
    /// SMALLINT
    SmallInt(i16),
    /// INTEGER
    Int(i32),
    /// BIGINT
    BigInt(i64),
    /// DOUBLE PRECISION
    Double(f64),
    /// TEXT
    Text(String),
    /// BYTEA
    Bytes(Vec<u8>),
    /// UUID
    Uuid(Uuid),
    /// DATE
    Date(NaiveDate),
    /// TIMESTAMP
    Timestamp(NaiveDateTime),
    /// TIMESTAMPTZ
    TimestampTz(DateTime<Utc>),
    /// JSON / JSONB
    Json(serde_json::Value),
    /// A homogeneous array (Postgres array binding)
    Array(Vec<Value>),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Create a BYTEA value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Serialize any `serde::Serialize` type into a JSON value.
    pub fn json<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    /// The SQL type name this value binds as, for diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Double(_) => "DOUBLE PRECISION",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Uuid(_) => "UUID",
            Value::Date(_) => "DATE",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::TimestampTz(_) => "TIMESTAMPTZ",
            Value::Json(_) => "JSONB",
            Value::Array(_) => "ARRAY",
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::SmallInt(v) => v.to_sql(ty, out),
            Value::Int(v) => v.to_sql(ty, out),
            Value::BigInt(v) => v.to_sql(ty, out),
            Value::Double(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::TimestampTz(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::Array(vs) => vs.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Type compatibility is decided per variant at bind time.
        true
    }

    to_sql_checked!();
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
