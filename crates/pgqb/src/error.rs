//! Error types for pgqb.

use thiserror::Error;

/// Result type alias for pgqb operations.
pub type QbResult<T> = Result<T, QbError>;

/// Errors raised while constructing or compiling a query.
///
/// Everything here is raised synchronously, at builder-call or [`build`]
/// time. Execution-time failures (constraint violations, connection errors)
/// belong to whatever client the compiled statement is handed to.
///
/// [`build`]: crate::SelectQb::build
#[derive(Debug, Clone, Error)]
pub enum QbError {
    /// A column token's qualifier does not match any table or alias in the
    /// query's scope.
    #[error("unresolvable column reference: {0}")]
    UnresolvableColumn(String),

    /// A table was referenced by its original name after being aliased.
    #[error("table '{table}' was aliased as '{alias}' and can no longer be referenced by its original name")]
    AliasExclusivity { table: String, alias: String },

    /// `and`/`or` combinator with zero operands.
    #[error("logical combinator requires at least one operand")]
    EmptyLogicalGroup,

    /// `in`/`not in` operator paired with a non-array operand.
    #[error("operator '{0}' requires an array operand")]
    MalformedInList(String),

    /// `on_conflict` finished without a column or constraint target.
    #[error("ON CONFLICT requires a target: call column(), columns() or constraint()")]
    ConflictTargetMissing,

    /// Builder-state validation error (malformed identifier, unknown
    /// operator, INSERT without rows, UPDATE without SET, ...).
    #[error("validation error: {0}")]
    Validation(String),
}

impl QbError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is an alias-exclusivity violation.
    pub fn is_alias_exclusivity(&self) -> bool {
        matches!(self, Self::AliasExclusivity { .. })
    }

    /// Check if this is an unresolvable-column error.
    pub fn is_unresolvable_column(&self) -> bool {
        matches!(self, Self::UnresolvableColumn(_))
    }
}
