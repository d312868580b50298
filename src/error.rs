//! Caller-input errors raised while turning a search request into a query.
//!
//! Every variant is detected before the store is touched and none of them
//! is retriable: the API layer maps them to a 400-class response.

use thiserror::Error;

use crate::criteria::ValueKind;
use crate::operator::Operator;

/// Result type for specification building.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors produced while resolving, validating and composing criteria.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The path does not name a field of the entity.
    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// The path crosses more than one relationship.
    #[error("field path '{path}' has {hops} relationship hops; at most one is supported")]
    UnsupportedPathDepth { path: String, hops: usize },

    /// The operator cannot be applied to the attribute's value kind.
    #[error("operator {operator} cannot be applied to {kind} field '{field}'")]
    UnsupportedOperatorForType {
        operator: Operator,
        field: String,
        kind: ValueKind,
    },

    /// Arity or value-type mismatch.
    #[error("malformed filter on '{field}': {reason}")]
    MalformedFilter { field: String, reason: String },

    /// Bad page, limit or sort field.
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),
}

impl QueryError {
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::UnsupportedPathDepth { .. } => "UNSUPPORTED_PATH_DEPTH",
            Self::UnsupportedOperatorForType { .. } => "UNSUPPORTED_OPERATOR_FOR_TYPE",
            Self::MalformedFilter { .. } => "MALFORMED_FILTER",
            Self::InvalidPageRequest(_) => "INVALID_PAGE_REQUEST",
        }
    }

    /// All variants are caller-input errors.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Malformed criteria never become valid by retrying.
    pub fn is_retriable(&self) -> bool {
        false
    }
}
