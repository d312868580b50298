//! SQL generation module.
//!
//! A type-safe SQL builder that renders search specifications to
//! PostgreSQL, MySQL or SQLite. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_when, col, count_star, func, json_text, lit_bool, lit_float, lit_int, lit_null,
    lit_str, lower, star, table_col, BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use query::{LimitOffset, NullsOrder, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};
