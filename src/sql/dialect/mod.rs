//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the dialect
//! differences that matter to tenant-scoped search queries:
//!
//! - Identifier quoting: `"` (PostgreSQL/SQLite), `` ` `` (MySQL)
//! - String literal escaping (MySQL treats backslash as an escape)
//! - Boolean literals: true/false vs 1/0
//! - Extracting a custom field from the per-record JSON bag as text
//! - NULLS FIRST/LAST support
//!
//! # Usage
//!
//! ```ignore
//! use crm_query::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("accounts");  // "accounts"
//! ```
//!
//! | Feature | PostgreSQL | MySQL | SQLite |
//! |---------|-----------|-------|--------|
//! | JSON text extraction | `->>` | `JSON_UNQUOTE(JSON_EXTRACT())` | `CAST(JSON_EXTRACT() AS TEXT)` |
//! | NULLS FIRST/LAST | ✓ | ❌ (emulated) | 3.30+ |
//! | Boolean literals | true/false | 1/0 | 1/0 |

pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::token::TokenStream;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// Single quotes with `''` for escaping. MySQL overrides this to also
    /// escape backslashes.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET clause.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    // =========================================================================
    // NULLS Ordering
    // =========================================================================

    /// Whether this dialect supports NULLS FIRST/LAST in ORDER BY.
    ///
    /// Where it doesn't, the query builder emulates it with an extra
    /// `expr IS NULL` sort key.
    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    // =========================================================================
    // JSON
    // =========================================================================

    /// Extract `key` from the JSON document `target` as text.
    ///
    /// `key` must already be validated as a plain identifier; it is embedded
    /// in a JSON path literal.
    fn emit_json_text(&self, target: &TokenStream, key: &str) -> TokenStream;
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn supports_nulls_ordering(&self) -> bool {
        self.dialect().supports_nulls_ordering()
    }

    fn emit_json_text(&self, target: &TokenStream, key: &str) -> TokenStream {
        self.dialect().emit_json_text(target, key)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unsupported dialect: {other}")),
        }
    }
}
