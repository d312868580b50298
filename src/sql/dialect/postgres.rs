//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used by search queries:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - `jsonb ->> 'key'` for custom-field extraction
//! - NULLS FIRST/LAST

use super::helpers;
use super::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn emit_json_text(&self, target: &TokenStream, key: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.lparen()
            .append(target)
            .space()
            .push(Token::JsonTextArrow)
            .space()
            .push(Token::LitString(key.into()))
            .rparen();
        ts
    }
}
