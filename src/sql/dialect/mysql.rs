//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - Backslash is an escape character inside string literals
//! - `JSON_UNQUOTE(JSON_EXTRACT(...))` for JSON text
//! - No NULLS FIRST/LAST

use super::helpers;
use super::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn emit_json_text(&self, target: &TokenStream, key: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName("JSON_UNQUOTE".into()))
            .lparen()
            .append(&helpers::emit_json_extract("JSON_EXTRACT", target, key))
            .rparen();
        ts
    }
}
