//! SQLite SQL dialect.
//!
//! SQLite is what the reference record store and the test suite execute
//! against:
//! - ANSI identifier quoting (`"`)
//! - No boolean type, 1/0
//! - `JSON_EXTRACT` returns typed values, so the result is cast to TEXT;
//!   JSON booleans would come back as 1/0 and are spelled `true`/`false`
//!   to match the other dialects
//! - NULLS FIRST/LAST since 3.30

use super::helpers;
use super::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_json_text(&self, target: &TokenStream, key: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Case)
            .space()
            .append(&helpers::emit_json_extract("JSON_TYPE", target, key));
        for word in ["true", "false"] {
            ts.space()
                .push(Token::When)
                .space()
                .push(Token::LitString(word.into()))
                .space()
                .push(Token::Then)
                .space()
                .push(Token::LitString(word.into()));
        }
        ts.space()
            .push(Token::Else)
            .space()
            .push(Token::Cast)
            .lparen()
            .append(&helpers::emit_json_extract("JSON_EXTRACT", target, key))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Text)
            .rparen()
            .space()
            .push(Token::End);
        ts
    }
}
