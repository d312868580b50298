//! Shape of the compiled SQL in each dialect.

use crm_query::compile::{compile_search, CompileOptions, CompiledSearch};
use crm_query::{Catalog, Dialect, SearchRequest, TenantId};
use insta::assert_snapshot;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

fn compile(entity: &str, json: &str, dialect: Dialect) -> CompiledSearch {
    let catalog = Catalog::crm();
    let request: SearchRequest = serde_json::from_str(json).unwrap();
    compile_search(
        &catalog,
        entity,
        &TenantId::new("t1"),
        &request,
        &CompileOptions::default().with_dialect(dialect),
    )
    .unwrap()
}

fn assert_parses(sql: &str, dialect: Dialect) {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
    };
    if let Err(e) = Parser::parse_sql(&*parser_dialect, sql) {
        panic!("invalid {} SQL: {}\n{}", dialect, e, sql);
    }
}

const LEAD_SCORE: &str = r#"{
    "filters": [{"field": "leadScore", "operator": "GREATER_THAN", "value": 80}],
    "sort": [{"field": "leadScore", "direction": "DESC"}],
    "limit": 10
}"#;

#[test]
fn test_postgres_select() {
    let out = compile("lead", LEAD_SCORE, Dialect::Postgres);
    assert_snapshot!(out.select_sql, @r#"
    SELECT
      *
    FROM "leads"
    WHERE "tenant_id" = 't1' AND "lead_score" > 80
    ORDER BY "lead_score" DESC, "id" ASC
    LIMIT 10 OFFSET 0
    "#);
    assert_snapshot!(out.count_sql, @r#"
    SELECT
      COUNT(*) AS "total"
    FROM "leads"
    WHERE "tenant_id" = 't1' AND "lead_score" > 80
    "#);
}

#[test]
fn test_mysql_select() {
    let out = compile("lead", LEAD_SCORE, Dialect::MySql);
    assert_snapshot!(out.select_sql, @r#"
    SELECT
      *
    FROM `leads`
    WHERE `tenant_id` = 't1' AND `lead_score` > 80
    ORDER BY `lead_score` DESC, `id` ASC
    LIMIT 10 OFFSET 0
    "#);
}

#[test]
fn test_custom_field_extraction_per_dialect() {
    let json = r#"{"customFieldsQuery": {"tier": "gold"}}"#;

    let pg = compile("account", json, Dialect::Postgres);
    assert!(pg.select_sql.contains(r#"("custom_fields" ->> 'tier') = 'gold'"#), "{}", pg.select_sql);

    let my = compile("account", json, Dialect::MySql);
    assert!(
        my.select_sql.contains("JSON_UNQUOTE(JSON_EXTRACT(`custom_fields`, '$.tier')) = 'gold'"),
        "{}",
        my.select_sql
    );

    let lite = compile("account", json, Dialect::Sqlite);
    assert!(
        lite.select_sql.contains(r#"CAST(JSON_EXTRACT("custom_fields", '$.tier') AS TEXT) END = 'gold'"#),
        "{}",
        lite.select_sql
    );
}

#[test]
fn test_tenant_guard_leads_every_query() {
    let json = r#"{
        "search": "o'brien",
        "filters": [
            {"field": "account.industry", "operator": "IN", "values": ["Retail", "Energy"]},
            {"field": "email", "operator": "IS_NOT_NULL"}
        ],
        "related": {"relatedRecordId": "A"}
    }"#;

    for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
        let out = compile("contact", json, dialect);
        let guard = match dialect {
            Dialect::MySql => "WHERE `tenant_id` = 't1' AND ",
            _ => "WHERE \"tenant_id\" = 't1' AND ",
        };
        assert!(out.select_sql.contains(guard), "{}", out.select_sql);
        assert!(out.count_sql.contains(guard), "{}", out.count_sql);
        assert_parses(&out.select_sql, dialect);
        assert_parses(&out.count_sql, dialect);
    }
}

#[test]
fn test_mysql_escapes_backslashes() {
    let json = r#"{"filters": [{"field": "name", "operator": "EQUALS", "value": "a\\b"}]}"#;
    let out = compile("account", json, Dialect::MySql);
    assert!(out.select_sql.contains(r"`name` = 'a\\b'"), "{}", out.select_sql);

    let out = compile("account", json, Dialect::Postgres);
    assert!(out.select_sql.contains(r#""name" = 'a\b'"#), "{}", out.select_sql);
}
