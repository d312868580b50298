//! SQLite-backed record store.

use std::path::Path;

use inflector::Inflector;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::{Number, Value as Json};
use tracing::{debug, trace};

use super::{Record, RecordStore, StoreError, StoreResult};
use crate::criteria::{TenantId, ValueKind};
use crate::schema::{Catalog, EntitySchema, RelationshipTableDef};
use crate::sql::query::Query;
use crate::sql::{Dialect, SqlDialect};

const DIALECT: Dialect = Dialect::Sqlite;

/// Wire name of the custom-field bag in stored and fetched records.
pub const CUSTOM_FIELDS_KEY: &str = "customFields";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create a table for every catalog entity, plus the relationship
    /// tables they reference.
    pub fn create_tables(&self, catalog: &Catalog) -> StoreResult<()> {
        let mut link_tables: Vec<&RelationshipTableDef> = Vec::new();
        for entity in catalog.entities() {
            let ddl = entity_ddl(entity);
            debug!(entity = %entity.name, "creating table");
            trace!(sql = %ddl);
            self.conn.execute_batch(&ddl)?;

            if let Some(related) = &entity.related {
                if !link_tables.iter().any(|t| t.table == related.links.table) {
                    link_tables.push(&related.links);
                }
            }
        }
        for links in link_tables {
            let ddl = links_ddl(links);
            trace!(sql = %ddl);
            self.conn.execute_batch(&ddl)?;
        }
        Ok(())
    }

    /// Insert one record for `tenant`.
    ///
    /// Keys are wire field names, foreign keys in camelCase (`accountId`),
    /// or `customFields` holding a JSON object.
    pub fn insert(&self, entity: &EntitySchema, tenant: &TenantId, record: &Record) -> StoreResult<()> {
        let mut columns = vec![entity.tenant_column.clone()];
        let mut values = vec![SqlValue::Text(tenant.as_str().to_string())];

        for (key, value) in record {
            let column = storage_column(entity, key).ok_or_else(|| StoreError::UnknownField {
                entity: entity.name.clone(),
                field: key.clone(),
            })?;
            columns.push(column);
            values.push(to_sql_value(value)?);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            DIALECT.quote_identifier(&entity.table),
            columns
                .iter()
                .map(|c| DIALECT.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        trace!(sql = %sql, "insert");
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Record a link between two records in `links`.
    pub fn link(
        &self,
        links: &RelationshipTableDef,
        tenant: &TenantId,
        from_id: &str,
        to_id: &str,
        relationship_type: &str,
        active: bool,
    ) -> StoreResult<()> {
        let q = |c: &str| DIALECT.quote_identifier(c);
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
            q(&links.table),
            q(&links.tenant_column),
            q(&links.from_column),
            q(&links.to_column),
            q(&links.type_column),
            q(&links.active_column),
        );
        self.conn.execute(
            &sql,
            params![tenant.as_str(), from_id, to_id, relationship_type, active],
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        DIALECT
    }

    fn fetch(&self, entity: &EntitySchema, query: &Query) -> StoreResult<Vec<Record>> {
        let sql = query.to_sql(DIALECT);
        trace!(entity = %entity.name, sql = %sql, "fetch");

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                let (key, value) = read_column(entity, name, row.get_ref(i)?)?;
                record.insert(key, value);
            }
            records.push(record);
        }
        debug!(entity = %entity.name, rows = records.len(), "fetched page");
        Ok(records)
    }

    fn count(&self, query: &Query) -> StoreResult<u64> {
        let sql = query.to_sql(DIALECT);
        trace!(sql = %sql, "count");
        let total: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

fn column_type(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Number => "NUMERIC",
        ValueKind::Boolean => "INTEGER",
        ValueKind::String | ValueKind::Date | ValueKind::Enum => "TEXT",
    }
}

fn entity_ddl(entity: &EntitySchema) -> String {
    let q = |c: &str| DIALECT.quote_identifier(c);
    let mut defs = vec![
        format!("{} TEXT PRIMARY KEY", q(&entity.id_column)),
        format!("{} TEXT NOT NULL", q(&entity.tenant_column)),
    ];
    let mut seen = vec![entity.id_column.as_str(), entity.tenant_column.as_str()];

    for column in &entity.columns {
        if !seen.contains(&column.column.as_str()) {
            defs.push(format!("{} {}", q(&column.column), column_type(column.kind)));
            seen.push(&column.column);
        }
    }
    for rel in &entity.relationships {
        if !seen.contains(&rel.foreign_key.as_str()) {
            defs.push(format!("{} TEXT", q(&rel.foreign_key)));
            seen.push(&rel.foreign_key);
        }
    }
    if let Some(cf) = &entity.custom_fields_column {
        defs.push(format!("{} TEXT", q(cf)));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        q(&entity.table),
        defs.join(", ")
    )
}

fn links_ddl(links: &RelationshipTableDef) -> String {
    let q = |c: &str| DIALECT.quote_identifier(c);
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} TEXT NOT NULL, {} TEXT NOT NULL, {} TEXT NOT NULL, {} TEXT, {} INTEGER NOT NULL DEFAULT 1)",
        q(&links.table),
        q(&links.tenant_column),
        q(&links.from_column),
        q(&links.to_column),
        q(&links.type_column),
        q(&links.active_column),
    )
}

/// Column that stores wire key `key`.
fn storage_column(entity: &EntitySchema, key: &str) -> Option<String> {
    if key == CUSTOM_FIELDS_KEY {
        return entity.custom_fields_column.clone();
    }
    if let Some(column) = entity.find_column(key) {
        return Some(column.column.clone());
    }
    entity
        .relationships
        .iter()
        .find(|r| r.foreign_key.to_camel_case() == key)
        .map(|r| r.foreign_key.clone())
}

fn to_sql_value(value: &Json) -> StoreResult<SqlValue> {
    Ok(match value {
        Json::Null => SqlValue::Null,
        Json::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => SqlValue::Text(s.clone()),
        Json::Array(_) | Json::Object(_) => SqlValue::Text(serde_json::to_string(value)?),
    })
}

/// Map a result column back to its wire key and a JSON value.
fn read_column(entity: &EntitySchema, name: &str, raw: ValueRef<'_>) -> StoreResult<(String, Json)> {
    if entity.custom_fields_column.as_deref() == Some(name) {
        let value = match raw {
            ValueRef::Text(bytes) => serde_json::from_slice(bytes)?,
            _ => Json::Null,
        };
        return Ok((CUSTOM_FIELDS_KEY.to_string(), value));
    }

    let column = entity.columns.iter().find(|c| c.column == name);
    let key = column.map_or_else(|| name.to_camel_case(), |c| c.field.clone());
    let is_bool = column.is_some_and(|c| c.kind == ValueKind::Boolean);

    let value = match raw {
        ValueRef::Null => Json::Null,
        ValueRef::Integer(i) if is_bool => Json::Bool(i != 0),
        ValueRef::Integer(i) => Json::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Json::Null, Json::Number),
        ValueRef::Text(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Json::Null,
    };
    Ok((key, value))
}
