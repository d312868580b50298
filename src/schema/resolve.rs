//! Attribute path resolution.
//!
//! A path is either a field of the entity (`status`), one relationship hop
//! followed by a field of the target (`parentAccount.name`), or a key in
//! the custom-field bag (`customFields.tier`).

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Catalog, ColumnDef, EntitySchema, RelationshipDef};
use crate::error::{QueryError, QueryResult};

/// Path prefix addressing the custom-field bag.
pub const CUSTOM_FIELDS_PREFIX: &str = "customFields.";

static CUSTOM_FIELD_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// What a path resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeRef<'a> {
    Column(&'a ColumnDef),
    Relationship {
        relationship: &'a RelationshipDef,
        target: &'a EntitySchema,
        column: &'a ColumnDef,
    },
    CustomField {
        /// The JSON bag column.
        column: &'a str,
        key: String,
    },
}

impl AttributeRef<'_> {
    /// Whether this addresses the related record's id, which can be
    /// answered from the foreign key without a subquery.
    pub fn is_related_id(&self) -> bool {
        match self {
            AttributeRef::Relationship { target, column, .. } => {
                column.column == target.id_column
            }
            _ => false,
        }
    }
}

impl Catalog {
    /// Resolve `path` against `entity`.
    ///
    /// Depth is checked before names so a path with more than one
    /// relationship hop is rejected the same way for every entity.
    pub fn resolve<'a>(
        &'a self,
        entity: &'a EntitySchema,
        path: &str,
    ) -> QueryResult<AttributeRef<'a>> {
        if let Some(key) = path.strip_prefix(CUSTOM_FIELDS_PREFIX) {
            return Self::resolve_custom_field(entity, key, path);
        }

        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() > 2 {
            return Err(QueryError::UnsupportedPathDepth {
                path: path.to_string(),
                hops: segments.len() - 1,
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(QueryError::unknown_field(&entity.name, path));
        }

        match segments.as_slice() {
            [field] => {
                if let Some(column) = lookup_column(entity, field) {
                    return Ok(AttributeRef::Column(column));
                }
                // A bare relationship name means the related record's id.
                if let Some(relationship) = entity.find_relationship(field) {
                    let target = self.target_of(entity, relationship, path)?;
                    if let Some(column) = target.id_field() {
                        return Ok(AttributeRef::Relationship {
                            relationship,
                            target,
                            column,
                        });
                    }
                }
                Err(QueryError::unknown_field(&entity.name, path))
            }
            [hop, field] => {
                let relationship = entity
                    .find_relationship(hop)
                    .ok_or_else(|| QueryError::unknown_field(&entity.name, path))?;
                let target = self.target_of(entity, relationship, path)?;
                let column = lookup_column(target, field)
                    .ok_or_else(|| QueryError::unknown_field(&target.name, path))?;
                Ok(AttributeRef::Relationship {
                    relationship,
                    target,
                    column,
                })
            }
            _ => Err(QueryError::unknown_field(&entity.name, path)),
        }
    }

    /// Resolve a bare custom-field key, as used by `CUSTOM_FIELD` filters
    /// and `customFieldsQuery`. The `customFields.` prefix is optional.
    pub fn resolve_custom_key<'a>(
        &'a self,
        entity: &'a EntitySchema,
        key: &str,
    ) -> QueryResult<AttributeRef<'a>> {
        let bare = key.strip_prefix(CUSTOM_FIELDS_PREFIX).unwrap_or(key);
        Self::resolve_custom_field(entity, bare, key)
    }

    fn resolve_custom_field<'a>(
        entity: &'a EntitySchema,
        key: &str,
        path: &str,
    ) -> QueryResult<AttributeRef<'a>> {
        let column = entity
            .custom_fields_column
            .as_deref()
            .ok_or_else(|| QueryError::unknown_field(&entity.name, path))?;
        if !is_valid_custom_key(key) {
            return Err(QueryError::unknown_field(&entity.name, path));
        }
        Ok(AttributeRef::CustomField {
            column,
            key: key.to_string(),
        })
    }

    fn target_of<'a>(
        &'a self,
        entity: &EntitySchema,
        relationship: &RelationshipDef,
        path: &str,
    ) -> QueryResult<&'a EntitySchema> {
        self.entity(&relationship.target)
            .ok_or_else(|| QueryError::unknown_field(&entity.name, path))
    }
}

/// Field lookup that never exposes the tenant column.
fn lookup_column<'a>(entity: &'a EntitySchema, field: &str) -> Option<&'a ColumnDef> {
    entity
        .find_column(field)
        .filter(|c| c.column != entity.tenant_column)
}

pub fn is_valid_custom_key(key: &str) -> bool {
    CUSTOM_FIELD_KEY.is_match(key)
}
