//! Entity schemas: the searchable shape of each record type.
//!
//! An [`EntitySchema`] names the table, its tenant and id columns, the
//! typed fields callers may filter and sort on, the single-hop
//! relationships to other entities, and the optional custom-field bag,
//! hierarchy and relationship-table support.
//!
//! Field names are camelCase on the wire; columns default to the snake_case
//! form (`leadScore` -> `lead_score`) unless overridden.

pub mod catalog;
mod resolve;

pub use catalog::Catalog;
pub use resolve::AttributeRef;

use inflector::Inflector;

use crate::criteria::ValueKind;

/// A typed field backed by a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub field: String,
    pub column: String,
    pub kind: ValueKind,
    /// Declared variants for enum fields, in declaration order.
    pub variants: Vec<String>,
}

impl ColumnDef {
    pub fn new(field: &str, kind: ValueKind) -> Self {
        Self {
            field: field.to_string(),
            column: field.to_snake_case(),
            kind,
            variants: Vec::new(),
        }
    }

    pub fn string(field: &str) -> Self {
        Self::new(field, ValueKind::String)
    }

    pub fn number(field: &str) -> Self {
        Self::new(field, ValueKind::Number)
    }

    pub fn date(field: &str) -> Self {
        Self::new(field, ValueKind::Date)
    }

    pub fn boolean(field: &str) -> Self {
        Self::new(field, ValueKind::Boolean)
    }

    pub fn enumeration(field: &str, variants: &[&str]) -> Self {
        Self {
            variants: variants.iter().map(|v| v.to_string()).collect(),
            ..Self::new(field, ValueKind::Enum)
        }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }
}

/// A single-hop, many-to-one link to another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDef {
    /// Path segment, e.g. `parentAccount`.
    pub name: String,
    /// Target entity name.
    pub target: String,
    /// Column on this entity holding the target's id.
    pub foreign_key: String,
}

/// Materialized-path hierarchy columns.
///
/// `path` holds the `/`-delimited ancestor ids of a record, including its
/// own id, e.g. `/root/mid/leaf/`.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyDef {
    pub parent_column: String,
    pub path_column: String,
    pub level_column: String,
}

impl Default for HierarchyDef {
    fn default() -> Self {
        Self {
            parent_column: "parent_id".into(),
            path_column: "hierarchy_path".into(),
            level_column: "hierarchy_level".into(),
        }
    }
}

/// Table of typed, undirected links between records.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTableDef {
    pub table: String,
    pub tenant_column: String,
    pub from_column: String,
    pub to_column: String,
    pub type_column: String,
    pub active_column: String,
}

impl RelationshipTableDef {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            tenant_column: "tenant_id".into(),
            from_column: "from_id".into(),
            to_column: "to_id".into(),
            type_column: "relationship_type".into(),
            active_column: "is_active".into(),
        }
    }
}

/// How "related to record R" is evaluated for an entity.
///
/// `subject_column` is the column compared against the related set: the
/// id for the linked entity itself, or a foreign key for entities that
/// hang off it.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedRecordsDef {
    pub subject_column: String,
    pub links: RelationshipTableDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub id_column: String,
    pub tenant_column: String,
    pub columns: Vec<ColumnDef>,
    pub relationships: Vec<RelationshipDef>,
    pub custom_fields_column: Option<String>,
    pub hierarchy: Option<HierarchyDef>,
    pub related: Option<RelatedRecordsDef>,
    pub default_search_fields: Vec<String>,
}

impl EntitySchema {
    /// New schema with an `id` field and a `tenant_id` guard column.
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_column: "id".into(),
            tenant_column: "tenant_id".into(),
            columns: vec![ColumnDef::string("id")],
            relationships: Vec::new(),
            custom_fields_column: None,
            hierarchy: None,
            related: None,
            default_search_fields: Vec::new(),
        }
    }

    pub fn with_tenant_column(mut self, column: &str) -> Self {
        self.tenant_column = column.into();
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.retain(|c| c.field != column.field);
        self.columns.push(column);
        self
    }

    pub fn relationship(mut self, name: &str, target: &str, foreign_key: &str) -> Self {
        self.relationships.push(RelationshipDef {
            name: name.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn with_custom_fields(mut self, column: &str) -> Self {
        self.custom_fields_column = Some(column.into());
        self
    }

    /// Enable hierarchy filtering and expose its columns as fields.
    pub fn with_hierarchy(mut self, hierarchy: HierarchyDef) -> Self {
        self = self
            .column(ColumnDef::string("parentId").with_column(&hierarchy.parent_column))
            .column(ColumnDef::string("hierarchyPath").with_column(&hierarchy.path_column))
            .column(ColumnDef::number("hierarchyLevel").with_column(&hierarchy.level_column));
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn with_related(mut self, subject_column: &str, links: RelationshipTableDef) -> Self {
        self.related = Some(RelatedRecordsDef {
            subject_column: subject_column.into(),
            links,
        });
        self
    }

    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.default_search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn find_column(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn find_relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// The `id` field.
    pub fn id_field(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.column == self.id_column)
    }
}
