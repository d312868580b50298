//! Predicate building: one criterion in, one SQL predicate out.
//!
//! The builder resolves the criterion's path, checks the operator against
//! the attribute's kind, coerces operand values and hands them to the
//! operator's build rule. Relationship hops become tenant-scoped
//! subqueries; custom-field keys are compared as extracted JSON text.
//!
//! The hierarchy, relationship-table and search-term predicates live here
//! as well since they are built from the same schema metadata.

use tracing::debug;

use crate::criteria::{FilterCriterion, HierarchyFilter, RelatedFilter, TenantId, Value, ValueKind};
use crate::error::{QueryError, QueryResult};
use crate::operator::{escape_like, Arity, Fidelity, Operands, Operator, LIKE_ESCAPE};
use crate::schema::{AttributeRef, Catalog, ColumnDef, EntitySchema};
use crate::sql::expr::{case_when, col, json_text, lit_str, Expr, ExprExt};
use crate::sql::query::{Query, TableRef};

/// A predicate together with how faithfully it implements its criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPredicate {
    pub expr: Expr,
    pub fidelity: Fidelity,
}

impl BuiltPredicate {
    fn exact(expr: Expr) -> Self {
        Self {
            expr,
            fidelity: Fidelity::Exact,
        }
    }
}

/// Builds predicates for one tenant against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder<'a> {
    catalog: &'a Catalog,
    tenant: &'a TenantId,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(catalog: &'a Catalog, tenant: &'a TenantId) -> Self {
        Self { catalog, tenant }
    }

    /// Build the predicate for `criterion` on `entity`.
    pub fn build(
        &self,
        criterion: &FilterCriterion,
        entity: &EntitySchema,
    ) -> QueryResult<BuiltPredicate> {
        let op = criterion.operator();
        let field = criterion.field();

        let attr = if op == Operator::CustomField {
            self.catalog.resolve_custom_key(entity, field)?
        } else {
            self.catalog.resolve(entity, field)?
        };

        let semantics = op.semantics();
        match attr {
            AttributeRef::Column(column) => {
                let operands = typed_operands(criterion, column)?;
                Ok(BuiltPredicate::exact(
                    semantics.build(col(&column.column), &operands),
                ))
            }
            AttributeRef::Relationship {
                relationship,
                target,
                column,
            } => {
                let operands = typed_operands(criterion, column)?;
                if column.column == target.id_column {
                    return Ok(BuiltPredicate::exact(
                        semantics.build(col(&relationship.foreign_key), &operands),
                    ));
                }
                let related = Query::new()
                    .select(vec![col(&target.id_column)])
                    .from(TableRef::new(&target.table))
                    .filter(col(&target.tenant_column).eq(self.tenant.as_str()))
                    .filter(semantics.build(col(&column.column), &operands));
                Ok(BuiltPredicate::exact(
                    col(&relationship.foreign_key).in_subquery(related),
                ))
            }
            AttributeRef::CustomField { column, key } => {
                let operands = operands(criterion, |v| v.coerce(ValueKind::String, &[]))?;
                let fidelity = semantics.custom_field_fidelity;
                if fidelity == Fidelity::BestEffort {
                    debug!(
                        entity = %entity.name,
                        field = %field,
                        operator = %op,
                        "custom field compared as text; result is best-effort"
                    );
                }
                Ok(BuiltPredicate {
                    expr: semantics.build(json_text(col(column), &key), &operands),
                    fidelity,
                })
            }
        }
    }

    /// Exact match on a custom-field key, as used by `customFieldsQuery`.
    pub fn custom_field_equals(
        &self,
        entity: &EntitySchema,
        key: &str,
        value: &Value,
    ) -> QueryResult<BuiltPredicate> {
        let criterion = FilterCriterion::single(key, Operator::CustomField, value.clone())?;
        self.build(&criterion, entity)
    }

    /// Case-insensitive "contains" over the search fields, OR-ed together.
    ///
    /// Falls back to the entity's default search fields when `fields` is
    /// `None`. Returns `None` for a blank term or an empty field list.
    pub fn search(
        &self,
        entity: &EntitySchema,
        term: &str,
        fields: Option<&[String]>,
    ) -> QueryResult<Option<BuiltPredicate>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }
        let fields = fields.unwrap_or(entity.default_search_fields.as_slice());

        let mut combined: Option<BuiltPredicate> = None;
        for field in fields {
            let criterion = FilterCriterion::single(field.as_str(), Operator::Ilike, term)?;
            let built = self.build(&criterion, entity)?;
            combined = Some(match combined {
                None => built,
                Some(acc) => BuiltPredicate {
                    expr: acc.expr.or(built.expr),
                    fidelity: acc.fidelity.max_with(built.fidelity),
                },
            });
        }
        Ok(combined)
    }

    /// Direct children of a parent, or the parent and its whole subtree.
    pub fn hierarchy(&self, entity: &EntitySchema, filter: &HierarchyFilter) -> QueryResult<Expr> {
        let hierarchy = entity.hierarchy.as_ref().ok_or_else(|| {
            QueryError::malformed(
                "hierarchy",
                format!("{} records have no hierarchy", entity.name),
            )
        })?;
        let parent = filter.parent_id.trim();
        if parent.is_empty() {
            return Err(QueryError::malformed("hierarchy.parentId", "must not be empty"));
        }

        if !filter.include_descendants {
            return Ok(col(&hierarchy.parent_column).eq(parent));
        }

        let pattern = format!("%/{}/%", escape_like(parent));
        Ok(col(&entity.id_column)
            .eq(parent)
            .or(col(&hierarchy.path_column).like_escape(lit_str(&pattern), LIKE_ESCAPE)))
    }

    /// Records that are the related record itself or linked to it by an
    /// active relationship row, in either direction.
    pub fn related(&self, entity: &EntitySchema, filter: &RelatedFilter) -> QueryResult<Expr> {
        let related = entity.related.as_ref().ok_or_else(|| {
            QueryError::malformed(
                "related",
                format!("{} records have no relationship table", entity.name),
            )
        })?;
        let record = filter.related_record_id.trim();
        if record.is_empty() {
            return Err(QueryError::malformed("related.relatedRecordId", "must not be empty"));
        }

        let links = &related.links;
        let other_end = case_when(
            col(&links.from_column).eq(record),
            col(&links.to_column),
            col(&links.from_column),
        );
        let mut linked = Query::new()
            .select(vec![other_end])
            .from(TableRef::new(&links.table))
            .filter(col(&links.tenant_column).eq(self.tenant.as_str()))
            .filter(col(&links.active_column).eq(true))
            .filter(
                col(&links.from_column)
                    .eq(record)
                    .or(col(&links.to_column).eq(record)),
            );
        if let Some(kind) = filter.relationship_type.as_deref() {
            linked = linked.filter(col(&links.type_column).eq(kind));
        }

        let subject = &related.subject_column;
        Ok(col(subject).eq(record).or(col(subject).in_subquery(linked)))
    }
}

/// Check applicability, then coerce to the column's kind.
fn typed_operands(criterion: &FilterCriterion, column: &ColumnDef) -> QueryResult<Operands> {
    let op = criterion.operator();
    if !op.applies_to(column.kind) {
        return Err(QueryError::UnsupportedOperatorForType {
            operator: op,
            field: criterion.field().to_string(),
            kind: column.kind,
        });
    }
    let operands = operands(criterion, |v| v.coerce(column.kind, &column.variants))?;
    if column.kind != ValueKind::Date {
        return Ok(operands);
    }
    Ok(match (op, operands) {
        (Operator::LessThanOrEqual | Operator::GreaterThan, Operands::Single(v)) => {
            Operands::Single(v.end_of_day())
        }
        (Operator::Between | Operator::DateRange, Operands::Pair(low, high)) => {
            Operands::Pair(low, high.end_of_day())
        }
        (_, other) => other,
    })
}

fn operands(
    criterion: &FilterCriterion,
    coerce: impl Fn(&Value) -> Result<Value, String>,
) -> QueryResult<Operands> {
    let field = criterion.field();
    let coerce = |v: &Value| coerce(v).map_err(|reason| QueryError::malformed(field, reason));
    let op = criterion.operator();
    if op == Operator::DateRange && !criterion.operands().iter().all(|v| v.is_temporal()) {
        return Err(QueryError::malformed(
            field,
            "DATE_RANGE takes two dates or timestamps",
        ));
    }

    match op.arity() {
        Arity::None => Ok(Operands::None),
        Arity::Single => {
            let value = criterion
                .value()
                .ok_or_else(|| QueryError::malformed(field, format!("{} takes one value", op)))?;
            Ok(Operands::Single(coerce(value)?))
        }
        Arity::Multi => {
            let values = criterion
                .values()
                .iter()
                .map(coerce)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(Operands::Multi(values))
        }
        Arity::Pair => match criterion.values() {
            [low, high] => Ok(Operands::Pair(coerce(low)?, coerce(high)?)),
            other => Err(QueryError::malformed(
                field,
                format!("{} takes two values, got {}", op, other.len()),
            )),
        },
    }
}
