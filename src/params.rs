//! Flat query-parameter parsing.
//!
//! GET-style searches arrive as a flat string map rather than a JSON body:
//!
//! ```text
//! ?page=2&limit=50&sort=leadScore:desc,lastName
//!  &search=acme&searchFields=company,email
//!  &status=QUALIFIED&leadScore[GREATER_THAN]=80&createdAt[DATE_RANGE]=2024-01-01,2024-03-31
//!  &cf.tier=gold&parentId=acc-1&includeDescendants=true
//!  &relatedRecordId=acc-9&relationshipType=PARTNER
//! ```
//!
//! A plain `field=value` pair is an equality filter; `field[OPERATOR]=…`
//! selects another operator, with list and pair operands comma-separated.
//! Keys prefixed `cf.` or `customFields.` are exact custom-field matches.
//!
//! Enum-valued filters are checked against the declared variants here,
//! because query strings are often hand-built: in
//! [`EnumParseMode::Lenient`] an unrecognised variant drops the filter with
//! a warning, in [`EnumParseMode::Strict`] it fails the request.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::criteria::{
    FilterCriterion, HierarchyFilter, RelatedFilter, SearchRequest, SortCriterion,
    SortDirection, Value, ValueKind,
};
use crate::error::{QueryError, QueryResult};
use crate::operator::{Arity, Operator};
use crate::schema::{AttributeRef, Catalog, EntitySchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumParseMode {
    /// Drop filters with unknown enum variants and log a warning.
    #[default]
    Lenient,
    /// Reject them with `MalformedFilter`.
    Strict,
}

const CUSTOM_FIELD_PREFIXES: [&str; 2] = ["cf.", "customFields."];

/// Parse a flat parameter map into a search request for `entity`.
pub fn parse_flat<I, K, V>(
    params: I,
    entity: &EntitySchema,
    catalog: &Catalog,
    mode: EnumParseMode,
) -> QueryResult<SearchRequest>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut request = SearchRequest::new();
    let mut parent_id = None;
    let mut include_descendants = false;
    let mut related_id = None;
    let mut relationship_type = None;

    for (key, raw) in params {
        let key = key.as_ref().trim();
        let raw = raw.as_ref().trim();

        match key {
            "page" => request.page.page = parse_int(key, raw)?,
            "limit" => request.page.limit = Some(parse_int(key, raw)?),
            "sort" => request.page.sort = parse_sort(raw)?,
            "search" => request.page.search = Some(raw.to_string()),
            "searchFields" => request.page.search_fields = Some(split_list(raw)),
            "parentId" => parent_id = Some(raw.to_string()),
            "includeDescendants" => include_descendants = parse_bool(key, raw)?,
            "relatedRecordId" => related_id = Some(raw.to_string()),
            "relationshipType" => relationship_type = Some(raw.to_string()),
            _ => {
                if let Some(cf_key) = custom_field_key(key) {
                    request
                        .custom_fields_query
                        .insert(cf_key.to_string(), Value::from_param(raw));
                    continue;
                }
                if let Some(criterion) = parse_filter(key, raw, entity, catalog, mode)? {
                    request.filters.push(criterion);
                }
            }
        }
    }

    if let Some(parent_id) = parent_id {
        request.hierarchy = Some(HierarchyFilter {
            parent_id,
            include_descendants,
        });
    }
    if let Some(related_record_id) = related_id {
        request.related = Some(RelatedFilter {
            related_record_id,
            relationship_type,
        });
    }
    Ok(request)
}

fn custom_field_key(key: &str) -> Option<&str> {
    CUSTOM_FIELD_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
}

/// `field` or `field[OPERATOR]`.
fn split_key(key: &str) -> QueryResult<(&str, Operator)> {
    let Some(open) = key.find('[') else {
        return Ok((key, Operator::Equals));
    };
    let name = key[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| QueryError::malformed(key, "expected field[OPERATOR]"))?;
    let op = Operator::parse(name)
        .ok_or_else(|| QueryError::malformed(key, format!("unknown operator '{}'", name)))?;
    Ok((&key[..open], op))
}

fn parse_filter(
    key: &str,
    raw: &str,
    entity: &EntitySchema,
    catalog: &Catalog,
    mode: EnumParseMode,
) -> QueryResult<Option<FilterCriterion>> {
    let (field, op) = split_key(key)?;

    let criterion = match op.arity() {
        Arity::None => FilterCriterion::unary(field, op)?,
        Arity::Single => FilterCriterion::single(field, op, Value::from_param(raw))?,
        Arity::Multi => FilterCriterion::multi(field, op, parse_values(raw))?,
        Arity::Pair => FilterCriterion::new(field, op, None, Some(parse_values(raw)))?,
    };

    if let Some(bad) = unknown_variant(&criterion, entity, catalog) {
        match mode {
            EnumParseMode::Lenient => {
                warn!(
                    entity = %entity.name,
                    field = %field,
                    value = %bad,
                    "dropping filter with unrecognised enum value"
                );
                return Ok(None);
            }
            EnumParseMode::Strict => {
                return Err(QueryError::malformed(
                    field,
                    format!("'{}' is not a valid value", bad),
                ));
            }
        }
    }
    Ok(Some(criterion))
}

/// The first operand that is not a declared variant of an enum field.
///
/// Other resolution problems are left for the predicate builder to report.
fn unknown_variant(
    criterion: &FilterCriterion,
    entity: &EntitySchema,
    catalog: &Catalog,
) -> Option<String> {
    let column = match catalog.resolve(entity, criterion.field()).ok()? {
        AttributeRef::Column(c) => c,
        AttributeRef::Relationship { column, .. } => column,
        AttributeRef::CustomField { .. } => return None,
    };
    if column.kind != ValueKind::Enum {
        return None;
    }
    criterion
        .operands()
        .into_iter()
        .find(|v| v.coerce(ValueKind::Enum, &column.variants).is_err())
        .map(Value::to_text)
}

fn parse_values(raw: &str) -> Vec<Value> {
    split_list(raw)
        .iter()
        .map(|v| Value::from_param(v))
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_sort(raw: &str) -> QueryResult<Vec<SortCriterion>> {
    split_list(raw)
        .into_iter()
        .map(|item| {
            let (field, dir) = match item.split_once(':') {
                Some((field, dir)) => (field.trim(), dir.trim()),
                None => (item.as_str(), "asc"),
            };
            let direction = if dir.eq_ignore_ascii_case("asc") {
                SortDirection::Asc
            } else if dir.eq_ignore_ascii_case("desc") {
                SortDirection::Desc
            } else {
                return Err(QueryError::InvalidPageRequest(format!(
                    "invalid sort direction '{}' for '{}'",
                    dir, field
                )));
            };
            Ok(SortCriterion {
                field: field.to_string(),
                direction,
                nulls_first: None,
            })
        })
        .collect()
}

fn parse_int(key: &str, raw: &str) -> QueryResult<i64> {
    raw.parse().map_err(|_| {
        QueryError::InvalidPageRequest(format!("{} must be an integer, got '{}'", key, raw))
    })
}

fn parse_bool(key: &str, raw: &str) -> QueryResult<bool> {
    match raw {
        r if r.eq_ignore_ascii_case("true") => Ok(true),
        r if r.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(QueryError::malformed(key, format!("'{}' is not a boolean", raw))),
    }
}
