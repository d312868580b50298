//! Flat query parameters, end to end.

#[path = "../common/mod.rs"]
mod common;

use common::{sorted, t1, Fixture};
use crm_query::params::{parse_flat, EnumParseMode};
use crm_query::SearchRequest;

fn parse(fx: &Fixture, entity: &str, params: &[(&str, &str)], mode: EnumParseMode) -> SearchRequest {
    let schema = fx.catalog.entity(entity).unwrap();
    parse_flat(params.iter().copied(), schema, &fx.catalog, mode).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test_log::test]
fn test_lenient_params_search() {
    let fx = Fixture::new();
    let request = parse(
        &fx,
        "lead",
        &[
            ("status", "QUALIFIED"),
            ("source", "CARRIER_PIGEON"),
            ("leadScore[GREATER_THAN]", "90"),
        ],
        EnumParseMode::Lenient,
    );
    // The unknown source is dropped rather than failing the request.
    assert_eq!(request.filters.len(), 2);
    assert_eq!(fx.ids("lead", &t1(), &request), ids(&["L1"]));
}

#[test]
fn test_strict_params_reject_unknown_variant() {
    let fx = Fixture::new();
    let schema = fx.catalog.entity("lead").unwrap();
    let err = parse_flat(
        [("source", "CARRIER_PIGEON")],
        schema,
        &fx.catalog,
        EnumParseMode::Strict,
    )
    .unwrap_err();
    assert_eq!(err.code(), "MALFORMED_FILTER");
}

#[test]
fn test_params_paging_and_sort() {
    let fx = Fixture::new();
    let request = parse(
        &fx,
        "lead",
        &[("sort", "leadScore:desc"), ("page", "2"), ("limit", "1")],
        EnumParseMode::Lenient,
    );
    let page = fx.search("lead", &t1(), &request).unwrap();
    assert_eq!(page.items[0]["id"], "L2");
    assert_eq!(page.page_info.total_pages, 3);
}

#[test]
fn test_params_ranges_and_lists() {
    let fx = Fixture::new();
    let request = parse(
        &fx,
        "deal",
        &[("amount[BETWEEN]", "1000,5000"), ("stage[NOT_IN]", "PROPOSAL")],
        EnumParseMode::Lenient,
    );
    assert_eq!(fx.ids("deal", &t1(), &request), ids(&["DL2"]));

    let request = parse(
        &fx,
        "lead",
        &[("createdAt[DATE_RANGE]", "2024-02-01,2024-12-31")],
        EnumParseMode::Lenient,
    );
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L2", "L3"]));
}

#[test]
fn test_params_custom_fields_and_hierarchy() {
    let fx = Fixture::new();
    let request = parse(
        &fx,
        "account",
        &[
            ("cf.tier", "gold"),
            ("parentId", "A"),
            ("includeDescendants", "true"),
        ],
        EnumParseMode::Lenient,
    );
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["A"]));

    let request = parse(
        &fx,
        "account",
        &[("relatedRecordId", "A"), ("relationshipType", "VENDOR")],
        EnumParseMode::Lenient,
    );
    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A", "C"]));
}

#[test]
fn test_params_search() {
    let fx = Fixture::new();
    let request = parse(
        &fx,
        "contact",
        &[("search", "beta.test"), ("searchFields", "email")],
        EnumParseMode::Lenient,
    );
    assert_eq!(fx.ids("contact", &t1(), &request), ids(&["K2"]));
}
