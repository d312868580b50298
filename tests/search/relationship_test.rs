//! Relationship hops and relationship-table filters against the SQLite fixture.

#[path = "../common/mod.rs"]
mod common;

use common::{sorted, t1, t2, Fixture};
use crm_query::criteria::{FilterCriterion, SortCriterion, Value};
use crm_query::operator::Operator;
use crm_query::SearchRequest;

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Single-hop relationship paths
// ============================================================================

#[test]
fn test_filter_on_related_field() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .filter(FilterCriterion::single("account.industry", Operator::Equals, "Retail").unwrap());
    assert_eq!(fx.ids("lead", &t1(), &request), ids(&["L1"]));

    let request = SearchRequest::new().filter(
        FilterCriterion::single("account.name", Operator::StartsWith, "Acme").unwrap(),
    );
    assert_eq!(fx.ids("contact", &t1(), &request), ids(&["K1"]));
}

#[test]
fn test_related_subquery_is_tenant_scoped() {
    let fx = Fixture::new();
    // t2 has an account named "Acme Corp" too; t1 contacts must not reach it.
    fx.insert(
        "contact",
        &t1(),
        serde_json::json!({"id": "K4", "firstName": "Dee", "accountId": "X"}),
    );
    let request = SearchRequest::new()
        .filter(FilterCriterion::single("account.name", Operator::Equals, "Acme Corp").unwrap());
    assert_eq!(fx.ids("contact", &t1(), &request), ids(&["K1"]));
}

#[test]
fn test_related_id_uses_foreign_key() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::multi(
            "account.id",
            Operator::In,
            vec![Value::text("A"), Value::text("D")],
        )
        .unwrap(),
    );
    assert_eq!(sorted(fx.ids("deal", &t1(), &request)), ids(&["DL1", "DL3"]));

    let request = SearchRequest::new()
        .filter(FilterCriterion::single("account", Operator::Equals, "B").unwrap())
        .sort(SortCriterion::asc("account.id"));
    assert_eq!(fx.ids("deal", &t1(), &request), ids(&["DL2"]));
}

#[test]
fn test_self_relationship() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::single("parentAccount.name", Operator::Contains, "west").unwrap(),
    );
    // Only A2's parent (A1, "Acme West") matches; LIKE is case-insensitive in SQLite.
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["A2"]));
}

// ============================================================================
// Relationship table
// ============================================================================

#[test]
fn test_related_accounts_include_both_directions() {
    let fx = Fixture::new();
    let request = SearchRequest::new().related_to("A", None);
    assert_eq!(
        sorted(fx.ids("account", &t1(), &request)),
        ids(&["A", "B", "C"])
    );
}

#[test]
fn test_related_accounts_by_type() {
    let fx = Fixture::new();
    let request = SearchRequest::new().related_to("A", Some("PARTNER"));
    // D is linked as a partner, but the link is inactive.
    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A", "B"]));
}

#[test]
fn test_related_filter_on_dependent_entities() {
    let fx = Fixture::new();
    let request = SearchRequest::new().related_to("A", None);
    assert_eq!(sorted(fx.ids("contact", &t1(), &request)), ids(&["K1", "K2"]));

    let request = SearchRequest::new().related_to("A", Some("PARTNER"));
    assert_eq!(sorted(fx.ids("deal", &t1(), &request)), ids(&["DL1", "DL2"]));
}

#[test]
fn test_related_links_are_tenant_scoped() {
    let fx = Fixture::new();
    let request = SearchRequest::new().related_to("A", None);
    assert_eq!(fx.ids("account", &t2(), &request), ids(&["X"]));
}

#[test]
fn test_related_and_other_filters_combine() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .related_to("A", None)
        .filter(FilterCriterion::single("industry", Operator::Equals, "Retail").unwrap());
    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A", "C"]));
}
