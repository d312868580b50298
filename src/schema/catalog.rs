//! Registry of entity schemas, plus the built-in CRM entities.

use std::collections::BTreeMap;

use super::{ColumnDef, EntitySchema, HierarchyDef, RelationshipTableDef};

/// Entity schemas keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: BTreeMap<String, EntitySchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a schema.
    pub fn register(&mut self, schema: EntitySchema) -> &mut Self {
        self.entities.insert(schema.name.clone(), schema);
        self
    }

    pub fn with(mut self, schema: EntitySchema) -> Self {
        self.register(schema);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// The CRM entities: accounts, contacts, leads, deals, activities,
    /// custom-object records and workflows.
    pub fn crm() -> Self {
        Self::new()
            .with(account())
            .with(contact())
            .with(lead())
            .with(deal())
            .with(activity())
            .with(custom_object())
            .with(workflow())
    }
}

/// Links between accounts; also answers "related to account R" for the
/// entities that hang off an account.
fn account_links() -> RelationshipTableDef {
    RelationshipTableDef::new("account_relationships")
}

fn account() -> EntitySchema {
    EntitySchema::new("account", "accounts")
        .column(ColumnDef::string("name"))
        .column(ColumnDef::enumeration(
            "accountType",
            &["CUSTOMER", "PROSPECT", "PARTNER", "VENDOR", "COMPETITOR", "OTHER"],
        ))
        .column(ColumnDef::enumeration(
            "status",
            &["ACTIVE", "INACTIVE", "SUSPENDED", "CLOSED"],
        ))
        .column(ColumnDef::string("industry"))
        .column(ColumnDef::string("website"))
        .column(ColumnDef::string("email"))
        .column(ColumnDef::string("phone"))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::number("annualRevenue"))
        .column(ColumnDef::number("employeeCount"))
        .column(ColumnDef::date("createdAt"))
        .column(ColumnDef::date("updatedAt"))
        .with_hierarchy(HierarchyDef::default())
        .relationship("parentAccount", "account", "parent_id")
        .with_custom_fields("custom_fields")
        .with_related("id", account_links())
        .search_fields(&["name", "industry", "website", "email"])
}

fn contact() -> EntitySchema {
    EntitySchema::new("contact", "contacts")
        .column(ColumnDef::string("firstName"))
        .column(ColumnDef::string("lastName"))
        .column(ColumnDef::string("email"))
        .column(ColumnDef::string("phone"))
        .column(ColumnDef::string("jobTitle"))
        .column(ColumnDef::enumeration(
            "status",
            &["ACTIVE", "INACTIVE", "BOUNCED"],
        ))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::string("accountId"))
        .column(ColumnDef::date("createdAt"))
        .column(ColumnDef::date("updatedAt"))
        .relationship("account", "account", "account_id")
        .with_custom_fields("custom_fields")
        .with_related("account_id", account_links())
        .search_fields(&["firstName", "lastName", "email"])
}

fn lead() -> EntitySchema {
    EntitySchema::new("lead", "leads")
        .column(ColumnDef::string("firstName"))
        .column(ColumnDef::string("lastName"))
        .column(ColumnDef::string("company"))
        .column(ColumnDef::string("email"))
        .column(ColumnDef::enumeration(
            "status",
            &["NEW", "CONTACTED", "QUALIFIED", "UNQUALIFIED", "CONVERTED"],
        ))
        .column(ColumnDef::enumeration(
            "source",
            &["WEB", "REFERRAL", "EVENT", "CAMPAIGN", "PARTNER", "OTHER"],
        ))
        .column(ColumnDef::number("leadScore"))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::string("accountId"))
        .column(ColumnDef::date("createdAt"))
        .column(ColumnDef::date("convertedAt"))
        .relationship("account", "account", "account_id")
        .with_custom_fields("custom_fields")
        .with_related("account_id", account_links())
        .search_fields(&["firstName", "lastName", "company", "email"])
}

fn deal() -> EntitySchema {
    EntitySchema::new("deal", "deals")
        .column(ColumnDef::string("name"))
        .column(ColumnDef::enumeration(
            "stage",
            &[
                "PROSPECTING",
                "QUALIFICATION",
                "PROPOSAL",
                "NEGOTIATION",
                "CLOSED_WON",
                "CLOSED_LOST",
            ],
        ))
        .column(ColumnDef::number("amount"))
        .column(ColumnDef::number("probability"))
        .column(ColumnDef::date("closeDate"))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::string("accountId"))
        .column(ColumnDef::string("contactId"))
        .column(ColumnDef::date("createdAt"))
        .relationship("account", "account", "account_id")
        .relationship("contact", "contact", "contact_id")
        .with_custom_fields("custom_fields")
        .with_related("account_id", account_links())
        .search_fields(&["name"])
}

fn activity() -> EntitySchema {
    EntitySchema::new("activity", "activities")
        .column(ColumnDef::string("subject"))
        .column(ColumnDef::string("description"))
        .column(ColumnDef::enumeration(
            "activityType",
            &["CALL", "EMAIL", "MEETING", "TASK", "NOTE"],
        ))
        .column(ColumnDef::enumeration(
            "status",
            &["PLANNED", "COMPLETED", "CANCELLED"],
        ))
        .column(ColumnDef::date("dueDate"))
        .column(ColumnDef::date("completedAt"))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::string("accountId"))
        .column(ColumnDef::string("contactId"))
        .column(ColumnDef::string("dealId"))
        .column(ColumnDef::string("leadId"))
        .column(ColumnDef::date("createdAt"))
        .relationship("account", "account", "account_id")
        .relationship("contact", "contact", "contact_id")
        .relationship("deal", "deal", "deal_id")
        .relationship("lead", "lead", "lead_id")
        .with_custom_fields("custom_fields")
        .with_related("account_id", account_links())
        .search_fields(&["subject", "description"])
}

fn custom_object() -> EntitySchema {
    EntitySchema::new("custom_object", "custom_object_records")
        .column(ColumnDef::string("objectType"))
        .column(ColumnDef::string("name"))
        .column(ColumnDef::string("ownerId"))
        .column(ColumnDef::date("createdAt"))
        .column(ColumnDef::date("updatedAt"))
        .with_custom_fields("custom_fields")
        .search_fields(&["name"])
}

fn workflow() -> EntitySchema {
    EntitySchema::new("workflow", "workflows")
        .column(ColumnDef::string("name"))
        .column(ColumnDef::string("entityType"))
        .column(ColumnDef::enumeration(
            "triggerType",
            &["ON_CREATE", "ON_UPDATE", "SCHEDULED", "MANUAL"],
        ))
        .column(ColumnDef::boolean("isActive"))
        .column(ColumnDef::date("createdAt"))
        .search_fields(&["name"])
}
