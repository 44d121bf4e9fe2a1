//! Operation catalog - the static table of every exposed operation.
//!
//! Each entry names an operation, the upstream call it maps to and the
//! arguments it accepts. Both front ends, the validator and the formatters
//! are driven from this table; adding an operation means adding an entry here.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::Value;

use crate::domains::upstream::HttpMethod;

/// Placeholder for the identifier segment in path templates.
pub const PATH_ID: &str = "{id}";

/// Expected JSON type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
}

impl FieldKind {
    /// JSON-schema type name.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }

    /// Whether `value` has this kind. Numeric kinds accept any JSON number.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer | Self::Number => value.is_number(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    pub(crate) fn expected(&self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Integer | Self::Number => "a number",
        }
    }
}

/// Declaration of one operation argument.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    /// Name used on the upstream request when it differs from `name`.
    pub upstream_name: Option<&'static str>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
            upstream_name: None,
        }
    }

    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Text, description)
    }

    pub const fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Number, description)
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn sent_as(self, upstream_name: &'static str) -> Self {
        Self {
            upstream_name: Some(upstream_name),
            ..self
        }
    }

    /// Name of this argument on the upstream request.
    pub fn wire_name(&self) -> &'static str {
        self.upstream_name.unwrap_or(self.name)
    }
}

/// What an operation does to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    List,
    Get,
    Create,
    Update,
    Delete,
    Search,
}

/// CRM entity an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Deal,
    Person,
    Company,
    Activity,
    Note,
    Pipeline,
    Stage,
    DealSource,
    ActivityType,
    Item,
    User,
    CustomField,
    Tag,
    LossReason,
}

impl EntityKind {
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Deal => "deal",
            Self::Person => "person",
            Self::Company => "company",
            Self::Activity => "activity",
            Self::Note => "note",
            Self::Pipeline => "pipeline",
            Self::Stage => "stage",
            Self::DealSource => "deal source",
            Self::ActivityType => "activity type",
            Self::Item => "item",
            Self::User => "user",
            Self::CustomField => "custom field",
            Self::Tag => "tag",
            Self::LossReason => "loss reason",
        }
    }

    /// Singular name with a leading capital, for sentences.
    pub fn title(&self) -> String {
        let singular = self.singular();
        let mut chars = singular.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Deal => "deals",
            Self::Person => "persons",
            Self::Company => "companies",
            Self::Activity => "activities",
            Self::Note => "notes",
            Self::Pipeline => "pipelines",
            Self::Stage => "stages",
            Self::DealSource => "deal sources",
            Self::ActivityType => "activity types",
            Self::Item => "items",
            Self::User => "users",
            Self::CustomField => "custom fields",
            Self::Tag => "tags",
            Self::LossReason => "loss reasons",
        }
    }
}

/// One entry of the operation table.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub entity: EntityKind,
    pub kind: OperationKind,
    /// Upstream HTTP method.
    pub method: HttpMethod,
    /// Upstream path template, relative to the API base URL.
    pub path: &'static str,
    /// Argument substituted for [`PATH_ID`] in `path`.
    pub id_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    /// At least one of these arguments must be present.
    pub at_least_one_of: &'static [&'static str],
}

impl OperationSpec {
    const fn new(
        name: &'static str,
        description: &'static str,
        entity: EntityKind,
        kind: OperationKind,
        path: &'static str,
        fields: &'static [FieldSpec],
    ) -> Self {
        let method = match kind {
            OperationKind::List | OperationKind::Get | OperationKind::Search => HttpMethod::Get,
            OperationKind::Create => HttpMethod::Post,
            OperationKind::Update => HttpMethod::Put,
            OperationKind::Delete => HttpMethod::Delete,
        };
        Self {
            name,
            description,
            entity,
            kind,
            method,
            path,
            id_field: None,
            fields,
            at_least_one_of: &[],
        }
    }

    const fn with_id(self, id_field: &'static str) -> Self {
        Self {
            id_field: Some(id_field),
            ..self
        }
    }

    const fn requiring_one_of(self, names: &'static [&'static str]) -> Self {
        Self {
            at_least_one_of: names,
            ..self
        }
    }

    /// Look up a declared argument.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// Whether arguments travel in the request body rather than the query.
    pub fn args_in_body(&self) -> bool {
        self.method.has_body()
    }

    /// Method of the REST route exposing this operation.
    pub fn rest_method(&self) -> HttpMethod {
        match self.kind {
            OperationKind::Search => HttpMethod::Post,
            _ => self.method,
        }
    }

    /// Path of the REST route exposing this operation.
    pub fn rest_path(&self) -> String {
        match self.kind {
            OperationKind::Search => format!("{}/search", self.path),
            _ => self.path.to_string(),
        }
    }

    /// HTTP status returned by the REST front end on success.
    pub fn rest_success_status(&self) -> u16 {
        match self.kind {
            OperationKind::Create => 201,
            _ => 200,
        }
    }
}

// ============================================================================
// Field declarations
// ============================================================================

const PAGE: FieldSpec = FieldSpec::integer("page", "Page number (default: 1)");
const SHOW: FieldSpec = FieldSpec::integer("show", "Items per page (default: 20, max: 200)");
const SEARCH_QUERY: FieldSpec = FieldSpec::text("query", "Search term")
    .required()
    .sent_as("search");

const PAGINATED: &[FieldSpec] = &[PAGE, SHOW];

const DEAL_ID: FieldSpec = FieldSpec::integer("deal_id", "Deal ID").required();
const PERSON_ID: FieldSpec = FieldSpec::integer("person_id", "Person ID").required();
const COMPANY_ID: FieldSpec = FieldSpec::integer("company_id", "Company ID").required();
const ACTIVITY_ID: FieldSpec = FieldSpec::integer("activity_id", "Activity ID").required();
const NOTE_ID: FieldSpec = FieldSpec::integer("note_id", "Note ID").required();

const LIST_DEALS: &[FieldSpec] = &[
    FieldSpec::integer("pipeline_id", "Filter by pipeline ID"),
    FieldSpec::integer("stage_id", "Filter by stage ID"),
    FieldSpec::integer("person_id", "Filter by person ID"),
    FieldSpec::integer("company_id", "Filter by company ID"),
    FieldSpec::integer("owner_id", "Filter by owner ID"),
    FieldSpec::integer("status", "Filter by status: 1=open, 2=won, 3=lost"),
    PAGE,
    SHOW,
];

const CREATE_DEAL: &[FieldSpec] = &[
    FieldSpec::text("title", "Deal title").required(),
    FieldSpec::integer("pipeline_id", "Pipeline ID").required(),
    FieldSpec::integer("stage_id", "Initial stage ID").required(),
    FieldSpec::integer("owner_id", "Responsible user ID").required(),
    FieldSpec::integer("person_id", "Associated person ID"),
    FieldSpec::integer("company_id", "Associated company ID"),
    FieldSpec::number("value", "Deal value"),
];

const UPDATE_DEAL: &[FieldSpec] = &[
    DEAL_ID,
    FieldSpec::text("title", "New title"),
    FieldSpec::integer("pipeline_id", "New pipeline ID"),
    FieldSpec::integer("stage_id", "New stage ID"),
    FieldSpec::integer("owner_id", "New responsible user ID"),
    FieldSpec::integer("person_id", "New person ID"),
    FieldSpec::integer("company_id", "New company ID"),
    FieldSpec::number("value", "New value"),
    FieldSpec::integer("status", "New status: 1=open, 2=won, 3=lost"),
];

const LIST_PERSONS: &[FieldSpec] = &[
    FieldSpec::integer("owner_id", "Filter by owner ID"),
    FieldSpec::integer("company_id", "Filter by company ID"),
    PAGE,
    SHOW,
];

const CREATE_PERSON: &[FieldSpec] = &[
    FieldSpec::text("name", "Person name").required(),
    FieldSpec::integer("owner_id", "Responsible user ID").required(),
    FieldSpec::text("email", "Email address"),
    FieldSpec::text("phone", "Phone number"),
    FieldSpec::integer("company_id", "Associated company ID"),
];

const UPDATE_PERSON: &[FieldSpec] = &[
    PERSON_ID,
    FieldSpec::text("name", "New name"),
    FieldSpec::integer("owner_id", "New responsible user ID"),
    FieldSpec::text("email", "New email address"),
    FieldSpec::text("phone", "New phone number"),
    FieldSpec::integer("company_id", "New company ID"),
];

const CREATE_COMPANY: &[FieldSpec] = &[
    FieldSpec::text("name", "Company name").required(),
    FieldSpec::integer("owner_id", "Responsible user ID").required(),
    FieldSpec::text("email", "Main email address"),
    FieldSpec::text("phone", "Main phone number"),
];

const UPDATE_COMPANY: &[FieldSpec] = &[
    COMPANY_ID,
    FieldSpec::text("name", "New name"),
    FieldSpec::integer("owner_id", "New responsible user ID"),
    FieldSpec::text("email", "New email address"),
    FieldSpec::text("phone", "New phone number"),
];

const LIST_ACTIVITIES: &[FieldSpec] = &[
    PAGE,
    SHOW,
    FieldSpec::integer("deal_id", "Filter by deal ID"),
    FieldSpec::integer("person_id", "Filter by person ID"),
    FieldSpec::integer("company_id", "Filter by company ID"),
    FieldSpec::integer("owner_id", "Filter by owner ID"),
    FieldSpec::integer("activity_type_id", "Filter by activity type ID"),
    FieldSpec::integer("status", "Filter by status: 0=open, 2=completed, 4=no show"),
];

const CREATE_ACTIVITY: &[FieldSpec] = &[
    FieldSpec::text("name", "Activity title").required(),
    FieldSpec::integer("type_id", "Activity type ID").required(),
    FieldSpec::integer("deal_id", "Associated deal ID"),
    FieldSpec::integer("person_id", "Associated person ID"),
    FieldSpec::integer("company_id", "Associated company ID"),
    FieldSpec::integer("owner_id", "Responsible user ID"),
    FieldSpec::text("start_at", "Start date and time (YYYY-MM-DD HH:MM:SS)"),
    FieldSpec::text("end_at", "End date and time (YYYY-MM-DD HH:MM:SS)"),
];

const UPDATE_ACTIVITY: &[FieldSpec] = &[
    ACTIVITY_ID,
    FieldSpec::text("name", "New title"),
    FieldSpec::integer("type_id", "New activity type ID"),
    FieldSpec::integer("deal_id", "New deal ID"),
    FieldSpec::integer("owner_id", "New responsible user ID"),
    FieldSpec::text("start_at", "New start date and time"),
    FieldSpec::text("end_at", "New end date and time"),
    FieldSpec::integer("status", "New status: 0=open, 2=completed, 4=no show"),
];

const LIST_NOTES: &[FieldSpec] = &[
    PAGE,
    SHOW,
    FieldSpec::integer("deal_id", "Filter by deal ID"),
    FieldSpec::integer("person_id", "Filter by person ID"),
    FieldSpec::integer("company_id", "Filter by company ID"),
];

const CREATE_NOTE: &[FieldSpec] = &[
    FieldSpec::text("content", "Note content").required(),
    FieldSpec::integer("deal_id", "Deal ID"),
    FieldSpec::integer("person_id", "Person ID"),
    FieldSpec::integer("company_id", "Company ID"),
];

const LIST_STAGES: &[FieldSpec] = &[
    FieldSpec::integer("pipeline_id", "Filter stages by pipeline ID"),
    PAGE,
    SHOW,
];

// ============================================================================
// Operation table
// ============================================================================

use EntityKind as E;
use OperationKind as K;

/// Every operation exposed by the gateway.
pub static OPERATIONS: &[OperationSpec] = &[
    // Deals
    OperationSpec::new(
        "list_deals",
        "List deals (opportunities) from PipeRun CRM.",
        E::Deal,
        K::List,
        "/deals",
        LIST_DEALS,
    ),
    OperationSpec::new(
        "get_deal",
        "Get the details of a specific deal.",
        E::Deal,
        K::Get,
        "/deals/{id}",
        &[DEAL_ID],
    )
    .with_id("deal_id"),
    OperationSpec::new(
        "create_deal",
        "Create a new deal.",
        E::Deal,
        K::Create,
        "/deals",
        CREATE_DEAL,
    ),
    OperationSpec::new(
        "update_deal",
        "Update an existing deal.",
        E::Deal,
        K::Update,
        "/deals/{id}",
        UPDATE_DEAL,
    )
    .with_id("deal_id"),
    OperationSpec::new(
        "delete_deal",
        "Delete a deal.",
        E::Deal,
        K::Delete,
        "/deals/{id}",
        &[DEAL_ID],
    )
    .with_id("deal_id"),
    OperationSpec::new(
        "search_deals",
        "Search deals by a free-text term.",
        E::Deal,
        K::Search,
        "/deals",
        &[SEARCH_QUERY, PAGE, SHOW],
    ),
    OperationSpec::new(
        "list_deal_sources",
        "List deal sources.",
        E::DealSource,
        K::List,
        "/deal-sources",
        &[],
    ),
    // Persons
    OperationSpec::new(
        "list_persons",
        "List persons (leads/contacts).",
        E::Person,
        K::List,
        "/persons",
        LIST_PERSONS,
    ),
    OperationSpec::new(
        "get_person",
        "Get the details of a specific person.",
        E::Person,
        K::Get,
        "/persons/{id}",
        &[PERSON_ID],
    )
    .with_id("person_id"),
    OperationSpec::new(
        "create_person",
        "Create a new person (lead/contact).",
        E::Person,
        K::Create,
        "/persons",
        CREATE_PERSON,
    ),
    OperationSpec::new(
        "update_person",
        "Update an existing person.",
        E::Person,
        K::Update,
        "/persons/{id}",
        UPDATE_PERSON,
    )
    .with_id("person_id"),
    OperationSpec::new(
        "delete_person",
        "Delete a person.",
        E::Person,
        K::Delete,
        "/persons/{id}",
        &[PERSON_ID],
    )
    .with_id("person_id"),
    OperationSpec::new(
        "search_persons",
        "Search persons by a free-text term.",
        E::Person,
        K::Search,
        "/persons",
        &[SEARCH_QUERY, PAGE, SHOW],
    ),
    // Companies
    OperationSpec::new(
        "list_companies",
        "List companies.",
        E::Company,
        K::List,
        "/companies",
        PAGINATED,
    ),
    OperationSpec::new(
        "get_company",
        "Get the details of a specific company.",
        E::Company,
        K::Get,
        "/companies/{id}",
        &[COMPANY_ID],
    )
    .with_id("company_id"),
    OperationSpec::new(
        "create_company",
        "Create a new company.",
        E::Company,
        K::Create,
        "/companies",
        CREATE_COMPANY,
    ),
    OperationSpec::new(
        "update_company",
        "Update an existing company.",
        E::Company,
        K::Update,
        "/companies/{id}",
        UPDATE_COMPANY,
    )
    .with_id("company_id"),
    OperationSpec::new(
        "delete_company",
        "Delete a company.",
        E::Company,
        K::Delete,
        "/companies/{id}",
        &[COMPANY_ID],
    )
    .with_id("company_id"),
    // Activities
    OperationSpec::new(
        "list_activities",
        "List activities.",
        E::Activity,
        K::List,
        "/activities",
        LIST_ACTIVITIES,
    ),
    OperationSpec::new(
        "get_activity",
        "Get the details of a specific activity.",
        E::Activity,
        K::Get,
        "/activities/{id}",
        &[ACTIVITY_ID],
    )
    .with_id("activity_id"),
    OperationSpec::new(
        "create_activity",
        "Create a new activity.",
        E::Activity,
        K::Create,
        "/activities",
        CREATE_ACTIVITY,
    ),
    OperationSpec::new(
        "update_activity",
        "Update an existing activity.",
        E::Activity,
        K::Update,
        "/activities/{id}",
        UPDATE_ACTIVITY,
    )
    .with_id("activity_id"),
    OperationSpec::new(
        "delete_activity",
        "Delete an activity.",
        E::Activity,
        K::Delete,
        "/activities/{id}",
        &[ACTIVITY_ID],
    )
    .with_id("activity_id"),
    OperationSpec::new(
        "list_activity_types",
        "List activity types.",
        E::ActivityType,
        K::List,
        "/activity-types",
        &[],
    ),
    // Notes
    OperationSpec::new(
        "list_notes",
        "List notes.",
        E::Note,
        K::List,
        "/notes",
        LIST_NOTES,
    ),
    OperationSpec::new(
        "create_note",
        "Create a note attached to a deal, person or company.",
        E::Note,
        K::Create,
        "/notes",
        CREATE_NOTE,
    )
    .requiring_one_of(&["deal_id", "person_id", "company_id"]),
    OperationSpec::new(
        "delete_note",
        "Delete a note.",
        E::Note,
        K::Delete,
        "/notes/{id}",
        &[NOTE_ID],
    )
    .with_id("note_id"),
    // Pipelines and stages
    OperationSpec::new(
        "list_pipelines",
        "List pipelines.",
        E::Pipeline,
        K::List,
        "/pipelines",
        PAGINATED,
    ),
    OperationSpec::new(
        "list_stages",
        "List pipeline stages.",
        E::Stage,
        K::List,
        "/stages",
        LIST_STAGES,
    ),
    // Catalogues
    OperationSpec::new(
        "list_items",
        "List products.",
        E::Item,
        K::List,
        "/items",
        PAGINATED,
    ),
    OperationSpec::new(
        "list_users",
        "List users (sales reps).",
        E::User,
        K::List,
        "/users",
        PAGINATED,
    ),
    OperationSpec::new(
        "list_custom_fields",
        "List custom fields.",
        E::CustomField,
        K::List,
        "/custom-fields",
        &[],
    ),
    OperationSpec::new(
        "list_tags",
        "List tags.",
        E::Tag,
        K::List,
        "/tags",
        &[],
    ),
    OperationSpec::new(
        "list_loss_reasons",
        "List loss reasons.",
        E::LossReason,
        K::List,
        "/loss-reasons",
        &[],
    ),
];

/// Name-indexed view over a static operation list.
#[derive(Debug)]
pub struct OperationTable {
    operations: &'static [OperationSpec],
    index: HashMap<&'static str, usize>,
}

impl OperationTable {
    /// Index `operations` by name. The first entry wins on duplicate names.
    pub fn new(operations: &'static [OperationSpec]) -> Self {
        let mut index = HashMap::with_capacity(operations.len());
        for (position, operation) in operations.iter().enumerate() {
            index.entry(operation.name).or_insert(position);
        }
        Self { operations, index }
    }

    /// Exact-match lookup by operation name.
    pub fn resolve(&self, name: &str) -> Option<&'static OperationSpec> {
        let operations = self.operations;
        self.index.get(name).map(|&position| &operations[position])
    }

    pub fn iter(&self) -> std::slice::Iter<'static, OperationSpec> {
        let operations = self.operations;
        operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

static CATALOG: LazyLock<OperationTable> = LazyLock::new(|| OperationTable::new(OPERATIONS));

/// The built-in operation table.
pub fn catalog() -> &'static OperationTable {
    &CATALOG
}
