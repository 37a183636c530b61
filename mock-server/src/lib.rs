use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// API key accepted by [`app`] when none is configured.
pub const DEFAULT_API_KEY: &str = "test-key";

/// Fixed timestamp stamped on every record.
const TIMESTAMP: &str = "2024-01-01T00:00:00Z";

pub type Record = Map<String, Value>;

/// In-memory state. Ids come from one counter so they are unique across
/// resource types, like user ids shared by contacts and agents upstream.
#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    pub tickets: BTreeMap<u64, Record>,
    pub conversations: BTreeMap<u64, Record>,
    pub time_entries: BTreeMap<u64, Record>,
    pub contacts: BTreeMap<u64, Record>,
    pub companies: BTreeMap<u64, Record>,
    pub agents: BTreeMap<u64, Record>,
    current_agent: u64,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store::default();
        let id = store.allocate_id();
        store.agents.insert(
            id,
            stamped(json!({
                "id": id,
                "available": true,
                "occasional": false,
                "signature": null,
                "ticket_scope": 1,
                "group_ids": [],
                "role_ids": [],
                "contact": {"name": "Mock Agent", "email": "agent@example.com"}
            })),
        );
        store.current_agent = id;
        store
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn contact_by_email(&self, email: &str) -> Option<u64> {
        self.contacts
            .iter()
            .find(|(_, c)| c.get("email").and_then(Value::as_str) == Some(email))
            .map(|(id, _)| *id)
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    auth_header: String,
}

/// Failures rendered the way the service renders them.
#[derive(Debug)]
enum Failure {
    /// Unknown id: 404 with an empty body.
    NotFound,
    /// 400 with a `description` and per-field errors.
    Invalid(Vec<(&'static str, &'static str)>),
    /// 409 with a `description`.
    Conflict(&'static str),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::NotFound => StatusCode::NOT_FOUND.into_response(),
            Failure::Invalid(fields) => {
                let errors: Vec<Value> = fields
                    .into_iter()
                    .map(|(field, message)| {
                        json!({"field": field, "message": message, "code": "missing_field"})
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"description": "Validation failed", "errors": errors})),
                )
                    .into_response()
            }
            Failure::Conflict(description) => (
                StatusCode::CONFLICT,
                Json(json!({"description": description})),
            )
                .into_response(),
        }
    }
}

type Reply<T> = Result<T, Failure>;

/// Router with the default API key.
pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

/// Router accepting `Basic base64(api_key:X)` only.
pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::seeded())),
        auth_header: format!("Basic {}", STANDARD.encode(format!("{api_key}:X"))),
    };
    Router::new()
        .route("/api/v2/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/api/v2/tickets/{id}",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/api/v2/tickets/{id}/restore", put(restore_ticket))
        .route("/api/v2/tickets/{id}/conversations", get(list_conversations))
        .route("/api/v2/tickets/{id}/time_entries", get(list_time_entries))
        .route("/api/v2/tickets/{id}/reply", post(create_reply))
        .route("/api/v2/tickets/{id}/notes", post(create_note))
        .route("/api/v2/ticket_fields", get(list_ticket_fields))
        .route(
            "/api/v2/conversations/{id}",
            put(update_conversation).delete(delete_conversation),
        )
        .route("/api/v2/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/v2/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/v2/contacts/{id}/make_agent", put(make_agent))
        .route("/api/v2/contact_fields", get(list_contact_fields))
        .route("/api/v2/companies", get(list_companies).post(create_company))
        .route(
            "/api/v2/companies/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/v2/agents", get(list_agents))
        .route("/api/v2/agents/me", get(current_agent))
        .route("/api/v2/agents/{id}", get(get_agent))
        .route("/api/v2/search/tickets", get(search_tickets))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_key(listener, DEFAULT_API_KEY).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.auth_header.as_str()) {
        tracing::warn!(path = %request.uri().path(), "rejected credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": "invalid_credentials",
                "message": "You have to be logged in to perform this action."
            })),
        )
            .into_response();
    }
    next.run(request).await
}

fn stamped(value: Value) -> Record {
    let mut record = match value {
        Value::Object(map) => map,
        _ => Record::new(),
    };
    record.insert("created_at".to_string(), json!(TIMESTAMP));
    record.insert("updated_at".to_string(), json!(TIMESTAMP));
    record
}

/// Shallow merge: top-level keys of `input` replace those in `record`.
fn merge(record: &mut Record, input: Record) {
    for (key, value) in input {
        if key != "id" {
            record.insert(key, value);
        }
    }
    record.insert("updated_at".to_string(), json!(TIMESTAMP));
}

fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn matches_param(record: &Record, key: &str, expected: &str) -> bool {
    match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn is_deleted(record: &Record) -> bool {
    record.get("deleted").and_then(Value::as_bool).unwrap_or(false)
}

// --- tickets ---

async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Record>> {
    let store = state.db.read().await;
    let want_deleted = params.get("filter").map(String::as_str) == Some("deleted");
    let requester = params
        .get("email")
        .map(|email| store.contact_by_email(email).map(|id| id.to_string()));
    let tickets = store
        .tickets
        .values()
        .filter(|t| is_deleted(t) == want_deleted)
        .filter(|t| match &requester {
            Some(Some(id)) => matches_param(t, "requester_id", id),
            Some(None) => false,
            None => true,
        })
        .filter(|t| {
            ["requester_id", "company_id"]
                .iter()
                .all(|key| params.get(*key).map_or(true, |v| matches_param(t, key, v)))
        })
        .cloned()
        .collect();
    Json(tickets)
}

async fn create_ticket(
    State(state): State<AppState>,
    Json(input): Json<Record>,
) -> Reply<(StatusCode, Json<Record>)> {
    let mut missing = Vec::new();
    if text(&input, "subject").is_none() {
        missing.push(("subject", "It should be a/an String"));
    }
    let has_requester = input.get("requester_id").is_some_and(Value::is_u64)
        || text(&input, "email").is_some()
        || text(&input, "phone").is_some();
    if !has_requester {
        missing.push((
            "requester_id",
            "Please fill at least 1 of requester_id, phone, email fields as they are mandatory.",
        ));
    }
    if !missing.is_empty() {
        return Err(Failure::Invalid(missing));
    }

    let mut store = state.db.write().await;
    let id = store.allocate_id();
    let mut ticket = input;
    if let Some(email) = text(&ticket, "email").map(str::to_string) {
        let requester_id = match store.contact_by_email(&email) {
            Some(existing) => existing,
            None => {
                let contact_id = store.allocate_id();
                let name = text(&ticket, "name").unwrap_or(&email).to_string();
                store.contacts.insert(
                    contact_id,
                    stamped(json!({"id": contact_id, "name": name, "email": email, "active": false})),
                );
                contact_id
            }
        };
        ticket.remove("email");
        ticket.remove("name");
        ticket.insert("requester_id".to_string(), json!(requester_id));
    }
    let description = ticket.get("description").cloned().unwrap_or(Value::Null);
    let defaults = json!({
        "status": 2,
        "priority": 1,
        "source": 2,
        "tags": [],
        "cc_emails": [],
        "custom_fields": {},
        "deleted": false,
    });
    if let Value::Object(defaults) = defaults {
        for (key, value) in defaults {
            ticket.entry(key).or_insert(value);
        }
    }
    ticket.insert("description_text".to_string(), description);
    ticket.insert("id".to_string(), json!(id));
    let ticket = stamped(Value::Object(ticket));
    store.tickets.insert(id, ticket.clone());
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<Json<Record>> {
    let store = state.db.read().await;
    store.tickets.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<Json<Record>> {
    let mut store = state.db.write().await;
    let ticket = store.tickets.get_mut(&id).ok_or(Failure::NotFound)?;
    merge(ticket, input);
    Ok(Json(ticket.clone()))
}

async fn delete_ticket(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<StatusCode> {
    let mut store = state.db.write().await;
    let ticket = store
        .tickets
        .get_mut(&id)
        .filter(|t| !is_deleted(t))
        .ok_or(Failure::NotFound)?;
    ticket.insert("deleted".to_string(), json!(true));
    Ok(StatusCode::NO_CONTENT)
}

async fn restore_ticket(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<StatusCode> {
    let mut store = state.db.write().await;
    let ticket = store.tickets.get_mut(&id).ok_or(Failure::NotFound)?;
    ticket.insert("deleted".to_string(), json!(false));
    Ok(StatusCode::NO_CONTENT)
}

async fn list_conversations(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Reply<Json<Vec<Record>>> {
    let store = state.db.read().await;
    if !store.tickets.contains_key(&id) {
        return Err(Failure::NotFound);
    }
    let id = id.to_string();
    Ok(Json(
        store
            .conversations
            .values()
            .filter(|c| matches_param(c, "ticket_id", &id))
            .cloned()
            .collect(),
    ))
}

async fn list_time_entries(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Reply<Json<Vec<Record>>> {
    let store = state.db.read().await;
    if !store.tickets.contains_key(&id) {
        return Err(Failure::NotFound);
    }
    let id = id.to_string();
    Ok(Json(
        store
            .time_entries
            .values()
            .filter(|e| matches_param(e, "ticket_id", &id))
            .cloned()
            .collect(),
    ))
}

async fn create_reply(
    State(state): State<AppState>,
    Path(ticket_id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<(StatusCode, Json<Record>)> {
    add_conversation(state, ticket_id, input, false).await
}

async fn create_note(
    State(state): State<AppState>,
    Path(ticket_id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<(StatusCode, Json<Record>)> {
    add_conversation(state, ticket_id, input, true).await
}

async fn add_conversation(
    state: AppState,
    ticket_id: u64,
    input: Record,
    note: bool,
) -> Reply<(StatusCode, Json<Record>)> {
    let mut store = state.db.write().await;
    if !store.tickets.contains_key(&ticket_id) {
        return Err(Failure::NotFound);
    }
    if text(&input, "body").is_none() {
        return Err(Failure::Invalid(vec![("body", "It should be a/an String")]));
    }
    let id = store.allocate_id();
    let user_id = store.current_agent;
    let source = if note { 2 } else { 0 };
    let mut conversation = stamped(json!({
        "id": id,
        "ticket_id": ticket_id,
        "user_id": user_id,
        "incoming": false,
        "private": note,
        "source": source,
        "to_emails": [],
        "cc_emails": [],
        "bcc_emails": [],
    }));
    merge(&mut conversation, input);
    let body = conversation.get("body").cloned().unwrap_or(Value::Null);
    conversation.insert("body_text".to_string(), body);
    store.conversations.insert(id, conversation.clone());
    Ok((StatusCode::CREATED, Json(conversation)))
}

async fn update_conversation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<Json<Record>> {
    let mut store = state.db.write().await;
    let conversation = store.conversations.get_mut(&id).ok_or(Failure::NotFound)?;
    merge(conversation, input);
    let body = conversation.get("body").cloned().unwrap_or(Value::Null);
    conversation.insert("body_text".to_string(), body);
    Ok(Json(conversation.clone()))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Reply<StatusCode> {
    let mut store = state.db.write().await;
    store
        .conversations
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}

async fn list_ticket_fields() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "requester", "label": "Search a requester", "type": "default_requester", "position": 1, "default": true, "required_for_agents": true},
        {"id": 2, "name": "subject", "label": "Subject", "type": "default_subject", "position": 2, "default": true, "required_for_agents": true},
        {"id": 3, "name": "status", "label": "Status", "type": "default_status", "position": 3, "default": true, "required_for_agents": true,
         "choices": {"2": ["Open", "Being Processed"], "3": ["Pending", "Awaiting your Reply"], "4": ["Resolved", "This ticket has been Resolved"], "5": ["Closed", "This ticket has been Closed"]}},
        {"id": 4, "name": "priority", "label": "Priority", "type": "default_priority", "position": 4, "default": true, "required_for_agents": true,
         "choices": {"Low": 1, "Medium": 2, "High": 3, "Urgent": 4}}
    ]))
}

// --- contacts ---

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Record>> {
    let store = state.db.read().await;
    let contacts = store
        .contacts
        .values()
        .filter(|c| {
            ["email", "mobile", "phone", "company_id"]
                .iter()
                .all(|key| params.get(*key).map_or(true, |v| matches_param(c, key, v)))
        })
        .cloned()
        .collect();
    Json(contacts)
}

async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<Record>,
) -> Reply<(StatusCode, Json<Record>)> {
    if text(&input, "name").is_none() {
        return Err(Failure::Invalid(vec![("name", "It should be a/an String")]));
    }
    let has_identity = ["email", "phone", "mobile", "twitter_id", "unique_external_id"]
        .iter()
        .any(|key| text(&input, key).is_some());
    if !has_identity {
        return Err(Failure::Invalid(vec![(
            "email",
            "Please fill at least 1 of email, mobile, phone, twitter_id, unique_external_id fields",
        )]));
    }
    let mut store = state.db.write().await;
    if let Some(email) = text(&input, "email") {
        if store.contact_by_email(email).is_some() {
            return Err(Failure::Conflict("Email has already been taken"));
        }
    }
    let id = store.allocate_id();
    let mut contact = stamped(json!({
        "id": id,
        "active": false,
        "tags": [],
        "other_emails": [],
        "custom_fields": {},
    }));
    merge(&mut contact, input);
    store.contacts.insert(id, contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<Json<Record>> {
    let store = state.db.read().await;
    store.contacts.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<Json<Record>> {
    let mut store = state.db.write().await;
    if let Some(email) = text(&input, "email") {
        if store.contact_by_email(email).is_some_and(|owner| owner != id) {
            return Err(Failure::Conflict("Email has already been taken"));
        }
    }
    let contact = store.contacts.get_mut(&id).ok_or(Failure::NotFound)?;
    merge(contact, input);
    Ok(Json(contact.clone()))
}

async fn delete_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<StatusCode> {
    let mut store = state.db.write().await;
    store
        .contacts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}

async fn make_agent(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<Json<Record>> {
    let mut store = state.db.write().await;
    let contact = store.contacts.get(&id).cloned().ok_or(Failure::NotFound)?;
    if store.agents.contains_key(&id) {
        return Err(Failure::Conflict("Contact is already an agent"));
    }
    let mut card = contact;
    card.remove("id");
    let agent = stamped(json!({
        "id": id,
        "available": false,
        "occasional": false,
        "signature": null,
        "ticket_scope": 1,
        "group_ids": [],
        "role_ids": [],
        "contact": card,
    }));
    store.agents.insert(id, agent.clone());
    Ok(Json(agent))
}

async fn list_contact_fields() -> Json<Value> {
    Json(json!([
        {"id": 11, "name": "name", "label": "Full Name", "type": "default_name", "position": 1, "default": true, "required_for_agents": true},
        {"id": 12, "name": "email", "label": "Email", "type": "default_email", "position": 2, "default": true, "required_for_agents": false},
        {"id": 13, "name": "company_name", "label": "Company", "type": "default_company_name", "position": 3, "default": true, "required_for_agents": false}
    ]))
}

// --- companies ---

fn company_by_name(store: &Store, name: &str) -> Option<u64> {
    store
        .companies
        .iter()
        .find(|(_, c)| text(c, "name").is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .map(|(id, _)| *id)
}

async fn list_companies(State(state): State<AppState>) -> Json<Vec<Record>> {
    let store = state.db.read().await;
    Json(store.companies.values().cloned().collect())
}

async fn create_company(
    State(state): State<AppState>,
    Json(input): Json<Record>,
) -> Reply<(StatusCode, Json<Record>)> {
    let Some(name) = text(&input, "name") else {
        return Err(Failure::Invalid(vec![("name", "It should be a/an String")]));
    };
    let mut store = state.db.write().await;
    if company_by_name(&store, name).is_some() {
        return Err(Failure::Conflict("Name has already been taken"));
    }
    let id = store.allocate_id();
    let mut company = stamped(json!({
        "id": id,
        "description": null,
        "note": null,
        "domains": [],
        "custom_fields": {},
    }));
    merge(&mut company, input);
    store.companies.insert(id, company.clone());
    Ok((StatusCode::CREATED, Json(company)))
}

async fn get_company(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<Json<Record>> {
    let store = state.db.read().await;
    store.companies.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Record>,
) -> Reply<Json<Record>> {
    let mut store = state.db.write().await;
    if let Some(name) = text(&input, "name") {
        if company_by_name(&store, name).is_some_and(|owner| owner != id) {
            return Err(Failure::Conflict("Name has already been taken"));
        }
    }
    let company = store.companies.get_mut(&id).ok_or(Failure::NotFound)?;
    merge(company, input);
    Ok(Json(company.clone()))
}

async fn delete_company(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<StatusCode> {
    let mut store = state.db.write().await;
    store
        .companies
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}

// --- agents and search ---

async fn list_agents(State(state): State<AppState>) -> Json<Vec<Record>> {
    let store = state.db.read().await;
    Json(store.agents.values().cloned().collect())
}

async fn current_agent(State(state): State<AppState>) -> Reply<Json<Record>> {
    let store = state.db.read().await;
    store
        .agents
        .get(&store.current_agent)
        .cloned()
        .map(Json)
        .ok_or(Failure::NotFound)
}

async fn get_agent(State(state): State<AppState>, Path(id): Path<u64>) -> Reply<Json<Record>> {
    let store = state.db.read().await;
    store.agents.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

/// Supports `field:value` terms joined with ` AND `, wrapped in quotes.
async fn search_tickets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply<Json<Value>> {
    let expression = params
        .get("query")
        .map(|q| q.trim().trim_matches('"').trim())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Failure::Invalid(vec![("query", "It should be a/an String")]))?;
    let terms: Vec<(&str, &str)> = expression
        .split(" AND ")
        .filter_map(|term| term.trim().split_once(':'))
        .map(|(field, value)| (field.trim(), value.trim().trim_matches('\'')))
        .collect();

    let store = state.db.read().await;
    let results: Vec<Record> = store
        .tickets
        .values()
        .filter(|t| !is_deleted(t))
        .filter(|t| terms.iter().all(|(field, value)| matches_param(t, field, value)))
        .cloned()
        .collect();
    Ok(Json(json!({"total": results.len(), "results": results})))
}
