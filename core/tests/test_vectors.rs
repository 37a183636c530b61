//! Verify request building and response classification against the JSON
//! vectors stored in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON (not raw strings) to avoid false
//! negatives from field ordering.

use helpdesk_core::{
    classify, ApiError, ContactFilter, CreateCompany, CreateContact, CreateNote, CreateReply,
    CreateTicket, ErrorKind, HelpdeskClient, HttpMethod, HttpRequest, HttpResponse, TicketFilter,
    UpdateCompany, UpdateContact, UpdateConversation, UpdateTicket,
};
use serde_json::Value;

const BASE_URL: &str = "https://acme.example.com";

fn client() -> HelpdeskClient {
    HelpdeskClient::new(BASE_URL, "abc123").unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "transport" => ErrorKind::Transport,
        "decode" => ErrorKind::Decode,
        "application" => ErrorKind::Application,
        other => panic!("unknown error kind: {other}"),
    }
}

fn input<T: serde::de::DeserializeOwned>(case: &Value) -> T {
    serde_json::from_value(case["input"].clone()).unwrap()
}

fn id(case: &Value) -> u64 {
    case["id"].as_u64().unwrap()
}

/// Dispatch one vector to the matching `build_*` method.
fn build(c: &HelpdeskClient, case: &Value) -> HttpRequest {
    match case["operation"].as_str().unwrap() {
        "list_tickets" => c.build_list_tickets(&TicketFilter::default()),
        "list_ticket_fields" => c.build_list_ticket_fields(),
        "create_ticket" => c.build_create_ticket(&input::<CreateTicket>(case)).unwrap(),
        "get_ticket" => c.build_get_ticket(id(case)),
        "update_ticket" => c.build_update_ticket(id(case), &input::<UpdateTicket>(case)).unwrap(),
        "delete_ticket" => c.build_delete_ticket(id(case)),
        "restore_ticket" => c.build_restore_ticket(id(case)),
        "list_conversations" => c.build_list_conversations(id(case)),
        "list_time_entries" => c.build_list_time_entries(id(case)),
        "create_reply" => c.build_create_reply(id(case), &input::<CreateReply>(case)).unwrap(),
        "create_note" => c.build_create_note(id(case), &input::<CreateNote>(case)).unwrap(),
        "update_conversation" => c
            .build_update_conversation(id(case), &input::<UpdateConversation>(case))
            .unwrap(),
        "delete_conversation" => c.build_delete_conversation(id(case)),
        "create_contact" => c.build_create_contact(&input::<CreateContact>(case)).unwrap(),
        "get_contact" => c.build_get_contact(id(case)),
        "list_contacts" => c.build_list_contacts(&ContactFilter::default()),
        "update_contact" => c.build_update_contact(id(case), &input::<UpdateContact>(case)).unwrap(),
        "delete_contact" => c.build_delete_contact(id(case)),
        "make_agent" => c.build_make_agent(id(case)),
        "list_contact_fields" => c.build_list_contact_fields(),
        "create_company" => c.build_create_company(&input::<CreateCompany>(case)).unwrap(),
        "get_company" => c.build_get_company(id(case)),
        "list_companies" => c.build_list_companies(),
        "update_company" => c.build_update_company(id(case), &input::<UpdateCompany>(case)).unwrap(),
        "delete_company" => c.build_delete_company(id(case)),
        "list_agents" => c.build_list_agents(),
        "get_agent" => c.build_get_agent(id(case)),
        "get_current_agent" => c.build_get_current_agent(),
        "search_tickets" => c.build_search_tickets(case["expression"].as_str().unwrap()),
        other => panic!("unknown operation: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    let expected_auth = c.build_list_companies().header("authorization").unwrap().to_string();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["operation"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let req = build(&c, case);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content-type");
        assert_eq!(req.header("authorization"), Some(expected_auth.as_str()), "{name}: authorization");
        assert_eq!(req.body.is_some(), expected_req["has_body"].as_bool().unwrap(), "{name}: body presence");

        if let Some(expected_body) = expected_req.get("body") {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, expected_body, "{name}: body");
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse::new(
            case["status"].as_u64().unwrap() as u16,
            case["body"].as_str().unwrap(),
        );
        let result = classify("/api/v2/vectors", Ok(response));
        let expected = &case["expected"];

        if let Some(data) = expected.get("data") {
            assert_eq!(result.unwrap(), Some(data.clone()), "{name}: data");
        } else if expected.get("no_data").is_some() {
            assert_eq!(result.unwrap(), None, "{name}: no data");
        } else {
            let expected_error = &expected["error"];
            let err: ApiError = result.unwrap_err();
            assert_eq!(err.kind(), parse_kind(expected_error["kind"].as_str().unwrap()), "{name}: kind");
            assert_eq!(err.message(), expected_error["message"].as_str().unwrap(), "{name}: message");
            let payload = err.payload().cloned().unwrap_or(Value::Null);
            assert_eq!(payload, expected_error["payload"], "{name}: payload");
        }
    }
}
