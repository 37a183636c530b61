//! Typed façade over `HelpdeskClient` and a `Transport`.
//!
//! Every method builds its request, sends it once, classifies the outcome
//! and decodes the data into the operation's record. Exactly one result is
//! returned per call; there are no retries.

use serde::de::DeserializeOwned;
use tracing::{instrument, Span};

use crate::classify::{classify, Classified};
use crate::client::HelpdeskClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::query::{ContactFilter, TicketFilter};
use crate::types::{
    Agent, Company, Contact, Conversation, CreateCompany, CreateContact, CreateNote, CreateReply,
    CreateTicket, FieldDefinition, SearchResults, Ticket, TimeEntry, UpdateCompany, UpdateContact,
    UpdateConversation, UpdateTicket,
};

/// A `HelpdeskClient` bound to a transport.
#[derive(Debug, Clone)]
pub struct Helpdesk<T> {
    client: HelpdeskClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl Helpdesk<crate::transport::UreqTransport> {
    /// Client over the default `ureq` transport.
    pub fn connect(config: ClientConfig) -> Self {
        Self::new(
            HelpdeskClient::from_config(config),
            crate::transport::UreqTransport::new(),
        )
    }
}

impl<T: Transport> Helpdesk<T> {
    pub fn new(client: HelpdeskClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn with_config(config: ClientConfig, transport: T) -> Self {
        Self::new(HelpdeskClient::from_config(config), transport)
    }

    pub fn client(&self) -> &HelpdeskClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a prepared request and classify the outcome without decoding.
    #[instrument(
        name = "helpdesk_request",
        skip_all,
        fields(
            http.method = %request.method,
            http.url = %request.url,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub fn execute(&self, request: &HttpRequest) -> Result<Classified, ApiError> {
        let outcome = self.transport.send(request);
        if let Ok(response) = &outcome {
            Span::current().record("http.status_code", response.status);
        }
        classify(&request.path(), outcome)
    }

    fn fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        decode(self.execute(&request)?)
    }

    fn discard(&self, request: HttpRequest) -> Result<(), ApiError> {
        self.execute(&request).map(|_| ())
    }

    // --- tickets ---

    pub fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ApiError> {
        self.fetch(self.client.build_list_tickets(filter))
    }

    pub fn list_ticket_fields(&self) -> Result<Vec<FieldDefinition>, ApiError> {
        self.fetch(self.client.build_list_ticket_fields())
    }

    pub fn create_ticket(&self, input: &CreateTicket) -> Result<Ticket, ApiError> {
        self.fetch(self.client.build_create_ticket(input)?)
    }

    pub fn get_ticket(&self, id: u64) -> Result<Ticket, ApiError> {
        self.fetch(self.client.build_get_ticket(id))
    }

    pub fn update_ticket(&self, id: u64, input: &UpdateTicket) -> Result<Ticket, ApiError> {
        self.fetch(self.client.build_update_ticket(id, input)?)
    }

    pub fn delete_ticket(&self, id: u64) -> Result<(), ApiError> {
        self.discard(self.client.build_delete_ticket(id))
    }

    pub fn restore_ticket(&self, id: u64) -> Result<(), ApiError> {
        self.discard(self.client.build_restore_ticket(id))
    }

    pub fn list_conversations(&self, ticket_id: u64) -> Result<Vec<Conversation>, ApiError> {
        self.fetch(self.client.build_list_conversations(ticket_id))
    }

    pub fn list_time_entries(&self, ticket_id: u64) -> Result<Vec<TimeEntry>, ApiError> {
        self.fetch(self.client.build_list_time_entries(ticket_id))
    }

    pub fn search_tickets(&self, expression: &str) -> Result<SearchResults<Ticket>, ApiError> {
        self.fetch(self.client.build_search_tickets(expression))
    }

    // --- conversations ---

    pub fn create_reply(
        &self,
        ticket_id: u64,
        input: &CreateReply,
    ) -> Result<Conversation, ApiError> {
        self.fetch(self.client.build_create_reply(ticket_id, input)?)
    }

    pub fn create_note(
        &self,
        ticket_id: u64,
        input: &CreateNote,
    ) -> Result<Conversation, ApiError> {
        self.fetch(self.client.build_create_note(ticket_id, input)?)
    }

    pub fn update_conversation(
        &self,
        id: u64,
        input: &UpdateConversation,
    ) -> Result<Conversation, ApiError> {
        self.fetch(self.client.build_update_conversation(id, input)?)
    }

    pub fn delete_conversation(&self, id: u64) -> Result<(), ApiError> {
        self.discard(self.client.build_delete_conversation(id))
    }

    // --- contacts ---

    pub fn create_contact(&self, input: &CreateContact) -> Result<Contact, ApiError> {
        self.fetch(self.client.build_create_contact(input)?)
    }

    pub fn get_contact(&self, id: u64) -> Result<Contact, ApiError> {
        self.fetch(self.client.build_get_contact(id))
    }

    pub fn list_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ApiError> {
        self.fetch(self.client.build_list_contacts(filter))
    }

    pub fn update_contact(&self, id: u64, input: &UpdateContact) -> Result<Contact, ApiError> {
        self.fetch(self.client.build_update_contact(id, input)?)
    }

    pub fn delete_contact(&self, id: u64) -> Result<(), ApiError> {
        self.discard(self.client.build_delete_contact(id))
    }

    pub fn make_agent(&self, id: u64) -> Result<Agent, ApiError> {
        self.fetch(self.client.build_make_agent(id))
    }

    pub fn list_contact_fields(&self) -> Result<Vec<FieldDefinition>, ApiError> {
        self.fetch(self.client.build_list_contact_fields())
    }

    // --- agents ---

    pub fn list_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.fetch(self.client.build_list_agents())
    }

    pub fn get_agent(&self, id: u64) -> Result<Agent, ApiError> {
        self.fetch(self.client.build_get_agent(id))
    }

    pub fn get_current_agent(&self) -> Result<Agent, ApiError> {
        self.fetch(self.client.build_get_current_agent())
    }

    // --- companies ---

    pub fn create_company(&self, input: &CreateCompany) -> Result<Company, ApiError> {
        self.fetch(self.client.build_create_company(input)?)
    }

    pub fn get_company(&self, id: u64) -> Result<Company, ApiError> {
        self.fetch(self.client.build_get_company(id))
    }

    pub fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.fetch(self.client.build_list_companies())
    }

    pub fn update_company(&self, id: u64, input: &UpdateCompany) -> Result<Company, ApiError> {
        self.fetch(self.client.build_update_company(id, input)?)
    }

    pub fn delete_company(&self, id: u64) -> Result<(), ApiError> {
        self.discard(self.client.build_delete_company(id))
    }
}

/// Decode classified data into a typed record.
pub fn decode<R: DeserializeOwned>(data: Classified) -> Result<R, ApiError> {
    let value = data.ok_or_else(|| ApiError::Decode {
        message: "Empty response from API".to_string(),
        payload: None,
    })?;
    match <R as serde::Deserialize>::deserialize(&value) {
        Ok(record) => Ok(record),
        Err(e) => Err(ApiError::Decode {
            message: format!("Unexpected response shape: {e}"),
            payload: Some(value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::error::{ErrorKind, TransportError};
    use crate::http::{HttpMethod, HttpResponse};
    use serde_json::json;

    /// Replays canned outcomes and records what was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn reply(self, status: u16, body: &str) -> Self {
            self.outcomes
                .borrow_mut()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        fn fail(self, message: &'static str) -> Self {
            self.outcomes
                .borrow_mut()
                .push_back(Err(TransportError::new(message)));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.borrow_mut().push(request.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("no scripted response")))
        }
    }

    fn helpdesk(transport: ScriptedTransport) -> Helpdesk<ScriptedTransport> {
        let client = HelpdeskClient::new("https://acme.example.com", "abc123").unwrap();
        Helpdesk::new(client, transport)
    }

    #[test]
    fn get_ticket_decodes_record() {
        let desk = helpdesk(ScriptedTransport::default().reply(200, r#"{"id":42,"subject":"Hi"}"#));
        let ticket = desk.get_ticket(42).unwrap();
        assert_eq!(ticket.id, 42);
        assert_eq!(ticket.subject.as_deref(), Some("Hi"));

        let sent = desk.transport().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "https://acme.example.com/api/v2/tickets/42");
        assert!(sent[0].body.is_none());
    }

    #[test]
    fn delete_accepts_no_content() {
        let desk = helpdesk(ScriptedTransport::default().reply(204, ""));
        desk.delete_ticket(42).unwrap();
    }

    #[test]
    fn restore_accepts_json_body_too() {
        let desk = helpdesk(ScriptedTransport::default().reply(200, "{}"));
        desk.restore_ticket(42).unwrap();
    }

    #[test]
    fn conflict_surfaces_application_error() {
        let desk = helpdesk(
            ScriptedTransport::default().reply(409, r#"{"description":"Name has already been taken"}"#),
        );
        let err = desk
            .create_company(&CreateCompany {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.message(), "Name has already been taken");
    }

    #[test]
    fn transport_failure_is_returned_once() {
        let desk = helpdesk(ScriptedTransport::default().fail("connection refused"));
        let err = desk.list_companies().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(desk.transport().sent.borrow().len(), 1);
    }

    #[test]
    fn no_content_for_typed_record_is_decode_error() {
        let desk = helpdesk(ScriptedTransport::default().reply(204, ""));
        let err = desk.get_contact(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.message(), "Empty response from API");
    }

    #[test]
    fn wrong_shape_keeps_payload() {
        let desk = helpdesk(ScriptedTransport::default().reply(200, r#"{"unexpected":true}"#));
        let err = desk.list_contacts(&ContactFilter::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.message().starts_with("Unexpected response shape"));
        assert_eq!(err.payload(), Some(&json!({"unexpected": true})));
    }

    #[test]
    fn execute_returns_raw_classified_data() {
        let desk = helpdesk(ScriptedTransport::default().reply(200, r#"[{"id":1}]"#));
        let request = desk.client().build_list_agents();
        let data = desk.execute(&request).unwrap();
        assert_eq!(data, Some(json!([{"id": 1}])));
    }

    #[test]
    fn update_sends_extra_fields_at_top_level() {
        let desk = helpdesk(ScriptedTransport::default().reply(200, r#"{"id":3}"#));
        let mut input = UpdateTicket::default();
        input.extra.insert("ok".to_string(), json!(1));
        let ticket = desk.update_ticket(3, &input).unwrap();
        assert_eq!(ticket.id, 3);
        let sent = desk.transport().sent.borrow();
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"ok":1}"#));
    }

    #[test]
    fn list_time_entries_decodes_entries() {
        let desk = helpdesk(ScriptedTransport::default().reply(
            200,
            r#"[{"id":11,"ticket_id":42,"agent_id":7,"billable":true,"time_spent":"01:30","timer_running":false,"note":null}]"#,
        ));
        let entries = desk.list_time_entries(42).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].agent_id, Some(7));
        assert_eq!(entries[0].time_spent.as_deref(), Some("01:30"));
        assert_eq!(entries[0].note, None);

        let sent = desk.transport().sent.borrow();
        assert_eq!(sent[0].url, "https://acme.example.com/api/v2/tickets/42/time_entries");
    }

    #[test]
    fn null_collections_in_response_are_accepted() {
        let desk = helpdesk(ScriptedTransport::default().reply(
            200,
            r#"[{"id":5,"body":"Hi","to_emails":null,"cc_emails":null,"bcc_emails":null}]"#,
        ));
        let conversations = desk.list_conversations(9).unwrap();
        assert!(conversations[0].bcc_emails.is_empty());
    }
}
