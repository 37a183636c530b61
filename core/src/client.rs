//! Stateless request builder and response parser for the helpdesk API.
//!
//! # Design
//! `HelpdeskClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation has a `build_*` method that produces
//! an `HttpRequest`; every response goes through the same `parse` step, so
//! status handling is defined once. The caller (or [`crate::Helpdesk`])
//! executes the HTTP round-trip in between.

use serde::Serialize;

use crate::classify::{classify_response, Classified};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{ContactFilter, Query, TicketFilter};
use crate::request::{build_bodyless, build_request};
use crate::types::{
    CreateCompany, CreateContact, CreateNote, CreateReply, CreateTicket, UpdateCompany,
    UpdateContact, UpdateConversation, UpdateTicket,
};

/// Synchronous, stateless client for the helpdesk API.
#[derive(Debug, Clone)]
pub struct HelpdeskClient {
    config: ClientConfig,
}

impl HelpdeskClient {
    /// Build a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        Ok(Self::from_config(ClientConfig::new(base_url, api_key)?))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Classify an executed response. `Ok(None)` means 204 No Content.
    pub fn parse(&self, response: &HttpResponse) -> Result<Classified, ApiError> {
        classify_response(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{path}", self.config.base_url())
    }

    fn bodyless(&self, method: HttpMethod, path: &str, query: Option<&Query>) -> HttpRequest {
        build_bodyless(method, self.config.credential(), self.url(path), query)
    }

    fn with_body<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        build_request(method, self.config.credential(), self.url(path), None, Some(body))
    }

    // --- tickets ---

    pub fn build_list_tickets(&self, filter: &TicketFilter) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "tickets", Some(&filter.to_query()))
    }

    pub fn build_list_ticket_fields(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "ticket_fields", None)
    }

    pub fn build_create_ticket(&self, input: &CreateTicket) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "tickets", input)
    }

    pub fn build_get_ticket(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Get, &format!("tickets/{id}"), None)
    }

    pub fn build_update_ticket(
        &self,
        id: u64,
        input: &UpdateTicket,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("tickets/{id}"), input)
    }

    pub fn build_delete_ticket(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Delete, &format!("tickets/{id}"), None)
    }

    pub fn build_restore_ticket(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Put, &format!("tickets/{id}/restore"), None)
    }

    pub fn build_list_conversations(&self, ticket_id: u64) -> HttpRequest {
        self.bodyless(
            HttpMethod::Get,
            &format!("tickets/{ticket_id}/conversations"),
            None,
        )
    }

    pub fn build_list_time_entries(&self, ticket_id: u64) -> HttpRequest {
        self.bodyless(
            HttpMethod::Get,
            &format!("tickets/{ticket_id}/time_entries"),
            None,
        )
    }

    /// Search tickets with a query-language expression such as
    /// `priority:3 AND status:2`. The expression is quoted for the caller.
    /// The expression is sent wrapped in double quotes; one pair of quotes
    /// already around it is not doubled.
    pub fn build_search_tickets(&self, expression: &str) -> HttpRequest {
        let expression = expression.trim();
        let inner = expression
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(expression);
        let query = Query::new().param("query", format!("\"{inner}\""));
        self.bodyless(HttpMethod::Get, "search/tickets", Some(&query))
    }

    // --- conversations ---

    pub fn build_create_reply(
        &self,
        ticket_id: u64,
        input: &CreateReply,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("tickets/{ticket_id}/reply"), input)
    }

    pub fn build_create_note(
        &self,
        ticket_id: u64,
        input: &CreateNote,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("tickets/{ticket_id}/notes"), input)
    }

    pub fn build_update_conversation(
        &self,
        id: u64,
        input: &UpdateConversation,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("conversations/{id}"), input)
    }

    pub fn build_delete_conversation(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Delete, &format!("conversations/{id}"), None)
    }

    // --- contacts ---

    pub fn build_create_contact(&self, input: &CreateContact) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "contacts", input)
    }

    pub fn build_get_contact(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Get, &format!("contacts/{id}"), None)
    }

    pub fn build_list_contacts(&self, filter: &ContactFilter) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "contacts", Some(&filter.to_query()))
    }

    pub fn build_update_contact(
        &self,
        id: u64,
        input: &UpdateContact,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("contacts/{id}"), input)
    }

    pub fn build_delete_contact(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Delete, &format!("contacts/{id}"), None)
    }

    pub fn build_make_agent(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Put, &format!("contacts/{id}/make_agent"), None)
    }

    pub fn build_list_contact_fields(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "contact_fields", None)
    }

    // --- agents ---

    pub fn build_list_agents(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "agents", None)
    }

    pub fn build_get_agent(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Get, &format!("agents/{id}"), None)
    }

    pub fn build_get_current_agent(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "agents/me", None)
    }

    // --- companies ---

    pub fn build_create_company(&self, input: &CreateCompany) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "companies", input)
    }

    pub fn build_get_company(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Get, &format!("companies/{id}"), None)
    }

    pub fn build_list_companies(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, "companies", None)
    }

    pub fn build_update_company(
        &self,
        id: u64,
        input: &UpdateCompany,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("companies/{id}"), input)
    }

    pub fn build_delete_company(&self, id: u64) -> HttpRequest {
        self.bodyless(HttpMethod::Delete, &format!("companies/{id}"), None)
    }
}
