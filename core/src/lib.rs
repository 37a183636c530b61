//! Client core for a helpdesk ticketing service's REST API (v2).
//!
//! # Overview
//! Builds `HttpRequest` values and classifies `HttpResponse` values without
//! depending on a particular network stack (host-does-IO pattern). A
//! [`Transport`] performs the actual round-trip; the `ureq` feature (on by
//! default) provides one.
//!
//! # Design
//! - `HelpdeskClient` is stateless: it holds only its `ClientConfig` (base
//!   URL and precomputed Basic credential).
//! - Every operation is a `build_*` method; all responses share one
//!   classifier, so status handling lives in a single place.
//! - `Helpdesk<T>` pairs a client with a transport and decodes responses
//!   into the typed records in [`types`].
//! - Success means 200, 201 or 204. Everything else is an `ApiError` whose
//!   message is the `description` field of the JSON body.
//!
//! ```no_run
//! use helpdesk_core::{ClientConfig, Helpdesk, TicketFilter};
//!
//! let desk = Helpdesk::connect(ClientConfig::new("https://acme.example.com", "api-key")?);
//! for ticket in desk.list_tickets(&TicketFilter::default())? {
//!     println!("#{} {}", ticket.id, ticket.subject.unwrap_or_default());
//! }
//! # Ok::<(), helpdesk_core::ApiError>(())
//! ```

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod helpdesk;
pub mod http;
pub mod query;
pub mod request;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use auth::Credential;
pub use classify::{classify, Classified};
pub use client::HelpdeskClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind, TransportError};
pub use helpdesk::{decode, Helpdesk};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use query::{ContactFilter, Query, TicketFilter};
pub use request::build_request;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    Agent, Company, Contact, Conversation, CreateCompany, CreateContact, CreateNote, CreateReply,
    CreateTicket, FieldDefinition, SearchResults, Ticket, TimeEntry, UpdateCompany, UpdateContact,
    UpdateConversation, UpdateTicket,
};
