//! Query-string parameters for list operations.
//!
//! `Query` is the untyped form the request builder consumes. `TicketFilter`
//! and `ContactFilter` name the parameters the list endpoints document and
//! lower into a `Query`; anything else can be added through `param`.

/// Ordered `name=value` pairs appended to a request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Repeated names are kept; the service decides how to
    /// treat them.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((name.into(), value.to_string()));
        self
    }

    fn param_opt<V: ToString>(self, name: &str, value: Option<&V>) -> Self {
        match value {
            Some(v) => self.param(name, v.to_string()),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |query, (k, v)| query.param(k, v))
    }
}

/// Filters accepted by the list-tickets endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Predefined filter name, e.g. `new_and_my_open`, `watching`, `spam`,
    /// `deleted`.
    pub filter: Option<String>,
    pub requester_id: Option<u64>,
    pub email: Option<String>,
    pub company_id: Option<u64>,
    /// ISO-8601 timestamp.
    pub updated_since: Option<String>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
    /// Comma separated embeds, e.g. `requester,stats`.
    pub include: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub extra: Vec<(String, String)>,
}

impl TicketFilter {
    pub fn to_query(&self) -> Query {
        let query = Query::new()
            .param_opt("filter", self.filter.as_ref())
            .param_opt("requester_id", self.requester_id.as_ref())
            .param_opt("email", self.email.as_ref())
            .param_opt("company_id", self.company_id.as_ref())
            .param_opt("updated_since", self.updated_since.as_ref())
            .param_opt("order_by", self.order_by.as_ref())
            .param_opt("order_type", self.order_type.as_ref())
            .param_opt("include", self.include.as_ref())
            .param_opt("page", self.page.as_ref())
            .param_opt("per_page", self.per_page.as_ref());
        self.extra
            .iter()
            .fold(query, |q, (k, v)| q.param(k.as_str(), v))
    }
}

/// Filters accepted by the list-contacts endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<u64>,
    /// `blocked`, `deleted`, `unverified` or `verified`.
    pub state: Option<String>,
    pub updated_since: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub extra: Vec<(String, String)>,
}

impl ContactFilter {
    pub fn to_query(&self) -> Query {
        let query = Query::new()
            .param_opt("email", self.email.as_ref())
            .param_opt("mobile", self.mobile.as_ref())
            .param_opt("phone", self.phone.as_ref())
            .param_opt("company_id", self.company_id.as_ref())
            .param_opt("state", self.state.as_ref())
            .param_opt("updated_since", self.updated_since.as_ref())
            .param_opt("page", self.page.as_ref())
            .param_opt("per_page", self.per_page.as_ref());
        self.extra
            .iter()
            .fold(query, |q, (k, v)| q.param(k.as_str(), v))
    }
}

impl From<&TicketFilter> for Query {
    fn from(filter: &TicketFilter) -> Self {
        filter.to_query()
    }
}

impl From<&ContactFilter> for Query {
    fn from(filter: &ContactFilter) -> Self {
        filter.to_query()
    }
}
