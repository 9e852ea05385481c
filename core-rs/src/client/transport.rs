//! Request transports
//!
//! A transport sends one SPARQL request body through the query or update
//! connection and hands back the raw status and body. Status interpretation
//! belongs to [`super::SparqlClient`].

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};

use super::classify::Connection;
use crate::errors::{Result, SpogError};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Raw response of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

pub trait Transport: Send + Sync {
    fn send(&self, connection: Connection, body: &str) -> Result<TransportResponse>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

/// SPARQL 1.1 protocol over HTTP (reqwest, blocking)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    query_url: String,
    update_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl HttpTransport {
    /// Transport for a repository endpoint.
    /// The update endpoint defaults to `<endpoint>/statements` (GraphDB layout).
    ///
    /// # Example
    ///
    /// ```
    /// use spog_core::client::HttpTransport;
    ///
    /// let transport = HttpTransport::new("http://localhost:7200/repositories/onto").unwrap();
    /// assert_eq!(transport.update_url(), "http://localhost:7200/repositories/onto/statements");
    /// ```
    pub fn new(endpoint: &str) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(SpogError::Config("endpoint cannot be empty".to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| SpogError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            query_url: endpoint.to_string(),
            update_url: format!("{}/statements", endpoint.trim_end_matches('/')),
            credentials: None,
        })
    }

    pub fn with_update_endpoint(mut self, update_url: impl Into<String>) -> Self {
        self.update_url = update_url.into();
        self
    }

    /// Basic-auth credentials, sent on both connections
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((username.into(), password));
        self
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, connection: Connection, body: &str) -> Result<TransportResponse> {
        let transport_error = |message: String| SpogError::Transport {
            connection,
            message,
            query: body.to_string(),
        };

        let (url, field) = match connection {
            Connection::Query => (&self.query_url, "query"),
            Connection::Update => (&self.update_url, "update"),
        };
        let mut request = self
            .client
            .post(url)
            .header(USER_AGENT, concat!("spog/", env!("CARGO_PKG_VERSION")))
            .form(&[(field, body)]);
        if connection == Connection::Query {
            request = request.header(ACCEPT, SPARQL_RESULTS_JSON);
        }
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let response = request.send().map_err(|e| transport_error(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| transport_error(e.to_string()))?;
        Ok(TransportResponse { status, body: text })
    }

    fn describe(&self) -> String {
        self.query_url.clone()
    }
}
