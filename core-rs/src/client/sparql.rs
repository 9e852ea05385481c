/**
 * sparql.rs
 * SPARQL client: one transport, read/write routing, error surfacing
 *
 * Fragments are joined with ';' into a single request so a delete and the
 * insert that replaces it reach the store together. No retries: a failed
 * request is logged with its text and returned to the caller.
 */

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use super::classify::{classify, Connection, RequestKind};
use super::metrics::{NoMetrics, QueryMetrics};
use super::results::SparqlResults;
use super::transport::Transport;
use crate::errors::{Result, SpogError};

pub struct SparqlClient {
    transport: Box<dyn Transport>,
    metrics: Arc<dyn QueryMetrics>,
}

impl SparqlClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            metrics: Arc::new(NoMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn QueryMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    /// Send `fragments` as one request.
    ///
    /// Routing follows `kind` when given, else the classification of the first
    /// fragment. Reads return the parsed results, writes return `None`.
    pub fn execute(&self, label: &str, fragments: &[&str], kind: Option<RequestKind>) -> Result<Option<SparqlResults>> {
        let Some(first) = fragments.first() else {
            return Err(SpogError::InvalidInput(format!("{}: nothing to execute", label)));
        };
        let connection = kind.unwrap_or_else(|| classify(first));
        let body = fragments.join(" ;\n");
        debug!(label = label, %connection, query = %body, "sending request");

        let started = Instant::now();
        let response = match self.transport.send(connection, &body) {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record(label, connection, started.elapsed(), false);
                error!(label = label, %connection, query = %body, error = %e, "request failed");
                return Err(e);
            }
        };
        let elapsed = started.elapsed();

        if response.is_error() {
            self.metrics.record(label, connection, elapsed, false);
            error!(
                label = label,
                %connection,
                status = response.status,
                query = %body,
                body = %response.body,
                "endpoint rejected request"
            );
            return Err(SpogError::HttpStatus {
                connection,
                status: response.status,
                body: response.body,
                query: body,
            });
        }
        self.metrics.record(label, connection, elapsed, true);
        debug!(label = label, elapsed_ms = elapsed.as_millis() as u64, "request done");

        match connection {
            Connection::Update => Ok(None),
            Connection::Query => SparqlResults::from_json(&response.body).map(Some),
        }
    }

    /// Read request that must produce results
    pub fn select(&self, label: &str, query: &str) -> Result<SparqlResults> {
        self.execute(label, &[query], Some(Connection::Query))?
            .ok_or_else(|| SpogError::Decode(format!("{}: read request returned no results", label)))
    }

    /// Write request(s) sent as one body
    pub fn update(&self, label: &str, fragments: &[&str]) -> Result<()> {
        self.execute(label, fragments, Some(Connection::Update)).map(|_| ())
    }
}
