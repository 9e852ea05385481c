/**
 * config.rs
 * Store connection settings (YAML format)
 *
 * Format:
 * ```yaml
 * endpoint: http://localhost:7200/repositories/onto
 * updateEndpoint: http://localhost:7200/repositories/onto/statements   # optional
 * username: admin                                                       # optional
 * password: secret                                                      # optional
 * nodeIdPredicate: http://www.ontotext.com/owlim/entity#id             # null disables
 * internalGraph: http://owlready2/internal
 * ```
 *
 * `endpoint: "memory:"` selects the in-process oxigraph store.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::memory::MemoryTransport;
use super::metrics::QueryMetrics;
use super::sparql::SparqlClient;
use super::transport::{HttpTransport, Transport};
use crate::errors::{Result, SpogError};
use crate::graph::{SparqlGraph, INTERNAL_GRAPH};
use crate::query::{QueryGenerator, GRAPHDB_ENTITY_ID};

pub const MEMORY_ENDPOINT: &str = "memory:";

fn default_node_id_predicate() -> Option<String> {
    Some(GRAPHDB_ENTITY_ID.to_string())
}

fn default_internal_graph() -> String {
    INTERNAL_GRAPH.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_node_id_predicate")]
    pub node_id_predicate: Option<String>,
    #[serde(default = "default_internal_graph")]
    pub internal_graph: String,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            update_endpoint: None,
            username: None,
            password: None,
            node_id_predicate: default_node_id_predicate(),
            internal_graph: default_internal_graph(),
        }
    }

    /// In-process oxigraph store
    pub fn memory() -> Self {
        Self {
            node_id_predicate: None,
            ..Self::new(MEMORY_ENDPOINT)
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SpogError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: StoreConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn is_memory(&self) -> bool {
        self.endpoint == MEMORY_ENDPOINT
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(SpogError::Config("endpoint cannot be empty".to_string()));
        }
        if !self.is_memory() && !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(SpogError::Config(format!(
                "endpoint '{}' must be an http(s) URL or '{}'",
                self.endpoint, MEMORY_ENDPOINT
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(SpogError::Config("password given without username".to_string()));
        }
        if self.internal_graph.trim().is_empty() {
            return Err(SpogError::Config("internalGraph cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn build_transport(&self) -> Result<Box<dyn Transport>> {
        self.validate()?;
        if self.is_memory() {
            return Ok(Box::new(MemoryTransport::new()?));
        }
        let mut transport = HttpTransport::new(&self.endpoint)?;
        if let Some(update_endpoint) = &self.update_endpoint {
            transport = transport.with_update_endpoint(update_endpoint.clone());
        }
        if let Some(username) = &self.username {
            transport = transport.with_credentials(username.clone(), self.password.clone());
        }
        Ok(Box::new(transport))
    }

    /// Generator matching the store: the memory store never has node ids
    pub fn generator(&self) -> QueryGenerator {
        if self.is_memory() {
            QueryGenerator::without_node_ids()
        } else {
            QueryGenerator::new(self.node_id_predicate.clone())
        }
    }

    pub fn connect(&self) -> Result<SparqlGraph> {
        let client = SparqlClient::from_boxed(self.build_transport()?);
        Ok(SparqlGraph::new(client, self.generator(), self.internal_graph.clone()))
    }

    /// Like [`connect`](Self::connect), reporting every request to `metrics`
    pub fn connect_with_metrics(&self, metrics: Arc<dyn QueryMetrics>) -> Result<SparqlGraph> {
        let client = SparqlClient::from_boxed(self.build_transport()?).with_metrics(metrics);
        Ok(SparqlGraph::new(client, self.generator(), self.internal_graph.clone()))
    }
}
