/**
 * client module
 *
 * - classify: read/write routing of request text
 * - transport: Transport trait + HTTP transport (reqwest)
 * - memory: in-process oxigraph transport
 * - results: SPARQL JSON results and row decoding
 * - metrics: injectable per-label accounting
 * - sparql: SparqlClient
 * - config: StoreConfig (YAML)
 */

pub mod classify;
pub mod config;
pub mod memory;
pub mod metrics;
pub mod results;
pub mod sparql;
pub mod transport;

pub use classify::{classify, Connection, RequestKind};
pub use config::{StoreConfig, MEMORY_ENDPOINT};
pub use memory::MemoryTransport;
pub use metrics::{LabelStats, NoMetrics, QueryMetrics, SessionMetrics};
pub use results::{decode, decode_row, RawKind, RawTerm, Row, SparqlResults, Term};
pub use sparql::SparqlClient;
pub use transport::{HttpTransport, Transport, TransportResponse};
