//! Integration tests against a scripted GraphDB-style endpoint
//!
//! The transport replays canned SPARQL JSON (including `?sid`/`?oid` internal
//! ids) and records every request, so these tests cover:
//! - read/update routing
//! - blank node decoding through internal ids
//! - error propagation and per-label metrics

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use spog_core::client::{HttpTransport, TransportResponse};
use spog_core::{
    Connection, OntologyRef, QueryGenerator, QueryValue, SessionMetrics, SparqlClient, SparqlGraph, SpogError,
    Transport,
};

type Sent = Arc<Mutex<Vec<(Connection, String)>>>;

struct ScriptedEndpoint {
    responses: Mutex<VecDeque<spog_core::Result<TransportResponse>>>,
    sent: Sent,
}

impl Transport for ScriptedEndpoint {
    fn send(&self, connection: Connection, body: &str) -> spog_core::Result<TransportResponse> {
        self.sent.lock().push((connection, body.to_string()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse { status: 204, body: String::new() }))
    }

    fn describe(&self) -> String {
        "scripted graphdb".to_string()
    }
}

const EMPTY: &str = r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#;

fn endpoint(responses: Vec<spog_core::Result<TransportResponse>>) -> (SparqlClient, Sent, Arc<SessionMetrics>) {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let metrics = Arc::new(SessionMetrics::new());
    let transport = ScriptedEndpoint {
        responses: Mutex::new(responses.into_iter().collect()),
        sent: Arc::clone(&sent),
    };
    let client = SparqlClient::new(transport).with_metrics(metrics.clone());
    (client, sent, metrics)
}

fn ok(body: &str) -> spog_core::Result<TransportResponse> {
    Ok(TransportResponse::ok(body))
}

/// Graph with `http://ex.org/onto` attached as context 1
fn attached(responses: Vec<spog_core::Result<TransportResponse>>) -> (SparqlGraph, Sent, Arc<SessionMetrics>) {
    let mut all = vec![ok(EMPTY), ok(EMPTY)];
    all.extend(responses);
    let (client, sent, metrics) = endpoint(all);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);
    graph.attach(OntologyRef::new("http://ex.org/onto#", "http://ex.org/onto")).unwrap();
    sent.lock().clear();
    metrics.reset();
    (graph, sent, metrics)
}

const RESTRICTIONS: &str = r#"{
  "head": {"vars": ["g", "s", "p", "o", "sid", "oid"]},
  "results": {"bindings": [
    {"g": {"type": "uri", "value": "http://ex.org/onto"},
     "s": {"type": "uri", "value": "http://ex.org/onto#Pizza"},
     "p": {"type": "uri", "value": "http://www.w3.org/2000/01/rdf-schema#subClassOf"},
     "o": {"type": "bnode", "value": "node1hq2"},
     "sid": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#long", "value": "1021"},
     "oid": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#long", "value": "5310"}},
    {"g": {"type": "uri", "value": "http://ex.org/onto"},
     "s": {"type": "uri", "value": "http://ex.org/onto#Pizza"},
     "p": {"type": "uri", "value": "http://www.w3.org/2000/01/rdf-schema#subClassOf"},
     "o": {"type": "uri", "value": "http://ex.org/onto#Food"},
     "sid": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#long", "value": "1021"},
     "oid": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#long", "value": "1022"}}
  ]}
}"#;

/// Test: blank objects surface as the negated internal id
#[test]
fn test_blank_objects_use_internal_ids() {
    let (graph, sent, _) = attached(vec![ok(RESTRICTIONS)]);
    let pizza = graph.abbreviate("http://ex.org/onto#Pizza");
    let sub_class_of = graph.abbreviate("http://www.w3.org/2000/01/rdf-schema#subClassOf");

    let objects: Vec<_> = graph
        .get_obj_triples_sp_o(pizza, sub_class_of)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let food = graph.table().lookup("http://ex.org/onto#Food").unwrap();
    assert_eq!(objects, vec![-5310, food]);
    assert!(food > 300);

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    let (connection, text) = &sent[0];
    assert_eq!(*connection, Connection::Query);
    assert!(text.starts_with("select ?g ?s ?p ?o ?sid ?oid\nfrom named <http://ex.org/onto>\nwhere {"));
    assert!(text.contains("?o <http://www.ontotext.com/owlim/entity#id> ?oid ."));
    assert!(text.contains("filter(isIRI(?o) || isBlank(?o))"));
}

/// Test: a blank subject is bound through its id column
#[test]
fn test_blank_subject_reads_and_writes() {
    let (client, sent, _) = endpoint(vec![ok(EMPTY), ok(EMPTY), ok(EMPTY)]);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);
    let (sub, _) = graph.attach(OntologyRef::new("http://ex.org/onto#", "http://ex.org/onto")).unwrap();
    sent.lock().clear();
    let p = graph.abbreviate("http://www.w3.org/2002/07/owl#onProperty");
    let q = graph.abbreviate("http://ex.org/onto#hasTopping");

    assert_eq!(graph.get_obj_triples_s_po(-5310).unwrap().count(), 0);
    sub.add_obj_triple_raw_spo(-5310, p, q).unwrap();

    let sent = sent.lock();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("bind(5310 as ?sid)"));
    let (connection, insert) = &sent[1];
    assert_eq!(*connection, Connection::Update);
    assert_eq!(
        insert,
        "insert {\n    graph <http://ex.org/onto> { ?s <http://www.w3.org/2002/07/owl#onProperty> <http://ex.org/onto#hasTopping> . }\n}\nwhere {\n    ?s <http://www.ontotext.com/owlim/entity#id> 5310 .\n}"
    );
}

#[test]
fn test_http_status_error_is_propagated() {
    let rejected = Ok(TransportResponse { status: 500, body: "repository is read only".to_string() });
    let (graph, _, metrics) = attached(vec![rejected]);
    let a = graph.abbreviate("http://ex.org/onto#A");

    let err = graph.get_triples_s_p(a).unwrap_err();
    match &err {
        SpogError::HttpStatus { connection, status, body, query } => {
            assert_eq!(*connection, Connection::Query);
            assert_eq!(*status, 500);
            assert_eq!(body, "repository is read only");
            assert!(query.starts_with("select distinct"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(metrics.snapshot()["get_triples_s_p"].failures, 1);
}

#[test]
fn test_transport_error_is_not_retried() {
    let (client, sent, metrics) = endpoint(vec![Err(SpogError::Transport {
        connection: Connection::Update,
        message: "connection refused".to_string(),
        query: "insert data {}".to_string(),
    })]);
    assert!(matches!(client.update("raw", &["insert data {}"]), Err(SpogError::Transport { .. })));
    assert_eq!(sent.lock().len(), 1);
    assert_eq!(metrics.snapshot()["raw"].failures, 1);
}

/// Test: user queries are routed by their first keyword, after the prologue
#[test]
fn test_query_values_routing() {
    let rows = r#"{"head":{"vars":["x","b","n","missing"]},"results":{"bindings":[
        {"x":{"type":"uri","value":"http://ex.org/onto#A"},
         "b":{"type":"bnode","value":"b0"},
         "n":{"type":"literal","datatype":"http://www.w3.org/2001/XMLSchema#integer","value":"3"}},
        {"x":{"type":"uri","value":"http://ex.org/onto#A"},
         "b":{"type":"bnode","value":"b1"},
         "n":{"type":"literal","xml:lang":"fr","value":"trois"}}
    ]}}"#;
    let (client, sent, metrics) = endpoint(vec![ok(rows)]);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);

    let values = graph
        .query_values("PREFIX ex: <http://ex.org/onto#>\nSELECT ?x ?b ?n ?missing WHERE { ?x ?p ?n }")
        .unwrap();
    let a = graph.table().lookup("http://ex.org/onto#A").unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0][0], Some(QueryValue::Entity(a)));
    assert_eq!(values[0][1], Some(QueryValue::TempBlank("_:temp-bnode-1".to_string())));
    assert_eq!(values[1][1], Some(QueryValue::TempBlank("_:temp-bnode-2".to_string())));
    assert_eq!(values[0][2], Some(QueryValue::Literal(spog_core::LiteralValue::Integer(3))));
    assert_eq!(
        values[1][2],
        Some(QueryValue::Literal(spog_core::LiteralValue::LangString("trois".to_string(), "fr".to_string())))
    );
    assert_eq!(values[0][3], None);

    let updated = graph
        .query_values("prefix ex: <http://ex.org/onto#>\ninsert data { ex:A ex:p ex:B }")
        .unwrap();
    assert!(updated.is_empty());

    let sent = sent.lock();
    assert_eq!(sent[0].0, Connection::Query);
    assert_eq!(sent[1].0, Connection::Update);
    assert_eq!(metrics.calls("query_values"), 2);
}

#[test]
fn test_numbered_iri_requests() {
    let counter = r#"{"head":{"vars":["n"]},"results":{"bindings":[]}}"#;
    let (client, sent, _) = endpoint(vec![ok(counter)]);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);

    assert_eq!(graph.new_numbered_iri("http://ex.org/onto#pizza").unwrap(), "http://ex.org/onto#pizza1");
    let sent = sent.lock();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, Connection::Update);
    assert!(sent[1].1.contains(" ;\nprefix or2: <http://owlready2/internal#>\ninsert data"));
}

/// Test: the uuid marker is deleted even when its internal id cannot be read
#[test]
fn test_blank_node_marker_is_always_removed() {
    let (client, sent, _) = endpoint(vec![ok(""), ok(EMPTY)]);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);

    assert!(matches!(graph.new_blank_node(), Err(SpogError::Decode(_))));
    assert!(!graph.has_write_lock());

    let sent = sent.lock();
    assert_eq!(sent.len(), 3);
    let marker = sent[0].1.split("or2:uuid ").nth(1).and_then(|rest| rest.split(' ').next()).unwrap();
    let (connection, delete) = &sent[2];
    assert_eq!(*connection, Connection::Update);
    assert!(delete.contains("delete where"));
    assert!(delete.contains(marker));
}

/// Test: a failed id read still removes the marker and reports the read error
#[test]
fn test_blank_node_marker_removed_after_failed_read() {
    let rejected = Ok(TransportResponse { status: 503, body: "busy".to_string() });
    let (client, sent, _) = endpoint(vec![ok(""), rejected]);
    let graph = SparqlGraph::new(client, QueryGenerator::graphdb(), spog_core::graph::INTERNAL_GRAPH);

    assert!(matches!(graph.new_blank_node(), Err(SpogError::HttpStatus { status: 503, .. })));
    let sent = sent.lock();
    assert_eq!(sent.len(), 3);
    assert!(sent[2].1.contains("delete where"));
}

#[test]
fn test_http_transport_urls() {
    let transport = HttpTransport::new("http://localhost:7200/repositories/pizza").unwrap();
    assert_eq!(transport.query_url(), "http://localhost:7200/repositories/pizza");
    assert_eq!(transport.update_url(), "http://localhost:7200/repositories/pizza/statements");
    assert!(HttpTransport::new("").is_err());

    let split = HttpTransport::new("http://h/query").unwrap().with_update_endpoint("http://h/update");
    assert_eq!(split.update_url(), "http://h/update");
}
