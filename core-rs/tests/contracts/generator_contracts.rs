//! Query Generator Contract Tests
//!
//! The generated text is what GraphDB sees. The shapes below are relied on by
//! result decoding (column names, `?sid`/`?oid`) and by the write path (every
//! mutation names its target graph).

use spog_core::literal::LiteralValue;
use spog_core::query::{Binding, NodeRef, ObjectTerm, QueryGenerator, SelectQuery};
use spog_core::vocab::{XSD_INTEGER, XSD_STRING};
use spog_core::{classify, Connection, SpogError};

const ONTO: &str = "http://ex.org/onto";

fn graphs() -> Vec<String> {
    vec![ONTO.to_string()]
}

/// WHY: Same request, same text
/// BREAKS: Request logs and metrics keyed by query text
#[test]
fn generation_is_deterministic() {
    let generator = QueryGenerator::graphdb();
    let query = SelectQuery::new()
        .objects()
        .subject(NodeRef::iri("http://ex.org/A"))
        .predicate(Binding::Any(vec![NodeRef::iri("http://ex.org/p"), NodeRef::iri("http://ex.org/q")]))
        .graphs(graphs());
    let first = generator.generate_select(&query).unwrap();
    for _ in 0..5 {
        assert_eq!(generator.generate_select(&query).unwrap(), first);
    }
}

/// WHY: Full select layout for a bound subject over named graphs
#[test]
fn select_layout() {
    let text = QueryGenerator::graphdb()
        .generate_select(
            &SelectQuery::new()
                .objects()
                .subject(NodeRef::iri("http://ex.org/A"))
                .graphs(graphs())
                .limit(1),
        )
        .unwrap();
    assert_eq!(
        text,
        "select ?g ?s ?p ?o ?sid ?oid\n\
         from named <http://ex.org/onto>\n\
         where {\n    \
         bind(<http://ex.org/A> as ?s)\n    \
         graph ?g { ?s ?p ?o . }\n    \
         ?s <http://www.ontotext.com/owlim/entity#id> ?sid .\n    \
         ?o <http://www.ontotext.com/owlim/entity#id> ?oid .\n    \
         filter(isIRI(?o) || isBlank(?o))\n\
         }\n\
         limit 1"
    );
}

/// WHY: A select with neither object nor data mode is a caller bug
#[test]
fn select_requires_a_mode() {
    let err = QueryGenerator::graphdb().generate_select(&SelectQuery::new()).unwrap_err();
    assert!(matches!(err, SpogError::InvalidInput(_)));
}

/// WHY: Named-graph scoping and default-graph scoping cannot be mixed
#[test]
fn select_rejects_both_graph_scopes() {
    let query = SelectQuery::new().objects().graphs(graphs()).default_graph(ONTO);
    assert!(matches!(
        QueryGenerator::graphdb().generate_select(&query),
        Err(SpogError::InvalidInput(_))
    ));
}

/// WHY: Every mutation targets one explicit named graph
/// BREAKS: Writes leaking into the store's default graph
#[test]
fn mutations_require_a_graph() {
    let generator = QueryGenerator::graphdb();
    let subject = NodeRef::iri("http://ex.org/A");
    let object = ObjectTerm::Node(NodeRef::iri("http://ex.org/B"));
    assert!(matches!(
        generator.generate_insert(&subject, "http://ex.org/p", &object, None, None),
        Err(SpogError::InvalidInput(_))
    ));
    assert!(matches!(
        generator.generate_delete(Some(&subject), None, None, None, None),
        Err(SpogError::InvalidInput(_))
    ));
}

#[test]
fn insert_and_delete_layout() {
    let generator = QueryGenerator::graphdb();
    let subject = NodeRef::iri("http://ex.org/A");
    let insert = generator
        .generate_insert(
            &subject,
            "http://ex.org/age",
            &ObjectTerm::Literal(LiteralValue::Integer(42)),
            Some(XSD_INTEGER),
            Some(ONTO),
        )
        .unwrap();
    assert_eq!(insert, "insert data {\n    graph <http://ex.org/onto> { <http://ex.org/A> <http://ex.org/age> 42 . }\n}");

    let delete = generator
        .generate_delete(Some(&subject), Some("http://ex.org/age"), None, None, Some(ONTO))
        .unwrap();
    assert_eq!(delete, "delete where {\n    graph <http://ex.org/onto> { <http://ex.org/A> <http://ex.org/age> ?o . }\n}");
}

/// WHY: Generated text must route to the right endpoint
#[test]
fn generated_text_classifies() {
    let generator = QueryGenerator::graphdb();
    let subject = NodeRef::iri("http://ex.org/A");
    let select = generator.generate_select(&SelectQuery::new().data().default_graph(ONTO)).unwrap();
    let insert = generator
        .generate_insert(&subject, "http://ex.org/p", &ObjectTerm::Literal("x".into()), Some(XSD_STRING), Some(ONTO))
        .unwrap();
    let delete = generator.generate_delete(None, None, None, None, Some(ONTO)).unwrap();
    let count = generator.generate_count(&graphs()).unwrap();
    assert_eq!(classify(&select), Connection::Query);
    assert_eq!(classify(&count), Connection::Query);
    assert_eq!(classify(&insert), Connection::Update);
    assert_eq!(classify(&delete), Connection::Update);
}

/// WHY: Without a node id predicate no `?sid`/`?oid` columns are emitted
#[test]
fn node_ids_are_optional() {
    let text = QueryGenerator::without_node_ids()
        .generate_select(&SelectQuery::new().objects().graphs(graphs()))
        .unwrap();
    assert!(text.starts_with("select ?g ?s ?p ?o\n"));
    assert!(!text.contains("?sid"));

    let blank = SelectQuery::new().objects().subject(NodeRef::Blank(-7)).graphs(graphs());
    assert!(QueryGenerator::without_node_ids().generate_select(&blank).is_err());
}

/// WHY: IRIs are never spliced raw into query text
#[test]
fn hostile_iris_are_rejected() {
    let query = SelectQuery::new().objects().subject(NodeRef::iri("http://ex.org/A> } drop all { <x"));
    assert!(QueryGenerator::graphdb().generate_select(&query).is_err());
}
