//! SPOG - command-line access to a SPARQL store through the storid backend

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, Level};

use spog_core::{classify, OntologyRef, QueryValue, SessionMetrics, SparqlGraph, StoreConfig};

#[derive(Parser)]
#[command(name = "spog")]
#[command(version)]
#[command(about = "Storid-addressed SPARQL graph backend", long_about = None)]
struct Cli {
    /// Store configuration file (YAML)
    #[arg(long, short = 'c', global = true)]
    config: Option<String>,

    /// SPARQL endpoint URL, or "memory:" (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    /// Debug logging (generated queries and timings)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Print per-label request counts and durations as JSON on stderr
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a read query and print the decoded rows as JSON
    Query {
        sparql: String,
    },
    /// Run an update
    Update {
        sparql: String,
    },
    /// Show whether text would be routed to the query or update endpoint
    Classify {
        text: String,
    },
    /// Count triples in the given named graphs
    Count {
        /// Named graph IRI (repeatable)
        #[arg(long = "graph", short = 'g', required = true)]
        graphs: Vec<String>,
    },
    /// List ontology base IRIs recorded in the internal graph
    Ontologies,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path).with_context(|| format!("loading config {}", path))?,
        None => {
            let endpoint = cli
                .endpoint
                .clone()
                .context("either --config or --endpoint is required")?;
            StoreConfig::new(endpoint)
        }
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if cli.username.is_some() {
        config.username = cli.username.clone();
    }
    if cli.password.is_some() {
        config.password = cli.password.clone();
    }
    config.validate()?;
    Ok(config)
}

fn to_json(graph: &SparqlGraph, value: &Option<QueryValue>) -> Value {
    match value {
        None => Value::Null,
        Some(QueryValue::Entity(storid)) => match graph.unabbreviate(*storid).and_then(|n| n.as_iri().map(str::to_string)) {
            Some(iri) => json!({ "storid": storid, "iri": iri }),
            None => json!({ "storid": storid }),
        },
        Some(QueryValue::TempBlank(label)) => json!({ "blank": label }),
        Some(QueryValue::Literal(literal)) => json!({ "literal": literal.lexical_form() }),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Classify { text } = &cli.command {
        println!("{}", classify(text));
        return Ok(());
    }

    let config = store_config(&cli)?;
    debug!(endpoint = %config.endpoint, "connecting");
    let metrics = Arc::new(SessionMetrics::new());
    let graph = config.connect_with_metrics(metrics.clone())?;
    let outcome = run(&cli.command, &graph);
    if cli.stats {
        eprintln!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
    }
    outcome
}

fn run(command: &Commands, graph: &SparqlGraph) -> Result<()> {
    match command {
        Commands::Query { sparql } => {
            let rows = graph.query_values(sparql)?;
            let rows: Vec<Value> = rows
                .iter()
                .map(|row| Value::Array(row.iter().map(|cell| to_json(graph, cell)).collect()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Update { sparql } => {
            graph.client().update("cli", &[sparql.as_str()])?;
            println!("✓ Update applied");
        }
        Commands::Count { graphs } => {
            for graph_iri in graphs {
                graph.attach(OntologyRef::new(graph_iri.clone(), graph_iri.clone()))?;
            }
            println!("{}", graph.count()?);
        }
        Commands::Ontologies => {
            for iri in graph.ontology_iris()? {
                println!("{}", iri);
            }
        }
        Commands::Classify { text } => println!("{}", classify(text)),
    }
    Ok(())
}
