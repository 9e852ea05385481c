//! Error types for SPOG Core

use thiserror::Error;

use crate::client::Connection;
use crate::model::{Context, Storid};

#[derive(Error, Debug)]
pub enum SpogError {
    #[error("{connection} endpoint returned status {status}: {body}")]
    HttpStatus {
        connection: Connection,
        status: u16,
        body: String,
        query: String,
    },

    #[error("{connection} request failed: {message}")]
    Transport {
        connection: Connection,
        message: String,
        query: String,
    },

    #[error("Unimplemented operation: {0}")]
    Unimplemented(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown storid: {0}")]
    UnknownStorid(Storid),

    #[error("Unknown context: {0}")]
    UnknownContext(Context),

    #[error("Result decoding error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpogError {
    /// Query text attached to a transport failure, if any
    pub fn query(&self) -> Option<&str> {
        match self {
            SpogError::HttpStatus { query, .. } | SpogError::Transport { query, .. } => Some(query),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpogError>;
