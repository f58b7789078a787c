//src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TaxId;

#[derive(Debug, Error)]
pub enum OrfanError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lineage row at line {line}: {reason}")]
    DataFormat { line: usize, reason: String },

    /// Without the organism's own lineage there is nothing to compare hits against.
    #[error("organism taxonomy id {0} not found in the reference lineage file")]
    UnresolvedOrganism(TaxId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OrfanError>;
