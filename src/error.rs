//src/error.rs

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Everything that can stop a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Malformed report line {line}: {reason}")]
    MalformedReport { line: usize, reason: String },

    #[error("Invalid rank code '{0}'")]
    InvalidRankCode(String),

    #[error("Invalid taxon id '{value}' at line {line} of {}", .path.display())]
    InvalidTaxonId {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({status})")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
