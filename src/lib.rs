// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod report;
pub mod rank_filter;
pub mod plot;
pub mod analyze;
pub mod fastq;
pub mod demux;
pub mod tools;
pub mod pipeline;

pub use crate::analyze::analyze_kraken_output;
pub use crate::config::{PipelineConfig, ToolPaths};
pub use crate::demux::{demultiplex_pair, demultiplex_reads};
pub use crate::error::{PipelineError, Result};
pub use crate::pipeline::{run_pipeline, run_pipeline_with, PipelineSummary, Stage};
pub use crate::rank_filter::species_table;
