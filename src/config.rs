//src/config.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_MIN_PERCENT: f64 = 0.0005;
pub const DEFAULT_THREADS: usize = 4;

/// Thresholds at or below zero fall back to the default.
pub fn effective_min_percent(requested: f64) -> f64 {
    if requested > 0.0 {
        requested
    } else {
        DEFAULT_MIN_PERCENT
    }
}

/// Executables for the external stages.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub kraken2: PathBuf,
    pub spades: PathBuf,
    pub blastn: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            kraken2: PathBuf::from("kraken2"),
            spades: PathBuf::from("spades.py"),
            blastn: PathBuf::from("blastn"),
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub reads_1: PathBuf,
    pub reads_2: PathBuf,
    pub kraken_db: PathBuf,
    pub output_dir: PathBuf,
    pub threads: usize,
    pub min_percent: f64,
    pub tools: ToolPaths,
}

impl PipelineConfig {
    pub fn layout(&self) -> WorkLayout {
        WorkLayout::new(&self.output_dir)
    }
}

/// Working paths under `<output>/work_data/`.
#[derive(Debug, Clone)]
pub struct WorkLayout {
    pub classified_data: PathBuf,
    pub kraken_output: PathBuf,
    pub taxon_fq: PathBuf,
    pub spades_output: PathBuf,
    pub blast_output: PathBuf,
}

impl WorkLayout {
    pub fn new(output_dir: &Path) -> Self {
        let work = output_dir.join("work_data");
        Self {
            classified_data: work.join("classified_data"),
            kraken_output: work.join("kraken_output"),
            taxon_fq: work.join("taxon_fq"),
            spades_output: work.join("spades_output"),
            blast_output: work.join("blast_output"),
        }
    }

    /// Create every stage directory; existing ones are left alone.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [
            &self.classified_data,
            &self.kraken_output,
            &self.taxon_fq,
            &self.spades_output,
            &self.blast_output,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Pattern handed to kraken2; `#` becomes `_1` / `_2`.
    pub fn classified_pattern(&self) -> PathBuf {
        self.classified_data.join("cseqs#.fq")
    }

    pub fn classified_pair(&self) -> (PathBuf, PathBuf) {
        (
            self.classified_data.join("cseqs_1.fq"),
            self.classified_data.join("cseqs_2.fq"),
        )
    }

    pub fn kraken_output_file(&self) -> PathBuf {
        self.kraken_output.join("kraken_output.csv")
    }

    pub fn kraken_report_file(&self) -> PathBuf {
        self.kraken_output.join("kraken_full_output.csv")
    }

    pub fn plot_file(&self) -> PathBuf {
        self.classified_data.join("kraken_plot.svg")
    }

    pub fn taxon_ids_file(&self) -> PathBuf {
        self.classified_data.join("kraken_taxon_ids_filtered.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_percent_floor() {
        assert_eq!(effective_min_percent(0.01), 0.01);
        assert_eq!(effective_min_percent(0.0), DEFAULT_MIN_PERCENT);
        assert_eq!(effective_min_percent(-3.0), DEFAULT_MIN_PERCENT);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkLayout::new(dir.path());
        layout.create_dirs().unwrap();
        layout.create_dirs().unwrap();

        assert!(layout.taxon_fq.is_dir());
        assert!(layout.blast_output.starts_with(dir.path().join("work_data")));
        assert_eq!(
            layout.kraken_report_file().file_name().unwrap(),
            "kraken_full_output.csv"
        );
    }
}
