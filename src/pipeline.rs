//src/pipeline.rs

use crate::analyze::{analyze_kraken_output, read_taxon_ids};
use crate::config::{effective_min_percent, PipelineConfig};
use crate::demux::{demultiplex_pair, DemuxStats};
use crate::error::Result;
use crate::tools::{run_blast, run_kraken, run_spades};
use crate::types::KrakenReportRow;

/// What one run produced.
#[derive(Debug)]
pub struct PipelineSummary {
    pub selected_taxa: Vec<KrakenReportRow>,
    pub forward: DemuxStats,
    pub reverse: DemuxStats,
    pub assemblies: usize,
    pub alignments: usize,
}

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Analyze,
    Demultiplex,
    Assemble,
    Align,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Classify,
        Stage::Analyze,
        Stage::Demultiplex,
        Stage::Assemble,
        Stage::Align,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            Stage::Classify => "Classifying reads with kraken2...",
            Stage::Analyze => "Filtering kraken2 report...",
            Stage::Demultiplex => "Splitting reads by taxon...",
            Stage::Assemble => "Assembling taxa with SPAdes...",
            Stage::Align => "Aligning scaffolds with blastn...",
        }
    }
}

/// Run classify -> analyze -> demultiplex -> assemble -> align.
/// `on_stage` is called before each stage starts.
pub fn run_pipeline_with<F: FnMut(Stage)>(
    config: &PipelineConfig,
    mut on_stage: F,
) -> Result<PipelineSummary> {
    let layout = config.layout();
    layout.create_dirs()?;

    on_stage(Stage::Classify);
    run_kraken(config, &layout)?;

    on_stage(Stage::Analyze);
    let min_percent = effective_min_percent(config.min_percent);
    let selected_taxa = analyze_kraken_output(
        layout.kraken_report_file(),
        layout.plot_file(),
        layout.taxon_ids_file(),
        min_percent,
    )?;

    on_stage(Stage::Demultiplex);
    let allow_list = read_taxon_ids(layout.taxon_ids_file())?;
    let (reads_1, reads_2) = layout.classified_pair();
    let (forward, reverse) = demultiplex_pair(&reads_1, &reads_2, &allow_list, &layout.taxon_fq)?;

    on_stage(Stage::Assemble);
    let assemblies = run_spades(
        &config.tools.spades,
        &layout.taxon_fq,
        &layout.spades_output,
        config.threads,
    )?;

    on_stage(Stage::Align);
    let alignments = run_blast(&config.tools.blastn, &layout.spades_output, &layout.blast_output)?;

    log::info!(
        "Pipeline finished: {} taxa selected, {} assemblies, {} alignments",
        selected_taxa.len(),
        assemblies,
        alignments
    );

    Ok(PipelineSummary {
        selected_taxa,
        forward,
        reverse,
        assemblies,
        alignments,
    })
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    run_pipeline_with(config, |stage| log::info!("{}", stage.describe()))
}
