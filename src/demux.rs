//src/demux.rs

use ahash::{AHashMap, AHashSet};
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fastq::open_fastq;
use crate::types::ReadRecord;

/// Taxon token kraken2 embeds in classified read headers (`kraken:taxid|1234`).
pub const TAXID_PATTERN: &str = r"taxid\|(\d+)";

/// Extracts the taxon id from a read header.
pub struct TaxonMatcher {
    pattern: Regex,
}

impl TaxonMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TAXID_PATTERN)?,
        })
    }

    /// `None` when the header has no token or the id does not fit a `u32`.
    pub fn taxon_id(&self, header: &str) -> Option<u32> {
        let caps = self.pattern.captures(header)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

/// Counters for one demultiplexing pass.
#[derive(Debug, Default, Clone)]
pub struct DemuxStats {
    pub records_read: usize,
    pub records_routed: usize,
    pub skipped_no_token: usize,
    pub skipped_not_allowed: usize,
    /// taxon id -> records written
    pub per_taxon: AHashMap<u32, usize>,
}

/// Directory holding one taxon's split reads.
pub fn taxon_dir(output_dir: &Path, taxon_id: u32) -> PathBuf {
    output_dir.join(format!("taxon_{taxon_id}"))
}

/// `<output_dir>/taxon_<id>/taxon_<id>_<pass_index>.fq`
pub fn taxon_fastq_path(output_dir: &Path, taxon_id: u32, pass_index: u8) -> PathBuf {
    taxon_dir(output_dir, taxon_id).join(format!("taxon_{taxon_id}_{pass_index}.fq"))
}

/// Split one read file into per-taxon files, keeping only allow-listed taxa.
///
/// All matching records are buffered in memory until the pass completes.
pub fn demultiplex_reads<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    allow_list: &AHashSet<u32>,
    pass_index: u8,
) -> Result<DemuxStats> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let matcher = TaxonMatcher::new()?;
    let mut buckets: AHashMap<u32, Vec<ReadRecord>> = AHashMap::new();
    let mut stats = DemuxStats::default();

    for record in open_fastq(input)? {
        let record = record?;
        stats.records_read += 1;

        let Some(taxon_id) = matcher.taxon_id(&record.header) else {
            stats.skipped_no_token += 1;
            continue;
        };
        if !allow_list.contains(&taxon_id) {
            stats.skipped_not_allowed += 1;
            continue;
        }

        buckets.entry(taxon_id).or_default().push(record);
        stats.records_routed += 1;
    }

    let mut buckets: Vec<(u32, Vec<ReadRecord>)> = buckets.into_iter().collect();
    buckets.sort_unstable_by_key(|(taxon_id, _)| *taxon_id);
    for (taxon_id, records) in &buckets {
        write_bucket(output_dir, *taxon_id, pass_index, records)?;
        stats.per_taxon.insert(*taxon_id, records.len());
    }

    log::info!(
        "{}: {} records, {} routed to {} taxa, {} without taxon token, {} outside allow-list",
        input.display(),
        stats.records_read,
        stats.records_routed,
        stats.per_taxon.len(),
        stats.skipped_no_token,
        stats.skipped_not_allowed
    );
    Ok(stats)
}

fn write_bucket(
    output_dir: &Path,
    taxon_id: u32,
    pass_index: u8,
    records: &[ReadRecord],
) -> Result<()> {
    fs::create_dir_all(taxon_dir(output_dir, taxon_id))?;
    let path = taxon_fastq_path(output_dir, taxon_id, pass_index);
    let mut out = BufWriter::new(File::create(&path)?);
    for rec in records {
        write!(out, "{rec}")?;
    }
    out.flush()?;

    log::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Demultiplex a forward/reverse pair as passes 1 and 2.
pub fn demultiplex_pair<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
    forward: P,
    reverse: Q,
    allow_list: &AHashSet<u32>,
    output_dir: O,
) -> Result<(DemuxStats, DemuxStats)> {
    let output_dir = output_dir.as_ref();
    let first = demultiplex_reads(forward, output_dir, allow_list, 1)?;
    let second = demultiplex_reads(reverse, output_dir, allow_list, 2)?;
    Ok((first, second))
}
