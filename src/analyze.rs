//src/analyze.rs

use ahash::AHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::plot::draw_abundance_plot;
use crate::rank_filter::species_table;
use crate::report::parse_kraken_report;
use crate::types::KrakenReportRow;

/// Rows whose recomputed percentage is strictly above `min_percent`.
pub fn above_threshold(rows: &[KrakenReportRow], min_percent: f64) -> Vec<KrakenReportRow> {
    rows.iter()
        .filter(|r| r.percentage > min_percent)
        .cloned()
        .collect()
}

/// One taxon id per line.
pub fn write_taxon_ids<P: AsRef<Path>>(rows: &[KrakenReportRow], path: P) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in rows {
        writeln!(out, "{}", row.taxon_id)?;
    }
    out.flush()?;
    Ok(())
}

/// Load the allow-list written by [`write_taxon_ids`]. Blank lines are ignored.
pub fn read_taxon_ids<P: AsRef<Path>>(path: P) -> Result<AHashSet<u32>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut ids = AHashSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        let id = value.parse::<u32>().map_err(|_| PipelineError::InvalidTaxonId {
            path: path.to_path_buf(),
            line: idx + 1,
            value: value.to_string(),
        })?;
        ids.insert(id);
    }
    Ok(ids)
}

/// Report -> species table -> threshold -> plot + taxon id list.
/// Returns the rows that passed the threshold.
pub fn analyze_kraken_output<P, Q, R>(
    report_path: P,
    plot_path: Q,
    taxon_ids_path: R,
    min_percent: f64,
) -> Result<Vec<KrakenReportRow>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let rows = parse_kraken_report(report_path)?;
    let table = species_table(&rows);
    let selected = above_threshold(&table, min_percent);

    log::info!(
        "{} of {} species taxa above {}",
        selected.len(),
        table.len(),
        min_percent
    );
    for row in &selected {
        log::debug!(
            "  {}\t{}\t{:.6}\t{}",
            row.taxon_id,
            row.rank_code,
            row.percentage,
            row.taxon_name
        );
    }

    draw_abundance_plot(&selected, plot_path)?;
    write_taxon_ids(&selected, taxon_ids_path)?;
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(taxon_id: u32, percentage: f64) -> KrakenReportRow {
        KrakenReportRow {
            percentage,
            fragments_covered: 0,
            fragments_assigned: 0,
            rank_code: "S".parse().unwrap(),
            taxon_id,
            taxon_name: String::new(),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let rows = vec![row(1, 0.5), row(2, 0.0005), row(3, 0.0004), row(4, 0.0006)];
        let ids: Vec<u32> = above_threshold(&rows, 0.0005).iter().map(|r| r.taxon_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_taxon_id_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        write_taxon_ids(&[row(10, 0.1), row(20, 0.2)], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "10\n20\n");

        let ids = read_taxon_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&10) && ids.contains(&20));
    }

    #[test]
    fn test_bad_taxon_id_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "10\n\nabc\n").unwrap();
        match read_taxon_ids(&path).unwrap_err() {
            PipelineError::InvalidTaxonId { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_analyze_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.tsv");
        fs::write(
            &report,
            "100.00\t1000\t0\tR\t1\troot\n\
             90.00\t900\t900\tS\t10\t  Virus A\n\
             9.00\t90\t90\tS1\t11\t    Virus A strain\n\
             0.01\t1\t1\tS\t20\t  Virus B\n",
        )
        .unwrap();
        let plot = dir.path().join("plot.svg");
        let ids = dir.path().join("ids.txt");

        let selected = analyze_kraken_output(&report, &plot, &ids, 0.05).unwrap();

        // Virus A (depth 0) is superseded by its strain row; Virus B is 1/91.
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].taxon_id, 11);
        assert!(plot.exists());
        assert_eq!(fs::read_to_string(&ids).unwrap(), "11\n");
    }
}
