//src/report.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::types::{KrakenReportRow, RankCode};

const REPORT_COLUMNS: usize = 6;

/// Parses a kraken2 report file (no header) in the format:
/// ```text
/// <percentage>\t<fragments_covered>\t<fragments_assigned>\t<rank_code>\t<taxon_id>\t<taxon_name>
/// ```
/// Leading indentation on the taxon name is dropped.
pub fn parse_kraken_report<P: AsRef<Path>>(filepath: P) -> Result<Vec<KrakenReportRow>> {
    let file = File::open(filepath)?;
    read_kraken_report(BufReader::new(file))
}

pub fn read_kraken_report<R: BufRead>(reader: R) -> Result<Vec<KrakenReportRow>> {
    let mut rows = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_report_line(&line, line_no)?);
    }

    log::debug!("Parsed {} report rows", rows.len());
    Ok(rows)
}

fn parse_report_line(line: &str, line_no: usize) -> Result<KrakenReportRow> {
    let parts: Vec<&str> = line.splitn(REPORT_COLUMNS, '\t').collect();
    if parts.len() < REPORT_COLUMNS {
        return Err(PipelineError::MalformedReport {
            line: line_no,
            reason: format!("expected {} columns, found {}", REPORT_COLUMNS, parts.len()),
        });
    }

    let rank_code: RankCode = parts[3].parse().map_err(|_| PipelineError::MalformedReport {
        line: line_no,
        reason: format!("invalid rank code '{}'", parts[3].trim()),
    })?;

    Ok(KrakenReportRow {
        percentage: field(parts[0], "percentage", line_no)?,
        fragments_covered: field(parts[1], "fragments_covered", line_no)?,
        fragments_assigned: field(parts[2], "fragments_assigned", line_no)?,
        rank_code,
        taxon_id: field(parts[4], "taxon_id", line_no)?,
        taxon_name: parts[5].trim().to_string(),
    })
}

fn field<T: FromStr>(raw: &str, name: &str, line_no: usize) -> Result<T> {
    raw.trim().parse().map_err(|_| PipelineError::MalformedReport {
        line: line_no,
        reason: format!("invalid {} '{}'", name, raw.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REPORT: &str = "\
 10.00\t100\t0\tR\t1\troot
  9.00\t90\t0\tD\t10239\t  Viruses
  5.00\t50\t30\tS\t11676\t            Human immunodeficiency virus 1
  2.00\t20\t20\tS1\t11706\t              HIV-1 group M
";

    #[test]
    fn test_parse_report_rows() {
        let rows = read_kraken_report(Cursor::new(REPORT)).unwrap();
        assert_eq!(rows.len(), 4);

        let hiv = &rows[2];
        assert_eq!(hiv.fragments_covered, 50);
        assert_eq!(hiv.fragments_assigned, 30);
        assert_eq!(hiv.rank_code.to_string(), "S");
        assert_eq!(hiv.taxon_id, 11676);
        assert_eq!(hiv.taxon_name, "Human immunodeficiency virus 1");
        assert!((hiv.percentage - 5.0).abs() < 1e-12);

        assert_eq!(rows[3].rank_code.depth, 1);
    }

    #[test]
    fn test_missing_columns_is_an_error() {
        let err = read_kraken_report(Cursor::new("1.0\t10\t10\tS\t42\n")).unwrap_err();
        match err {
            PipelineError::MalformedReport { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_field_reports_line() {
        let text = "1.0\t10\t10\tS\t42\tA\n1.0\tten\t10\tS\t43\tB\n";
        let err = read_kraken_report(Cursor::new(text)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("fragments_covered"));
    }

    #[test]
    fn test_bad_rank_code() {
        let err = read_kraken_report(Cursor::new("1.0\t10\t10\t??\t42\tA\n")).unwrap_err();
        assert!(err.to_string().contains("rank code"));
    }
}
