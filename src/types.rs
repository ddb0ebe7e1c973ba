//src/types.rs

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Rank letter kraken2 uses for species.
pub const SPECIES_MARKER: char = 'S';

/// A kraken2 rank code such as `G`, `S` or `S1`.
/// The numeric suffix is the depth below the named rank (absent => 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankCode {
    pub letter: char,
    pub depth: u32,
}

impl RankCode {
    pub fn is_species_level(&self) -> bool {
        self.letter == SPECIES_MARKER
    }
}

impl FromStr for RankCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => c,
            _ => return Err(PipelineError::InvalidRankCode(s.to_string())),
        };
        let suffix = chars.as_str();
        let depth = if suffix.is_empty() {
            0
        } else if suffix.bytes().all(|b| b.is_ascii_digit()) {
            suffix
                .parse()
                .map_err(|_| PipelineError::InvalidRankCode(s.to_string()))?
        } else {
            return Err(PipelineError::InvalidRankCode(s.to_string()));
        };
        Ok(RankCode { letter, depth })
    }
}

impl fmt::Display for RankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth == 0 {
            write!(f, "{}", self.letter)
        } else {
            write!(f, "{}{}", self.letter, self.depth)
        }
    }
}

/// A structured representation of one row in the kraken2 report:
///  percentage  fragments_covered  fragments_assigned  rank_code  taxon_id  taxon_name
#[derive(Debug, Clone, PartialEq)]
pub struct KrakenReportRow {
    pub percentage: f64,
    pub fragments_covered: u64,
    pub fragments_assigned: u64,
    pub rank_code: RankCode,
    pub taxon_id: u32,
    pub taxon_name: String,
}

/// One 4-line FASTQ block, kept verbatim (line terminators stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub header: String,
    pub sequence: String,
    pub separator: String,
    pub quality: String,
}

impl fmt::Display for ReadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n",
            self.header, self.sequence, self.separator, self.quality
        )
    }
}
