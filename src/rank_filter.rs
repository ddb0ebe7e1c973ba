//src/rank_filter.rs
//
// Collapses a kraken2 report to the most specific species-level rows and
// renormalizes their abundance.

use crate::types::KrakenReportRow;

/// Keep only rows at species rank or deeper (`S`, `S1`, `S2`, ...), in report order.
pub fn species_rows(rows: &[KrakenReportRow]) -> Vec<KrakenReportRow> {
    rows.iter()
        .filter(|row| row.rank_code.is_species_level())
        .cloned()
        .collect()
}

/// Drop every species-level row that is directly followed by a strictly
/// deeper row, keeping the last row unconditionally.
///
/// This relies on kraken2's traversal order: a sub-species row is assumed to
/// sit right after its shallower ancestor. Lineage identity is never checked,
/// so two unrelated taxa that happen to be adjacent are treated as parent and
/// child when the depth increases across the boundary.
pub fn best_ranks(species: &[KrakenReportRow]) -> Vec<KrakenReportRow> {
    let mut kept = Vec::with_capacity(species.len());

    for pair in species.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.rank_code.depth >= next.rank_code.depth {
            kept.push(current.clone());
        }
    }
    if let Some(last) = species.last() {
        kept.push(last.clone());
    }

    kept
}

/// Recompute `percentage` as a fraction of the retained fragments.
/// A zero total is degenerate and yields an empty table.
pub fn recalculate_percentages(mut rows: Vec<KrakenReportRow>) -> Vec<KrakenReportRow> {
    let total: u64 = rows.iter().map(|r| r.fragments_assigned).sum();
    if total == 0 {
        if !rows.is_empty() {
            log::warn!(
                "{} species rows retained but no fragments assigned; nothing to report",
                rows.len()
            );
        }
        return Vec::new();
    }

    for row in &mut rows {
        row.percentage = row.fragments_assigned as f64 / total as f64;
    }
    rows
}

/// Sort by percentage, highest first. Ties keep their input order.
pub fn sort_by_percentage(rows: &mut [KrakenReportRow]) {
    rows.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
}

/// Full rank-filter stage: species filter, best ranks, renormalize, sort.
pub fn species_table(rows: &[KrakenReportRow]) -> Vec<KrakenReportRow> {
    let species = species_rows(rows);
    let best = best_ranks(&species);
    let mut table = recalculate_percentages(best);
    sort_by_percentage(&mut table);

    log::info!(
        "Rank filter: {} report rows -> {} species rows -> {} retained",
        rows.len(),
        species.len(),
        table.len()
    );
    table
}
