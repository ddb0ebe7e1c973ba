//src/tools.rs
//
// Thin wrappers around the external classifier, assembler and aligner.
// Each call blocks until the tool exits; a failed tool stops the pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{PipelineConfig, WorkLayout};
use crate::demux::taxon_dir;
use crate::error::{PipelineError, Result};

/// k-mer sizes passed to SPAdes.
pub const SPADES_KMERS: [u32; 4] = [21, 33, 55, 77];

/// Remote nucleotide database queried by blastn.
pub const BLAST_DB: &str = "nt";

/// Run a prepared command to completion, mapping launch failures and
/// non-zero exits to errors.
pub fn run_tool(tool: &str, cmd: &mut Command) -> Result<()> {
    log::info!("Running {tool}");
    log::debug!("{cmd:?}");

    let status = cmd.status().map_err(|source| PipelineError::ToolLaunch {
        tool: tool.to_string(),
        source,
    })?;

    if !status.success() {
        return Err(PipelineError::ToolFailed {
            tool: tool.to_string(),
            status,
        });
    }
    Ok(())
}

/// Classify the read pair with kraken2, writing the classified reads,
/// the per-read output and the full report into the work layout.
pub fn run_kraken(config: &PipelineConfig, layout: &WorkLayout) -> Result<()> {
    let mut cmd = Command::new(&config.tools.kraken2);
    cmd.arg("--threads")
        .arg(config.threads.to_string())
        .arg("--db")
        .arg(&config.kraken_db)
        .arg("--paired")
        .arg("--use-names")
        .arg("--classified-out")
        .arg(layout.classified_pattern())
        .arg(&config.reads_1)
        .arg(&config.reads_2)
        .arg("--output")
        .arg(layout.kraken_output_file())
        .arg("--report")
        .arg(layout.kraken_report_file());

    run_tool("kraken2", &mut cmd)
}

/// Subdirectories named `taxon_<id>`, sorted by id.
pub fn taxon_dirs(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let id = name
            .to_str()
            .and_then(|n| n.strip_prefix("taxon_"))
            .and_then(|n| n.parse::<u32>().ok());
        match id {
            Some(id) => found.push((id, entry.path())),
            None => log::debug!("Ignoring {}", entry.path().display()),
        }
    }
    found.sort_by_key(|(id, _)| *id);
    Ok(found)
}

/// Assemble each taxon's split reads with SPAdes.
/// Returns the number of assemblies launched.
pub fn run_spades(
    spades: &Path,
    taxon_fq_dir: &Path,
    output_dir: &Path,
    threads: usize,
) -> Result<usize> {
    let kmers = SPADES_KMERS
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut launched = 0;
    for (taxon_id, dir) in taxon_dirs(taxon_fq_dir)? {
        let assembly_dir = taxon_dir(output_dir, taxon_id);
        fs::create_dir_all(&assembly_dir)?;

        let mut cmd = Command::new(spades);
        cmd.arg("-1")
            .arg(dir.join(format!("taxon_{taxon_id}_1.fq")))
            .arg("-2")
            .arg(dir.join(format!("taxon_{taxon_id}_2.fq")))
            .arg("-o")
            .arg(&assembly_dir)
            .arg("-t")
            .arg(threads.to_string())
            .arg("-k")
            .arg(&kmers);

        run_tool(&format!("spades.py (taxon {taxon_id})"), &mut cmd)?;
        launched += 1;
    }
    Ok(launched)
}

/// Align every assembly's `scaffolds.fasta` against the remote `nt` database.
/// Assemblies that produced no scaffolds are skipped.
/// Returns the number of alignments launched.
pub fn run_blast(blastn: &Path, spades_output_dir: &Path, output_dir: &Path) -> Result<usize> {
    fs::create_dir_all(output_dir)?;

    let mut launched = 0;
    for (taxon_id, dir) in taxon_dirs(spades_output_dir)? {
        let scaffolds = dir.join("scaffolds.fasta");
        if !scaffolds.is_file() {
            log::debug!("No scaffolds for taxon {taxon_id}, skipping alignment");
            continue;
        }

        let mut cmd = Command::new(blastn);
        cmd.arg("-db")
            .arg(BLAST_DB)
            .arg("-query")
            .arg(&scaffolds)
            .arg("-out")
            .arg(output_dir.join(format!("taxon_{taxon_id}.out")))
            .arg("-remote");

        run_tool(&format!("blastn (taxon {taxon_id})"), &mut cmd)?;
        launched += 1;
    }
    Ok(launched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_tool_success_and_failure() {
        run_tool("true", &mut Command::new("true")).unwrap();

        match run_tool("false", &mut Command::new("false")).unwrap_err() {
            PipelineError::ToolFailed { tool, status } => {
                assert_eq!(tool, "false");
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_binary_is_launch_error() {
        let err = run_tool(
            "nope",
            &mut Command::new("/nonexistent/virusdetecter-test-binary"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::ToolLaunch { .. }));
    }

    #[test]
    fn test_taxon_dirs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("taxon_20")).unwrap();
        fs::create_dir(dir.path().join("taxon_3")).unwrap();
        fs::create_dir(dir.path().join("misc")).unwrap();
        fs::write(dir.path().join("taxon_7"), "not a dir").unwrap();

        let ids: Vec<u32> = taxon_dirs(dir.path()).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![3, 20]);
    }

    #[test]
    fn test_blast_skips_missing_scaffolds() {
        let dir = tempfile::tempdir().unwrap();
        let spades_out = dir.path().join("spades_output");
        fs::create_dir_all(spades_out.join("taxon_1")).unwrap();
        fs::create_dir_all(spades_out.join("taxon_2")).unwrap();
        fs::write(spades_out.join("taxon_2").join("scaffolds.fasta"), ">c1\nACGT\n").unwrap();

        let launched = run_blast(Path::new("true"), &spades_out, &dir.path().join("blast")).unwrap();
        assert_eq!(launched, 1);
    }

    #[test]
    fn test_spades_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let taxon_fq = dir.path().join("taxon_fq");
        fs::create_dir_all(taxon_fq.join("taxon_5")).unwrap();

        let out = dir.path().join("spades_output");
        let err = run_spades(Path::new("false"), &taxon_fq, &out, 2).unwrap_err();
        assert!(matches!(err, PipelineError::ToolFailed { .. }));
        assert!(out.join("taxon_5").is_dir());
    }
}
