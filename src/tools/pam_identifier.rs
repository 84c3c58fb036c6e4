use crate::utils::blast_utils::read_hits;
use crate::utils::protospacer::{Spacer, SpacerSet};
use anyhow::{Context, Result};
use bio::io::fasta;
use colored::Colorize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const VERSION: &str = "1.1.0";

/// Reads the hit report, then fills in flanks from every targeted genome in `sequences_file`.
pub fn identify_protospacers(
    blast_file: &Path,
    sequences_file: &Path,
    flank_length: u32,
) -> Result<SpacerSet> {
    log::info!("Reading hits from {:?}", blast_file);
    let hits = read_hits(blast_file)?;
    let mut spacers = SpacerSet::from_hits(&hits)?;
    log::info!(
        "Found {} hits for {} spacers",
        hits.len(),
        spacers.spacers().len()
    );

    log::info!("Extracting {}bp flanks from {:?}", flank_length, sequences_file);
    let reader = fasta::Reader::from_file(sequences_file)
        .with_context(|| format!("Could not open sequence file {:?}", sequences_file))?;

    let mut seen_targets: HashSet<String> = HashSet::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("Invalid FASTA record in {:?}", sequences_file))?;
        if !spacers.targets(record.id()) {
            log::debug!("No hits against {}, skipping", record.id());
            continue;
        }
        // Flanks are cut from the first record with a given id only
        if !seen_targets.insert(record.id().to_string()) {
            log::warn!(
                "{} appears more than once in {:?}, ignoring the later record",
                record.id(),
                sequences_file
            );
            continue;
        }
        let processed = spacers
            .extract_flanks(record.id(), record.seq(), flank_length)
            .with_context(|| format!("Failed to extract flanks from {}", record.id()))?;
        log::debug!("Extracted flanks for {} protospacers on {}", processed, record.id());
    }

    let mut missing: Vec<&str> = spacers
        .target_names()
        .filter(|target| !seen_targets.contains(*target))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        log::warn!(
            "{} targets from the report were not found in {:?}: {}",
            missing.len(),
            sequences_file,
            missing.join(", ")
        );
    }

    Ok(spacers)
}

fn write_group(
    output_dir: &Path,
    group: &str,
    spacers: &[&Spacer],
    flank_length: u32,
) -> Result<(PathBuf, PathBuf)> {
    let right_path = output_dir.join(format!("G{}.protospacers.r.fa", group));
    let left_path = output_dir.join(format!("G{}.protospacers.l.fa", group));

    let mut right_writer = fasta::Writer::to_file(&right_path)
        .with_context(|| format!("Trying to write to file {:?}", right_path))?;
    let mut left_writer = fasta::Writer::to_file(&left_path)
        .with_context(|| format!("Trying to write to file {:?}", left_path))?;

    for spacer in spacers {
        let seq_name = format!("G{}SP{}", group, spacer.name.spacer);
        for protospacer in &spacer.protospacers {
            let target = format!(
                "Target={} {} {};",
                protospacer.genome, protospacer.start, protospacer.end
            );
            if let Some(flank) = &protospacer.right_flank {
                let description = format!("{} right flank ({}bp)", target, flank_length);
                right_writer.write(&seq_name, Some(description.as_str()), flank)?;
            }
            if let Some(flank) = &protospacer.left_flank {
                let description = format!("{} left flank ({}bp)", target, flank_length);
                left_writer.write(&seq_name, Some(description.as_str()), flank)?;
            }
        }
    }

    right_writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", right_path))?;
    left_writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", left_path))?;

    Ok((right_path, left_path))
}

/// Writes the right and left flank files of every spacer group, returning their paths.
pub fn write_flank_files(
    spacers: &SpacerSet,
    output_dir: &Path,
    flank_length: u32,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (group, group_spacers) in spacers.groups() {
        let (right_path, left_path) = write_group(output_dir, group, &group_spacers, flank_length)?;
        log::info!("Wrote {:?} and {:?}", right_path, left_path);
        written.push(right_path);
        written.push(left_path);
    }
    Ok(written)
}

pub fn run(
    blast_file: &PathBuf,
    sequences_file: &PathBuf,
    flank_length: u32,
    output_dir: &PathBuf,
) -> Result<()> {
    log::info!(
        "{}",
        format!("This is {} version {}", "pam-identifier".italic(), VERSION)
            .bold()
            .bright_purple()
    );

    let spacers = identify_protospacers(blast_file, sequences_file, flank_length)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create output directory {:?}", output_dir))?;
    let written = write_flank_files(&spacers, output_dir, flank_length)?;

    log::info!("Done. Wrote {} flank files. Exiting.", written.len());
    Ok(())
}
