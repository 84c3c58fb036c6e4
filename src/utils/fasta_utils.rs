use anyhow::{Context, Result};
use bio::io::fasta;
use bio::seq_analysis::gc::gc_content;
use std::path::Path;

/// Summary of one FASTA record, without keeping its sequence around.
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    pub name: String,
    pub length: usize,
    pub gc: f32,
}

impl Contig {
    pub fn from_record(record: &fasta::Record) -> Self {
        Contig {
            name: record.id().to_string(),
            length: record.seq().len(),
            gc: gc_content(record.seq()),
        }
    }
}

/// Reads every contig in `fasta_file` at least `min_length` bases long, in file order.
pub fn load_contigs(fasta_file: &Path, min_length: usize) -> Result<Vec<Contig>> {
    let reader = fasta::Reader::from_file(fasta_file)
        .with_context(|| format!("Could not open FASTA file {:?}", fasta_file))?;

    let mut contigs = Vec::new();
    let mut skipped = 0;
    for result in reader.records() {
        let record = result.with_context(|| format!("Invalid FASTA record in {:?}", fasta_file))?;
        if record.seq().len() >= min_length {
            contigs.push(Contig::from_record(&record));
        } else {
            skipped += 1;
        }
    }

    log::info!(
        "Read {} contigs from {:?} ({} shorter than {}bp skipped)",
        contigs.len(),
        fasta_file,
        skipped,
        min_length
    );
    Ok(contigs)
}
