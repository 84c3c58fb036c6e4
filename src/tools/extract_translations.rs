use crate::utils::genbank_utils::{is_kind, qualifier, read_records, record_accession};
use crate::utils::translate::translate_cds;
use crate::utils::open_output;
use anyhow::{Context, Result, anyhow};
use bio::io::fasta;
use colored::Colorize;
use gb_io::seq::{Feature, Seq};
use itertools::Itertools;
use phf::phf_map;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const VERSION: &str = "1.0.0";
const ACCESSION_IDENTIFIER: &str = "A";

static FORMAT_IDENTIFIERS: phf::Map<&'static str, &'static str> = phf_map! {
    "l" => "locus_tag",
    "g" => "gene",
    "p" => "product",
    "n" => "note",
    "f" => "function",
    "P" => "protein_id",
};

/// Which qualifiers make up a translation's FASTA header, e.g. `A:l:p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFormat {
    qualifiers: Vec<&'static str>,
    prepend_accession: bool,
}

impl FromStr for HeaderFormat {
    type Err = anyhow::Error;

    fn from_str(format: &str) -> Result<Self> {
        let mut header_format = HeaderFormat {
            qualifiers: Vec::new(),
            prepend_accession: false,
        };
        for identifier in format.split(':').filter(|identifier| !identifier.is_empty()) {
            if identifier == ACCESSION_IDENTIFIER {
                header_format.prepend_accession = true;
            } else {
                let key = FORMAT_IDENTIFIERS.get(identifier).ok_or_else(|| {
                    anyhow!(
                        "Unknown format identifier {:?}, expected one of {} or {}",
                        identifier,
                        FORMAT_IDENTIFIERS.keys().sorted().join(", "),
                        ACCESSION_IDENTIFIER
                    )
                })?;
                header_format.qualifiers.push(*key);
            }
        }
        Ok(header_format)
    }
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qualifiers [{}]", self.qualifiers.join(", "))?;
        if self.prepend_accession {
            write!(f, " prefixed with the accession")?;
        }
        Ok(())
    }
}

impl HeaderFormat {
    pub fn header(&self, record: &Seq, feature: &Feature) -> String {
        let gene_info = self
            .qualifiers
            .iter()
            .filter_map(|key| qualifier(feature, key))
            .join(" ");
        if self.prepend_accession {
            format!("{}_{}", record_accession(record).unwrap_or_default(), gene_info)
        } else {
            gene_info
        }
    }
}

fn feature_translation(record: &Seq, feature: &Feature, translate_missing: bool) -> Result<Option<Vec<u8>>> {
    if let Some(translation) = qualifier(feature, "translation") {
        return Ok(Some(
            translation
                .bytes()
                .filter(|aa| !aa.is_ascii_whitespace())
                .collect(),
        ));
    }
    if !translate_missing || !is_kind(feature, "CDS") {
        return Ok(None);
    }

    let codon_start = match qualifier(feature, "codon_start") {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid /codon_start {:?}", value))?,
        None => 1,
    };
    let coding_seq = record
        .extract_location_seq(&feature.location)
        .map_err(|err| anyhow!("Could not extract CDS sequence: {}", err))?;
    Ok(Some(translate_cds(&coding_seq, codon_start)))
}

/// Writes one FASTA record per translated feature of `record`, returning how many were written.
pub fn write_translations<W: Write>(
    record: &Seq,
    header_format: &HeaderFormat,
    translate_missing: bool,
    writer: &mut fasta::Writer<W>,
) -> Result<usize> {
    let mut written = 0;
    for feature in &record.features {
        if let Some(translation) = feature_translation(record, feature, translate_missing)? {
            writer.write(&header_format.header(record, feature), None, &translation)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Writes each record's translations to `<accession>.faa` in `output_dir`.
pub fn write_split_entries(
    records: &[Seq],
    output_dir: &Path,
    header_format: &HeaderFormat,
    translate_missing: bool,
) -> Result<usize> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create output directory {:?}", output_dir))?;

    let mut total = 0;
    for record in records {
        let name = record_accession(record)
            .context("GenBank record has neither an accession nor a LOCUS name")?;
        let output_path = output_dir.join(format!("{}.faa", name));
        let mut writer = fasta::Writer::to_file(&output_path)
            .with_context(|| format!("Trying to write to file {:?}", output_path))?;
        let written = write_translations(record, header_format, translate_missing, &mut writer)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        log::info!("Wrote {} translations to {:?}", written, output_path);
        total += written;
    }
    Ok(total)
}

pub fn run(
    input_files: &[PathBuf],
    output_file: Option<&Path>,
    output_dir: &PathBuf,
    header_format: &HeaderFormat,
    split_entries: bool,
    translate_missing: bool,
) -> Result<()> {
    log::info!(
        "{}",
        format!("This is {} version {}", "extract-translations".italic(), VERSION)
            .bold()
            .bright_purple()
    );
    log::info!("Headers are built from {}", header_format);

    let records = read_records(input_files)?;
    log::info!("Read {} GenBank records", records.len());

    let total = if split_entries {
        write_split_entries(&records, output_dir, header_format, translate_missing)?
    } else {
        let mut writer = fasta::Writer::new(open_output(output_file)?);
        let mut total = 0;
        for record in &records {
            total += write_translations(record, header_format, translate_missing, &mut writer)?;
        }
        writer.flush()?;
        total
    };

    log::info!("Done. Wrote {} translations. Exiting.", total);
    Ok(())
}
