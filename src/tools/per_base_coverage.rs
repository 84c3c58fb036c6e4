use crate::utils::coverage_utils::{CoverageReader, DepthFilter};
use crate::utils::fasta_utils::{Contig, load_contigs};
use crate::utils::open_output;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

const VERSION: &str = "1.0.0";

/// One CSV row per contig: the contig name, then the depth at every base.
pub fn write_per_base_coverage<W: Write>(
    bam_file: &Path,
    contigs: &[Contig],
    filter: DepthFilter,
    output: W,
) -> Result<()> {
    let mut reader = CoverageReader::from_path(bam_file, filter)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(output);

    for contig in contigs {
        let depths = reader.depths(&contig.name, contig.length)?;
        writer.write_field(&contig.name)?;
        for depth in depths {
            writer.write_field(depth.to_string())?;
        }
        writer.write_record(None::<&[u8]>)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn run(
    bam_file: &PathBuf,
    fasta_file: &PathBuf,
    output_file: Option<&Path>,
    min_length: usize,
    filter: DepthFilter,
) -> Result<()> {
    log::info!(
        "{}",
        format!("This is {} version {}", "per-base-coverage".italic(), VERSION)
            .bold()
            .bright_green()
    );
    log::info!("Command was run with {:?}", filter);

    let contigs = load_contigs(fasta_file, min_length)?;
    write_per_base_coverage(bam_file, &contigs, filter, open_output(output_file)?)?;

    log::info!("Done. Exiting.");
    Ok(())
}
