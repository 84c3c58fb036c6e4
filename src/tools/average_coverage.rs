use crate::utils::coverage_utils::{CoverageReader, DepthFilter, mean_depth};
use crate::utils::fasta_utils::{Contig, load_contigs};
use crate::utils::open_output;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

const VERSION: &str = "1.0.0";

fn contig_row(contig: &Contig, coverage: f64) -> [String; 4] {
    [
        contig.name.clone(),
        contig.length.to_string(),
        format!("{:.4}", contig.gc),
        format!("{:.4}", coverage),
    ]
}

pub fn write_average_coverage<W: Write>(
    bam_file: &Path,
    contigs: &[Contig],
    filter: DepthFilter,
    output: W,
) -> Result<()> {
    let mut reader = CoverageReader::from_path(bam_file, filter)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(output);

    for contig in contigs {
        let depths = reader.depths(&contig.name, contig.length)?;
        let coverage = mean_depth(&depths);
        log::debug!("{} has an average coverage of {:.2}", contig.name, coverage);
        writer.write_record(contig_row(contig, coverage))?;
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
        format!("This is {} version {}", "average-coverage".italic(), VERSION)
            .bold()
            .bright_green()
    );
    log::info!("Command was run with {:?}", filter);

    let contigs = load_contigs(fasta_file, min_length)?;
    write_average_coverage(bam_file, &contigs, filter, open_output(output_file)?)?;

    log::info!("Done. Exiting.");
    Ok(())
}
