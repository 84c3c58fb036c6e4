pub mod blast_utils;
pub mod coverage_utils;
pub mod fasta_utils;
pub mod genbank_utils;
pub mod protospacer;
pub mod translate;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Buffered writer for `output_file`, or standard output when none is given.
pub fn open_output(output_file: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output_file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Could not create output file {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
