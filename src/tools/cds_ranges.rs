use crate::utils::genbank_utils::{is_kind, location_spans, qualifier, read_records};
use crate::utils::open_output;
use anyhow::Result;
use colored::Colorize;
use gb_io::seq::Seq;
use std::io::Write;
use std::path::{Path, PathBuf};

const VERSION: &str = "1.0.0";

/// Tab-separated `locus_tag, from, to, product` for every span of every CDS.
pub fn write_cds_ranges<W: Write>(records: &[Seq], output: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(output);

    let mut rows = 0;
    for record in records {
        for feature in record.features.iter().filter(|feature| is_kind(feature, "CDS")) {
            let locus_tag = qualifier(feature, "locus_tag").unwrap_or_default();
            let product = qualifier(feature, "product").unwrap_or_default();
            for (from, to) in location_spans(&feature.location) {
                let (from, to) = (from.to_string(), to.to_string());
                writer.write_record([locus_tag, from.as_str(), to.as_str(), product])?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    Ok(rows)
}

pub fn run(input_files: &[PathBuf], output_file: Option<&Path>) -> Result<()> {
    log::info!(
        "{}",
        format!("This is {} version {}", "cds-ranges".italic(), VERSION)
            .bold()
            .bright_green()
    );

    let records = read_records(input_files)?;
    let rows = write_cds_ranges(&records, open_output(output_file)?)?;

    log::info!("Done. Wrote {} CDS ranges from {} records.", rows, records.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::genbank_utils::test_records::{feature, range, record};
    use gb_io::seq::Location;

    #[test]
    fn one_row_per_cds_span() {
        let mut seq = record();
        seq.features.push(feature(
            "CDS",
            Location::Join(vec![range(21, 24), range(26, 30)]),
            &[("gene", "spliced")],
        ));

        let mut output = Vec::new();
        let rows = write_cds_ranges(&[seq], &mut output).unwrap();

        assert_eq!(rows, 4);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "T_0001\t1\t9\tfirst protein\n\
             T_0002\t13\t21\tsecond protein\n\
             \t22\t24\t\n\
             \t27\t30\t\n"
        );
    }
}
