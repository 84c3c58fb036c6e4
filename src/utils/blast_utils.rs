use anyhow::{Context, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

pub const QUERY_ID_COLUMN: usize = 0;
pub const TARGET_ID_COLUMN: usize = 1;
pub const TARGET_START_COLUMN: usize = 8;
pub const TARGET_END_COLUMN: usize = 9;

/// One row of a tabular BLAST report. Coordinates are 1-based; a start greater
/// than the end means the hit lies on the reverse strand of the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub query_id: String,
    pub target_id: String,
    pub target_start: i64,
    pub target_end: i64,
}

fn column(record: &StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Expected at least {} columns, found {}", idx + 1, record.len()))
}

impl Hit {
    fn from_record(record: &StringRecord) -> Result<Self> {
        let start = column(record, TARGET_START_COLUMN)?;
        let end = column(record, TARGET_END_COLUMN)?;

        Ok(Hit {
            query_id: column(record, QUERY_ID_COLUMN)?.to_string(),
            target_id: column(record, TARGET_ID_COLUMN)?.to_string(),
            target_start: start
                .parse()
                .with_context(|| format!("Target start {:?} is not an integer", start))?,
            target_end: end
                .parse()
                .with_context(|| format!("Target end {:?} is not an integer", end))?,
        })
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'));
    builder
}

pub fn parse_hits<R: Read>(input: R) -> Result<Vec<Hit>> {
    let mut reader = reader_builder().from_reader(input);
    let mut hits = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {} of the report", row + 1))?;
        let hit = Hit::from_record(&record)
            .with_context(|| format!("Malformed hit on row {} of the report", row + 1))?;
        hits.push(hit);
    }

    Ok(hits)
}

pub fn read_hits(blast_file: &Path) -> Result<Vec<Hit>> {
    let file = std::fs::File::open(blast_file)
        .with_context(|| format!("Could not open BLAST report {:?}", blast_file))?;
    parse_hits(file).with_context(|| format!("Failed to parse BLAST report {:?}", blast_file))
}
