use anyhow::{Context, Result};
use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Location, Seq};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// Parses GenBank records from each file in turn, or from standard input when
/// `input_files` is empty.
pub fn read_records(input_files: &[PathBuf]) -> Result<Vec<Seq>> {
    let mut records = Vec::new();

    if input_files.is_empty() {
        log::info!("Reading GenBank records from standard input");
        for record in SeqReader::new(io::stdin().lock()) {
            records.push(record.context("Failed to parse GenBank record from standard input")?);
        }
    }

    for input_file in input_files {
        log::info!("Reading GenBank records from {:?}", input_file);
        let file = File::open(input_file)
            .with_context(|| format!("Could not open GenBank file {:?}", input_file))?;
        for record in SeqReader::new(file) {
            records.push(
                record.with_context(|| format!("Failed to parse GenBank record in {:?}", input_file))?,
            );
        }
    }

    Ok(records)
}

pub fn is_kind(feature: &Feature, kind: &str) -> bool {
    feature.kind.to_string().eq_ignore_ascii_case(kind)
}

/// First value of the qualifier `key`, if the feature has one.
pub fn qualifier<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.qualifier_values(key.into()).next()
}

/// The record's primary accession, falling back to its LOCUS name.
pub fn record_accession(record: &Seq) -> Option<&str> {
    record
        .accession
        .as_deref()
        .and_then(|accession| accession.split_whitespace().next())
        .or(record.name.as_deref())
}

/// Contiguous spans of a location as 1-based inclusive `(from, to)` pairs with
/// `from <= to`, in the order they appear in the location.
pub fn location_spans(location: &Location) -> Vec<(i64, i64)> {
    let mut spans = Vec::new();
    collect_location_spans(location, &mut spans);
    spans
}

fn collect_location_spans(location: &Location, spans: &mut Vec<(i64, i64)>) {
    match location {
        Location::Range((start, _), (end, _)) => {
            let (from, to) = if end < start { (*end, *start) } else { (*start, *end) };
            spans.push((from + 1, to));
        }
        Location::Complement(inner) => collect_location_spans(inner, spans),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_location_spans(part, spans);
            }
        }
        Location::External(_, Some(inner)) => collect_location_spans(inner, spans),
        Location::External(_, None) | Location::Between(_, _) | Location::Gap(_) => {}
    }
}

#[cfg(test)]
pub(crate) mod test_records {
    use gb_io::seq::{After, Before, Feature, Location, Seq};

    pub fn range(start: i64, end: i64) -> Location {
        Location::Range((start, Before(false)), (end, After(false)))
    }

    pub fn feature(kind: &str, location: Location, qualifiers: &[(&str, &str)]) -> Feature {
        Feature {
            kind: kind.into(),
            location,
            qualifiers: qualifiers
                .iter()
                .map(|(key, value)| ((*key).into(), Some(value.to_string())))
                .collect(),
        }
    }

    /// 30bp record: CDS 1..9 with a translation, CDS complement(13..21) without.
    pub fn record() -> Seq {
        let mut record = Seq::empty();
        record.name = Some("TESTLOCUS".to_string());
        record.accession = Some("ACC001 ACC002".to_string());
        record.seq = b"atgaaataaccgtcaacgcatggcctttaa".to_vec();
        record.features = vec![
            feature("source", range(0, 30), &[("organism", "test")]),
            feature(
                "CDS",
                range(0, 9),
                &[
                    ("locus_tag", "T_0001"),
                    ("gene", "abcA"),
                    ("product", "first protein"),
                    ("translation", "MK"),
                ],
            ),
            feature(
                "CDS",
                Location::Complement(Box::new(range(12, 21))),
                &[("locus_tag", "T_0002"), ("product", "second protein")],
            ),
        ];
        record
    }
}

#[cfg(test)]
mod tests {
    use super::test_records::{feature, range, record};
    use super::*;

    #[test]
    fn spans_are_one_based_inclusive() {
        assert_eq!(location_spans(&range(0, 9)), vec![(1, 9)]);
        assert_eq!(
            location_spans(&Location::Complement(Box::new(Location::Join(vec![
                range(9, 20),
                range(29, 40),
            ])))),
            vec![(10, 20), (30, 40)]
        );
        assert!(location_spans(&Location::Between(4, 5)).is_empty());
    }

    #[test]
    fn qualifier_lookup() {
        let cds = feature("CDS", range(0, 9), &[("gene", "abcA"), ("gene", "other")]);
        assert!(is_kind(&cds, "cds"));
        assert_eq!(qualifier(&cds, "gene"), Some("abcA"));
        assert_eq!(qualifier(&cds, "product"), None);
    }

    #[test]
    fn accession_falls_back_to_locus_name() {
        let mut seq = record();
        assert_eq!(record_accession(&seq), Some("ACC001"));
        seq.accession = None;
        assert_eq!(record_accession(&seq), Some("TESTLOCUS"));
    }
}
