//! Spacers, the protospacers they hit, and the flank windows around each hit.
//!
//! All coordinates are 1-based and inclusive on both ends, as reported by BLAST.

use crate::utils::blast_utils::Hit;
use bio::alphabets::dna;
use itertools::Itertools;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static SPACER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"G(\d+)(?:SP|FL)(\d+)").expect("spacer name pattern compiles"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtospacerError {
    #[error("spacer name {0:?} does not fit the form G<group>SP<id> or G<group>FL<id>")]
    MalformedSpacerName(String),

    #[error("window {start}..{end} lies outside {genome} (length {length})")]
    CoordinateOutOfRange {
        genome: String,
        start: i64,
        end: i64,
        length: usize,
    },
}

/// The identity encoded in a spacer's query name, e.g. `G12SP3` is spacer 3 of group 12.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpacerName {
    pub group: String,
    pub spacer: String,
}

impl FromStr for SpacerName {
    type Err = ProtospacerError;

    fn from_str(query_id: &str) -> Result<Self, Self::Err> {
        let captures = SPACER_NAME
            .captures(query_id)
            .ok_or_else(|| ProtospacerError::MalformedSpacerName(query_id.to_string()))?;

        Ok(SpacerName {
            group: captures[1].to_string(),
            spacer: captures[2].to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    fn new(start: i64, end: i64) -> Self {
        Window { start, end }
    }

    /// An inverted window is empty. Anything else must fit inside `seq`.
    pub fn slice<'a>(&self, genome: &str, seq: &'a [u8]) -> Result<&'a [u8], ProtospacerError> {
        if self.end < self.start {
            return Ok(&[]);
        }
        if self.start < 1 || self.end > seq.len() as i64 {
            return Err(ProtospacerError::CoordinateOutOfRange {
                genome: genome.to_string(),
                start: self.start,
                end: self.end,
                length: seq.len(),
            });
        }
        Ok(&seq[(self.start - 1) as usize..self.end as usize])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlankWindows {
    pub strand: Strand,
    pub left: Window,
    pub right: Window,
    pub core: Window,
}

impl FlankWindows {
    /// Reverse-strand windows index into the reverse complement of the genome.
    ///
    /// The core window is `[end + 1, start - 1]` on both strands, so it is
    /// empty for every forward hit. Coordinates saturate at the `i64` limits,
    /// which no genome reaches, so such windows are dropped or rejected.
    pub fn new(start: i64, end: i64, flank_length: u32) -> Self {
        let flank_length = i64::from(flank_length);
        let core = Window::new(end.saturating_add(1), start.saturating_sub(1));
        if start > end {
            FlankWindows {
                strand: Strand::Reverse,
                left: Window::new(end.saturating_sub(flank_length), end),
                right: Window::new(start.saturating_add(1), start.saturating_add(flank_length)),
                core,
            }
        } else {
            FlankWindows {
                strand: Strand::Forward,
                left: Window::new(start.saturating_sub(flank_length), start),
                right: Window::new(end.saturating_add(1), end.saturating_add(flank_length)),
                core,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoSpacer {
    pub genome: String,
    pub start: i64,
    pub end: i64,
    pub left_flank: Option<Vec<u8>>,
    pub right_flank: Option<Vec<u8>>,
    pub core: Option<Vec<u8>>,
}

impl ProtoSpacer {
    pub fn new(genome: &str, start: i64, end: i64) -> Self {
        ProtoSpacer {
            genome: genome.to_string(),
            start,
            end,
            left_flank: None,
            right_flank: None,
            core: None,
        }
    }

    pub fn strand(&self) -> Strand {
        if self.start > self.end {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// `oriented` is the genome as seen from this protospacer's strand: the forward
    /// sequence for forward hits, its reverse complement for reverse hits.
    pub fn extract_flanks(
        &mut self,
        oriented: &[u8],
        flank_length: u32,
    ) -> Result<(), ProtospacerError> {
        let windows = FlankWindows::new(self.start, self.end, flank_length);

        if windows.left.start > 0 {
            self.left_flank = Some(windows.left.slice(&self.genome, oriented)?.to_vec());
        }
        if windows.right.end <= oriented.len() as i64 {
            self.right_flank = Some(windows.right.slice(&self.genome, oriented)?.to_vec());
        }
        self.core = Some(windows.core.slice(&self.genome, oriented)?.to_vec());

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spacer {
    pub name: SpacerName,
    pub protospacers: Vec<ProtoSpacer>,
}

/// Owns every spacer in the order its query id was first seen. The lookup
/// tables hold positions into `spacers`, never copies.
#[derive(Debug, Default)]
pub struct SpacerSet {
    spacers: Vec<Spacer>,
    by_query: HashMap<String, usize>,
    by_genome: HashMap<String, Vec<usize>>,
}

impl SpacerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hits<'a>(hits: impl IntoIterator<Item = &'a Hit>) -> Result<Self, ProtospacerError> {
        let mut set = SpacerSet::new();
        for hit in hits {
            set.add_hit(hit)?;
        }
        Ok(set)
    }

    pub fn add_hit(&mut self, hit: &Hit) -> Result<(), ProtospacerError> {
        let idx = match self.by_query.get(&hit.query_id) {
            Some(&idx) => idx,
            None => {
                let name: SpacerName = hit.query_id.parse()?;
                self.spacers.push(Spacer {
                    name,
                    protospacers: Vec::new(),
                });
                self.by_query
                    .insert(hit.query_id.clone(), self.spacers.len() - 1);
                self.spacers.len() - 1
            }
        };

        self.spacers[idx].protospacers.push(ProtoSpacer::new(
            &hit.target_id,
            hit.target_start,
            hit.target_end,
        ));
        self.by_genome
            .entry(hit.target_id.clone())
            .or_default()
            .push(idx);

        Ok(())
    }

    pub fn spacers(&self) -> &[Spacer] {
        &self.spacers
    }

    pub fn targets(&self, genome: &str) -> bool {
        self.by_genome.contains_key(genome)
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.by_genome.keys().map(String::as_str)
    }

    /// Fills in the flanks of every protospacer on `genome`, returning how many
    /// were processed. Genomes nobody targets are ignored.
    pub fn extract_flanks(
        &mut self,
        genome: &str,
        seq: &[u8],
        flank_length: u32,
    ) -> Result<usize, ProtospacerError> {
        let Some(indices) = self.by_genome.get(genome) else {
            return Ok(0);
        };

        let mut reverse_complement: Option<Vec<u8>> = None;
        let mut processed = 0;

        for &idx in indices.iter().unique() {
            for protospacer in self.spacers[idx]
                .protospacers
                .iter_mut()
                .filter(|p| p.genome == genome)
            {
                let oriented = match protospacer.strand() {
                    Strand::Forward => seq,
                    Strand::Reverse => reverse_complement
                        .get_or_insert_with(|| dna::revcomp(seq))
                        .as_slice(),
                };
                protospacer.extract_flanks(oriented, flank_length)?;
                processed += 1;
            }
        }

        Ok(processed)
    }

    /// Spacers grouped by their group id, groups in first-seen order.
    pub fn groups(&self) -> Vec<(&str, Vec<&Spacer>)> {
        let mut groups: Vec<(&str, Vec<&Spacer>)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for spacer in &self.spacers {
            let group = spacer.name.group.as_str();
            let pos = *positions.entry(group).or_insert_with(|| {
                groups.push((group, Vec::new()));
                groups.len() - 1
            });
            groups[pos].1.push(spacer);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query: &str, target: &str, start: i64, end: i64) -> Hit {
        Hit {
            query_id: query.to_string(),
            target_id: target.to_string(),
            target_start: start,
            target_end: end,
        }
    }

    // 200bp genome where base i (1-based) is distinguishable by position mod 4.
    fn genome() -> Vec<u8> {
        b"ACGT".iter().cycle().take(200).copied().collect()
    }

    #[test]
    fn parses_spacer_names() {
        let name: SpacerName = "G12SP003_extra".parse().unwrap();
        assert_eq!(name.group, "12");
        assert_eq!(name.spacer, "003");

        let flanking: SpacerName = "G4FL7".parse().unwrap();
        assert_eq!(flanking.group, "4");
        assert_eq!(flanking.spacer, "7");

        let prefixed: SpacerName = "CRISPR1_G1SP2".parse().unwrap();
        assert_eq!(prefixed.group, "1");
        assert_eq!(prefixed.spacer, "2");

        let piped: SpacerName = "contig7|G3SP12".parse().unwrap();
        assert_eq!(piped.group, "3");
        assert_eq!(piped.spacer, "12");

        assert!("SPACER_X".parse::<SpacerName>().is_err());
    }

    #[test]
    fn malformed_spacer_name() {
        assert_eq!(
            "SPACER_X".parse::<SpacerName>(),
            Err(ProtospacerError::MalformedSpacerName("SPACER_X".to_string()))
        );
        assert!("G1XX2".parse::<SpacerName>().is_err());
    }

    #[test]
    fn reverse_strand_windows() {
        let windows = FlankWindows::new(100, 80, 15);
        assert_eq!(windows.strand, Strand::Reverse);
        assert_eq!(windows.left, Window { start: 65, end: 80 });
        assert_eq!(windows.right, Window { start: 101, end: 115 });
        assert_eq!(windows.core, Window { start: 81, end: 99 });
    }

    #[test]
    fn forward_strand_windows() {
        let windows = FlankWindows::new(80, 100, 15);
        assert_eq!(windows.strand, Strand::Forward);
        assert_eq!(windows.left, Window { start: 65, end: 80 });
        assert_eq!(windows.right, Window { start: 101, end: 115 });
        assert_eq!(windows.core, Window { start: 101, end: 79 });
    }

    #[test]
    fn forward_flanks_come_from_the_forward_sequence() {
        let seq = genome();
        let mut proto = ProtoSpacer::new("chrA", 80, 100);
        proto.extract_flanks(&seq, 15).unwrap();

        assert_eq!(proto.left_flank.as_deref(), Some(&seq[64..80]));
        assert_eq!(proto.left_flank.as_ref().unwrap().len(), 16);
        assert_eq!(proto.right_flank.as_deref(), Some(&seq[100..115]));
        assert_eq!(proto.core.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn reverse_flanks_come_from_the_reverse_complement() {
        let seq = genome();
        let revcomp = dna::revcomp(&seq);
        let mut set = SpacerSet::from_hits(&[hit("G1SP2", "chrA", 100, 80)]).unwrap();

        assert_eq!(set.extract_flanks("chrA", &seq, 15).unwrap(), 1);

        let proto = &set.spacers()[0].protospacers[0];
        assert_eq!(proto.left_flank.as_deref(), Some(&revcomp[64..80]));
        assert_eq!(proto.right_flank.as_deref(), Some(&revcomp[100..115]));
        assert_eq!(proto.core.as_deref(), Some(&revcomp[80..99]));
        assert_eq!(proto.core.as_ref().unwrap().len(), 19);
    }

    #[test]
    fn flanks_running_off_the_ends_are_dropped() {
        let seq = genome();

        let mut near_start = ProtoSpacer::new("chrA", 15, 30);
        near_start.extract_flanks(&seq, 15).unwrap();
        assert_eq!(near_start.left_flank, None);
        assert!(near_start.right_flank.is_some());

        let mut near_end = ProtoSpacer::new("chrA", 170, 190);
        near_end.extract_flanks(&seq, 15).unwrap();
        assert!(near_end.left_flank.is_some());
        assert_eq!(near_end.right_flank, None);

        let mut at_end = ProtoSpacer::new("chrA", 170, 185);
        at_end.extract_flanks(&seq, 15).unwrap();
        assert_eq!(at_end.right_flank.as_deref(), Some(&seq[185..200]));
    }

    #[test]
    fn core_outside_the_genome_is_an_error() {
        let seq = genome();
        let mut proto = ProtoSpacer::new("chrA", 230, 190);
        let err = proto.extract_flanks(&seq, 15).unwrap_err();
        assert_eq!(
            err,
            ProtospacerError::CoordinateOutOfRange {
                genome: "chrA".to_string(),
                start: 191,
                end: 229,
                length: 200,
            }
        );
        assert!(matches!(
            err,
            ProtospacerError::CoordinateOutOfRange { length: 200, .. }
        ));
    }

    #[test]
    fn untargeted_genomes_are_ignored() {
        let seq = genome();
        let mut set = SpacerSet::from_hits(&[hit("G1SP2", "chrA", 100, 80)]).unwrap();
        assert!(!set.targets("chrB"));
        assert_eq!(set.extract_flanks("chrB", &seq, 15).unwrap(), 0);
        assert_eq!(set.spacers()[0].protospacers[0].core, None);
    }

    #[test]
    fn hits_group_by_query_and_group() {
        let hits = [
            hit("G2SP1", "chrA", 10, 30),
            hit("G1SP1", "chrA", 50, 70),
            hit("G2SP1", "chrB", 90, 70),
            hit("G2SP2", "chrA", 120, 140),
        ];
        let set = SpacerSet::from_hits(&hits).unwrap();

        assert_eq!(set.spacers().len(), 3);
        assert_eq!(set.spacers()[0].protospacers.len(), 2);
        assert_eq!(set.spacers()[0].protospacers[1].genome, "chrB");

        let groups = set.groups();
        let summary: Vec<(&str, Vec<&str>)> = groups
            .iter()
            .map(|(group, spacers)| {
                (*group, spacers.iter().map(|s| s.name.spacer.as_str()).collect())
            })
            .collect();
        assert_eq!(summary, vec![("2", vec!["1", "2"]), ("1", vec!["1"])]);
    }

    #[test]
    fn repeated_hits_on_a_genome_are_extracted_once_each() {
        let seq = genome();
        let hits = [
            hit("G1SP1", "chrA", 20, 40),
            hit("G1SP1", "chrA", 60, 80),
        ];
        let mut set = SpacerSet::from_hits(&hits).unwrap();
        assert_eq!(set.extract_flanks("chrA", &seq, 15).unwrap(), 2);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let windows = FlankWindows::new(i64::MAX - 5, i64::MAX, u32::MAX);
        assert_eq!(windows.right, Window { start: i64::MAX, end: i64::MAX });
        assert_eq!(windows.left.end, i64::MAX - 5);

        let reverse = FlankWindows::new(i64::MAX, i64::MIN + 3, u32::MAX);
        assert_eq!(reverse.left.start, i64::MIN);
        assert_eq!(reverse.right.end, i64::MAX);

        let seq = genome();
        let mut proto = ProtoSpacer::new("chrA", 20, i64::MAX);
        proto.extract_flanks(&seq, u32::MAX).unwrap();
        assert_eq!(proto.left_flank, None);
        assert_eq!(proto.right_flank, None);
        assert_eq!(proto.core.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn malformed_query_aborts_ingestion() {
        let hits = [hit("G1SP1", "chrA", 20, 40), hit("SPACER_X", "chrA", 60, 80)];
        assert!(matches!(
            SpacerSet::from_hits(&hits),
            Err(ProtospacerError::MalformedSpacerName(_))
        ));
    }
}
