use anyhow::{Context, Result};
use rust_htslib::bam;
use rust_htslib::bam::Read;
use rust_htslib::bam::pileup::Alignment;
use std::path::Path;

/// Which pileup alignments count towards the depth at a base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthFilter {
    pub min_mapq: u8,
    pub min_baseq: u8,
}

impl DepthFilter {
    fn accepts(&self, alignment: &Alignment) -> bool {
        if alignment.is_del() || alignment.is_refskip() {
            return false;
        }
        let record = alignment.record();
        if record.mapq() < self.min_mapq {
            return false;
        }
        match alignment.qpos() {
            Some(qpos) => record
                .qual()
                .get(qpos)
                .is_none_or(|&base_quality| base_quality >= self.min_baseq),
            None => false,
        }
    }
}

pub struct CoverageReader {
    reader: bam::IndexedReader,
    filter: DepthFilter,
}

impl CoverageReader {
    pub fn from_path(bam_file: &Path, filter: DepthFilter) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(bam_file)
            .with_context(|| format!("Could not open indexed BAM file {:?}", bam_file))?;
        Ok(CoverageReader { reader, filter })
    }

    /// Depth at each base of `contig`, 0-based. Bases without reads are 0.
    pub fn depths(&mut self, contig: &str, length: usize) -> Result<Vec<u32>> {
        let mut depths = vec![0u32; length];

        if self.reader.header().tid(contig.as_bytes()).is_none() {
            log::warn!("Contig {} is not in the BAM header, reporting zero coverage", contig);
            return Ok(depths);
        }

        self.reader
            .fetch((contig, 0, length as i64))
            .with_context(|| format!("Failed to fetch {} from the BAM file", contig))?;

        let mut pileups = self.reader.pileup();
        pileups.set_max_depth(i32::MAX as u32);

        let filter = self.filter;
        for pileup in pileups {
            let pileup = pileup.with_context(|| format!("Failed to pile up reads on {}", contig))?;
            let pos = pileup.pos() as usize;
            if pos >= length {
                continue;
            }
            depths[pos] = pileup
                .alignments()
                .filter(|alignment| filter.accepts(alignment))
                .count() as u32;
        }

        Ok(depths)
    }
}

pub fn mean_depth(depths: &[u32]) -> f64 {
    if depths.is_empty() {
        return 0.0;
    }
    depths.iter().map(|&depth| depth as u64).sum::<u64>() as f64 / depths.len() as f64
}
