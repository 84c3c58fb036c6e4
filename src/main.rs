mod tools;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use tools::extract_translations::HeaderFormat;
use utils::coverage_utils::DepthFilter;

#[derive(Parser)]
#[command(name = "gs-utils")]
#[command(about = "A collection of CLI utilities for genome coverage, annotation and CRISPR analysis")]
struct Cli {
    /// Only log errors. Overrides --log-level.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level: off, error, warn, info, debug or trace. RUST_LOG takes precedence.
    #[arg(long, global = true, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CoverageArgs {
    /// Coordinate-sorted, indexed BAM file
    #[arg(short = 'b', long)]
    bam_file: PathBuf,

    /// FASTA file with the contigs the reads were aligned to
    #[arg(short = 'f', long)]
    fasta_file: PathBuf,

    /// Where to write the CSV output. Defaults to stdout.
    #[arg(short = 'o', long)]
    output_file: Option<PathBuf>,

    /// Contigs shorter than this are skipped
    #[arg(short = 'l', long, default_value_t = 1000)]
    min_length: usize,

    /// Reads with a lower mapping quality do not count towards the depth
    #[arg(short = 'Q', long, default_value_t = 0)]
    min_mapq: u8,

    /// Bases with a lower base quality do not count towards the depth
    #[arg(long, default_value_t = 0)]
    min_baseq: u8,
}

impl CoverageArgs {
    fn depth_filter(&self) -> DepthFilter {
        DepthFilter {
            min_mapq: self.min_mapq,
            min_baseq: self.min_baseq,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cut the sequence flanking each CRISPR spacer hit, for PAM identification
    PamIdentifier {
        /// Tabular BLAST report (-outfmt 6) of spacers against genomes
        #[arg(short = 'b', long)]
        blast_file: PathBuf,

        /// FASTA file with the genomes named in the BLAST report
        #[arg(short = 's', long)]
        sequences: PathBuf,

        /// Length of the flanks to extract
        #[arg(short = 'l', long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..))]
        length: u32,

        /// Directory to write the G<group>.protospacers.{l,r}.fa files to
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Average read depth and GC content of each contig
    AverageCoverage(CoverageArgs),
    /// Read depth at every base of each contig
    PerBaseCoverage(CoverageArgs),
    /// Write the /translation of every annotated feature in GenBank files as FASTA
    ExtractTranslations {
        /// GenBank files to read. Reads stdin if none are given.
        input_files: Vec<PathBuf>,

        /// Colon-separated header fields: l locus_tag, g gene, p product, n note,
        /// f function, P protein_id, A prefix with the accession
        #[arg(short = 'f', long, default_value = "l:g:p:n:f")]
        format: String,

        /// Write the translations of each record to <accession>.faa
        #[arg(short = 's', long)]
        split_entries: bool,

        /// Translate CDS features that have no /translation qualifier
        #[arg(short = 't', long)]
        translate_missing: bool,

        /// Where to write the translations. Defaults to stdout.
        #[arg(short = 'o', long, conflicts_with = "split_entries")]
        output_file: Option<PathBuf>,

        /// Directory for the files written with --split-entries
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List the locus tag, coordinates and product of every CDS in GenBank files
    CdsRanges {
        /// GenBank files to read. Reads stdin if none are given.
        input_files: Vec<PathBuf>,

        /// Where to write the table. Defaults to stdout.
        #[arg(short = 'o', long)]
        output_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        cli.log_level
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()?;

    match &cli.command {
        Commands::PamIdentifier {
            blast_file,
            sequences,
            length,
            output_dir,
        } => tools::pam_identifier::run(blast_file, sequences, *length, output_dir)?,
        Commands::AverageCoverage(args) => tools::average_coverage::run(
            &args.bam_file,
            &args.fasta_file,
            args.output_file.as_deref(),
            args.min_length,
            args.depth_filter(),
        )?,
        Commands::PerBaseCoverage(args) => tools::per_base_coverage::run(
            &args.bam_file,
            &args.fasta_file,
            args.output_file.as_deref(),
            args.min_length,
            args.depth_filter(),
        )?,
        Commands::ExtractTranslations {
            input_files,
            format,
            split_entries,
            translate_missing,
            output_file,
            output_dir,
        } => {
            let header_format: HeaderFormat = format.parse()?;
            tools::extract_translations::run(
                input_files,
                output_file.as_deref(),
                output_dir,
                &header_format,
                *split_entries,
                *translate_missing,
            )?;
        }
        Commands::CdsRanges {
            input_files,
            output_file,
        } => tools::cds_ranges::run(input_files, output_file.as_deref())?,
    }
    Ok(())
}
