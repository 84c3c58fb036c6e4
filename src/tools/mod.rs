pub mod average_coverage;
pub mod cds_ranges;
pub mod extract_translations;
pub mod pam_identifier;
pub mod per_base_coverage;
