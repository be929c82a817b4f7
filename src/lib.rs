pub mod about;
pub mod composition;
pub mod dna_generator;
pub mod entrez;
pub mod error;
pub mod fasta;
pub mod length_chart;
pub mod logging;
pub mod prompt;
pub mod reference;
pub mod report_export;
pub mod settings;
pub mod taxon_report;
