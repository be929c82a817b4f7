use crate::error::{Result, SeqScoutError};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_LINE_WIDTH: usize = 70;

lazy_static! {
    static ref SEQUENCE_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid sequence id regex");
}

/// Letters, digits, underscore and hyphen only, so the id is safe as a file name.
pub fn is_valid_sequence_id(id: &str) -> bool {
    SEQUENCE_ID.is_match(id)
}

/// Splits `sequence` into lines of at most `width` characters.
pub fn wrap_sequence(sequence: &str, width: usize) -> String {
    if sequence.is_empty() {
        return String::new();
    }
    let width = width.max(1);
    let chars = sequence.chars().collect::<Vec<_>>();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastaRecord {
    id: String,
    description: String,
    sequence: String,
}

impl FastaRecord {
    pub fn new(id: &str, description: &str, sequence: &str) -> Result<Self> {
        if !is_valid_sequence_id(id) {
            return Err(SeqScoutError::Message(format!(
                "Invalid sequence ID '{id}': use only letters, digits, '_' or '-'"
            )));
        }
        Ok(Self {
            id: id.to_string(),
            description: description.trim().to_string(),
            sequence: sequence.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> String {
        if self.description.is_empty() {
            format!(">{}", self.id)
        } else {
            format!(">{} {}", self.id, self.description)
        }
    }

    pub fn to_fasta_string(&self, width: usize) -> String {
        let body = wrap_sequence(&self.sequence, width);
        format!("{}\n{body}\n", self.header())
    }

    /// `<id>.fasta` inside `dir`.
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.fasta", self.id))
    }

    pub fn write_to(&self, path: &Path, width: usize) -> Result<()> {
        fs::write(path, self.to_fasta_string(width))
            .map_err(|e| format!("Could not write FASTA file '{}': {e}", path.display()))?;
        Ok(())
    }
}
