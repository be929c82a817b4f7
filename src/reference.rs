//! Reference sequence retrieval and naive positional comparison.

use crate::{
    entrez::ReferenceSource,
    error::{Result, SeqScoutError},
};
use tracing::info;

/// Drops the FASTA header line and keeps only `ACGT` (any case), uppercased.
pub fn sanitize_fasta_text(text: &str) -> String {
    text.lines()
        .skip(1)
        .flat_map(str::chars)
        .filter(|&c| matches!(c, 'A' | 'C' | 'G' | 'T' | 'a' | 'c' | 'g' | 't'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn fetch_reference<S: ReferenceSource + ?Sized>(source: &S, accession: &str) -> Result<String> {
    let accession = accession.trim();
    if accession.is_empty() {
        return Err(SeqScoutError::Message("No reference accession given".to_string()));
    }
    let text = source.fetch_fasta_text(accession)?;
    let sequence = sanitize_fasta_text(&text);
    info!(accession, bases = sequence.len(), "fetched reference sequence");
    Ok(sequence)
}

/// Percentage of positions in `query` whose symbol equals the one at the same
/// position in `reference`. Positions past the end of `reference` count as
/// mismatches; an empty `query` scores 0. Positions are characters.
pub fn percent_identity(query: &str, reference: &str) -> f64 {
    let length = query.chars().count();
    if length == 0 {
        return 0.0;
    }
    let matches = query
        .chars()
        .zip(reference.chars())
        .filter(|(a, b)| a == b)
        .count();
    matches as f64 / length as f64 * 100.0
}

/// Compares `generated` against the leading window of `reference` of equal length.
pub fn compare_with_reference(generated: &str, reference: &str) -> Result<f64> {
    let wanted = generated.chars().count();
    let available = reference.chars().count();
    if available < wanted {
        return Err(SeqScoutError::Message(format!(
            "Reference sequence ({available} bp) is shorter than the generated one ({wanted} bp)"
        )));
    }
    let window = match reference.char_indices().nth(wanted) {
        Some((offset, _)) => &reference[..offset],
        None => reference,
    };
    Ok(percent_identity(generated, window))
}
