//! Random DNA and token embedding.

use rand::Rng;

pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// `length` bases drawn independently and uniformly from `ACGT`.
pub fn generate_dna<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    (0..length)
        .map(|_| NUCLEOTIDES[rng.random_range(0..NUCLEOTIDES.len())] as char)
        .collect()
}

/// A sequence that may carry one spliced-in token.
///
/// The token is plain text inside `text`; keep the original sequence around
/// for anything that should only see bases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedSequence {
    pub text: String,
    pub token_position: Option<usize>,
}

/// Inserts `token` at a random position of `sequence`.
///
/// The position is drawn from `0..len`, so at least one base always follows
/// the token when `sequence` is non-empty.
pub fn embed_token<R: Rng + ?Sized>(sequence: &str, token: &str, rng: &mut R) -> AnnotatedSequence {
    if token.is_empty() {
        return AnnotatedSequence {
            text: sequence.to_string(),
            token_position: None,
        };
    }
    if sequence.is_empty() {
        return AnnotatedSequence {
            text: token.to_string(),
            token_position: Some(0),
        };
    }
    let position = rng.random_range(0..sequence.chars().count());
    AnnotatedSequence {
        text: splice_at(sequence, token, position),
        token_position: Some(position),
    }
}

fn splice_at(sequence: &str, token: &str, char_position: usize) -> String {
    let byte_offset = sequence
        .char_indices()
        .nth(char_position)
        .map(|(offset, _)| offset)
        .unwrap_or(sequence.len());
    let mut out = String::with_capacity(sequence.len() + token.len());
    out.push_str(&sequence[..byte_offset]);
    out.push_str(token);
    out.push_str(&sequence[byte_offset..]);
    out
}
