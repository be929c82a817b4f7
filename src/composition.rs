use std::fmt;

/// Base composition in percent of the full sequence length.
///
/// Symbols outside `ACGT` (including lowercase) still count toward the length,
/// so the four bases need not add up to 100. Length is counted in characters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompositionStats {
    pub a: f64,
    pub c: f64,
    pub g: f64,
    pub t: f64,
    pub cg: f64,
}

impl CompositionStats {
    pub fn from_sequence(sequence: &str) -> Self {
        let mut counts = [0usize; 4];
        let mut total = 0usize;
        for base in sequence.chars() {
            total += 1;
            match base {
                'A' => counts[0] += 1,
                'C' => counts[1] += 1,
                'G' => counts[2] += 1,
                'T' => counts[3] += 1,
                _ => {}
            }
        }
        if total == 0 {
            return Self::default();
        }
        let total = total as f64;
        let percent = |n: usize| n as f64 / total * 100.0;
        Self {
            a: percent(counts[0]),
            c: percent(counts[1]),
            g: percent(counts[2]),
            t: percent(counts[3]),
            cg: percent(counts[1] + counts[2]),
        }
    }
}

impl fmt::Display for CompositionStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "A: {:.1}%", self.a)?;
        writeln!(f, "C: {:.1}%", self.c)?;
        writeln!(f, "G: {:.1}%", self.g)?;
        writeln!(f, "T: {:.1}%", self.t)?;
        write!(f, "%CG: {:.1}%", self.cg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_is_all_zero() {
        assert_eq!(CompositionStats::from_sequence(""), CompositionStats::default());
    }

    #[test]
    fn test_balanced_sequence() {
        let stats = CompositionStats::from_sequence("AACCGGTT");
        assert_eq!(
            stats,
            CompositionStats {
                a: 25.0,
                c: 25.0,
                g: 25.0,
                t: 25.0,
                cg: 50.0
            }
        );
    }

    #[test]
    fn test_foreign_symbols_only_count_toward_length() {
        let stats = CompositionStats::from_sequence("ACGTNNNN");
        assert_eq!(stats.a, 12.5);
        assert_eq!(stats.cg, 25.0);
        assert!(stats.a + stats.c + stats.g + stats.t < 100.0);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let stats = CompositionStats::from_sequence("AÅ");
        assert_eq!(stats.a, 50.0);
        assert_eq!(stats.cg, 0.0);
    }

    #[test]
    fn test_display_uses_one_decimal() {
        let text = CompositionStats::from_sequence("AAC").to_string();
        assert_eq!(text, "A: 66.7%\nC: 33.3%\nG: 0.0%\nT: 0.0%\n%CG: 33.3%");
    }
}
