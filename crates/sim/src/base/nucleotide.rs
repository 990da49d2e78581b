use core::fmt;

/// A DNA nucleotide used when alleles are rendered for variant export.
///
/// The mapping of variants to integers is stable (A=0, C=1, G=2, T=3) so a
/// seeded draw of an index always yields the same base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nucleotide {
    A = 0,
    C = 1,
    G = 2,
    T = 3,
}

impl Nucleotide {
    /// All four bases in index order.
    pub const ALL: [Nucleotide; 4] = [Self::A, Self::C, Self::G, Self::T];

    /// Convert to an uppercase `char` representing this nucleotide.
    #[inline(always)]
    pub const fn to_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::T => 'T',
        }
    }

    /// The three bases that differ from `self`, in index order.
    ///
    /// Used to pick a non-reference base for a derived allele.
    pub fn others(self) -> [Nucleotide; 3] {
        let mut out = [Self::A; 3];
        let mut k = 0;
        for n in Self::ALL {
            if n != self {
                out[k] = n;
                k += 1;
            }
        }
        out
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_others_excludes_self() {
        for n in Nucleotide::ALL {
            let others = n.others();
            assert!(!others.contains(&n));
            assert_eq!(others.len(), 3);
        }
        assert_eq!(
            Nucleotide::C.others(),
            [Nucleotide::A, Nucleotide::G, Nucleotide::T]
        );
    }

    #[test]
    fn test_nucleotide_display() {
        assert_eq!(Nucleotide::G.to_string(), "G");
    }
}
