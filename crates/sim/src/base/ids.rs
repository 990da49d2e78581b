//! Strongly typed row identifiers for the graph tables.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Row index into the owning table.
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

table_id!(
    /// A haploid genome copy (row of the node table).
    NodeId
);
table_id!(
    /// A diploid individual (row of the individual table).
    IndividualId
);
table_id!(
    /// A sub-population (row of the population table).
    PopulationId
);
table_id!(
    /// A variable position (row of the site table).
    SiteId
);

/// A versioned mutation identifier.
///
/// Identifiers are allocated monotonically within one numbering scheme and
/// are carried in a mutation's derived state, never in its row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(pub u64);

impl MutationId {
    /// The identifier following this one, or `None` on overflow.
    pub fn checked_next(self) -> Option<MutationId> {
        self.0.checked_add(1).map(MutationId)
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_by_index() {
        assert!(NodeId(1) < NodeId(2));
        assert_eq!(IndividualId::from(7).index(), 7);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&NodeId(12)).unwrap();
        assert_eq!(json, "12");
        let back: PopulationId = serde_json::from_str("3").unwrap();
        assert_eq!(back, PopulationId(3));
    }

    #[test]
    fn test_mutation_id_checked_next() {
        assert_eq!(MutationId(4).checked_next(), Some(MutationId(5)));
        assert_eq!(MutationId(u64::MAX).checked_next(), None);
    }
}
