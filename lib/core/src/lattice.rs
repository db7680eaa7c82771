//! Token type lattice
//!
//! Token types form a partial order under "is a subtype of": every `Integer`
//! is also a valid `Float`, every `Float` is a valid `CategoricalString`, and so on,
//! with `Missing` at the bottom and `Unknown` at the top. The lattice stores the
//! declared subtype sets and derives the Hasse diagram (covering edges only) used
//! to resolve the closest common ancestor of two types.
//!
//! ```text
//!                 Unknown
//!                    │
//!            CategoricalString
//!             │             │
//!           Float           │
//!             │             │
//!          Integer        Binary
//!             │             │
//!       BinaryDigital       │
//!             │             │
//!             └── Missing ──┘
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Type tag of a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Integer,
    Float,
    CategoricalString,
    /// Textual true/false
    Binary,
    /// Digital 0/1
    BinaryDigital,
    Unknown,
    Missing,
}

impl TokenType {
    pub const COUNT: usize = 7;

    /// All types in declaration order; this order drives every tie-break in the lattice
    pub const ALL: [TokenType; TokenType::COUNT] = [
        TokenType::Integer,
        TokenType::Float,
        TokenType::CategoricalString,
        TokenType::Binary,
        TokenType::BinaryDigital,
        TokenType::Unknown,
        TokenType::Missing,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    /// Whether a column of this type can be fed to a distance function
    #[inline]
    pub fn is_supported(self) -> bool {
        !matches!(self, TokenType::Unknown | TokenType::Missing)
    }

    /// Whether tokens of this type carry a numeric value
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, TokenType::Integer | TokenType::Float)
    }

    /// Closest common ancestor in the standard lattice
    pub fn closest_common_ancestor(self, other: TokenType) -> TokenType {
        TypeLattice::standard().closest_common_ancestor(self, other)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Integer => "integer",
            TokenType::Float => "float",
            TokenType::CategoricalString => "categorical_string",
            TokenType::Binary => "binary",
            TokenType::BinaryDigital => "binary_digital",
            TokenType::Unknown => "unknown",
            TokenType::Missing => "missing",
        };
        f.write_str(name)
    }
}

/// Compact set of token types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeSet(u8);

impl TypeSet {
    pub const EMPTY: TypeSet = TypeSet(0);

    pub fn of(types: &[TokenType]) -> Self {
        let mut set = Self::EMPTY;
        for &t in types {
            set.insert(t);
        }
        set
    }

    #[inline]
    pub fn contains(self, t: TokenType) -> bool {
        self.0 & (1 << t.index()) != 0
    }

    #[inline]
    pub fn insert(&mut self, t: TokenType) {
        self.0 |= 1 << t.index();
    }

    #[inline]
    pub fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate in `TokenType::ALL` order
    pub fn iter(self) -> impl Iterator<Item = TokenType> {
        TokenType::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

/// Validated subtype graph with its Hasse diagram
#[derive(Debug, Clone)]
pub struct TypeLattice {
    subtypes: [TypeSet; TokenType::COUNT],
    /// Covering edges: minimal immediate supertypes, in `TokenType::ALL` order
    parents: [Vec<TokenType>; TokenType::COUNT],
    /// Transitive closure of the supertype relation
    ancestors: [TypeSet; TokenType::COUNT],
}

impl TypeLattice {
    /// Build a lattice from declared subtype sets indexed by `TokenType as usize`.
    ///
    /// Fails if the graph has a cycle or if `Unknown` is not reachable from every type.
    pub fn new(subtypes: [TypeSet; TokenType::COUNT]) -> Result<Self> {
        for t in TokenType::ALL {
            if subtypes[t.index()].contains(t) {
                return Err(Error::InvalidLattice(format!("{} is declared its own subtype", t)));
            }
        }

        // Invert: s is a supertype of t when t is declared among the subtypes of s
        let mut supertypes = [TypeSet::EMPTY; TokenType::COUNT];
        for s in TokenType::ALL {
            for t in subtypes[s.index()].iter() {
                supertypes[t.index()].insert(s);
            }
        }

        let ancestors = transitive_closure(&supertypes)?;

        for t in TokenType::ALL {
            if t != TokenType::Unknown && !ancestors[t.index()].contains(TokenType::Unknown) {
                return Err(Error::InvalidLattice(format!(
                    "{} is not reachable from {}",
                    TokenType::Unknown,
                    t
                )));
            }
        }

        // Keep only covering edges: drop s when it is reachable through another supertype
        let mut parents: [Vec<TokenType>; TokenType::COUNT] = Default::default();
        for t in TokenType::ALL {
            let direct = supertypes[t.index()];
            parents[t.index()] = direct
                .iter()
                .filter(|&s| {
                    !direct
                        .iter()
                        .any(|other| other != s && ancestors[other.index()].contains(s))
                })
                .collect();
        }

        Ok(Self {
            subtypes,
            parents,
            ancestors,
        })
    }

    /// The built-in lattice, built once and shared read-only
    pub fn standard() -> &'static TypeLattice {
        static STANDARD: OnceLock<TypeLattice> = OnceLock::new();
        STANDARD.get_or_init(|| {
            // the table below is constant: every declared subtype sits strictly lower and
            // Unknown covers all other types, so validation cannot fail
            TypeLattice::new(Self::standard_subtypes())
                .expect("built-in token type lattice is acyclic and rooted at Unknown")
        })
    }

    /// Declared subtype sets of the built-in lattice
    pub fn standard_subtypes() -> [TypeSet; TokenType::COUNT] {
        use TokenType::*;
        let mut subtypes = [TypeSet::EMPTY; TokenType::COUNT];
        subtypes[Missing.index()] = TypeSet::EMPTY;
        subtypes[BinaryDigital.index()] = TypeSet::of(&[Missing]);
        subtypes[Binary.index()] = TypeSet::of(&[Missing]);
        subtypes[Integer.index()] = TypeSet::of(&[Missing, BinaryDigital]);
        subtypes[Float.index()] = TypeSet::of(&[Missing, BinaryDigital, Integer]);
        subtypes[CategoricalString.index()] =
            TypeSet::of(&[Missing, BinaryDigital, Integer, Float, Binary]);
        subtypes[Unknown.index()] =
            TypeSet::of(&[Missing, BinaryDigital, Integer, Float, Binary, CategoricalString]);
        subtypes
    }

    /// Declared subtypes of `t`
    pub fn subtypes_of(&self, t: TokenType) -> TypeSet {
        self.subtypes[t.index()]
    }

    /// Covering supertypes of `t` (Hasse diagram edges)
    pub fn immediate_supertypes(&self, t: TokenType) -> &[TokenType] {
        &self.parents[t.index()]
    }

    /// Whether `ancestor` lies strictly above `t`
    pub fn is_ancestor(&self, ancestor: TokenType, t: TokenType) -> bool {
        self.ancestors[t.index()].contains(ancestor)
    }

    /// All ancestors of `t`, layer by layer from the immediate supertypes upwards
    pub fn general_ancestors(&self, t: TokenType) -> Vec<TokenType> {
        let mut seen = TypeSet::EMPTY;
        let mut result = Vec::new();
        let mut layer: Vec<TokenType> = self.immediate_supertypes(t).to_vec();
        while !layer.is_empty() {
            let mut next = Vec::new();
            for s in layer {
                if seen.contains(s) {
                    continue;
                }
                seen.insert(s);
                result.push(s);
                next.extend_from_slice(self.immediate_supertypes(s));
            }
            layer = next;
        }
        result
    }

    /// The nearest type both `t1` and `t2` generalise to.
    ///
    /// Equal types resolve to themselves and comparable types to the greater one.
    /// Otherwise the covering supertypes of `t1` are searched in order and the first
    /// hit wins.
    pub fn closest_common_ancestor(&self, t1: TokenType, t2: TokenType) -> TokenType {
        self.search_common_ancestor(t1, t2).unwrap_or(TokenType::Unknown)
    }

    fn search_common_ancestor(&self, t1: TokenType, t2: TokenType) -> Option<TokenType> {
        if t1 == t2 || self.is_ancestor(t1, t2) {
            return Some(t1);
        }
        if self.is_ancestor(t2, t1) {
            return Some(t2);
        }
        self.immediate_supertypes(t1)
            .iter()
            .find_map(|&parent| self.search_common_ancestor(parent, t2))
    }
}

/// Reachability over the supertype edges; errors on a cycle
fn transitive_closure(
    supertypes: &[TypeSet; TokenType::COUNT],
) -> Result<[TypeSet; TokenType::COUNT]> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Fresh,
        Visiting,
        Done,
    }

    fn visit(
        t: TokenType,
        supertypes: &[TypeSet; TokenType::COUNT],
        marks: &mut [Mark; TokenType::COUNT],
        closure: &mut [TypeSet; TokenType::COUNT],
    ) -> Result<()> {
        match marks[t.index()] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(Error::InvalidLattice(format!("cycle through {}", t)));
            }
            Mark::Fresh => {}
        }
        marks[t.index()] = Mark::Visiting;
        let mut reach = TypeSet::EMPTY;
        for s in supertypes[t.index()].iter() {
            visit(s, supertypes, marks, closure)?;
            reach.insert(s);
            reach = reach.union(closure[s.index()]);
        }
        closure[t.index()] = reach;
        marks[t.index()] = Mark::Done;
        Ok(())
    }

    let mut marks = [Mark::Fresh; TokenType::COUNT];
    let mut closure = [TypeSet::EMPTY; TokenType::COUNT];
    for t in TokenType::ALL {
        visit(t, supertypes, &mut marks, &mut closure)?;
    }
    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenType::*;

    #[test]
    fn test_hasse_diagram_keeps_covering_edges_only() {
        let lattice = TypeLattice::standard();
        assert_eq!(lattice.immediate_supertypes(Missing), &[Binary, BinaryDigital][..]);
        assert_eq!(lattice.immediate_supertypes(BinaryDigital), &[Integer][..]);
        assert_eq!(lattice.immediate_supertypes(Integer), &[Float][..]);
        assert_eq!(lattice.immediate_supertypes(Float), &[CategoricalString][..]);
        assert_eq!(lattice.immediate_supertypes(Binary), &[CategoricalString][..]);
        assert_eq!(lattice.immediate_supertypes(CategoricalString), &[Unknown][..]);
        assert!(lattice.immediate_supertypes(Unknown).is_empty());
    }

    #[test]
    fn test_closest_common_ancestor_reflexive() {
        for t in TokenType::ALL {
            assert_eq!(t.closest_common_ancestor(t), t);
        }
    }

    #[test]
    fn test_closest_common_ancestor_comparable() {
        assert_eq!(Integer.closest_common_ancestor(Float), Float);
        assert_eq!(Float.closest_common_ancestor(Integer), Float);
        assert_eq!(BinaryDigital.closest_common_ancestor(Integer), Integer);
        assert_eq!(Missing.closest_common_ancestor(Binary), Binary);
        assert_eq!(Unknown.closest_common_ancestor(Missing), Unknown);
    }

    #[test]
    fn test_closest_common_ancestor_incomparable() {
        assert_eq!(Binary.closest_common_ancestor(BinaryDigital), CategoricalString);
        assert_eq!(BinaryDigital.closest_common_ancestor(Binary), CategoricalString);
        assert_eq!(Float.closest_common_ancestor(Binary), CategoricalString);
    }

    #[test]
    fn test_general_ancestors_layer_order() {
        let lattice = TypeLattice::standard();
        assert_eq!(
            lattice.general_ancestors(BinaryDigital),
            vec![Integer, Float, CategoricalString, Unknown]
        );
        assert_eq!(
            lattice.general_ancestors(Missing),
            vec![Binary, BinaryDigital, CategoricalString, Integer, Unknown, Float]
        );
        assert!(lattice.general_ancestors(Unknown).is_empty());
    }

    #[test]
    fn test_subtypes_of() {
        let lattice = TypeLattice::standard();
        let subs = lattice.subtypes_of(Float);
        assert_eq!(subs.len(), 3);
        assert!(subs.contains(Integer));
        assert!(!subs.contains(Binary));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut subtypes = TypeLattice::standard_subtypes();
        subtypes[BinaryDigital as usize].insert(Float);
        assert!(matches!(TypeLattice::new(subtypes), Err(Error::InvalidLattice(_))));
    }

    #[test]
    fn test_self_subtype_rejected() {
        let mut subtypes = TypeLattice::standard_subtypes();
        subtypes[Integer as usize].insert(Integer);
        assert!(matches!(TypeLattice::new(subtypes), Err(Error::InvalidLattice(_))));
    }

    #[test]
    fn test_unrooted_lattice_rejected() {
        let mut subtypes = TypeLattice::standard_subtypes();
        subtypes[Unknown as usize] = TypeSet::of(&[Missing, Integer]);
        // Binary and CategoricalString no longer lead to Unknown
        assert!(matches!(TypeLattice::new(subtypes), Err(Error::InvalidLattice(_))));
    }
}
