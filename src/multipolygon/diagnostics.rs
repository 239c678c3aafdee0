//! Recoverable anomalies found while resolving a relation.
//!
//! Every anomaly is logged once, tagged with its relation id, when it is
//! recorded. The collected list is handed back to the caller with the
//! relation's outcome.

use log::warn;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The relation has no usable member ways.
    EmptyRelation,
    DuplicateMember {
        way_id: u64,
    },
    TooFewPoints {
        way_id: u64,
        points: usize,
    },
    /// A way closed in the source was cut short and closed with a straight segment.
    ArtificiallyClosed {
        way_id: u64,
    },
    MixedRoles {
        way_ids: Vec<u64>,
    },
    UnclosedRing {
        way_ids: Vec<u64>,
    },
    DegenerateRing {
        way_ids: Vec<u64>,
    },
    IdenticalRings {
        first: Vec<u64>,
        second: Vec<u64>,
    },
    NoOuterInPartition {
        rings: usize,
        depth: u32,
    },
    InnerRingOutermost {
        way_ids: Vec<u64>,
    },
    /// A ring nests directly inside a ring of the same role.
    NestedSameRole {
        way_ids: Vec<u64>,
        role: &'static str,
        candidates: Vec<Vec<u64>>,
    },
    /// A ring that no outer ring reached.
    UnfinishedRing {
        way_ids: Vec<u64>,
        candidates: Vec<Vec<u64>>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyRelation => write!(f, "no usable member ways"),
            Diagnostic::DuplicateMember { way_id } => {
                write!(f, "way {way_id} is a member more than once, keeping the first")
            }
            Diagnostic::TooFewPoints { way_id, points } => {
                write!(f, "way {way_id} has {points} point(s), dropping it")
            }
            Diagnostic::ArtificiallyClosed { way_id } => {
                write!(f, "way {way_id} is incomplete in this tile, closing it artificially")
            }
            Diagnostic::MixedRoles { way_ids } => {
                write!(f, "ring of ways {way_ids:?} mixes inner and outer roles")
            }
            Diagnostic::UnclosedRing { way_ids } => {
                write!(f, "ring of ways {way_ids:?} cannot be closed, dropping it")
            }
            Diagnostic::DegenerateRing { way_ids } => {
                write!(f, "ring of ways {way_ids:?} is degenerate, dropping it")
            }
            Diagnostic::IdenticalRings { first, second } => {
                write!(f, "rings of ways {first:?} and {second:?} are identical, dropping the second")
            }
            Diagnostic::NoOuterInPartition { rings, depth } => write!(
                f,
                "partition of {rings} ring(s) at depth {depth} has no outer ring"
            ),
            Diagnostic::InnerRingOutermost { way_ids } => write!(
                f,
                "inner ring of ways {way_ids:?} is not inside any outer ring, excluding it"
            ),
            Diagnostic::NestedSameRole {
                way_ids,
                role,
                candidates,
            } => write!(
                f,
                "nested {role} ring of ways {way_ids:?}, sibling candidates {candidates:?}"
            ),
            Diagnostic::UnfinishedRing {
                way_ids,
                candidates,
            } => write!(
                f,
                "ring of ways {way_ids:?} was never reached, possible containers {candidates:?}"
            ),
        }
    }
}

/// Collects the diagnostics of one relation.
#[derive(Debug)]
pub struct Diagnostics {
    relation_id: u64,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(relation_id: u64) -> Self {
        Self {
            relation_id,
            entries: Vec::new(),
        }
    }

    pub fn relation_id(&self) -> u64 {
        self.relation_id
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!("Relation {}: {}", self.relation_id, diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
