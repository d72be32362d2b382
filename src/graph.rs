//! Clause arena, row partition, and construction-time validation
//!
//! A [`Graph`] is the plain-data description of an already-built DAG: a flat
//! arena of clauses, a partition of the arena into dependency rows, the three
//! coordinate-input clauses, and the root. Operands are arena indices, not
//! references, so the structure carries no lifetimes and no cycles.
//!
//! The graph is built and optimized upstream; this module only checks the
//! invariants evaluation relies on, once, before any buffer is allocated.
//!
//! Author: Moroya Sakamoto

use crate::opcode::Opcode;
use thiserror::Error;

/// Index of a clause in the arena
///
/// Identity is positional: the clause pushed n-th has id n. Operand ids are
/// always strictly smaller than the id of the clause using them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClauseId(pub u32);

impl ClauseId {
    /// Arena index as usize
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One DAG node: an opcode plus up to two operand references
///
/// `value` seeds the clause's buffer for `Const` and `Var` clauses and is
/// ignored for every other opcode.
#[derive(Clone, Copy, Debug)]
pub struct Clause {
    /// Operation this clause computes (or structural role)
    pub op: Opcode,
    /// First operand, absent on structural clauses
    pub a: Option<ClauseId>,
    /// Second operand, absent below arity 2
    pub b: Option<ClauseId>,
    /// Seed value for `Const` / `Var` clauses
    pub value: f32,
}

impl Clause {
    /// Immutable constant clause
    pub fn constant(value: f32) -> Self {
        Clause {
            op: Opcode::Const,
            a: None,
            b: None,
            value,
        }
    }

    /// Mutable variable clause with an initial value
    pub fn var(value: f32) -> Self {
        Clause {
            op: Opcode::Var,
            a: None,
            b: None,
            value,
        }
    }

    /// Coordinate input clause (`X`, `Y`, or `Z`)
    pub fn input(op: Opcode) -> Self {
        assert!(
            matches!(op, Opcode::X | Opcode::Y | Opcode::Z),
            "{op:?} is not a coordinate input"
        );
        Clause {
            op,
            a: None,
            b: None,
            value: 0.0,
        }
    }

    /// Single-operand clause
    pub fn unary(op: Opcode, a: ClauseId) -> Self {
        assert_eq!(op.arity(), 1, "{op:?} is not unary");
        Clause {
            op,
            a: Some(a),
            b: None,
            value: 0.0,
        }
    }

    /// Two-operand clause (including pass-throughs)
    pub fn binary(op: Opcode, a: ClauseId, b: ClauseId) -> Self {
        assert_eq!(op.arity(), 2, "{op:?} is not binary");
        Clause {
            op,
            a: Some(a),
            b: Some(b),
            value: 0.0,
        }
    }

    /// Number of operand references present
    #[inline]
    pub fn operand_count(&self) -> usize {
        self.a.is_some() as usize + self.b.is_some() as usize
    }
}

/// An ordered group of clauses with no dependencies among themselves
///
/// Only the first `active` clauses participate in a pass. An external
/// pruning collaborator may shrink the active prefix to skip subgraphs that
/// are irrelevant for the current spatial region.
#[derive(Debug, Clone)]
pub struct Row {
    clauses: Vec<ClauseId>,
    active: usize,
}

impl Row {
    pub(crate) fn new(clauses: Vec<ClauseId>) -> Self {
        let active = clauses.len();
        Row { clauses, active }
    }

    /// Total number of clauses in this row
    #[inline]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True if the row holds no clauses
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of clauses participating in the next pass
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Shrink or restore the active prefix
    pub fn set_active(&mut self, active: usize) {
        assert!(
            active <= self.clauses.len(),
            "active count {active} exceeds row length {}",
            self.clauses.len()
        );
        self.active = active;
    }

    /// The participating prefix
    #[inline]
    pub(crate) fn active_ids(&self) -> &[ClauseId] {
        &self.clauses[..self.active]
    }
}

/// Plain-data DAG description handed to the evaluator
///
/// Built once upstream (deduplication, constant folding, and row
/// partitioning happen there); immutable after validation.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Clause arena in topological order
    pub clauses: Vec<Clause>,
    /// Row partition of the arena, in dependency order
    pub rows: Vec<Vec<ClauseId>>,
    /// The X, Y, Z input clauses, in that order
    pub inputs: [ClauseId; 3],
    /// The clause whose buffer holds the final output
    pub root: ClauseId,
}

/// Rejected graph shapes
///
/// Every variant is a defect in the upstream builder, reported before any
/// evaluation state exists.
#[derive(Error, Debug)]
pub enum GraphError {
    /// No clauses at all
    #[error("graph has no clauses")]
    EmptyGraph,

    /// No rows at all
    #[error("graph has no rows")]
    EmptyRows,

    /// Batch capacity of zero requested
    #[error("batch capacity must be non-zero")]
    ZeroCapacity,

    /// A row or designated clause points outside the arena
    #[error("clause id {clause} is outside the arena")]
    UnknownClause {
        /// The out-of-range id
        clause: u32,
    },

    /// A clause listed in more than one row
    #[error("clause {clause} appears in more than one row")]
    DuplicateClause {
        /// The doubly-listed clause
        clause: u32,
    },

    /// A clause missing from the row partition
    #[error("clause {clause} is not assigned to any row")]
    UnrowedClause {
        /// The unlisted clause
        clause: u32,
    },

    /// `Invalid` or `End` in the arena
    #[error("sentinel opcode {op:?} on clause {clause}")]
    SentinelOpcode {
        /// The offending clause
        clause: u32,
        /// Its sentinel opcode
        op: Opcode,
    },

    /// Operand count does not match the opcode's arity
    #[error("clause {clause} has {found} operands, {op:?} takes {expected}")]
    OperandArity {
        /// The offending clause
        clause: u32,
        /// Its opcode
        op: Opcode,
        /// Operands the opcode takes
        expected: usize,
        /// Operands actually present
        found: usize,
    },

    /// Constant, variable, or input clause outside row 0
    #[error("structural clause {clause} must live in row 0")]
    StructuralRow {
        /// The misplaced clause
        clause: u32,
    },

    /// Operand in the same or a later row
    #[error("clause {clause} depends on clause {operand} in the same or a later row")]
    RowOrder {
        /// The dependent clause
        clause: u32,
        /// Its out-of-order operand
        operand: u32,
    },

    /// Operand with a same-or-higher arena index
    #[error("clause {clause} references operand {operand} at a same-or-higher arena index")]
    OperandOrder {
        /// The dependent clause
        clause: u32,
        /// Its out-of-order operand
        operand: u32,
    },

    /// Root clause not in the last row
    #[error("root clause {root} is not in the last row")]
    RootPlacement {
        /// The designated root
        root: u32,
    },

    /// Designated input clause with the wrong opcode
    #[error("input clause {clause} carries {found:?}, expected {expected:?}")]
    InputOpcode {
        /// The designated clause
        clause: u32,
        /// The coordinate opcode it should carry
        expected: Opcode,
        /// The opcode it actually carries
        found: Opcode,
    },
}

impl Graph {
    /// Check every invariant evaluation relies on
    ///
    /// Returns the row index of each clause on success.
    pub fn validate(&self) -> Result<Vec<usize>, GraphError> {
        if self.clauses.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        if self.rows.is_empty() {
            return Err(GraphError::EmptyRows);
        }

        let n = self.clauses.len();
        const UNASSIGNED: usize = usize::MAX;
        let mut row_of = vec![UNASSIGNED; n];

        for (r, row) in self.rows.iter().enumerate() {
            for &id in row {
                let idx = id.index();
                if idx >= n {
                    return Err(GraphError::UnknownClause { clause: id.0 });
                }
                if row_of[idx] != UNASSIGNED {
                    return Err(GraphError::DuplicateClause { clause: id.0 });
                }
                row_of[idx] = r;
            }
        }
        if let Some(idx) = row_of.iter().position(|&r| r == UNASSIGNED) {
            return Err(GraphError::UnrowedClause { clause: idx as u32 });
        }

        for (idx, clause) in self.clauses.iter().enumerate() {
            let id = idx as u32;
            if clause.op.is_sentinel() {
                return Err(GraphError::SentinelOpcode {
                    clause: id,
                    op: clause.op,
                });
            }
            let expected = clause.op.arity();
            let found = clause.operand_count();
            if found != expected {
                return Err(GraphError::OperandArity {
                    clause: id,
                    op: clause.op,
                    expected,
                    found,
                });
            }
            if clause.op.is_structural() && row_of[idx] != 0 {
                return Err(GraphError::StructuralRow { clause: id });
            }
            for operand in [clause.a, clause.b].into_iter().flatten() {
                if operand.index() >= n {
                    return Err(GraphError::UnknownClause { clause: operand.0 });
                }
                if operand.index() >= idx {
                    return Err(GraphError::OperandOrder {
                        clause: id,
                        operand: operand.0,
                    });
                }
                if row_of[operand.index()] >= row_of[idx] {
                    return Err(GraphError::RowOrder {
                        clause: id,
                        operand: operand.0,
                    });
                }
            }
        }

        if self.root.index() >= n {
            return Err(GraphError::UnknownClause { clause: self.root.0 });
        }
        if row_of[self.root.index()] != self.rows.len() - 1 {
            return Err(GraphError::RootPlacement { root: self.root.0 });
        }

        for (&id, expected) in self.inputs.iter().zip([Opcode::X, Opcode::Y, Opcode::Z]) {
            if id.index() >= n {
                return Err(GraphError::UnknownClause { clause: id.0 });
            }
            let found = self.clauses[id.index()].op;
            if found != expected {
                return Err(GraphError::InputOpcode {
                    clause: id.0,
                    expected,
                    found,
                });
            }
        }

        Ok(row_of)
    }
}
