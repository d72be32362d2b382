//! Row-ordered batch evaluation
//!
//! The [`Evaluator`] owns a validated graph together with one buffer per
//! clause and drives the row pass: rows in ascending dependency order, the
//! active prefix of each row clause by clause, each clause dispatched over
//! its operand buffers into its own buffer. After the last row the root's
//! buffer holds f(x,y,z) for every slot in the batch.
//!
//! The intended calling convention is batch-then-evaluate: write many slots
//! with [`Evaluator::set_point`], run one [`Evaluator::eval_batch`], read
//! results by index. That amortizes the per-row traversal over the whole
//! batch, which is the point of the row layout.
//!
//! Author: Moroya Sakamoto

use crate::buffer::ValueBuffer;
use crate::dispatch::{run_scalar, run_wide};
use crate::graph::{Clause, ClauseId, Graph, GraphError, Row};
use crate::opcode::Opcode;
use glam::Vec3;

/// Numeric representation the row pass dispatches under
///
/// `Wide` processes eight slots per operation and is the default; the `wide`
/// crate lowers to scalar emulation on targets without the instructions, so
/// it is safe everywhere. `Scalar` is the portable one-slot-per-operation
/// path and is fully correct standalone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// One slot per operation
    Scalar,
    /// Eight slots per operation
    #[default]
    Wide,
}

/// Batched evaluator for an implicit function f(x, y, z)
///
/// Topology is fixed at construction; only buffer contents change across
/// calls. One instance is single-threaded; clone the [`Graph`] and build
/// one evaluator per thread for concurrent sampling.
pub struct Evaluator {
    clauses: Vec<Clause>,
    /// Operand arena indices resolved once at construction; the second
    /// falls back to the first so dispatch always indexes both.
    operands: Vec<(u32, u32)>,
    buffers: Vec<ValueBuffer>,
    rows: Vec<Row>,
    inputs: [ClauseId; 3],
    root: ClauseId,
    capacity: usize,
    backend: Backend,
}

impl Evaluator {
    /// Validate `graph` and allocate buffers for `capacity` slots
    ///
    /// Constant and variable buffers are seeded here. Uses the default
    /// [`Backend`].
    pub fn new(graph: Graph, capacity: usize) -> Result<Self, GraphError> {
        Self::with_backend(graph, capacity, Backend::default())
    }

    /// Like [`Evaluator::new`] with an explicit numeric representation
    pub fn with_backend(
        graph: Graph,
        capacity: usize,
        backend: Backend,
    ) -> Result<Self, GraphError> {
        if capacity == 0 {
            return Err(GraphError::ZeroCapacity);
        }
        graph.validate()?;

        let Graph {
            clauses,
            rows,
            inputs,
            root,
        } = graph;

        let operands = clauses
            .iter()
            .map(|c| {
                let a = c.a.map(|id| id.0).unwrap_or(0);
                let b = c.b.map(|id| id.0).unwrap_or(a);
                (a, b)
            })
            .collect();

        let mut buffers: Vec<ValueBuffer> =
            (0..clauses.len()).map(|_| ValueBuffer::new(capacity)).collect();
        for (clause, buf) in clauses.iter().zip(&mut buffers) {
            if matches!(clause.op, Opcode::Const | Opcode::Var) {
                buf.fill(clause.value);
            }
        }

        Ok(Evaluator {
            clauses,
            operands,
            buffers,
            rows: rows.into_iter().map(Row::new).collect(),
            inputs,
            root,
            capacity,
            backend,
        })
    }

    /// Maximum batch size
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Numeric representation selected at construction
    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The clause whose buffer holds the final output
    #[inline]
    pub fn root(&self) -> ClauseId {
        self.root
    }

    /// Number of dependency rows
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total clauses in `row`
    #[inline]
    pub fn row_len(&self, row: usize) -> usize {
        self.rows[row].len()
    }

    /// Clauses of `row` participating in the next pass
    #[inline]
    pub fn row_active(&self, row: usize) -> usize {
        self.rows[row].active()
    }

    /// Shrink or restore the active prefix of `row`
    ///
    /// Deactivation is an external pruning hook: a region-subdivision
    /// collaborator that knows a subgraph cannot influence the current
    /// region skips it here. Results of still-active clauses whose full
    /// ancestor chain remains active are unaffected.
    pub fn set_active(&mut self, row: usize, active: usize) {
        self.rows[row].set_active(active);
    }

    /// Restore every row to fully active
    pub fn reset_active(&mut self) {
        for row in &mut self.rows {
            let len = row.len();
            row.set_active(len);
        }
    }

    /// Write one coordinate triple into the X/Y/Z buffers at `slot`
    ///
    /// Performs no evaluation.
    #[inline]
    pub fn set_point(&mut self, p: Vec3, slot: usize) {
        assert!(
            slot < self.capacity,
            "slot {slot} out of range for capacity {}",
            self.capacity
        );
        let [x, y, z] = self.inputs;
        self.buffers[x.index()].set(slot, p.x);
        self.buffers[y.index()].set(slot, p.y);
        self.buffers[z.index()].set(slot, p.z);
    }

    /// Rewrite a `Var` clause's value across all slots
    ///
    /// Topology is untouched; the next pass sees the new value.
    pub fn set_var(&mut self, id: ClauseId, value: f32) {
        let clause = &mut self.clauses[id.index()];
        assert!(
            clause.op == Opcode::Var,
            "clause {} is {:?}, not Var",
            id.0,
            clause.op
        );
        clause.value = value;
        self.buffers[id.index()].fill(value);
    }

    /// Evaluate the field at a single point
    ///
    /// Writes slot 0, runs the row pass with count = 1, returns the root's
    /// slot 0. Convenience wrapper over the batch machinery.
    pub fn eval_point(&mut self, p: Vec3) -> f32 {
        self.set_point(p, 0);
        self.pass(1);
        self.buffers[self.root.index()].get(0)
    }

    /// Evaluate the field for slots [0, count) in one row pass
    ///
    /// Coordinates must have been written with [`Evaluator::set_point`]
    /// beforehand. Returns the root's first `count` values; the slice is
    /// valid until the next mutating call. Repeatable with varying
    /// `count` ≤ capacity; buffers are fully overwritten in range each call.
    pub fn eval_batch(&mut self, count: usize) -> &[f32] {
        assert!(
            count <= self.capacity,
            "count {count} exceeds capacity {}",
            self.capacity
        );
        self.pass(count);
        &self.buffers[self.root.index()].as_slice()[..count]
    }

    /// Value of any clause at `slot` after a pass
    pub fn value_of(&self, id: ClauseId, slot: usize) -> f32 {
        assert!(
            slot < self.capacity,
            "slot {slot} out of range for capacity {}",
            self.capacity
        );
        self.buffers[id.index()].get(slot)
    }

    /// One row pass over slots [0, count)
    fn pass(&mut self, count: usize) {
        for row in &self.rows {
            for &id in row.active_ids() {
                let idx = id.index();
                let op = self.clauses[idx].op;
                if op.is_structural() {
                    // Constants, variables, and inputs are populated
                    // externally, never derived from operands.
                    continue;
                }
                let (a_idx, b_idx) = self.operands[idx];
                // Operand indices are strictly smaller than idx (validated),
                // so the split cleanly separates reads from the write.
                let (prev, rest) = self.buffers.split_at_mut(idx);
                let out = &mut rest[0];
                let a = &prev[a_idx as usize];
                let b = &prev[b_idx as usize];
                match self.backend {
                    Backend::Scalar => run_scalar(op, a, b, out, count),
                    Backend::Wide => run_wide(op, a, b, out, count),
                }
            }
        }
    }
}
