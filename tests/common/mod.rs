//! Common test helpers for fieldvm integration tests
//!
//! Author: Moroya Sakamoto

use fieldvm::prelude::*;

// ============================================================================
// Graph assembly
// ============================================================================

/// Incremental DAG assembler standing in for the upstream graph builder
///
/// Tracks a row depth per clause (structural clauses at 0, everything else
/// at 1 + max of its operands) and buckets the arena into rows at the end.
pub struct Assembler {
    clauses: Vec<Clause>,
    depth: Vec<usize>,
}

#[allow(dead_code)]
impl Assembler {
    /// Fresh assembler with the X, Y, Z inputs already pushed
    pub fn new() -> (Self, ClauseId, ClauseId, ClauseId) {
        let mut asm = Assembler {
            clauses: Vec::new(),
            depth: Vec::new(),
        };
        let x = asm.push(Clause::input(Opcode::X), 0);
        let y = asm.push(Clause::input(Opcode::Y), 0);
        let z = asm.push(Clause::input(Opcode::Z), 0);
        (asm, x, y, z)
    }

    fn push(&mut self, clause: Clause, depth: usize) -> ClauseId {
        let id = ClauseId(self.clauses.len() as u32);
        self.clauses.push(clause);
        self.depth.push(depth);
        id
    }

    pub fn constant(&mut self, value: f32) -> ClauseId {
        self.push(Clause::constant(value), 0)
    }

    pub fn var(&mut self, value: f32) -> ClauseId {
        self.push(Clause::var(value), 0)
    }

    pub fn unary(&mut self, op: Opcode, a: ClauseId) -> ClauseId {
        let depth = self.depth[a.index()] + 1;
        self.push(Clause::unary(op, a), depth)
    }

    pub fn binary(&mut self, op: Opcode, a: ClauseId, b: ClauseId) -> ClauseId {
        let depth = self.depth[a.index()].max(self.depth[b.index()]) + 1;
        self.push(Clause::binary(op, a, b), depth)
    }

    /// Bucket clauses into rows by depth and hand the DAG over
    pub fn finish(self, root: ClauseId) -> Graph {
        let max_depth = self.depth.iter().copied().max().unwrap_or(0);
        assert_eq!(
            self.depth[root.index()],
            max_depth,
            "root must land in the last row"
        );
        let mut rows = vec![Vec::new(); max_depth + 1];
        for (i, &d) in self.depth.iter().enumerate() {
            rows[d].push(ClauseId(i as u32));
        }
        Graph {
            clauses: self.clauses,
            rows,
            inputs: [ClauseId(0), ClauseId(1), ClauseId(2)],
            root,
        }
    }
}

// ============================================================================
// Standard test graphs
// ============================================================================

/// root = op(const a, const b)
#[allow(dead_code)]
pub fn const_binary_graph(op: Opcode, a: f32, b: f32) -> Graph {
    let (mut asm, _, _, _) = Assembler::new();
    let ca = asm.constant(a);
    let cb = asm.constant(b);
    let root = asm.binary(op, ca, cb);
    asm.finish(root)
}

/// root = op(const a)
#[allow(dead_code)]
pub fn const_unary_graph(op: Opcode, a: f32) -> Graph {
    let (mut asm, _, _, _) = Assembler::new();
    let ca = asm.constant(a);
    let root = asm.unary(op, ca);
    asm.finish(root)
}

/// Euclidean distance from the origin: sqrt(x*x + y*y + z*z)
#[allow(dead_code)]
pub fn distance_graph() -> Graph {
    let (mut asm, x, y, z) = Assembler::new();
    let xx = asm.binary(Opcode::Mul, x, x);
    let yy = asm.binary(Opcode::Mul, y, y);
    let zz = asm.binary(Opcode::Mul, z, z);
    let xy = asm.binary(Opcode::Add, xx, yy);
    let sum = asm.binary(Opcode::Add, xy, zz);
    let root = asm.unary(Opcode::Sqrt, sum);
    asm.finish(root)
}

// ============================================================================
// Standard test points
// ============================================================================

/// Deterministic scattered points covering sign changes and magnitudes
#[allow(dead_code)]
pub fn test_points(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32;
            Vec3::new(
                (t * 0.37).sin() * 4.0,
                (t * 0.61).cos() * 3.0 - 1.0,
                t * 0.113 - 2.5,
            )
        })
        .collect()
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two f32 values are close within tolerance
#[allow(dead_code)]
pub fn assert_close(a: f32, b: f32, tol: f32, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).abs(),
        tol
    );
}

/// Assert two f32 values are bit-identical
#[allow(dead_code)]
pub fn assert_bits_eq(a: f32, b: f32, msg: &str) {
    assert!(
        a.to_bits() == b.to_bits(),
        "{}: {} ({:#010x}) vs {} ({:#010x})",
        msg,
        a,
        a.to_bits(),
        b,
        b.to_bits()
    );
}
