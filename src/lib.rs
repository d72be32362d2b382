//! # fieldvm
//!
//! Row-scheduled batch evaluator for implicit scalar fields f(x, y, z).
//!
//! A field is a DAG of scalar arithmetic clauses, pre-partitioned into
//! dependency rows by an upstream builder. Because every clause's operands
//! live in earlier rows, a whole batch of sample points flows through the
//! graph in one ordered pass: the schedule is computed once and reused for
//! every batch, which is what makes dense spatial sampling cheap.
//!
//! Every clause opcode executes under two interchangeable numeric
//! representations over the same buffers: a portable scalar path and an
//! 8-wide SIMD path (`wide::f32x8`). The wide path is a throughput
//! optimization only; both produce bit-identical results for finite inputs.
//!
//! ## Example
//!
//! ```rust
//! use fieldvm::prelude::*;
//!
//! // f(x, y, z) = sqrt(x*x + y*y)
//! let clauses = vec![
//!     Clause::input(Opcode::X),
//!     Clause::input(Opcode::Y),
//!     Clause::input(Opcode::Z),
//!     Clause::binary(Opcode::Mul, ClauseId(0), ClauseId(0)),
//!     Clause::binary(Opcode::Mul, ClauseId(1), ClauseId(1)),
//!     Clause::binary(Opcode::Add, ClauseId(3), ClauseId(4)),
//!     Clause::unary(Opcode::Sqrt, ClauseId(5)),
//! ];
//! let graph = Graph {
//!     clauses,
//!     rows: vec![
//!         vec![ClauseId(0), ClauseId(1), ClauseId(2)],
//!         vec![ClauseId(3), ClauseId(4)],
//!         vec![ClauseId(5)],
//!         vec![ClauseId(6)],
//!     ],
//!     inputs: [ClauseId(0), ClauseId(1), ClauseId(2)],
//!     root: ClauseId(6),
//! };
//!
//! let mut vm = Evaluator::new(graph, 256).unwrap();
//!
//! // Single point
//! assert_eq!(vm.eval_point(Vec3::new(3.0, 4.0, 0.0)), 5.0);
//!
//! // Batch: write slots, one pass, indexed reads
//! vm.set_point(Vec3::new(3.0, 4.0, 0.0), 0);
//! vm.set_point(Vec3::new(1.0, 0.0, 0.0), 1);
//! assert_eq!(vm.eval_batch(2), &[5.0, 1.0]);
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod buffer;
pub mod dispatch;
pub mod evaluator;
pub mod graph;
pub mod opcode;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::buffer::{ValueBuffer, LANES};
    pub use crate::dispatch::{apply, run_scalar, run_wide, Value};
    pub use crate::evaluator::{Backend, Evaluator};
    pub use crate::graph::{Clause, ClauseId, Graph, GraphError, Row};
    pub use crate::opcode::Opcode;
    pub use glam::Vec3;
}

// Re-exports for convenience
pub use evaluator::{Backend, Evaluator};
pub use graph::{Clause, ClauseId, Graph, GraphError};
pub use opcode::Opcode;
