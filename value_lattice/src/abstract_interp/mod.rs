//! Forward value analysis over the statement IR.
//!
//! The transfer function computes a [`Fact`](crate::lattice::Fact) for every
//! expression node from the facts of its operands; the engine drives it over
//! statements, splitting environments at conditions and iterating loops to a
//! fixed point.
//!
//! # Module structure
//!
//! - `env`: per-variable facts at a program point
//! - `transfer`: the per-node transfer function and the node fact table
//! - `conditional`: branch refinement of comparisons and boolean conditions
//! - `engine`: statement traversal with widening at loop heads
//!
//! # Usage
//!
//! ```
//! use value_lattice::abstract_interp::ForwardAnalysis;
//! use value_lattice::config::AnalysisConfig;
//! use value_lattice::ir::{BinaryOp, Block, ExprBuilder, Stmt};
//! use value_lattice::kind::ValueKind;
//!
//! let mut b = ExprBuilder::new();
//! let (one, two) = (b.int(1), b.int(2));
//! let sum = b.binary(BinaryOp::Add, one, two);
//! let program = Block::new(vec![Stmt::Let {
//!     var: "x".to_string(),
//!     ty: ValueKind::INT,
//!     init: Some(sum),
//! }]);
//!
//! let analysis = ForwardAnalysis::new(AnalysisConfig::default());
//! let result = analysis.analyze(&program);
//! assert_eq!(result.env.get("x").map(ToString::to_string), Some("IntVal(3)".to_string()));
//! ```

pub mod conditional;
pub mod engine;
pub mod env;
pub mod transfer;

pub use conditional::{split_env_by_condition, SplitEnv};
pub use engine::{AnalysisResult, ForwardAnalysis};
pub use env::FactEnv;
pub use transfer::{NodeFacts, ValueTransfer};
