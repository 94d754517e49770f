//! Value and range analysis for a typed, Java-like expression language.
//!
//! Every expression node gets a [`Fact`](lattice::Fact): a bounded set of the
//! concrete values it may take and, for integral kinds, an interval bounding
//! it. Facts are computed by a forward analysis that evaluates operators and
//! library methods on concrete values wherever the operands are enumerable,
//! and falls back to overflow-aware interval arithmetic elsewhere.

// Library code reports through the diagnostics collector, never stderr.
#![deny(clippy::print_stderr)]

// Core lattice
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod kind;
pub mod lattice;

// Concrete evaluation
pub mod const_prop;
pub mod evaluator;
pub mod tfuncs;

// Analysis over the statement IR
pub mod abstract_interp;
pub mod ir;

pub use abstract_interp::{AnalysisResult, FactEnv, ForwardAnalysis, NodeFacts, ValueTransfer};
pub use config::{AnalysisConfig, ConfigError};
pub use const_prop::ConcreteValue;
pub use error::ValueError;
pub use kind::{PrimitiveKind, ValueKind};
pub use lattice::{Fact, OverflowMode, Range, ValueSet};
