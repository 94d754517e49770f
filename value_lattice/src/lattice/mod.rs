//! Abstract value lattice.
//!
//! # Module structure
//!
//! - `range`: bounded 64-bit integer intervals with overflow-aware arithmetic
//! - `value_set`: bounded sets of concrete values (`IntVal`, `StringVal`, ...)
//! - `fact`: the (value set, range) pair attached to an expression node
//! - `widening`: caps and widening bounds that keep fixed points finite

pub mod fact;
pub mod range;
pub mod value_set;
pub mod widening;

pub use fact::Fact;
pub use range::{OverflowMode, Range};
pub use value_set::{F64Key, ValueSet};
