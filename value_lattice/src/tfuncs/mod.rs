//! Operator implementations for concrete evaluation.
//!
//! Each registered function evaluates one operator on one combination of
//! concrete operand values, after the operands have been promoted to a common
//! [`OperandKind`]. The transfer function runs these over the cartesian
//! product of the operands' value sets.
//!
//! # Architecture
//!
//! - `registry`: `OperatorTable` keyed by operator and operand kind
//! - `arithmetic`: `+ - * / %`, unary minus and plus, for the numeric kinds
//! - `bitwise`: `& | ^ ~` and the shift operators for `int` and `long`
//! - `comparison`: relational and equality operators, boolean logic
//! - `strings`: string concatenation
//!
//! # Usage
//!
//! ```
//! use value_lattice::tfuncs::{register_all, OperatorTable};
//!
//! let mut table = OperatorTable::new();
//! register_all(&mut table);
//! ```

pub mod arithmetic;
pub mod bitwise;
pub mod comparison;
pub mod registry;
pub mod strings;

pub use registry::{OperandKind, OperatorFn, OperatorTable};

use crate::ir::{BinaryOp, UnaryOp};

/// An operator that can be evaluated on concrete operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Binary(op) => op.symbol(),
            Operator::Unary(op) => op.symbol(),
        }
    }
}

/// Registers every standard operator.
pub fn register_all(table: &mut OperatorTable) {
    register_arithmetic(table);
    register_bitwise(table);
    register_shift(table);
    register_comparison(table);
    register_boolean(table);
    register_string(table);
}

/// Registers `+ - * / %` and unary `+ -` for `int`, `long`, `float` and `double`.
pub fn register_arithmetic(table: &mut OperatorTable) {
    use arithmetic::*;
    macro_rules! numeric {
        ($table:ident, $kind:expr, $ty:ty) => {
            $table.register(Operator::Binary(BinaryOp::Add), $kind, add::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Sub), $kind, sub::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Mul), $kind, mul::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Div), $kind, div::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Rem), $kind, rem::<$ty>);
            $table.register(Operator::Unary(UnaryOp::Minus), $kind, neg::<$ty>);
            $table.register(Operator::Unary(UnaryOp::Plus), $kind, pos::<$ty>);
        };
    }
    numeric!(table, OperandKind::Int, i32);
    numeric!(table, OperandKind::Long, i64);
    numeric!(table, OperandKind::Float, f32);
    numeric!(table, OperandKind::Double, f64);
}

/// Registers `& | ^ ~` for `int` and `long`.
pub fn register_bitwise(table: &mut OperatorTable) {
    use bitwise::*;
    macro_rules! integral {
        ($table:ident, $kind:expr, $ty:ty) => {
            $table.register(Operator::Binary(BinaryOp::BitAnd), $kind, and::<$ty>);
            $table.register(Operator::Binary(BinaryOp::BitOr), $kind, or::<$ty>);
            $table.register(Operator::Binary(BinaryOp::BitXor), $kind, xor::<$ty>);
            $table.register(Operator::Unary(UnaryOp::BitNot), $kind, complement::<$ty>);
        };
    }
    integral!(table, OperandKind::Int, i32);
    integral!(table, OperandKind::Long, i64);
}

/// Registers `<< >> >>>` for `int` and `long` left operands.
pub fn register_shift(table: &mut OperatorTable) {
    use bitwise::*;
    macro_rules! integral {
        ($table:ident, $kind:expr, $ty:ty) => {
            $table.register(Operator::Binary(BinaryOp::Shl), $kind, shl::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Shr), $kind, shr::<$ty>);
            $table.register(Operator::Binary(BinaryOp::UShr), $kind, ushr::<$ty>);
        };
    }
    integral!(table, OperandKind::Int, i32);
    integral!(table, OperandKind::Long, i64);
}

/// Registers `< <= > >= == !=` for the numeric kinds.
pub fn register_comparison(table: &mut OperatorTable) {
    use comparison::*;
    macro_rules! numeric {
        ($table:ident, $kind:expr, $ty:ty) => {
            $table.register(Operator::Binary(BinaryOp::Lt), $kind, lt::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Le), $kind, le::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Gt), $kind, gt::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Ge), $kind, ge::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Eq), $kind, eq::<$ty>);
            $table.register(Operator::Binary(BinaryOp::Ne), $kind, ne::<$ty>);
        };
    }
    numeric!(table, OperandKind::Int, i32);
    numeric!(table, OperandKind::Long, i64);
    numeric!(table, OperandKind::Float, f32);
    numeric!(table, OperandKind::Double, f64);
}

/// Registers boolean `! && || & | ^ == !=`.
pub fn register_boolean(table: &mut OperatorTable) {
    use comparison::*;
    let kind = OperandKind::Boolean;
    table.register(Operator::Unary(UnaryOp::Not), kind, bool_not);
    table.register(Operator::Binary(BinaryOp::And), kind, bool_and);
    table.register(Operator::Binary(BinaryOp::BitAnd), kind, bool_and);
    table.register(Operator::Binary(BinaryOp::Or), kind, bool_or);
    table.register(Operator::Binary(BinaryOp::BitOr), kind, bool_or);
    table.register(Operator::Binary(BinaryOp::BitXor), kind, bool_xor);
    table.register(Operator::Binary(BinaryOp::Ne), kind, bool_xor);
    table.register(Operator::Binary(BinaryOp::Eq), kind, bool_eq);
}

/// Registers string concatenation.
pub fn register_string(table: &mut OperatorTable) {
    table.register(
        Operator::Binary(BinaryOp::Add),
        OperandKind::String,
        strings::concat,
    );
}
