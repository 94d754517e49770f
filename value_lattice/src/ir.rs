//! Host-independent expression and statement model.
//!
//! The value engine does not own a parser. A host (compiler plugin, test,
//! tool) lowers its own syntax tree into these nodes, giving every expression
//! a [`NodeId`] and a static [`ValueKind`]. Facts computed by the analysis are
//! reported back keyed by `NodeId`.

use crate::const_prop::ConcreteValue;
use crate::kind::{PrimitiveKind, ValueKind};
use crate::lattice::Fact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,  // >> (sign-propagating)
    UShr, // >>> (zero-filling)
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And, // && (short-circuit)
    Or,  // || (short-circuit)
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// The comparison with its operands swapped: `a < b` is `b > a`.
    pub fn flipped(self) -> BinaryOp {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }

    /// The comparison that holds exactly when this one does not.
    pub fn negated(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::Lt => BinaryOp::Ge,
            BinaryOp::Le => BinaryOp::Gt,
            BinaryOp::Gt => BinaryOp::Le,
            BinaryOp::Ge => BinaryOp::Lt,
            BinaryOp::Eq => BinaryOp::Ne,
            BinaryOp::Ne => BinaryOp::Eq,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}

/// Prefix and postfix increment and decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncDec {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl IncDec {
    pub fn is_postfix(self) -> bool {
        matches!(self, IncDec::PostInc | IncDec::PostDec)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, IncDec::PreInc | IncDec::PostInc)
    }
}

/// A library method the evaluator may run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    /// Declaring type, e.g. `String` or `Math`.
    pub owner: String,
    pub name: String,
    pub is_static: bool,
}

impl MethodId {
    pub fn instance(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            is_static: false,
        }
    }

    pub fn static_method(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            is_static: true,
        }
    }

    /// `String.length()`.
    pub fn is_string_length(&self) -> bool {
        !self.is_static && self.owner == "String" && self.name == "length"
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    /// Static kind of the expression's value.
    pub ty: ValueKind,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(ConcreteValue),
    Var(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ... on a local variable.
    Increment {
        var: String,
        op: IncDec,
    },
    /// Explicit cast to the node's own `ty`.
    Cast(Box<Expr>),
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        method: MethodId,
        receiver: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    /// `new T[length]`
    NewArray(Box<Expr>),
    /// `array.length`
    ArrayLength(Box<Expr>),
}

impl Expr {
    /// Name of the variable this expression reads, if it is a plain variable.
    pub fn as_var(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Visit this node and all sub-expressions, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::Increment { .. } => {}
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            ExprKind::Unary { operand, .. } => operand.walk(visit),
            ExprKind::Cast(inner) | ExprKind::NewArray(inner) | ExprKind::ArrayLength(inner) => {
                inner.walk(visit)
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                cond.walk(visit);
                then.walk(visit);
                otherwise.walk(visit);
            }
            ExprKind::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    receiver.walk(visit);
                }
                for arg in args {
                    arg.walk(visit);
                }
            }
        }
    }
}

/// Block of statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Local declaration with an optional initializer.
    Let {
        var: String,
        ty: ValueKind,
        init: Option<Expr>,
    },
    /// Local declaration carrying an explicit fact (an annotated parameter
    /// or field read).
    Declare { var: String, ty: ValueKind, fact: Fact },
    Assign {
        var: String,
        value: Expr,
    },
    Expr(Expr),
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Block(Block),
}

/// Allocates node ids and infers static kinds while building expressions.
#[derive(Debug, Default)]
pub struct ExprBuilder {
    next_id: u32,
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, ty: ValueKind, kind: ExprKind) -> Expr {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Expr { id, ty, kind }
    }

    pub fn lit(&mut self, value: ConcreteValue) -> Expr {
        self.node(value.kind(), ExprKind::Literal(value))
    }

    pub fn int(&mut self, value: i32) -> Expr {
        self.lit(ConcreteValue::Int(value))
    }

    pub fn long(&mut self, value: i64) -> Expr {
        self.lit(ConcreteValue::Long(value))
    }

    pub fn double(&mut self, value: f64) -> Expr {
        self.lit(ConcreteValue::Double(value))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.lit(ConcreteValue::Boolean(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.lit(ConcreteValue::Str(value.to_string()))
    }

    pub fn var(&mut self, name: &str, ty: ValueKind) -> Expr {
        self.node(ty, ExprKind::Var(name.to_string()))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let ty = ValueKind::binary_result(op, &lhs.ty, &rhs.ty);
        self.node(
            ty,
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        let ty = match (op, operand.ty.primitive()) {
            (UnaryOp::Not, _) => ValueKind::BOOLEAN,
            (_, Some(p)) if p.is_numeric() => ValueKind::Primitive(p.unary_promote()),
            _ => operand.ty.clone(),
        };
        self.node(
            ty,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    pub fn increment(&mut self, var: &str, ty: ValueKind, op: IncDec) -> Expr {
        self.node(
            ty,
            ExprKind::Increment {
                var: var.to_string(),
                op,
            },
        )
    }

    pub fn cast(&mut self, ty: ValueKind, operand: Expr) -> Expr {
        self.node(ty, ExprKind::Cast(Box::new(operand)))
    }

    pub fn conditional(&mut self, cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        let ty = match (then.ty.primitive(), otherwise.ty.primitive()) {
            (Some(a), Some(b)) if a.is_numeric() && b.is_numeric() && a != b => {
                ValueKind::Primitive(a.promote(b))
            }
            _ => then.ty.clone(),
        };
        self.node(
            ty,
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        )
    }

    pub fn call(
        &mut self,
        method: MethodId,
        receiver: Option<Expr>,
        args: Vec<Expr>,
        ty: ValueKind,
    ) -> Expr {
        self.node(
            ty,
            ExprKind::Call {
                method,
                receiver: receiver.map(Box::new),
                args,
            },
        )
    }

    pub fn new_array(&mut self, length: Expr) -> Expr {
        self.node(ValueKind::Array, ExprKind::NewArray(Box::new(length)))
    }

    pub fn array_length(&mut self, array: Expr) -> Expr {
        self.node(
            ValueKind::Primitive(PrimitiveKind::Int),
            ExprKind::ArrayLength(Box::new(array)),
        )
    }
}
