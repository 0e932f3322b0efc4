//! Expression DSL consumed by the tracer (spec §3 "Expression tree", §9
//! Design Notes).
//!
//! The original front end intercepts Python operator overloads and
//! arbitrary attribute access on a dynamic `Tracer` object. Rust has no
//! equivalent to attribute interception, so per spec §9 Design Notes this
//! is replaced with an explicit tagged sum (`Expr`) built through ordinary
//! `std::ops` trait impls on a thin `Traced` wrapper that carries a `Kind`
//! alongside the tree.

use crate::kind::{Kind, Literal};
use std::ops::{Add, Not, Sub};
use std::rc::Rc;

/// A binary operator recorded in the expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Add,
    Sub,
    StrCat,
}

/// An expression tree node (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Lit(Literal),
    Lookup(String),
    IndirectLookup(Rc<Expr>),
    BinOp(BinOp, Rc<Expr>, Rc<Expr>),
    Not(Rc<Expr>),
    Mod2(Rc<Expr>),
    IsAny(Rc<Expr>, Vec<String>),
    Fen(Rc<Expr>),
}

/// A traced expression: an `Expr` node paired with its inferred `Kind`.
///
/// This is the Rust analogue of the Python `Tracer` value object — building
/// one never touches the call tree; only `VarTracer::branch` (the `.ite()`
/// call site in the original) and `VarTracer`'s subscript operators do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traced {
    pub expr: Rc<Expr>,
    pub kind: Kind,
}

impl Traced {
    pub fn new(expr: Expr, kind: Kind) -> Self {
        Traced { expr: Rc::new(expr), kind }
    }

    pub fn int(v: u32) -> Self {
        Traced::new(Expr::Lit(Literal::Int(v)), Kind::Int)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Traced::new(Expr::Lit(Literal::Str(s.into())), Kind::Str)
    }

    pub fn boolean(b: bool) -> Self {
        Traced::new(Expr::Lit(Literal::Bool(b)), Kind::Bool)
    }

    fn bin(op: BinOp, kind: Kind, l: &Traced, r: &Traced) -> Traced {
        Traced::new(Expr::BinOp(op, l.expr.clone(), r.expr.clone()), kind)
    }

    pub fn eq(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Eq, Kind::Bool, self, other)
    }

    pub fn ne(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Neq, Kind::Bool, self, other)
    }

    pub fn lt(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Lt, Kind::Bool, self, other)
    }

    pub fn gt(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Gt, Kind::Bool, self, other)
    }

    pub fn le(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Le, Kind::Bool, self, other)
    }

    pub fn ge(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Ge, Kind::Bool, self, other)
    }

    pub fn and(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::And, Kind::Bool, self, other)
    }

    pub fn or(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::Or, Kind::Bool, self, other)
    }

    pub fn strcat(&self, other: &Traced) -> Traced {
        Traced::bin(BinOp::StrCat, Kind::Str, self, other)
    }

    pub fn mod2(&self) -> Traced {
        Traced::new(Expr::Mod2(self.expr.clone()), Kind::Bool)
    }

    pub fn isany(&self, options: &[&str]) -> Traced {
        Traced::new(
            Expr::IsAny(self.expr.clone(), options.iter().map(|s| s.to_string()).collect()),
            Kind::Bool,
        )
    }

    pub fn fen(&self) -> Traced {
        Traced::new(Expr::Fen(self.expr.clone()), Kind::Str)
    }
}

impl Add for &Traced {
    type Output = Traced;

    /// Mirrors `Tracer.__add__`: string-kinded operands concatenate,
    /// everything else is integer addition.
    fn add(self, rhs: &Traced) -> Traced {
        if self.kind == Kind::Str {
            self.strcat(rhs)
        } else {
            Traced::bin(BinOp::Add, Kind::Int, self, rhs)
        }
    }
}

impl Sub for &Traced {
    type Output = Traced;

    fn sub(self, rhs: &Traced) -> Traced {
        Traced::bin(BinOp::Sub, Kind::Int, self, rhs)
    }
}

impl Not for &Traced {
    type Output = Traced;

    fn not(self) -> Traced {
        Traced::new(Expr::Not(self.expr.clone()), Kind::Bool)
    }
}
