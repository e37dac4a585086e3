use crate::syntax::{BinaryOperator, Expr, UnaryOperator};

use super::{multiply_exprs, negate_term};

// ─── Rational normal form ───────────────────────────────────────────

/// Decompose an expression into `numerator / denominator`, combining all
/// embedded quotients over a common denominator. The denominator is
/// `Integer(1)` when the expression is quotient-free.
///
/// Used to clear denominators before polynomial solving: the roots of
/// `expr` are the roots of the numerator minus any point where the
/// denominator vanishes.
pub fn as_fraction(expr: &Expr) -> (Expr, Expr) {
  match expr {
    Expr::Rational(n, d) => (Expr::Integer(*n), Expr::Integer(*d)),

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      let (n, d) = as_fraction(operand);
      (negate_term(&n), d)
    }

    Expr::BinaryOp { op, left, right } => {
      let (ln, ld) = as_fraction(left);
      let (rn, rd) = as_fraction(right);
      match op {
        BinaryOperator::Plus | BinaryOperator::Minus => {
          if matches!(ld, Expr::Integer(1)) && matches!(rd, Expr::Integer(1)) {
            (Expr::binary(*op, ln, rn), Expr::Integer(1))
          } else {
            // a/b ± c/d = (a*d ± c*b) / (b*d)
            let num = Expr::binary(*op, multiply_exprs(&ln, &rd), multiply_exprs(&rn, &ld));
            (num, multiply_exprs(&ld, &rd))
          }
        }
        BinaryOperator::Times => (multiply_exprs(&ln, &rn), multiply_exprs(&ld, &rd)),
        BinaryOperator::Divide => (multiply_exprs(&ln, &rd), multiply_exprs(&ld, &rn)),
        BinaryOperator::Power => match right.as_ref() {
          Expr::Integer(0) => (Expr::Integer(1), Expr::Integer(1)),
          Expr::Integer(k) if *k > 0 => (raise(ln, *k), power_or_one(ld, *k)),
          Expr::Integer(k) => (power_or_one(ld, -*k), raise(ln, -*k)),
          _ => (expr.clone(), Expr::Integer(1)),
        },
      }
    }

    _ => (expr.clone(), Expr::Integer(1)),
  }
}

fn raise(base: Expr, exp: i128) -> Expr {
  if exp == 1 {
    base
  } else {
    Expr::binary(BinaryOperator::Power, base, Expr::Integer(exp))
  }
}

fn power_or_one(base: Expr, exp: i128) -> Expr {
  match base {
    Expr::Integer(1) => Expr::Integer(1),
    _ => raise(base, exp),
  }
}
