use crate::calculus::is_constant_wrt;
use crate::numeric::{as_number, num_to_expr};
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};

// ─── Terms and coefficients ─────────────────────────────────────────

/// Collect all additive terms from an expression (flattening sums).
pub fn collect_additive_terms(expr: &Expr) -> Vec<Expr> {
  match expr {
    Expr::BinaryOp {
      op: BinaryOperator::Plus,
      left,
      right,
    } => {
      let mut terms = collect_additive_terms(left);
      terms.extend(collect_additive_terms(right));
      terms
    }
    Expr::BinaryOp {
      op: BinaryOperator::Minus,
      left,
      right,
    } => {
      let mut terms = collect_additive_terms(left);
      for t in collect_additive_terms(right) {
        terms.push(Expr::negate(t));
      }
      terms
    }
    _ => vec![expr.clone()],
  }
}

/// From a single term, extract the coefficient of `var^power`.
pub fn extract_coefficient_of_power(term: &Expr, var: &str, power: i128) -> Option<Expr> {
  let (term_power, coeff) = term_var_power_and_coeff(term, var);
  if term_power == power { Some(coeff) } else { None }
}

/// Decompose a multiplicative term into (power_of_var, coefficient).
/// E.g. `3*x^2` → `(2, 3)`; `a*x` → `(1, a)`; `5` → `(0, 5)`.
/// A power of `-1` is a sentinel for "not a monomial in var".
pub fn term_var_power_and_coeff(term: &Expr, var: &str) -> (i128, Expr) {
  match term {
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => {
      (0, term.clone())
    }
    Expr::Identifier(name) => {
      if name == var {
        (1, Expr::Integer(1))
      } else {
        (0, term.clone())
      }
    }
    Expr::BinaryOp {
      op: BinaryOperator::Power,
      left,
      right,
    } => {
      if let (Expr::Identifier(name), Expr::Integer(n)) = (left.as_ref(), right.as_ref()) {
        if name == var {
          return (*n, Expr::Integer(1));
        }
      }
      if is_constant_wrt(term, var) {
        (0, term.clone())
      } else {
        (-1, term.clone())
      }
    }
    Expr::BinaryOp {
      op: BinaryOperator::Times,
      left,
      right,
    } => {
      let (lp, lc) = term_var_power_and_coeff(left, var);
      let (rp, rc) = term_var_power_and_coeff(right, var);
      if lp < 0 || rp < 0 {
        return (-1, term.clone());
      }
      (lp + rp, multiply_exprs(&lc, &rc))
    }
    Expr::BinaryOp {
      op: BinaryOperator::Divide,
      left,
      right,
    } => {
      // Constant denominators divide into the coefficient.
      if is_constant_wrt(right, var) {
        let (p, c) = term_var_power_and_coeff(left, var);
        if p < 0 {
          return (-1, term.clone());
        }
        let coeff = match (as_number(&c), as_number(right)) {
          (Some(cn), Some(dn)) => match cn.checked_div(dn) {
            Some(q) => num_to_expr(q),
            None => Expr::binary(BinaryOperator::Divide, c, (**right).clone()),
          },
          _ => Expr::binary(BinaryOperator::Divide, c, (**right).clone()),
        };
        (p, coeff)
      } else {
        (-1, term.clone())
      }
    }
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      let (p, c) = term_var_power_and_coeff(operand, var);
      if p < 0 {
        return (-1, term.clone());
      }
      (p, negate_coeff(c))
    }
    _ => {
      if is_constant_wrt(term, var) {
        (0, term.clone())
      } else {
        (-1, term.clone())
      }
    }
  }
}

fn negate_coeff(c: Expr) -> Expr {
  match as_number(&c) {
    Some(n) => num_to_expr(-n),
    None => Expr::negate(c),
  }
}

/// Find the maximum power of `var` in `expr`. `None` for non-polynomial
/// forms (negative or symbolic exponents, `var` inside a function call).
pub fn max_power(expr: &Expr, var: &str) -> Option<i128> {
  match expr {
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => Some(0),
    Expr::Identifier(name) => {
      if name == var {
        Some(1)
      } else {
        Some(0)
      }
    }
    Expr::BinaryOp { op, left, right } => match op {
      BinaryOperator::Plus | BinaryOperator::Minus => {
        let l = max_power(left, var)?;
        let r = max_power(right, var)?;
        Some(l.max(r))
      }
      BinaryOperator::Times => {
        let l = max_power(left, var)?;
        let r = max_power(right, var)?;
        Some(l + r)
      }
      BinaryOperator::Power => {
        if is_constant_wrt(left, var) {
          Some(0)
        } else if let Expr::Integer(n) = right.as_ref() {
          if *n < 0 {
            return None;
          }
          let base_pow = max_power(left, var)?;
          Some(base_pow * n)
        } else {
          None
        }
      }
      BinaryOperator::Divide => {
        if is_constant_wrt(right, var) {
          max_power(left, var)
        } else {
          None
        }
      }
    },
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => max_power(operand, var),
    Expr::FunctionCall { .. } => {
      if is_constant_wrt(expr, var) {
        Some(0)
      } else {
        None
      }
    }
  }
}

/// Find the minimum power of `var` in `expr`.
pub fn min_power(expr: &Expr, var: &str) -> Option<i128> {
  match expr {
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => Some(0),
    Expr::Identifier(name) => {
      if name == var {
        Some(1)
      } else {
        Some(0)
      }
    }
    Expr::BinaryOp { op, left, right } => match op {
      BinaryOperator::Plus | BinaryOperator::Minus => {
        let l = min_power(left, var)?;
        let r = min_power(right, var)?;
        Some(l.min(r))
      }
      BinaryOperator::Times => {
        let l = min_power(left, var)?;
        let r = min_power(right, var)?;
        Some(l + r)
      }
      BinaryOperator::Power => {
        if is_constant_wrt(left, var) {
          Some(0)
        } else if let Expr::Integer(n) = right.as_ref() {
          if *n < 0 {
            return None;
          }
          let base_pow = min_power(left, var)?;
          Some(base_pow * n)
        } else {
          None
        }
      }
      BinaryOperator::Divide => {
        if is_constant_wrt(right, var) {
          min_power(left, var)
        } else {
          None
        }
      }
    },
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => min_power(operand, var),
    Expr::FunctionCall { .. } => {
      if is_constant_wrt(expr, var) {
        Some(0)
      } else {
        None
      }
    }
  }
}

/// Multiply two expressions, folding the trivial cases.
pub fn multiply_exprs(a: &Expr, b: &Expr) -> Expr {
  if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
    return num_to_expr(x * y);
  }
  match (a, b) {
    (Expr::Integer(1), _) => b.clone(),
    (_, Expr::Integer(1)) => a.clone(),
    (Expr::Integer(0), _) | (_, Expr::Integer(0)) => Expr::Integer(0),
    _ => Expr::binary(BinaryOperator::Times, a.clone(), b.clone()),
  }
}

/// Add two expressions, folding the trivial cases.
pub fn add_exprs(a: &Expr, b: &Expr) -> Expr {
  if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
    return num_to_expr(x + y);
  }
  match (a, b) {
    (Expr::Integer(0), _) => b.clone(),
    (_, Expr::Integer(0)) => a.clone(),
    _ => Expr::binary(BinaryOperator::Plus, a.clone(), b.clone()),
  }
}
