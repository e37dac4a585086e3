//! Exact numeric tower used by the symbolic layers.
//!
//! `Num` mirrors the expression leaves: exact rationals (`i128`
//! numerator/denominator) that degrade to `f64` only when a float enters
//! the computation.

use crate::syntax::Expr;

/// A numeric value extracted from an expression leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
  /// Reduced fraction, denominator > 0.
  Exact(i128, i128),
  Float(f64),
}

impl Num {
  pub fn exact(numer: i128, denom: i128) -> Self {
    debug_assert!(denom != 0, "zero denominator");
    let g = gcd_i128(numer, denom).abs().max(1);
    let (mut n, mut d) = (numer / g, denom / g);
    if d < 0 {
      n = -n;
      d = -d;
    }
    Num::Exact(n, d)
  }

  pub fn to_f64(self) -> f64 {
    match self {
      Num::Exact(n, d) => n as f64 / d as f64,
      Num::Float(f) => f,
    }
  }

  pub fn is_zero(self) -> bool {
    match self {
      Num::Exact(n, _) => n == 0,
      Num::Float(f) => f == 0.0,
    }
  }

  pub fn is_one(self) -> bool {
    match self {
      Num::Exact(n, d) => n == 1 && d == 1,
      Num::Float(f) => f == 1.0,
    }
  }

  pub fn is_minus_one(self) -> bool {
    match self {
      Num::Exact(n, d) => n == -1 && d == 1,
      Num::Float(f) => f == -1.0,
    }
  }

  pub fn as_integer(self) -> Option<i128> {
    match self {
      Num::Exact(n, 1) => Some(n),
      _ => None,
    }
  }

  /// Division; `None` when the divisor is zero.
  pub fn checked_div(self, rhs: Self) -> Option<Self> {
    if rhs.is_zero() {
      return None;
    }
    match (self, rhs) {
      (Num::Exact(a, b), Num::Exact(c, d)) => Some(Num::exact(a * d, b * c)),
      _ => Some(Num::Float(self.to_f64() / rhs.to_f64())),
    }
  }

  /// Integer power; `None` on overflow-free failure (0 to a negative power).
  pub fn pow_i(self, exp: i128) -> Option<Self> {
    if exp == 0 {
      return Some(Num::Exact(1, 1));
    }
    if self.is_zero() && exp < 0 {
      return None;
    }
    match self {
      Num::Exact(n, d) => {
        let k = exp.unsigned_abs().min(u32::MAX as u128) as u32;
        let pn = n.checked_pow(k);
        let pd = d.checked_pow(k);
        match (pn, pd) {
          (Some(pn), Some(pd)) => {
            if exp > 0 {
              Some(Num::exact(pn, pd))
            } else {
              Some(Num::exact(pd, pn))
            }
          }
          // i128 overflow: degrade to float
          _ => Some(Num::Float(self.to_f64().powi(exp as i32))),
        }
      }
      Num::Float(f) => Some(Num::Float(f.powf(exp as f64))),
    }
  }
}

impl std::ops::Add for Num {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    match (self, rhs) {
      (Num::Exact(a, b), Num::Exact(c, d)) => Num::exact(a * d + c * b, b * d),
      _ => Num::Float(self.to_f64() + rhs.to_f64()),
    }
  }
}

impl std::ops::Sub for Num {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    match (self, rhs) {
      (Num::Exact(a, b), Num::Exact(c, d)) => Num::exact(a * d - c * b, b * d),
      _ => Num::Float(self.to_f64() - rhs.to_f64()),
    }
  }
}

impl std::ops::Mul for Num {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    match (self, rhs) {
      (Num::Exact(a, b), Num::Exact(c, d)) => Num::exact(a * c, b * d),
      _ => Num::Float(self.to_f64() * rhs.to_f64()),
    }
  }
}

impl std::ops::Neg for Num {
  type Output = Self;

  fn neg(self) -> Self {
    match self {
      Num::Exact(n, d) => Num::Exact(-n, d),
      Num::Float(f) => Num::Float(-f),
    }
  }
}

/// Read a numeric leaf.
pub fn as_number(expr: &Expr) -> Option<Num> {
  match expr {
    Expr::Integer(n) => Some(Num::Exact(*n, 1)),
    Expr::Rational(n, d) => Some(Num::Exact(*n, *d)),
    Expr::Real(f) => Some(Num::Float(*f)),
    _ => None,
  }
}

/// Build the canonical expression leaf for a numeric value.
pub fn num_to_expr(num: Num) -> Expr {
  match num {
    Num::Exact(n, 1) => Expr::Integer(n),
    Num::Exact(n, d) => Expr::Rational(n, d),
    Num::Float(f) => {
      // Whole floats collapse back to integers
      if f.fract() == 0.0 && f.abs() < 9e18 {
        Expr::Integer(f as i128)
      } else {
        Expr::Real(f)
      }
    }
  }
}

/// Numeric leaf for an externally supplied `f64` (template parameters).
pub fn number_from_f64(value: f64) -> Expr {
  if value.fract() == 0.0 && value.abs() < 9e18 {
    Expr::Integer(value as i128)
  } else {
    Expr::Real(value)
  }
}

/// Reduced rational expression; collapses to an integer when possible.
pub fn make_rational(numer: i128, denom: i128) -> Expr {
  num_to_expr(Num::exact(numer, denom))
}

pub fn gcd_i128(a: i128, b: i128) -> i128 {
  let (mut a, mut b) = (a.abs(), b.abs());
  while b != 0 {
    let t = b;
    b = a % b;
    a = t;
  }
  a
}

pub fn lcm_i128(a: i128, b: i128) -> i128 {
  if a == 0 || b == 0 {
    return 0;
  }
  (a / gcd_i128(a, b) * b).abs()
}

/// Split `sqrt(n)` into `outside * sqrt(inside)` by extracting perfect
/// square factors. `sqrt(20)` → `(2, 5)`, `sqrt(4)` → `(2, 1)`.
pub fn simplify_sqrt_parts(n: i128) -> (i128, i128) {
  if n == 0 {
    return (0, 1);
  }
  if n < 0 {
    return (1, n);
  }
  let mut outside = 1i128;
  let mut inside = n;
  let mut factor = 2i128;
  while factor * factor <= inside {
    while inside % (factor * factor) == 0 {
      inside /= factor * factor;
      outside *= factor;
    }
    factor += 1;
  }
  (outside, inside)
}

/// Numeric approximation of a closed expression.
///
/// `None` when the expression still contains free identifiers or an
/// unsupported function. Non-real values surface as `NaN` (e.g. the
/// square root of a negative number), which callers use as the realness
/// filter.
pub fn expr_to_f64(expr: &Expr) -> Option<f64> {
  match expr {
    Expr::Integer(n) => Some(*n as f64),
    Expr::Rational(n, d) => Some(*n as f64 / *d as f64),
    Expr::Real(f) => Some(*f),
    Expr::Constant(name) => match name.as_str() {
      "pi" => Some(std::f64::consts::PI),
      "e" => Some(std::f64::consts::E),
      _ => None,
    },
    Expr::Identifier(_) => None,
    Expr::UnaryOp { operand, .. } => Some(-expr_to_f64(operand)?),
    Expr::BinaryOp { op, left, right } => {
      let l = expr_to_f64(left)?;
      let r = expr_to_f64(right)?;
      use crate::syntax::BinaryOperator::*;
      Some(match op {
        Plus => l + r,
        Minus => l - r,
        Times => l * r,
        Divide => l / r,
        Power => l.powf(r),
      })
    }
    Expr::FunctionCall { name, args } => {
      if args.len() != 1 {
        return None;
      }
      let x = expr_to_f64(&args[0])?;
      match name.as_str() {
        "sqrt" => Some(x.sqrt()),
        "sin" => Some(x.sin()),
        "cos" => Some(x.cos()),
        "tan" => Some(x.tan()),
        "exp" => Some(x.exp()),
        "log" => Some(x.ln()),
        _ => None,
      }
    }
  }
}
