//! Symbolic differentiation and structural simplification.

use crate::EngineError;
use crate::algebra::expand_and_combine;
use crate::numeric::{as_number, num_to_expr};
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};

/// Check if an expression is constant with respect to a variable.
pub fn is_constant_wrt(expr: &Expr, var: &str) -> bool {
  match expr {
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => true,
    Expr::Identifier(name) => name != var,
    Expr::BinaryOp { left, right, .. } => {
      is_constant_wrt(left, var) && is_constant_wrt(right, var)
    }
    Expr::UnaryOp { operand, .. } => is_constant_wrt(operand, var),
    Expr::FunctionCall { args, .. } => args.iter().all(|a| is_constant_wrt(a, var)),
  }
}

/// Partial derivative with respect to `var`, combined into a flat sum.
///
/// This is the public entry point; `differentiate` below produces the raw
/// rule application and `expand_and_combine` merges like terms so the
/// result reads the way a person would write it.
pub fn derivative(expr: &Expr, var: &str) -> Result<Expr, EngineError> {
  let raw = differentiate(expr, var)?;
  Ok(expand_and_combine(&raw))
}

fn differentiate(expr: &Expr, var: &str) -> Result<Expr, EngineError> {
  match expr {
    // Constants
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => {
      Ok(Expr::Integer(0))
    }

    // Variable
    Expr::Identifier(name) => {
      if name == var {
        Ok(Expr::Integer(1))
      } else {
        Ok(Expr::Integer(0))
      }
    }

    Expr::BinaryOp { op, left, right } => {
      use BinaryOperator::*;
      match op {
        Plus => {
          // d/dx[a + b] = a' + b'
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(Plus, da, db)))
        }
        Minus => {
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(Minus, da, db)))
        }
        Times => {
          // Product rule: a'*b + a*b'
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(
            Plus,
            Expr::binary(Times, da, (**right).clone()),
            Expr::binary(Times, (**left).clone(), db),
          )))
        }
        Divide => {
          // Quotient rule: (a'*b - a*b') / b^2
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(
            Divide,
            Expr::binary(
              Minus,
              Expr::binary(Times, da, (**right).clone()),
              Expr::binary(Times, (**left).clone(), db),
            ),
            Expr::binary(Power, (**right).clone(), Expr::Integer(2)),
          )))
        }
        Power => {
          if is_constant_wrt(right, var) {
            // Power rule: n * f^(n-1) * f'
            let df = differentiate(left, var)?;
            Ok(simplify(Expr::binary(
              Times,
              Expr::binary(
                Times,
                (**right).clone(),
                Expr::binary(
                  Power,
                  (**left).clone(),
                  Expr::binary(Minus, (**right).clone(), Expr::Integer(1)),
                ),
              ),
              df,
            )))
          } else if matches!(left.as_ref(), Expr::Constant(c) if c == "e") {
            // d/dx[e^g] = e^g * g'
            let dg = differentiate(right, var)?;
            Ok(simplify(Expr::binary(Times, expr.clone(), dg)))
          } else if is_constant_wrt(left, var) {
            // d/dx[a^g] = a^g * log(a) * g'
            let dg = differentiate(right, var)?;
            Ok(simplify(Expr::binary(
              Times,
              Expr::binary(Times, expr.clone(), Expr::call("log", vec![(**left).clone()])),
              dg,
            )))
          } else {
            // General rule: f^g * (g'*log(f) + g*f'/f)
            let df = differentiate(left, var)?;
            let dg = differentiate(right, var)?;
            Ok(simplify(Expr::binary(
              Times,
              expr.clone(),
              Expr::binary(
                Plus,
                Expr::binary(Times, dg, Expr::call("log", vec![(**left).clone()])),
                Expr::binary(
                  Times,
                  (**right).clone(),
                  Expr::binary(Divide, df, (**left).clone()),
                ),
              ),
            )))
          }
        }
      }
    }

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      let d = differentiate(operand, var)?;
      Ok(simplify(Expr::negate(d)))
    }

    Expr::FunctionCall { name, args } => {
      if args.len() != 1 {
        return Err(EngineError::SolverError(format!(
          "cannot differentiate `{}` with {} arguments",
          name,
          args.len()
        )));
      }
      let inner = &args[0];
      let df = differentiate(inner, var)?;
      let outer = match name.as_str() {
        // d/dx[sin(f)] = cos(f) * f'
        "sin" => Expr::call("cos", args.clone()),
        // d/dx[cos(f)] = -sin(f) * f'
        "cos" => Expr::negate(Expr::call("sin", args.clone())),
        // d/dx[tan(f)] = f' / cos(f)^2
        "tan" => {
          return Ok(simplify(Expr::binary(
            BinaryOperator::Divide,
            df,
            Expr::binary(
              BinaryOperator::Power,
              Expr::call("cos", args.clone()),
              Expr::Integer(2),
            ),
          )));
        }
        // d/dx[exp(f)] = exp(f) * f'
        "exp" => Expr::call("exp", args.clone()),
        // d/dx[log(f)] = f' / f
        "log" => {
          return Ok(simplify(Expr::binary(BinaryOperator::Divide, df, inner.clone())));
        }
        // d/dx[sqrt(f)] = f' / (2*sqrt(f))
        "sqrt" => {
          return Ok(simplify(Expr::binary(
            BinaryOperator::Divide,
            df,
            Expr::binary(
              BinaryOperator::Times,
              Expr::Integer(2),
              Expr::call("sqrt", args.clone()),
            ),
          )));
        }
        _ => {
          return Err(EngineError::SolverError(format!(
            "cannot differentiate unknown function `{}`",
            name
          )));
        }
      };
      Ok(simplify(Expr::binary(BinaryOperator::Times, outer, df)))
    }
  }
}

// ─── Simplify ───────────────────────────────────────────────────────

/// Structural simplification: folds numeric subexpressions exactly and
/// applies the identity/annihilator rules. Does not expand products; use
/// `algebra::expand_and_combine` for that.
pub fn simplify(expr: Expr) -> Expr {
  match expr {
    Expr::BinaryOp { op, left, right } => {
      let left = simplify(*left);
      let right = simplify(*right);

      use BinaryOperator::*;

      // Exact numeric folding first
      if let (Some(a), Some(b)) = (as_number(&left), as_number(&right)) {
        match op {
          Plus => return num_to_expr(a + b),
          Minus => return num_to_expr(a - b),
          Times => return num_to_expr(a * b),
          Divide => {
            if let Some(q) = a.checked_div(b) {
              return num_to_expr(q);
            }
          }
          Power => {
            if let Some(k) = b.as_integer() {
              if let Some(p) = a.pow_i(k) {
                return num_to_expr(p);
              }
            } else if let (Num::Float(_), _) | (_, Num::Float(_)) = (a, b) {
              return num_to_expr(Num::Float(a.to_f64().powf(b.to_f64())));
            }
          }
        }
      }

      match (&op, &left, &right) {
        // 0 + x = x
        (Plus, Expr::Integer(0), _) => return right,
        // x + 0 = x
        (Plus, _, Expr::Integer(0)) => return left,
        // x - 0 = x
        (Minus, _, Expr::Integer(0)) => return left,
        // 0 - x = -x
        (Minus, Expr::Integer(0), _) => return simplify(Expr::negate(right)),
        // 0 * x = 0
        (Times, Expr::Integer(0), _) | (Times, _, Expr::Integer(0)) => {
          return Expr::Integer(0);
        }
        // 1 * x = x
        (Times, Expr::Integer(1), _) => return right,
        // x * 1 = x
        (Times, _, Expr::Integer(1)) => return left,
        // 0 / x = 0
        (Divide, Expr::Integer(0), _) => return Expr::Integer(0),
        // x / 1 = x
        (Divide, _, Expr::Integer(1)) => return left,
        // x^0 = 1
        (Power, _, Expr::Integer(0)) => return Expr::Integer(1),
        // x^1 = x
        (Power, _, Expr::Integer(1)) => return left,
        // 0^n = 0 for n > 0
        (Power, Expr::Integer(0), Expr::Integer(n)) if *n > 0 => {
          return Expr::Integer(0);
        }
        // 1^x = 1
        (Power, Expr::Integer(1), _) => return Expr::Integer(1),
        _ => {}
      }

      Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
      }
    }
    Expr::UnaryOp { op, operand } => {
      let operand = simplify(*operand);
      if let Some(n) = as_number(&operand) {
        return num_to_expr(-n);
      }
      match operand {
        // -(-x) = x
        Expr::UnaryOp {
          op: UnaryOperator::Minus,
          operand: inner,
        } => *inner,
        operand => Expr::UnaryOp {
          op,
          operand: Box::new(operand),
        },
      }
    }
    Expr::FunctionCall { name, args } => {
      let args: Vec<Expr> = args.into_iter().map(simplify).collect();
      if args.len() == 1 {
        if let Some(value) = fold_function(&name, &args[0]) {
          return value;
        }
      }
      Expr::FunctionCall { name, args }
    }
    _ => expr,
  }
}

use crate::numeric::{Num, simplify_sqrt_parts};

/// Known exact values of the supported functions.
fn fold_function(name: &str, arg: &Expr) -> Option<Expr> {
  match (name, arg) {
    ("sqrt", Expr::Integer(n)) if *n >= 0 => {
      let (outside, inside) = simplify_sqrt_parts(*n);
      if inside == 1 {
        Some(Expr::Integer(outside))
      } else {
        None
      }
    }
    ("sqrt", Expr::Real(f)) if *f >= 0.0 => Some(Expr::Real(f.sqrt())),
    ("sin", Expr::Real(f)) => Some(Expr::Real(f.sin())),
    ("cos", Expr::Real(f)) => Some(Expr::Real(f.cos())),
    ("tan", Expr::Real(f)) => Some(Expr::Real(f.tan())),
    ("exp", Expr::Real(f)) => Some(Expr::Real(f.exp())),
    ("log", Expr::Real(f)) if *f > 0.0 => Some(Expr::Real(f.ln())),
    ("sin", Expr::Integer(0)) | ("tan", Expr::Integer(0)) => Some(Expr::Integer(0)),
    ("cos", Expr::Integer(0)) | ("exp", Expr::Integer(0)) => Some(Expr::Integer(1)),
    ("log", Expr::Integer(1)) => Some(Expr::Integer(0)),
    ("log", Expr::Constant(c)) if c == "e" => Some(Expr::Integer(1)),
    _ => None,
  }
}
