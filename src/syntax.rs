use std::fmt;

use pest::iterators::Pair;

use crate::Rule;

/// Symbolic expression tree.
///
/// Exact rationals are first-class: `Rational(n, d)` always has `d > 0`
/// and `gcd(n, d) == 1` (construct via `numeric::make_rational`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Integer(i128),
  Rational(i128, i128),
  Real(f64),
  /// Named mathematical constant (`pi`, `e`).
  Constant(String),
  Identifier(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

impl Expr {
  pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
      op,
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn negate(operand: Expr) -> Expr {
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand: Box::new(operand),
    }
  }

  pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::FunctionCall {
      name: name.to_string(),
      args,
    }
  }

  pub fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
  }
}

// ─── Parse-tree lowering ────────────────────────────────────────────

/// Convert a pest parse tree into an `Expr`.
///
/// Accepts a `Program`, `Expression`, or any sub-rule pair.
pub fn pair_to_expr(pair: Pair<Rule>) -> Expr {
  match pair.as_rule() {
    Rule::Program => {
      let inner = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::Expression)
        .expect("Program always contains an Expression");
      pair_to_expr(inner)
    }
    Rule::Expression => {
      let mut inner = pair.into_inner();
      let first = inner.next().expect("Expression has at least one Term");
      let mut expr = pair_to_expr(first);
      while let Some(op_pair) = inner.next() {
        let rhs = pair_to_expr(inner.next().expect("operator is followed by a Term"));
        let op = match op_pair.as_str() {
          "+" => BinaryOperator::Plus,
          _ => BinaryOperator::Minus,
        };
        expr = Expr::binary(op, expr, rhs);
      }
      expr
    }
    Rule::Term => {
      let mut inner = pair.into_inner();
      let first = inner.next().expect("Term has at least one Factor");
      let mut expr = pair_to_expr(first);
      while let Some(op_pair) = inner.next() {
        let rhs = pair_to_expr(inner.next().expect("operator is followed by a Factor"));
        let op = match op_pair.as_str() {
          "*" => BinaryOperator::Times,
          _ => BinaryOperator::Divide,
        };
        expr = Expr::binary(op, expr, rhs);
      }
      expr
    }
    Rule::Factor => {
      let mut inner = pair.into_inner();
      let first = inner.next().expect("Factor is never empty");
      if first.as_rule() == Rule::NegOp {
        let operand = pair_to_expr(inner.next().expect("NegOp is followed by a Factor"));
        Expr::negate(operand)
      } else {
        pair_to_expr(first)
      }
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = pair_to_expr(inner.next().expect("Power has a Primary"));
      match inner.next() {
        // PowOp followed by the exponent Factor
        Some(_pow_op) => {
          let exponent = pair_to_expr(inner.next().expect("PowOp is followed by a Factor"));
          Expr::binary(BinaryOperator::Power, base, exponent)
        }
        None => base,
      }
    }
    Rule::Primary => {
      let inner = pair
        .into_inner()
        .next()
        .expect("Primary wraps exactly one node");
      pair_to_expr(inner)
    }
    Rule::FunctionCall => {
      let mut inner = pair.into_inner();
      let name = inner.next().expect("FunctionCall starts with its name");
      let args: Vec<Expr> = inner.map(pair_to_expr).collect();
      Expr::FunctionCall {
        name: name.as_str().to_string(),
        args,
      }
    }
    Rule::Identifier => Expr::Identifier(pair.as_str().to_string()),
    Rule::Number => number_from_str(pair.as_str()),
    rule => unreachable!("unexpected rule in expression tree: {:?}", rule),
  }
}

fn number_from_str(text: &str) -> Expr {
  if text.contains('.') || text.contains('e') || text.contains('E') {
    Expr::Real(text.parse::<f64>().unwrap_or(f64::NAN))
  } else {
    text
      .parse::<i128>()
      .map(Expr::Integer)
      .unwrap_or_else(|_| Expr::Real(text.parse::<f64>().unwrap_or(f64::NAN)))
  }
}

// ─── Substitution ───────────────────────────────────────────────────

/// Replace every occurrence of the identifier `var` with `value`.
pub fn substitute_variable(expr: &Expr, var: &str, value: &Expr) -> Expr {
  match expr {
    Expr::Identifier(name) if name == var => value.clone(),
    Expr::Integer(_)
    | Expr::Rational(_, _)
    | Expr::Real(_)
    | Expr::Constant(_)
    | Expr::Identifier(_) => expr.clone(),
    Expr::UnaryOp { op, operand } => Expr::UnaryOp {
      op: *op,
      operand: Box::new(substitute_variable(operand, var, value)),
    },
    Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
      op: *op,
      left: Box::new(substitute_variable(left, var, value)),
      right: Box::new(substitute_variable(right, var, value)),
    },
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name: name.clone(),
      args: args
        .iter()
        .map(|a| substitute_variable(a, var, value))
        .collect(),
    },
  }
}

/// Check whether an identifier occurs anywhere in the expression.
pub fn contains_identifier(expr: &Expr, var: &str) -> bool {
  match expr {
    Expr::Identifier(name) => name == var,
    Expr::Integer(_) | Expr::Rational(_, _) | Expr::Real(_) | Expr::Constant(_) => false,
    Expr::UnaryOp { operand, .. } => contains_identifier(operand, var),
    Expr::BinaryOp { left, right, .. } => {
      contains_identifier(left, var) || contains_identifier(right, var)
    }
    Expr::FunctionCall { args, .. } => args.iter().any(|a| contains_identifier(a, var)),
  }
}

// ─── Display ────────────────────────────────────────────────────────

/// Render an expression in the input syntax (`+ - * / **`, `sqrt(...)`).
pub fn expr_to_string(expr: &Expr) -> String {
  expr.to_string()
}

// Operator precedence used for parenthesization. Rationals print as
// `n/d`, so they carry Times/Divide precedence.
fn precedence(expr: &Expr) -> u8 {
  match expr {
    Expr::BinaryOp {
      op: BinaryOperator::Plus | BinaryOperator::Minus,
      ..
    } => 1,
    Expr::BinaryOp {
      op: BinaryOperator::Times | BinaryOperator::Divide,
      ..
    } => 2,
    Expr::UnaryOp { .. } => 1,
    Expr::Rational(_, _) => 2,
    Expr::BinaryOp {
      op: BinaryOperator::Power,
      ..
    } => 3,
    Expr::Integer(n) if *n < 0 => 1,
    Expr::Real(f) if *f < 0.0 => 1,
    _ => 4,
  }
}

/// If the expression renders with a leading minus sign, return its
/// positive counterpart (used to print `a - b` instead of `a + -b`).
fn split_negative(expr: &Expr) -> Option<Expr> {
  match expr {
    Expr::Integer(n) if *n < 0 => Some(Expr::Integer(-n)),
    Expr::Rational(n, d) if *n < 0 => Some(Expr::Rational(-n, *d)),
    Expr::Real(f) if *f < 0.0 => Some(Expr::Real(-f)),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Some((**operand).clone()),
    Expr::BinaryOp {
      op: op @ (BinaryOperator::Times | BinaryOperator::Divide),
      left,
      right,
    } => split_negative(left).map(|pos_left| {
      if pos_left == Expr::Integer(1) && *op == BinaryOperator::Times {
        (**right).clone()
      } else {
        Expr::binary(*op, pos_left, (**right).clone())
      }
    }),
    _ => None,
  }
}

fn fmt_with_parens(expr: &Expr, min_prec: u8, out: &mut String) {
  if precedence(expr) < min_prec {
    out.push('(');
    fmt_expr(expr, out);
    out.push(')');
  } else {
    fmt_expr(expr, out);
  }
}

fn fmt_expr(expr: &Expr, out: &mut String) {
  match expr {
    Expr::Integer(n) => out.push_str(&n.to_string()),
    Expr::Rational(n, d) => out.push_str(&format!("{}/{}", n, d)),
    Expr::Real(f) => out.push_str(&format!("{}", f)),
    Expr::Constant(name) | Expr::Identifier(name) => out.push_str(name),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      out.push('-');
      fmt_with_parens(operand, 2, out);
    }
    Expr::BinaryOp { op, left, right } => match op {
      BinaryOperator::Plus => {
        fmt_with_parens(left, 1, out);
        match split_negative(right) {
          Some(positive) => {
            out.push_str(" - ");
            fmt_with_parens(&positive, 2, out);
          }
          None => {
            out.push_str(" + ");
            fmt_with_parens(right, 2, out);
          }
        }
      }
      BinaryOperator::Minus => {
        fmt_with_parens(left, 1, out);
        out.push_str(" - ");
        fmt_with_parens(right, 2, out);
      }
      BinaryOperator::Times => {
        fmt_with_parens(left, 2, out);
        out.push('*');
        fmt_with_parens(right, 3, out);
      }
      BinaryOperator::Divide => {
        fmt_with_parens(left, 2, out);
        out.push('/');
        fmt_with_parens(right, 3, out);
      }
      BinaryOperator::Power => {
        fmt_with_parens(left, 4, out);
        out.push_str("**");
        fmt_with_parens(right, 4, out);
      }
    },
    Expr::FunctionCall { name, args } => {
      out.push_str(name);
      out.push('(');
      for (i, arg) in args.iter().enumerate() {
        if i > 0 {
          out.push_str(", ");
        }
        fmt_expr(arg, out);
      }
      out.push(')');
    }
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut out = String::new();
    fmt_expr(self, &mut out);
    f.write_str(&out)
  }
}
