//! Expression construction: free-text parsing and the word-problem
//! template table.

use std::collections::HashMap;

use crate::optimize::{Domain, Variable};
use crate::calculus::simplify;
use crate::numeric::number_from_f64;
use crate::syntax::{BinaryOperator, Expr, pair_to_expr};
use crate::{EngineError, ExprParser};

/// Functions the parser accepts (all unary).
pub const KNOWN_FUNCTIONS: &[&str] = &["sqrt", "sin", "cos", "tan", "exp", "log"];

const KNOWN_CONSTANTS: &[&str] = &["pi", "e"];

/// Parse an infix formula over the declared variables.
///
/// Every identifier must be a declared variable, a known constant, or a
/// known function name; anything else is rejected so that typos surface
/// as errors instead of silently becoming free symbols.
pub fn parse_expression(text: &str, variable_names: &[&str]) -> Result<Expr, EngineError> {
  if variable_names.is_empty() {
    return Err(EngineError::InvalidExpression(
      "at least one variable must be declared".to_string(),
    ));
  }
  for name in variable_names {
    if !is_valid_identifier(name) {
      return Err(EngineError::InvalidExpression(format!(
        "`{}` is not a valid variable name",
        name
      )));
    }
  }
  let mut unique = variable_names.to_vec();
  unique.sort_unstable();
  unique.dedup();
  if unique.len() != variable_names.len() {
    return Err(EngineError::InvalidExpression(
      "variable names must be distinct".to_string(),
    ));
  }

  let mut pairs = ExprParser::parse_program(text.trim())?;
  let program = pairs.next().ok_or_else(|| {
    EngineError::InvalidExpression("empty expression".to_string())
  })?;
  resolve_symbols(pair_to_expr(program), variable_names)
}

fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check identifiers against the declared variables, mapping known
/// constants to `Constant` leaves. Declared variables shadow constants.
fn resolve_symbols(expr: Expr, vars: &[&str]) -> Result<Expr, EngineError> {
  match expr {
    Expr::Identifier(name) => {
      if vars.contains(&name.as_str()) {
        Ok(Expr::Identifier(name))
      } else if KNOWN_CONSTANTS.contains(&name.as_str()) {
        Ok(Expr::Constant(name))
      } else {
        Err(EngineError::InvalidExpression(format!(
          "unknown symbol `{}`",
          name
        )))
      }
    }
    Expr::FunctionCall { name, args } => {
      if !KNOWN_FUNCTIONS.contains(&name.as_str()) {
        return Err(EngineError::InvalidExpression(format!(
          "unknown function `{}`",
          name
        )));
      }
      if args.len() != 1 {
        return Err(EngineError::InvalidExpression(format!(
          "`{}` expects exactly 1 argument",
          name
        )));
      }
      let args = args
        .into_iter()
        .map(|a| resolve_symbols(a, vars))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Expr::FunctionCall { name, args })
    }
    Expr::UnaryOp { op, operand } => Ok(Expr::UnaryOp {
      op,
      operand: Box::new(resolve_symbols(*operand, vars)?),
    }),
    Expr::BinaryOp { op, left, right } => Ok(Expr::BinaryOp {
      op,
      left: Box::new(resolve_symbols(*left, vars)?),
      right: Box::new(resolve_symbols(*right, vars)?),
    }),
    other => Ok(other),
  }
}

// ─── Word-problem templates ─────────────────────────────────────────

/// A constrained-optimization word problem reduced to a single free
/// variable, plus the dependent quantities eliminated by the constraint
/// (reported back to the user, e.g. the second rectangle side).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateProblem {
  pub objective: Expr,
  pub variable: Variable,
  /// (name, expression in the free variable)
  pub derived: Vec<(String, Expr)>,
  /// Display label for the objective ("area", "profit", …).
  pub objective_name: &'static str,
}

struct TemplateSpec {
  id: &'static str,
  objective_name: &'static str,
  params: &'static [&'static str],
  variable: &'static str,
  domain: Domain,
  build: fn(&[Expr]) -> Expr,
  derived: fn(&[Expr]) -> Vec<(String, Expr)>,
}

// The four word problems share one mechanism: substitute the numeric
// parameters into a fixed algebraic shape, then optimize the single
// remaining variable.
static TEMPLATES: &[TemplateSpec] = &[
  TemplateSpec {
    id: "area-fixed-perimeter",
    objective_name: "area",
    params: &["P"],
    variable: "x",
    domain: Domain::PositiveReal,
    // A(x) = x * (P/2 - x)
    build: |p| {
      Expr::binary(
        BinaryOperator::Times,
        Expr::ident("x"),
        Expr::binary(BinaryOperator::Minus, half(&p[0]), Expr::ident("x")),
      )
    },
    // y = P/2 - x
    derived: |p| {
      vec![(
        "y".to_string(),
        Expr::binary(BinaryOperator::Minus, half(&p[0]), Expr::ident("x")),
      )]
    },
  },
  TemplateSpec {
    id: "perimeter-fixed-area",
    objective_name: "perimeter",
    params: &["L"],
    variable: "x",
    domain: Domain::PositiveReal,
    // P(x) = 2 * (x + L/x)
    build: |p| {
      Expr::binary(
        BinaryOperator::Times,
        Expr::Integer(2),
        Expr::binary(
          BinaryOperator::Plus,
          Expr::ident("x"),
          Expr::binary(BinaryOperator::Divide, p[0].clone(), Expr::ident("x")),
        ),
      )
    },
    // y = L/x
    derived: |p| {
      vec![(
        "y".to_string(),
        Expr::binary(BinaryOperator::Divide, p[0].clone(), Expr::ident("x")),
      )]
    },
  },
  TemplateSpec {
    id: "open-box-volume",
    objective_name: "volume",
    params: &["L", "W"],
    variable: "x",
    domain: Domain::PositiveReal,
    // V(x) = x * (L - 2x) * (W - 2x)
    build: |p| {
      Expr::binary(
        BinaryOperator::Times,
        Expr::binary(
          BinaryOperator::Times,
          Expr::ident("x"),
          fold_minus_twice(&p[0]),
        ),
        fold_minus_twice(&p[1]),
      )
    },
    derived: |_| Vec::new(),
  },
  TemplateSpec {
    id: "profit-linear",
    objective_name: "profit",
    params: &["price", "cost", "fixed"],
    variable: "q",
    domain: Domain::Real,
    // profit(q) = price*q - (cost*q + fixed)
    build: |p| {
      Expr::binary(
        BinaryOperator::Minus,
        Expr::binary(BinaryOperator::Times, p[0].clone(), Expr::ident("q")),
        Expr::binary(
          BinaryOperator::Plus,
          Expr::binary(BinaryOperator::Times, p[1].clone(), Expr::ident("q")),
          p[2].clone(),
        ),
      )
    },
    derived: |_| Vec::new(),
  },
];

fn half(p: &Expr) -> Expr {
  Expr::binary(BinaryOperator::Divide, p.clone(), Expr::Integer(2))
}

// L - 2x, the sheet side after folding both flaps up
fn fold_minus_twice(p: &Expr) -> Expr {
  Expr::binary(
    BinaryOperator::Minus,
    p.clone(),
    Expr::binary(BinaryOperator::Times, Expr::Integer(2), Expr::ident("x")),
  )
}

/// The available template identifiers.
pub fn template_ids() -> Vec<&'static str> {
  TEMPLATES.iter().map(|t| t.id).collect()
}

/// Instantiate a word-problem template with named numeric parameters.
///
/// Every declared parameter must be present and finite; unknown
/// parameters are rejected. Negative lengths are accepted — they simply
/// tend to leave no stationary point in the positive domain.
pub fn build_from_template(
  id: &str,
  params: &HashMap<String, f64>,
) -> Result<TemplateProblem, EngineError> {
  let spec = TEMPLATES.iter().find(|t| t.id == id).ok_or_else(|| {
    EngineError::InvalidParameter(format!(
      "unknown template `{}` (expected one of: {})",
      id,
      template_ids().join(", ")
    ))
  })?;

  for name in params.keys() {
    if !spec.params.contains(&name.as_str()) {
      return Err(EngineError::InvalidParameter(format!(
        "unknown parameter `{}` for template `{}`",
        name, id
      )));
    }
  }

  let mut values = Vec::with_capacity(spec.params.len());
  for name in spec.params {
    let value = params.get(*name).ok_or_else(|| {
      EngineError::InvalidParameter(format!(
        "template `{}` requires parameter `{}`",
        id, name
      ))
    })?;
    if !value.is_finite() {
      return Err(EngineError::InvalidParameter(format!(
        "parameter `{}` must be a finite number",
        name
      )));
    }
    values.push(number_from_f64(*value));
  }

  let objective = simplify((spec.build)(&values));
  let derived = (spec.derived)(&values)
    .into_iter()
    .map(|(name, expr)| (name, simplify(expr)))
    .collect();

  Ok(TemplateProblem {
    objective,
    variable: Variable::new(spec.variable, spec.domain),
    derived,
    objective_name: spec.objective_name,
  })
}
