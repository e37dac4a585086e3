//! Stationary-point search and optimum selection.
//!
//! The solver is a pure function: gradient → common zeros → domain
//! filter → extremum selection. Nothing is cached between calls.

use crate::EngineError;
use crate::algebra::{as_fraction, is_zero_expr, solve_system};
use crate::calculus::{derivative, simplify};
use crate::numeric::expr_to_f64;
use crate::syntax::{Expr, expr_to_string, substitute_variable};

/// Domain restriction attached to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
  Unrestricted,
  Real,
  /// Strictly positive real (physical lengths, quantities).
  PositiveReal,
}

/// A declared symbolic unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
  pub name: String,
  pub domain: Domain,
}

impl Variable {
  pub fn new(name: &str, domain: Domain) -> Self {
    Variable {
      name: name.to_string(),
      domain,
    }
  }

  pub fn unrestricted(name: &str) -> Self {
    Self::new(name, Domain::Unrestricted)
  }

  pub fn real(name: &str) -> Self {
    Self::new(name, Domain::Real)
  }

  pub fn positive(name: &str) -> Self {
    Self::new(name, Domain::PositiveReal)
  }
}

/// Which extremum to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Maximize,
  Minimize,
}

/// Caller-level realness requirement. Per-variable positivity always
/// comes from the `Variable` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainFilter {
  #[default]
  RealOnly,
  Unrestricted,
}

/// One stationary point: a value for every declared variable, in
/// declaration order.
pub type Assignment = Vec<(String, Expr)>;

/// Outcome of an optimization run. `NoSolution` is an expected outcome
/// (no stationary point survives the domain filter), not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationResult {
  Selected {
    assignment: Assignment,
    objective_value: Expr,
  },
  NoSolution,
}

/// One simplified partial derivative per variable.
pub fn gradient(expr: &Expr, vars: &[Variable]) -> Result<Vec<Expr>, EngineError> {
  vars.iter().map(|v| derivative(expr, &v.name)).collect()
}

/// All common zeros of the gradient, each assigning every declared
/// variable, in declaration order.
pub fn stationary_points(expr: &Expr, vars: &[Variable]) -> Result<Vec<Assignment>, EngineError> {
  if vars.is_empty() {
    return Err(EngineError::SolverError(
      "at least one variable is required".to_string(),
    ));
  }
  let grad = gradient(expr, vars)?;

  // A gradient that vanishes identically has no isolated stationary
  // points (constant objective): report none rather than "everywhere".
  if grad.iter().all(is_zero_expr) {
    return Ok(Vec::new());
  }

  let names: Vec<String> = vars.iter().map(|v| v.name.clone()).collect();
  let solutions = solve_system(&grad, &names)?;

  // Denominators cleared while solving must not vanish at a solution
  let denominators: Vec<Expr> = grad
    .iter()
    .map(|g| as_fraction(g).1)
    .filter(|d| !matches!(d, Expr::Integer(1)))
    .collect();

  let mut points = Vec::new();
  for solution in solutions {
    let mut assignment = Assignment::new();
    for name in &names {
      match solution.iter().find(|(n, _)| n == name) {
        Some((_, value)) => assignment.push((name.clone(), value.clone())),
        None => {
          return Err(EngineError::SolverError(format!(
            "stationary points are not isolated: `{}` is unconstrained",
            name
          )));
        }
      }
    }
    let on_pole = denominators.iter().any(|den| {
      matches!(expr_to_f64(&evaluate_at(den, &assignment)), Some(v) if v.abs() < 1e-12)
    });
    if !on_pole {
      points.push(assignment);
    }
  }
  Ok(points)
}

/// Find the stationary points of `expr`, filter them by the domain rules,
/// and select the extremum in the requested direction.
///
/// Selection compares the numeric approximation of the objective at each
/// candidate; the reported value keeps its exact symbolic form. Ties keep
/// the first candidate in solver order.
pub fn optimize(
  expr: &Expr,
  vars: &[Variable],
  direction: Direction,
  filter: DomainFilter,
) -> Result<OptimizationResult, EngineError> {
  let candidates = stationary_points(expr, vars)?;

  let mut scored: Vec<(Assignment, Expr, f64)> = Vec::new();
  for assignment in candidates {
    if !passes_domain_filter(&assignment, vars, filter) {
      continue;
    }
    let value = evaluate_at(expr, &assignment);
    let score = match expr_to_f64(&value) {
      Some(s) if !s.is_nan() => s,
      _ => {
        return Err(EngineError::SolverError(format!(
          "cannot order objective value `{}` at {}",
          expr_to_string(&value),
          format_assignment(&assignment)
        )));
      }
    };
    scored.push((assignment, value, score));
  }

  if scored.is_empty() {
    return Ok(OptimizationResult::NoSolution);
  }

  // Strict comparison keeps the first candidate on ties
  let mut best = 0;
  for i in 1..scored.len() {
    let better = match direction {
      Direction::Maximize => scored[i].2 > scored[best].2,
      Direction::Minimize => scored[i].2 < scored[best].2,
    };
    if better {
      best = i;
    }
  }
  let (assignment, objective_value, _) = scored.swap_remove(best);
  Ok(OptimizationResult::Selected {
    assignment,
    objective_value,
  })
}

fn passes_domain_filter(assignment: &Assignment, vars: &[Variable], filter: DomainFilter) -> bool {
  for (variable, (_, value)) in vars.iter().zip(assignment.iter()) {
    let approx = expr_to_f64(value);
    let real = matches!(approx, Some(v) if v.is_finite());
    let needs_real =
      filter == DomainFilter::RealOnly || variable.domain != Domain::Unrestricted;
    if needs_real && !real {
      return false;
    }
    if variable.domain == Domain::PositiveReal {
      match approx {
        Some(v) if v > 0.0 => {}
        _ => return false,
      }
    }
  }
  true
}

/// Substitute an assignment into an expression and fold it exactly.
pub fn evaluate_at(expr: &Expr, assignment: &Assignment) -> Expr {
  let mut value = expr.clone();
  for (name, v) in assignment {
    value = substitute_variable(&value, name, v);
  }
  simplify(value)
}

/// Render an assignment as `x = 10, y = 10`.
pub fn format_assignment(assignment: &Assignment) -> String {
  assignment
    .iter()
    .map(|(name, value)| format!("{} = {}", name, expr_to_string(value)))
    .collect::<Vec<_>>()
    .join(", ")
}
