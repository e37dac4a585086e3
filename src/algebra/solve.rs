use std::collections::HashSet;

use crate::EngineError;
use crate::calculus::simplify;
use crate::numeric::{Num, as_number, expr_to_f64, gcd_i128, lcm_i128, make_rational,
  num_to_expr, simplify_sqrt_parts};
use crate::syntax::{BinaryOperator, Expr, contains_identifier, expr_to_string,
  substitute_variable};

use super::{as_fraction, collect_additive_terms, expand_and_combine,
  extract_coefficient_of_power, max_power, min_power, negate_term,
  term_var_power_and_coeff};

// ─── Univariate solving ─────────────────────────────────────────────

/// Find all roots of `poly == 0` in `var`.
///
/// Exact closed forms for linear and quadratic polynomials (coefficients
/// may be symbolic in other variables); higher degrees are handled only
/// when powers of `var` factor out. Complex quadratic roots are returned
/// as expressions containing the square root of a negative number, which
/// the caller's realness filter rejects.
pub fn solve_univariate(poly: &Expr, var: &str) -> Result<Vec<Expr>, EngineError> {
  let expanded = expand_and_combine(poly);

  if !contains_identifier(&expanded, var) {
    // Constant equation: no roots (the trivially-zero case is dropped by
    // the caller before solving).
    return Ok(Vec::new());
  }

  let mut degree = match max_power(&expanded, var) {
    Some(d) => d,
    None => {
      return Err(EngineError::SolverError(format!(
        "cannot solve `{}` for {}: not a polynomial",
        expr_to_string(&expanded),
        var
      )));
    }
  };

  let mut roots: Vec<Expr> = Vec::new();
  let mut reduced = expanded;

  // Factor out the lowest power of var: x^m * q(x) = 0 adds the root 0.
  let low = min_power(&reduced, var).unwrap_or(0);
  if low > 0 {
    roots.push(Expr::Integer(0));
    reduced = shift_down(&reduced, var, low)?;
    degree -= low;
  }

  match degree {
    0 => {}
    1 => {
      let (b, a) = linear_coefficients(&reduced, var);
      roots.push(simplify(solve_divide(&negate_term(&b), &a)));
    }
    2 => roots.extend(quadratic_roots(&reduced, var)?),
    d => {
      return Err(EngineError::SolverError(format!(
        "cannot solve `{}` for {}: degree {} exceeds quadratic",
        expr_to_string(&reduced),
        var,
        d
      )));
    }
  }

  // Deduplicate repeated roots (double roots of a quadratic)
  let mut seen = HashSet::new();
  roots.retain(|r| seen.insert(expr_to_string(r)));
  Ok(roots)
}

/// Divide a polynomial by `var^shift` term by term.
fn shift_down(poly: &Expr, var: &str, shift: i128) -> Result<Expr, EngineError> {
  let mut shifted: Vec<Expr> = Vec::new();
  for term in collect_additive_terms(poly) {
    let (p, c) = term_var_power_and_coeff(&term, var);
    if p < shift {
      return Err(EngineError::SolverError(format!(
        "cannot factor {}^{} out of `{}`",
        var,
        shift,
        expr_to_string(poly)
      )));
    }
    let rest_power = p - shift;
    let rebuilt = if rest_power == 0 {
      c
    } else if rest_power == 1 {
      super::multiply_exprs(&c, &Expr::ident(var))
    } else {
      super::multiply_exprs(
        &c,
        &Expr::binary(BinaryOperator::Power, Expr::ident(var), Expr::Integer(rest_power)),
      )
    };
    shifted.push(rebuilt);
  }
  Ok(super::build_sum(shifted))
}

/// Coefficient of `var^power` across all terms, simplified.
fn coefficient(poly: &Expr, var: &str, power: i128) -> Expr {
  let mut sum = Expr::Integer(0);
  for term in collect_additive_terms(poly) {
    if let Some(c) = extract_coefficient_of_power(&term, var, power) {
      sum = super::add_exprs(&sum, &c);
    }
  }
  simplify(sum)
}

fn linear_coefficients(poly: &Expr, var: &str) -> (Expr, Expr) {
  (coefficient(poly, var, 0), coefficient(poly, var, 1))
}

/// Exact quadratic formula: a*x^2 + b*x + c = 0.
fn quadratic_roots(poly: &Expr, var: &str) -> Result<Vec<Expr>, EngineError> {
  let c = coefficient(poly, var, 0);
  let b = coefficient(poly, var, 1);
  let a = coefficient(poly, var, 2);

  match (as_number(&a), as_number(&b), as_number(&c)) {
    (Some(an), Some(bn), Some(cn)) => {
      if let (Num::Exact(n_a, d_a), Num::Exact(n_b, d_b), Num::Exact(n_c, d_c)) = (an, bn, cn)
      {
        // Clear denominators so the discriminant stays in integers
        let scale = lcm_i128(lcm_i128(d_a, d_b).max(1), d_c).max(1);
        let ai = n_a * (scale / d_a);
        let bi = n_b * (scale / d_b);
        let ci = n_c * (scale / d_c);
        Ok(integer_quadratic_roots(ai, bi, ci))
      } else {
        Ok(float_quadratic_roots(an.to_f64(), bn.to_f64(), cn.to_f64()))
      }
    }
    // Symbolic coefficients: general formula with a symbolic discriminant
    _ => {
      let disc = simplify(Expr::binary(
        BinaryOperator::Minus,
        Expr::binary(BinaryOperator::Power, b.clone(), Expr::Integer(2)),
        Expr::binary(
          BinaryOperator::Times,
          Expr::Integer(4),
          Expr::binary(BinaryOperator::Times, a.clone(), c.clone()),
        ),
      ));
      let sqrt_disc = Expr::call("sqrt", vec![expand_and_combine(&disc)]);
      let neg_b = negate_term(&b);
      let two_a = simplify(Expr::binary(BinaryOperator::Times, Expr::Integer(2), a.clone()));
      let minus = simplify(solve_divide(
        &Expr::binary(BinaryOperator::Minus, neg_b.clone(), sqrt_disc.clone()),
        &two_a,
      ));
      let plus = simplify(solve_divide(
        &Expr::binary(BinaryOperator::Plus, neg_b, sqrt_disc),
        &two_a,
      ));
      Ok(vec![minus, plus])
    }
  }
}

/// Roots of an integer-coefficient quadratic in exact form.
fn integer_quadratic_roots(a: i128, b: i128, c: i128) -> Vec<Expr> {
  let disc = b * b - 4 * a * c;

  if disc >= 0 {
    let (sqrt_out, sqrt_in) = simplify_sqrt_parts(disc);
    if sqrt_in == 1 {
      // Perfect square discriminant: rational roots
      return vec![
        make_rational(-b - sqrt_out, 2 * a),
        make_rational(-b + sqrt_out, 2 * a),
      ];
    }
    // Irrational roots: (-b ± k*sqrt(m)) / (2a), reduced by the common gcd
    let g = gcd_i128(gcd_i128(-b, sqrt_out), 2 * a).max(1);
    let (mut nb, mut so, mut den) = (-b / g, sqrt_out / g, 2 * a / g);
    if den < 0 {
      nb = -nb;
      so = -so;
      den = -den;
    }
    let sqrt_part = if so == 1 {
      Expr::call("sqrt", vec![Expr::Integer(sqrt_in)])
    } else {
      Expr::binary(
        BinaryOperator::Times,
        Expr::Integer(so),
        Expr::call("sqrt", vec![Expr::Integer(sqrt_in)]),
      )
    };
    let make_root = |sign_minus: bool| -> Expr {
      let num = if nb == 0 {
        if sign_minus {
          negate_term(&sqrt_part)
        } else {
          sqrt_part.clone()
        }
      } else {
        Expr::binary(
          if sign_minus {
            BinaryOperator::Minus
          } else {
            BinaryOperator::Plus
          },
          Expr::Integer(nb),
          sqrt_part.clone(),
        )
      };
      if den == 1 {
        num
      } else {
        Expr::binary(BinaryOperator::Divide, num, Expr::Integer(den))
      }
    };
    return vec![make_root(true), make_root(false)];
  }

  // Negative discriminant: the conjugate pair (-b ± sqrt(disc)) / (2a).
  // sqrt of a negative integer never folds, so the realness filter
  // rejects these.
  let sqrt_disc = Expr::call("sqrt", vec![Expr::Integer(disc)]);
  let make_root = |sign_minus: bool| -> Expr {
    let num = if b == 0 {
      if sign_minus {
        negate_term(&sqrt_disc)
      } else {
        sqrt_disc.clone()
      }
    } else {
      Expr::binary(
        if sign_minus {
          BinaryOperator::Minus
        } else {
          BinaryOperator::Plus
        },
        Expr::Integer(-b),
        sqrt_disc.clone(),
      )
    };
    Expr::binary(BinaryOperator::Divide, num, Expr::Integer(2 * a))
  };
  vec![make_root(true), make_root(false)]
}

/// Roots of a float-coefficient quadratic.
fn float_quadratic_roots(a: f64, b: f64, c: f64) -> Vec<Expr> {
  let disc = b * b - 4.0 * a * c;
  if disc >= 0.0 {
    let s = disc.sqrt();
    vec![
      Expr::Real((-b - s) / (2.0 * a)),
      Expr::Real((-b + s) / (2.0 * a)),
    ]
  } else {
    // Leave the non-real pair symbolic; it approximates to NaN
    let sqrt_disc = Expr::call("sqrt", vec![Expr::Real(disc)]);
    vec![
      Expr::binary(
        BinaryOperator::Divide,
        Expr::binary(BinaryOperator::Minus, Expr::Real(-b), sqrt_disc.clone()),
        Expr::Real(2.0 * a),
      ),
      Expr::binary(
        BinaryOperator::Divide,
        Expr::binary(BinaryOperator::Plus, Expr::Real(-b), sqrt_disc),
        Expr::Real(2.0 * a),
      ),
    ]
  }
}

/// Divide two expressions symbolically, folding numeric cases.
pub fn solve_divide(num: &Expr, den: &Expr) -> Expr {
  if let (Some(n), Some(d)) = (as_number(num), as_number(den)) {
    if let Some(q) = n.checked_div(d) {
      return num_to_expr(q);
    }
  }
  match (num, den) {
    (Expr::Integer(0), _) => Expr::Integer(0),
    (_, Expr::Integer(1)) => num.clone(),
    _ => Expr::binary(BinaryOperator::Divide, num.clone(), den.clone()),
  }
}

// ─── System solving by elimination ──────────────────────────────────

/// Solve the simultaneous system `eq == 0` for all equations over `vars`.
///
/// Strategy (variable elimination): normalize every equation to a
/// polynomial by clearing denominators, pick the lowest-degree equation
/// that mentions an unsolved variable, solve it univariately, substitute
/// each root into the rest, recurse, then back-substitute. Roots that
/// zero a cleared denominator are discarded.
///
/// Returns the solution set as (variable, value) assignment lists; an
/// empty list means the system is inconsistent, a single empty assignment
/// means it is trivially satisfied.
pub fn solve_system(
  equations: &[Expr],
  vars: &[String],
) -> Result<Vec<Vec<(String, Expr)>>, EngineError> {
  // Normalize: clear denominators, drop trivially-satisfied equations
  let mut polys: Vec<(Expr, Expr)> = Vec::new();
  for eq in equations {
    let (num, den) = as_fraction(&simplify(eq.clone()));
    let poly = expand_and_combine(&num);
    if is_zero_expr(&poly) {
      continue;
    }
    if !vars.iter().any(|v| contains_identifier(&poly, v)) {
      // A nonzero constant equation: the system is inconsistent
      return Ok(Vec::new());
    }
    polys.push((poly, den));
  }

  if polys.is_empty() {
    return Ok(vec![Vec::new()]);
  }

  // Pick the (equation, variable) pair of lowest degree, linear preferred
  let mut choice: Option<(usize, usize, i128)> = None;
  for (i, (poly, _)) in polys.iter().enumerate() {
    for (j, var) in vars.iter().enumerate() {
      if !contains_identifier(poly, var) {
        continue;
      }
      if let Some(d) = max_power(poly, var) {
        let better = match choice {
          None => true,
          Some((_, _, best)) => d < best,
        };
        if better {
          choice = Some((i, j, d));
        }
      }
    }
  }
  let (eq_idx, var_idx, _) = choice.ok_or_else(|| {
    EngineError::SolverError(format!(
      "cannot isolate any of [{}] in the stationary system",
      vars.join(", ")
    ))
  })?;
  let var = vars[var_idx].clone();
  let (poly, den) = polys[eq_idx].clone();

  let roots = solve_univariate(&poly, &var)?;
  let rest_vars: Vec<String> = vars
    .iter()
    .filter(|v| **v != var)
    .cloned()
    .collect();

  let mut solutions: Vec<Vec<(String, Expr)>> = Vec::new();
  for root in roots {
    // The cleared denominator must not vanish at the root
    if !matches!(den, Expr::Integer(1)) {
      let den_at = simplify(substitute_variable(&den, &var, &root));
      if let Some(v) = expr_to_f64(&den_at) {
        if v.abs() < 1e-12 {
          continue;
        }
      }
    }

    let remaining: Vec<Expr> = polys
      .iter()
      .enumerate()
      .filter(|(i, _)| *i != eq_idx)
      .map(|(_, (p, _))| simplify(substitute_variable(p, &var, &root)))
      .collect();

    for partial in solve_system(&remaining, &rest_vars)? {
      // Back-substitute the partial solution into this root
      let mut value = root.clone();
      for (name, v) in &partial {
        value = substitute_variable(&value, name, v);
      }
      let value = simplify(expand_and_combine(&value));
      let mut assignment = partial;
      assignment.push((var.clone(), value));
      solutions.push(assignment);
    }
  }

  // Deduplicate coincident solutions
  let mut seen = HashSet::new();
  solutions.retain(|sol| {
    let mut parts: Vec<String> = sol
      .iter()
      .map(|(name, v)| format!("{}={}", name, expr_to_string(v)))
      .collect();
    parts.sort();
    seen.insert(parts.join(","))
  });
  Ok(solutions)
}

/// Is the (already combined) polynomial identically zero?
pub fn is_zero_expr(expr: &Expr) -> bool {
  if matches!(expr, Expr::Integer(0)) {
    return true;
  }
  match expr_to_f64(expr) {
    Some(v) => v.abs() < 1e-12,
    None => false,
  }
}
