use std::collections::HashMap;

use crate::calculus::simplify;
use crate::numeric::{Num, as_number, num_to_expr};
use crate::syntax::{BinaryOperator, Expr, UnaryOperator, expr_to_string};

use super::{add_exprs, collect_additive_terms};

// ─── Expand ─────────────────────────────────────────────────────────

/// Expand an expression and combine like terms.
pub fn expand_and_combine(expr: &Expr) -> Expr {
  let expanded = expand_expr(expr);
  let terms = collect_additive_terms(&expanded);
  combine_and_build(terms)
}

/// Recursively distribute products and positive integer powers of sums.
pub fn expand_expr(expr: &Expr) -> Expr {
  match expr {
    Expr::Integer(_)
    | Expr::Rational(_, _)
    | Expr::Real(_)
    | Expr::Constant(_)
    | Expr::Identifier(_) => expr.clone(),

    Expr::BinaryOp { op, left, right } => {
      let left_exp = expand_expr(left);
      let right_exp = expand_expr(right);
      match op {
        BinaryOperator::Plus | BinaryOperator::Minus => {
          Expr::binary(*op, left_exp, right_exp)
        }
        BinaryOperator::Times => distribute_product(&left_exp, &right_exp),
        BinaryOperator::Power => {
          // (sum)^n for positive integer n
          if let Expr::Integer(n) = &right_exp {
            if *n >= 2 && is_sum(&left_exp) {
              return expand_power(&left_exp, *n);
            }
          }
          simplify(Expr::binary(BinaryOperator::Power, left_exp, right_exp))
        }
        BinaryOperator::Divide => {
          // Constant denominators distribute over sums
          if as_number(&right_exp).is_some() && is_sum(&left_exp) {
            let terms = collect_additive_terms(&left_exp)
              .into_iter()
              .map(|t| Expr::binary(BinaryOperator::Divide, t, right_exp.clone()))
              .collect();
            build_sum(terms)
          } else {
            Expr::binary(BinaryOperator::Divide, left_exp, right_exp)
          }
        }
      }
    }

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      // Distribute the minus over sums
      let operand_exp = expand_expr(operand);
      let negated: Vec<Expr> = collect_additive_terms(&operand_exp)
        .into_iter()
        .map(|t| negate_term(&t))
        .collect();
      build_sum(negated)
    }

    // Function arguments stay as written
    Expr::FunctionCall { .. } => expr.clone(),
  }
}

/// Check if an expression is a sum.
pub fn is_sum(expr: &Expr) -> bool {
  matches!(
    expr,
    Expr::BinaryOp {
      op: BinaryOperator::Plus | BinaryOperator::Minus,
      ..
    }
  )
}

/// Distribute the product of two expanded expressions.
pub fn distribute_product(left: &Expr, right: &Expr) -> Expr {
  let left_terms = collect_additive_terms(left);
  let right_terms = collect_additive_terms(right);

  if left_terms.len() == 1 && right_terms.len() == 1 {
    return multiply_terms(&left_terms[0], &right_terms[0]);
  }

  let mut result_terms = Vec::new();
  for l in &left_terms {
    for r in &right_terms {
      result_terms.push(multiply_terms(l, r));
    }
  }
  build_sum(result_terms)
}

/// Multiply two non-sum terms (individual monomials).
pub fn multiply_terms(a: &Expr, b: &Expr) -> Expr {
  // Pull negations out front
  if let Expr::UnaryOp {
    op: UnaryOperator::Minus,
    operand,
  } = a
  {
    return negate_term(&multiply_terms(operand, b));
  }
  if let Expr::UnaryOp {
    op: UnaryOperator::Minus,
    operand,
  } = b
  {
    return negate_term(&multiply_terms(a, operand));
  }

  if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
    return num_to_expr(x * y);
  }

  // Merge quotients into a single fraction
  let (an, ad) = split_divide(a);
  let (bn, bd) = split_divide(b);
  if !matches!(ad, Expr::Integer(1)) || !matches!(bd, Expr::Integer(1)) {
    let num = multiply_terms(&an, &bn);
    let den = multiply_terms(&ad, &bd);
    return match den {
      Expr::Integer(1) => num,
      _ => Expr::binary(BinaryOperator::Divide, num, den),
    };
  }

  // Combine like bases: x * x^a → x^(a+1)
  let mut factors = collect_multiplicative_factors(a);
  factors.extend(collect_multiplicative_factors(b));
  combine_product_factors(factors)
}

fn split_divide(expr: &Expr) -> (Expr, Expr) {
  match expr {
    Expr::BinaryOp {
      op: BinaryOperator::Divide,
      left,
      right,
    } => ((**left).clone(), (**right).clone()),
    _ => (expr.clone(), Expr::Integer(1)),
  }
}

/// Combine multiplicative factors, merging like bases into powers.
pub fn combine_product_factors(factors: Vec<Expr>) -> Expr {
  // (sort key, base, exponent) in first-seen order
  let mut base_exps: Vec<(String, Expr, Expr)> = Vec::new();
  let mut numeric_coeff = Num::Exact(1, 1);

  for f in &factors {
    match as_number(f) {
      Some(n) => numeric_coeff = numeric_coeff * n,
      None => {
        let (base, exp) = extract_base_and_exp(f);
        let key = expr_to_string(&base);
        if let Some(entry) = base_exps.iter_mut().find(|(k, _, _)| *k == key) {
          entry.2 = add_exprs(&entry.2, &exp);
        } else {
          base_exps.push((key, base, exp));
        }
      }
    }
  }

  let mut result_factors: Vec<Expr> = Vec::new();
  if !numeric_coeff.is_one() {
    result_factors.push(num_to_expr(numeric_coeff));
  }

  for (_, base, exp) in base_exps {
    let exp = simplify(exp);
    match &exp {
      Expr::Integer(0) => continue,
      Expr::Integer(1) => result_factors.push(base),
      _ => result_factors.push(simplify(Expr::binary(BinaryOperator::Power, base, exp))),
    }
  }

  if result_factors.is_empty() {
    Expr::Integer(1)
  } else {
    build_product(result_factors)
  }
}

/// Extract base and exponent from a factor.
pub fn extract_base_and_exp(expr: &Expr) -> (Expr, Expr) {
  match expr {
    Expr::BinaryOp {
      op: BinaryOperator::Power,
      left,
      right,
    } => ((**left).clone(), (**right).clone()),
    _ => (expr.clone(), Expr::Integer(1)),
  }
}

/// Negate a term.
pub fn negate_term(t: &Expr) -> Expr {
  if let Some(n) = as_number(t) {
    return num_to_expr(-n);
  }
  match t {
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => (**operand).clone(),
    _ => Expr::negate(t.clone()),
  }
}

/// Expand `(sum)^n` by repeated distribution.
pub fn expand_power(base: &Expr, n: i128) -> Expr {
  if n == 0 {
    return Expr::Integer(1);
  }
  if n == 1 {
    return base.clone();
  }
  let mut result = base.clone();
  for _ in 1..n {
    result = distribute_product(&result, base);
    // Combine like terms to keep the intermediate sum small
    let terms = collect_additive_terms(&result);
    result = combine_and_build(terms);
  }
  result
}

/// Build a sum from terms.
pub fn build_sum(terms: Vec<Expr>) -> Expr {
  if terms.is_empty() {
    return Expr::Integer(0);
  }
  let mut iter = terms.into_iter();
  let mut result = iter.next().expect("non-empty");
  for t in iter {
    result = Expr::binary(BinaryOperator::Plus, result, t);
  }
  result
}

/// Build a product from factors.
pub fn build_product(factors: Vec<Expr>) -> Expr {
  if factors.is_empty() {
    return Expr::Integer(1);
  }
  let mut iter = factors.into_iter();
  let mut result = iter.next().expect("non-empty");
  for f in iter {
    result = Expr::binary(BinaryOperator::Times, result, f);
  }
  result
}

/// Combine like terms and sort: constants first, then ascending powers.
pub fn combine_and_build(terms: Vec<Expr>) -> Expr {
  // (sort key, variable factors, accumulated coefficient)
  let mut term_map: Vec<(String, Vec<Expr>, Expr)> = Vec::new();

  for term in &terms {
    let (coeff, var_key, var_factors) = decompose_term(term);
    if let Some(entry) = term_map.iter_mut().find(|(k, _, _)| *k == var_key) {
      entry.2 = add_exprs(&entry.2, &coeff);
    } else {
      term_map.push((var_key, var_factors, coeff));
    }
  }

  // Reverse-variable lexicographic ascending order; constants sort first
  // because all their exponents are zero.
  term_map.sort_by(|(ka, va, _), (kb, vb, _)| {
    match (ka.is_empty(), kb.is_empty()) {
      (true, true) => return std::cmp::Ordering::Equal,
      (true, false) => return std::cmp::Ordering::Less,
      (false, true) => return std::cmp::Ordering::Greater,
      _ => {}
    }
    let ea = extract_exponent_map(va);
    let eb = extract_exponent_map(vb);
    let mut all_vars: Vec<&String> = ea.keys().chain(eb.keys()).collect();
    all_vars.sort();
    all_vars.dedup();
    for var in all_vars.iter().rev() {
      let pa = ea.get(*var).copied().unwrap_or(0);
      let pb = eb.get(*var).copied().unwrap_or(0);
      if pa != pb {
        return pa.cmp(&pb);
      }
    }
    std::cmp::Ordering::Equal
  });

  let mut result_terms: Vec<Expr> = Vec::new();
  for (_, var_factors, coeff) in term_map {
    let coeff = simplify(coeff);
    if matches!(as_number(&coeff), Some(n) if n.is_zero()) {
      continue;
    }
    if var_factors.is_empty() {
      result_terms.push(coeff);
      continue;
    }
    match as_number(&coeff) {
      Some(n) if n.is_one() => result_terms.push(build_product(var_factors)),
      Some(n) if n.is_minus_one() => {
        result_terms.push(negate_term(&build_product(var_factors)))
      }
      _ => {
        let mut factors = vec![coeff];
        factors.extend(var_factors);
        result_terms.push(build_product(factors));
      }
    }
  }

  if result_terms.is_empty() {
    Expr::Integer(0)
  } else {
    build_sum(result_terms)
  }
}

/// Decompose a term into (numeric coefficient, sort key, variable factors).
/// E.g. `3*x^2*y` → `(3, "x**2*y", [x^2, y])`; `-x` → `(-1, "x", [x])`.
fn decompose_term(term: &Expr) -> (Expr, String, Vec<Expr>) {
  if as_number(term).is_some() {
    return (term.clone(), String::new(), vec![]);
  }
  match term {
    Expr::Identifier(_) | Expr::Constant(_) => {
      (Expr::Integer(1), expr_to_string(term), vec![term.clone()])
    }
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      let (c, k, v) = decompose_term(operand);
      (negate_term(&c), k, v)
    }
    Expr::BinaryOp {
      op: BinaryOperator::Times,
      ..
    } => {
      let factors = collect_multiplicative_factors(term);
      let mut numeric_coeff = Num::Exact(1, 1);
      let mut var_factors: Vec<Expr> = Vec::new();

      for f in &factors {
        match f {
          Expr::UnaryOp {
            op: UnaryOperator::Minus,
            operand,
          } => {
            numeric_coeff = -numeric_coeff;
            match as_number(operand) {
              Some(n) => numeric_coeff = numeric_coeff * n,
              None => var_factors.push((**operand).clone()),
            }
          }
          _ => match as_number(f) {
            Some(n) => numeric_coeff = numeric_coeff * n,
            None => var_factors.push(f.clone()),
          },
        }
      }

      var_factors.sort_by_key(expr_to_string);
      let key = var_factors
        .iter()
        .map(expr_to_string)
        .collect::<Vec<_>>()
        .join("*");
      (num_to_expr(numeric_coeff), key, var_factors)
    }
    Expr::BinaryOp {
      op: BinaryOperator::Divide,
      left,
      right,
    } => {
      // Numeric denominators fold into the coefficient
      if let Some(dn) = as_number(right) {
        let (c, k, v) = decompose_term(left);
        let coeff = match as_number(&c).and_then(|cn| cn.checked_div(dn)) {
          Some(q) => num_to_expr(q),
          None => Expr::binary(BinaryOperator::Divide, c, (**right).clone()),
        };
        return (coeff, k, v);
      }
      (Expr::Integer(1), expr_to_string(term), vec![term.clone()])
    }
    _ => (Expr::Integer(1), expr_to_string(term), vec![term.clone()]),
  }
}

/// Collect multiplicative factors from nested products.
pub fn collect_multiplicative_factors(expr: &Expr) -> Vec<Expr> {
  match expr {
    Expr::BinaryOp {
      op: BinaryOperator::Times,
      left,
      right,
    } => {
      let mut factors = collect_multiplicative_factors(left);
      factors.extend(collect_multiplicative_factors(right));
      factors
    }
    _ => vec![expr.clone()],
  }
}

/// Map of variable name → exponent for a list of variable factors.
fn extract_exponent_map(var_factors: &[Expr]) -> HashMap<String, i128> {
  let mut map = HashMap::new();
  for f in var_factors {
    match f {
      Expr::Identifier(name) => {
        *map.entry(name.clone()).or_insert(0) += 1;
      }
      Expr::BinaryOp {
        op: BinaryOperator::Power,
        left,
        right,
      } => {
        let name = expr_to_string(left);
        let exp = match right.as_ref() {
          Expr::Integer(n) => *n,
          _ => 1,
        };
        *map.entry(name).or_insert(0) += exp;
      }
      _ => {
        *map.entry(expr_to_string(f)).or_insert(0) += 1;
      }
    }
  }
  map
}
