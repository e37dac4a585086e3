//! Symbolic stationary-point optimization engine.
//!
//! Parses single- or multi-variable algebraic expressions (or builds them
//! from word-problem templates), computes symbolic derivatives, solves the
//! gradient system for its common zeros, filters the candidates by domain
//! rules, and selects the requested extremum — all in exact arithmetic.
//!
//! ```
//! use extrema::{optimize, parse_expression, Direction, DomainFilter,
//!   Expr, OptimizationResult, Variable};
//!
//! let expr = parse_expression("-x**2 + 4*x", &["x"]).unwrap();
//! let result = optimize(
//!   &expr,
//!   &[Variable::real("x")],
//!   Direction::Maximize,
//!   DomainFilter::RealOnly,
//! )
//! .unwrap();
//! match result {
//!   OptimizationResult::Selected { objective_value, .. } => {
//!     assert_eq!(objective_value, Expr::Integer(4));
//!   }
//!   OptimizationResult::NoSolution => unreachable!(),
//! }
//! ```

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod algebra;
pub mod builder;
pub mod calculus;
pub mod numeric;
pub mod optimize;
pub mod syntax;

#[derive(Parser)]
#[grammar = "expr.pest"]
pub struct ExprParser;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Invalid expression: {0}")]
  InvalidExpression(String),
  #[error("Invalid parameter: {0}")]
  InvalidParameter(String),
  #[error("Solver error: {0}")]
  SolverError(String),
}

impl ExprParser {
  pub fn parse_program(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

pub use builder::{TemplateProblem, build_from_template, parse_expression, template_ids};
pub use calculus::derivative;
pub use optimize::{
  Assignment, Direction, Domain, DomainFilter, OptimizationResult, Variable, evaluate_at,
  format_assignment, gradient, optimize, stationary_points,
};
pub use syntax::{Expr, expr_to_string};
