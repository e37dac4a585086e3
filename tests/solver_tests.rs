use extrema::{
  Direction, DomainFilter, EngineError, Expr, OptimizationResult, Variable, evaluate_at,
  expr_to_string, format_assignment, gradient, optimize, parse_expression, stationary_points,
};
use extrema::numeric::expr_to_f64;

fn run(
  text: &str,
  vars: &[Variable],
  direction: Direction,
) -> Result<OptimizationResult, EngineError> {
  let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
  let expr = parse_expression(text, &names).unwrap();
  optimize(&expr, vars, direction, DomainFilter::RealOnly)
}

fn selected(result: OptimizationResult) -> (Vec<(String, Expr)>, Expr) {
  match result {
    OptimizationResult::Selected {
      assignment,
      objective_value,
    } => (assignment, objective_value),
    OptimizationResult::NoSolution => panic!("expected a selected optimum"),
  }
}

mod single_variable {
  use super::*;

  #[test]
  fn downward_parabola_has_a_maximum() {
    let result = run("-x**2 + 4*x", &[Variable::real("x")], Direction::Maximize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(2))]);
    assert_eq!(value, Expr::Integer(4));
  }

  #[test]
  fn upward_parabola_has_a_minimum() {
    let result = run("x**2 - 4*x + 5", &[Variable::real("x")], Direction::Minimize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(2))]);
    assert_eq!(value, Expr::Integer(1));
  }

  #[test]
  fn selection_follows_the_requested_direction() {
    // x^3 - 3x has stationary points at x = -1 (value 2) and x = 1 (value -2)
    let max = run("x**3 - 3*x", &[Variable::real("x")], Direction::Maximize).unwrap();
    let (assignment, value) = selected(max);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(-1))]);
    assert_eq!(value, Expr::Integer(2));

    let min = run("x**3 - 3*x", &[Variable::real("x")], Direction::Minimize).unwrap();
    let (assignment, value) = selected(min);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(1))]);
    assert_eq!(value, Expr::Integer(-2));
  }

  #[test]
  fn linear_objective_has_no_stationary_point() {
    let result = run("3*x + 1", &[Variable::real("x")], Direction::Maximize).unwrap();
    assert_eq!(result, OptimizationResult::NoSolution);
  }

  #[test]
  fn constant_objective_has_no_stationary_point() {
    let result = run("7", &[Variable::real("x")], Direction::Maximize).unwrap();
    assert_eq!(result, OptimizationResult::NoSolution);
  }

  #[test]
  fn pure_power_has_its_stationary_point_at_zero() {
    let result = run("x**4", &[Variable::real("x")], Direction::Minimize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(0))]);
    assert_eq!(value, Expr::Integer(0));
  }

  #[test]
  fn irrational_points_keep_their_exact_form() {
    // d/dx[x^3/3 - 5x] = x^2 - 5, roots ±sqrt(5); the maximum is at -sqrt(5)
    let result = run("x**3/3 - 5*x", &[Variable::real("x")], Direction::Maximize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(format_assignment(&assignment), "x = -sqrt(5)");
    // 10*sqrt(5)/3, approximately 7.45
    let approx = expr_to_f64(&value).unwrap();
    assert!((approx - 10.0 * 5.0_f64.sqrt() / 3.0).abs() < 1e-9);
  }

  #[test]
  fn float_coefficients_survive() {
    let result = run("0.5*x**2 - x", &[Variable::real("x")], Direction::Minimize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(1))]);
    assert_eq!(value, Expr::Real(-0.5));
  }
}

mod multi_variable {
  use super::*;

  #[test]
  fn separable_quadratic_bowl() {
    let vars = [Variable::real("x"), Variable::real("y")];
    let result = run("x**2 + y**2 - 2*x - 4*y", &vars, Direction::Minimize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(
      assignment,
      vec![
        ("x".to_string(), Expr::Integer(1)),
        ("y".to_string(), Expr::Integer(2)),
      ]
    );
    assert_eq!(value, Expr::Integer(-5));
  }

  #[test]
  fn coupled_quadratic_form() {
    let vars = [Variable::real("x"), Variable::real("y")];
    let result = run("x**2 + x*y + y**2", &vars, Direction::Minimize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(
      assignment,
      vec![
        ("x".to_string(), Expr::Integer(0)),
        ("y".to_string(), Expr::Integer(0)),
      ]
    );
    assert_eq!(value, Expr::Integer(0));
  }

  #[test]
  fn unconstrained_variable_is_an_error() {
    // The gradient system of x^2 over (x, y) leaves y free
    let vars = [Variable::real("x"), Variable::real("y")];
    let err = run("x**2", &vars, Direction::Minimize).unwrap_err();
    assert!(matches!(err, EngineError::SolverError(_)));
    assert!(err.to_string().contains("unconstrained"));
  }
}

mod domain_filtering {
  use super::*;

  #[test]
  fn positivity_drops_negative_candidates() {
    let result = run("x**3 - 3*x", &[Variable::positive("x")], Direction::Maximize).unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(1))]);
    assert_eq!(value, Expr::Integer(-2));
  }

  #[test]
  fn complex_candidates_are_dropped_when_real_required() {
    // d/dx[x^3/3 + x] = x^2 + 1 has no real roots
    let result = run("x**3/3 + x", &[Variable::real("x")], Direction::Maximize).unwrap();
    assert_eq!(result, OptimizationResult::NoSolution);
  }

  #[test]
  fn complex_candidates_cannot_be_ordered() {
    let expr = parse_expression("x**3/3 + x", &["x"]).unwrap();
    let err = optimize(
      &expr,
      &[Variable::unrestricted("x")],
      Direction::Maximize,
      DomainFilter::Unrestricted,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::SolverError(_)));
  }

  #[test]
  fn rational_gradient_excludes_denominator_zeros() {
    // d/dx[2(x + 100/x)] = 2 - 200/x^2: roots ±10, x=0 is outside the domain
    let result = run(
      "2*(x + 100/x)",
      &[Variable::positive("x")],
      Direction::Minimize,
    )
    .unwrap();
    let (assignment, value) = selected(result);
    assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(10))]);
    assert_eq!(value, Expr::Integer(40));
  }
}

mod solver_contract {
  use super::*;

  #[test]
  fn gradient_vanishes_at_every_stationary_point() {
    let expr = parse_expression("x**3 - 3*x", &["x"]).unwrap();
    let vars = [Variable::real("x")];
    let points = stationary_points(&expr, &vars).unwrap();
    assert_eq!(points.len(), 2);
    let grad = gradient(&expr, &vars).unwrap();
    for point in &points {
      for component in &grad {
        let residual = expr_to_f64(&evaluate_at(component, point)).unwrap();
        assert!(residual.abs() < 1e-9, "gradient residual {}", residual);
      }
    }
  }

  #[test]
  fn gradient_vanishes_exactly_for_rational_points() {
    let expr = parse_expression("-x**2 + 4*x", &["x"]).unwrap();
    let vars = [Variable::real("x")];
    let points = stationary_points(&expr, &vars).unwrap();
    assert_eq!(points.len(), 1);
    let grad = gradient(&expr, &vars).unwrap();
    assert_eq!(evaluate_at(&grad[0], &points[0]), Expr::Integer(0));
  }

  #[test]
  fn selected_maximum_dominates_all_candidates() {
    let expr = parse_expression("x**3 - 3*x", &["x"]).unwrap();
    let vars = [Variable::real("x")];
    let points = stationary_points(&expr, &vars).unwrap();
    let result = optimize(&expr, &vars, Direction::Maximize, DomainFilter::RealOnly).unwrap();
    let (_, value) = super::selected(result);
    let best = expr_to_f64(&value).unwrap();
    for point in &points {
      let candidate = expr_to_f64(&evaluate_at(&expr, point)).unwrap();
      assert!(best >= candidate);
    }
  }

  #[test]
  fn identical_inputs_give_identical_results() {
    let expr = parse_expression("x**3 - 3*x", &["x"]).unwrap();
    let vars = [Variable::real("x")];
    let first = optimize(&expr, &vars, Direction::Maximize, DomainFilter::RealOnly).unwrap();
    let second = optimize(&expr, &vars, Direction::Maximize, DomainFilter::RealOnly).unwrap();
    assert_eq!(first, second);
  }
}

mod failures {
  use super::*;

  #[test]
  fn transcendental_gradient_is_a_solver_error() {
    let err = run("sin(x)", &[Variable::real("x")], Direction::Maximize).unwrap_err();
    assert!(matches!(err, EngineError::SolverError(_)));
  }

  #[test]
  fn unsupported_degree_is_a_solver_error() {
    // d/dx[x^5 - 5x] = 5x^4 - 5: degree 4 with no factorable power
    let err = run("x**5 - 5*x", &[Variable::real("x")], Direction::Maximize).unwrap_err();
    assert!(matches!(err, EngineError::SolverError(_)));
  }

  #[test]
  fn solver_errors_carry_a_description() {
    let err = run("sin(x)", &[Variable::real("x")], Direction::Maximize).unwrap_err();
    assert!(err.to_string().starts_with("Solver error:"));
  }
}

mod display {
  use super::*;

  #[test]
  fn assignments_format_as_name_value_pairs() {
    let vars = [Variable::real("x"), Variable::real("y")];
    let result = run("x**2 + y**2 - 2*x - 4*y", &vars, Direction::Minimize).unwrap();
    let (assignment, _) = selected(result);
    assert_eq!(format_assignment(&assignment), "x = 1, y = 2");
  }

  #[test]
  fn gradient_components_display_cleanly() {
    let expr = parse_expression("x**2 + x*y + y**2", &["x", "y"]).unwrap();
    let vars = [Variable::real("x"), Variable::real("y")];
    let grad = gradient(&expr, &vars).unwrap();
    let rendered: Vec<String> = grad.iter().map(expr_to_string).collect();
    assert_eq!(rendered, vec!["2*x + y", "x + 2*y"]);
  }
}
