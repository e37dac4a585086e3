use std::collections::HashMap;

use extrema::{
  Direction, Domain, DomainFilter, EngineError, Expr, OptimizationResult, build_from_template,
  evaluate_at, expr_to_string, optimize,
};

fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
  pairs
    .iter()
    .map(|(name, value)| (name.to_string(), *value))
    .collect()
}

fn solve_template(
  id: &str,
  pairs: &[(&str, f64)],
  direction: Direction,
) -> (extrema::TemplateProblem, OptimizationResult) {
  let problem = build_from_template(id, &params(pairs)).unwrap();
  let vars = [problem.variable.clone()];
  let result = optimize(&problem.objective, &vars, direction, DomainFilter::RealOnly).unwrap();
  (problem, result)
}

mod area_fixed_perimeter {
  use super::*;

  #[test]
  fn objective_is_built_from_the_constraint() {
    let problem = build_from_template("area-fixed-perimeter", &params(&[("P", 40.0)])).unwrap();
    assert_eq!(expr_to_string(&problem.objective), "x*(20 - x)");
    assert_eq!(problem.variable.domain, Domain::PositiveReal);
  }

  #[test]
  fn perimeter_40_gives_the_10_by_10_square() {
    let (problem, result) = solve_template("area-fixed-perimeter", &[("P", 40.0)], Direction::Maximize);
    match result {
      OptimizationResult::Selected {
        assignment,
        objective_value,
      } => {
        assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(10))]);
        assert_eq!(objective_value, Expr::Integer(100));
        let (name, y) = &problem.derived[0];
        assert_eq!(name, "y");
        assert_eq!(evaluate_at(y, &assignment), Expr::Integer(10));
      }
      OptimizationResult::NoSolution => panic!("expected the square"),
    }
  }

  #[test]
  fn negative_perimeter_leaves_no_valid_point() {
    let (_, result) = solve_template("area-fixed-perimeter", &[("P", -8.0)], Direction::Maximize);
    assert_eq!(result, OptimizationResult::NoSolution);
  }
}

mod perimeter_fixed_area {
  use super::*;

  #[test]
  fn area_100_gives_the_10_by_10_square() {
    let (problem, result) =
      solve_template("perimeter-fixed-area", &[("L", 100.0)], Direction::Minimize);
    match result {
      OptimizationResult::Selected {
        assignment,
        objective_value,
      } => {
        assert_eq!(assignment, vec![("x".to_string(), Expr::Integer(10))]);
        assert_eq!(objective_value, Expr::Integer(40));
        let (_, y) = &problem.derived[0];
        assert_eq!(evaluate_at(y, &assignment), Expr::Integer(10));
      }
      OptimizationResult::NoSolution => panic!("expected the square"),
    }
  }

  #[test]
  fn objective_keeps_the_reciprocal_form() {
    let problem = build_from_template("perimeter-fixed-area", &params(&[("L", 100.0)])).unwrap();
    assert_eq!(expr_to_string(&problem.objective), "2*(x + 100/x)");
  }
}

mod open_box_volume {
  use super::*;

  #[test]
  fn square_sheet_folds_to_an_exact_rational_maximum() {
    let (_, result) = solve_template(
      "open-box-volume",
      &[("L", 10.0), ("W", 10.0)],
      Direction::Maximize,
    );
    match result {
      OptimizationResult::Selected {
        assignment,
        objective_value,
      } => {
        assert_eq!(assignment, vec![("x".to_string(), Expr::Rational(5, 3))]);
        assert_eq!(objective_value, Expr::Rational(2000, 27));
        assert_eq!(expr_to_string(&objective_value), "2000/27");
      }
      OptimizationResult::NoSolution => panic!("expected a maximum"),
    }
  }

  #[test]
  fn cut_depth_stays_below_half_the_short_side() {
    // The positivity filter plus the algebraic structure keep the fold
    // inside the sheet: for a 20x10 sheet the maximum is below 5.
    let (_, result) = solve_template(
      "open-box-volume",
      &[("L", 20.0), ("W", 10.0)],
      Direction::Maximize,
    );
    match result {
      OptimizationResult::Selected { assignment, .. } => {
        let x = extrema::numeric::expr_to_f64(&assignment[0].1).unwrap();
        assert!(x > 0.0 && x < 5.0);
      }
      OptimizationResult::NoSolution => panic!("expected a maximum"),
    }
  }
}

mod profit_linear {
  use super::*;

  #[test]
  fn linear_profit_has_no_interior_optimum() {
    let (_, result) = solve_template(
      "profit-linear",
      &[("price", 50.0), ("cost", 20.0), ("fixed", 100.0)],
      Direction::Maximize,
    );
    assert_eq!(result, OptimizationResult::NoSolution);
  }

  #[test]
  fn profit_variable_is_real_but_not_positivity_constrained() {
    let problem = build_from_template(
      "profit-linear",
      &params(&[("price", 50.0), ("cost", 20.0), ("fixed", 100.0)]),
    )
    .unwrap();
    assert_eq!(problem.variable.name, "q");
    assert_eq!(problem.variable.domain, Domain::Real);
    assert_eq!(problem.objective_name, "profit");
  }
}

mod validation {
  use super::*;

  #[test]
  fn unknown_template() {
    let err = build_from_template("golden-ratio", &params(&[])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter(_)));
  }

  #[test]
  fn missing_parameter() {
    let err = build_from_template("area-fixed-perimeter", &params(&[])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter(_)));
    assert!(err.to_string().contains("requires parameter `P`"));
  }

  #[test]
  fn non_finite_parameter() {
    let err =
      build_from_template("area-fixed-perimeter", &params(&[("P", f64::NAN)])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter(_)));
  }

  #[test]
  fn unknown_parameter() {
    let err = build_from_template(
      "area-fixed-perimeter",
      &params(&[("P", 40.0), ("Q", 1.0)]),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter(_)));
  }

  #[test]
  fn building_twice_yields_equal_but_fresh_problems() {
    let a = build_from_template("area-fixed-perimeter", &params(&[("P", 40.0)])).unwrap();
    let b = build_from_template("area-fixed-perimeter", &params(&[("P", 40.0)])).unwrap();
    assert_eq!(a, b);
  }
}
