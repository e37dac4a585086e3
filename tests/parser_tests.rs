use extrema::{EngineError, Expr, expr_to_string, parse_expression};

fn parsed(text: &str, vars: &[&str]) -> String {
  expr_to_string(&parse_expression(text, vars).unwrap())
}

mod round_trips {
  use super::*;

  #[test]
  fn sum_of_power_and_product() {
    assert_eq!(parsed("x**2 + 4*x", &["x"]), "x**2 + 4*x");
  }

  #[test]
  fn parenthesized_sum_in_product() {
    assert_eq!(parsed("2*(x + 1)", &["x"]), "2*(x + 1)");
  }

  #[test]
  fn leading_minus_binds_below_power() {
    assert_eq!(parsed("-x**2 + 4*x", &["x"]), "-x**2 + 4*x");
  }

  #[test]
  fn two_variables() {
    assert_eq!(parsed("x*y + y**2", &["x", "y"]), "x*y + y**2");
  }

  #[test]
  fn division_chain_is_left_associative() {
    assert_eq!(parsed("x/2/3", &["x"]), "x/2/3");
  }

  #[test]
  fn quotient_of_sum_keeps_parens() {
    assert_eq!(parsed("(x + 1)/2", &["x"]), "(x + 1)/2");
  }

  #[test]
  fn unary_minus_inside_product() {
    assert_eq!(parsed("2*-x", &["x"]), "2*(-x)");
  }

  #[test]
  fn caret_is_power_too() {
    assert_eq!(parsed("x^2", &["x"]), "x**2");
  }

  #[test]
  fn function_calls() {
    assert_eq!(parsed("sin(x) + cos(2*x)", &["x"]), "sin(x) + cos(2*x)");
    assert_eq!(parsed("sqrt(x + 1)", &["x"]), "sqrt(x + 1)");
  }

  #[test]
  fn scientific_notation() {
    assert_eq!(parsed("1e3*x", &["x"]), "1000*x");
  }
}

mod precedence {
  use super::*;
  use extrema::calculus::simplify;

  #[test]
  fn power_is_right_associative() {
    let expr = parse_expression("2**3**2", &["x"]).unwrap();
    assert_eq!(simplify(expr), Expr::Integer(512));
  }

  #[test]
  fn product_binds_tighter_than_sum() {
    let expr = parse_expression("1 + 2*3", &["x"]).unwrap();
    assert_eq!(simplify(expr), Expr::Integer(7));
  }

  #[test]
  fn exact_fraction_arithmetic() {
    let expr = parse_expression("1/3 + 1/6", &["x"]).unwrap();
    assert_eq!(simplify(expr), Expr::Rational(1, 2));
  }

  #[test]
  fn unary_minus_applies_to_whole_power() {
    // -2**2 is -(2**2), not (-2)**2
    let expr = parse_expression("-2**2", &["x"]).unwrap();
    assert_eq!(simplify(expr), Expr::Integer(-4));
  }
}

mod constants {
  use super::*;
  use extrema::numeric::expr_to_f64;

  #[test]
  fn pi_is_a_known_constant() {
    let expr = parse_expression("2*pi", &["x"]).unwrap();
    let value = expr_to_f64(&expr).unwrap();
    assert!((value - 2.0 * std::f64::consts::PI).abs() < 1e-12);
  }

  #[test]
  fn declared_variable_shadows_constant() {
    let expr = parse_expression("e", &["e"]).unwrap();
    assert_eq!(expr, Expr::Identifier("e".to_string()));
  }

  #[test]
  fn undeclared_e_is_eulers_number() {
    let expr = parse_expression("e", &["x"]).unwrap();
    assert_eq!(expr, Expr::Constant("e".to_string()));
  }
}

mod rejections {
  use super::*;

  #[test]
  fn malformed_input() {
    let err = parse_expression("x +", &["x"]).unwrap_err();
    assert!(matches!(err, EngineError::ParseError(_)));
  }

  #[test]
  fn implicit_multiplication() {
    assert!(matches!(
      parse_expression("2x", &["x"]),
      Err(EngineError::ParseError(_))
    ));
  }

  #[test]
  fn undeclared_symbol() {
    let err = parse_expression("x + y", &["x"]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidExpression(_)));
    assert!(err.to_string().contains("unknown symbol `y`"));
  }

  #[test]
  fn unknown_function() {
    let err = parse_expression("foo(x)", &["x"]).unwrap_err();
    assert!(err.to_string().contains("unknown function `foo`"));
  }

  #[test]
  fn wrong_arity() {
    let err = parse_expression("sin(x, x)", &["x"]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidExpression(_)));
  }

  #[test]
  fn empty_variable_list() {
    assert!(matches!(
      parse_expression("1 + 1", &[]),
      Err(EngineError::InvalidExpression(_))
    ));
  }

  #[test]
  fn invalid_variable_name() {
    assert!(matches!(
      parse_expression("x", &["2x"]),
      Err(EngineError::InvalidExpression(_))
    ));
  }

  #[test]
  fn duplicate_variable_names() {
    assert!(matches!(
      parse_expression("x", &["x", "x"]),
      Err(EngineError::InvalidExpression(_))
    ));
  }
}
