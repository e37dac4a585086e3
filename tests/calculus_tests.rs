use extrema::{derivative, expr_to_string, parse_expression};

fn diff(text: &str, var: &str) -> String {
  let expr = parse_expression(text, &["x", "y"]).unwrap();
  expr_to_string(&derivative(&expr, var).unwrap())
}

mod polynomials {
  use super::*;

  #[test]
  fn d_x_squared() {
    assert_eq!(diff("x**2", "x"), "2*x");
  }

  #[test]
  fn d_x_squared_plus_x() {
    assert_eq!(diff("x**2 + x", "x"), "1 + 2*x");
  }

  #[test]
  fn d_cubic() {
    assert_eq!(diff("x**3", "x"), "3*x**2");
  }

  #[test]
  fn d_cubic_minus_linear() {
    assert_eq!(diff("x**3 - 3*x", "x"), "-3 + 3*x**2");
  }

  #[test]
  fn d_constant() {
    assert_eq!(diff("5", "x"), "0");
  }

  #[test]
  fn d_product_form() {
    // d/dx[x*(20 - x)] = 20 - 2x
    assert_eq!(diff("x*(20 - x)", "x"), "20 - 2*x");
  }

  #[test]
  fn d_scaled_power() {
    // the constant denominator folds into the coefficient
    assert_eq!(diff("x**4/4", "x"), "x**3");
  }

  #[test]
  fn second_derivative() {
    let expr = parse_expression("x**3", &["x"]).unwrap();
    let first = derivative(&expr, "x").unwrap();
    let second = derivative(&first, "x").unwrap();
    assert_eq!(expr_to_string(&second), "6*x");
  }
}

mod quotients {
  use super::*;

  #[test]
  fn d_reciprocal() {
    // d/dx[2*(x + 100/x)] = 2 - 200/x^2
    assert_eq!(diff("2*(x + 100/x)", "x"), "2 - 200/x**2");
  }

  #[test]
  fn d_log_of_sum() {
    assert_eq!(diff("log(1 + x)", "x"), "1/(1 + x)");
  }
}

mod transcendental {
  use super::*;

  #[test]
  fn d_sin() {
    assert_eq!(diff("sin(x)", "x"), "cos(x)");
  }

  #[test]
  fn d_cos() {
    assert_eq!(diff("cos(x)", "x"), "-sin(x)");
  }

  #[test]
  fn d_tan() {
    assert_eq!(diff("tan(x)", "x"), "1/cos(x)**2");
  }

  #[test]
  fn d_exp_with_chain_rule() {
    assert_eq!(diff("exp(2*x)", "x"), "2*exp(2*x)");
  }

  #[test]
  fn d_log() {
    assert_eq!(diff("log(x)", "x"), "1/x");
  }

  #[test]
  fn d_sqrt() {
    assert_eq!(diff("sqrt(x)", "x"), "1/(2*sqrt(x))");
  }
}

mod partials {
  use super::*;

  #[test]
  fn partial_wrt_first_variable() {
    assert_eq!(diff("x**2*y", "x"), "2*x*y");
  }

  #[test]
  fn partial_wrt_second_variable() {
    assert_eq!(diff("x**2*y", "y"), "x**2");
  }

  #[test]
  fn other_variables_are_constants() {
    assert_eq!(diff("y", "x"), "0");
  }
}
