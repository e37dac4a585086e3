use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use extrema::{
  Direction, DomainFilter, OptimizationResult, Variable, build_from_template, derivative,
  evaluate_at, expr_to_string, format_assignment, optimize, parse_expression, template_ids,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
  Max,
  Min,
}

impl From<DirectionArg> for Direction {
  fn from(arg: DirectionArg) -> Self {
    match arg {
      DirectionArg::Max => Direction::Maximize,
      DirectionArg::Min => Direction::Minimize,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Print the partial derivative(s) of an expression
  Derivative {
    /// The expression to differentiate, e.g. "x**2 + 4*x"
    expression: String,
    /// Comma-separated variable names
    #[arg(long, value_delimiter = ',', default_value = "x")]
    vars: Vec<String>,
  },
  /// Find the optimum of an expression over its stationary points
  Optimize {
    /// The objective expression, e.g. "-x**2 + 4*x"
    expression: String,
    /// Comma-separated variable names
    #[arg(long, value_delimiter = ',', default_value = "x")]
    vars: Vec<String>,
    #[arg(long, value_enum, default_value_t = DirectionArg::Max)]
    direction: DirectionArg,
    /// Keep non-real stationary points instead of filtering them out
    #[arg(long)]
    allow_complex: bool,
  },
  /// Solve a word-problem template
  Template {
    /// Template id (area-fixed-perimeter, perimeter-fixed-area,
    /// open-box-volume, profit-linear)
    id: String,
    /// Named numeric parameter, repeatable: --param P=40
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
    #[arg(long, value_enum, default_value_t = DirectionArg::Max)]
    direction: DirectionArg,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Commands::Derivative { expression, vars } => {
      let names: Vec<&str> = vars.iter().map(|s| s.trim()).collect();
      let expr = parse_expression(&expression, &names)?;
      for name in &names {
        let d = derivative(&expr, name)?;
        println!("d/d{} = {}", name, expr_to_string(&d));
      }
    }
    Commands::Optimize {
      expression,
      vars,
      direction,
      allow_complex,
    } => {
      let names: Vec<&str> = vars.iter().map(|s| s.trim()).collect();
      let expr = parse_expression(&expression, &names)?;
      let variables: Vec<Variable> = names
        .iter()
        .map(|n| {
          if allow_complex {
            Variable::unrestricted(n)
          } else {
            Variable::real(n)
          }
        })
        .collect();
      let filter = if allow_complex {
        DomainFilter::Unrestricted
      } else {
        DomainFilter::RealOnly
      };
      match optimize(&expr, &variables, direction.into(), filter)? {
        OptimizationResult::Selected {
          assignment,
          objective_value,
        } => {
          let label = match direction {
            DirectionArg::Max => "Maximum",
            DirectionArg::Min => "Minimum",
          };
          println!(
            "{} at {} with value {}",
            label,
            format_assignment(&assignment),
            expr_to_string(&objective_value)
          );
        }
        OptimizationResult::NoSolution => println!("No critical points found."),
      }
    }
    Commands::Template {
      id,
      params,
      direction,
    } => {
      let params = parse_params(&params)?;
      let problem = build_from_template(&id, &params)
        .with_context(|| format!("available templates: {}", template_ids().join(", ")))?;
      let vars = [problem.variable.clone()];
      match optimize(&problem.objective, &vars, direction.into(), DomainFilter::RealOnly)? {
        OptimizationResult::Selected {
          assignment,
          objective_value,
        } => {
          let mut parts = vec![format_assignment(&assignment)];
          for (name, expr) in &problem.derived {
            let value = evaluate_at(expr, &assignment);
            parts.push(format!("{} = {}", name, expr_to_string(&value)));
          }
          let label = match direction {
            DirectionArg::Max => "maximum",
            DirectionArg::Min => "minimum",
          };
          parts.push(format!(
            "{} {} = {}",
            problem.objective_name,
            label,
            expr_to_string(&objective_value)
          ));
          println!("{}", parts.join(", "));
        }
        OptimizationResult::NoSolution => println!("No critical points found."),
      }
    }
  }

  Ok(())
}

fn parse_params(params: &[String]) -> Result<HashMap<String, f64>> {
  let mut map = HashMap::new();
  for param in params {
    let Some((name, value)) = param.split_once('=') else {
      bail!("parameter `{}` must have the form NAME=VALUE", param);
    };
    let value: f64 = value
      .trim()
      .parse()
      .with_context(|| format!("parameter `{}` has a non-numeric value", name))?;
    map.insert(name.trim().to_string(), value);
  }
  Ok(map)
}
