use std::str::FromStr;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use pentagon_rs::*;

#[derive(Parser)]
#[command(author, version, about = "Analyze a small canned program with a numeric abstract domain")]
struct Cli {
    /// Abstract domain: sign, interval, upper-bounds or pentagon
    #[arg(short, long, default_value = "pentagon")]
    domain: DomainKind,

    /// Program: bounds, counter or branch
    #[arg(short, long, default_value = "bounds")]
    program: String,

    /// Join steps before widening
    #[arg(long, value_name = "INT")]
    widening_threshold: Option<usize>,

    /// Narrowing steps after stabilization
    #[arg(long, value_name = "INT")]
    narrowing_iterations: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: simplelog::LevelFilter,
}

#[derive(Debug, Clone, Copy)]
enum DomainKind {
    Sign,
    Interval,
    UpperBounds,
    Pentagon,
}

impl FromStr for DomainKind {
    type Err = DomainError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "sign" => Ok(DomainKind::Sign),
            "interval" => Ok(DomainKind::Interval),
            "upper-bounds" => Ok(DomainKind::UpperBounds),
            "pentagon" => Ok(DomainKind::Pentagon),
            _ => Err(DomainError::UnknownDomain { name: name.to_string() }),
        }
    }
}

fn var(name: &str) -> NumExpr {
    NumExpr::var(name)
}

fn lit(value: i64) -> NumExpr {
    NumExpr::constant(value)
}

/// Returns the program together with the property checked on its exit state.
fn program(name: &str) -> Result<(Stmt, NumPred)> {
    let program = match name {
        // assume(n > 0); i := n - 1; while (i >= 0) { assert(i < n); i := i - 1 }
        "bounds" => (
            Stmt::block([
                Stmt::Assume(var("n").gt(lit(0))),
                Stmt::assign("i", var("n").sub(lit(1))),
                Stmt::while_loop(
                    var("i").ge(lit(0)),
                    Stmt::block([
                        Stmt::Assert(var("i").lt(var("n"))),
                        Stmt::assign("i", var("i").sub(lit(1))),
                    ]),
                ),
            ]),
            var("i").lt(var("n")),
        ),
        // i := 0; while (i < 10) { i := i + 1 }
        "counter" => (
            Stmt::block([
                Stmt::assign("i", lit(0)),
                Stmt::while_loop(var("i").lt(lit(10)), Stmt::assign("i", var("i").add(lit(1)))),
            ]),
            var("i").eq(lit(10)),
        ),
        // assume(0 <= x <= 5); if (x < y) skip else y := 30
        "branch" => (
            Stmt::block([
                Stmt::Assume(var("x").ge(lit(0)).and(var("x").le(lit(5)))),
                Stmt::if_then_else(var("x").lt(var("y")), Stmt::Skip, Stmt::assign("y", lit(30))),
            ]),
            var("x").lt(var("y")),
        ),
        _ => return Err(eyre!("Unknown program: {}", name)),
    };
    Ok(program)
}

fn analyze<D>(transfer: &NumericTransferFunction, program: &Stmt, property: &NumPred)
where
    D: NumericDomain + Representable,
{
    let state: D = transfer.apply(&D::top(), program);
    println!("exit state = {}", state.representation());
    println!("{} is {}", property, state.satisfies(property));
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        cli.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut config = FixpointConfig::default();
    if let Some(threshold) = cli.widening_threshold {
        config.widening_threshold = threshold;
    }
    if let Some(iterations) = cli.narrowing_iterations {
        config.narrowing_iterations = iterations;
    }
    let transfer = NumericTransferFunction::new(config);

    let (stmt, property) = program(&cli.program)?;
    log::info!("Analyzing '{}' with the {:?} domain", cli.program, cli.domain);

    match cli.domain {
        DomainKind::Sign => analyze::<Environment<Sign>>(&transfer, &stmt, &property),
        DomainKind::Interval => analyze::<Environment<Interval>>(&transfer, &stmt, &property),
        DomainKind::UpperBounds => analyze::<UpperBoundsEnv>(&transfer, &stmt, &property),
        DomainKind::Pentagon => analyze::<Pentagon>(&transfer, &stmt, &property),
    }

    Ok(())
}
