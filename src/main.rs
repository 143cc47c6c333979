use adaptive_expressions::cli::{self, CheckOptions, CheckResult, CliError};
use adaptive_expressions::output::{to_json, to_json_pretty};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "adx")]
#[command(about = "adx - evaluate and inspect adaptive expressions against JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an expression and evaluate it against JSON input
    Check {
        /// The expression to evaluate (a leading '=' is allowed)
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,

        /// Fail when a memory path does not exist
        #[arg(long)]
        strict: bool,
    },

    /// List the memory paths an expression reads
    Refs {
        /// The expression to analyze
        expression: String,
    },

    /// List the built-in function names
    Functions,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            input,
            pretty,
            syntax_only,
            strict,
        } => run_check(expression, input, pretty, syntax_only, strict),
        Commands::Refs { expression } => cli::execute_refs(&expression).map(|refs| {
            for path in refs {
                println!("{}", path);
            }
        }),
        Commands::Functions => {
            for name in cli::list_functions() {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
    strict: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer).filter(|b| !b.trim().is_empty())
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        input,
        syntax_only,
        strict,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(value) => {
            let json = if pretty { to_json_pretty(&value) } else { to_json(&value) };
            println!("{}", json);
        }
    }
    Ok(())
}
