use std::{fs::read_to_string, path::PathBuf, process::ExitCode, rc::Rc, time::Instant};

use clap::Parser as ClapParser;
use kyra::{
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse_with_max_depth,
    render_error,
    type_checker::type_checker::{type_check, CheckerConfig},
    DEFAULT_MAX_NESTING,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Type checks a Kyra source file and reports every error found.
#[derive(Debug, ClapParser)]
#[command(name = "kyra", version, about)]
struct Cli {
    /// Source file to check
    file: PathBuf,

    /// How deeply statements and expressions may nest
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    max_depth: usize,

    /// Print the typed program when checking succeeds
    #[arg(long)]
    dump_typed: bool,

    /// Print every committed declaration when checking succeeds
    #[arg(long)]
    dump_registry: bool,
}

fn main() -> ExitCode {
    // Logging is off unless KYRA_LOG is set, e.g. KYRA_LOG=kyra=trace
    if let Ok(filter) = EnvFilter::try_from_env("KYRA_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        debug!("tracing initialized");
    }

    let cli = Cli::parse();

    let source = match read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: could not read '{}': {}", cli.file.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());

    let start = Instant::now();

    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => return report(&[error], &source),
    };
    debug!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");

    let parse_start = Instant::now();
    let (_, program) = parse_with_max_depth(tokens, Rc::new(file_name), cli.max_depth);
    let program = match program {
        Ok(program) => program,
        Err(error) => return report(&[error], &source),
    };
    debug!(statements = program.body.len(), elapsed = ?parse_start.elapsed(), "parsed");

    let check_start = Instant::now();
    let config = CheckerConfig {
        max_depth: cli.max_depth,
    };
    let checked = match type_check(&program, config) {
        Ok(checked) => checked,
        Err(diagnostics) => return report(diagnostics.errors(), &source),
    };
    debug!(elapsed = ?check_start.elapsed(), total = ?start.elapsed(), "type checked");

    if cli.dump_typed {
        for stmt in &checked.statements {
            println!("{:#?}", stmt);
        }
    }

    if cli.dump_registry {
        for declaration in checked.registry.iter() {
            println!(
                "{} {}: {}",
                declaration.id,
                declaration.name,
                declaration.ty.qualified_name()
            );
        }
    }

    ExitCode::SUCCESS
}

fn report(errors: &[Error], source: &str) -> ExitCode {
    for error in errors {
        eprintln!("{}", render_error(error, source));
    }
    eprintln!(
        "{} error{} found",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    ExitCode::FAILURE
}
