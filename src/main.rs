// pascal2c: Pascal subset to C99 compiler

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser};
use crossterm::style::Stylize;
use log::{info, warn};

use pascal2c::diagnostics::use_color;
use pascal2c::{compile, CompileError, CompileOptions};

const DEFAULT_OUTPUT: &str = "target.c";

/// Translate Pascal programs into C99 source files.
#[derive(Debug, Parser)]
#[command(name = "pascal2c", disable_version_flag = true)]
struct Args {
    /// Pascal source files
    inputs: Vec<PathBuf>,

    /// Output file, used when there is a single input [default: target.c]
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Optimization level; 1 and above fold constant expressions
    #[arg(
        short = 'O',
        long = "opt-level",
        value_name = "LEVEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    opt_level: u8,

    /// Print version information and exit
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    version: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if args.version {
        println!("pascal2c {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.inputs.is_empty() {
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("{}", Args::command().render_usage());
        return ExitCode::FAILURE;
    }

    let options = CompileOptions::new(args.opt_level);
    let color = use_color();

    let jobs: Vec<(PathBuf, PathBuf)> = if let [input] = args.inputs.as_slice() {
        let output = args
            .output
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        vec![(input.clone(), output)]
    } else {
        if let Some(output) = &args.output {
            warn!(
                "ignoring --output {} with {} inputs; each writes <name>.c",
                output.display(),
                args.inputs.len()
            );
        }
        args.inputs
            .iter()
            .map(|input| (input.clone(), input.with_extension("c")))
            .collect()
    };

    let mut failed = 0;
    for (input, output) in &jobs {
        if !run(input, output, &options, color) {
            failed += 1;
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Compile one file, printing whatever went wrong. Returns success.
fn run(input: &Path, output: &Path, options: &CompileOptions, color: bool) -> bool {
    let file = input.display().to_string();

    let source = match fs::read_to_string(input) {
        Ok(source) => source,
        Err(source) => {
            let err = CompileError::Io {
                path: input.to_path_buf(),
                source,
            };
            return report(&file, &err, color);
        }
    };

    let result = compile(&source, options).and_then(|c| {
        fs::write(output, c).map_err(|source| CompileError::Io {
            path: output.to_path_buf(),
            source,
        })
    });

    match result {
        Ok(()) => {
            info!("wrote {}", output.display());
            true
        }
        Err(CompileError::Diagnostics(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprint!("{}", diagnostic.render(&file, &source, color));
            }
            eprintln!(
                "{}: {} error(s), no output written",
                file,
                diagnostics.len()
            );
            false
        }
        Err(err) => report(&file, &err, color),
    }
}

fn report(file: &str, err: &CompileError, color: bool) -> bool {
    let label = if color {
        "error".red().bold().to_string()
    } else {
        "error".to_string()
    };
    eprintln!("{}: {}: {}", file, label, err);
    false
}
