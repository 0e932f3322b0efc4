use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regex_chess_compiler::demo::demo_program;
use regex_chess_compiler::driver::{compile, DEFAULT_MAX_ITERATIONS};
use regex_chess_compiler::rule::{Rule, RuleList};
use regex_chess_compiler::serialize::{to_js, to_json_string};

#[derive(Parser)]
#[command(author, version, about = "Compiles a traced reply-move program into an ordered regex rewrite-rule list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Route logs through `tracing-subscriber`'s `EnvFilter` (e.g. `-v`, or
    /// set `RUST_LOG=debug` directly).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the compiler pipeline (trace → linearize → assemble → serialize)
    /// against the built-in demo traced program and write the rule list.
    Compile {
        /// Output serialization format.
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Tracer iteration bound `K` (spec §4.G).
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Drive the §6 consumer-contract outer loop against a compiled JSON
    /// rule list: read a line, append it to the state, apply every rule
    /// once in order, print the state, until `Game over` appears.
    Run {
        /// Path to a JSON rule list produced by `compile --format json`.
        rules: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Js,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "regex_chess_compiler=debug"
    } else {
        "regex_chess_compiler=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Compile { format, output, max_iterations } => run_compile(format, output, max_iterations),
        Command::Run { rules } => run_runtime(rules),
    }
}

fn run_compile(format: Format, output: Option<PathBuf>, max_iterations: usize) -> Result<()> {
    let compiled = compile(demo_program, max_iterations).context("compiling demo program")?;
    tracing::info!(rule_count = compiled.rules.len(), "compiled demo program");

    let rendered = match format {
        Format::Json => to_json_string(&compiled.rules),
        Format::Js => to_js(&compiled.rules),
    };

    match output {
        Some(path) => fs::write(&path, rendered).with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn run_runtime(rules_path: PathBuf) -> Result<()> {
    let raw = fs::read_to_string(&rules_path).with_context(|| format!("reading {}", rules_path.display()))?;
    let pairs: Vec<(String, String)> =
        serde_json::from_str(&raw).with_context(|| format!("parsing rule list from {}", rules_path.display()))?;

    let mut rules = Vec::with_capacity(pairs.len());
    for (pattern, replacement) in pairs {
        rules.push(Rule::new(pattern, replacement).context("compiling rewrite rule")?);
    }
    let rules = RuleList(rules);

    let stdin = io::stdin();
    let mut state = String::new();
    let mut stdout = io::stdout().lock();

    // Mirrors `main.py`'s literal loop order (`while 'Game over' not in
    // state: ... ; print(...); state += input() + "\n"`): the check runs
    // before the apply/print/read, so a blocking read still happens once
    // more right after the board that first contains "Game over" is
    // printed, and only the following iteration's top check exits the loop.
    while !state.contains("Game over") {
        state = rules.apply_all(state);
        stdout.write_all(state.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            bail!("input closed before \"Game over\" appeared in the state");
        }
        let line = line.trim_end_matches('\n');
        state.push_str(line);
        state.push('\n');
    }
    Ok(())
}
