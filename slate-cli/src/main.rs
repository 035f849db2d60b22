//! Slate CLI: check, disassemble, and run Slate programs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input, syntax, or semantic error
//! - 2: Code generation error
//! - 3: Runtime error

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use slate_vm::VmConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slate", version)]
#[command(about = "Compile and run Slate programs")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile and execute a program, printing its result
    Run {
        /// Source file
        file: PathBuf,

        /// Maximum operand stack depth (unbounded if omitted)
        #[arg(long)]
        max_stack: Option<usize>,

        /// Stop after this many instructions
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Parse, resolve, and type-check a program without running it
    Check {
        /// Source file
        file: PathBuf,
    },
    /// Print the bytecode and constant pool of a compiled program
    Disasm {
        /// Source file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Run {
            file,
            max_stack,
            max_steps,
        } => {
            let mut config = VmConfig::new();
            if let Some(depth) = max_stack {
                config = config.with_max_stack_depth(depth);
            }
            if let Some(steps) = max_steps {
                config = config.with_step_limit(steps);
            }
            commands::run(&file, config)
        }
        Command::Check { file } => commands::check(&file),
        Command::Disasm { file } => commands::disasm(&file),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
