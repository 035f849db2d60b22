//! Subcommand implementations.
//!
//! Each command reports its own errors on stderr and returns the process
//! exit code on failure.

use std::fs;
use std::path::Path;

use slate_common::Program;
use slate_frontend::TypedProgram;
use slate_vm::{VmConfig, VM};
use tracing::info;

/// Compile and execute a source file.
pub fn run(path: &Path, config: VmConfig) -> Result<(), i32> {
    let typed = analyze(path)?;
    let program = compile(&typed)?;

    let mut vm = VM::with_config(program, typed.locals_count(), config);
    match vm.execute() {
        Ok(Some(value)) => {
            println!("{value}");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
    }
}

/// Run the frontend only and summarize the program.
pub fn check(path: &Path) -> Result<(), i32> {
    let typed = analyze(path)?;
    println!(
        "OK: {} ({} statements, {} locals)",
        path.display(),
        typed.statements.len(),
        typed.locals_count()
    );
    Ok(())
}

/// Print the disassembly and constant pool of a source file.
pub fn disasm(path: &Path) -> Result<(), i32> {
    let typed = analyze(path)?;
    let program = compile(&typed)?;
    print!("{}", slate_compiler::disassemble(&program));
    if !program.constants.is_empty() {
        println!();
        println!("constants:");
        print!("{}", slate_compiler::render_constants(&program));
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        1
    })
}

fn analyze(path: &Path) -> Result<TypedProgram, i32> {
    let source = read_source(path)?;
    let typed = slate_frontend::analyze(&source).map_err(|e| {
        eprintln!("error: {}: {e}", path.display());
        1
    })?;
    info!(file = %path.display(), locals = typed.locals_count(), "analyzed");
    Ok(typed)
}

fn compile(typed: &TypedProgram) -> Result<Program, i32> {
    slate_compiler::compile(typed).map_err(|e| {
        eprintln!("error: code generation failed: {e}");
        2
    })
}
