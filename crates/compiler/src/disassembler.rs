//! Disassembler: compiled program → human-readable listing.
//!
//! One instruction per line: a zero-padded byte offset, the mnemonic, and
//! the operand. Bytes that do not decode are listed as `.byte` and the
//! listing resumes at the next byte.

use std::fmt::Write;

use slate_common::{Instruction, OperandKind, Program, Value};

/// Disassemble the instruction stream of `program`.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    for (at, decoded) in program.instructions() {
        let line = match decoded {
            Ok(instr) => render(program, at, &instr),
            Err(_) => format!("{at:04}  .byte 0x{:02x}", program.code[at]),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// List the constant pool, one entry per line.
pub fn render_constants(program: &Program) -> String {
    let mut out = String::new();
    for (index, value) in program.constants.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "#{index:<5} {:<10} {}", value.value_type().to_string(), literal(value));
    }
    out
}

fn render(program: &Program, at: usize, instr: &Instruction) -> String {
    let mnemonic = instr.opcode.mnemonic();
    let (Some(kind), Some(operand)) = (instr.opcode.operand_kind(), instr.operand) else {
        return format!("{at:04}  {mnemonic}");
    };

    match kind {
        OperandKind::Constant => {
            let shown = program
                .constants
                .get(operand as usize)
                .map_or_else(|| "<missing>".to_string(), literal);
            format!("{at:04}  {mnemonic:<11} #{operand:<5} ; {shown}")
        }
        OperandKind::Count | OperandKind::Slot => format!("{at:04}  {mnemonic:<11} {operand}"),
        OperandKind::Jump => {
            let offset = operand as i16;
            match instr.jump_target(at) {
                Some(target) => format!("{at:04}  {mnemonic:<11} {offset:+} -> {target:04}"),
                None => format!("{at:04}  {mnemonic:<11} {offset:+} -> <before start>"),
            }
        }
    }
}

/// Render a constant the way it would be written in source.
fn literal(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{:?}", s.as_str()),
        other => other.to_string(),
    }
}
