//! Integration tests for the Slate VM, driven by hand-assembled bytecode.
//!
//! Organized by concern: faults, locals, control flow, and the reference
//! counting of strings and arrays.

use std::rc::{Rc, Weak};

use proptest::prelude::*;
use slate_common::{ArrayValue, Instruction, Opcode, Program, StringValue, Value};
use slate_vm::{run, run_with_config, RuntimeError, VmConfig, VM};

// ============================================================
// Helper functions
// ============================================================

/// Assemble instructions into a program.
fn assemble(instrs: &[Instruction], constants: Vec<Value>) -> Program {
    let mut code = Vec::new();
    for instr in instrs {
        instr.encode_into(&mut code);
    }
    Program::new(code, constants)
}

/// PUSH of a constant pool entry.
fn push(index: u16) -> Instruction {
    Instruction::with_operand(Opcode::Push, index)
}

/// Instruction with an operand (slot, count, or jump offset).
fn with(opcode: Opcode, operand: u16) -> Instruction {
    Instruction::with_operand(opcode, operand)
}

/// Jump instruction with a signed offset.
fn jump(opcode: Opcode, offset: i16) -> Instruction {
    Instruction::with_operand(opcode, offset as u16)
}

fn op(opcode: Opcode) -> Instruction {
    Instruction::simple(opcode)
}

fn run_program(
    instrs: &[Instruction],
    constants: Vec<Value>,
    locals: usize,
) -> Result<Option<Value>, RuntimeError> {
    run(&assemble(instrs, constants), locals)
}

/// Execute instructions one at a time.
fn step_n(vm: &mut VM, n: usize) {
    for _ in 0..n {
        assert!(vm.step().unwrap());
    }
}

fn weak_str(value: &Value) -> Weak<StringValue> {
    match value {
        Value::Str(s) => Rc::downgrade(s),
        other => panic!("expected string, got {other:?}"),
    }
}

fn weak_array(value: &Value) -> Weak<ArrayValue> {
    match value {
        Value::Array(a) => Rc::downgrade(a),
        other => panic!("expected array, got {other:?}"),
    }
}

// ============================================================
// Faults
// ============================================================

#[test]
fn binary_op_on_empty_stack_underflows() {
    assert_eq!(
        run_program(&[op(Opcode::IAdd)], vec![], 0),
        Err(RuntimeError::StackUnderflow { at: 0 })
    );
}

#[test]
fn store_with_empty_stack_underflows() {
    assert_eq!(
        run_program(&[with(Opcode::IStore, 0)], vec![], 1),
        Err(RuntimeError::StackUnderflow { at: 0 })
    );
}

#[test]
fn store_to_slot_equal_to_locals_size_is_invalid() {
    assert_eq!(
        run_program(&[push(0), with(Opcode::IStore, 1)], vec![Value::Int(1)], 1),
        Err(RuntimeError::InvalidSlot {
            at: 3,
            slot: 1,
            size: 1
        })
    );
}

#[test]
fn load_from_slot_past_locals_is_invalid() {
    assert_eq!(
        run_program(&[with(Opcode::ILoad, 5)], vec![], 0),
        Err(RuntimeError::InvalidSlot {
            at: 0,
            slot: 5,
            size: 0
        })
    );
}

#[test]
fn unknown_opcode_is_reported_with_its_byte() {
    let program = Program::new(vec![Opcode::PushTrue as u8, 0xFF], vec![]);
    assert_eq!(
        run(&program, 0),
        Err(RuntimeError::UnknownOpcode { at: 1, byte: 0xFF })
    );
    let program = Program::new(vec![0x00], vec![]);
    assert_eq!(
        run(&program, 0),
        Err(RuntimeError::UnknownOpcode { at: 0, byte: 0x00 })
    );
}

#[test]
fn operand_cut_off_by_end_of_code() {
    let program = Program::new(vec![Opcode::Push as u8, 0x00], vec![Value::Int(1)]);
    assert_eq!(run(&program, 0), Err(RuntimeError::TruncatedOperand { at: 0 }));
}

#[test]
fn push_of_missing_constant() {
    assert_eq!(
        run_program(&[push(3)], vec![Value::Int(1)], 0),
        Err(RuntimeError::InvalidConstant {
            at: 0,
            index: 3,
            size: 1
        })
    );
}

#[test]
fn division_by_zero_reports_opcode_offset() {
    let consts = vec![Value::Int(10), Value::Int(0)];
    assert_eq!(
        run_program(&[push(0), push(1), op(Opcode::IDiv)], consts, 0),
        Err(RuntimeError::DivisionByZero { at: 6 })
    );
}

#[test]
fn modulo_by_zero() {
    let consts = vec![Value::Int(10), Value::Int(0)];
    assert_eq!(
        run_program(&[push(0), push(1), op(Opcode::IMod)], consts, 0),
        Err(RuntimeError::ModuloByZero { at: 6 })
    );
}

#[test]
fn integer_op_on_bools_is_a_type_mismatch() {
    let result = run_program(
        &[op(Opcode::PushTrue), op(Opcode::PushTrue), op(Opcode::IAdd)],
        vec![],
        0,
    );
    assert!(matches!(
        result,
        Err(RuntimeError::TypeMismatch { at: 2, expected: "int", .. })
    ));
}

#[test]
fn jmpn_requires_bool() {
    let result = run_program(&[push(0), jump(Opcode::Jmpn, 0)], vec![Value::Int(1)], 0);
    assert!(matches!(
        result,
        Err(RuntimeError::TypeMismatch { at: 3, expected: "bool", .. })
    ));
}

#[test]
fn index_into_non_array() {
    let consts = vec![Value::Int(1), Value::Int(0)];
    let result = run_program(&[push(0), push(1), op(Opcode::ArrLoadIdx)], consts, 0);
    assert!(matches!(
        result,
        Err(RuntimeError::TypeMismatch { at: 6, expected: "array", .. })
    ));
}

#[test]
fn fault_stops_execution() {
    let consts = vec![Value::Int(1), Value::Int(0), Value::Int(99)];
    let instrs = [
        push(0),
        push(1),
        op(Opcode::IDiv),
        push(2),
        with(Opcode::IStore, 0),
    ];
    let mut vm = VM::new(assemble(&instrs, consts), 1);
    assert!(vm.execute().is_err());
    assert_eq!(vm.locals(), &[Value::Int(0)]);
    assert_eq!(vm.pc(), 7);
}

// ============================================================
// Control flow
// ============================================================

#[test]
fn jump_past_end_is_out_of_bounds() {
    assert_eq!(
        run_program(&[jump(Opcode::Jmp, 5)], vec![], 0),
        Err(RuntimeError::JumpOutOfBounds { at: 0, target: 8 })
    );
}

#[test]
fn jump_before_start_is_out_of_bounds() {
    assert_eq!(
        run_program(&[jump(Opcode::Jmp, -4)], vec![], 0),
        Err(RuntimeError::JumpOutOfBounds { at: 0, target: -1 })
    );
}

#[test]
fn jump_to_end_of_code_finishes() {
    let instrs = [jump(Opcode::Jmp, 1), op(Opcode::PushTrue)];
    assert_eq!(run_program(&instrs, vec![], 0), Ok(None));
}

#[test]
fn jmpn_falls_through_on_true() {
    // PUSH_TRUE; JMPN +1; PUSH_FALSE
    let instrs = [
        op(Opcode::PushTrue),
        jump(Opcode::Jmpn, 1),
        op(Opcode::PushFalse),
    ];
    let mut vm = VM::new(assemble(&instrs, vec![]), 0);
    assert_eq!(vm.execute(), Ok(Some(Value::Bool(false))));
    assert!(vm.stack().is_empty());
}

#[test]
fn countdown_loop() {
    // n = 3; while (n > 0) n -= 1; n
    let consts = vec![Value::Int(3), Value::Int(0), Value::Int(1)];
    let instrs = [
        push(0),                   // 0
        with(Opcode::IStore, 0),   // 3
        with(Opcode::ILoad, 0),    // 6  loop start
        push(1),                   // 9
        op(Opcode::IGt),           // 12
        jump(Opcode::Jmpn, 9),     // 13 -> 25
        push(2),                   // 16
        with(Opcode::ISubStore, 0), // 19
        jump(Opcode::Jmp, -19),    // 22 -> 6
        with(Opcode::ILoad, 0),    // 25
    ];
    let config = VmConfig::new().with_step_limit(1_000);
    let result = run_with_config(&assemble(&instrs, consts), 1, config);
    assert_eq!(result, Ok(Some(Value::Int(0))));
}

#[test]
fn infinite_loop_hits_step_limit() {
    let config = VmConfig::new().with_step_limit(100);
    let result = run_with_config(&assemble(&[jump(Opcode::Jmp, -3)], vec![]), 0, config);
    assert_eq!(
        result,
        Err(RuntimeError::StepLimitExceeded { at: 0, limit: 100 })
    );
}

#[test]
fn runaway_push_overflows_the_stack() {
    // PUSH_TRUE; JMP -4
    let instrs = [op(Opcode::PushTrue), jump(Opcode::Jmp, -4)];
    let config = VmConfig::new().with_max_stack_depth(16);
    assert_eq!(
        run_with_config(&assemble(&instrs, vec![]), 0, config),
        Err(RuntimeError::StackOverflow { at: 0, depth: 16 })
    );
}

#[test]
fn step_reports_completion() {
    let mut vm = VM::new(assemble(&[op(Opcode::PushTrue)], vec![]), 0);
    assert!(vm.step().unwrap());
    assert!(vm.is_finished());
    assert!(!vm.step().unwrap());
    assert_eq!(vm.steps(), 1);
}

// ============================================================
// Arrays
// ============================================================

#[test]
fn element_write_is_visible_through_alias() {
    let consts = vec![Value::Int(1), Value::Int(2), Value::Int(0), Value::Int(9)];
    let instrs = [
        push(0),
        push(1),
        with(Opcode::PushArray, 2),
        with(Opcode::ArrStore, 0),
        // b = a
        with(Opcode::ArrLoad, 0),
        with(Opcode::ArrStore, 1),
        // b[0] = 9
        with(Opcode::ArrLoad, 1),
        push(2),
        push(3),
        op(Opcode::ArrStoreIdx),
        // a[0]
        with(Opcode::ArrLoad, 0),
        push(2),
        op(Opcode::ArrLoadIdx),
    ];
    let mut vm = VM::new(assemble(&instrs, consts), 2);
    assert_eq!(vm.execute(), Ok(Some(Value::Int(9))));
    assert_eq!(vm.locals()[0], vm.locals()[1]);
    assert_eq!(vm.locals()[0].ref_count(), Some(2));
}

#[test]
fn array_element_type_comes_from_elements() {
    let consts = vec![Value::string("x")];
    let result = run_program(&[push(0), with(Opcode::PushArray, 1)], consts, 0)
        .unwrap()
        .unwrap();
    assert_eq!(result.value_type().to_string(), "string[]");
}

// ============================================================
// Reference counting
// ============================================================

#[test]
fn repeated_store_of_constant_keeps_count_stable() {
    let mut instrs = Vec::new();
    for _ in 0..50 {
        instrs.push(push(0));
        instrs.push(with(Opcode::SStore, 0));
    }
    let mut vm = VM::new(assemble(&instrs, vec![Value::string("k")]), 1);
    assert_eq!(vm.execute(), Ok(None));
    // One reference from the pool, one from the slot.
    assert_eq!(vm.locals()[0].ref_count(), Some(2));
}

#[test]
fn reassignment_frees_the_previous_string() {
    let consts = vec![Value::string("a"), Value::string("b")];
    let instrs = [
        push(0),
        push(0),
        op(Opcode::SConcat),
        with(Opcode::SStore, 0),
        push(1),
        with(Opcode::SStore, 0),
    ];
    let mut vm = VM::new(assemble(&instrs, consts), 1);
    step_n(&mut vm, 4);
    let weak = weak_str(&vm.locals()[0]);
    assert_eq!(weak.upgrade().map(|s| s.as_str().to_string()), Some("aa".into()));

    assert_eq!(vm.execute(), Ok(None));
    assert!(weak.upgrade().is_none());
}

#[test]
fn teardown_frees_values_left_on_the_stack() {
    let consts = vec![Value::string("x")];
    let instrs = [push(0), push(0), op(Opcode::SConcat), push(0)];
    let mut vm = VM::new(assemble(&instrs, consts), 0);
    step_n(&mut vm, 4);
    assert_eq!(vm.stack().len(), 2);
    let weak = weak_str(&vm.stack()[0]);
    drop(vm);
    assert!(weak.upgrade().is_none());
}

#[test]
fn teardown_frees_locals() {
    let consts = vec![Value::Int(1)];
    let instrs = [
        push(0),
        with(Opcode::PushArray, 1),
        with(Opcode::ArrStore, 0),
    ];
    let mut vm = VM::new(assemble(&instrs, consts), 1);
    assert_eq!(vm.execute(), Ok(None));
    let weak = weak_array(&vm.locals()[0]);
    drop(vm);
    assert!(weak.upgrade().is_none());
}

#[test]
fn deeply_nested_array_is_freed_without_recursion() {
    const DEPTH: usize = 100_000;
    let mut instrs = vec![with(Opcode::PushArray, 0)];
    instrs.extend(std::iter::repeat(with(Opcode::PushArray, 1)).take(DEPTH));
    instrs.push(with(Opcode::ArrStore, 0));
    let store_count = instrs.len();
    instrs.push(with(Opcode::PushArray, 0));
    instrs.push(with(Opcode::ArrStore, 0));

    let mut vm = VM::new(assemble(&instrs, vec![]), 1);
    step_n(&mut vm, store_count);
    let weak = weak_array(&vm.locals()[0]);
    assert_eq!(vm.execute(), Ok(None));
    assert!(weak.upgrade().is_none());
}

#[test]
fn faulting_program_releases_everything() {
    let consts = vec![Value::string("s"), Value::Int(5)];
    let instrs = [
        push(0),
        push(0),
        op(Opcode::SConcat),
        with(Opcode::PushArray, 1),
        push(1),
        op(Opcode::ArrLoadIdx),
    ];
    let mut vm = VM::new(assemble(&instrs, consts), 0);
    step_n(&mut vm, 4);
    let weak = weak_array(&vm.stack()[0]);
    assert!(matches!(
        vm.execute(),
        Err(RuntimeError::IndexOutOfBounds { index: 5, length: 1, .. })
    ));
    drop(vm);
    assert!(weak.upgrade().is_none());
}

// ============================================================
// Robustness
// ============================================================

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(code in prop::collection::vec(any::<u8>(), 0..256)) {
        let constants = vec![Value::Int(3), Value::string("s"), Value::Bool(true)];
        let config = VmConfig::new().with_step_limit(2_000).with_max_stack_depth(64);
        let _ = run_with_config(&Program::new(code, constants), 4, config);
    }

    #[test]
    fn int_comparisons_match_native(a in any::<i32>(), b in any::<i32>()) {
        let cases = [
            (Opcode::IGt, a > b),
            (Opcode::IGte, a >= b),
            (Opcode::ILt, a < b),
            (Opcode::ILte, a <= b),
            (Opcode::IEq, a == b),
            (Opcode::INeq, a != b),
        ];
        for (opcode, expected) in cases {
            let result = run_program(&[push(0), push(1), op(opcode)], vec![Value::Int(a), Value::Int(b)], 0);
            prop_assert_eq!(result, Ok(Some(Value::Bool(expected))));
        }
    }
}
