//! VM state management: operand stack, locals, constant pool, program counter.

use std::rc::Rc;

use crate::config::VmConfig;
use crate::error::RuntimeError;
use slate_common::instruction::{read_operand, OPERAND_WIDTH};
use slate_common::{ArrayValue, Program, StringValue, Value};

/// The Slate virtual machine.
///
/// Owns everything it executes. Fields drop in declaration order, so at
/// teardown values left on the operand stack are released first, then the
/// constant pool and the locals.
pub struct VM {
    /// Operand stack.
    pub(crate) stack: Vec<Value>,
    /// Constant pool, read-only during execution.
    pub(crate) constants: Vec<Value>,
    /// Locals array, one entry per resolver slot. Starts as `Int(0)`.
    pub(crate) locals: Vec<Value>,
    /// Instruction stream.
    pub(crate) code: Vec<u8>,
    /// Offset of the next byte to fetch.
    pub(crate) pc: usize,
    /// Offset of the instruction currently executing.
    pub(crate) at: usize,
    /// Instructions executed so far.
    pub(crate) steps: u64,
    pub(crate) config: VmConfig,
}

impl VM {
    /// Create a VM with default limits.
    pub fn new(program: Program, locals_count: usize) -> Self {
        Self::with_config(program, locals_count, VmConfig::default())
    }

    pub fn with_config(program: Program, locals_count: usize, config: VmConfig) -> Self {
        Self {
            stack: Vec::new(),
            constants: program.constants,
            locals: vec![Value::default(); locals_count],
            code: program.code,
            pc: 0,
            at: 0,
            steps: 0,
            config,
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True once the program counter has run off the end of the code.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.code.len()
    }

    /// Push a value onto the stack, checking the configured depth if any.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if let Some(depth) = self.config.max_stack_depth {
            if self.stack.len() >= depth {
                return Err(RuntimeError::StackOverflow { at: self.at, depth });
            }
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at: self.at })
    }

    /// Top of the stack, without popping it.
    pub(crate) fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack
            .last()
            .ok_or(RuntimeError::StackUnderflow { at: self.at })
    }

    pub(crate) fn mismatch(&self, expected: &'static str, found: &Value) -> RuntimeError {
        RuntimeError::TypeMismatch {
            at: self.at,
            expected,
            found: found.value_type(),
        }
    }

    pub(crate) fn pop_int(&mut self) -> Result<i32, RuntimeError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(self.mismatch("int", &other)),
        }
    }

    pub(crate) fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(self.mismatch("bool", &other)),
        }
    }

    pub(crate) fn pop_str(&mut self) -> Result<Rc<StringValue>, RuntimeError> {
        match self.pop()? {
            Value::Str(s) => Ok(s),
            other => Err(self.mismatch("string", &other)),
        }
    }

    pub(crate) fn pop_array(&mut self) -> Result<Rc<ArrayValue>, RuntimeError> {
        match self.pop()? {
            Value::Array(a) => Ok(a),
            other => Err(self.mismatch("array", &other)),
        }
    }

    /// Read the 2-byte operand at the program counter and step past it.
    pub(crate) fn read_operand(&mut self) -> Result<u16, RuntimeError> {
        let operand = read_operand(&self.code, self.pc)
            .ok_or(RuntimeError::TruncatedOperand { at: self.at })?;
        self.pc += OPERAND_WIDTH;
        Ok(operand)
    }

    /// Bounds-check a locals slot.
    pub(crate) fn slot_index(&self, slot: u16) -> Result<usize, RuntimeError> {
        let index = slot as usize;
        if index >= self.locals.len() {
            return Err(RuntimeError::InvalidSlot {
                at: self.at,
                slot,
                size: self.locals.len(),
            });
        }
        Ok(index)
    }

    /// Install `value` in a locals slot, returning the value it displaced.
    pub(crate) fn replace_local(&mut self, slot: u16, value: Value) -> Result<Value, RuntimeError> {
        let index = self.slot_index(slot)?;
        Ok(std::mem::replace(&mut self.locals[index], value))
    }

    pub(crate) fn local(&self, slot: u16) -> Result<&Value, RuntimeError> {
        let index = self.slot_index(slot)?;
        Ok(&self.locals[index])
    }

    /// Clone a constant out of the pool.
    pub(crate) fn constant(&self, index: u16) -> Result<Value, RuntimeError> {
        self.constants
            .get(index as usize)
            .cloned()
            .ok_or(RuntimeError::InvalidConstant {
                at: self.at,
                index,
                size: self.constants.len(),
            })
    }

    /// Move the program counter by a relative offset.
    ///
    /// Landing exactly on the end of the code is allowed and ends execution.
    pub(crate) fn jump(&mut self, offset: i16) -> Result<(), RuntimeError> {
        let target = self.pc as i64 + offset as i64;
        if target < 0 || target > self.code.len() as i64 {
            return Err(RuntimeError::JumpOutOfBounds { at: self.at, target });
        }
        self.pc = target as usize;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn vm_with_locals(locals: usize) -> VM {
        VM::new(Program::default(), locals)
    }

    #[test]
    fn new_vm_has_zeroed_locals() {
        let vm = vm_with_locals(3);
        assert_eq!(vm.locals(), &[Value::Int(0), Value::Int(0), Value::Int(0)]);
        assert!(vm.stack().is_empty());
        assert!(vm.is_finished());
    }

    #[test]
    fn pop_empty_stack_is_underflow() {
        let mut vm = vm_with_locals(0);
        assert_eq!(vm.pop(), Err(RuntimeError::StackUnderflow { at: 0 }));
    }

    #[test]
    fn push_respects_configured_depth() {
        let config = VmConfig::new().with_max_stack_depth(2);
        let mut vm = VM::with_config(Program::default(), 0, config);
        vm.push(Value::Int(1)).unwrap();
        vm.push(Value::Int(2)).unwrap();
        assert_eq!(
            vm.push(Value::Int(3)),
            Err(RuntimeError::StackOverflow { at: 0, depth: 2 })
        );
    }

    #[test]
    fn default_stack_is_unbounded() {
        let mut vm = vm_with_locals(0);
        for n in 0..10_000 {
            vm.push(Value::Int(n)).unwrap();
        }
        assert_eq!(vm.stack().len(), 10_000);
    }

    #[test]
    fn push_pop_cycles_leave_ref_count_unchanged() {
        let s = Value::string("shared");
        let mut vm = vm_with_locals(0);
        for _ in 0..100 {
            vm.push(s.clone()).unwrap();
            assert_eq!(s.ref_count(), Some(2));
            drop(vm.pop().unwrap());
        }
        assert_eq!(s.ref_count(), Some(1));
    }

    #[test]
    fn slot_equal_to_size_is_invalid() {
        let mut vm = vm_with_locals(2);
        assert!(vm.slot_index(1).is_ok());
        assert_eq!(
            vm.replace_local(2, Value::Int(1)),
            Err(RuntimeError::InvalidSlot {
                at: 0,
                slot: 2,
                size: 2
            })
        );
    }

    #[test]
    fn replacing_a_local_releases_the_old_value() {
        let old = Value::string("old");
        let weak = match &old {
            Value::Str(s) => Rc::downgrade(s),
            _ => unreachable!(),
        };
        let mut vm = vm_with_locals(1);
        drop(vm.replace_local(0, old).unwrap());
        assert!(weak.upgrade().is_some());
        drop(vm.replace_local(0, Value::Int(5)).unwrap());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn missing_constant() {
        let vm = VM::new(Program::new(vec![], vec![Value::Int(1)]), 0);
        assert_eq!(vm.constant(0), Ok(Value::Int(1)));
        assert_eq!(
            vm.constant(1),
            Err(RuntimeError::InvalidConstant {
                at: 0,
                index: 1,
                size: 1
            })
        );
    }

    #[test]
    fn jump_bounds() {
        let mut vm = VM::new(Program::new(vec![0; 10], vec![]), 0);
        vm.pc = 4;
        vm.jump(6).unwrap();
        assert_eq!(vm.pc(), 10);
        assert_eq!(
            vm.jump(1),
            Err(RuntimeError::JumpOutOfBounds { at: 0, target: 11 })
        );
        vm.jump(-10).unwrap();
        assert_eq!(vm.pc(), 0);
        assert_eq!(
            vm.jump(-1),
            Err(RuntimeError::JumpOutOfBounds { at: 0, target: -1 })
        );
    }

    #[test]
    fn truncated_operand() {
        let mut vm = VM::new(Program::new(vec![0x01, 0x00], vec![]), 0);
        vm.pc = 1;
        assert_eq!(
            vm.read_operand(),
            Err(RuntimeError::TruncatedOperand { at: 0 })
        );
    }
}
