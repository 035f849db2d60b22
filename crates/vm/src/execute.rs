//! Main execution loop and opcode dispatch for the Slate VM.

use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::machine::VM;
use slate_common::{Opcode, Value};

impl VM {
    /// Run until the program counter reaches the end of the code.
    ///
    /// Returns the value left on top of the operand stack, if any. For a
    /// compiled program that is the trailing expression statement.
    pub fn execute(&mut self) -> Result<Option<Value>, RuntimeError> {
        while self.step()? {}
        let result = self.stack.pop();
        debug!(
            steps = self.steps,
            result = ?result,
            "execution finished"
        );
        Ok(result)
    }

    /// Execute one instruction. Returns `false` once the code is exhausted.
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        if self.pc >= self.code.len() {
            return Ok(false);
        }
        self.at = self.pc;
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return Err(RuntimeError::StepLimitExceeded { at: self.at, limit });
            }
        }
        self.steps += 1;

        let byte = self.code[self.pc];
        self.pc += 1;
        let opcode = Opcode::try_from(byte)
            .map_err(|_| RuntimeError::UnknownOpcode { at: self.at, byte })?;
        trace!(at = self.at, op = opcode.mnemonic(), depth = self.stack.len(), "exec");

        match opcode {
            // Constants and literals
            Opcode::Push => {
                let index = self.read_operand()?;
                let value = self.constant(index)?;
                self.push(value)?;
            }
            Opcode::PushTrue => self.push(Value::Bool(true))?,
            Opcode::PushFalse => self.push(Value::Bool(false))?,
            Opcode::PushArray => self.exec_push_array()?,

            // Integer arithmetic
            Opcode::IAdd => self.exec_int_arith(i32::wrapping_add)?,
            Opcode::ISub => self.exec_int_arith(i32::wrapping_sub)?,
            Opcode::IMul => self.exec_int_arith(i32::wrapping_mul)?,
            Opcode::IDiv => self.exec_div()?,
            Opcode::IMod => self.exec_mod()?,
            Opcode::INeg => {
                let n = self.pop_int()?;
                self.push(Value::Int(n.wrapping_neg()))?;
            }

            // Comparison
            Opcode::IGt => self.exec_int_compare(|a, b| a > b)?,
            Opcode::IGte => self.exec_int_compare(|a, b| a >= b)?,
            Opcode::ILt => self.exec_int_compare(|a, b| a < b)?,
            Opcode::ILte => self.exec_int_compare(|a, b| a <= b)?,
            Opcode::IEq => self.exec_int_compare(|a, b| a == b)?,
            Opcode::INeq => self.exec_int_compare(|a, b| a != b)?,
            Opcode::BEq => self.exec_bool_compare(|a, b| a == b)?,
            Opcode::BNeq => self.exec_bool_compare(|a, b| a != b)?,
            Opcode::Not => {
                let b = self.pop_bool()?;
                self.push(Value::Bool(!b))?;
            }

            // Locals
            Opcode::IStore => self.exec_store("int", |v| matches!(v, Value::Int(_)))?,
            Opcode::BStore => self.exec_store("bool", |v| matches!(v, Value::Bool(_)))?,
            Opcode::SStore => self.exec_store("string", |v| matches!(v, Value::Str(_)))?,
            Opcode::ArrStore => self.exec_store("array", |v| matches!(v, Value::Array(_)))?,
            Opcode::ILoad => self.exec_load("int", |v| matches!(v, Value::Int(_)))?,
            Opcode::BLoad => self.exec_load("bool", |v| matches!(v, Value::Bool(_)))?,
            Opcode::SLoad => self.exec_load("string", |v| matches!(v, Value::Str(_)))?,
            Opcode::ArrLoad => self.exec_load("array", |v| matches!(v, Value::Array(_)))?,

            // Compound assignment
            Opcode::IAddStore => self.exec_compound(|a, b| Some(a.wrapping_add(b)))?,
            Opcode::ISubStore => self.exec_compound(|a, b| Some(a.wrapping_sub(b)))?,
            Opcode::IMulStore => self.exec_compound(|a, b| Some(a.wrapping_mul(b)))?,
            Opcode::IDivStore => self.exec_compound(|a, b| (b != 0).then(|| a.wrapping_div(b)))?,

            // Control flow
            Opcode::Jmp => {
                let offset = self.read_operand()? as i16;
                self.jump(offset)?;
            }
            Opcode::Jmpn => {
                let offset = self.read_operand()? as i16;
                if !self.pop_bool()? {
                    self.jump(offset)?;
                }
            }
            Opcode::JmpnKeep => self.exec_keep_jump(false)?,
            Opcode::JmptKeep => self.exec_keep_jump(true)?,

            // Strings and arrays
            Opcode::SConcat => {
                let right = self.pop_str()?;
                let left = self.pop_str()?;
                let joined = format!("{}{}", left.as_str(), right.as_str());
                self.push(Value::string(joined))?;
            }
            Opcode::ArrLoadIdx => self.exec_index_load()?,
            Opcode::ArrStoreIdx => self.exec_index_store()?,
        }
        Ok(true)
    }

    fn exec_push_array(&mut self) -> Result<(), RuntimeError> {
        let count = self.read_operand()? as usize;
        if self.stack.len() < count {
            return Err(RuntimeError::StackUnderflow { at: self.at });
        }
        // The topmost value is the last element.
        let elements = self.stack.split_off(self.stack.len() - count);
        self.push(Value::array(elements))
    }

    fn exec_int_arith(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.push(Value::Int(op(a, b)))
    }

    fn exec_div(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.at });
        }
        self.push(Value::Int(a.wrapping_div(b)))
    }

    fn exec_mod(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        if b == 0 {
            return Err(RuntimeError::ModuloByZero { at: self.at });
        }
        self.push(Value::Int(a.wrapping_rem(b)))
    }

    fn exec_int_compare(&mut self, cmp: fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.push(Value::Bool(cmp(a, b)))
    }

    fn exec_bool_compare(&mut self, cmp: fn(bool, bool) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_bool()?;
        let a = self.pop_bool()?;
        self.push(Value::Bool(cmp(a, b)))
    }

    fn exec_store(
        &mut self,
        expected: &'static str,
        accepts: fn(&Value) -> bool,
    ) -> Result<(), RuntimeError> {
        let slot = self.read_operand()?;
        self.slot_index(slot)?;
        let value = self.pop()?;
        if !accepts(&value) {
            return Err(self.mismatch(expected, &value));
        }
        let displaced = self.replace_local(slot, value)?;
        trace!(slot, displaced = %displaced, "store");
        Ok(())
    }

    fn exec_load(
        &mut self,
        expected: &'static str,
        accepts: fn(&Value) -> bool,
    ) -> Result<(), RuntimeError> {
        let slot = self.read_operand()?;
        let value = self.local(slot)?.clone();
        if !accepts(&value) {
            return Err(self.mismatch(expected, &value));
        }
        self.push(value)
    }

    /// `slot op= top`. `op` returns `None` for a zero divisor.
    fn exec_compound(&mut self, op: fn(i32, i32) -> Option<i32>) -> Result<(), RuntimeError> {
        let slot = self.read_operand()?;
        let rhs = self.pop_int()?;
        let current = match self.local(slot)? {
            Value::Int(n) => *n,
            other => return Err(self.mismatch("int", other)),
        };
        let result = op(current, rhs).ok_or(RuntimeError::DivisionByZero { at: self.at })?;
        self.replace_local(slot, Value::Int(result))?;
        Ok(())
    }

    /// Short-circuit jump. Jumps leaving the condition on the stack when it
    /// equals `jump_when`; otherwise pops it and falls through.
    fn exec_keep_jump(&mut self, jump_when: bool) -> Result<(), RuntimeError> {
        let offset = self.read_operand()? as i16;
        let cond = match self.peek()? {
            Value::Bool(b) => *b,
            other => return Err(self.mismatch("bool", other)),
        };
        if cond == jump_when {
            self.jump(offset)
        } else {
            self.pop()?;
            Ok(())
        }
    }

    fn exec_index_load(&mut self) -> Result<(), RuntimeError> {
        let index = self.pop_int()?;
        let array = self.pop_array()?;
        let element = usize::try_from(index)
            .ok()
            .and_then(|i| array.get(i))
            .ok_or(RuntimeError::IndexOutOfBounds {
                at: self.at,
                index,
                length: array.len(),
            })?;
        self.push(element)
    }

    fn exec_index_store(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let index = self.pop_int()?;
        let array = self.pop_array()?;
        let out_of_bounds = RuntimeError::IndexOutOfBounds {
            at: self.at,
            index,
            length: array.len(),
        };
        let i = usize::try_from(index).map_err(|_| out_of_bounds.clone())?;
        // The displaced element is released here; the new one was already counted.
        array.set(i, value).map_err(|_| out_of_bounds)?;
        Ok(())
    }
}
